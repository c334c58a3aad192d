use serde::Deserialize;

use crate::error::Result;
use crate::map::{MoveMode, DEFAULT_PLAYER_SPEED};
use crate::window::WindowConfig;

pub const DEFAULT_ATLAS_SIZE: u32 = 1024;

/// Engine-wide settings.  Build with `EngineConfig::builder()` or load from
/// JSON; missing JSON fields take their defaults.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub window: WindowConfig,
    /// Edge length of every sprite atlas, in pixels.
    pub atlas_size: u32,
    /// Player walking speed in pixels per second.
    pub player_speed: f32,
    pub player_move_mode: MoveMode,
    /// Folder scanned for sprite definitions at startup.
    pub sprite_folder: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            atlas_size: DEFAULT_ATLAS_SIZE,
            player_speed: DEFAULT_PLAYER_SPEED,
            player_move_mode: MoveMode::Tile,
            sprite_folder: None,
        }
    }
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

// ── EngineConfigBuilder ─────────────────────────────────────────────────────

#[derive(Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn with_window(mut self, window: WindowConfig) -> Self { self.config.window = window; self }
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.config.window = WindowConfig::uniform(width, height); self
    }
    pub fn with_atlas_size(mut self, size: u32) -> Self { self.config.atlas_size = size.max(1); self }
    pub fn with_player_speed(mut self, speed: f32) -> Self { self.config.player_speed = speed.abs(); self }
    pub fn with_player_move_mode(mut self, mode: MoveMode) -> Self { self.config.player_move_mode = mode; self }

    /// Directory scanned recursively for `*.json` sprite definitions.
    pub fn with_sprite_folder(mut self, path: &str) -> Self {
        self.config.sprite_folder = Some(path.to_string()); self
    }

    pub fn build(self) -> EngineConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let cfg = EngineConfig::builder()
            .with_atlas_size(512)
            .with_player_speed(-64.0)
            .with_player_move_mode(MoveMode::Pixel)
            .build();
        assert_eq!(cfg.atlas_size, 512);
        assert_eq!(cfg.player_speed, 64.0);
        assert_eq!(cfg.player_move_mode, MoveMode::Pixel);
        assert_eq!(cfg.window, WindowConfig::default());
    }

    #[test]
    fn json_fills_missing_fields() {
        let cfg = EngineConfig::from_json(r#"{ "atlas_size": 256, "player_move_mode": "pixel" }"#).unwrap();
        assert_eq!(cfg.atlas_size, 256);
        assert_eq!(cfg.player_move_mode, MoveMode::Pixel);
        assert_eq!(cfg.player_speed, DEFAULT_PLAYER_SPEED);
    }
}
