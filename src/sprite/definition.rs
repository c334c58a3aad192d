//! JSON sprite definitions.
//!
//! ```json
//! {
//!   "version": 1,
//!   "sheet": "hero.png",
//!   "movements": [
//!     {
//!       "name": "walk_right",
//!       "mode": "tile", "advanceX": 1, "advanceY": 0,
//!       "idle": { "x": 0, "y": 0, "width": 16, "height": 24 },
//!       "frames": [ { "duration": 120, "rect": { "x": 16, "y": 0, "width": 16, "height": 24 } } ]
//!     }
//!   ]
//! }
//! ```

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::geometry::AtlasRect;

pub const SUPPORTED_VERSION: u32 = 1;

#[derive(Deserialize)]
struct VersionHeader {
    version: u32,
}

#[derive(Deserialize)]
struct RawDefinition {
    sheet: String,
    #[serde(default)]
    movements: Vec<RawMovement>,
}

#[derive(Deserialize)]
struct RawMovement {
    name: String,
    #[serde(default)]
    mode: Option<String>,
    #[serde(rename = "advanceX", default)]
    advance_x: Option<i32>,
    #[serde(rename = "advanceY", default)]
    advance_y: Option<i32>,
    #[serde(default)]
    idle: Option<RawRect>,
    #[serde(default)]
    frames: Vec<RawFrame>,
}

#[derive(Deserialize, Clone, Copy)]
struct RawRect {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl From<RawRect> for AtlasRect {
    fn from(r: RawRect) -> Self {
        AtlasRect::new(r.x, r.y, r.width, r.height)
    }
}

#[derive(Deserialize)]
struct RawFrame {
    duration: u32,
    rect: RawRect,
}

/// How a movement animation relates to the map grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MovementMode {
    /// Plain animation, no implied displacement.
    Free,
    /// Each play steps the owner by a whole number of tiles.
    Tile { advance_x: i32, advance_y: i32 },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub duration_ms: u32,
    /// Source rectangle on the sheet image.
    pub rect: AtlasRect,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Movement {
    pub name: String,
    pub mode: MovementMode,
    pub idle: Option<AtlasRect>,
    pub frames: Vec<Frame>,
}

impl Movement {
    /// Sum of all frame durations.
    pub fn total_duration_ms(&self) -> u64 {
        self.frames.iter().map(|f| f.duration_ms as u64).sum()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpriteDefinition {
    /// Sheet image path, relative to the definition file.
    pub sheet: String,
    pub movements: Vec<Movement>,
}

impl SpriteDefinition {
    pub fn from_json(text: &str) -> Result<Self> {
        let header: VersionHeader = serde_json::from_str(text)?;
        if header.version != SUPPORTED_VERSION {
            return Err(Error::UnsupportedVersion(header.version));
        }

        let raw: RawDefinition = serde_json::from_str(text)?;
        let movements = raw
            .movements
            .into_iter()
            .map(Movement::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { sheet: raw.sheet, movements })
    }

    pub fn movement(&self, name: &str) -> Option<&Movement> {
        self.movements.iter().find(|m| m.name == name)
    }
}

impl TryFrom<RawMovement> for Movement {
    type Error = Error;

    fn try_from(raw: RawMovement) -> Result<Self> {
        let mode = match raw.mode.as_deref() {
            None => MovementMode::Free,
            Some("tile") => {
                let advance_x = raw.advance_x.ok_or_else(|| Error::MissingAdvance {
                    movement: raw.name.clone(),
                    field: "advanceX",
                })?;
                let advance_y = raw.advance_y.ok_or_else(|| Error::MissingAdvance {
                    movement: raw.name.clone(),
                    field: "advanceY",
                })?;
                MovementMode::Tile { advance_x, advance_y }
            }
            Some("free") | Some("pixel") => MovementMode::Free,
            Some(other) => {
                return Err(Error::UnknownMovementMode { movement: raw.name, mode: other.to_string() });
            }
        };

        Ok(Movement {
            name: raw.name,
            mode,
            idle: raw.idle.map(AtlasRect::from),
            frames: raw
                .frames
                .into_iter()
                .map(|f| Frame { duration_ms: f.duration, rect: f.rect.into() })
                .collect(),
        })
    }
}
