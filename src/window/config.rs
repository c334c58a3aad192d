use serde::Deserialize;

// ── WindowConfig ──────────────────────────────────────────────────────────────

/// Render-target dimensions handed to every draw through the render context.
///
/// - **physical** dimensions are the pixel size of the surface the backend
///   presents to (accounts for HiDPI scaling and fullscreen).
/// - **logical** dimensions are the internal game resolution that the camera
///   projects into (e.g. 640 × 360 regardless of DPI).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub physical_width: u32,
    pub physical_height: u32,
    pub logical_width: u32,
    pub logical_height: u32,
}

impl Default for WindowConfig {
    /// 1280 × 720 physical and logical.
    fn default() -> Self {
        Self::uniform(1280, 720)
    }
}

impl WindowConfig {
    /// Physical and logical resolution are the same.
    pub const fn uniform(width: u32, height: u32) -> Self {
        Self {
            physical_width: width,
            physical_height: height,
            logical_width: width,
            logical_height: height,
        }
    }

    /// Record a new physical surface size; the logical resolution is kept.
    pub fn resize(&mut self, physical_width: u32, physical_height: u32) {
        self.physical_width = physical_width;
        self.physical_height = physical_height;
    }

    /// `logical_width / logical_height`, or `0.0` when the height is zero.
    pub fn aspect_ratio(&self) -> f32 {
        if self.logical_height == 0 {
            return 0.0;
        }
        self.logical_width as f32 / self.logical_height as f32
    }
}
