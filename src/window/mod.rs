pub mod config;

pub use config::WindowConfig;

// ── Letterbox viewport ────────────────────────────────────────────────────────

/// Largest aspect-preserving rectangle, in physical pixels, that fits the
/// logical resolution inside the physical one, centred on both axes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// ```text
/// scale = min(physical_w / logical_w, physical_h / logical_h)
/// x     = (physical_w - logical_w * scale) / 2
/// y     = (physical_h - logical_h * scale) / 2
/// ```
/// Zero logical dimensions produce a zero-sized viewport at the origin.
pub fn letterbox_viewport(config: &WindowConfig) -> Viewport {
    if config.logical_width == 0 || config.logical_height == 0 {
        return Viewport::default();
    }

    let pw = config.physical_width as f32;
    let ph = config.physical_height as f32;
    let lw = config.logical_width as f32;
    let lh = config.logical_height as f32;

    let scale = (pw / lw).min(ph / lh);
    let width = lw * scale;
    let height = lh * scale;

    Viewport { x: (pw - width) / 2.0, y: (ph - height) / 2.0, width, height }
}
