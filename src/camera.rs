use glam::{Mat4, Vec2};

/// 2D camera: tracks a world-space position with smooth zoom and an
/// optional follow target.
#[derive(Clone, Debug)]
pub struct Camera {
    /// World-space pixel position the camera is centered on.
    pub position: Vec2,
    /// Current zoom level (1.0 = 1:1, >1 zooms in, <1 zooms out).
    pub zoom: f32,
    /// Smooth-zoom lerp target; `set_zoom` writes here.
    pub(crate) target_zoom: f32,
    /// Point the camera glides toward each tick, if any.
    pub(crate) follow: Option<Vec2>,
}

impl Camera {
    /// Lerp rate for zoom and follow, per second.
    const SMOOTHING: f32 = 8.0;

    pub fn new(center_x: f32, center_y: f32) -> Self {
        Self {
            position: Vec2::new(center_x, center_y),
            zoom: 1.0,
            target_zoom: 1.0,
            follow: None,
        }
    }

    /// Set the zoom target.  Clamped to a minimum of 0.05.
    pub fn set_zoom(&mut self, zoom: f32) {
        self.target_zoom = zoom.max(0.05);
    }

    pub fn target_zoom(&self) -> f32 {
        self.target_zoom
    }

    /// Glide toward `point` on subsequent ticks.
    pub fn follow(&mut self, point: Vec2) {
        self.follow = Some(point);
    }

    pub fn stop_following(&mut self) {
        self.follow = None;
    }

    /// Advance zoom and follow smoothing by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        let t = (Self::SMOOTHING * dt).min(1.0);
        self.zoom += (self.target_zoom - self.zoom) * t;
        if let Some(target) = self.follow {
            self.position += (target - self.position) * t;
        }
    }

    /// View-projection matrix for a `width × height` viewport.
    ///
    /// Maps world pixels (y down) so that `position` lands at the centre of
    /// clip space, scaled by `zoom`:
    /// ```text
    /// x_ndc = sx * world_x + tx    (sx = 2z/w,  tx = -sx*cx)
    /// y_ndc = sy * world_y + ty    (sy = -2z/h, ty = -sy*cy)
    /// ```
    pub fn view_proj(&self, width: f32, height: f32) -> Mat4 {
        let z = self.zoom.max(0.01);
        let sx = 2.0 * z / width.max(1.0);
        let sy = -2.0 * z / height.max(1.0);
        Mat4::from_cols_array_2d(&[
            [sx, 0.0, 0.0, 0.0],
            [0.0, sy, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [-sx * self.position.x, -sy * self.position.y, 0.0, 1.0],
        ])
    }

    /// Convert a world-space point to normalised device coordinates.
    pub fn world_to_ndc(&self, world: Vec2, width: f32, height: f32) -> Vec2 {
        self.view_proj(width, height).transform_point3(world.extend(0.0)).truncate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_centre_maps_to_origin() {
        let cam = Camera::new(320.0, 240.0);
        let ndc = cam.world_to_ndc(Vec2::new(320.0, 240.0), 640.0, 480.0);
        assert!(ndc.length() < 1e-5);
    }

    #[test]
    fn top_left_of_view_maps_to_upper_left_corner() {
        let cam = Camera::new(320.0, 240.0);
        let ndc = cam.world_to_ndc(Vec2::ZERO, 640.0, 480.0);
        assert!((ndc.x + 1.0).abs() < 1e-5);
        assert!((ndc.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn follow_converges() {
        let mut cam = Camera::new(0.0, 0.0);
        cam.follow(Vec2::new(100.0, 50.0));
        for _ in 0..200 {
            cam.tick(1.0 / 60.0);
        }
        assert!((cam.position - Vec2::new(100.0, 50.0)).length() < 0.01);
    }
}
