// =============================================================================
// TRANSFORM.RS — Pose and per-axis animation state for renderable objects
//
// Every renderable (sprite, tilemap, player) owns one `Transform` and exposes
// it through `Transformable`.  Four axis-groups animate independently:
//
//   move    x, y        pixels / second
//   rotate  x, y, z     degrees / second
//   scale   x, y        factor / second
//   fade    opacity     alpha / second
//
// A group's "stopped" event is queued exactly once, when the last of its
// axes reaches its target.  Owners drain the queue once per frame.
// =============================================================================

use glam::{Mat4, Vec2, Vec3};

use crate::geometry::Rect;

pub const DEFAULT_MOVE_SPEED: f32 = 100.0;
pub const DEFAULT_ROTATE_SPEED: f32 = 90.0;
pub const DEFAULT_SCALE_SPEED: f32 = 1.0;
pub const DEFAULT_FADE_SPEED: f32 = 1.0;

/// Completion notification for one axis-group.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TransformEvent {
    MoveStopped,
    RotateStopped,
    ScaleStopped,
    FadeStopped,
}

/// How rotation reacts to `update`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RotateMode {
    /// Rotations run toward a target and stop there.
    #[default]
    Normal,
    /// `start_rotating` spins axes indefinitely; only `stop_rotating` ends it.
    Forever,
}

// ── Axis ─────────────────────────────────────────────────────────────────────

/// Motion bookkeeping for a single animated scalar.
///
/// Direction is carried in `decreasing`, separately from the speed
/// magnitude, so speeds are always non-negative.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
struct Axis {
    active: bool,
    decreasing: bool,
    target: f32,
}

impl Axis {
    fn start_by(&mut self, current: f32, delta: f32) {
        if delta == 0.0 {
            return;
        }
        self.decreasing = delta < 0.0;
        let magnitude = delta.abs();
        self.target = if self.decreasing { current - magnitude } else { current + magnitude };
        self.active = true;
    }

    fn start_to(&mut self, current: f32, target: f32) {
        if target == current {
            return;
        }
        self.decreasing = target < current;
        self.target = target;
        self.active = true;
    }

    /// Move `value` toward the target, snapping to it on arrival or overshoot.
    fn step(&mut self, value: &mut f32, speed: f32, dt: f32) {
        if !self.active {
            return;
        }
        let advance = speed * dt;
        if self.decreasing {
            *value -= advance;
            if *value <= self.target {
                *value = self.target;
                self.active = false;
            }
        } else {
            *value += advance;
            if *value >= self.target {
                *value = self.target;
                self.active = false;
            }
        }
    }

    /// Unbounded rotation used by `RotateMode::Forever`; angles wrap to [0, 360).
    fn spin(&self, value: &mut f32, speed: f32, dt: f32) {
        if !self.active {
            return;
        }
        let advance = speed * dt;
        let next = if self.decreasing { *value - advance } else { *value + advance };
        *value = next.rem_euclid(360.0);
    }
}

fn any_active(axes: &[Axis]) -> bool {
    axes.iter().any(|a| a.active)
}

// ── Transform ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Transform {
    position: Vec2,
    /// Degrees about the x, y and z axes.
    rotation: Vec3,
    scale: Vec2,
    opacity: f32,
    /// Pivot for rotation and scale, relative to `position`.
    origin: Vec2,
    size: Vec2,

    move_speed: Vec2,
    rotate_speed: Vec3,
    scale_speed: Vec2,
    fade_speed: f32,

    moving: [Axis; 2],
    rotating: [Axis; 3],
    scaling: [Axis; 2],
    fading: Axis,
    rotate_mode: RotateMode,

    events: Vec<TransformEvent>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec2::ONE,
            opacity: 1.0,
            origin: Vec2::ZERO,
            size: Vec2::ZERO,
            move_speed: Vec2::splat(DEFAULT_MOVE_SPEED),
            rotate_speed: Vec3::splat(DEFAULT_ROTATE_SPEED),
            scale_speed: Vec2::splat(DEFAULT_SCALE_SPEED),
            fade_speed: DEFAULT_FADE_SPEED,
            moving: [Axis::default(); 2],
            rotating: [Axis::default(); 3],
            scaling: [Axis::default(); 2],
            fading: Axis::default(),
            rotate_mode: RotateMode::Normal,
            events: Vec::new(),
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(width: f32, height: f32) -> Self {
        Self { size: Vec2::new(width, height), ..Self::default() }
    }

    // ── Pose accessors ─────────────────────────────────────────────────────

    pub fn position(&self) -> Vec2 { self.position }
    pub fn rotation(&self) -> Vec3 { self.rotation }
    pub fn scale(&self) -> Vec2 { self.scale }
    pub fn opacity(&self) -> f32 { self.opacity }
    pub fn origin(&self) -> Vec2 { self.origin }
    pub fn size(&self) -> Vec2 { self.size }
    pub fn rotate_mode(&self) -> RotateMode { self.rotate_mode }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.position = Vec2::new(x, y);
    }

    pub fn set_rotation(&mut self, x: f32, y: f32, z: f32) {
        self.rotation = Vec3::new(x, y, z);
    }

    pub fn set_scale(&mut self, x: f32, y: f32) {
        self.scale = Vec2::new(x, y);
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    pub fn set_origin(&mut self, x: f32, y: f32) {
        self.origin = Vec2::new(x, y);
    }

    pub fn set_size(&mut self, width: f32, height: f32) {
        self.size = Vec2::new(width, height);
    }

    /// Switching modes drops any rotation in flight without an event.
    pub fn set_rotate_mode(&mut self, mode: RotateMode) {
        if mode != self.rotate_mode {
            self.rotating = [Axis::default(); 3];
            self.rotate_mode = mode;
        }
    }

    // ── Speeds (stored as magnitudes) ──────────────────────────────────────

    pub fn move_speed(&self) -> Vec2 { self.move_speed }
    pub fn rotate_speed(&self) -> Vec3 { self.rotate_speed }
    pub fn scale_speed(&self) -> Vec2 { self.scale_speed }
    pub fn fade_speed(&self) -> f32 { self.fade_speed }

    pub fn set_move_speed(&mut self, x: f32, y: f32) {
        self.move_speed = Vec2::new(x.abs(), y.abs());
    }

    pub fn set_rotate_speed(&mut self, x: f32, y: f32, z: f32) {
        self.rotate_speed = Vec3::new(x.abs(), y.abs(), z.abs());
    }

    pub fn set_scale_speed(&mut self, x: f32, y: f32) {
        self.scale_speed = Vec2::new(x.abs(), y.abs());
    }

    pub fn set_fade_speed(&mut self, speed: f32) {
        self.fade_speed = speed.abs();
    }

    // ── Motion state ───────────────────────────────────────────────────────

    pub fn is_moving(&self) -> bool { any_active(&self.moving) }
    pub fn is_moving_x(&self) -> bool { self.moving[0].active }
    pub fn is_moving_y(&self) -> bool { self.moving[1].active }
    pub fn is_rotating(&self) -> bool { any_active(&self.rotating) }
    pub fn is_scaling(&self) -> bool { any_active(&self.scaling) }
    pub fn is_fading(&self) -> bool { self.fading.active }

    /// Absolute move target; only meaningful for axes that are moving.
    pub fn move_target(&self) -> Vec2 {
        Vec2::new(self.moving[0].target, self.moving[1].target)
    }

    // ── Move ───────────────────────────────────────────────────────────────

    /// Start moving by a relative offset.  Zero components leave that axis alone.
    pub fn move_by(&mut self, dx: f32, dy: f32) {
        self.moving[0].start_by(self.position.x, dx);
        self.moving[1].start_by(self.position.y, dy);
    }

    /// Start moving toward an absolute position.
    pub fn move_to(&mut self, x: f32, y: f32) {
        self.moving[0].start_to(self.position.x, x);
        self.moving[1].start_to(self.position.y, y);
    }

    /// Always queues `MoveStopped`, even when nothing was moving.
    pub fn stop_moving(&mut self) {
        self.moving = self.moving.map(|a| Axis { active: false, ..a });
        self.events.push(TransformEvent::MoveStopped);
    }

    // ── Rotate ─────────────────────────────────────────────────────────────

    pub fn rotate_by(&mut self, dx: f32, dy: f32, dz: f32) {
        self.rotating[0].start_by(self.rotation.x, dx);
        self.rotating[1].start_by(self.rotation.y, dy);
        self.rotating[2].start_by(self.rotation.z, dz);
    }

    pub fn rotate_to(&mut self, x: f32, y: f32, z: f32) {
        self.rotating[0].start_to(self.rotation.x, x);
        self.rotating[1].start_to(self.rotation.y, y);
        self.rotating[2].start_to(self.rotation.z, z);
    }

    /// Spin all three axes indefinitely.  Ignored unless the rotate mode is
    /// `RotateMode::Forever`.
    pub fn start_rotating(&mut self, clockwise_x: bool, clockwise_y: bool, clockwise_z: bool) {
        if self.rotate_mode != RotateMode::Forever {
            return;
        }
        for (axis, clockwise) in self.rotating.iter_mut().zip([clockwise_x, clockwise_y, clockwise_z]) {
            axis.active = true;
            axis.decreasing = !clockwise;
        }
    }

    /// Always queues `RotateStopped`.
    pub fn stop_rotating(&mut self) {
        self.rotating = self.rotating.map(|a| Axis { active: false, ..a });
        self.events.push(TransformEvent::RotateStopped);
    }

    // ── Scale ──────────────────────────────────────────────────────────────

    pub fn scale_by(&mut self, dx: f32, dy: f32) {
        self.scaling[0].start_by(self.scale.x, dx);
        self.scaling[1].start_by(self.scale.y, dy);
    }

    pub fn scale_to(&mut self, x: f32, y: f32) {
        self.scaling[0].start_to(self.scale.x, x);
        self.scaling[1].start_to(self.scale.y, y);
    }

    /// Always queues `ScaleStopped`.
    pub fn stop_scaling(&mut self) {
        self.scaling = self.scaling.map(|a| Axis { active: false, ..a });
        self.events.push(TransformEvent::ScaleStopped);
    }

    // ── Fade ───────────────────────────────────────────────────────────────

    /// Fade by a relative amount; the resulting target is clamped to [0, 1].
    pub fn fade_by(&mut self, delta: f32) {
        let target = (self.opacity + delta).clamp(0.0, 1.0);
        if delta != 0.0 {
            self.fading.start_to(self.opacity, target);
        }
    }

    pub fn fade_to(&mut self, target: f32) {
        self.fading.start_to(self.opacity, target.clamp(0.0, 1.0));
    }

    /// Always queues `FadeStopped`.
    pub fn stop_fading(&mut self) {
        self.fading.active = false;
        self.events.push(TransformEvent::FadeStopped);
    }

    // ── Per-frame update ───────────────────────────────────────────────────

    /// Advance every in-flight axis by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if self.is_moving() {
            self.moving[0].step(&mut self.position.x, self.move_speed.x, dt);
            self.moving[1].step(&mut self.position.y, self.move_speed.y, dt);
            if !self.is_moving() {
                self.events.push(TransformEvent::MoveStopped);
            }
        }

        if self.is_rotating() {
            let angles = [&mut self.rotation.x, &mut self.rotation.y, &mut self.rotation.z];
            let speeds = self.rotate_speed.to_array();
            match self.rotate_mode {
                RotateMode::Forever => {
                    for ((axis, angle), speed) in self.rotating.iter().zip(angles).zip(speeds) {
                        axis.spin(angle, speed, dt);
                    }
                }
                RotateMode::Normal => {
                    for ((axis, angle), speed) in self.rotating.iter_mut().zip(angles).zip(speeds) {
                        axis.step(angle, speed, dt);
                    }
                    if !self.is_rotating() {
                        self.events.push(TransformEvent::RotateStopped);
                    }
                }
            }
        }

        if self.is_scaling() {
            self.scaling[0].step(&mut self.scale.x, self.scale_speed.x, dt);
            self.scaling[1].step(&mut self.scale.y, self.scale_speed.y, dt);
            if !self.is_scaling() {
                self.events.push(TransformEvent::ScaleStopped);
            }
        }

        if self.fading.active {
            self.fading.step(&mut self.opacity, self.fade_speed, dt);
            if !self.fading.active {
                self.events.push(TransformEvent::FadeStopped);
            }
        }
    }

    /// Take every event queued since the last drain, in firing order.
    pub fn drain_events(&mut self) -> Vec<TransformEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    // ── Derived geometry ───────────────────────────────────────────────────

    /// Model matrix: scale and rotate about `origin`, then translate to `position`.
    pub fn model_matrix(&self) -> Mat4 {
        let pivot = self.origin.extend(0.0);
        Mat4::from_translation(self.position.extend(0.0) + pivot)
            * Mat4::from_rotation_z(self.rotation.z.to_radians())
            * Mat4::from_rotation_y(self.rotation.y.to_radians())
            * Mat4::from_rotation_x(self.rotation.x.to_radians())
            * Mat4::from_scale(Vec3::new(self.scale.x, self.scale.y, 1.0))
            * Mat4::from_translation(-pivot)
    }

    /// Axis-aligned bounds at the current position and scale (rotation ignored).
    pub fn bounds(&self) -> Rect {
        let size = self.size * self.scale.abs();
        Rect::new(self.position.x, self.position.y, size.x, size.y)
    }
}

// ── Transformable ────────────────────────────────────────────────────────────

/// Implemented by everything that owns a `Transform`.
pub trait Transformable {
    fn transform(&self) -> &Transform;
    fn transform_mut(&mut self) -> &mut Transform;

    fn update_transform(&mut self, dt: f32) {
        self.transform_mut().update(dt);
    }

    fn position(&self) -> Vec2 {
        self.transform().position()
    }

    fn set_position(&mut self, x: f32, y: f32) {
        self.transform_mut().set_position(x, y);
    }

    fn move_by(&mut self, dx: f32, dy: f32) {
        self.transform_mut().move_by(dx, dy);
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.transform_mut().move_to(x, y);
    }

    fn is_moving(&self) -> bool {
        self.transform().is_moving()
    }

    fn opacity(&self) -> f32 {
        self.transform().opacity()
    }

    fn drain_transform_events(&mut self) -> Vec<TransformEvent> {
        self.transform_mut().drain_events()
    }
}

impl Transformable for Transform {
    fn transform(&self) -> &Transform {
        self
    }

    fn transform_mut(&mut self) -> &mut Transform {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_snaps_on_overshoot() {
        let mut axis = Axis::default();
        let mut value = 0.0;
        axis.start_by(value, 10.0);
        axis.step(&mut value, 7.0, 1.0);
        assert!(axis.active);
        axis.step(&mut value, 7.0, 1.0);
        assert!(!axis.active);
        assert_eq!(value, 10.0);
    }

    #[test]
    fn axis_zero_delta_stays_idle() {
        let mut axis = Axis { target: 42.0, ..Axis::default() };
        axis.start_by(5.0, 0.0);
        assert!(!axis.active);
        assert_eq!(axis.target, 42.0, "stale target is left in place");
    }

    #[test]
    fn spin_wraps_into_full_turn() {
        let axis = Axis { active: true, decreasing: true, target: 0.0 };
        let mut angle = 10.0;
        axis.spin(&mut angle, 30.0, 1.0);
        assert!((angle - 340.0).abs() < 1e-4);
    }
}
