/// Transform state machine: per-axis animation, completion events and the
/// model matrix.  Everything here is pure state, no backend needed.
use glam::{Vec2, Vec3};
use tilecraft::transform::*;

fn count(events: &[TransformEvent], which: TransformEvent) -> usize {
    events.iter().filter(|e| **e == which).count()
}

// ── Move ─────────────────────────────────────────────────────────────────────

#[test]
fn move_reaches_target_exactly_and_fires_once() {
    let mut t = Transform::new();
    t.set_move_speed(30.0, 30.0);
    t.move_by(10.0, -7.0);

    let mut events = Vec::new();
    for _ in 0..20 {
        t.update(0.1);
        events.extend(t.drain_events());
    }
    assert_eq!(t.position(), Vec2::new(10.0, -7.0));
    assert!(!t.is_moving());
    assert_eq!(count(&events, TransformEvent::MoveStopped), 1);
}

#[test]
fn group_event_waits_for_the_last_axis() {
    let mut t = Transform::new();
    t.set_move_speed(100.0, 100.0);
    t.move_by(10.0, 50.0);

    t.update(0.1);
    assert!(!t.is_moving_x());
    assert!(t.is_moving_y());
    assert!(!t.has_events(), "x finished but y is still moving");

    for _ in 0..5 {
        t.update(0.1);
    }
    assert_eq!(t.drain_events(), vec![TransformEvent::MoveStopped]);
}

#[test]
fn zero_component_leaves_axis_untouched() {
    let mut t = Transform::new();
    t.move_by(0.0, 5.0);
    assert!(!t.is_moving_x());
    assert!(t.is_moving_y());
}

#[test]
fn restarting_rebases_target_on_current_position() {
    let mut t = Transform::new();
    t.set_move_speed(10.0, 10.0);
    t.move_by(100.0, 0.0);
    t.update(1.0);
    assert_eq!(t.position().x, 10.0);

    t.move_by(5.0, 0.0);
    assert_eq!(t.move_target().x, 15.0);
}

#[test]
fn move_to_heads_in_either_direction() {
    let mut t = Transform::new();
    t.set_position(50.0, 0.0);
    t.move_to(20.0, 0.0);
    for _ in 0..10 {
        t.update(0.25);
    }
    assert_eq!(t.position().x, 20.0);
}

#[test]
fn negative_speed_is_stored_as_magnitude() {
    let mut t = Transform::new();
    t.set_move_speed(-40.0, 40.0);
    assert_eq!(t.move_speed(), Vec2::new(40.0, 40.0));
    t.move_by(-20.0, 0.0);
    t.update(0.25);
    assert_eq!(t.position().x, -10.0);
}

#[test]
fn default_speeds() {
    let t = Transform::new();
    assert_eq!(t.move_speed(), Vec2::splat(DEFAULT_MOVE_SPEED));
    assert_eq!(t.rotate_speed(), Vec3::splat(DEFAULT_ROTATE_SPEED));
    assert_eq!(t.scale_speed(), Vec2::splat(DEFAULT_SCALE_SPEED));
    assert_eq!(t.fade_speed(), DEFAULT_FADE_SPEED);
}

// ── Stop ─────────────────────────────────────────────────────────────────────

#[test]
fn stopping_an_idle_group_still_notifies() {
    let mut t = Transform::new();
    let before = t.position();
    t.stop_moving();
    t.stop_moving();
    t.stop_scaling();
    t.stop_fading();
    t.stop_rotating();
    assert_eq!(
        t.drain_events(),
        vec![
            TransformEvent::MoveStopped,
            TransformEvent::MoveStopped,
            TransformEvent::ScaleStopped,
            TransformEvent::FadeStopped,
            TransformEvent::RotateStopped,
        ]
    );
    assert_eq!(t.position(), before);
}

#[test]
fn stop_halts_mid_flight() {
    let mut t = Transform::new();
    t.set_move_speed(10.0, 10.0);
    t.move_by(100.0, 0.0);
    t.update(1.0);
    t.stop_moving();
    t.update(1.0);
    assert_eq!(t.position().x, 10.0);
    assert_eq!(count(&t.drain_events(), TransformEvent::MoveStopped), 1);
}

// ── Rotate / scale / fade ────────────────────────────────────────────────────

#[test]
fn rotation_per_axis_completes_once() {
    let mut t = Transform::new();
    t.rotate_by(0.0, 45.0, -90.0);
    let mut events = Vec::new();
    for _ in 0..4 {
        t.update(0.5);
        events.extend(t.drain_events());
    }
    assert_eq!(t.rotation(), Vec3::new(0.0, 45.0, -90.0));
    assert_eq!(count(&events, TransformEvent::RotateStopped), 1);
}

#[test]
fn start_rotating_is_ignored_in_normal_mode() {
    let mut t = Transform::new();
    t.start_rotating(true, true, true);
    assert!(!t.is_rotating());
}

#[test]
fn forever_rotation_wraps_and_never_completes() {
    let mut t = Transform::new();
    t.set_rotate_mode(RotateMode::Forever);
    t.set_rotate_speed(0.0, 0.0, 180.0);
    t.start_rotating(false, false, true);
    for _ in 0..5 {
        t.update(1.0);
    }
    assert!(t.is_rotating());
    assert!((t.rotation().z - 180.0).abs() < 1e-3);
    assert!(!t.has_events());

    t.stop_rotating();
    assert_eq!(t.drain_events(), vec![TransformEvent::RotateStopped]);
}

#[test]
fn scale_to_and_back() {
    let mut t = Transform::new();
    t.scale_to(2.0, 0.5);
    for _ in 0..4 {
        t.update(0.5);
    }
    assert_eq!(t.scale(), Vec2::new(2.0, 0.5));
    assert_eq!(t.drain_events(), vec![TransformEvent::ScaleStopped]);
}

#[test]
fn fade_targets_are_clamped() {
    let mut t = Transform::new();
    t.fade_by(-3.0);
    for _ in 0..4 {
        t.update(0.5);
    }
    assert_eq!(t.opacity(), 0.0);

    t.fade_to(7.0);
    for _ in 0..4 {
        t.update(0.5);
    }
    assert_eq!(t.opacity(), 1.0);
    assert_eq!(t.drain_events(), vec![TransformEvent::FadeStopped, TransformEvent::FadeStopped]);
}

// ── Model matrix ─────────────────────────────────────────────────────────────

#[test]
fn model_matrix_translates_and_scales_about_origin() {
    let mut t = Transform::with_size(10.0, 10.0);
    t.set_position(100.0, 50.0);
    t.set_origin(5.0, 5.0);
    t.set_scale(2.0, 2.0);

    let m = t.model_matrix();
    let centre = m.transform_point3(Vec3::new(5.0, 5.0, 0.0));
    assert!((centre - Vec3::new(105.0, 55.0, 0.0)).length() < 1e-4, "pivot stays put");
    let corner = m.transform_point3(Vec3::ZERO);
    assert!((corner - Vec3::new(95.0, 45.0, 0.0)).length() < 1e-4);
}

#[test]
fn model_matrix_rotates_about_origin() {
    let mut t = Transform::new();
    t.set_origin(1.0, 0.0);
    t.set_rotation(0.0, 0.0, 90.0);
    let p = t.model_matrix().transform_point3(Vec3::ZERO);
    assert!((p - Vec3::new(1.0, -1.0, 0.0)).length() < 1e-4);
}

#[test]
fn transformable_defaults_delegate() {
    let mut t = Transform::new();
    Transformable::move_to(&mut t, 4.0, 0.0);
    t.update_transform(1.0);
    assert_eq!(Transformable::position(&t), Vec2::new(4.0, 0.0));
    assert_eq!(t.drain_transform_events(), vec![TransformEvent::MoveStopped]);
}
