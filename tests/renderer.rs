use glam::{Mat4, Vec2, Vec3};
use tilecraft::camera::Camera;
use tilecraft::geometry::{quad, quad_indices};
use tilecraft::renderer::{RecordingBackend, RenderContext, TextureId};
use tilecraft::window::WindowConfig;

// ── RenderContext ─────────────────────────────────────────────────────────

#[test]
fn empty_batches_are_dropped() {
    let mut backend = RecordingBackend::new();
    let mut ctx = RenderContext::identity(&mut backend);
    ctx.submit(None, &[], &[], Mat4::IDENTITY, 1.0);
    let verts = quad(Vec2::ZERO, Vec2::ONE, [0.0, 0.0], [1.0, 1.0]);
    ctx.submit(None, &verts, &[], Mat4::IDENTITY, 1.0);
    assert_eq!(ctx.draw_calls(), 0);
    assert!(backend.calls.is_empty());
}

#[test]
fn opacity_is_clamped() {
    let mut backend = RecordingBackend::new();
    let verts = quad(Vec2::ZERO, Vec2::ONE, [0.0, 0.0], [1.0, 1.0]);
    {
        let mut ctx = RenderContext::identity(&mut backend);
        ctx.submit(Some(TextureId(3)), &verts, &quad_indices(0), Mat4::IDENTITY, 4.0);
        ctx.submit(Some(TextureId(3)), &verts, &quad_indices(0), Mat4::IDENTITY, -1.0);
        assert_eq!(ctx.draw_calls(), 2);
    }
    assert_eq!(backend.calls[0].opacity, 1.0);
    assert_eq!(backend.calls[1].opacity, 0.0);
    assert_eq!(backend.calls[0].texture, Some(TextureId(3)));
}

#[test]
fn camera_projection_is_premultiplied_into_the_model() {
    let camera = Camera::new(160.0, 120.0);
    let window = WindowConfig::uniform(320, 240);
    let verts = quad(Vec2::ZERO, Vec2::ONE, [0.0, 0.0], [1.0, 1.0]);
    let model = Mat4::from_translation(Vec3::new(160.0, 120.0, 0.0));

    let mut backend = RecordingBackend::new();
    {
        let mut ctx = RenderContext::new(&mut backend, &camera, &window);
        ctx.submit(None, &verts, &quad_indices(0), model, 1.0);
    }
    let centre = backend.calls[0].transform.transform_point3(Vec3::ZERO);
    assert!(centre.truncate().length() < 1e-5, "model origin lands at the view centre");
}

#[test]
fn context_viewport_is_letterboxed() {
    let camera = Camera::new(0.0, 0.0);
    let window = WindowConfig { physical_width: 1280, physical_height: 720, logical_width: 320, logical_height: 240 };
    let mut backend = RecordingBackend::new();
    let ctx = RenderContext::new(&mut backend, &camera, &window);
    assert!((ctx.viewport().x - 160.0).abs() < 1e-3);
    assert!((ctx.viewport().width - 960.0).abs() < 1e-3);
}

// ── Camera ────────────────────────────────────────────────────────────────

#[test]
fn zoom_is_smoothed_and_clamped() {
    let mut cam = Camera::new(0.0, 0.0);
    cam.set_zoom(0.0);
    assert_eq!(cam.target_zoom(), 0.05);
    cam.set_zoom(2.0);
    cam.tick(1.0);
    assert_eq!(cam.zoom, 2.0, "a long tick snaps to the target");
}

#[test]
fn zoom_scales_world_distances() {
    let mut cam = Camera::new(0.0, 0.0);
    cam.set_zoom(2.0);
    cam.tick(1.0);
    let ndc = cam.world_to_ndc(Vec2::new(80.0, 0.0), 320.0, 240.0);
    assert!((ndc.x - 1.0).abs() < 1e-5);
}

#[test]
fn stop_following_freezes_position() {
    let mut cam = Camera::new(0.0, 0.0);
    cam.follow(Vec2::new(100.0, 0.0));
    cam.tick(0.05);
    cam.stop_following();
    let frozen = cam.position;
    cam.tick(1.0);
    assert_eq!(cam.position, frozen);
}
