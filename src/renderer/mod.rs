pub mod atlas;
pub mod sprite_atlas;

use glam::Mat4;
use image::RgbaImage;

use crate::camera::Camera;
use crate::geometry::Vertex;
use crate::window::{letterbox_viewport, Viewport, WindowConfig};

/// Opaque handle to a texture living in the render backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// One batch of indexed triangles.
///
/// `transform` is the full clip-space matrix (view-projection × model) and
/// `opacity` multiplies the vertex colour alpha.
#[derive(Debug)]
pub struct DrawCall<'a> {
    pub texture: Option<TextureId>,
    pub vertices: &'a [Vertex],
    pub indices: &'a [u32],
    pub transform: Mat4,
    pub opacity: f32,
}

/// The graphics backend the engine core draws through.
///
/// Buffer management, shaders and texture binding are the backend's business;
/// the core only hands over geometry, a matrix and an opacity.
pub trait RenderBackend {
    /// Called once per frame before any draw, with the letterboxed viewport.
    fn begin_frame(&mut self, _viewport: Viewport) {}

    fn draw(&mut self, call: &DrawCall<'_>);

    /// Create or replace the texture behind `id` with `image`.
    fn upload_texture(&mut self, _id: TextureId, _image: &RgbaImage) {}
}

// ── RenderContext ────────────────────────────────────────────────────────────

/// Everything a renderable needs to draw, passed explicitly to every
/// `draw` call instead of living in a global.
pub struct RenderContext<'a> {
    backend: &'a mut dyn RenderBackend,
    view_proj: Mat4,
    viewport: Viewport,
    draw_calls: usize,
}

impl<'a> RenderContext<'a> {
    pub fn new(backend: &'a mut dyn RenderBackend, camera: &Camera, window: &WindowConfig) -> Self {
        let view_proj = camera.view_proj(window.logical_width as f32, window.logical_height as f32);
        Self { backend, view_proj, viewport: letterbox_viewport(window), draw_calls: 0 }
    }

    /// Context with an identity projection; geometry is passed through as-is.
    pub fn identity(backend: &'a mut dyn RenderBackend) -> Self {
        Self { backend, view_proj: Mat4::IDENTITY, viewport: Viewport::default(), draw_calls: 0 }
    }

    pub fn view_proj(&self) -> Mat4 { self.view_proj }
    pub fn viewport(&self) -> Viewport { self.viewport }
    pub fn draw_calls(&self) -> usize { self.draw_calls }

    /// Hand one batch to the backend.  Empty batches are dropped.
    pub fn submit(
        &mut self,
        texture: Option<TextureId>,
        vertices: &[Vertex],
        indices: &[u32],
        model: Mat4,
        opacity: f32,
    ) {
        if vertices.is_empty() || indices.is_empty() {
            return;
        }
        self.backend.draw(&DrawCall {
            texture,
            vertices,
            indices,
            transform: self.view_proj * model,
            opacity: opacity.clamp(0.0, 1.0),
        });
        self.draw_calls += 1;
    }

    pub fn upload_texture(&mut self, id: TextureId, image: &RgbaImage) {
        self.backend.upload_texture(id, image);
    }

    pub(crate) fn begin_frame(&mut self) {
        self.backend.begin_frame(self.viewport);
    }
}

// ── RecordingBackend ─────────────────────────────────────────────────────────

/// A draw call captured by `RecordingBackend`.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedDraw {
    pub texture: Option<TextureId>,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub transform: Mat4,
    pub opacity: f32,
}

/// Headless backend that stores everything it is given.  Useful for tools
/// running without a GPU and for tests.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub frames: usize,
    pub calls: Vec<RecordedDraw>,
    /// `(texture, width, height)` per upload, in order.
    pub uploads: Vec<(TextureId, u32, u32)>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderBackend for RecordingBackend {
    fn begin_frame(&mut self, _viewport: Viewport) {
        self.frames += 1;
    }

    fn draw(&mut self, call: &DrawCall<'_>) {
        self.calls.push(RecordedDraw {
            texture: call.texture,
            vertices: call.vertices.to_vec(),
            indices: call.indices.to_vec(),
            transform: call.transform,
            opacity: call.opacity,
        });
    }

    fn upload_texture(&mut self, id: TextureId, image: &RgbaImage) {
        self.uploads.push((id, image.width(), image.height()));
    }
}
