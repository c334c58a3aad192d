// =============================================================================
// GEOMETRY.RS — Vertex records and axis-aligned rectangles
//
// - `Vertex` is the fixed-layout record handed to the render backend.
// - `Rect` is a float rectangle in world pixels (objects, collision boxes).
// - `AtlasRect` is an integer rectangle in texture pixels (packing, tiles).
// =============================================================================

use glam::Vec2;

/// One corner of a textured quad.
///
/// Layout is `#[repr(C)]` so a slice of vertices can be uploaded as raw bytes
/// with `bytemuck::cast_slice`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(position: [f32; 2], uv: [f32; 2]) -> Self {
        Self { position, uv, color: [1.0, 1.0, 1.0, 1.0] }
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.position = [x, y];
    }

    pub fn set_uv(&mut self, u: f32, v: f32) {
        self.uv = [u, v];
    }

    pub fn set_color(&mut self, color: [f32; 4]) {
        self.color = color;
    }
}

/// Build the four corners of an axis-aligned quad, clockwise from top-left.
///
/// A zero `size` yields a degenerate quad; tilemaps use that as the
/// placeholder for transparent cells so vertex indices stay grid-aligned.
pub fn quad(origin: Vec2, size: Vec2, uv_min: [f32; 2], uv_max: [f32; 2]) -> [Vertex; 4] {
    let (x0, y0) = (origin.x, origin.y);
    let (x1, y1) = (origin.x + size.x, origin.y + size.y);
    [
        Vertex::new([x0, y0], uv_min),
        Vertex::new([x1, y0], [uv_max[0], uv_min[1]]),
        Vertex::new([x1, y1], uv_max),
        Vertex::new([x0, y1], [uv_min[0], uv_max[1]]),
    ]
}

/// Index pattern for a quad whose first vertex sits at `base`.
#[inline]
pub fn quad_indices(base: u32) -> [u32; 6] {
    [base, base + 1, base + 2, base + 2, base + 3, base]
}

// =============================================================================
// RECTANGLES
// =============================================================================

/// Float rectangle, origin top-left, y grows downward.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Strict overlap test: rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }
}

/// Integer rectangle in texture pixels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AtlasRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl AtlasRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when a `width × height` request fits inside this rectangle.
    pub fn can_hold(&self, width: u32, height: u32) -> bool {
        width <= self.width && height <= self.height
    }

    pub fn overlaps(&self, other: &AtlasRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Normalised texture coordinates of this rectangle inside a
    /// `surface_w × surface_h` texture, as `(uv_min, uv_max)`.
    pub fn uv(&self, surface_w: u32, surface_h: u32) -> ([f32; 2], [f32; 2]) {
        let w = surface_w.max(1) as f32;
        let h = surface_h.max(1) as f32;
        (
            [self.x as f32 / w, self.y as f32 / h],
            [self.right() as f32 / w, self.bottom() as f32 / h],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 8 * 4);
        let verts = [Vertex::default(); 3];
        let bytes: &[u8] = bytemuck::cast_slice(&verts);
        assert_eq!(bytes.len(), 3 * 32);
    }

    #[test]
    fn rect_edge_contact_is_not_intersection() {
        let a = Rect::new(0.0, 0.0, 16.0, 16.0);
        let b = Rect::new(16.0, 0.0, 16.0, 16.0);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&Rect::new(15.0, 15.0, 4.0, 4.0)));
    }

    #[test]
    fn zero_sized_quad_collapses_to_one_point() {
        let q = quad(Vec2::new(8.0, 8.0), Vec2::ZERO, [0.0, 0.0], [0.0, 0.0]);
        assert!(q.iter().all(|v| v.position == [8.0, 8.0]));
    }

    #[test]
    fn atlas_rect_uv_spans_whole_surface() {
        let r = AtlasRect::new(0, 0, 64, 32);
        assert_eq!(r.uv(64, 32), ([0.0, 0.0], [1.0, 1.0]));
    }
}
