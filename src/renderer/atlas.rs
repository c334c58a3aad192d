// ── Texture atlas packing ────────────────────────────────────────────────────
//
// Guillotine packer over a fixed square surface.  `free` and `used` together
// tile the whole surface at all times:
//
//   find   best-area-fit over `free` (exact size wins immediately)
//   split  the chosen free rect into at most two leftovers
//   merge  coalesce aligned neighbours until no pair can be joined
//
// Callers check `can_insert()` before `insert()` and open a new atlas once it
// reports false; `AtlasSet` does exactly that.

use image::{imageops, RgbaImage};
use tracing::debug;

use crate::geometry::AtlasRect;
use crate::renderer::{RenderContext, TextureId};

/// Insertion is refused by `can_insert` once this much of the surface is used.
pub const MAX_OCCUPANCY: f32 = 0.9;

pub struct TextureAtlas {
    size: u32,
    surface: RgbaImage,
    used: Vec<AtlasRect>,
    free: Vec<AtlasRect>,
    used_space: u64,
    occupancy: f32,
    /// Regions written since the last `take_dirty`.
    dirty: Vec<AtlasRect>,
}

impl TextureAtlas {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            surface: RgbaImage::new(size, size),
            used: Vec::new(),
            free: vec![AtlasRect::new(0, 0, size, size)],
            used_space: 0,
            occupancy: 0.0,
            dirty: Vec::new(),
        }
    }

    pub fn size(&self) -> u32 { self.size }
    pub fn occupancy(&self) -> f32 { self.occupancy }
    pub fn used(&self) -> &[AtlasRect] { &self.used }
    pub fn free(&self) -> &[AtlasRect] { &self.free }
    pub fn surface(&self) -> &RgbaImage { &self.surface }

    /// `occupancy < MAX_OCCUPANCY`.  Not enforced by `insert`.
    pub fn can_insert(&self) -> bool {
        self.occupancy < MAX_OCCUPANCY
    }

    /// Place `image` and copy its pixels into the surface.
    ///
    /// Returns the occupied rectangle, or `None` (with no state change) when
    /// no free rectangle can hold it.
    pub fn insert(&mut self, image: &RgbaImage) -> Option<AtlasRect> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return None;
        }

        let index = self.find(width, height)?;
        let chosen = self.free.remove(index);
        let placed = AtlasRect::new(chosen.x, chosen.y, width, height);

        self.split(chosen, placed);
        self.merge();

        self.used.push(placed);
        self.used_space += placed.area();
        self.occupancy = (self.used_space as f64 / (self.size as f64 * self.size as f64)) as f32;

        imageops::replace(&mut self.surface, image, placed.x as i64, placed.y as i64);
        self.dirty.push(placed);

        debug!(
            "atlas {}px: placed {}x{} at ({}, {}), occupancy {:.3}, {} free rects",
            self.size, width, height, placed.x, placed.y, self.occupancy, self.free.len()
        );
        Some(placed)
    }

    /// `(uv_min, uv_max)` of a rectangle on this surface.
    pub fn uv_rect(&self, rect: AtlasRect) -> ([f32; 2], [f32; 2]) {
        rect.uv(self.size, self.size)
    }

    /// Regions written since the previous call; the backend re-uploads these.
    pub fn take_dirty(&mut self) -> Vec<AtlasRect> {
        std::mem::take(&mut self.dirty)
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    // ── find / split / merge ───────────────────────────────────────────────

    /// Index of the free rectangle with the smallest leftover area.
    fn find(&self, width: u32, height: u32) -> Option<usize> {
        let requested = width as u64 * height as u64;
        let mut best: Option<(usize, u64)> = None;

        for (i, free) in self.free.iter().enumerate() {
            if free.width == width && free.height == height {
                return Some(i);
            }
            if !free.can_hold(width, height) {
                continue;
            }
            let score = free.area() - requested;
            if best.is_none_or(|(_, s)| score < s) {
                best = Some((i, score));
            }
        }

        best.map(|(i, _)| i)
    }

    /// Replace `free` minus `used` with up to two rectangles.
    fn split(&mut self, free: AtlasRect, used: AtlasRect) {
        let leftover_w = free.width - used.width;
        let leftover_h = free.height - used.height;

        // Hand the full span of the free rect to whichever leftover is
        // relatively larger, keeping both pieces closer to square.
        let (bottom, right) = if used.width as u64 * leftover_h as u64 <= used.height as u64 * leftover_w as u64 {
            (
                AtlasRect::new(free.x, free.y + used.height, used.width, leftover_h),
                AtlasRect::new(free.x + used.width, free.y, leftover_w, free.height),
            )
        } else {
            (
                AtlasRect::new(free.x, free.y + used.height, free.width, leftover_h),
                AtlasRect::new(free.x + used.width, free.y, leftover_w, used.height),
            )
        };

        for piece in [bottom, right] {
            if !piece.is_empty() {
                self.free.push(piece);
            }
        }
    }

    /// Pairwise coalescing.  After a merge the scan for partners of `i`
    /// restarts, so chains of three or more collapse in one call.
    fn merge(&mut self) {
        let mut i = 0;
        while i < self.free.len() {
            let mut j = i + 1;
            while j < self.free.len() {
                if let Some(joined) = join(self.free[i], self.free[j]) {
                    self.free[i] = joined;
                    self.free.remove(j);
                    j = i + 1;
                } else {
                    j += 1;
                }
            }
            i += 1;
        }
    }
}

/// Union of two rectangles that share a full edge, if they do.
fn join(a: AtlasRect, b: AtlasRect) -> Option<AtlasRect> {
    if a.x == b.x && a.width == b.width {
        if a.bottom() == b.y {
            return Some(AtlasRect::new(a.x, a.y, a.width, a.height + b.height));
        }
        if b.bottom() == a.y {
            return Some(AtlasRect::new(a.x, b.y, a.width, a.height + b.height));
        }
    }
    if a.y == b.y && a.height == b.height {
        if a.right() == b.x {
            return Some(AtlasRect::new(a.x, a.y, a.width + b.width, a.height));
        }
        if b.right() == a.x {
            return Some(AtlasRect::new(b.x, a.y, a.width + b.width, a.height));
        }
    }
    None
}

// ── AtlasSet ─────────────────────────────────────────────────────────────────

/// Where an image ended up: atlas index plus rectangle on that atlas.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AtlasRegion {
    pub atlas: usize,
    pub rect: AtlasRect,
}

/// Growable list of same-sized atlases.  Opens a fresh atlas whenever the
/// current one reports `can_insert() == false` or has no room for an image.
pub struct AtlasSet {
    atlas_size: u32,
    /// Atlas `i` is uploaded as `TextureId(texture_base + i)`.
    texture_base: u32,
    atlases: Vec<TextureAtlas>,
}

impl AtlasSet {
    pub fn new(atlas_size: u32) -> Self {
        Self { atlas_size, texture_base: 0, atlases: Vec::new() }
    }

    pub fn with_texture_base(mut self, base: u32) -> Self {
        self.texture_base = base;
        self
    }

    pub fn texture_id(&self, atlas: usize) -> TextureId {
        TextureId(self.texture_base + atlas as u32)
    }

    /// Upload every atlas written to since the last call.
    pub fn upload_dirty(&mut self, ctx: &mut RenderContext<'_>) {
        for (i, atlas) in self.atlases.iter_mut().enumerate() {
            if atlas.is_dirty() {
                atlas.take_dirty();
                ctx.upload_texture(TextureId(self.texture_base + i as u32), atlas.surface());
            }
        }
    }

    pub fn atlas_size(&self) -> u32 { self.atlas_size }
    pub fn len(&self) -> usize { self.atlases.len() }
    pub fn is_empty(&self) -> bool { self.atlases.is_empty() }
    pub fn atlases(&self) -> &[TextureAtlas] { &self.atlases }

    pub fn get(&self, index: usize) -> Option<&TextureAtlas> {
        self.atlases.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut TextureAtlas> {
        self.atlases.get_mut(index)
    }

    /// Pack `image`, opening a new atlas when needed.  Returns `None` only
    /// for images that cannot fit even an empty atlas.
    pub fn insert(&mut self, image: &RgbaImage) -> Option<AtlasRegion> {
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 || w > self.atlas_size || h > self.atlas_size {
            return None;
        }

        if let Some(last) = self.atlases.len().checked_sub(1) {
            let atlas = &mut self.atlases[last];
            if atlas.can_insert() {
                if let Some(rect) = atlas.insert(image) {
                    return Some(AtlasRegion { atlas: last, rect });
                }
            }
        }

        debug!("opening atlas #{} ({}px)", self.atlases.len(), self.atlas_size);
        let mut atlas = TextureAtlas::new(self.atlas_size);
        let rect = atlas.insert(image)?;
        self.atlases.push(atlas);
        Some(AtlasRegion { atlas: self.atlases.len() - 1, rect })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_vertical_and_horizontal_neighbours() {
        let top = AtlasRect::new(0, 0, 10, 5);
        let below = AtlasRect::new(0, 5, 10, 7);
        assert_eq!(join(below, top), Some(AtlasRect::new(0, 0, 10, 12)));

        let left = AtlasRect::new(0, 0, 4, 8);
        let right = AtlasRect::new(4, 0, 6, 8);
        assert_eq!(join(left, right), Some(AtlasRect::new(0, 0, 10, 8)));
    }

    #[test]
    fn join_rejects_misaligned_pairs() {
        let a = AtlasRect::new(0, 0, 10, 5);
        let b = AtlasRect::new(1, 5, 10, 5);
        assert_eq!(join(a, b), None);
        let c = AtlasRect::new(0, 6, 10, 5);
        assert_eq!(join(a, c), None, "gap between rects");
    }

    #[test]
    fn merge_collapses_a_chain_of_three() {
        let mut atlas = TextureAtlas::new(30);
        atlas.free = vec![
            AtlasRect::new(20, 0, 10, 30),
            AtlasRect::new(0, 0, 10, 30),
            AtlasRect::new(10, 0, 10, 30),
        ];
        atlas.merge();
        assert_eq!(atlas.free, vec![AtlasRect::new(0, 0, 30, 30)]);
    }

    #[test]
    fn split_discards_empty_leftovers() {
        let mut atlas = TextureAtlas::new(16);
        atlas.free.clear();
        atlas.split(AtlasRect::new(0, 0, 16, 8), AtlasRect::new(0, 0, 16, 8));
        assert!(atlas.free.is_empty());
    }
}
