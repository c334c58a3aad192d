// =============================================================================
// TILEMAP.RS — Render geometry for one tile layer
//
// One quad per cell in grid order (`index = y * width + x`), four vertices
// each.  Empty cells keep a zero-size quad so the vertex buffer stays aligned
// with the grid.  Indices are grouped per tileset so every tileset becomes
// one draw call.
// =============================================================================

use std::collections::BTreeMap;

use glam::Vec2;
use tracing::warn;

use crate::error::{Error, Result};
use crate::geometry::{quad, quad_indices, Vertex};
use crate::map::{Tile, TileLayer, Tileset};
use crate::renderer::{RenderContext, TextureId};
use crate::transform::{Transform, Transformable};

pub struct Tilemap {
    transform: Transform,
    width: u32,
    height: u32,
    tile_width: u32,
    tile_height: u32,
    cells: Vec<Tile>,
    vertices: Vec<Vertex>,
}

impl Tilemap {
    /// An all-empty `width × height` grid of `tile_width × tile_height` cells.
    pub fn new(width: u32, height: u32, tile_width: u32, tile_height: u32) -> Result<Self> {
        if width == 0 || height == 0 || tile_width == 0 || tile_height == 0 {
            return Err(Error::Tilemap { width, height, tile_w: tile_width, tile_h: tile_height });
        }

        let count = width as usize * height as usize;
        let mut tilemap = Self {
            transform: Transform::with_size((width * tile_width) as f32, (height * tile_height) as f32),
            width,
            height,
            tile_width,
            tile_height,
            cells: vec![Tile::Null; count],
            vertices: Vec::with_capacity(count * 4),
        };
        for y in 0..height {
            for x in 0..width {
                tilemap.vertices.extend(quad(tilemap.cell_origin(x, y), Vec2::ZERO, [0.0; 2], [0.0; 2]));
            }
        }
        Ok(tilemap)
    }

    /// Build the geometry of a decoded layer, using each cell's primary tile.
    pub fn from_layer(layer: &TileLayer, tile_width: u32, tile_height: u32, tilesets: &[Tileset]) -> Result<Self> {
        let mut tilemap = Self::new(layer.width, layer.height, tile_width, tile_height)?;
        for (x, y, tile) in layer.cells() {
            if !tile.is_null() && !tilemap.insert_tile(x, y, tile, tilesets) {
                warn!("layer '{}': tile {:?} at ({x}, {y}) has no source rect; left empty", layer.name, tile);
            }
        }
        tilemap.transform.set_position(layer.offset.x, layer.offset.y);
        tilemap.transform.set_opacity(layer.opacity);
        Ok(tilemap)
    }

    pub fn width(&self) -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }
    pub fn vertices(&self) -> &[Vertex] { &self.vertices }

    pub fn tile(&self, x: u32, y: u32) -> Option<Tile> {
        self.index(x, y).map(|i| self.cells[i])
    }

    /// Place `tile` at `(x, y)`, replacing whatever was there.  `Tile::Null`
    /// clears the cell.
    ///
    /// Returns false when the cell is out of bounds or the tile has no source
    /// rectangle in `tilesets`; the map is left unchanged.
    pub fn insert_tile(&mut self, x: u32, y: u32, tile: Tile, tilesets: &[Tileset]) -> bool {
        let Some(index) = self.index(x, y) else {
            return false;
        };
        let origin = self.cell_origin(x, y);

        let corners = match tile.pair() {
            None => quad(origin, Vec2::ZERO, [0.0; 2], [0.0; 2]),
            Some((set, local_id)) => {
                let Some((uv_min, uv_max)) = tilesets.get(set).and_then(|ts| ts.uv_rect(local_id)) else {
                    return false;
                };
                let size = Vec2::new(self.tile_width as f32, self.tile_height as f32);
                quad(origin, size, uv_min, uv_max)
            }
        };

        self.cells[index] = tile;
        self.vertices[index * 4..index * 4 + 4].copy_from_slice(&corners);
        true
    }

    /// Index lists keyed by tileset, each in grid order.
    pub fn batches(&self) -> BTreeMap<usize, Vec<u32>> {
        let mut out: BTreeMap<usize, Vec<u32>> = BTreeMap::new();
        for (i, tile) in self.cells.iter().enumerate() {
            if let Some(set) = tile.tileset() {
                out.entry(set).or_default().extend(quad_indices(i as u32 * 4));
            }
        }
        out
    }

    /// One draw call per tileset.  `textures[i]` is the texture of tileset `i`.
    pub fn draw(&self, ctx: &mut RenderContext<'_>, textures: &[Option<TextureId>]) {
        let model = self.transform.model_matrix();
        let opacity = self.transform.opacity();
        for (set, indices) in self.batches() {
            let texture = textures.get(set).copied().flatten();
            ctx.submit(texture, &self.vertices, &indices, model, opacity);
        }
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| (y * self.width + x) as usize)
    }

    fn cell_origin(&self, x: u32, y: u32) -> Vec2 {
        Vec2::new((x * self.tile_width) as f32, (y * self.tile_height) as f32)
    }
}

impl Transformable for Tilemap {
    fn transform(&self) -> &Transform {
        &self.transform
    }

    fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }
}
