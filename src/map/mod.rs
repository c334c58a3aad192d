// =============================================================================
// MAP — TMX maps, tile/object layers and player movement
//
// Loading:  Map::parse / parse_with / load  ->  tilesets sorted by firstgid,
//           layers in document order, one Tilemap per tile layer.
//
// Movement: every attempt runs in two phases.
//   1. veto    "about to step" for the destination tile of every tile layer,
//              then every object the destination rectangle touches.  The
//              first rejection aborts with no state change.
//   2. commit  "left" for the vacated tile and objects, "stepped" for newly
//              touched objects, then the player starts moving.
//   Tile steps fire "stepped" for the destination tiles once they land.
// =============================================================================

pub mod decode;
pub mod events;
pub mod layer;
pub mod player;
pub mod property;
pub mod tileset;
pub(crate) mod xml;

use std::fs;
use std::path::Path;

use glam::Vec2;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::renderer::{RenderContext, TextureId};
use crate::sprite::MovementMode;
use crate::tilemap::Tilemap;
use crate::transform::Transformable;

pub use decode::{split_gid, Compression, Encoding, FlipFlags, Tile, FLIP_D, FLIP_H, FLIP_V};
pub use events::{MapEventHandler, NoEvents, ObjectEvent, TileEvent};
pub use layer::{Layer, MapObject, ObjectLayer, TileLayer};
pub use player::{MapPlayer, MoveMode, DEFAULT_PLAYER_SPEED};
pub use property::{Properties, PropertyValue};
pub use tileset::{Tileset, TilesetImage};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Orientation {
    #[default]
    Orthogonal,
    Isometric,
    Staggered,
    Hexagonal,
}

impl Orientation {
    fn parse(value: &str) -> Result<Self> {
        match value {
            "orthogonal" => Ok(Orientation::Orthogonal),
            "isometric" => Ok(Orientation::Isometric),
            "staggered" => Ok(Orientation::Staggered),
            "hexagonal" => Ok(Orientation::Hexagonal),
            other => Err(Error::InvalidAttribute {
                element: "map",
                attribute: "orientation",
                value: other.to_string(),
            }),
        }
    }
}

/// Parse `#rrggbb` or `#aarrggbb` into RGBA bytes.
pub fn parse_color(value: &str) -> Option<[u8; 4]> {
    let hex = value.trim().trim_start_matches('#');
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        6 => Some([byte(0)?, byte(2)?, byte(4)?, 255]),
        8 => Some([byte(2)?, byte(4)?, byte(6)?, byte(0)?]),
        _ => None,
    }
}

// ── Map ──────────────────────────────────────────────────────────────────────

pub struct Map {
    pub orientation: Orientation,
    /// Size in tiles.
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    /// RGBA.
    pub background: Option<[u8; 4]>,
    pub properties: Properties,
    tilesets: Vec<Tileset>,
    layers: Vec<Layer>,
    /// `tilemaps[i]` renders `layers[i]` when it is a tile layer.
    tilemaps: Vec<Option<Tilemap>>,
    player: MapPlayer,
}

impl Map {
    /// Parse a map whose tilesets are all embedded.
    pub fn parse(xml: &str) -> Result<Self> {
        Self::parse_with(xml, |source| Err(Error::ExternalTileset(source.to_string())))
    }

    /// Parse a map, fetching external `.tsx` tilesets through `resolver`.
    pub fn parse_with(xml: &str, mut resolver: impl FnMut(&str) -> Result<String>) -> Result<Self> {
        let doc = roxmltree::Document::parse(xml)?;
        let root = doc.root_element();

        let orientation = match root.attribute("orientation") {
            Some(o) => Orientation::parse(o)?,
            None => Orientation::Orthogonal,
        };
        let width: u32 = xml::required(root, "map", "width")?;
        let height: u32 = xml::required(root, "map", "height")?;
        let tile_width: u32 = xml::required(root, "map", "tilewidth")?;
        let tile_height: u32 = xml::required(root, "map", "tileheight")?;
        for (attribute, value) in [("tilewidth", tile_width), ("tileheight", tile_height)] {
            if value == 0 {
                return Err(Error::InvalidAttribute { element: "map", attribute, value: value.to_string() });
            }
        }
        let background = match root.attribute("backgroundcolor") {
            Some(c) => Some(parse_color(c).ok_or_else(|| Error::InvalidAttribute {
                element: "map",
                attribute: "backgroundcolor",
                value: c.to_string(),
            })?),
            None => None,
        };

        let mut tilesets = xml::children(root, "tileset")
            .map(|node| Tileset::parse(node, &mut resolver))
            .collect::<Result<Vec<_>>>()?;
        tilesets.sort_by_key(|t| t.first_gid);
        let first_gids: Vec<u32> = tilesets.iter().map(|t| t.first_gid).collect();

        let mut layers = Vec::new();
        let mut tilemaps = Vec::new();
        for node in root.children().filter(|n| n.is_element()) {
            match node.tag_name().name() {
                "layer" => {
                    let layer = TileLayer::parse(node, width, height, &first_gids)?;
                    tilemaps.push(Some(Tilemap::from_layer(&layer, tile_width, tile_height, &tilesets)?));
                    layers.push(Layer::Tile(layer));
                }
                "objectgroup" => {
                    layers.push(Layer::Object(ObjectLayer::parse(node)?));
                    tilemaps.push(None);
                }
                "imagelayer" | "group" => {
                    warn!("map: <{}> layers are not supported; skipping", node.tag_name().name());
                }
                _ => {}
            }
        }

        let mut map = Self {
            orientation,
            width,
            height,
            tile_width,
            tile_height,
            background,
            properties: property::parse_properties(root)?,
            tilesets,
            layers,
            tilemaps,
            player: MapPlayer::new(tile_width, tile_height),
        };

        let (px, py) = map.spawn_tile();
        map.player.place_at_tile(px, py, tile_width, tile_height);

        info!(
            "map: {}x{} tiles of {}x{}px, {} tileset(s), {} layer(s), player at ({px}, {py})",
            width,
            height,
            tile_width,
            tile_height,
            map.tilesets.len(),
            map.layers.len()
        );
        Ok(map)
    }

    /// Read a `.tmx` file; external tilesets are read relative to it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        Self::parse_with(&text, |source| {
            let file = dir.join(source);
            fs::read_to_string(&file).map_err(|e| Error::io(file, e))
        })
    }

    /// Tile of the first object typed `player`, or (0, 0).
    fn spawn_tile(&self) -> (u32, u32) {
        let spawn = self
            .layers
            .iter()
            .filter_map(Layer::as_object)
            .flat_map(|l| l.objects.iter())
            .find(|o| o.kind == "player");

        match spawn {
            Some(o) => {
                let x = (o.x.max(0.0) as u32 / self.tile_width).min(self.width.saturating_sub(1));
                let y = (o.y.max(0.0) as u32 / self.tile_height).min(self.height.saturating_sub(1));
                (x, y)
            }
            None => (0, 0),
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn tilesets(&self) -> &[Tileset] {
        &self.tilesets
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name() == name)
    }

    pub fn tilemap(&self, layer: usize) -> Option<&Tilemap> {
        self.tilemaps.get(layer)?.as_ref()
    }

    pub fn tilemap_mut(&mut self, layer: usize) -> Option<&mut Tilemap> {
        self.tilemaps.get_mut(layer)?.as_mut()
    }

    pub fn player(&self) -> &MapPlayer {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut MapPlayer {
        &mut self.player
    }

    pub fn set_tileset_texture(&mut self, tileset: usize, texture: TextureId) -> bool {
        match self.tilesets.get_mut(tileset) {
            Some(ts) => {
                ts.texture = Some(texture);
                true
            }
            None => false,
        }
    }

    /// Map size in pixels.
    pub fn pixel_size(&self) -> Vec2 {
        Vec2::new((self.width * self.tile_width) as f32, (self.height * self.tile_height) as f32)
    }

    /// Move the player to a tile without animation or events.
    pub fn place_player(&mut self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.player.place_at_tile(x, y, self.tile_width, self.tile_height);
        true
    }

    // ── Movement ──────────────────────────────────────────────────────────

    /// Step the player by whole tiles.
    ///
    /// Returns false when the destination is outside the map, a step is
    /// still in flight, or a handler vetoed.  In pixel mode the delta is
    /// converted to pixels and applied immediately.
    pub fn move_player_by(&mut self, dx: i32, dy: i32, handler: &mut dyn MapEventHandler) -> bool {
        if self.player.mode() == MoveMode::Pixel {
            let (tw, th) = (self.tile_width as f32, self.tile_height as f32);
            return self.move_player_by_pixels(dx as f32 * tw, dy as f32 * th, handler);
        }
        if dx == 0 && dy == 0 {
            return true;
        }
        if self.player.is_stepping() {
            return false;
        }

        let old = self.player.tile_position();
        let Some(new) = self.offset_tile(old, dx, dy) else {
            return false;
        };

        let old_rect = self.tile_rect(old);
        let new_rect = self.tile_rect(new);
        if !self.step_allowed(Some(new), &new_rect, handler) {
            return false;
        }
        self.commit_step(Some(old), &old_rect, &new_rect, handler);

        let (tw, th) = (self.tile_width as f32, self.tile_height as f32);
        self.player.begin_step(new, dx as f32 * tw, dy as f32 * th);
        true
    }

    /// Move the player by a pixel offset, immediately.
    ///
    /// Tile events only fire when the tile under the player's position
    /// changes; object events fire as the player's rectangle starts or stops
    /// touching objects.
    pub fn move_player_by_pixels(&mut self, dx: f32, dy: f32, handler: &mut dyn MapEventHandler) -> bool {
        if dx == 0.0 && dy == 0.0 {
            return true;
        }
        let old_pos = self.player.position();
        let new_pos = old_pos + Vec2::new(dx, dy);
        let limit = self.pixel_size();
        if new_pos.x < 0.0 || new_pos.y < 0.0 || new_pos.x >= limit.x || new_pos.y >= limit.y {
            return false;
        }

        let old_tile = self.player.tile_position();
        let new_tile = (new_pos.x as u32 / self.tile_width, new_pos.y as u32 / self.tile_height);
        let changed = old_tile != new_tile;

        let old_rect = self.player.rect_at(old_pos);
        let new_rect = self.player.rect_at(new_pos);
        if !self.step_allowed(changed.then_some(new_tile), &new_rect, handler) {
            return false;
        }
        self.commit_step(changed.then_some(old_tile), &old_rect, &new_rect, handler);

        self.player.jump_to(new_tile, new_pos);
        if changed {
            self.fire_tile_stepped(new_tile, handler);
        }
        true
    }

    /// Play `movement` on the player's sprite.  Tile-mode movements also step
    /// the player by their advance; a refused step leaves the sprite as is.
    pub fn move_player_along(&mut self, movement: &str, handler: &mut dyn MapEventHandler) -> bool {
        let Some(mode) = self
            .player
            .sprite()
            .and_then(|s| s.sheet())
            .and_then(|sheet| sheet.movement(movement))
            .map(|m| m.mode)
        else {
            return false;
        };

        if let MovementMode::Tile { advance_x, advance_y } = mode {
            if !self.move_player_by(advance_x, advance_y, handler) {
                return false;
            }
        }
        self.player.sprite_mut().is_some_and(|s| s.play(movement))
    }

    /// Advance the player.  Fires "stepped" for the landed tile once a tile
    /// step completes.
    pub fn update(&mut self, dt: f32, handler: &mut dyn MapEventHandler) {
        if self.player.update(dt) {
            self.player.snap(self.tile_width, self.tile_height);
            if let Some(sprite) = self.player.sprite_mut() {
                sprite.stop();
            }
            let tile = self.player.tile_position();
            self.fire_tile_stepped(tile, handler);
        }
        // Layer completion events stay queued for the owner to drain.
        for tilemap in self.tilemaps.iter_mut().flatten() {
            tilemap.update_transform(dt);
        }
    }

    /// Draw visible tile layers in order, then the player.
    pub fn draw(&self, ctx: &mut RenderContext<'_>) {
        let textures: Vec<Option<TextureId>> = self.tilesets.iter().map(|t| t.texture).collect();
        for (layer, tilemap) in self.layers.iter().zip(&self.tilemaps) {
            if let (true, Some(tilemap)) = (layer.visible(), tilemap) {
                tilemap.draw(ctx, &textures);
            }
        }
        self.player.draw(ctx);
    }

    // ── Event protocol ────────────────────────────────────────────────────

    fn offset_tile(&self, (x, y): (u32, u32), dx: i32, dy: i32) -> Option<(u32, u32)> {
        let nx = x.checked_add_signed(dx)?;
        let ny = y.checked_add_signed(dy)?;
        (nx < self.width && ny < self.height).then_some((nx, ny))
    }

    fn tile_rect(&self, (x, y): (u32, u32)) -> Rect {
        let (tw, th) = (self.tile_width as f32, self.tile_height as f32);
        Rect::new(x as f32 * tw, y as f32 * th, tw, th)
    }

    fn primary_tiles(&self, (x, y): (u32, u32)) -> Vec<TileEvent> {
        self.layers
            .iter()
            .enumerate()
            .filter_map(|(i, l)| Some((i, l.as_tile()?)))
            .filter_map(|(i, l)| l.tile_at(x, y).filter(|t| !t.is_null()).map(|t| TileEvent::new(t, x, y, i)))
            .collect()
    }

    fn touching(&self, rect: &Rect) -> Vec<ObjectEvent> {
        let mut out = Vec::new();
        for (i, layer) in self.layers.iter().enumerate() {
            if let Layer::Object(objects) = layer {
                for index in objects.colliding(rect) {
                    out.push(ObjectEvent::new(objects.objects[index].clone(), index, i));
                }
            }
        }
        out
    }

    /// Veto phase.  `tile` is `None` when the tile under the player does not
    /// change.  Objects already touched at the old position are not asked
    /// again.
    fn step_allowed(&self, tile: Option<(u32, u32)>, new_rect: &Rect, handler: &mut dyn MapEventHandler) -> bool {
        if let Some(tile) = tile {
            for mut event in self.primary_tiles(tile) {
                handler.tile_about_to_step(&mut event);
                if !event.is_accepted() {
                    return false;
                }
            }
        }

        let current = self.player.rect_at(self.player.position());
        for mut event in self.touching(new_rect) {
            if self.player.mode() == MoveMode::Pixel && event.object.bounds().intersects(&current) {
                continue;
            }
            handler.object_about_to_step(&mut event);
            if !event.is_accepted() {
                return false;
            }
        }
        true
    }

    fn commit_step(
        &self,
        old_tile: Option<(u32, u32)>,
        old_rect: &Rect,
        new_rect: &Rect,
        handler: &mut dyn MapEventHandler,
    ) {
        if let Some(old) = old_tile {
            for event in self.primary_tiles(old) {
                handler.tile_left(&event);
            }
        }

        for event in self.touching(old_rect) {
            if !event.object.bounds().intersects(new_rect) {
                handler.object_left(&event);
            }
        }

        let pixel = self.player.mode() == MoveMode::Pixel;
        for event in self.touching(new_rect) {
            if pixel && event.object.bounds().intersects(old_rect) {
                continue;
            }
            handler.object_stepped(&event);
        }
    }

    fn fire_tile_stepped(&self, tile: (u32, u32), handler: &mut dyn MapEventHandler) {
        for event in self.primary_tiles(tile) {
            handler.tile_stepped(&event);
        }
    }
}
