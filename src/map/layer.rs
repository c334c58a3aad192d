use glam::Vec2;
use roxmltree::Node;

use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::map::decode::{self, Encoding, Tile};
use crate::map::property::{parse_properties, Properties};
use crate::map::xml;

/// A map layer in document order.
#[derive(Clone, Debug)]
pub enum Layer {
    Tile(TileLayer),
    Object(ObjectLayer),
}

impl Layer {
    pub fn name(&self) -> &str {
        match self {
            Layer::Tile(l) => &l.name,
            Layer::Object(l) => &l.name,
        }
    }

    pub fn visible(&self) -> bool {
        match self {
            Layer::Tile(l) => l.visible,
            Layer::Object(l) => l.visible,
        }
    }

    pub fn as_tile(&self) -> Option<&TileLayer> {
        match self {
            Layer::Tile(l) => Some(l),
            Layer::Object(_) => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectLayer> {
        match self {
            Layer::Object(l) => Some(l),
            Layer::Tile(_) => None,
        }
    }
}

// ── Tile layers ──────────────────────────────────────────────────────────────

/// Grid of tiles, row-major (`index = y * width + x`).
///
/// Every cell owns at least one entry (`Tile::Null` for empty cells) and may
/// own several when more than one tileset qualifies for its gid.  Entries
/// live in one flat list; `cell_starts[i]..cell_starts[i + 1]` is cell `i`.
#[derive(Clone, Debug)]
pub struct TileLayer {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub opacity: f32,
    pub visible: bool,
    pub offset: Vec2,
    pub encoding: Encoding,
    pub properties: Properties,
    tiles: Vec<Tile>,
    cell_starts: Vec<usize>,
}

impl TileLayer {
    /// Build a layer from raw ids.  `first_gids` are the map's tilesets'
    /// first gids in ascending order.
    pub fn from_gids(
        name: impl Into<String>,
        width: u32,
        height: u32,
        gids: &[u32],
        first_gids: &[u32],
    ) -> Result<Self> {
        let name = name.into();
        let expected = width as usize * height as usize;
        if gids.len() != expected {
            return Err(Error::LayerSize { layer: name, expected, actual: gids.len() });
        }

        let mut tiles = Vec::with_capacity(expected);
        let mut cell_starts = Vec::with_capacity(expected + 1);
        for &raw in gids {
            cell_starts.push(tiles.len());
            decode::resolve(raw, first_gids, &mut tiles);
        }
        cell_starts.push(tiles.len());

        Ok(Self {
            name,
            width,
            height,
            opacity: 1.0,
            visible: true,
            offset: Vec2::ZERO,
            encoding: Encoding::Csv,
            properties: Properties::new(),
            tiles,
            cell_starts,
        })
    }

    pub(crate) fn parse(node: Node<'_, '_>, width: u32, height: u32, first_gids: &[u32]) -> Result<Self> {
        let name: String = xml::required(node, "layer", "name")?;
        let data = xml::child(node, "data").ok_or(Error::MissingAttribute { element: "layer", attribute: "data" })?;
        let expected = width as usize * height as usize;
        let (gids, encoding) = decode::decode_data(data, expected)?;

        let mut layer = Self::from_gids(name, width, height, &gids, first_gids)?;
        layer.encoding = encoding;
        layer.opacity = xml::optional(node, "layer", "opacity")?.unwrap_or(1.0f32).clamp(0.0, 1.0);
        layer.visible = xml::flag(node, "layer", "visible", true)?;
        layer.offset = Vec2::new(
            xml::optional(node, "layer", "offsetx")?.unwrap_or(0.0),
            xml::optional(node, "layer", "offsety")?.unwrap_or(0.0),
        );
        layer.properties = parse_properties(node)?;
        Ok(layer)
    }

    pub fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| (y * self.width + x) as usize)
    }

    /// Primary tile of a cell (the highest-first-gid match).
    pub fn tile_at(&self, x: u32, y: u32) -> Option<Tile> {
        self.tiles_at(x, y).first().copied()
    }

    /// Every entry recorded for a cell.  Empty when out of bounds.
    pub fn tiles_at(&self, x: u32, y: u32) -> &[Tile] {
        match self.index(x, y) {
            Some(i) => &self.tiles[self.cell_starts[i]..self.cell_starts[i + 1]],
            None => &[],
        }
    }

    /// Cells in grid order as `(x, y, primary tile)`.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, Tile)> + '_ {
        (0..self.width * self.height).map(move |i| {
            let start = self.cell_starts[i as usize];
            (i % self.width, i / self.width, self.tiles[start])
        })
    }

    /// Total number of entries, including extra per-cell matches.
    pub fn entry_count(&self) -> usize {
        self.tiles.len()
    }
}

// ── Object layers ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct MapObject {
    pub id: u32,
    pub name: String,
    /// Tiled's `type` (or `class` in newer files).
    pub kind: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub gid: Option<u32>,
    pub visible: bool,
    pub properties: Properties,
}

impl MapObject {
    fn parse(node: Node<'_, '_>) -> Result<Self> {
        Ok(Self {
            id: xml::optional(node, "object", "id")?.unwrap_or(0),
            name: node.attribute("name").unwrap_or_default().to_string(),
            kind: node.attribute("type").or_else(|| node.attribute("class")).unwrap_or_default().to_string(),
            x: xml::optional(node, "object", "x")?.unwrap_or(0.0),
            y: xml::optional(node, "object", "y")?.unwrap_or(0.0),
            width: xml::optional(node, "object", "width")?.unwrap_or(0.0),
            height: xml::optional(node, "object", "height")?.unwrap_or(0.0),
            gid: xml::optional(node, "object", "gid")?,
            visible: xml::flag(node, "object", "visible", true)?,
            properties: parse_properties(node)?,
        })
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Point objects have no area and never collide.
    pub fn is_null(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ObjectLayer {
    pub name: String,
    pub opacity: f32,
    pub visible: bool,
    pub offset: Vec2,
    pub objects: Vec<MapObject>,
    pub properties: Properties,
}

impl ObjectLayer {
    pub(crate) fn parse(node: Node<'_, '_>) -> Result<Self> {
        Ok(Self {
            name: node.attribute("name").unwrap_or_default().to_string(),
            opacity: xml::optional(node, "objectgroup", "opacity")?.unwrap_or(1.0f32).clamp(0.0, 1.0),
            visible: xml::flag(node, "objectgroup", "visible", true)?,
            offset: Vec2::new(
                xml::optional(node, "objectgroup", "offsetx")?.unwrap_or(0.0),
                xml::optional(node, "objectgroup", "offsety")?.unwrap_or(0.0),
            ),
            objects: xml::children(node, "object").map(MapObject::parse).collect::<Result<_>>()?,
            properties: parse_properties(node)?,
        })
    }

    /// Indices of non-null objects whose bounds intersect `rect`.
    pub fn colliding(&self, rect: &Rect) -> Vec<usize> {
        self.objects
            .iter()
            .enumerate()
            .filter(|(_, o)| !o.is_null() && o.bounds().intersects(rect))
            .map(|(i, _)| i)
            .collect()
    }
}
