use std::collections::HashMap;
use std::path::Path;

use roxmltree::Node;

use crate::error::{Error, Result};
use crate::geometry::AtlasRect;
use crate::map::property::{parse_properties, Properties};
use crate::map::xml;
use crate::renderer::TextureId;

/// `<image>` of a tileset.
#[derive(Clone, Debug, PartialEq)]
pub struct TilesetImage {
    /// Path relative to the map file.
    pub source: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tileset {
    /// First global id covered by this tileset.
    pub first_gid: u32,
    pub name: String,
    pub tile_width: u32,
    pub tile_height: u32,
    pub spacing: u32,
    pub margin: u32,
    pub tile_count: u32,
    pub columns: u32,
    pub image: Option<TilesetImage>,
    pub properties: Properties,
    pub tile_properties: HashMap<u32, Properties>,
    /// Backend texture holding `image`, assigned by the owner after upload.
    pub texture: Option<TextureId>,
}

impl Tileset {
    /// Parse a `<tileset>` element.
    ///
    /// A reference to an external `.tsx` file (`source` attribute) is handed
    /// to `resolver`, which returns the file's text.
    pub(crate) fn parse(
        node: Node<'_, '_>,
        resolver: &mut dyn FnMut(&str) -> Result<String>,
    ) -> Result<Self> {
        let first_gid: u32 = xml::required(node, "tileset", "firstgid")?;

        let Some(source) = node.attribute("source") else {
            return Self::parse_body(node, first_gid);
        };

        let text = resolver(source)?;
        let doc = roxmltree::Document::parse(&text)?;
        let mut tileset = Self::parse_body(doc.root_element(), first_gid)?;

        // Image paths inside a .tsx are relative to the .tsx itself.
        if let (Some(image), Some(dir)) = (tileset.image.as_mut(), Path::new(source).parent()) {
            if !dir.as_os_str().is_empty() {
                image.source = dir.join(&image.source).to_string_lossy().into_owned();
            }
        }
        Ok(tileset)
    }

    fn parse_body(node: Node<'_, '_>, first_gid: u32) -> Result<Self> {
        let tile_width: u32 = xml::required(node, "tileset", "tilewidth")?;
        let tile_height: u32 = xml::required(node, "tileset", "tileheight")?;
        let spacing: u32 = xml::optional(node, "tileset", "spacing")?.unwrap_or(0);
        let margin: u32 = xml::optional(node, "tileset", "margin")?.unwrap_or(0);

        let image = match xml::child(node, "image") {
            Some(img) => Some(TilesetImage {
                source: xml::required(img, "image", "source")?,
                width: xml::optional(img, "image", "width")?.unwrap_or(0),
                height: xml::optional(img, "image", "height")?.unwrap_or(0),
            }),
            None => None,
        };

        let (image_w, image_h) = image.as_ref().map(|i| (i.width, i.height)).unwrap_or((0, 0));
        let columns = match xml::optional(node, "tileset", "columns")? {
            Some(c) => c,
            None => fit(image_w, tile_width, spacing, margin),
        };
        let tile_count = match xml::optional(node, "tileset", "tilecount")? {
            Some(c) => c,
            None => columns * fit(image_h, tile_height, spacing, margin),
        };

        let mut tile_properties = HashMap::new();
        for tile in xml::children(node, "tile") {
            let id: u32 = xml::required(tile, "tile", "id")?;
            let props = parse_properties(tile)?;
            if !props.is_empty() {
                tile_properties.insert(id, props);
            }
        }

        Ok(Self {
            first_gid,
            name: node.attribute("name").unwrap_or_default().to_string(),
            tile_width,
            tile_height,
            spacing,
            margin,
            tile_count,
            columns,
            image,
            properties: parse_properties(node)?,
            tile_properties,
            texture: None,
        })
    }

    /// Last global id covered by this tileset.
    pub fn last_gid(&self) -> u32 {
        self.first_gid + self.tile_count.saturating_sub(1)
    }

    /// Pixel rectangle of `local_id` on the tileset image.
    pub fn source_rect(&self, local_id: u32) -> Option<AtlasRect> {
        if self.columns == 0 || (self.tile_count > 0 && local_id >= self.tile_count) {
            return None;
        }
        let col = local_id % self.columns;
        let row = local_id / self.columns;
        Some(AtlasRect::new(
            self.margin + col * (self.tile_width + self.spacing),
            self.margin + row * (self.tile_height + self.spacing),
            self.tile_width,
            self.tile_height,
        ))
    }

    /// `(uv_min, uv_max)` of `local_id`.  `None` without image dimensions.
    pub fn uv_rect(&self, local_id: u32) -> Option<([f32; 2], [f32; 2])> {
        let image = self.image.as_ref()?;
        if image.width == 0 || image.height == 0 {
            return None;
        }
        Some(self.source_rect(local_id)?.uv(image.width, image.height))
    }

    pub fn tile_properties(&self, local_id: u32) -> Option<&Properties> {
        self.tile_properties.get(&local_id)
    }
}

/// How many tiles of `tile` px fit along `extent` px.
fn fit(extent: u32, tile: u32, spacing: u32, margin: u32) -> u32 {
    let usable = extent.saturating_sub(2 * margin) + spacing;
    let stride = tile + spacing;
    if stride == 0 { 0 } else { usable / stride }
}

impl TryFrom<&str> for Tileset {
    type Error = Error;

    /// Parse a standalone `.tsx` document with a first gid of 1.
    fn try_from(text: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(text)?;
        Self::parse_body(doc.root_element(), 1)
    }
}
