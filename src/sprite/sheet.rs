use std::collections::HashMap;

use glam::Vec2;
use image::{imageops, RgbaImage};

use crate::error::{Error, Result};
use crate::geometry::AtlasRect;
use crate::renderer::atlas::AtlasSet;
use crate::renderer::TextureId;
use crate::sprite::definition::{MovementMode, SpriteDefinition};

/// A sheet rectangle after packing: which texture it lives on and where.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SheetRegion {
    pub texture: TextureId,
    pub rect: AtlasRect,
    pub uv_min: [f32; 2],
    pub uv_max: [f32; 2],
}

impl SheetRegion {
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.rect.width as f32, self.rect.height as f32)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SheetFrame {
    pub duration_ms: u32,
    pub region: SheetRegion,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SheetMovement {
    pub name: String,
    pub mode: MovementMode,
    pub idle: Option<SheetRegion>,
    pub frames: Vec<SheetFrame>,
}

/// A sprite definition whose frames have been cut out of the sheet image and
/// packed into an `AtlasSet`.
#[derive(Clone, Debug, PartialEq)]
pub struct SpriteSheet {
    name: String,
    movements: Vec<SheetMovement>,
}

impl SpriteSheet {
    /// Crop every idle and frame rect from `sheet` and pack it into `atlases`.
    /// Identical rects are packed once.
    pub fn from_definition(
        name: impl Into<String>,
        definition: &SpriteDefinition,
        sheet: &RgbaImage,
        atlases: &mut AtlasSet,
    ) -> Result<Self> {
        // Check every rect up front so a bad frame never leaves orphans in `atlases`.
        let (sheet_w, sheet_h) = sheet.dimensions();
        for movement in &definition.movements {
            for rect in movement.idle.iter().chain(movement.frames.iter().map(|f| &f.rect)) {
                check_bounds(*rect, sheet_w, sheet_h)?;
                if rect.width > atlases.atlas_size() || rect.height > atlases.atlas_size() {
                    return Err(Error::AtlasOverflow {
                        width: rect.width,
                        height: rect.height,
                        size: atlases.atlas_size(),
                    });
                }
            }
        }

        let mut packed: HashMap<AtlasRect, SheetRegion> = HashMap::new();
        let mut movements = Vec::with_capacity(definition.movements.len());

        for movement in &definition.movements {
            let idle = match movement.idle {
                Some(rect) => Some(pack_rect(rect, sheet, atlases, &mut packed)?),
                None => None,
            };
            let frames = movement
                .frames
                .iter()
                .map(|f| {
                    pack_rect(f.rect, sheet, atlases, &mut packed)
                        .map(|region| SheetFrame { duration_ms: f.duration_ms, region })
                })
                .collect::<Result<Vec<_>>>()?;

            movements.push(SheetMovement { name: movement.name.clone(), mode: movement.mode, idle, frames });
        }

        Ok(Self { name: name.into(), movements })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn movements(&self) -> &[SheetMovement] {
        &self.movements
    }

    pub fn movement(&self, name: &str) -> Option<&SheetMovement> {
        self.movements.iter().find(|m| m.name == name)
    }

    pub fn movement_index(&self, name: &str) -> Option<usize> {
        self.movements.iter().position(|m| m.name == name)
    }
}

fn check_bounds(rect: AtlasRect, sheet_w: u32, sheet_h: u32) -> Result<()> {
    if rect.is_empty() || rect.right() > sheet_w || rect.bottom() > sheet_h {
        return Err(Error::FrameOutOfBounds {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            sheet_w,
            sheet_h,
        });
    }
    Ok(())
}

fn pack_rect(
    rect: AtlasRect,
    sheet: &RgbaImage,
    atlases: &mut AtlasSet,
    packed: &mut HashMap<AtlasRect, SheetRegion>,
) -> Result<SheetRegion> {
    if let Some(region) = packed.get(&rect) {
        return Ok(*region);
    }

    let cut = imageops::crop_imm(sheet, rect.x, rect.y, rect.width, rect.height).to_image();
    let placed = atlases.insert(&cut).ok_or(Error::AtlasOverflow {
        width: rect.width,
        height: rect.height,
        size: atlases.atlas_size(),
    })?;

    let size = atlases.atlas_size();
    let (uv_min, uv_max) = placed.rect.uv(size, size);
    let region = SheetRegion { texture: atlases.texture_id(placed.atlas), rect: placed.rect, uv_min, uv_max };
    packed.insert(rect, region);
    Ok(region)
}
