pub mod definition;
pub mod sheet;

use std::rc::Rc;

use glam::Vec2;
use tracing::error;

use crate::geometry::{quad, quad_indices};
use crate::renderer::RenderContext;
use crate::transform::{Transform, Transformable};

pub use definition::{Frame, Movement, MovementMode, SpriteDefinition};
pub use sheet::{SheetFrame, SheetMovement, SheetRegion, SpriteSheet};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Playback {
    /// Showing the movement's idle rect.
    Idle,
    Playing,
    /// A non-looping movement ran out; its last frame stays on screen.
    Finished,
}

/// An animated, transformable sprite.
///
/// Many sprites share one `SpriteSheet` (and therefore one set of atlas
/// textures) through an `Rc`.
pub struct Sprite {
    transform: Transform,
    sheet: Option<Rc<SpriteSheet>>,
    movement: usize,
    frame: usize,
    elapsed_ms: f32,
    playback: Playback,
    looping: bool,
    tint: [f32; 4],
}

impl Sprite {
    pub fn new(sheet: Rc<SpriteSheet>) -> Self {
        let mut sprite = Self { sheet: Some(sheet), ..Self::null() };
        sprite.sync_size();
        sprite
    }

    /// A sprite with no sheet.  Drawing it logs an error and does nothing.
    pub fn null() -> Self {
        Self {
            transform: Transform::new(),
            sheet: None,
            movement: 0,
            frame: 0,
            elapsed_ms: 0.0,
            playback: Playback::Idle,
            looping: true,
            tint: [1.0, 1.0, 1.0, 1.0],
        }
    }

    pub fn is_null(&self) -> bool {
        self.sheet.is_none()
    }

    pub fn sheet(&self) -> Option<&Rc<SpriteSheet>> {
        self.sheet.as_ref()
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn set_tint(&mut self, tint: [f32; 4]) {
        self.tint = tint;
    }

    pub fn is_playing(&self) -> bool {
        self.playback == Playback::Playing
    }

    pub fn current_frame(&self) -> usize {
        self.frame
    }

    pub fn current_movement(&self) -> Option<&SheetMovement> {
        self.sheet.as_ref()?.movements().get(self.movement)
    }

    /// Start (or keep) playing `name`.  Returns false for unknown movements.
    ///
    /// Re-playing the movement that is already running does not rewind it.
    pub fn play(&mut self, name: &str) -> bool {
        let Some(index) = self.sheet.as_ref().and_then(|s| s.movement_index(name)) else {
            return false;
        };
        if index == self.movement && self.playback == Playback::Playing {
            return true;
        }
        self.movement = index;
        self.frame = 0;
        self.elapsed_ms = 0.0;
        self.playback = Playback::Playing;
        self.sync_size();
        true
    }

    /// Stop animating and show the idle rect of the current movement.
    pub fn stop(&mut self) {
        self.playback = Playback::Idle;
        self.frame = 0;
        self.elapsed_ms = 0.0;
        self.sync_size();
    }

    /// Region that would be drawn right now.
    pub fn current_region(&self) -> Option<SheetRegion> {
        let movement = self.current_movement()?;
        match self.playback {
            Playback::Idle => movement.idle.or_else(|| movement.frames.first().map(|f| f.region)),
            Playback::Playing | Playback::Finished => movement.frames.get(self.frame).map(|f| f.region),
        }
    }

    /// Advance the transform and the frame timer.
    pub fn update(&mut self, dt: f32) {
        self.transform.update(dt);

        if self.playback != Playback::Playing {
            return;
        }
        let Some(sheet) = self.sheet.clone() else {
            return;
        };
        let Some(frames) = sheet.movements().get(self.movement).map(|m| m.frames.as_slice()) else {
            return;
        };
        if frames.is_empty() {
            return;
        }

        let before = self.frame;
        self.elapsed_ms += dt * 1000.0;
        loop {
            let duration = frames[self.frame].duration_ms.max(1) as f32;
            if self.elapsed_ms < duration {
                break;
            }
            self.elapsed_ms -= duration;
            if self.frame + 1 < frames.len() {
                self.frame += 1;
            } else if self.looping {
                self.frame = 0;
            } else {
                self.playback = Playback::Finished;
                self.elapsed_ms = 0.0;
                break;
            }
        }
        if self.frame != before {
            self.sync_size();
        }
    }

    pub fn draw(&self, ctx: &mut RenderContext<'_>) {
        if self.is_null() {
            error!("Sprite::draw called on a null sprite");
            return;
        }
        let Some(region) = self.current_region() else {
            return;
        };

        let mut vertices = quad(Vec2::ZERO, region.size(), region.uv_min, region.uv_max);
        for v in &mut vertices {
            v.set_color(self.tint);
        }
        ctx.submit(
            Some(region.texture),
            &vertices,
            &quad_indices(0),
            self.transform.model_matrix(),
            self.transform.opacity(),
        );
    }

    fn sync_size(&mut self) {
        if let Some(region) = self.current_region() {
            let size = region.size();
            self.transform.set_size(size.x, size.y);
        }
    }
}

impl Transformable for Sprite {
    fn transform(&self) -> &Transform {
        &self.transform
    }

    fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }
}
