use glam::Vec2;
use serde::Deserialize;

use crate::geometry::Rect;
use crate::renderer::RenderContext;
use crate::sprite::Sprite;
use crate::transform::{Transform, TransformEvent, Transformable};

/// Default walking speed in pixels per second.
pub const DEFAULT_PLAYER_SPEED: f32 = 128.0;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveMode {
    /// Whole-tile steps, interpolated over time.
    #[default]
    Tile,
    /// Free pixel movement, applied immediately.
    Pixel,
}

/// The map's actor.  Its transform position is the top-left pixel of the
/// tile it stands on (tile mode) or its exact pixel position (pixel mode).
pub struct MapPlayer {
    transform: Transform,
    sprite: Option<Sprite>,
    mode: MoveMode,
    speed: f32,
    tile: (u32, u32),
    stepping: bool,
}

impl MapPlayer {
    pub fn new(tile_width: u32, tile_height: u32) -> Self {
        let mut transform = Transform::with_size(tile_width as f32, tile_height as f32);
        transform.set_move_speed(DEFAULT_PLAYER_SPEED, DEFAULT_PLAYER_SPEED);
        Self {
            transform,
            sprite: None,
            mode: MoveMode::Tile,
            speed: DEFAULT_PLAYER_SPEED,
            tile: (0, 0),
            stepping: false,
        }
    }

    pub fn mode(&self) -> MoveMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: MoveMode) {
        self.mode = mode;
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.abs();
        self.transform.set_move_speed(self.speed, self.speed);
    }

    /// Tile the player occupies.  Updated as soon as a step is accepted.
    pub fn tile_position(&self) -> (u32, u32) {
        self.tile
    }

    /// True between an accepted tile step and its landing.
    pub fn is_stepping(&self) -> bool {
        self.stepping
    }

    pub fn sprite(&self) -> Option<&Sprite> {
        self.sprite.as_ref()
    }

    pub fn sprite_mut(&mut self) -> Option<&mut Sprite> {
        self.sprite.as_mut()
    }

    pub fn set_sprite(&mut self, sprite: Sprite) {
        self.sprite = Some(sprite);
        self.sync_sprite();
    }

    pub fn take_sprite(&mut self) -> Option<Sprite> {
        self.sprite.take()
    }

    /// Collision rectangle at `position`.
    pub fn rect_at(&self, position: Vec2) -> Rect {
        let size = self.transform.size();
        Rect::new(position.x, position.y, size.x, size.y)
    }

    pub(crate) fn place_at_tile(&mut self, x: u32, y: u32, tile_w: u32, tile_h: u32) {
        self.transform.stop_moving();
        self.transform.drain_events();
        self.tile = (x, y);
        self.stepping = false;
        self.transform.set_position((x * tile_w) as f32, (y * tile_h) as f32);
        self.sync_sprite();
    }

    pub(crate) fn begin_step(&mut self, tile: (u32, u32), dx: f32, dy: f32) {
        self.tile = tile;
        self.stepping = true;
        self.transform.move_by(dx, dy);
    }

    pub(crate) fn jump_to(&mut self, tile: (u32, u32), position: Vec2) {
        self.tile = tile;
        self.transform.set_position(position.x, position.y);
        self.sync_sprite();
    }

    /// Advance movement and animation.  Returns true on the frame a tile
    /// step lands.
    pub(crate) fn update(&mut self, dt: f32) -> bool {
        self.transform.update(dt);
        let stopped = self.transform.drain_events().contains(&TransformEvent::MoveStopped);

        let landed = self.stepping && (stopped || !self.transform.is_moving());
        if landed {
            self.stepping = false;
        }

        self.sync_sprite();
        if let Some(sprite) = self.sprite.as_mut() {
            sprite.update(dt);
        }
        landed
    }

    pub(crate) fn snap(&mut self, tile_w: u32, tile_h: u32) {
        let (x, y) = self.tile;
        self.transform.set_position((x * tile_w) as f32, (y * tile_h) as f32);
        self.sync_sprite();
    }

    pub fn draw(&self, ctx: &mut RenderContext<'_>) {
        if let Some(sprite) = &self.sprite {
            sprite.draw(ctx);
        }
    }

    fn sync_sprite(&mut self) {
        let position = self.transform.position();
        let opacity = self.transform.opacity();
        if let Some(sprite) = self.sprite.as_mut() {
            let t = sprite.transform_mut();
            t.set_position(position.x, position.y);
            t.set_opacity(opacity);
        }
    }
}

impl Transformable for MapPlayer {
    fn transform(&self) -> &Transform {
        &self.transform
    }

    fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }
}
