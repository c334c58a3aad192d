use std::path::Path;

use image::RgbaImage;
use tracing::{debug, warn};

use crate::camera::Camera;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::map::Map;
use crate::renderer::sprite_atlas::SpriteLibrary;
use crate::renderer::{RenderBackend, RenderContext, TextureId};
use crate::scene::{Scene, SceneStack};
use crate::sprite::Sprite;

/// Tileset textures are numbered from here; sprite atlases count up from 0.
pub const TILESET_TEXTURE_BASE: u32 = 1 << 20;

/// Headless engine core.  The host owns the window and the graphics backend
/// and calls `frame` once per tick.
pub struct Engine {
    config: EngineConfig,
    /// 2D camera; its view-projection is applied to every draw.
    pub camera: Camera,
    sprites: SpriteLibrary,
    scenes: SceneStack,
    /// Decoded images waiting for their first upload.
    pending_uploads: Vec<(TextureId, RgbaImage)>,
    next_texture: u32,
    dt: f32,
    tick: u64,
    /// Set by `request_quit()`; the host stops calling `frame` once it is seen.
    quit_requested: bool,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let sprites = match &config.sprite_folder {
            Some(folder) => SpriteLibrary::load_folder(folder, config.atlas_size),
            None => SpriteLibrary::new(config.atlas_size),
        };

        // Centre the camera on the logical screen so world (0, 0) is the
        // top-left corner at zoom 1.
        let camera = Camera::new(
            config.window.logical_width as f32 / 2.0,
            config.window.logical_height as f32 / 2.0,
        );

        Self {
            config,
            camera,
            sprites,
            scenes: SceneStack::new(),
            pending_uploads: Vec::new(),
            next_texture: TILESET_TEXTURE_BASE,
            dt: 0.0,
            tick: 0,
            quit_requested: false,
        }
    }

    pub fn with_scene(config: EngineConfig, scene: Box<dyn Scene>) -> Self {
        let mut engine = Self::new(config);
        engine.push_scene(scene);
        engine
    }

    // ── Accessors ──────────────────────────────────────────────────────────

    pub fn config(&self) -> &EngineConfig { &self.config }
    pub fn dt(&self) -> f32 { self.dt }
    pub fn tick(&self) -> u64 { self.tick }
    pub fn sprites(&self) -> &SpriteLibrary { &self.sprites }
    pub fn sprites_mut(&mut self) -> &mut SpriteLibrary { &mut self.sprites }
    pub fn scene_count(&self) -> usize { self.scenes.len() + self.scenes.pending_len() }

    /// Queue `scene`; it is entered at the start of the next frame.
    pub fn push_scene(&mut self, scene: Box<dyn Scene>) {
        self.scenes.queue(scene);
    }

    pub fn request_quit(&mut self) {
        self.quit_requested = true;
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    // ── Resources ──────────────────────────────────────────────────────────

    /// A sprite using the sheet `name`, or a null sprite when none is loaded.
    pub fn sprite(&self, name: &str) -> Sprite {
        match self.sprites.get(name) {
            Some(sheet) => Sprite::new(sheet),
            None => {
                warn!("no sprite sheet named '{name}'");
                Sprite::null()
            }
        }
    }

    /// Load a `.tmx` map, apply the configured player settings and queue its
    /// tileset images for upload.  A missing tileset image is not fatal; that
    /// tileset draws untextured.
    pub fn load_map(&mut self, path: impl AsRef<Path>) -> Result<Map> {
        let path = path.as_ref();
        let mut map = Map::load(path)?;

        let player = map.player_mut();
        player.set_speed(self.config.player_speed);
        player.set_mode(self.config.player_move_mode);

        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        let sources: Vec<Option<String>> =
            map.tilesets().iter().map(|t| t.image.as_ref().map(|i| i.source.clone())).collect();

        for (index, source) in sources.into_iter().enumerate() {
            let Some(source) = source else { continue };
            let file = dir.join(&source);
            match image::open(&file) {
                Ok(img) => {
                    let id = self.queue_texture(img.to_rgba8());
                    map.set_tileset_texture(index, id);
                }
                Err(e) => warn!("map: failed to load tileset image {}: {e}", file.display()),
            }
        }
        Ok(map)
    }

    /// Reserve a texture id for `image`; it is uploaded at the next frame.
    pub fn queue_texture(&mut self, image: RgbaImage) -> TextureId {
        let id = TextureId(self.next_texture);
        self.next_texture += 1;
        self.pending_uploads.push((id, image));
        id
    }

    // ── Frame ──────────────────────────────────────────────────────────────

    /// Run one tick: advance the camera and the scene stack, then upload new
    /// textures and draw the visible scenes.
    pub fn frame(&mut self, dt: f32, backend: &mut dyn RenderBackend) {
        self.dt = dt;
        self.tick += 1;

        // Scenes receive `&mut Engine`, so the stack is moved out while they run.
        // Scenes pushed while it is out land in the placeholder and are kept.
        let mut scenes = std::mem::take(&mut self.scenes);

        self.camera.tick(dt);
        scenes.tick(self, dt);
        scenes.absorb_pending(&mut self.scenes);

        let mut ctx = RenderContext::new(backend, &self.camera, &self.config.window);
        ctx.begin_frame();
        for (id, image) in self.pending_uploads.drain(..) {
            debug!("uploading texture {:?} ({}x{})", id, image.width(), image.height());
            ctx.upload_texture(id, &image);
        }
        self.sprites.upload_dirty(&mut ctx);
        scenes.draw(&mut ctx);

        self.scenes = scenes;
    }
}
