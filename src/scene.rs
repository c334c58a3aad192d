use tracing::debug;

use crate::engine::Engine;
use crate::renderer::RenderContext;

/// What the top scene asks the stack to do after its update.
pub enum SceneAction {
    None,
    Push(Box<dyn Scene>),
    Pop,
    Switch(Box<dyn Scene>),
    ReplaceAll(Box<dyn Scene>),
    Quit,
}

pub trait Scene {
    fn on_enter(&mut self, _engine: &mut Engine) {}
    fn on_exit(&mut self, _engine: &mut Engine) {}
    fn update(&mut self, engine: &mut Engine, dt: f32) -> SceneAction;
    fn draw(&mut self, ctx: &mut RenderContext<'_>);
    /// Transparent scenes let the scene below them draw too.
    fn is_transparent(&self) -> bool { false }
}

/// Active scenes plus a queue of scenes handed to the engine between updates.
/// Queued scenes are entered, in order, at the start of the next `tick`.
#[derive(Default)]
pub struct SceneStack {
    scenes: Vec<Box<dyn Scene>>,
    pending: Vec<Box<dyn Scene>>,
}

impl SceneStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entered scenes.
    pub fn len(&self) -> usize { self.scenes.len() }
    pub fn is_empty(&self) -> bool { self.scenes.is_empty() }
    pub fn pending_len(&self) -> usize { self.pending.len() }

    /// Queue `scene` to be entered on the next `tick`.
    pub fn queue(&mut self, scene: Box<dyn Scene>) {
        self.pending.push(scene);
    }

    /// Move the queue of `other` behind this stack's own queue.
    pub fn absorb_pending(&mut self, other: &mut SceneStack) {
        self.pending.append(&mut other.pending);
    }

    /// Enter queued scenes, then update the top scene and apply its action.
    pub fn tick(&mut self, engine: &mut Engine, dt: f32) {
        self.enter_pending(engine);
        self.update(engine, dt);
    }

    /// Push every queued scene, calling `on_enter` on each.
    pub fn enter_pending(&mut self, engine: &mut Engine) {
        for scene in std::mem::take(&mut self.pending) {
            self.push(scene, engine);
        }
    }

    /// Push `scene` on top, calling its `on_enter`.
    pub fn push(&mut self, mut scene: Box<dyn Scene>, engine: &mut Engine) {
        scene.on_enter(engine);
        self.scenes.push(scene);
        debug!("scene entered, depth {}", self.scenes.len());
    }

    fn pop(&mut self, engine: &mut Engine) {
        if let Some(mut top) = self.scenes.pop() {
            top.on_exit(engine);
            debug!("scene exited, depth {}", self.scenes.len());
        }
    }

    /// Update the top scene only and apply the action it returns.
    pub fn update(&mut self, engine: &mut Engine, dt: f32) {
        let Some(top) = self.scenes.last_mut() else {
            return;
        };

        match top.update(engine, dt) {
            SceneAction::None => {}
            SceneAction::Push(s) => self.push(s, engine),
            SceneAction::Pop => self.pop(engine),
            SceneAction::Switch(s) => {
                self.pop(engine);
                self.push(s, engine);
            }
            SceneAction::ReplaceAll(s) => {
                while !self.scenes.is_empty() {
                    self.pop(engine);
                }
                self.push(s, engine);
            }
            SceneAction::Quit => engine.request_quit(),
        }
    }

    /// Draw from the topmost opaque scene upward.
    pub fn draw(&mut self, ctx: &mut RenderContext<'_>) {
        let start = self.scenes.iter().rposition(|s| !s.is_transparent()).unwrap_or(0);
        for scene in &mut self.scenes[start..] {
            scene.draw(ctx);
        }
    }
}
