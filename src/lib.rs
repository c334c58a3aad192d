pub mod camera;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod map;
pub mod renderer;
pub mod scene;
pub mod sprite;
pub mod tilemap;
pub mod transform;
pub mod window;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{Error, Result};
