use crate::map::decode::Tile;
use crate::map::layer::MapObject;

/// Raised for a non-null tile the player is about to enter, has entered, or
/// has left.
#[derive(Clone, Debug, PartialEq)]
pub struct TileEvent {
    pub tile: Tile,
    pub x: u32,
    pub y: u32,
    /// Index into `Map::layers`.
    pub layer: usize,
    pub tileset: Option<usize>,
    accepted: bool,
}

impl TileEvent {
    pub fn new(tile: Tile, x: u32, y: u32, layer: usize) -> Self {
        Self { tile, x, y, layer, tileset: tile.tileset(), accepted: true }
    }

    pub fn accept(&mut self) {
        self.accepted = true;
    }

    /// Veto the step.  Only meaningful for "about to step" events.
    pub fn ignore(&mut self) {
        self.accepted = false;
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }
}

/// Raised for an object whose bounds the player's rectangle enters or leaves.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectEvent {
    pub object: MapObject,
    /// Index of the object inside its layer.
    pub index: usize,
    pub layer: usize,
    accepted: bool,
}

impl ObjectEvent {
    pub fn new(object: MapObject, index: usize, layer: usize) -> Self {
        Self { object, index, layer, accepted: true }
    }

    pub fn accept(&mut self) {
        self.accepted = true;
    }

    pub fn ignore(&mut self) {
        self.accepted = false;
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }
}

/// Receives movement events from `Map`.  Every method defaults to a no-op,
/// and events start out accepted.
pub trait MapEventHandler {
    fn tile_about_to_step(&mut self, _event: &mut TileEvent) {}
    fn tile_stepped(&mut self, _event: &TileEvent) {}
    fn tile_left(&mut self, _event: &TileEvent) {}
    fn object_about_to_step(&mut self, _event: &mut ObjectEvent) {}
    fn object_stepped(&mut self, _event: &ObjectEvent) {}
    fn object_left(&mut self, _event: &ObjectEvent) {}
}

/// Handler that accepts everything.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoEvents;

impl MapEventHandler for NoEvents {}
