use tilecraft::map::*;
use tilecraft::renderer::{RecordingBackend, RenderContext, TextureId};
use tilecraft::transform::Transformable;
use tilecraft::Error;

const MAP: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.10" orientation="orthogonal" width="4" height="3" tilewidth="16" tileheight="16" backgroundcolor="#80102030">
 <properties>
  <property name="title" value="Cellar"/>
  <property name="level" type="int" value="2"/>
 </properties>
 <tileset firstgid="1" name="ground" tilewidth="16" tileheight="16" tilecount="4" columns="2">
  <image source="ground.png" width="32" height="32"/>
  <tile id="1">
   <properties><property name="solid" type="bool" value="true"/></properties>
  </tile>
 </tileset>
 <layer name="floor" width="4" height="3">
  <data encoding="csv">
1,1,1,1,
1,2,1,1,
1,1,1,0
</data>
 </layer>
 <objectgroup name="things">
  <object id="1" name="spawn" type="player" x="32" y="16"/>
  <object id="2" name="chest" type="chest" x="48" y="16" width="16" height="16"/>
 </objectgroup>
</map>
"##;

/// Records every event; vetoes tiles whose local id is listed in `solid`.
#[derive(Default)]
struct Recorder {
    solid: Vec<u32>,
    veto_objects: bool,
    log: Vec<String>,
}

impl MapEventHandler for Recorder {
    fn tile_about_to_step(&mut self, event: &mut TileEvent) {
        self.log.push(format!("about {},{}", event.x, event.y));
        if event.tile.local_id().is_some_and(|id| self.solid.contains(&id)) {
            event.ignore();
        }
    }
    fn tile_stepped(&mut self, event: &TileEvent) {
        self.log.push(format!("stepped {},{}", event.x, event.y));
    }
    fn tile_left(&mut self, event: &TileEvent) {
        self.log.push(format!("left {},{}", event.x, event.y));
    }
    fn object_about_to_step(&mut self, event: &mut ObjectEvent) {
        self.log.push(format!("about object {}", event.object.name));
        if self.veto_objects {
            event.ignore();
        }
    }
    fn object_stepped(&mut self, event: &ObjectEvent) {
        self.log.push(format!("stepped object {}", event.object.name));
    }
    fn object_left(&mut self, event: &ObjectEvent) {
        self.log.push(format!("left object {}", event.object.name));
    }
}

fn run_until_landed(map: &mut Map, handler: &mut dyn MapEventHandler) {
    for _ in 0..200 {
        map.update(1.0 / 60.0, handler);
        if !map.player().is_stepping() {
            return;
        }
    }
    panic!("step never landed");
}

// ── Loading ──────────────────────────────────────────────────────────────────

#[test]
fn parses_map_attributes() {
    let map = Map::parse(MAP).unwrap();
    assert_eq!(map.orientation, Orientation::Orthogonal);
    assert_eq!((map.width, map.height), (4, 3));
    assert_eq!((map.tile_width, map.tile_height), (16, 16));
    assert_eq!(map.background, Some([0x10, 0x20, 0x30, 0x80]));
    assert_eq!(map.properties["title"].as_str(), Some("Cellar"));
    assert_eq!(map.properties["level"], PropertyValue::Int(2));
}

#[test]
fn layers_keep_document_order() {
    let map = Map::parse(MAP).unwrap();
    let names: Vec<_> = map.layers().iter().map(Layer::name).collect();
    assert_eq!(names, ["floor", "things"]);
    assert!(map.tilemap(0).is_some());
    assert!(map.tilemap(1).is_none());
    let things = map.layer("things").and_then(Layer::as_object).unwrap();
    assert_eq!(things.objects.len(), 2);
    assert!(things.objects[0].is_null());
}

#[test]
fn tileset_tile_properties() {
    let map = Map::parse(MAP).unwrap();
    let ts = &map.tilesets()[0];
    assert_eq!(ts.tile_properties(1).unwrap()["solid"].as_bool(), Some(true));
    assert!(ts.tile_properties(0).is_none());
}

#[test]
fn player_spawns_on_player_object() {
    let map = Map::parse(MAP).unwrap();
    assert_eq!(map.player().tile_position(), (2, 1));
    assert_eq!(map.player().position().to_array(), [32.0, 16.0]);
}

#[test]
fn player_defaults_to_origin_without_spawn() {
    let xml = MAP.replace(r#"type="player""#, r#"type="marker""#);
    let map = Map::parse(&xml).unwrap();
    assert_eq!(map.player().tile_position(), (0, 0));
}

#[test]
fn unknown_orientation_is_rejected() {
    let err = Map::parse(&MAP.replace("orthogonal", "diagonal")).err().unwrap();
    assert!(matches!(err, Error::InvalidAttribute { attribute: "orientation", .. }));
}

#[test]
fn zero_tile_size_is_rejected_before_spawning() {
    let xml = r#"<map width="4" height="4" tilewidth="0" tileheight="16">
      <objectgroup><object type="player" x="32" y="16" width="16" height="16"/></objectgroup>
    </map>"#;
    let err = Map::parse(xml).err().unwrap();
    assert!(matches!(err, Error::InvalidAttribute { element: "map", attribute: "tilewidth", .. }), "{err}");

    let tall = MAP.replace(r#"tileheight="16" backgroundcolor"#, r#"tileheight="0" backgroundcolor"#);
    let err = Map::parse(&tall).err().unwrap();
    assert!(matches!(err, Error::InvalidAttribute { attribute: "tileheight", .. }), "{err}");
}

#[test]
fn colour_parsing() {
    assert_eq!(parse_color("#ff8000"), Some([0xff, 0x80, 0x00, 0xff]));
    assert_eq!(parse_color("#00ff8000"), Some([0xff, 0x80, 0x00, 0x00]));
    assert_eq!(parse_color("#fff"), None);
}

#[test]
fn external_tileset_goes_through_resolver() {
    let xml = r#"<map width="1" height="1" tilewidth="8" tileheight="8">
      <tileset firstgid="1" source="walls.tsx"/>
      <layer name="l"><data encoding="csv">1</data></layer>
    </map>"#;
    assert!(matches!(Map::parse(xml), Err(Error::ExternalTileset(_))));

    let map = Map::parse_with(xml, |source| {
        assert_eq!(source, "walls.tsx");
        Ok(r#"<tileset name="walls" tilewidth="8" tileheight="8" tilecount="1" columns="1">
                <image source="walls.png" width="8" height="8"/>
              </tileset>"#
            .to_string())
    })
    .unwrap();
    assert_eq!(map.tilesets()[0].name, "walls");
    assert_eq!(map.tilesets()[0].first_gid, 1);
}

#[test]
fn load_reads_sibling_tileset_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("walls.tsx"),
        r#"<tileset name="walls" tilewidth="8" tileheight="8" tilecount="1" columns="1"/>"#,
    )
    .unwrap();
    let tmx = dir.path().join("level.tmx");
    std::fs::write(
        &tmx,
        r#"<map width="1" height="1" tilewidth="8" tileheight="8">
             <tileset firstgid="1" source="walls.tsx"/>
             <layer name="l"><data encoding="csv">1</data></layer>
           </map>"#,
    )
    .unwrap();

    let map = Map::load(&tmx).unwrap();
    assert_eq!(map.tilesets()[0].name, "walls");
    assert!(matches!(Map::load(dir.path().join("missing.tmx")), Err(Error::Io { .. })));
}

// ── Tile movement ────────────────────────────────────────────────────────────

#[test]
fn vetoed_step_leaves_player_in_place() {
    let mut map = Map::parse(MAP).unwrap();
    map.place_player(0, 1);
    let mut handler = Recorder { solid: vec![1], ..Default::default() };

    assert!(!map.move_player_by(1, 0, &mut handler));
    assert_eq!(map.player().tile_position(), (0, 1));
    assert!(!map.player().is_stepping());
    assert_eq!(handler.log, ["about 1,1"]);
}

#[test]
fn accepted_step_leaves_old_tile_then_lands() {
    let mut map = Map::parse(MAP).unwrap();
    map.place_player(0, 0);
    let mut handler = Recorder::default();

    assert!(map.move_player_by(1, 0, &mut handler));
    assert_eq!(map.player().tile_position(), (1, 0), "logical tile updates at acceptance");
    assert!(map.player().is_stepping());
    assert_eq!(handler.log, ["about 1,0", "left 0,0"]);

    assert!(!map.move_player_by(1, 0, &mut handler), "no second step while one is in flight");

    run_until_landed(&mut map, &mut handler);
    assert_eq!(map.player().position().to_array(), [16.0, 0.0]);
    assert_eq!(handler.log.last().map(String::as_str), Some("stepped 1,0"));
}

#[test]
fn step_interpolates_at_player_speed() {
    let mut map = Map::parse(MAP).unwrap();
    map.place_player(0, 0);
    map.player_mut().set_speed(32.0);
    assert!(map.move_player_by(0, 1, &mut NoEvents));

    map.update(0.25, &mut NoEvents);
    assert!((map.player().position().y - 8.0).abs() < 1e-4);
    assert!(map.player().is_stepping());

    map.update(0.25, &mut NoEvents);
    assert_eq!(map.player().position().y, 16.0);
    assert!(!map.player().is_stepping());
}

#[test]
fn moving_off_the_map_is_refused() {
    let mut map = Map::parse(MAP).unwrap();
    map.place_player(0, 0);
    assert!(!map.move_player_by(-1, 0, &mut NoEvents));
    assert!(!map.move_player_by(0, 3, &mut NoEvents));
    assert_eq!(map.player().tile_position(), (0, 0));
}

#[test]
fn null_destination_tile_raises_no_tile_event() {
    let mut map = Map::parse(MAP).unwrap();
    map.place_player(2, 2);
    let mut handler = Recorder::default();
    assert!(map.move_player_by(1, 0, &mut handler));
    assert_eq!(handler.log, ["left 2,2"]);
    run_until_landed(&mut map, &mut handler);
    assert_eq!(handler.log, ["left 2,2"]);
}

#[test]
fn object_collision_events() {
    let mut map = Map::parse(MAP).unwrap();
    map.place_player(2, 1);
    let mut handler = Recorder::default();

    assert!(map.move_player_by(1, 0, &mut handler));
    assert_eq!(handler.log, ["about 3,1", "about object chest", "left 2,1", "stepped object chest"]);
    run_until_landed(&mut map, &mut handler);

    handler.log.clear();
    assert!(map.move_player_by(0, 1, &mut handler));
    assert_eq!(handler.log, ["left 3,1", "left object chest"]);
}

#[test]
fn object_veto_aborts_whole_move() {
    let mut map = Map::parse(MAP).unwrap();
    map.place_player(2, 1);
    let mut handler = Recorder { veto_objects: true, ..Default::default() };

    assert!(!map.move_player_by(1, 0, &mut handler));
    assert_eq!(map.player().tile_position(), (2, 1));
    assert_eq!(handler.log, ["about 3,1", "about object chest"]);
}

// ── Pixel movement ───────────────────────────────────────────────────────────

#[test]
fn pixel_moves_apply_immediately() {
    let mut map = Map::parse(MAP).unwrap();
    map.place_player(0, 0);
    map.player_mut().set_mode(MoveMode::Pixel);
    let mut handler = Recorder::default();

    assert!(map.move_player_by_pixels(4.0, 0.0, &mut handler));
    assert_eq!(map.player().position().to_array(), [4.0, 0.0]);
    assert!(handler.log.is_empty(), "same tile, no tile events");

    assert!(map.move_player_by_pixels(12.0, 0.0, &mut handler));
    assert_eq!(map.player().tile_position(), (1, 0));
    assert_eq!(handler.log, ["about 1,0", "left 0,0", "stepped 1,0"]);
}

#[test]
fn pixel_move_into_solid_tile_is_vetoed() {
    let mut map = Map::parse(MAP).unwrap();
    map.place_player(1, 0);
    map.player_mut().set_mode(MoveMode::Pixel);
    let mut handler = Recorder { solid: vec![1], ..Default::default() };

    assert!(!map.move_player_by_pixels(0.0, 16.0, &mut handler));
    assert_eq!(map.player().position().to_array(), [16.0, 0.0]);
    assert_eq!(map.player().tile_position(), (1, 0));
}

#[test]
fn pixel_mode_converts_tile_deltas() {
    let mut map = Map::parse(MAP).unwrap();
    map.place_player(0, 0);
    map.player_mut().set_mode(MoveMode::Pixel);
    assert!(map.move_player_by(2, 0, &mut NoEvents));
    assert_eq!(map.player().position().to_array(), [32.0, 0.0]);
    assert!(!map.player().is_stepping());
}

// ── Rendering ────────────────────────────────────────────────────────────────

#[test]
fn draw_submits_one_call_per_tileset_of_visible_layers() {
    let mut map = Map::parse(MAP).unwrap();
    assert!(map.set_tileset_texture(0, TextureId(7)));
    assert!(!map.set_tileset_texture(3, TextureId(8)));

    let mut backend = RecordingBackend::new();
    let mut ctx = RenderContext::identity(&mut backend);
    map.draw(&mut ctx);
    assert_eq!(ctx.draw_calls(), 1);

    let call = &backend.calls[0];
    assert_eq!(call.texture, Some(TextureId(7)));
    assert_eq!(call.vertices.len(), 4 * 12);
    // 11 non-null cells, 6 indices each
    assert_eq!(call.indices.len(), 66);
}

#[test]
fn hidden_layers_are_not_drawn() {
    let xml = MAP.replace(r#"<layer name="floor" width="4" height="3">"#, r#"<layer name="floor" visible="0">"#);
    let map = Map::parse(&xml).unwrap();
    let mut backend = RecordingBackend::new();
    map.draw(&mut RenderContext::identity(&mut backend));
    assert!(backend.calls.is_empty());
}

#[test]
fn layer_move_events_outlive_map_update() {
    let mut map = Map::parse(MAP).unwrap();
    map.tilemap_mut(0).unwrap().move_by(10.0, 0.0);
    map.update(1.0, &mut NoEvents);

    let layer = map.tilemap_mut(0).unwrap();
    assert_eq!(layer.position().x, 10.0);
    assert_eq!(layer.drain_transform_events(), vec![tilecraft::transform::TransformEvent::MoveStopped]);
}
