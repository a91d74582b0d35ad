//! Tiled (`.tmj`) map data and the solid-tile grid built from it.
//!
//! Only the subset the town scene uses is modelled: orthogonal maps, CSV
//! tile layers, object groups and embedded tilesets.

use bevy::asset::{io::Reader, AssetLoader, LoadContext};
use bevy::prelude::*;
use serde::Deserialize;

use super::error::AssetError;

/// Tiled stores flip/rotation flags in the top bits of every gid.
const GID_FLAG_MASK: u32 = 0xF000_0000;

pub fn strip_flip_flags(gid: u32) -> u32 {
    gid & !GID_FLAG_MASK
}

#[derive(Asset, TypePath, Debug, Clone, Deserialize)]
pub struct TiledMap {
    pub width: u32,
    pub height: u32,
    #[serde(rename = "tilewidth")]
    pub tile_width: u32,
    #[serde(rename = "tileheight")]
    pub tile_height: u32,
    pub layers: Vec<TiledLayer>,
    pub tilesets: Vec<TiledTileset>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum TiledLayer {
    #[serde(rename = "tilelayer")]
    Tiles(TileLayer),
    #[serde(rename = "objectgroup")]
    Objects(ObjectLayer),
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TileLayer {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u32>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectLayer {
    pub name: String,
    #[serde(default)]
    pub objects: Vec<TiledObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TiledObject {
    #[serde(default)]
    pub name: String,
    pub x: f32,
    pub y: f32,
}

impl TiledObject {
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TiledTileset {
    #[serde(rename = "firstgid")]
    pub first_gid: u32,
    /// Set when the tileset lives in its own file.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "tilewidth")]
    pub tile_width: u32,
    #[serde(default, rename = "tileheight")]
    pub tile_height: u32,
    #[serde(default)]
    pub columns: u32,
    #[serde(default, rename = "tilecount")]
    pub tile_count: u32,
    #[serde(default)]
    pub margin: u32,
    #[serde(default)]
    pub spacing: u32,
    #[serde(default)]
    pub tiles: Vec<TiledTile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TiledTile {
    pub id: u32,
    #[serde(default)]
    pub properties: Vec<TiledProperty>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TiledProperty {
    pub name: String,
    pub value: serde_json::Value,
}

fn default_true() -> bool {
    true
}

fn default_opacity() -> f32 {
    1.0
}

impl TiledMap {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, AssetError> {
        let map: Self = serde_json::from_slice(bytes)?;
        map.validate()?;
        Ok(map)
    }

    fn validate(&self) -> Result<(), AssetError> {
        match self.tilesets.iter().find_map(|t| t.source.as_ref()) {
            Some(source) => Err(AssetError::ExternalTileset(source.clone())),
            None => Ok(()),
        }
    }

    pub fn tile_size(&self) -> Vec2 {
        Vec2::new(self.tile_width as f32, self.tile_height as f32)
    }

    pub fn pixel_size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32) * self.tile_size()
    }

    pub fn tile_layer(&self, name: &str) -> Result<&TileLayer, AssetError> {
        self.layers
            .iter()
            .find_map(|layer| match layer {
                TiledLayer::Tiles(tiles) if tiles.name == name => Some(tiles),
                _ => None,
            })
            .ok_or_else(|| AssetError::MissingLayer(name.to_string()))
    }

    pub fn object(&self, layer: &str, name: &str) -> Result<&TiledObject, AssetError> {
        let group = self
            .layers
            .iter()
            .find_map(|l| match l {
                TiledLayer::Objects(objects) if objects.name == layer => Some(objects),
                _ => None,
            })
            .ok_or_else(|| AssetError::MissingLayer(layer.to_string()))?;

        group
            .objects
            .iter()
            .find(|o| o.name == name)
            .ok_or_else(|| AssetError::MissingObject {
                layer: layer.to_string(),
                name: name.to_string(),
            })
    }

    pub fn tileset(&self, name: &str) -> Result<&TiledTileset, AssetError> {
        self.tilesets
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| AssetError::MissingTileset(name.to_string()))
    }

    /// Tileset owning `gid` and the tile's local id inside it. `None` for empty cells.
    pub fn tileset_for_gid(&self, gid: u32) -> Option<(&TiledTileset, u32)> {
        let gid = strip_flip_flags(gid);
        if gid == 0 {
            return None;
        }
        self.tilesets
            .iter()
            .filter(|t| t.first_gid <= gid)
            .max_by_key(|t| t.first_gid)
            .map(|t| (t, gid - t.first_gid))
    }
}

/// Reads `.tmj` files through the `AssetServer`.
#[derive(Default, TypePath)]
pub struct TiledMapLoader;

impl AssetLoader for TiledMapLoader {
    type Asset = TiledMap;
    type Settings = ();
    type Error = AssetError;

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &(),
        _load_context: &mut LoadContext<'_>,
    ) -> Result<TiledMap, AssetError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        TiledMap::from_slice(&bytes)
    }

    fn extensions(&self) -> &[&str] {
        &["tmj"]
    }
}

impl TileLayer {
    /// Non-empty cells as `(column, row, gid)`.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
        let width = self.width.max(1);
        self.data
            .iter()
            .enumerate()
            .filter(|(_, gid)| strip_flip_flags(**gid) != 0)
            .map(move |(i, gid)| (i as u32 % width, i as u32 / width, *gid))
    }
}

impl TiledTileset {
    pub fn rows(&self) -> u32 {
        if self.columns == 0 {
            return 0;
        }
        self.tile_count.div_ceil(self.columns)
    }

    pub fn atlas_layout(&self) -> TextureAtlasLayout {
        TextureAtlasLayout::from_grid(
            UVec2::new(self.tile_width, self.tile_height),
            self.columns,
            self.rows(),
            Some(UVec2::splat(self.spacing)),
            Some(UVec2::splat(self.margin)),
        )
    }

    /// True when the tile carries `property == true`.
    pub fn tile_flag(&self, local_id: u32, property: &str) -> bool {
        self.tiles
            .iter()
            .find(|t| t.id == local_id)
            .is_some_and(|t| {
                t.properties
                    .iter()
                    .any(|p| p.name == property && p.value == serde_json::Value::Bool(true))
            })
    }
}

/// Which cells of a tile layer block movement. Coordinates are map space.
#[derive(Resource, Debug, Clone)]
pub struct CollisionGrid {
    width: u32,
    height: u32,
    tile_size: Vec2,
    solid: Vec<bool>,
}

/// Side of a solid tile that borders open space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    pub start: Vec2,
    pub end: Vec2,
}

impl CollisionGrid {
    /// Mark every cell whose tile has `property == true`.
    pub fn from_layer(map: &TiledMap, layer: &TileLayer, property: &str) -> Self {
        let mut solid = vec![false; (layer.width * layer.height) as usize];
        for (x, y, gid) in layer.cells() {
            let collides = map
                .tileset_for_gid(gid)
                .is_some_and(|(tileset, local)| tileset.tile_flag(local, property));
            if let Some(cell) = solid.get_mut((y * layer.width + x) as usize) {
                *cell = collides;
            }
        }
        Self {
            width: layer.width,
            height: layer.height,
            tile_size: map.tile_size(),
            solid,
        }
    }

    /// Cells outside the layer never collide.
    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return false;
        }
        self.solid[(y as u32 * self.width + x as u32) as usize]
    }

    pub fn cell_rect(&self, x: i32, y: i32) -> Rect {
        let min = Vec2::new(x as f32, y as f32) * self.tile_size;
        Rect::from_corners(min, min + self.tile_size)
    }

    /// Solid cells whose area overlaps `rect`. Touching edges do not count.
    pub fn solid_cells_in(&self, rect: Rect) -> Vec<Rect> {
        let first = (rect.min / self.tile_size).floor().as_ivec2();
        let last = (rect.max / self.tile_size).ceil().as_ivec2() - IVec2::ONE;
        let mut cells = Vec::new();
        for y in first.y..=last.y {
            for x in first.x..=last.x {
                if self.is_solid(x, y) {
                    let cell = self.cell_rect(x, y);
                    if overlaps(cell, rect) {
                        cells.push(cell);
                    }
                }
            }
        }
        cells
    }

    pub fn solid_cells(&self) -> impl Iterator<Item = Rect> + '_ {
        (0..self.height as i32)
            .flat_map(move |y| (0..self.width as i32).map(move |x| (x, y)))
            .filter(|(x, y)| self.is_solid(*x, *y))
            .map(|(x, y)| self.cell_rect(x, y))
    }

    /// Edges of solid cells that face a non-solid neighbour or the map border.
    pub fn faces(&self) -> Vec<Face> {
        let mut faces = Vec::new();
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                if !self.is_solid(x, y) {
                    continue;
                }
                let r = self.cell_rect(x, y);
                let top_left = r.min;
                let top_right = Vec2::new(r.max.x, r.min.y);
                let bottom_left = Vec2::new(r.min.x, r.max.y);
                let bottom_right = r.max;
                if !self.is_solid(x, y - 1) {
                    faces.push(Face { start: top_left, end: top_right });
                }
                if !self.is_solid(x, y + 1) {
                    faces.push(Face { start: bottom_left, end: bottom_right });
                }
                if !self.is_solid(x - 1, y) {
                    faces.push(Face { start: top_left, end: bottom_left });
                }
                if !self.is_solid(x + 1, y) {
                    faces.push(Face { start: top_right, end: bottom_right });
                }
            }
        }
        faces
    }
}

fn overlaps(a: Rect, b: Rect) -> bool {
    a.min.x < b.max.x && a.max.x > b.min.x && a.min.y < b.max.y && a.max.y > b.min.y
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 4x3 map; the world layer has a solid tile at (1,1) and (2,1).
    pub(crate) const TOWN_JSON: &str = r#"{
        "width": 4, "height": 3, "tilewidth": 32, "tileheight": 32,
        "orientation": "orthogonal", "infinite": false,
        "layers": [
            {"type": "tilelayer", "name": "Below Player", "width": 4, "height": 3,
             "data": [1,1,1,1, 1,1,1,1, 1,1,1,1], "visible": true, "opacity": 1},
            {"type": "tilelayer", "name": "World", "width": 4, "height": 3,
             "data": [0,0,0,0, 0,3,2147483651,0, 0,0,2,0]},
            {"type": "tilelayer", "name": "Above Player", "width": 4, "height": 3,
             "data": [0,0,0,0, 0,0,0,0, 0,0,0,0], "opacity": 0.5},
            {"type": "group", "name": "Decor", "layers": []},
            {"type": "objectgroup", "name": "Objects", "objects": [
                {"id": 1, "name": "Sign", "x": 10, "y": 10},
                {"id": 2, "name": "Spawn Point", "x": 48, "y": 80, "point": true}
            ]}
        ],
        "tilesets": [{
            "firstgid": 1, "name": "tuxmon-sample-32px-extruded",
            "image": "tuxmon.png", "imagewidth": 100, "imageheight": 34,
            "tilewidth": 32, "tileheight": 32, "columns": 3, "tilecount": 3,
            "margin": 1, "spacing": 2,
            "tiles": [
                {"id": 1, "properties": [{"name": "collides", "type": "bool", "value": false}]},
                {"id": 2, "properties": [{"name": "collides", "type": "bool", "value": true}]}
            ]
        }]
    }"#;

    pub(crate) fn town() -> TiledMap {
        TiledMap::from_slice(TOWN_JSON.as_bytes()).expect("test map parses")
    }

    pub(crate) fn town_grid() -> CollisionGrid {
        let map = town();
        let world = map.tile_layer("World").unwrap();
        CollisionGrid::from_layer(&map, world, "collides")
    }

    #[test]
    fn parses_layers_and_objects() {
        let map = town();
        assert_eq!(map.pixel_size(), Vec2::new(128.0, 96.0));
        assert_eq!(map.tile_layer("Above Player").unwrap().opacity, 0.5);
        assert!(map.tile_layer("World").unwrap().visible);
        assert_eq!(map.object("Objects", "Spawn Point").unwrap().position(), Vec2::new(48.0, 80.0));
    }

    #[test]
    fn missing_pieces_are_errors() {
        let map = town();
        assert!(matches!(map.tile_layer("Objects"), Err(AssetError::MissingLayer(_))));
        assert!(matches!(map.object("Objects", "Exit"), Err(AssetError::MissingObject { .. })));
        assert!(matches!(map.tileset("tiles"), Err(AssetError::MissingTileset(_))));
    }

    #[test]
    fn external_tilesets_are_rejected() {
        let json = r#"{"width":1,"height":1,"tilewidth":16,"tileheight":16,
            "layers":[], "tilesets":[{"firstgid":1,"source":"town.tsj"}]}"#;
        let result = TiledMap::from_slice(json.as_bytes());
        assert!(matches!(result, Err(AssetError::ExternalTileset(s)) if s == "town.tsj"));
    }

    #[test]
    fn malformed_map_is_a_json_error() {
        let result = TiledMap::from_slice(b"{\"width\": 4");
        assert!(matches!(result, Err(AssetError::Json(_))));
    }

    #[test]
    fn gids_resolve_to_the_right_tileset() {
        let mut map = town();
        let mut second = map.tilesets[0].clone();
        second.first_gid = 10;
        second.name = "interior".into();
        map.tilesets.push(second);

        assert!(map.tileset_for_gid(0).is_none());
        let (ts, local) = map.tileset_for_gid(3).unwrap();
        assert_eq!((ts.name.as_str(), local), ("tuxmon-sample-32px-extruded", 2));
        let (ts, local) = map.tileset_for_gid(12).unwrap();
        assert_eq!((ts.name.as_str(), local), ("interior", 2));
        // flipped tile
        let (_, local) = map.tileset_for_gid(0x8000_0003).unwrap();
        assert_eq!(local, 2);
    }

    #[test]
    fn cells_skip_empty_tiles() {
        let map = town();
        let cells: Vec<_> = map.tile_layer("World").unwrap().cells().collect();
        assert_eq!(cells, vec![(1, 1, 3), (2, 1, 0x8000_0003), (2, 2, 2)]);
    }

    #[test]
    fn collides_property_marks_solid_cells() {
        let grid = town_grid();
        assert!(grid.is_solid(1, 1));
        assert!(grid.is_solid(2, 1));
        // gid 2 has collides == false
        assert!(!grid.is_solid(2, 2));
        assert!(!grid.is_solid(-1, 0));
        assert!(!grid.is_solid(4, 1));
        assert_eq!(grid.solid_cells().count(), 2);
    }

    #[test]
    fn rect_query_ignores_touching_edges() {
        let grid = town_grid();
        // Touches the left edge of (1,1) only.
        let touching = Rect::new(0.0, 32.0, 32.0, 64.0);
        assert!(grid.solid_cells_in(touching).is_empty());
        let overlapping = Rect::new(20.0, 40.0, 40.0, 50.0);
        assert_eq!(grid.solid_cells_in(overlapping), vec![grid.cell_rect(1, 1)]);
    }

    #[test]
    fn faces_skip_shared_edges() {
        let grid = town_grid();
        let faces = grid.faces();
        // Two adjacent solid tiles: 8 edges minus the 2 they share.
        assert_eq!(faces.len(), 6);
        let shared = Face {
            start: Vec2::new(64.0, 32.0),
            end: Vec2::new(64.0, 64.0),
        };
        assert!(!faces.contains(&shared));
    }

    #[test]
    fn tileset_layout_respects_margin_and_spacing() {
        let map = town();
        let layout = map.tileset("tuxmon-sample-32px-extruded").unwrap().atlas_layout();
        assert_eq!(layout.textures.len(), 3);
        assert_eq!(layout.textures[0], URect::new(1, 1, 33, 33));
        assert_eq!(layout.textures[1], URect::new(35, 1, 67, 33));
    }
}
