//! The in-scene view the core consumes: loaded objects, NPCs, and the raw
//! collision grids the snapshot is baked from.

use serde::{Deserialize, Serialize};

use crate::collision::CollisionMap;
use crate::models::Tile;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: i32,
    #[serde(default)]
    pub name: String,
    /// South-west origin tile of the footprint.
    pub tile: Tile,
    pub size_x: i32,
    pub size_y: i32,
    pub orientation: i32,
    /// Wall-like or decorative: interactable from an adjacent tile even when
    /// its own tile blocks movement.
    #[serde(default)]
    pub boundary: bool,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub visible: bool,
}

impl SceneObject {
    pub fn new(id: i32, tile: Tile) -> Self {
        Self {
            id,
            name: String::new(),
            tile,
            size_x: 1,
            size_y: 1,
            orientation: 0,
            boundary: false,
            actions: Vec::new(),
            visible: true,
        }
    }

    pub fn with_size(mut self, size_x: i32, size_y: i32) -> Self {
        self.size_x = size_x;
        self.size_y = size_y;
        self
    }

    pub fn with_orientation(mut self, orientation: i32) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn as_boundary(mut self) -> Self {
        self.boundary = true;
        self
    }

    pub fn with_action(mut self, action: &str) -> Self {
        self.actions.push(action.to_string());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneNpc {
    pub id: i32,
    #[serde(default)]
    pub name: String,
    pub tile: Tile,
}

impl SceneNpc {
    pub fn new(id: i32, tile: Tile) -> Self {
        Self { id, name: String::new(), tile }
    }

    pub fn named(id: i32, name: &str, tile: Tile) -> Self {
        Self { id, name: name.to_string(), tile }
    }
}

/// The client-side scene the core reads. Implemented over the live client
/// outside this crate; [`StaticScene`] covers consumers that already hold a
/// materialized view, and tests.
pub trait ClientScene: Send + Sync {
    fn objects(&self) -> Vec<SceneObject>;
    fn npcs(&self) -> Vec<SceneNpc>;
    /// South-west anchor of the loaded scene.
    fn base(&self) -> Tile;
    /// Side length of the loaded scene square, in tiles.
    fn scene_size(&self) -> i32;
    /// Row-major `[y][x]` collision flag grid for a plane, if loaded.
    fn collision_flags(&self, plane: i32) -> Option<Vec<Vec<u32>>>;

    /// Resolve world coordinates to an in-scene tile, if loaded.
    fn tile_at(&self, x: i32, y: i32, plane: i32) -> Option<Tile> {
        let base = self.base();
        let size = self.scene_size();
        let inside = (0..=3).contains(&plane)
            && x >= base.x
            && y >= base.y
            && x < base.x + size
            && y < base.y + size;
        inside.then(|| Tile::new(x, y, plane))
    }
}

/// Bake a collision snapshot from the scene's flag grids.
pub fn build_collision_map(scene: &dyn ClientScene, version: u64) -> CollisionMap {
    let base = scene.base();
    let size = scene.scene_size();
    let mut grids = Vec::new();
    for plane in 0..=3 {
        let grid = scene.collision_flags(plane).unwrap_or_default();
        let mut flat = vec![0u32; (size * size) as usize];
        for (y, row) in grid.into_iter().enumerate().take(size as usize) {
            for (x, flags) in row.into_iter().enumerate().take(size as usize) {
                flat[y * size as usize + x] = flags;
            }
        }
        grids.push(flat);
    }
    CollisionMap::from_planes(base.x, base.y, size, size, grids, version)
}

#[derive(Clone, Debug, Default)]
pub struct StaticScene {
    pub objects: Vec<SceneObject>,
    pub npcs: Vec<SceneNpc>,
    pub base: Tile,
    pub size: i32,
    /// Per-plane row-major flag grids; missing planes read as all-clear.
    pub flags: Vec<Vec<Vec<u32>>>,
}

impl StaticScene {
    pub fn open(size: i32) -> Self {
        Self { size, base: Tile::new(0, 0, 0), ..Default::default() }
    }
}

impl ClientScene for StaticScene {
    fn objects(&self) -> Vec<SceneObject> {
        self.objects.clone()
    }

    fn npcs(&self) -> Vec<SceneNpc> {
        self.npcs.clone()
    }

    fn base(&self) -> Tile {
        self.base
    }

    fn scene_size(&self) -> i32 {
        self.size
    }

    fn collision_flags(&self, plane: i32) -> Option<Vec<Vec<u32>>> {
        self.flags.get(plane as usize).cloned()
    }
}
