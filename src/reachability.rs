//! Interaction adjacency: object footprints, melee reach, and ranged attack
//! positions with line of sight.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;

use crate::collision::CollisionOracle;
use crate::models::Tile;
use crate::scene::{SceneNpc, SceneObject};

const FOOTPRINT_CACHE_CAPACITY: usize = 512;

/// Tiles occupied by an object. Odd orientations transpose the footprint.
pub fn footprint(object: &SceneObject) -> Vec<Tile> {
    let (w, h) = if object.orientation % 2 == 1 {
        (object.size_y, object.size_x)
    } else {
        (object.size_x, object.size_y)
    };
    let mut tiles = Vec::with_capacity((w.max(0) * h.max(0)) as usize);
    for dy in 0..h.max(0) {
        for dx in 0..w.max(0) {
            tiles.push(object.tile.translate(dx, dy));
        }
    }
    tiles
}

pub struct Reachability<C: CollisionOracle> {
    oracle: Arc<C>,
    // Two instances of the same object id at different origins have different
    // footprints, so the origin is part of the key.
    footprints: Mutex<LruCache<(i32, i32, Tile), Arc<Vec<Tile>>>>,
}

impl<C: CollisionOracle> Reachability<C> {
    pub fn new(oracle: Arc<C>) -> Self {
        let cap = NonZeroUsize::new(FOOTPRINT_CACHE_CAPACITY).unwrap();
        Self { oracle, footprints: Mutex::new(LruCache::new(cap)) }
    }

    pub fn oracle(&self) -> &C {
        &self.oracle
    }

    pub fn footprint_of(&self, object: &SceneObject) -> Arc<Vec<Tile>> {
        let key = (object.id, object.orientation, object.tile);
        let mut guard = self.footprints.lock().expect("footprint cache mutex poisoned");
        if let Some(hit) = guard.get(&key) {
            return Arc::clone(hit);
        }
        let tiles = Arc::new(footprint(object));
        guard.put(key, Arc::clone(&tiles));
        tiles
    }

    /// True iff some footprint tile is Chebyshev-adjacent to the player and
    /// either the object is a boundary object or the step onto that tile is
    /// permitted.
    pub fn can_interact_object(&self, player: Tile, object: &SceneObject) -> bool {
        if player.plane != object.tile.plane {
            return false;
        }
        self.footprint_of(object).iter().any(|&t| {
            player.chebyshev(t) <= 1 && (object.boundary || self.oracle.can_step(player, t))
        })
    }

    /// 1x1 entity variant: same tile trivially interacts; otherwise the
    /// shared edge must be clear (destination occupancy is the entity itself).
    pub fn can_interact_tile(&self, player: Tile, target: Tile) -> bool {
        if player.plane != target.plane {
            return false;
        }
        if player == target {
            return true;
        }
        player.is_adjacent(target) && self.oracle.can_reach_across(player, target)
    }

    pub fn can_interact_npc(&self, player: Tile, npc: &SceneNpc) -> bool {
        self.can_interact_tile(player, npc.tile)
    }

    /// A tile the player can attack from. The current tile wins when already
    /// in range with sight; otherwise the best of the eight neighbors that is
    /// step-reachable and sees the target.
    pub fn find_attackable_position(&self, player: Tile, target: Tile, weapon_range: i32) -> Option<Tile> {
        if player.plane != target.plane {
            return None;
        }
        if player.chebyshev(target) <= weapon_range && self.oracle.line_of_sight(player, target) {
            return Some(player);
        }
        crate::collision::DIRECTIONS
            .iter()
            .map(|d| player.translate(d.dx, d.dy))
            .filter(|&t| self.oracle.can_step(player, t) && self.oracle.line_of_sight(t, target))
            .min_by_key(|&t| (t.chebyshev(target), t.y, t.x))
    }

    pub fn line_of_sight(&self, a: Tile, b: Tile) -> bool {
        self.oracle.line_of_sight(a, b)
    }
}
