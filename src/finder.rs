//! "Nearest reachable X" queries: scene entities ranked by actual path cost
//! rather than straight-line distance.

use std::sync::Arc;

use itertools::Itertools;

use crate::coordinator::NavigationProvider;
use crate::models::Tile;
use crate::scene::{ClientScene, SceneNpc, SceneObject};

#[derive(Clone, Debug)]
pub struct FoundObject {
    pub object: SceneObject,
    /// Tile to stand on to interact.
    pub approach: Tile,
    pub cost: i64,
}

#[derive(Clone, Debug)]
pub struct FoundNpc {
    pub npc: SceneNpc,
    /// Tile to stand on to interact or attack from.
    pub position: Tile,
    pub cost: i64,
}

pub struct EntityFinder<S: ClientScene> {
    scene: Arc<S>,
    provider: Arc<dyn NavigationProvider>,
}

impl<S: ClientScene> EntityFinder<S> {
    pub fn new(scene: Arc<S>, provider: Arc<dyn NavigationProvider>) -> Self {
        Self { scene, provider }
    }

    /// Nearest object among `ids` the player can actually walk to and
    /// interact with. Ties break on (cost, visibility, Chebyshev). An empty
    /// id list matches every object.
    pub fn nearest_reachable_object(&self, player: Tile, ids: &[i32], radius: i32) -> Option<FoundObject> {
        self.scene
            .objects()
            .into_iter()
            .filter(|o| (ids.is_empty() || ids.contains(&o.id)) && o.tile.plane == player.plane)
            .filter(|o| player.chebyshev(o.tile) <= radius)
            .filter_map(|o| {
                self.cheapest_interaction_tile(player, &o)
                    .map(|(approach, cost)| FoundObject { object: o, approach, cost })
            })
            .min_by_key(|f| {
                (f.cost, !f.object.visible, player.chebyshev(f.object.tile), f.object.id)
            })
    }

    /// Cheapest tile adjacent to the object's footprint from which the
    /// interaction is permitted; unknown or unreachable tiles are skipped.
    fn cheapest_interaction_tile(&self, player: Tile, object: &SceneObject) -> Option<(Tile, i64)> {
        if self.provider.can_interact_object(player, object) {
            return Some((player, 0));
        }
        let tiles = self.provider.footprint_of(object);
        tiles
            .iter()
            .flat_map(|t| neighbors(*t))
            .filter(|t| !tiles.contains(t))
            .unique()
            .filter(|&t| !self.provider.is_blocked(t) && self.provider.can_interact_object(t, object))
            .filter_map(|t| self.provider.path_cost(player, t).known().map(|c| (t, c)))
            .min_by_key(|&(t, c)| (c, t.y, t.x))
    }

    /// Nearest NPC reachable for melee: some adjacent tile permits the
    /// interaction and has a finite path from the player.
    pub fn nearest_reachable_npc(
        &self,
        player: Tile,
        ids: &[i32],
        name: Option<&str>,
        radius: i32,
    ) -> Option<FoundNpc> {
        self.matching_npcs(player, ids, name, radius)
            .into_iter()
            .filter_map(|npc| {
                let (position, cost) = self.cheapest_melee_tile(player, npc.tile)?;
                Some(FoundNpc { npc, position, cost })
            })
            .min_by_key(|f| (f.cost, player.chebyshev(f.npc.tile), f.npc.id))
    }

    fn cheapest_melee_tile(&self, player: Tile, target: Tile) -> Option<(Tile, i64)> {
        if self.provider.can_interact_tile(player, target) {
            return Some((player, 0));
        }
        neighbors(target)
            .into_iter()
            .filter(|&t| self.provider.can_interact_tile(t, target))
            .filter_map(|t| self.provider.path_cost(player, t).known().map(|c| (t, c)))
            .min_by_key(|&(t, c)| (c, t.y, t.x))
    }

    /// Nearest NPC attackable at range. When already in range with sight the
    /// player stays put; otherwise the perimeter square of the weapon range
    /// is searched outward from the player.
    pub fn nearest_attackable_npc(
        &self,
        player: Tile,
        ids: &[i32],
        name: Option<&str>,
        radius: i32,
        weapon_range: i32,
    ) -> Option<FoundNpc> {
        self.matching_npcs(player, ids, name, radius)
            .into_iter()
            .filter_map(|npc| {
                let (position, cost) = self.attack_tile(player, npc.tile, weapon_range)?;
                Some(FoundNpc { npc, position, cost })
            })
            .min_by_key(|f| (f.cost, player.chebyshev(f.npc.tile), f.npc.id))
    }

    fn attack_tile(&self, player: Tile, target: Tile, weapon_range: i32) -> Option<(Tile, i64)> {
        if player.chebyshev(target) <= weapon_range && self.provider.line_of_sight(player, target) {
            // Already in position; only the attack itself remains.
            return Some((player, 1));
        }
        perimeter(target, weapon_range)
            .into_iter()
            .sorted_by_key(|t| (player.chebyshev(*t), t.y, t.x))
            .filter(|&t| !self.provider.is_blocked(t) && self.provider.line_of_sight(t, target))
            .find_map(|t| self.provider.path_cost(player, t).known().map(|c| (t, c + 1)))
    }

    fn matching_npcs(&self, player: Tile, ids: &[i32], name: Option<&str>, radius: i32) -> Vec<SceneNpc> {
        self.scene
            .npcs()
            .into_iter()
            .filter(|n| ids.is_empty() || ids.contains(&n.id))
            .filter(|n| name.map_or(true, |wanted| n.name == wanted))
            .filter(|n| n.tile.plane == player.plane && player.chebyshev(n.tile) <= radius)
            .collect()
    }
}

fn neighbors(tile: Tile) -> Vec<Tile> {
    crate::collision::DIRECTIONS.iter().map(|d| tile.translate(d.dx, d.dy)).collect()
}

/// Tiles on the square ring of the given radius around `center`.
fn perimeter(center: Tile, radius: i32) -> Vec<Tile> {
    if radius <= 0 {
        return vec![center];
    }
    let mut out = Vec::with_capacity((radius as usize) * 8);
    for dx in -radius..=radius {
        for dy in -radius..=radius {
            if dx.abs() == radius || dy.abs() == radius {
                out.push(center.translate(dx, dy));
            }
        }
    }
    out
}
