//! Detection of interactable blockers (doors, gates) between two tiles.
//! The descriptor is handed to the surrounding runtime; the core never
//! performs the interaction itself.

use std::sync::Arc;

use crate::collision::CollisionOracle;
use crate::models::Tile;
use crate::reachability::footprint;
use crate::scene::SceneObject;

/// Instruction for the runtime: interact with this object to unblock the step.
#[derive(Clone, Debug, PartialEq)]
pub struct HandleObstacle {
    pub object_id: i32,
    pub action: String,
    pub tile: Tile,
}

pub struct ObstacleHandler<C: CollisionOracle> {
    oracle: Arc<C>,
}

impl<C: CollisionOracle> ObstacleHandler<C> {
    pub fn new(oracle: Arc<C>) -> Self {
        Self { oracle }
    }

    /// When the step `from -> to` is denied and a boundary object with an
    /// action stands on the shared edge, describe the interaction that would
    /// resolve it.
    pub fn blocking_obstacle(&self, from: Tile, to: Tile, objects: &[SceneObject]) -> Option<HandleObstacle> {
        if !from.is_adjacent(to) || self.oracle.can_step(from, to) {
            return None;
        }
        objects
            .iter()
            .filter(|o| o.boundary && !o.actions.is_empty())
            .filter(|o| {
                let tiles = footprint(o);
                tiles.contains(&to) || tiles.contains(&from)
            })
            // The blocker on the destination side is the one in the way.
            .min_by_key(|o| (o.tile != to, o.id))
            .map(|o| HandleObstacle {
                object_id: o.id,
                action: preferred_action(o),
                tile: o.tile,
            })
    }
}

fn preferred_action(object: &SceneObject) -> String {
    object
        .actions
        .iter()
        .find(|a| a.as_str() == "Open")
        .or_else(|| object.actions.first())
        .cloned()
        .unwrap_or_else(|| "Open".to_string())
}
