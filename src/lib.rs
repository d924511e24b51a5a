//! wayfinder: two-tier spatial pathfinding and reachability engine for a
//! tile-based world.
//!
//! A local A* runs over a dense collision snapshot for in-scene movement; a
//! typed-edge navigation graph searched by Dijkstra covers everything else,
//! with edge admissibility and costs shaped by player requirements and
//! resource policy. A non-blocking coordinator with a single async search
//! slot ties the tiers together for tick-driven consumers.

pub mod astar;
pub mod collision;
pub mod coordinator;
pub mod cost_cache;
pub mod errors;
pub mod finder;
pub mod graph;
pub mod models;
pub mod obstacles;
pub mod policy;
pub mod reachability;
pub mod requirements;
pub mod scene;
pub mod training;

pub use astar::TilePathfinder;
pub use collision::{CollisionMap, CollisionOracle};
pub use coordinator::{NavigationCoordinator, NavigationProvider};
pub use cost_cache::PathCostCache;
pub use errors::{GraphBuildError, LoadError, SpotCacheError};
pub use finder::EntityFinder;
pub use graph::{GraphBuilder, GraphModel, GraphSearch, SearchContext};
pub use models::{EdgeType, GraphEdge, GraphNode, GraphRoute, NodeType, PathCost, Tile, ANY_ORIGIN};
pub use obstacles::{HandleObstacle, ObstacleHandler};
pub use policy::{DefaultResourcePolicy, ResourcePolicy, TravelPreferences};
pub use reachability::Reachability;
pub use requirements::{PlayerProfile, PlayerRequirements, Requirement};
pub use scene::{ClientScene, SceneNpc, SceneObject, StaticScene};
pub use training::{SpotCache, TrainingSpotRanker};

/// Crate version for linkage diagnostics.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
