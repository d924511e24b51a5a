use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::requirements::Requirement;

/// Reserved id of the virtual "usable from anywhere" node.
pub const ANY_ORIGIN: &str = "ANY_ORIGIN";

/// A world position: integer (x, y) on an integer plane in [0..3].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub x: i32,
    pub y: i32,
    pub plane: i32,
}

impl Tile {
    pub const fn new(x: i32, y: i32, plane: i32) -> Self {
        Self { x, y, plane }
    }

    /// Chebyshev distance; the natural tile metric (diagonals count as one step).
    pub fn chebyshev(&self, other: Tile) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Adjacent iff max(|dx|,|dy|) == 1 on the same plane.
    pub fn is_adjacent(&self, other: Tile) -> bool {
        self.plane == other.plane && self.chebyshev(other) == 1
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Tile {
        Tile { x: self.x + dx, y: self.y + dy, plane: self.plane }
    }

    pub fn with_plane(&self, plane: i32) -> Tile {
        Tile { plane, ..*self }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    Generic,
    Bank,
    Altar,
    Anvil,
    Furnace,
    Teleport,
    Transport,
}

impl NodeType {
    /// Unknown node-type strings degrade to Generic; nodes are never dropped for type.
    pub fn from_wire(s: &str) -> NodeType {
        match s {
            "GENERIC" => NodeType::Generic,
            "BANK" => NodeType::Bank,
            "ALTAR" => NodeType::Altar,
            "ANVIL" => NodeType::Anvil,
            "FURNACE" => NodeType::Furnace,
            "TELEPORT" => NodeType::Teleport,
            "TRANSPORT" => NodeType::Transport,
            _ => NodeType::Generic,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeType {
    Walk,
    Stairs,
    Agility,
    Toll,
    Door,
    Teleport,
    Transport,
    FreeTeleport,
}

impl EdgeType {
    /// Unknown edge-type strings are a drop-with-warning at load time.
    pub fn from_wire(s: &str) -> Option<EdgeType> {
        match s {
            "WALK" => Some(EdgeType::Walk),
            "STAIRS" => Some(EdgeType::Stairs),
            "AGILITY" => Some(EdgeType::Agility),
            "TOLL" => Some(EdgeType::Toll),
            "DOOR" => Some(EdgeType::Door),
            "TELEPORT" => Some(EdgeType::Teleport),
            "TRANSPORT" => Some(EdgeType::Transport),
            "FREE_TELEPORT" => Some(EdgeType::FreeTeleport),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    /// None only for the virtual ANY_ORIGIN node.
    pub tile: Option<Tile>,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, tile: Tile, node_type: NodeType) -> Self {
        Self { id: id.into(), tile: Some(tile), node_type, tags: Vec::new(), metadata: BTreeMap::new() }
    }

    pub fn any_origin() -> Self {
        Self {
            id: ANY_ORIGIN.to_string(),
            tile: None,
            node_type: NodeType::Teleport,
            tags: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn is_virtual(&self) -> bool {
        self.id == ANY_ORIGIN
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    pub cost_ticks: i64,
    #[serde(default)]
    pub bidirectional: bool,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    #[serde(default)]
    pub from_plane: Option<i32>,
    #[serde(default)]
    pub to_plane: Option<i32>,
    #[serde(default)]
    pub object_id: Option<i32>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub agility_level: Option<i32>,
    #[serde(default)]
    pub failure_rate: f64,
    #[serde(default)]
    pub toll_cost: i64,
    #[serde(default)]
    pub free_passage_quest: Option<String>,
}

impl GraphEdge {
    pub fn walk(from: impl Into<String>, to: impl Into<String>, cost_ticks: i64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            edge_type: EdgeType::Walk,
            cost_ticks,
            bidirectional: false,
            requirements: Vec::new(),
            metadata: BTreeMap::new(),
            from_plane: None,
            to_plane: None,
            object_id: None,
            action: None,
            agility_level: None,
            failure_rate: 0.0,
            toll_cost: 0,
            free_passage_quest: None,
        }
    }

    pub fn typed(from: impl Into<String>, to: impl Into<String>, edge_type: EdgeType, cost_ticks: i64) -> Self {
        Self { edge_type, ..Self::walk(from, to, cost_ticks) }
    }

    pub fn metadata_i64(&self, key: &str) -> Option<i64> {
        self.metadata.get(key).and_then(Value::as_i64)
    }

    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

/// Coordinator-level answer for a cost query. "No path" and "not yet known"
/// are values, not errors.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PathCost {
    Known(i64),
    Unreachable,
    Pending,
}

impl PathCost {
    pub fn known(&self) -> Option<i64> {
        match self {
            PathCost::Known(c) => Some(*c),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, PathCost::Pending)
    }
}

/// A global route: ordered edges plus the adjusted total cost in ticks.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct GraphRoute {
    pub edges: Vec<GraphEdge>,
    pub total_cost: i64,
}

impl GraphRoute {
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}
