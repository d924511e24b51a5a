//! Graph assembly: base document, region overlays, transport layers,
//! bidirectional expansion, and plane-transition synthesis. Assembly either
//! produces a complete model or fails; nothing partial escapes.

use rustc_hash::FxHashMap;
use tracing::{info, warn};

use crate::errors::GraphBuildError;
use crate::graph::loader::{GraphData, GraphDocument};
use crate::graph::model::GraphModel;
use crate::models::{EdgeType, GraphEdge, GraphNode, NodeType, Tile, ANY_ORIGIN};

/// Base cost of a synthesized plane-transition edge.
pub const STAIRS_BASE_COST: i64 = 5;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransitionDirection {
    Bidirectional,
    Up,
    Down,
}

/// Registry entry for a staircase/ladder the wire graph does not model as an
/// explicit edge pair.
#[derive(Clone, Debug)]
pub struct PlaneTransition {
    pub x: i32,
    pub y: i32,
    pub plane: i32,
    pub direction: TransitionDirection,
    pub action: String,
    pub object_id: Option<i32>,
    pub cost: i64,
}

pub fn dynamic_node_id(x: i32, y: i32, plane: i32) -> String {
    format!("dyn_{}_{}_{}", x, y, plane)
}

#[derive(Default)]
pub struct GraphBuilder {
    nodes: FxHashMap<String, GraphNode>,
    edges: Vec<GraphEdge>,
    transitions: Vec<PlaneTransition>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a parsed document: base data first, then each region overlay in
    /// order. Node-id collisions are last-writer-wins.
    pub fn load_document(&mut self, doc: GraphDocument) -> &mut Self {
        self.load_data(doc.base);
        for region in doc.regions {
            self.load_data(region);
        }
        self
    }

    pub fn load_data(&mut self, data: GraphData) -> &mut Self {
        for node in data.nodes {
            self.nodes.insert(node.id.clone(), node);
        }
        self.edges.extend(data.edges);
        self
    }

    pub fn add_node(&mut self, node: GraphNode) -> &mut Self {
        self.nodes.insert(node.id.clone(), node);
        self
    }

    pub fn add_edge(&mut self, edge: GraphEdge) -> &mut Self {
        self.edges.push(edge);
        self
    }

    pub fn register_transitions(&mut self, transitions: impl IntoIterator<Item = PlaneTransition>) -> &mut Self {
        self.transitions.extend(transitions);
        self
    }

    pub fn build(mut self) -> Result<GraphModel, GraphBuildError> {
        self.synthesize_shared_column_stairs();
        self.synthesize_registered_transitions();
        self.expand_bidirectional();

        let mut adjacency: FxHashMap<String, Vec<GraphEdge>> = FxHashMap::default();
        let mut reverse: FxHashMap<String, Vec<GraphEdge>> = FxHashMap::default();
        let mut any_origin: Vec<GraphEdge> = Vec::new();
        let mut dropped: usize = 0;

        for edge in std::mem::take(&mut self.edges) {
            if !self.validate_edge(&edge) {
                dropped += 1;
                continue;
            }
            if edge.edge_type == EdgeType::FreeTeleport {
                // Usable from anywhere; indexed on its own list, never in the
                // per-source adjacency.
                any_origin.push(edge);
                continue;
            }
            adjacency.entry(edge.from.clone()).or_default().push(edge.clone());
            reverse.entry(edge.to.clone()).or_default().push(edge);
        }

        let mut nodes = std::mem::take(&mut self.nodes);
        nodes.entry(ANY_ORIGIN.to_string()).or_insert_with(GraphNode::any_origin);

        if !nodes.values().any(|n| n.node_type == NodeType::Bank) {
            return Err(GraphBuildError::MissingCriticalNode("bank".into()));
        }

        let edge_count: usize = adjacency.values().map(Vec::len).sum::<usize>() + any_origin.len();
        info!(
            nodes = nodes.len(),
            edges = edge_count,
            any_origin = any_origin.len(),
            dropped,
            "graph_build_done"
        );
        Ok(GraphModel::from_parts(nodes, adjacency, reverse, any_origin))
    }

    fn validate_edge(&self, edge: &GraphEdge) -> bool {
        if edge.edge_type == EdgeType::FreeTeleport {
            if edge.from != ANY_ORIGIN {
                warn!(from = %edge.from, to = %edge.to, "dropped_free_teleport_with_physical_origin");
                return false;
            }
            if !self.nodes.contains_key(&edge.to) {
                warn!(to = %edge.to, "dropped_edge_unresolved_endpoint");
                return false;
            }
            return true;
        }
        if !self.nodes.contains_key(&edge.from) || !self.nodes.contains_key(&edge.to) {
            warn!(from = %edge.from, to = %edge.to, "dropped_edge_unresolved_endpoint");
            return false;
        }
        match edge.edge_type {
            EdgeType::Stairs => {
                if edge.from_plane == edge.to_plane {
                    warn!(from = %edge.from, to = %edge.to, "dropped_stairs_without_plane_change");
                    return false;
                }
            }
            EdgeType::Agility => {
                let level_ok = edge.agility_level.is_some_and(|l| l > 0);
                let rate_ok = (0.0..=1.0).contains(&edge.failure_rate);
                if !level_ok || !rate_ok {
                    warn!(from = %edge.from, to = %edge.to, "dropped_malformed_agility_edge");
                    return false;
                }
            }
            _ => {}
        }
        true
    }

    /// Distinct nodes sharing (x, y) on different planes are connected by
    /// climb edges in both directions.
    fn synthesize_shared_column_stairs(&mut self) {
        let mut by_column: FxHashMap<(i32, i32), Vec<(String, i32)>> = FxHashMap::default();
        for node in self.nodes.values() {
            if let Some(tile) = node.tile {
                by_column.entry((tile.x, tile.y)).or_default().push((node.id.clone(), tile.plane));
            }
        }
        let mut synthesized = Vec::new();
        for ids in by_column.values_mut() {
            ids.sort();
            for a in ids.iter() {
                for b in ids.iter() {
                    if a.0 == b.0 || a.1 == b.1 {
                        continue;
                    }
                    if self.edge_exists(&a.0, &b.0, EdgeType::Stairs) {
                        continue;
                    }
                    let action = if b.1 > a.1 { "Climb-up" } else { "Climb-down" };
                    let mut edge = GraphEdge::typed(a.0.clone(), b.0.clone(), EdgeType::Stairs, STAIRS_BASE_COST);
                    edge.action = Some(action.to_string());
                    edge.from_plane = Some(a.1);
                    edge.to_plane = Some(b.1);
                    synthesized.push(edge);
                }
            }
        }
        self.edges.extend(synthesized);
    }

    fn synthesize_registered_transitions(&mut self) {
        let transitions = std::mem::take(&mut self.transitions);
        for t in transitions {
            match t.direction {
                TransitionDirection::Bidirectional => {
                    for dz in [1, -1] {
                        let target = t.plane + dz;
                        if !(0..=3).contains(&target) {
                            continue;
                        }
                        self.add_transition_edge(&t, t.plane, target, None);
                        self.add_transition_edge(&t, target, t.plane, None);
                    }
                }
                TransitionDirection::Up => {
                    if t.plane < 3 {
                        self.add_transition_edge(&t, t.plane, t.plane + 1, Some(t.action.clone()));
                    }
                }
                TransitionDirection::Down => {
                    if t.plane > 0 {
                        self.add_transition_edge(&t, t.plane, t.plane - 1, Some(t.action.clone()));
                    }
                }
            }
        }
    }

    fn add_transition_edge(&mut self, t: &PlaneTransition, from_plane: i32, to_plane: i32, action: Option<String>) {
        let from_id = self.ensure_dynamic_node(t.x, t.y, from_plane);
        let to_id = self.ensure_dynamic_node(t.x, t.y, to_plane);
        if self.edge_exists(&from_id, &to_id, EdgeType::Stairs) {
            return;
        }
        let action = action.unwrap_or_else(|| {
            if to_plane > from_plane { "Climb-up".to_string() } else { "Climb-down".to_string() }
        });
        let mut edge = GraphEdge::typed(from_id, to_id, EdgeType::Stairs, if t.cost > 0 { t.cost } else { STAIRS_BASE_COST });
        edge.action = Some(action);
        edge.object_id = t.object_id;
        edge.from_plane = Some(from_plane);
        edge.to_plane = Some(to_plane);
        self.edges.push(edge);
    }

    fn ensure_dynamic_node(&mut self, x: i32, y: i32, plane: i32) -> String {
        // Reuse a loaded node standing exactly on the transition tile.
        if let Some(existing) = self
            .nodes
            .values()
            .find(|n| n.tile == Some(Tile::new(x, y, plane)))
        {
            return existing.id.clone();
        }
        let id = dynamic_node_id(x, y, plane);
        self.nodes
            .entry(id.clone())
            .or_insert_with(|| GraphNode::new(id.clone(), Tile::new(x, y, plane), NodeType::Generic));
        id
    }

    /// Expanding an already-expanded edge set is a no-op: the reverse is only
    /// added when no equal (to, from, type) edge exists yet.
    fn expand_bidirectional(&mut self) {
        let mut additions = Vec::new();
        for edge in self.edges.iter().filter(|e| e.bidirectional) {
            if self
                .edges
                .iter()
                .any(|r| r.from == edge.to && r.to == edge.from && r.edge_type == edge.edge_type)
            {
                continue;
            }
            let mut rev = edge.clone();
            std::mem::swap(&mut rev.from, &mut rev.to);
            std::mem::swap(&mut rev.from_plane, &mut rev.to_plane);
            rev.bidirectional = false;
            additions.push(rev);
        }
        self.edges.extend(additions);
    }

    fn edge_exists(&self, from: &str, to: &str, edge_type: EdgeType) -> bool {
        self.edges
            .iter()
            .any(|e| e.from == from && e.to == to && e.edge_type == edge_type)
    }
}
