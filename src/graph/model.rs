//! The immutable navigation graph: node and edge indexes plus the query
//! surface the search and the coordinator read. Built once by
//! [`crate::graph::GraphBuilder`]; runtime edits are unsupported, a new
//! snapshot replaces the old atomically.

use rustc_hash::FxHashMap;

use crate::models::{GraphEdge, GraphNode, NodeType, Tile, ANY_ORIGIN};
use crate::requirements::PlayerRequirements;

pub const WILDERNESS_TAG: &str = "wilderness";

#[derive(Clone, Debug, Default)]
pub struct GraphModel {
    nodes: FxHashMap<String, GraphNode>,
    adjacency: FxHashMap<String, Vec<GraphEdge>>,
    reverse: FxHashMap<String, Vec<GraphEdge>>,
    any_origin: Vec<GraphEdge>,
    position_index: FxHashMap<(i32, i32), Vec<String>>,
}

impl GraphModel {
    pub(crate) fn from_parts(
        nodes: FxHashMap<String, GraphNode>,
        adjacency: FxHashMap<String, Vec<GraphEdge>>,
        reverse: FxHashMap<String, Vec<GraphEdge>>,
        any_origin: Vec<GraphEdge>,
    ) -> Self {
        let mut position_index: FxHashMap<(i32, i32), Vec<String>> = FxHashMap::default();
        for node in nodes.values() {
            if let Some(tile) = node.tile {
                position_index.entry((tile.x, tile.y)).or_default().push(node.id.clone());
            }
        }
        for ids in position_index.values_mut() {
            ids.sort();
        }
        Self { nodes, adjacency, reverse, any_origin, position_index }
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    /// Count of real (non-virtual) nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.values().filter(|n| !n.is_virtual()).count()
    }

    pub fn edges_from(&self, id: &str) -> &[GraphEdge] {
        self.adjacency.get(id).map_or(&[], Vec::as_slice)
    }

    pub fn edges_to(&self, id: &str) -> &[GraphEdge] {
        self.reverse.get(id).map_or(&[], Vec::as_slice)
    }

    pub fn edge(&self, from: &str, to: &str) -> Option<&GraphEdge> {
        self.edges_from(from).iter().find(|e| e.to == to)
    }

    pub fn any_origin_edges(&self) -> &[GraphEdge] {
        &self.any_origin
    }

    /// Adjacency of `id` filtered by the requirement predicate, plus every
    /// admissible any-origin edge. The virtual origin never receives the
    /// any-origin set back, which would self-loop.
    pub fn traversable_edges(&self, id: &str, reqs: &dyn PlayerRequirements) -> Vec<GraphEdge> {
        let mut edges: Vec<GraphEdge> = self
            .edges_from(id)
            .iter()
            .filter(|e| reqs.can_traverse_edge(e))
            .cloned()
            .collect();
        if id != ANY_ORIGIN {
            edges.extend(self.any_origin.iter().filter(|e| reqs.can_traverse_edge(e)).cloned());
        }
        edges
    }

    pub fn nodes_at(&self, x: i32, y: i32) -> Vec<&GraphNode> {
        self.position_index
            .get(&(x, y))
            .map_or_else(Vec::new, |ids| ids.iter().filter_map(|id| self.nodes.get(id)).collect())
    }

    pub fn nodes_of_type(&self, node_type: NodeType) -> Vec<&GraphNode> {
        let mut out: Vec<&GraphNode> = self.nodes.values().filter(|n| n.node_type == node_type).collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    pub fn nearest_node_same_plane(&self, point: Tile) -> Option<&GraphNode> {
        self.nearest_where(point, |t| t.plane == point.plane)
    }

    pub fn nearest_node_any_plane(&self, point: Tile) -> Option<&GraphNode> {
        self.nearest_where(point, |_| true)
    }

    fn nearest_where(&self, point: Tile, accept: impl Fn(Tile) -> bool) -> Option<&GraphNode> {
        self.nodes
            .values()
            .filter_map(|n| n.tile.filter(|&t| accept(t)).map(|t| (n, t)))
            .min_by_key(|(n, t)| (point.chebyshev(*t), n.id.clone()))
            .map(|(n, _)| n)
    }

    pub fn is_wilderness(&self, id: &str) -> bool {
        self.nodes.get(id).is_some_and(|n| n.has_tag(WILDERNESS_TAG))
    }

    /// Every edge in the model, any-origin set included. Feeding this back
    /// into a builder reproduces the same graph.
    pub fn all_edges(&self) -> Vec<GraphEdge> {
        let mut out: Vec<GraphEdge> = self.adjacency.values().flatten().cloned().collect();
        out.extend(self.any_origin.iter().cloned());
        out
    }
}
