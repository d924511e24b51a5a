//! Global route search: lazy-deletion Dijkstra over the navigation graph
//! with requirement filtering and resource-aware edge reweighting.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::graph::model::GraphModel;
use crate::models::{EdgeType, GraphEdge, GraphRoute, NodeType, Tile};
use crate::policy::{ResourcePolicy, TeleportItemTier, TransportKind, TravelPreferences};
use crate::requirements::PlayerRequirements;

/// Hard wall-clock cap on a single search.
pub const SEARCH_TIME_BUDGET: Duration = Duration::from_secs(10);

/// "Near a node" threshold for first/last-mile classification.
pub const NEAR_NODE_RADIUS: i32 = 15;
/// Beyond this distance from any node an endpoint counts as isolated.
pub const ISOLATION_RADIUS: i32 = 100;

/// Everything a search needs about the player, captured when the request is
/// scheduled. Preferences only filter edges and shift costs; they never
/// change the graph's shape.
#[derive(Clone)]
pub struct SearchContext {
    pub requirements: Arc<dyn PlayerRequirements>,
    pub policy: Arc<dyn ResourcePolicy>,
    pub preferences: TravelPreferences,
}

impl SearchContext {
    pub fn new(requirements: Arc<dyn PlayerRequirements>, policy: Arc<dyn ResourcePolicy>) -> Self {
        let preferences = TravelPreferences::capture(policy.as_ref());
        Self { requirements, policy, preferences }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct QueueEntry {
    cost: i64,
    seq: u64,
    node: String,
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap inversion; cost then insertion order.
        (&other.cost, &other.seq, &other.node).cmp(&(&self.cost, &self.seq, &self.node))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AnalysisStatus {
    FullPathAvailable,
    FirstMileManual,
    LastMileManual,
    BothEndsManual,
    NoPathBetweenNodes,
    PlayerIsolated,
    DestinationIsolated,
    CompletelyIsolated,
    SystemUnavailable,
}

/// Never an error: describes what a route between two raw points would need.
#[derive(Clone, Debug)]
pub struct NavigationAnalysis {
    pub status: AnalysisStatus,
    pub start_node: Option<String>,
    pub end_node: Option<String>,
    pub first_mile: Option<i32>,
    pub last_mile: Option<i32>,
    pub route_cost: Option<i64>,
}

pub struct GraphSearch {
    graph: Arc<GraphModel>,
    time_budget: Duration,
}

impl GraphSearch {
    pub fn new(graph: Arc<GraphModel>) -> Self {
        Self { graph, time_budget: SEARCH_TIME_BUDGET }
    }

    pub fn with_time_budget(graph: Arc<GraphModel>, time_budget: Duration) -> Self {
        Self { graph, time_budget }
    }

    pub fn graph(&self) -> &GraphModel {
        &self.graph
    }

    /// Cheapest admissible route, or `None` when the destination is
    /// unreachable under the current requirements.
    pub fn find_path(&self, from_id: &str, to_id: &str, ctx: &SearchContext) -> Option<GraphRoute> {
        if self.graph.node(from_id).is_none() || self.graph.node(to_id).is_none() {
            return None;
        }
        if from_id == to_id {
            return Some(GraphRoute::default());
        }

        let deadline = Instant::now() + self.time_budget;
        let mut dist: FxHashMap<String, i64> = FxHashMap::default();
        let mut came_from: FxHashMap<String, (String, GraphEdge)> = FxHashMap::default();
        let mut open = BinaryHeap::new();
        let mut settled: u64 = 0;
        let mut seq: u64 = 0;

        dist.insert(from_id.to_string(), 0);
        open.push(QueueEntry { cost: 0, seq, node: from_id.to_string() });

        while let Some(entry) = open.pop() {
            if dist.get(&entry.node).is_some_and(|best| entry.cost > *best) {
                continue;
            }
            if Instant::now() > deadline {
                debug!(from = from_id, to = to_id, settled, "graph_search_time_budget");
                return None;
            }
            settled += 1;
            if entry.node == to_id {
                let route = reconstruct(&came_from, from_id, to_id, entry.cost);
                debug!(from = from_id, to = to_id, settled, cost = entry.cost, edges = route.edges.len(), "graph_search_done");
                return Some(route);
            }

            for edge in self.graph.traversable_edges(&entry.node, ctx.requirements.as_ref()) {
                if !self.admissible(&edge, ctx) {
                    continue;
                }
                let next_cost = entry.cost + self.adjusted_cost(&edge, ctx);
                if dist.get(&edge.to).map_or(true, |best| next_cost < *best) {
                    dist.insert(edge.to.clone(), next_cost);
                    came_from.insert(edge.to.clone(), (entry.node.clone(), edge.clone()));
                    seq += 1;
                    open.push(QueueEntry { cost: next_cost, seq, node: edge.to });
                }
            }
        }

        debug!(from = from_id, to = to_id, settled, "graph_search_exhausted");
        None
    }

    /// Best route to any node of the given type.
    pub fn find_path_to_nearest_type(
        &self,
        from_id: &str,
        node_type: NodeType,
        ctx: &SearchContext,
    ) -> Option<(String, GraphRoute)> {
        self.graph
            .nodes_of_type(node_type)
            .iter()
            .filter(|n| !n.is_virtual())
            .filter_map(|n| self.find_path(from_id, &n.id, ctx).map(|r| (n.id.clone(), r)))
            .min_by_key(|(id, r)| (r.total_cost, id.clone()))
    }

    fn admissible(&self, edge: &GraphEdge, ctx: &SearchContext) -> bool {
        if ctx.preferences.avoid_wilderness && self.graph.is_wilderness(&edge.to) {
            return false;
        }
        if let Some(kind) = edge.metadata_str("transport_kind").and_then(TransportKind::from_metadata) {
            if !ctx.preferences.allows(kind) {
                return false;
            }
        }
        if edge.edge_type == EdgeType::Teleport {
            if edge.metadata_str("spell").is_some() && !ctx.preferences.teleport_spells {
                return false;
            }
            if edge.metadata_str("teleport_item").is_some()
                && ctx.preferences.teleport_items == TeleportItemTier::None
            {
                return false;
            }
        }
        true
    }

    fn adjusted_cost(&self, edge: &GraphEdge, ctx: &SearchContext) -> i64 {
        let base = edge.cost_ticks;
        let cost = match edge.edge_type {
            // Three-retry expectation for failure-prone shortcuts.
            EdgeType::Agility => base + (edge.failure_rate * base as f64 * 3.0).floor() as i64,
            EdgeType::Toll => {
                if self.has_free_passage(edge, ctx) {
                    base
                } else {
                    ctx.policy.adjust_gold_travel(base, edge.toll_cost)
                }
            }
            EdgeType::Teleport => {
                let law_runes = edge.metadata_i64("law_runes").unwrap_or(0);
                ctx.policy.adjust_teleport_cost(base, law_runes)
            }
            EdgeType::Transport => {
                let mut c = base;
                if edge.toll_cost > 0 && !self.has_free_passage(edge, ctx) {
                    // Gold fares reweight like tolls.
                    c = ctx.policy.adjust_gold_travel(c, edge.toll_cost);
                }
                c + match edge.metadata_str("transport_kind").and_then(TransportKind::from_metadata) {
                    Some(TransportKind::FairyRings) => ctx.preferences.fairy_ring_bonus,
                    Some(TransportKind::SpiritTrees) => ctx.preferences.spirit_tree_bonus,
                    _ => 0,
                }
            }
            EdgeType::Walk | EdgeType::Stairs | EdgeType::Door | EdgeType::FreeTeleport => base,
        };
        cost.max(1)
    }

    fn has_free_passage(&self, edge: &GraphEdge, ctx: &SearchContext) -> bool {
        edge.free_passage_quest
            .as_deref()
            .is_some_and(|q| ctx.requirements.is_quest_completed(q))
    }

    /// Classify why (or whether) a raw point pair can ride the graph.
    pub fn analyze(&self, player: Tile, destination: Tile, ctx: &SearchContext) -> NavigationAnalysis {
        if self.graph.node_count() == 0 {
            return NavigationAnalysis {
                status: AnalysisStatus::SystemUnavailable,
                start_node: None,
                end_node: None,
                first_mile: None,
                last_mile: None,
                route_cost: None,
            };
        }

        let start = self.graph.nearest_node_same_plane(player);
        let end = self.graph.nearest_node_same_plane(destination);
        let first_mile = start.and_then(|n| n.tile).map(|t| player.chebyshev(t));
        let last_mile = end.and_then(|n| n.tile).map(|t| destination.chebyshev(t));

        let player_isolated = first_mile.map_or(true, |d| d > ISOLATION_RADIUS);
        let dest_isolated = last_mile.map_or(true, |d| d > ISOLATION_RADIUS);
        let mut analysis = NavigationAnalysis {
            status: AnalysisStatus::FullPathAvailable,
            start_node: start.map(|n| n.id.clone()),
            end_node: end.map(|n| n.id.clone()),
            first_mile,
            last_mile,
            route_cost: None,
        };

        match (player_isolated, dest_isolated) {
            (true, true) => {
                analysis.status = AnalysisStatus::CompletelyIsolated;
                return analysis;
            }
            (true, false) => {
                analysis.status = AnalysisStatus::PlayerIsolated;
                return analysis;
            }
            (false, true) => {
                analysis.status = AnalysisStatus::DestinationIsolated;
                return analysis;
            }
            (false, false) => {}
        }

        let (start_id, end_id) = match (&analysis.start_node, &analysis.end_node) {
            (Some(s), Some(e)) => (s.clone(), e.clone()),
            _ => unreachable!("non-isolated endpoints always have nearest nodes"),
        };
        match self.find_path(&start_id, &end_id, ctx) {
            Some(route) => {
                analysis.route_cost = Some(route.total_cost);
                let first_far = first_mile.is_some_and(|d| d > NEAR_NODE_RADIUS);
                let last_far = last_mile.is_some_and(|d| d > NEAR_NODE_RADIUS);
                analysis.status = match (first_far, last_far) {
                    (false, false) => AnalysisStatus::FullPathAvailable,
                    (true, false) => AnalysisStatus::FirstMileManual,
                    (false, true) => AnalysisStatus::LastMileManual,
                    (true, true) => AnalysisStatus::BothEndsManual,
                };
            }
            None => analysis.status = AnalysisStatus::NoPathBetweenNodes,
        }
        analysis
    }
}

fn reconstruct(
    came_from: &FxHashMap<String, (String, GraphEdge)>,
    from_id: &str,
    to_id: &str,
    total_cost: i64,
) -> GraphRoute {
    let mut edges = Vec::new();
    let mut current = to_id.to_string();
    while current != from_id {
        match came_from.get(&current) {
            Some((prev, edge)) => {
                edges.push(edge.clone());
                current = prev.clone();
            }
            None => return GraphRoute::default(),
        }
    }
    edges.reverse();
    GraphRoute { edges, total_cost }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::builder::GraphBuilder;
    use crate::models::{GraphNode, Tile};
    use crate::policy::DefaultResourcePolicy;
    use crate::requirements::PlayerProfile;

    fn ctx() -> SearchContext {
        let mut profile = PlayerProfile::default();
        profile.risk_threshold = 1.0;
        SearchContext::new(Arc::new(profile), Arc::new(DefaultResourcePolicy::default()))
    }

    fn two_node_graph(edge: crate::models::GraphEdge) -> GraphSearch {
        let mut b = GraphBuilder::new();
        b.add_node(GraphNode::new("a", Tile::new(0, 0, 0), NodeType::Bank));
        b.add_node(GraphNode::new("b", Tile::new(50, 0, 0), NodeType::Generic));
        b.add_edge(edge);
        GraphSearch::new(Arc::new(b.build().unwrap()))
    }

    #[test]
    fn agility_penalty_uses_three_retry_form() {
        let mut edge = crate::models::GraphEdge::typed("a", "b", EdgeType::Agility, 10);
        edge.agility_level = Some(1);
        edge.failure_rate = 0.25;
        let search = two_node_graph(edge);
        let mut profile = PlayerProfile::default().with_skill("agility", 99);
        profile.risk_threshold = 1.0;
        let ctx = SearchContext::new(Arc::new(profile), Arc::new(DefaultResourcePolicy::default()));
        let route = search.find_path("a", "b", &ctx).unwrap();
        // 10 + floor(0.25 * 10 * 3) = 17
        assert_eq!(route.total_cost, 17);
    }

    #[test]
    fn cost_clamps_to_one() {
        let mut edge = crate::models::GraphEdge::typed("a", "b", EdgeType::Transport, 2);
        edge.metadata.insert("transport_kind".into(), serde_json::json!("spirit_tree"));
        let search = two_node_graph(edge);
        let policy = DefaultResourcePolicy { spirit_tree_bonus: -50, ..Default::default() };
        let ctx = SearchContext::new(Arc::new(PlayerProfile::default()), Arc::new(policy));
        let route = search.find_path("a", "b", &ctx).unwrap();
        assert_eq!(route.total_cost, 1);
    }

    #[test]
    fn same_node_is_an_empty_route() {
        let search = two_node_graph(crate::models::GraphEdge::walk("a", "b", 3));
        let route = search.find_path("a", "a", &ctx()).unwrap();
        assert!(route.is_empty());
        assert_eq!(route.total_cost, 0);
    }

    #[test]
    fn unknown_endpoint_is_unreachable() {
        let search = two_node_graph(crate::models::GraphEdge::walk("a", "b", 3));
        assert!(search.find_path("a", "nowhere", &ctx()).is_none());
    }
}
