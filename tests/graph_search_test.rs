use std::sync::Arc;

use wayfinder::graph::{AnalysisStatus, GraphBuilder, GraphModel, GraphSearch, SearchContext};
use wayfinder::models::{EdgeType, GraphEdge, GraphNode, NodeType, Tile, ANY_ORIGIN};
use wayfinder::policy::{DefaultResourcePolicy, ResourcePolicy, TeleportItemTier, TransportKind};
use wayfinder::requirements::{PlayerProfile, QuestState, Requirement};

fn bank(id: &str, x: i32, y: i32) -> GraphNode {
    GraphNode::new(id, Tile::new(x, y, 0), NodeType::Bank)
}

fn generic(id: &str, x: i32, y: i32) -> GraphNode {
    GraphNode::new(id, Tile::new(x, y, 0), NodeType::Generic)
}

fn open_profile() -> PlayerProfile {
    let mut p = PlayerProfile::default().with_skill("agility", 99).with_skill("magic", 99);
    p.risk_threshold = 1.0;
    p
}

fn ctx_with(profile: PlayerProfile, policy: DefaultResourcePolicy) -> SearchContext {
    SearchContext::new(Arc::new(profile), Arc::new(policy))
}

/// Policy with a fixed answer for gold-gated travel.
struct FlatTollPolicy(i64);

impl ResourcePolicy for FlatTollPolicy {
    fn should_avoid_wilderness(&self) -> bool {
        false
    }
    fn should_use(&self, _kind: TransportKind) -> bool {
        true
    }
    fn teleport_items_tier(&self) -> TeleportItemTier {
        TeleportItemTier::Inventory
    }
    fn adjust_teleport_cost(&self, base_ticks: i64, _law_runes: i64) -> i64 {
        base_ticks
    }
    fn adjust_gold_travel(&self, _base_ticks: i64, _gold_cost: i64) -> i64 {
        self.0
    }
}

fn toll_graph() -> Arc<GraphModel> {
    let mut b = GraphBuilder::new();
    b.add_node(bank("a", 0, 0));
    b.add_node(generic("b", 60, 0));
    let mut toll = GraphEdge::typed("a", "b", EdgeType::Toll, 10);
    toll.toll_cost = 100;
    toll.free_passage_quest = Some("border_pass".into());
    b.add_edge(toll);
    Arc::new(b.build().unwrap())
}

#[test]
fn toll_cost_goes_through_the_policy() {
    let search = GraphSearch::new(toll_graph());
    let ctx = SearchContext::new(Arc::new(open_profile()), Arc::new(FlatTollPolicy(11)));
    let route = search.find_path("a", "b", &ctx).unwrap();
    assert_eq!(route.total_cost, 11);
    assert_eq!(route.edges.len(), 1);
}

#[test]
fn completed_passage_quest_waives_the_toll() {
    let search = GraphSearch::new(toll_graph());
    let profile = open_profile().with_quest("border_pass", QuestState::Finished);
    let ctx = SearchContext::new(Arc::new(profile), Arc::new(FlatTollPolicy(11)));
    let route = search.find_path("a", "b", &ctx).unwrap();
    assert_eq!(route.total_cost, 10);
}

#[test]
fn free_teleport_bridges_distant_nodes() {
    let mut b = GraphBuilder::new();
    b.add_node(bank("a", 0, 0));
    b.add_node(generic("b", 1000, 1000));
    b.add_node(generic("c", 995, 1000));
    b.add_edge(GraphEdge::typed(ANY_ORIGIN, "c", EdgeType::FreeTeleport, 30));
    b.add_edge(GraphEdge::walk("c", "b", 5));
    let search = GraphSearch::new(Arc::new(b.build().unwrap()));

    let ctx = ctx_with(open_profile(), DefaultResourcePolicy::default());
    let route = search.find_path("a", "b", &ctx).unwrap();
    assert_eq!(route.edges.len(), 2);
    assert_eq!(route.edges[0].edge_type, EdgeType::FreeTeleport);
    assert_eq!(route.edges[1].to, "b");
    assert_eq!(route.total_cost, 35);
}

#[test]
fn tightening_requirements_never_cheapens_a_route() {
    let mut b = GraphBuilder::new();
    b.add_node(bank("a", 0, 0));
    b.add_node(generic("b", 80, 0));
    b.add_edge(GraphEdge::walk("a", "b", 50));
    let mut shortcut = GraphEdge::typed("a", "b", EdgeType::Agility, 5);
    shortcut.agility_level = Some(60);
    shortcut.requirements.push(Requirement::AgilityLevel { level: 60 });
    b.add_edge(shortcut);
    let search = GraphSearch::new(Arc::new(b.build().unwrap()));

    let skilled = ctx_with(open_profile(), DefaultResourcePolicy::default());
    let cheap = search.find_path("a", "b", &skilled).unwrap().total_cost;

    let mut novice = PlayerProfile::default().with_skill("agility", 10);
    novice.risk_threshold = 1.0;
    let tightened = ctx_with(novice, DefaultResourcePolicy::default());
    let expensive = search.find_path("a", "b", &tightened).unwrap().total_cost;

    assert_eq!(cheap, 5);
    assert_eq!(expensive, 50);
    assert!(expensive >= cheap);

    // Tightening until nothing is admissible yields no path, never a cheaper one
    let mut b2 = GraphBuilder::new();
    b2.add_node(bank("a", 0, 0));
    b2.add_node(generic("b", 80, 0));
    let mut gated = GraphEdge::walk("a", "b", 50);
    gated.requirements.push(Requirement::Quest { name: "epic".into(), state: QuestState::Finished });
    b2.add_edge(gated);
    let search2 = GraphSearch::new(Arc::new(b2.build().unwrap()));
    assert!(search2.find_path("a", "b", &tightened).is_none());
}

#[test]
fn wilderness_nodes_are_skipped_when_avoided() {
    let mut b = GraphBuilder::new();
    b.add_node(bank("a", 0, 0));
    let mut wild = generic("wild", 30, 0);
    wild.tags.push("wilderness".into());
    b.add_node(wild);
    b.add_node(generic("b", 60, 0));
    b.add_edge(GraphEdge::walk("a", "wild", 5));
    b.add_edge(GraphEdge::walk("wild", "b", 5));
    b.add_edge(GraphEdge::walk("a", "b", 40));
    let search = GraphSearch::new(Arc::new(b.build().unwrap()));

    let relaxed = ctx_with(open_profile(), DefaultResourcePolicy::default());
    assert_eq!(search.find_path("a", "b", &relaxed).unwrap().total_cost, 10);

    let policy = DefaultResourcePolicy { avoid_wilderness: true, ..Default::default() };
    let cautious = ctx_with(open_profile(), policy);
    assert_eq!(search.find_path("a", "b", &cautious).unwrap().total_cost, 40);
}

#[test]
fn disabled_transport_kinds_are_inadmissible() {
    let mut b = GraphBuilder::new();
    b.add_node(bank("a", 0, 0));
    b.add_node(generic("b", 200, 0));
    let mut canoe = GraphEdge::typed("a", "b", EdgeType::Transport, 8);
    canoe.metadata.insert("transport_kind".into(), serde_json::json!("canoe"));
    b.add_edge(canoe);
    b.add_edge(GraphEdge::walk("a", "b", 90));
    let search = GraphSearch::new(Arc::new(b.build().unwrap()));

    let allowed = ctx_with(open_profile(), DefaultResourcePolicy::default());
    assert_eq!(search.find_path("a", "b", &allowed).unwrap().total_cost, 8);

    let policy = DefaultResourcePolicy { disabled: vec![TransportKind::Canoes], ..Default::default() };
    let restricted = ctx_with(open_profile(), policy);
    assert_eq!(search.find_path("a", "b", &restricted).unwrap().total_cost, 90);
}

#[test]
fn fairy_ring_incentive_shifts_the_choice() {
    let mut b = GraphBuilder::new();
    b.add_node(bank("a", 0, 0));
    b.add_node(generic("b", 200, 0));
    let mut ring = GraphEdge::typed("a", "b", EdgeType::Transport, 12);
    ring.metadata.insert("transport_kind".into(), serde_json::json!("fairy_ring"));
    b.add_edge(ring);
    b.add_edge(GraphEdge::walk("a", "b", 10));
    let search = GraphSearch::new(Arc::new(b.build().unwrap()));

    let neutral = ctx_with(open_profile(), DefaultResourcePolicy::default());
    assert_eq!(search.find_path("a", "b", &neutral).unwrap().total_cost, 10);

    let policy = DefaultResourcePolicy { fairy_ring_bonus: -5, ..Default::default() };
    let keen = ctx_with(open_profile(), policy);
    let route = search.find_path("a", "b", &keen).unwrap();
    assert_eq!(route.total_cost, 7);
    assert_eq!(route.edges[0].edge_type, EdgeType::Transport);
}

#[test]
fn nearest_type_picks_the_cheapest_candidate() {
    let mut b = GraphBuilder::new();
    b.add_node(generic("start", 0, 0));
    b.add_node(bank("bank_near", 40, 0));
    b.add_node(bank("bank_far", 300, 0));
    b.add_edge(GraphEdge::walk("start", "bank_near", 12));
    b.add_edge(GraphEdge::walk("start", "bank_far", 80));
    let search = GraphSearch::new(Arc::new(b.build().unwrap()));

    let ctx = ctx_with(open_profile(), DefaultResourcePolicy::default());
    let (id, route) = search.find_path_to_nearest_type("start", NodeType::Bank, &ctx).unwrap();
    assert_eq!(id, "bank_near");
    assert_eq!(route.total_cost, 12);
}

#[test]
fn analyze_classifies_endpoint_quality() {
    let mut b = GraphBuilder::new();
    b.add_node(bank("a", 100, 100));
    b.add_node(generic("b", 160, 100));
    b.add_edge(GraphEdge::walk("a", "b", 20));
    let search = GraphSearch::new(Arc::new(b.build().unwrap()));
    let ctx = ctx_with(open_profile(), DefaultResourcePolicy::default());

    // Both endpoints sit on nodes
    let full = search.analyze(Tile::new(102, 100, 0), Tile::new(158, 100, 0), &ctx);
    assert_eq!(full.status, AnalysisStatus::FullPathAvailable);
    assert_eq!(full.route_cost, Some(20));
    assert_eq!(full.start_node.as_deref(), Some("a"));

    // Player starts a long walk from the nearest node
    let first = search.analyze(Tile::new(60, 100, 0), Tile::new(158, 100, 0), &ctx);
    assert_eq!(first.status, AnalysisStatus::FirstMileManual);
    assert_eq!(first.first_mile, Some(40));

    let last = search.analyze(Tile::new(102, 100, 0), Tile::new(200, 100, 0), &ctx);
    assert_eq!(last.status, AnalysisStatus::LastMileManual);

    let both = search.analyze(Tile::new(60, 100, 0), Tile::new(200, 100, 0), &ctx);
    assert_eq!(both.status, AnalysisStatus::BothEndsManual);

    // Far beyond the isolation radius
    let lost = search.analyze(Tile::new(500, 500, 0), Tile::new(158, 100, 0), &ctx);
    assert_eq!(lost.status, AnalysisStatus::PlayerIsolated);
    let stranded = search.analyze(Tile::new(102, 100, 0), Tile::new(500, 500, 0), &ctx);
    assert_eq!(stranded.status, AnalysisStatus::DestinationIsolated);
    let nowhere = search.analyze(Tile::new(500, 500, 0), Tile::new(900, 900, 0), &ctx);
    assert_eq!(nowhere.status, AnalysisStatus::CompletelyIsolated);
}

#[test]
fn analyze_reports_disconnected_and_empty_graphs() {
    let mut b = GraphBuilder::new();
    b.add_node(bank("a", 100, 100));
    b.add_node(generic("b", 160, 100));
    // No edges at all
    let search = GraphSearch::new(Arc::new(b.build().unwrap()));
    let ctx = ctx_with(open_profile(), DefaultResourcePolicy::default());
    let split = search.analyze(Tile::new(100, 100, 0), Tile::new(160, 100, 0), &ctx);
    assert_eq!(split.status, AnalysisStatus::NoPathBetweenNodes);

    let empty = GraphSearch::new(Arc::new(GraphModel::default()));
    let dead = empty.analyze(Tile::new(0, 0, 0), Tile::new(1, 1, 0), &ctx);
    assert_eq!(dead.status, AnalysisStatus::SystemUnavailable);
}
