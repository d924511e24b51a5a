use std::sync::Arc;
use std::time::Duration;

use wayfinder::collision::CollisionMap;
use wayfinder::coordinator::{NavigationCoordinator, NavigationProvider};
use wayfinder::graph::GraphBuilder;
use wayfinder::models::{GraphEdge, GraphNode, NodeType, PathCost, Tile};
use wayfinder::policy::DefaultResourcePolicy;
use wayfinder::requirements::PlayerProfile;
use wayfinder::PathCostCache;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter("wayfinder=debug").try_init();
}

fn connected_graph() -> Arc<wayfinder::GraphModel> {
    let mut b = GraphBuilder::new();
    b.add_node(GraphNode::new("near_start", Tile::new(12, 10, 0), NodeType::Bank));
    b.add_node(GraphNode::new("near_end", Tile::new(498, 10, 0), NodeType::Generic));
    b.add_edge(GraphEdge::walk("near_start", "near_end", 30));
    Arc::new(b.build().unwrap())
}

fn disconnected_graph() -> Arc<wayfinder::GraphModel> {
    let mut b = GraphBuilder::new();
    b.add_node(GraphNode::new("near_start", Tile::new(12, 10, 0), NodeType::Bank));
    b.add_node(GraphNode::new("near_end", Tile::new(498, 10, 0), NodeType::Generic));
    Arc::new(b.build().unwrap())
}

fn coordinator(graph: Arc<wayfinder::GraphModel>) -> NavigationCoordinator<CollisionMap> {
    let oracle = Arc::new(CollisionMap::new(0, 0, 104, 104));
    NavigationCoordinator::with_settings(
        oracle,
        graph,
        Arc::new(PlayerProfile::default()),
        Arc::new(DefaultResourcePolicy::default()),
        Duration::from_secs(2),
        PathCostCache::new(),
    )
}

/// Poll until the async tier answers; consumers re-ask on subsequent ticks.
fn poll(coord: &NavigationCoordinator<CollisionMap>, from: Tile, to: Tile) -> PathCost {
    for _ in 0..500 {
        let answer = coord.path_cost(from, to);
        if !answer.is_pending() {
            return answer;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    PathCost::Pending
}

#[test]
fn identical_endpoints_cost_nothing() {
    let coord = coordinator(connected_graph());
    assert_eq!(coord.path_cost(Tile::new(5, 5, 0), Tile::new(5, 5, 0)), PathCost::Known(0));
}

#[test]
fn in_scene_queries_answer_synchronously() {
    let coord = coordinator(connected_graph());
    let answer = coord.path_cost(Tile::new(5, 5, 0), Tile::new(40, 5, 0));
    // Tile count of the local path, no graph round trip
    assert_eq!(answer, PathCost::Known(36));
}

#[test]
fn distant_queries_go_pending_then_resolve() {
    init_tracing();
    let coord = coordinator(connected_graph());
    let from = Tile::new(10, 10, 0);
    let to = Tile::new(500, 10, 0);

    assert_eq!(coord.path_cost(from, to), PathCost::Pending);
    let answer = poll(&coord, from, to);
    // first mile (2) + route (30) + last mile (2)
    assert_eq!(answer, PathCost::Known(34));

    // The completed result now lives in the cache
    assert_eq!(coord.path_cost(from, to), PathCost::Known(34));
    // And the route behind it is available to consumers
    let route = coord.completed_route(from, to).unwrap();
    assert_eq!(route.total_cost, 30);
    assert_eq!(route.edges.len(), 1);
}

#[test]
fn second_request_is_dropped_while_slot_is_busy() {
    let coord = coordinator(connected_graph());
    let from = Tile::new(10, 10, 0);
    let to_a = Tile::new(500, 10, 0);
    let to_b = Tile::new(500, 40, 0);

    assert_eq!(coord.path_cost(from, to_a), PathCost::Pending);
    // Slot already owned; this one is dropped rather than queued
    assert_eq!(coord.path_cost(from, to_b), PathCost::Pending);

    assert!(matches!(poll(&coord, from, to_a), PathCost::Known(_)));
    // The dropped pair can now schedule and resolve on its own
    assert!(matches!(poll(&coord, from, to_b), PathCost::Known(_)));
}

#[test]
fn unreachable_graph_answers_are_remembered() {
    let coord = coordinator(disconnected_graph());
    let from = Tile::new(10, 10, 0);
    let to = Tile::new(500, 10, 0);

    assert_eq!(coord.path_cost(from, to), PathCost::Pending);
    assert_eq!(poll(&coord, from, to), PathCost::Unreachable);
    // Memoized: no new request is needed to answer again
    assert_eq!(coord.path_cost(from, to), PathCost::Unreachable);
}

#[test]
fn clear_path_cancels_and_allows_rescheduling() {
    let coord = coordinator(connected_graph());
    let from = Tile::new(10, 10, 0);
    let to = Tile::new(500, 10, 0);

    assert_eq!(coord.path_cost(from, to), PathCost::Pending);
    coord.clear_path();
    // The canceled request's result is discarded; asking again starts fresh
    let answer = poll(&coord, from, to);
    assert_eq!(answer, PathCost::Known(34));
}

#[test]
fn graph_swap_invalidates_cached_answers() {
    let coord = coordinator(disconnected_graph());
    let from = Tile::new(10, 10, 0);
    let to = Tile::new(500, 10, 0);
    assert_eq!(coord.path_cost(from, to), PathCost::Pending);
    assert_eq!(poll(&coord, from, to), PathCost::Unreachable);

    coord.replace_graph(connected_graph());
    assert_eq!(poll(&coord, from, to), PathCost::Known(34));
}

#[test]
fn synchronous_route_fetch_matches_the_async_answer() {
    let coord = coordinator(connected_graph());
    let route = coord.graph_route(Tile::new(10, 10, 0), Tile::new(500, 10, 0)).unwrap();
    assert_eq!(route.total_cost, 30);
    assert_eq!(route.edges[0].from, "near_start");
}

#[test]
fn provider_surface_reaches_collision_and_reachability() {
    let mut map = CollisionMap::new(0, 0, 104, 104);
    map.add_flags(Tile::new(50, 50, 0), wayfinder::collision::FULL_BLOCK);
    let coord = NavigationCoordinator::with_settings(
        Arc::new(map),
        connected_graph(),
        Arc::new(PlayerProfile::default()),
        Arc::new(DefaultResourcePolicy::default()),
        Duration::from_secs(2),
        PathCostCache::new(),
    );
    let provider: &dyn NavigationProvider = &coord;
    assert!(provider.is_blocked(Tile::new(50, 50, 0)));
    assert!(!provider.line_of_sight(Tile::new(48, 50, 0), Tile::new(52, 50, 0)));
    assert!(provider.can_interact_tile(Tile::new(10, 10, 0), Tile::new(11, 10, 0)));

    let door = wayfinder::SceneObject::new(5, Tile::new(50, 50, 0)).as_boundary();
    assert!(provider.can_interact_object(Tile::new(49, 50, 0), &door));

    // Footprints come back through the shared memo
    let counter = wayfinder::SceneObject::new(6, Tile::new(20, 20, 0)).with_size(2, 1);
    let first = provider.footprint_of(&counter);
    assert_eq!(first.len(), 2);
    assert!(Arc::ptr_eq(&first, &provider.footprint_of(&counter)));

    // Standing in range with clear sight means no repositioning
    let player = Tile::new(10, 10, 0);
    assert_eq!(provider.find_attackable_position(player, Tile::new(14, 10, 0), 5), Some(player));
    // The wall at (50,50) denies the shot from the adjacent west tile
    let near_wall = provider.find_attackable_position(Tile::new(48, 50, 0), Tile::new(52, 50, 0), 4);
    if let Some(t) = near_wall {
        assert!(provider.line_of_sight(t, Tile::new(52, 50, 0)));
    }
}

#[test]
fn cross_plane_targets_without_nodes_are_unreachable() {
    let coord = coordinator(connected_graph());
    let from = Tile::new(10, 10, 0);
    let to = Tile::new(30, 10, 2);
    assert_eq!(coord.path_cost(from, to), PathCost::Pending);
    assert_eq!(poll(&coord, from, to), PathCost::Unreachable);
}
