//! Top-level dispatcher for cost queries. Local answers come from the tile
//! pathfinder on the caller thread; distant answers are computed by a single
//! worker thread owning one async request slot, and callers poll. No call
//! here blocks on a graph search.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use arc_swap::ArcSwap;
use tracing::debug;

use crate::astar::TilePathfinder;
use crate::collision::CollisionOracle;
use crate::cost_cache::PathCostCache;
use crate::graph::model::GraphModel;
use crate::graph::search::{GraphSearch, NavigationAnalysis, SearchContext, SEARCH_TIME_BUDGET};
use crate::models::{GraphRoute, PathCost, Tile};
use crate::policy::ResourcePolicy;
use crate::reachability::Reachability;
use crate::requirements::PlayerRequirements;
use crate::scene::SceneObject;

/// Targets farther than this are out of scene and go through the graph.
pub const SCENE_RADIUS: i32 = 52;

/// Capability set consumers (entity finder, spot ranker) need from the
/// navigation stack; wired explicitly at build time to avoid construction
/// cycles.
pub trait NavigationProvider: Send + Sync {
    fn path_cost(&self, from: Tile, to: Tile) -> PathCost;
    fn can_interact_object(&self, player: Tile, object: &SceneObject) -> bool;
    fn can_interact_tile(&self, player: Tile, target: Tile) -> bool;
    fn find_attackable_position(&self, player: Tile, target: Tile, weapon_range: i32) -> Option<Tile>;
    /// Memoized footprint lookup; consumers share one cache keyed
    /// (id, orientation, origin).
    fn footprint_of(&self, object: &SceneObject) -> Arc<Vec<Tile>>;
    fn is_blocked(&self, tile: Tile) -> bool;
    fn line_of_sight(&self, from: Tile, to: Tile) -> bool;
}

struct AsyncRequest {
    from: Tile,
    to: Tile,
    generation: u64,
    ctx: SearchContext,
}

struct Completion {
    cost: Option<i64>,
    tile_count: usize,
    route: Option<GraphRoute>,
}

enum SlotState {
    Idle,
    InFlight { from: Tile, to: Tile, generation: u64 },
    Done { from: Tile, to: Tile, result: Completion },
}

pub struct NavigationCoordinator<C: CollisionOracle + 'static> {
    oracle: Arc<C>,
    pathfinder: TilePathfinder<C>,
    reachability: Reachability<C>,
    graph: Arc<ArcSwap<GraphModel>>,
    cache: PathCostCache,
    slot: Arc<Mutex<SlotState>>,
    last_route: Mutex<Option<(Tile, Tile, GraphRoute)>>,
    generation: Arc<AtomicU64>,
    tx: Option<mpsc::Sender<AsyncRequest>>,
    worker: Option<JoinHandle<()>>,
    requirements: Arc<dyn PlayerRequirements>,
    policy: Arc<dyn ResourcePolicy>,
}

impl<C: CollisionOracle + 'static> NavigationCoordinator<C> {
    pub fn new(
        oracle: Arc<C>,
        graph: Arc<GraphModel>,
        requirements: Arc<dyn PlayerRequirements>,
        policy: Arc<dyn ResourcePolicy>,
    ) -> Self {
        Self::with_settings(oracle, graph, requirements, policy, SEARCH_TIME_BUDGET, PathCostCache::new())
    }

    pub fn with_settings(
        oracle: Arc<C>,
        graph: Arc<GraphModel>,
        requirements: Arc<dyn PlayerRequirements>,
        policy: Arc<dyn ResourcePolicy>,
        search_budget: Duration,
        cache: PathCostCache,
    ) -> Self {
        let graph = Arc::new(ArcSwap::from(graph));
        let slot = Arc::new(Mutex::new(SlotState::Idle));
        let generation = Arc::new(AtomicU64::new(0));
        let (tx, rx) = mpsc::channel::<AsyncRequest>();
        let worker = spawn_worker(rx, Arc::clone(&graph), Arc::clone(&slot), Arc::clone(&generation), search_budget);
        Self {
            pathfinder: TilePathfinder::new(Arc::clone(&oracle)),
            reachability: Reachability::new(Arc::clone(&oracle)),
            oracle,
            graph,
            cache,
            slot,
            last_route: Mutex::new(None),
            generation,
            tx: Some(tx),
            worker: Some(worker),
            requirements,
            policy,
        }
    }

    pub fn reachability(&self) -> &Reachability<C> {
        &self.reachability
    }

    pub fn pathfinder(&self) -> &TilePathfinder<C> {
        &self.pathfinder
    }

    /// Swap in a freshly built graph. In-flight searches complete against the
    /// snapshot they started with.
    pub fn replace_graph(&self, graph: Arc<GraphModel>) {
        self.graph.store(graph);
        self.cache.clear();
    }

    fn search_context(&self) -> SearchContext {
        SearchContext::new(Arc::clone(&self.requirements), Arc::clone(&self.policy))
    }

    /// Tiered cost query: local tile path, then cache, then the async slot.
    /// `Pending` means a graph search is (now) in flight; ask again next tick.
    pub fn path_cost(&self, from: Tile, to: Tile) -> PathCost {
        if from == to {
            return PathCost::Known(0);
        }

        if from.plane == to.plane && from.chebyshev(to) <= SCENE_RADIUS {
            let path = self.pathfinder.find_path(from, to, false);
            if !path.is_empty() {
                return PathCost::Known(path.len() as i64);
            }
        }

        let version = self.oracle.version();
        if let Some(entry) = self.cache.lookup(from, to, from, version) {
            return match entry.cost {
                Some(cost) => PathCost::Known(cost),
                None => PathCost::Unreachable,
            };
        }

        if let Some(answer) = self.consume_completion(from, to, version) {
            return answer;
        }

        self.schedule(from, to)
    }

    /// Harvest a finished async result. Returns the answer when it matches
    /// the asked pair; any completed result is moved into the cache.
    fn consume_completion(&self, from: Tile, to: Tile, version: u64) -> Option<PathCost> {
        let mut guard = self.slot.lock().expect("async slot mutex poisoned");
        if !matches!(*guard, SlotState::Done { .. }) {
            return None;
        }
        let SlotState::Done { from: done_from, to: done_to, result } =
            std::mem::replace(&mut *guard, SlotState::Idle)
        else {
            unreachable!();
        };
        drop(guard);

        self.cache.insert(done_from, done_to, result.cost, result.tile_count, done_from, version);
        if let Some(route) = result.route {
            let mut last = self.last_route.lock().expect("route slot mutex poisoned");
            *last = Some((done_from, done_to, route));
        }
        if done_from == from && done_to == to {
            return Some(match result.cost {
                Some(cost) => PathCost::Known(cost),
                None => PathCost::Unreachable,
            });
        }
        None
    }

    fn schedule(&self, from: Tile, to: Tile) -> PathCost {
        let mut guard = self.slot.lock().expect("async slot mutex poisoned");
        match *guard {
            SlotState::Idle => {
                let Some(tx) = self.tx.as_ref() else {
                    return PathCost::Unreachable;
                };
                let generation = self.generation.load(Ordering::Acquire);
                *guard = SlotState::InFlight { from, to, generation };
                drop(guard);
                let request = AsyncRequest { from, to, generation, ctx: self.search_context() };
                if tx.send(request).is_err() {
                    // Worker is gone; reset so later queries can notice.
                    *self.slot.lock().expect("async slot mutex poisoned") = SlotState::Idle;
                    return PathCost::Unreachable;
                }
                PathCost::Pending
            }
            // A different request already owns the slot; this one is dropped,
            // not queued.
            SlotState::InFlight { .. } | SlotState::Done { .. } => PathCost::Pending,
        }
    }

    /// Cancel the in-flight request and forget the completed slot.
    pub fn clear_path(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        *self.slot.lock().expect("async slot mutex poisoned") = SlotState::Idle;
        *self.last_route.lock().expect("route slot mutex poisoned") = None;
    }

    /// The edge route behind the most recent completed cost for this pair.
    pub fn completed_route(&self, from: Tile, to: Tile) -> Option<GraphRoute> {
        let guard = self.last_route.lock().expect("route slot mutex poisoned");
        guard.as_ref().and_then(|(f, t, route)| (*f == from && *t == to).then(|| route.clone()))
    }

    /// Synchronous graph route for callers that own their own timing (tests,
    /// one-shot tools). Production cost queries go through `path_cost`.
    pub fn graph_route(&self, from: Tile, to: Tile) -> Option<GraphRoute> {
        let graph = self.graph.load_full();
        let ctx = self.search_context();
        resolve_and_search(&graph, from, to, SEARCH_TIME_BUDGET, &ctx).route
    }

    pub fn analyze(&self, player: Tile, destination: Tile) -> NavigationAnalysis {
        let graph = self.graph.load_full();
        GraphSearch::new(graph).analyze(player, destination, &self.search_context())
    }

    pub fn invalidate_local_cache(&self) {
        self.pathfinder.invalidate_cache();
    }
}

impl<C: CollisionOracle + 'static> Drop for NavigationCoordinator<C> {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain and exit.
        self.tx.take();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl<C: CollisionOracle + 'static> NavigationProvider for NavigationCoordinator<C> {
    fn path_cost(&self, from: Tile, to: Tile) -> PathCost {
        NavigationCoordinator::path_cost(self, from, to)
    }

    fn can_interact_object(&self, player: Tile, object: &SceneObject) -> bool {
        self.reachability.can_interact_object(player, object)
    }

    fn can_interact_tile(&self, player: Tile, target: Tile) -> bool {
        self.reachability.can_interact_tile(player, target)
    }

    fn find_attackable_position(&self, player: Tile, target: Tile, weapon_range: i32) -> Option<Tile> {
        self.reachability.find_attackable_position(player, target, weapon_range)
    }

    fn footprint_of(&self, object: &SceneObject) -> Arc<Vec<Tile>> {
        self.reachability.footprint_of(object)
    }

    fn is_blocked(&self, tile: Tile) -> bool {
        self.oracle.is_blocked(tile)
    }

    fn line_of_sight(&self, from: Tile, to: Tile) -> bool {
        self.oracle.line_of_sight(from, to)
    }
}

fn spawn_worker(
    rx: mpsc::Receiver<AsyncRequest>,
    graph: Arc<ArcSwap<GraphModel>>,
    slot: Arc<Mutex<SlotState>>,
    generation: Arc<AtomicU64>,
    search_budget: Duration,
) -> JoinHandle<()> {
    std::thread::Builder::new()
        .name("wayfinder-graph-search".into())
        .spawn(move || {
            while let Ok(request) = rx.recv() {
                // Each search runs against the snapshot current at pickup.
                let snapshot = graph.load_full();
                let result = resolve_and_search(&snapshot, request.from, request.to, search_budget, &request.ctx);

                if generation.load(Ordering::Acquire) != request.generation {
                    debug!(from = ?request.from, to = ?request.to, "graph_search_result_discarded");
                    continue;
                }
                let mut guard = slot.lock().expect("async slot mutex poisoned");
                match *guard {
                    SlotState::InFlight { from, to, generation: g }
                        if from == request.from && to == request.to && g == request.generation =>
                    {
                        *guard = SlotState::Done {
                            from: request.from,
                            to: request.to,
                            result: Completion {
                                cost: result.cost,
                                tile_count: result.tile_count,
                                route: result.route,
                            },
                        };
                    }
                    _ => {
                        debug!(from = ?request.from, to = ?request.to, "graph_search_result_discarded");
                    }
                }
            }
        })
        .expect("spawn graph search worker")
}

struct ResolvedSearch {
    cost: Option<i64>,
    tile_count: usize,
    route: Option<GraphRoute>,
}

/// Map raw tiles onto the graph, search, and fold the first/last mile into
/// the reported cost.
fn resolve_and_search(
    graph: &Arc<GraphModel>,
    from: Tile,
    to: Tile,
    budget: Duration,
    ctx: &SearchContext,
) -> ResolvedSearch {
    let (Some(start), Some(end)) = (graph.nearest_node_same_plane(from), graph.nearest_node_same_plane(to))
    else {
        return ResolvedSearch { cost: None, tile_count: 0, route: None };
    };
    let first_mile = start.tile.map_or(0, |t| from.chebyshev(t)) as i64;
    let last_mile = end.tile.map_or(0, |t| to.chebyshev(t)) as i64;
    let search = GraphSearch::with_time_budget(Arc::clone(graph), budget);
    match search.find_path(&start.id, &end.id, ctx) {
        Some(route) => {
            let cost = first_mile + route.total_cost + last_mile;
            ResolvedSearch { cost: Some(cost), tile_count: route.edges.len(), route: Some(route) }
        }
        None => ResolvedSearch { cost: None, tile_count: 0, route: None },
    }
}
