//! Local tile-grid pathfinder: A* on the 8-neighborhood with octile weights
//! and corner-blocking semantics supplied by the collision oracle.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::collision::{CollisionOracle, DIRECTIONS};
use crate::models::Tile;

pub const MAX_PATH_LENGTH: i32 = 100;
pub const MAX_ITERATIONS: u32 = 5_000;
pub const CARDINAL_COST: i64 = 10;
pub const DIAGONAL_COST: i64 = 14;

/// Octile distance under the 10/14 step weights; admissible and consistent.
pub fn heuristic(a: Tile, b: Tile) -> i64 {
    let dx = (a.x - b.x).abs() as i64;
    let dy = (a.y - b.y).abs() as i64;
    10 * dx.max(dy) + 4 * dx.min(dy)
}

/// Sum of step weights along a tile path.
pub fn octile_cost(path: &[Tile]) -> i64 {
    path.windows(2)
        .map(|w| {
            if w[0].x != w[1].x && w[0].y != w[1].y {
                DIAGONAL_COST
            } else {
                CARDINAL_COST
            }
        })
        .sum()
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct QueueNode {
    tile: Tile,
    f: i64,
    g: i64,
    h: i64,
    seq: u64,
}

impl PartialOrd for QueueNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; invert for min-heap behavior.
        (other.f, other.h, other.g, other.seq, (other.tile.y, other.tile.x))
            .cmp(&(self.f, self.h, self.g, self.seq, (self.tile.y, self.tile.x)))
    }
}

#[derive(Clone, Debug)]
struct CachedTilePath {
    start: Tile,
    end: Tile,
    version: u64,
    path: Vec<Tile>,
}

pub struct TilePathfinder<C: CollisionOracle> {
    oracle: Arc<C>,
    cache: Mutex<Option<CachedTilePath>>,
}

impl<C: CollisionOracle> TilePathfinder<C> {
    pub fn new(oracle: Arc<C>) -> Self {
        Self { oracle, cache: Mutex::new(None) }
    }

    pub fn oracle(&self) -> &C {
        &self.oracle
    }

    pub fn is_walkable(&self, point: Tile) -> bool {
        !self.oracle.is_blocked(point)
    }

    pub fn invalidate_cache(&self) {
        *self.cache.lock().expect("tile path cache mutex poisoned") = None;
    }

    /// Ordered tile sequence from `start` to `end` inclusive. Empty means no
    /// path within bounds; callers fall back to the global graph.
    pub fn find_path(&self, start: Tile, end: Tile, ignore_cache: bool) -> Vec<Tile> {
        if start.plane != end.plane {
            return Vec::new();
        }
        if start == end {
            return vec![start];
        }
        if start.chebyshev(end) > MAX_PATH_LENGTH {
            return Vec::new();
        }

        let version = self.oracle.version();
        if !ignore_cache {
            let guard = self.cache.lock().expect("tile path cache mutex poisoned");
            if let Some(hit) = guard.as_ref() {
                if hit.start == start && hit.end == end && hit.version == version {
                    return hit.path.clone();
                }
            }
        }

        let path = self.search(start, end);
        if !path.is_empty() {
            let mut guard = self.cache.lock().expect("tile path cache mutex poisoned");
            *guard = Some(CachedTilePath { start, end, version, path: path.clone() });
        }
        path
    }

    fn search(&self, start: Tile, end: Tile) -> Vec<Tile> {
        let mut open = BinaryHeap::new();
        let mut g_score: FxHashMap<Tile, i64> = FxHashMap::default();
        let mut came_from: FxHashMap<Tile, Tile> = FxHashMap::default();
        let mut expanded: u32 = 0;
        let mut seq: u64 = 0;

        let h0 = heuristic(start, end);
        g_score.insert(start, 0);
        open.push(QueueNode { tile: start, f: h0, g: 0, h: h0, seq });

        while let Some(qn) = open.pop() {
            // Discard stale entries superseded by a better g.
            if g_score.get(&qn.tile).is_some_and(|best| qn.g > *best) {
                continue;
            }
            expanded += 1;
            if expanded > MAX_ITERATIONS {
                debug!(?start, ?end, expanded, "tile_astar_expansion_cap");
                return Vec::new();
            }
            if qn.tile == end {
                return reconstruct(&came_from, start, end);
            }

            for d in DIRECTIONS {
                let next = qn.tile.translate(d.dx, d.dy);
                if !self.oracle.can_step(qn.tile, next) {
                    continue;
                }
                let step = if d.dx != 0 && d.dy != 0 { DIAGONAL_COST } else { CARDINAL_COST };
                let tentative_g = qn.g + step;
                if g_score.get(&next).map_or(true, |bg| tentative_g < *bg) {
                    g_score.insert(next, tentative_g);
                    came_from.insert(next, qn.tile);
                    let h = heuristic(next, end);
                    seq += 1;
                    open.push(QueueNode { tile: next, f: tentative_g + h, g: tentative_g, h, seq });
                }
            }
        }

        Vec::new()
    }
}

fn reconstruct(came_from: &FxHashMap<Tile, Tile>, start: Tile, end: Tile) -> Vec<Tile> {
    let mut path = vec![end];
    let mut current = end;
    while current != start {
        match came_from.get(&current) {
            Some(prev) => {
                path.push(*prev);
                current = *prev;
            }
            None => return Vec::new(),
        }
    }
    path.reverse();
    path
}
