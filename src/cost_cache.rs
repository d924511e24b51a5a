//! Bounded cache of computed path costs keyed by (start, end). An entry is
//! only fresh while the agent stays near the position it was computed from
//! and the collision snapshot has not been rebuilt.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::models::Tile;

/// Maximum agent displacement before an entry goes stale.
pub const MOVEMENT_TOLERANCE: i32 = 10;
pub const DEFAULT_CAPACITY: usize = 256;
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(300);

#[derive(Copy, Clone, Debug)]
pub struct CachedPathCost {
    /// `None` records a completed search that found no route.
    pub cost: Option<i64>,
    pub tile_count: usize,
    pub inserted_at: Instant,
    pub anchor: Tile,
    pub version: u64,
}

pub struct PathCostCache {
    inner: Mutex<LruCache<(Tile, Tile), CachedPathCost>>,
    max_age: Duration,
}

impl PathCostCache {
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_CAPACITY, DEFAULT_MAX_AGE)
    }

    pub fn with_settings(capacity: usize, max_age: Duration) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self { inner: Mutex::new(LruCache::new(cap)), max_age }
    }

    pub fn insert(&self, from: Tile, to: Tile, cost: Option<i64>, tile_count: usize, anchor: Tile, version: u64) {
        let entry = CachedPathCost { cost, tile_count, inserted_at: Instant::now(), anchor, version };
        self.inner.lock().expect("path cost cache mutex poisoned").put((from, to), entry);
    }

    /// Fresh entry for the pair, or `None`. Stale entries (agent moved past
    /// the tolerance, aged out, or computed against an older collision
    /// snapshot) are evicted on the spot.
    pub fn lookup(&self, from: Tile, to: Tile, current_anchor: Tile, version: u64) -> Option<CachedPathCost> {
        let mut guard = self.inner.lock().expect("path cost cache mutex poisoned");
        let entry = guard.get(&(from, to)).copied()?;
        let fresh = entry.inserted_at.elapsed() <= self.max_age
            && entry.anchor.chebyshev(current_anchor) <= MOVEMENT_TOLERANCE
            && entry.anchor.plane == current_anchor.plane
            && entry.version == version;
        if !fresh {
            guard.pop(&(from, to));
            return None;
        }
        Some(entry)
    }

    pub fn clear(&self) {
        self.inner.lock().expect("path cost cache mutex poisoned").clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("path cost cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PathCostCache {
    fn default() -> Self {
        Self::new()
    }
}
