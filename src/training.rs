//! Ranking of training candidates by real travel cost, with a long-lived
//! on-disk cache keyed by region. Banking spots are costed as a roundtrip
//! because tolls and shortcuts are directional.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use itertools::Itertools;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::coordinator::NavigationProvider;
use crate::errors::SpotCacheError;
use crate::graph::model::GraphModel;
use crate::models::{NodeType, Tile};
use crate::scene::{ClientScene, SceneObject};

pub const SPOT_CACHE_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
pub const MAX_SPOTS: usize = 10;
const CELL_SIZE: i32 = 8;

/// 64x64 map square identifier.
pub fn region_id(tile: Tile) -> i32 {
    ((tile.x >> 6) << 8) | (tile.y >> 6)
}

fn fnv1a64(bytes: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xCBF2_9CE4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01B3;
    let mut hash = FNV_OFFSET;
    for b in bytes {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Stable key over region, the (order-insensitive) id set, and the bank flag.
pub fn cache_key(region: i32, object_ids: &[i32], bank_required: bool) -> u128 {
    let mut ids: Vec<i32> = object_ids.to_vec();
    ids.sort_unstable();
    let mut bytes = Vec::with_capacity(ids.len() * 4);
    for id in ids {
        bytes.extend_from_slice(&id.to_le_bytes());
    }
    (region as u32 as u128) ^ ((fnv1a64(&bytes) as u128) << 32) ^ ((bank_required as u128) << 100)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingSpot {
    pub tile: Tile,
    pub object_id: i32,
    pub cost: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_distance: Option<i64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct SpotRecord {
    key: u128,
    candidates: Vec<TrainingSpot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bank_anchor: Option<Tile>,
    /// Unix seconds.
    inserted_at: u64,
}

fn now_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs())
}

/// Single-owner persistent record store. Records past the TTL are discarded
/// on load and never returned.
pub struct SpotCache {
    path: Option<PathBuf>,
    records: Mutex<FxHashMap<u128, SpotRecord>>,
    ttl: Duration,
}

impl SpotCache {
    /// In-memory only; nothing persisted.
    pub fn ephemeral() -> Self {
        Self { path: None, records: Mutex::new(FxHashMap::default()), ttl: SPOT_CACHE_TTL }
    }

    pub fn load(path: PathBuf) -> Self {
        Self::load_with_ttl(path, SPOT_CACHE_TTL)
    }

    pub fn load_with_ttl(path: PathBuf, ttl: Duration) -> Self {
        let mut records = FxHashMap::default();
        match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Vec<SpotRecord>>(&text) {
                Ok(loaded) => {
                    let cutoff = now_secs().saturating_sub(ttl.as_secs());
                    let total = loaded.len();
                    for record in loaded {
                        if record.inserted_at >= cutoff {
                            records.insert(record.key, record);
                        }
                    }
                    debug!(path = %path.display(), kept = records.len(), total, "spot_cache_loaded");
                }
                Err(err) => warn!(path = %path.display(), %err, "spot_cache_unreadable"),
            },
            // Missing file is a cold start, not an error.
            Err(_) => {}
        }
        Self { path: Some(path), records: Mutex::new(records), ttl }
    }

    pub fn get(&self, key: u128) -> Option<Vec<TrainingSpot>> {
        let guard = self.records.lock().expect("spot cache mutex poisoned");
        let record = guard.get(&key)?;
        let cutoff = now_secs().saturating_sub(self.ttl.as_secs());
        if record.inserted_at < cutoff {
            return None;
        }
        Some(record.candidates.clone())
    }

    pub fn put(
        &self,
        key: u128,
        candidates: Vec<TrainingSpot>,
        bank_anchor: Option<Tile>,
    ) -> Result<(), SpotCacheError> {
        {
            let mut guard = self.records.lock().expect("spot cache mutex poisoned");
            guard.insert(key, SpotRecord { key, candidates, bank_anchor, inserted_at: now_secs() });
        }
        self.save()
    }

    fn save(&self) -> Result<(), SpotCacheError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let records: Vec<SpotRecord> = {
            let guard = self.records.lock().expect("spot cache mutex poisoned");
            guard.values().cloned().sorted_by_key(|r| r.key).collect()
        };
        let text = serde_json::to_string(&records)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("spot cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug)]
pub struct RankRequest {
    pub object_ids: Vec<i32>,
    pub reference: Tile,
    pub radius: i32,
    pub bank_required: bool,
}

pub struct TrainingSpotRanker<S: ClientScene> {
    scene: Arc<S>,
    provider: Arc<dyn NavigationProvider>,
    graph: Arc<GraphModel>,
    cache: SpotCache,
}

impl<S: ClientScene> TrainingSpotRanker<S> {
    pub fn new(scene: Arc<S>, provider: Arc<dyn NavigationProvider>, graph: Arc<GraphModel>, cache: SpotCache) -> Self {
        Self { scene, provider, graph, cache }
    }

    pub fn cache(&self) -> &SpotCache {
        &self.cache
    }

    /// Candidates sorted by ascending travel cost, capped at [`MAX_SPOTS`].
    /// Candidates whose cost is not yet known are dropped, so a cold cost
    /// cache may return a short list until searches complete.
    pub fn rank(&self, request: &RankRequest) -> Vec<TrainingSpot> {
        let key = cache_key(region_id(request.reference), &request.object_ids, request.bank_required);
        if let Some(hit) = self.cache.get(key) {
            return hit;
        }

        let candidates = self.scan(request);
        let bank = if request.bank_required { self.nearest_bank(request.reference) } else { None };
        if request.bank_required && bank.is_none() {
            return Vec::new();
        }

        let mut spots: Vec<TrainingSpot> = candidates
            .into_iter()
            .filter_map(|object| self.cost_candidate(&object, request, bank))
            .sorted_by_key(|s| (s.cost, s.tile))
            .take(MAX_SPOTS)
            .collect();
        spots.dedup_by_key(|s| s.tile);

        if !spots.is_empty() {
            if let Err(err) = self.cache.put(key, spots.clone(), bank) {
                warn!(%err, "spot_cache_write_failed");
            }
        }
        spots
    }

    /// Cell-grid scan: only cells overlapping the request box are visited.
    fn scan(&self, request: &RankRequest) -> Vec<SceneObject> {
        let mut grid: FxHashMap<(i32, i32, i32), Vec<SceneObject>> = FxHashMap::default();
        for object in self.scene.objects() {
            let cell = (region_id(object.tile), object.tile.x / CELL_SIZE, object.tile.y / CELL_SIZE);
            grid.entry(cell).or_default().push(object);
        }

        let min_x = (request.reference.x - request.radius) / CELL_SIZE;
        let max_x = (request.reference.x + request.radius) / CELL_SIZE;
        let min_y = (request.reference.y - request.radius) / CELL_SIZE;
        let max_y = (request.reference.y + request.radius) / CELL_SIZE;
        let mut out = Vec::new();
        for cx in min_x..=max_x {
            for cy in min_y..=max_y {
                let probe = Tile::new(cx * CELL_SIZE, cy * CELL_SIZE, request.reference.plane);
                if let Some(objects) = grid.get(&(region_id(probe), cx, cy)) {
                    out.extend(
                        objects
                            .iter()
                            .filter(|o| request.object_ids.contains(&o.id))
                            .filter(|o| o.tile.plane == request.reference.plane)
                            .filter(|o| o.tile.chebyshev(request.reference) <= request.radius)
                            .cloned(),
                    );
                }
            }
        }
        out
    }

    fn nearest_bank(&self, reference: Tile) -> Option<Tile> {
        self.graph
            .nodes_of_type(NodeType::Bank)
            .iter()
            .filter_map(|n| n.tile)
            .min_by_key(|t| (reference.chebyshev(*t), t.x, t.y))
    }

    fn cost_candidate(&self, object: &SceneObject, request: &RankRequest, bank: Option<Tile>) -> Option<TrainingSpot> {
        match bank {
            Some(bank_tile) => {
                // Both directions: tolls and shortcuts are directional.
                let to_bank = self.provider.path_cost(object.tile, bank_tile).known()?;
                let from_bank = self.provider.path_cost(bank_tile, object.tile).known()?;
                Some(TrainingSpot {
                    tile: object.tile,
                    object_id: object.id,
                    cost: to_bank + from_bank,
                    bank_distance: Some(to_bank),
                })
            }
            None => {
                let cost = self.provider.path_cost(request.reference, object.tile).known()?;
                Some(TrainingSpot { tile: object.tile, object_id: object.id, cost, bank_distance: None })
            }
        }
    }
}
