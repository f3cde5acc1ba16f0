//! The index coordinator: public query surface of the engine.
//!
//! Owns the active [`Generation`] behind an atomic swap and the id cache
//! behind a single mutex:
//!
//! ```text
//!                 ┌──────────────────────────────┐
//!  get_by_id ────▶│ Mutex<Option<LruCache>>      │── hit ──▶ Arc<Record>
//!                 └──────────────┬───────────────┘
//!                           miss │
//!                                ▼
//!                 ┌──────────────────────────────┐
//!  tag / time ───▶│ ArcSwap<Generation>          │
//!  importance     │  primary · tags · time index │
//!  complex        └──────────────────────────────┘
//! ```
//!
//! Only id lookups are cached.  Tag, time, importance and complex queries
//! always run against the indexes.
//!
//! Each call loads the generation once and answers entirely from that
//! snapshot, so a concurrent [`rebuild`](IndexCoordinator::rebuild) is
//! observed either fully or not at all.

use std::num::NonZeroUsize;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::cache::{CacheStats, LruCache};
use crate::config::IndexConfig;
use crate::error::{IndexError, Result};
use crate::index::{Generation, GenerationInfo};
use crate::metrics::{incr, IndexCounters};
use crate::query::{ComplexQuery, WarmUpOptions};
use crate::types::{Record, RecordId, Timestamp};

type RecordCache = LruCache<RecordId, Arc<Record>>;

/// Cache state guarded by one lock.
#[derive(Debug)]
struct CacheSlot {
    /// `None` while caching is disabled.
    cache: Option<RecordCache>,
    /// Capacity used the next time a cache is created.
    capacity: NonZeroUsize,
}

/// Query surface over one active index generation plus an id cache.
#[derive(Debug)]
pub struct IndexCoordinator {
    generation: ArcSwap<Generation>,
    cache: Mutex<CacheSlot>,
    config: IndexConfig,
    counters: IndexCounters,
}

impl IndexCoordinator {
    /// Build a coordinator over `records`.
    ///
    /// With caching enabled this also creates the cache and, if
    /// `warm_on_build` is set, warms it using `config.warm_up`.
    ///
    /// # Errors
    /// Returns [`IndexError::InvalidConfiguration`] if the cache size is 0 or
    /// the range degree is below 2.
    pub fn build_from<I>(records: I, config: IndexConfig) -> Result<Self>
    where
        I: IntoIterator<Item = Record>,
    {
        config.validate()?;
        let capacity = NonZeroUsize::new(config.cache_size).ok_or_else(IndexError::zero_capacity)?;
        let generation = Generation::build(records, config.range_degree)?;
        let cache = config.enable_cache.then(|| LruCache::with_capacity(capacity));

        let coordinator = Self {
            generation: ArcSwap::from_pointee(generation),
            cache: Mutex::new(CacheSlot { cache, capacity }),
            config,
            counters: IndexCounters::new(),
        };

        if coordinator.config.enable_cache && coordinator.config.warm_on_build {
            coordinator.warm_up_cache(&WarmUpOptions::from(&coordinator.config.warm_up));
        }

        Ok(coordinator)
    }

    /// Build with [`IndexConfig::default`].
    ///
    /// # Errors
    /// Never fails with the default configuration; the `Result` mirrors
    /// [`build_from`](Self::build_from).
    pub fn with_defaults<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = Record>,
    {
        Self::build_from(records, IndexConfig::default())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Record with `id`, served from the cache when possible.
    ///
    /// On a miss the primary index is consulted and a found record is
    /// cached before being returned.
    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<Arc<Record>> {
        incr(&self.counters.id_lookups);
        let mut slot = self.cache.lock();
        if let Some(cache) = slot.cache.as_mut() {
            if let Some(record) = cache.get(id) {
                return Some(Arc::clone(record));
            }
            let record = self.primary_lookup(id)?;
            cache.set(record.id.clone(), Arc::clone(&record));
            return Some(record);
        }
        drop(slot);
        self.primary_lookup(id)
    }

    /// Records carrying `tag`, in no particular order.
    #[must_use]
    pub fn get_by_tag(&self, tag: &str) -> Vec<Arc<Record>> {
        incr(&self.counters.tag_queries);
        self.generation.load().by_tag(tag)
    }

    /// Records carrying every tag in `tags`.
    ///
    /// An empty list, or any tag no record carries, yields nothing.
    #[must_use]
    pub fn get_by_tags_all<S: AsRef<str>>(&self, tags: &[S]) -> Vec<Arc<Record>> {
        incr(&self.counters.tags_all_queries);
        self.generation.load().by_tags_all(tags)
    }

    /// Records with `updated_at` in `[from, to]`, oldest first.
    #[must_use]
    pub fn get_by_time_range(&self, from: Timestamp, to: Timestamp) -> Vec<Arc<Record>> {
        incr(&self.counters.time_range_queries);
        self.generation.load().by_time_range(from, to)
    }

    /// Records with importance ≥ `threshold`.  Linear scan.
    #[must_use]
    pub fn get_by_importance_min(&self, threshold: f64) -> Vec<Arc<Record>> {
        incr(&self.counters.importance_scans);
        self.generation.load().by_importance_min(threshold)
    }

    /// Tags, then time range, then importance.
    #[must_use]
    pub fn get_by_complex_query(&self, query: &ComplexQuery) -> Vec<Arc<Record>> {
        incr(&self.counters.complex_queries);
        self.generation.load().complex(query)
    }

    /// Fingerprint of the active generation's source snapshot.
    #[must_use]
    pub fn source_version_hash(&self) -> String {
        self.generation.load().version_hash().to_string()
    }

    /// Whether `external_hash` differs from the active fingerprint.
    #[must_use]
    pub fn is_stale(&self, external_hash: &str) -> bool {
        self.generation.load().version_hash() != external_hash
    }

    // ------------------------------------------------------------------
    // Generations
    // ------------------------------------------------------------------

    /// Snapshot handle to the active generation.
    #[must_use]
    pub fn generation(&self) -> Arc<Generation> {
        self.generation.load_full()
    }

    /// Summary of the active generation.
    #[must_use]
    pub fn generation_info(&self) -> GenerationInfo {
        self.generation.load().info()
    }

    /// Build a new generation from `records` and swap it in.
    ///
    /// Cached entries belong to the old snapshot and are dropped; cache
    /// counters are kept.
    ///
    /// # Errors
    /// Propagates [`Generation::build`] configuration errors; the active
    /// generation is untouched on failure.
    pub fn rebuild<I>(&self, records: I) -> Result<GenerationInfo>
    where
        I: IntoIterator<Item = Record>,
    {
        let generation = Arc::new(Generation::build(records, self.config.range_degree)?);
        let info = generation.info();
        self.publish(generation);
        Ok(info)
    }

    /// Swap in a prebuilt generation and drop cached entries.
    pub fn publish(&self, generation: Arc<Generation>) {
        let version = generation.version_hash().to_string();
        let records = generation.len();
        let previous = self.generation.swap(generation);

        // Lookups fill the cache while holding its lock, so one that read
        // the old generation has finished by the time this eviction runs.
        if let Some(cache) = self.cache.lock().cache.as_mut() {
            cache.evict_all();
        }
        incr(&self.counters.rebuilds);

        info!(
            records,
            version = %version,
            previous = %previous.version_hash(),
            "Index generation published"
        );
    }

    // ------------------------------------------------------------------
    // Cache lifecycle
    // ------------------------------------------------------------------

    /// Pre-load records into the id cache.  Returns how many were inserted.
    ///
    /// Does nothing while caching is disabled.
    pub fn warm_up_cache(&self, options: &WarmUpOptions) -> usize {
        let mut slot = self.cache.lock();
        let Some(cache) = slot.cache.as_mut() else {
            return 0;
        };
        let generation = self.generation.load();

        let candidates = generation.warm_up_candidates(options);
        let warmed = cache.warm_up(candidates.into_iter().map(|r| (r.id.clone(), r)));
        if warmed > 0 {
            incr(&self.counters.cache_warmups);
        }

        debug!(
            warmed,
            targeted = options.target_ids.is_some(),
            size = cache.len(),
            capacity = cache.capacity(),
            "Cache warmed"
        );
        warmed
    }

    /// Empty the cache, optionally resetting its hit/miss/eviction counters.
    pub fn clear_cache(&self, reset_stats: bool) {
        if let Some(cache) = self.cache.lock().cache.as_mut() {
            if reset_stats {
                cache.clear();
            } else {
                cache.evict_all();
            }
            debug!(reset_stats, "Cache cleared");
        }
    }

    /// Turn the cache on or off.
    ///
    /// Disabling drops the cache and its contents; enabling starts cold.
    /// Setting the current state again is a no-op.
    pub fn set_cache_enabled(&self, enabled: bool) {
        let mut slot = self.cache.lock();
        match (enabled, slot.cache.is_some()) {
            (true, false) => {
                slot.cache = Some(LruCache::with_capacity(slot.capacity));
                debug!(capacity = slot.capacity.get(), "Cache enabled");
            }
            (false, true) => {
                slot.cache = None;
                debug!("Cache disabled");
            }
            _ => {}
        }
    }

    /// Replace the cache with an empty one of `new_capacity`.
    ///
    /// Prior contents and counters are discarded.  While caching is disabled
    /// only the stored capacity changes.
    ///
    /// # Errors
    /// Returns [`IndexError::InvalidConfiguration`] if `new_capacity` is 0;
    /// the existing cache is left as it was.
    pub fn update_cache_size(&self, new_capacity: usize) -> Result<()> {
        let capacity = NonZeroUsize::new(new_capacity).ok_or_else(IndexError::zero_capacity)?;
        let mut slot = self.cache.lock();
        slot.capacity = capacity;
        if slot.cache.is_some() {
            slot.cache = Some(LruCache::with_capacity(capacity));
        }
        debug!(capacity = new_capacity, "Cache resized");
        Ok(())
    }

    /// Cache statistics, or `None` while caching is disabled.
    #[must_use]
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.lock().cache.as_ref().map(LruCache::stats)
    }

    /// Whether `get_by_id` goes through the cache.
    #[must_use]
    pub fn is_cache_enabled(&self) -> bool {
        self.cache.lock().cache.is_some()
    }

    /// Capacity the cache has (or will have once enabled).
    #[must_use]
    pub fn cache_capacity(&self) -> usize {
        self.cache.lock().capacity.get()
    }

    /// Whether `id` is currently cached, without touching recency.
    #[must_use]
    pub fn is_cached(&self, id: &str) -> bool {
        self.cache
            .lock()
            .cache
            .as_ref()
            .is_some_and(|c| c.has(id))
    }

    /// Query counters.
    #[must_use]
    pub fn counters(&self) -> &IndexCounters {
        &self.counters
    }

    /// Configuration the coordinator was built with.
    #[must_use]
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    fn primary_lookup(&self, id: &str) -> Option<Arc<Record>> {
        incr(&self.counters.primary_lookups);
        self.generation.load().by_id(id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<Record> {
        (0..20)
            .map(|i| {
                let tag = if i % 2 == 0 { "even" } else { "odd" };
                Record::new(format!("r{i}"), [tag, "all"], i64::from(i) * 100, f64::from(i % 11))
            })
            .collect()
    }

    fn cold_config() -> IndexConfig {
        IndexConfig {
            warm_on_build: false,
            ..IndexConfig::default()
        }
    }

    fn coordinator() -> IndexCoordinator {
        IndexCoordinator::build_from(records(), cold_config()).unwrap()
    }

    #[test]
    fn zero_cache_size_rejected() {
        let config = IndexConfig {
            cache_size: 0,
            ..IndexConfig::default()
        };
        let err = IndexCoordinator::build_from(records(), config).unwrap_err();
        assert!(matches!(err, IndexError::InvalidConfiguration { .. }));
    }

    #[test]
    fn miss_then_hit() {
        let c = coordinator();
        let first = c.get_by_id("r3").unwrap();
        let second = c.get_by_id("r3").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let stats = c.cache_stats().unwrap();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(c.counters().snapshot().primary_lookups, 1);
        assert_eq!(c.counters().snapshot().id_lookups, 2);
    }

    #[test]
    fn unknown_id_is_not_cached() {
        let c = coordinator();
        assert!(c.get_by_id("nope").is_none());
        assert!(c.get_by_id("nope").is_none());
        assert!(!c.is_cached("nope"));
        assert_eq!(c.cache_stats().unwrap().misses, 2);
        assert_eq!(c.cache_stats().unwrap().size, 0);
    }

    #[test]
    fn disabled_cache_goes_to_primary() {
        let c = IndexCoordinator::build_from(records(), IndexConfig::without_cache()).unwrap();
        assert!(!c.is_cache_enabled());
        assert!(c.cache_stats().is_none());
        let _ = c.get_by_id("r1");
        let _ = c.get_by_id("r1");
        assert_eq!(c.counters().snapshot().primary_lookups, 2);
        assert_eq!(c.warm_up_cache(&WarmUpOptions::default()), 0);
    }

    #[test]
    fn build_warms_high_importance() {
        let c = IndexCoordinator::with_defaults(records()).unwrap();
        // importance = i % 11 ≥ 8 → r8, r9, r10, r19
        for id in ["r8", "r9", "r10", "r19"] {
            assert!(c.is_cached(id), "{id} should be warm");
        }
        assert!(!c.is_cached("r7"));
        assert_eq!(c.cache_stats().unwrap().size, 4);
        assert_eq!(c.counters().snapshot().cache_warmups, 1);
    }

    #[test]
    fn warm_up_targets_skip_unknown() {
        let c = coordinator();
        let warmed = c.warm_up_cache(&WarmUpOptions::targets(["r1", "ghost", "r2"]));
        assert_eq!(warmed, 2);
        assert!(c.is_cached("r1"));
        assert!(c.is_cached("r2"));
        assert!(!c.is_cached("ghost"));
    }

    #[test]
    fn toggle_cache() {
        let c = coordinator();
        let _ = c.get_by_id("r1");
        c.set_cache_enabled(false);
        assert!(!c.is_cache_enabled());
        c.set_cache_enabled(true);
        let stats = c.cache_stats().unwrap();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.capacity, 256);
    }

    #[test]
    fn resize_is_cold_restart() {
        let c = coordinator();
        let _ = c.get_by_id("r1");
        let _ = c.get_by_id("r2");
        c.update_cache_size(1).unwrap();
        let stats = c.cache_stats().unwrap();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.capacity, 1);
        assert_eq!(stats.misses, 0);

        let _ = c.get_by_id("r1");
        let _ = c.get_by_id("r2");
        assert!(!c.is_cached("r1"));
        assert_eq!(c.cache_stats().unwrap().evictions, 1);
    }

    #[test]
    fn resize_to_zero_keeps_cache() {
        let c = coordinator();
        let _ = c.get_by_id("r1");
        assert!(c.update_cache_size(0).is_err());
        assert!(c.is_cached("r1"));
        assert_eq!(c.cache_capacity(), 256);
    }

    #[test]
    fn resize_while_disabled_applies_on_enable() {
        let c = IndexCoordinator::build_from(records(), IndexConfig::without_cache()).unwrap();
        c.update_cache_size(7).unwrap();
        assert!(c.cache_stats().is_none());
        c.set_cache_enabled(true);
        assert_eq!(c.cache_stats().unwrap().capacity, 7);
    }

    #[test]
    fn clear_cache_with_and_without_stats() {
        let c = coordinator();
        let _ = c.get_by_id("r1");
        let _ = c.get_by_id("r1");
        c.clear_cache(false);
        let stats = c.cache_stats().unwrap();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.hits, 1);

        c.clear_cache(true);
        let stats = c.cache_stats().unwrap();
        assert_eq!((stats.hits, stats.misses, stats.evictions), (0, 0, 0));
    }

    #[test]
    fn rebuild_swaps_generation_and_drops_entries() {
        let c = coordinator();
        let before = c.source_version_hash();
        let _ = c.get_by_id("r1");

        let mut next = records();
        next[1].updated_at = 99_999;
        next.push(Record::new("r20", ["new"], 5, 1.0));
        let info = c.rebuild(next).unwrap();

        assert_ne!(info.version_hash, before);
        assert_eq!(info.record_count, 21);
        assert!(c.is_stale(&before));
        assert!(!c.is_stale(&info.version_hash));
        assert!(!c.is_cached("r1"));
        assert_eq!(c.get_by_id("r1").map(|r| r.updated_at), Some(99_999));
        assert_eq!(c.get_by_tag("new").len(), 1);
        assert_eq!(c.counters().snapshot().rebuilds, 1);
        // Counters survive the swap.
        assert_eq!(c.cache_stats().unwrap().misses, 2);
    }

    #[test]
    fn held_generation_outlives_swap() {
        let c = coordinator();
        let old = c.generation();
        c.rebuild(Vec::new()).unwrap();
        assert_eq!(old.len(), 20);
        assert!(c.generation().is_empty());
        assert!(c.get_by_tag("all").is_empty());
    }

    #[test]
    fn query_surface_delegates() {
        let c = coordinator();
        assert_eq!(c.get_by_tag("even").len(), 10);
        assert_eq!(c.get_by_tags_all(&["even", "all"]).len(), 10);
        assert!(c.get_by_tags_all(&["even", "odd"]).is_empty());
        assert_eq!(c.get_by_time_range(0, 499).len(), 5);
        assert_eq!(c.get_by_importance_min(9.0).len(), 2);
        let q = ComplexQuery::new().with_tags(["odd"]).with_min_importance(5.0);
        assert_eq!(c.get_by_complex_query(&q).len(), 5);

        let snap = c.counters().snapshot();
        assert_eq!(snap.tag_queries, 1);
        assert_eq!(snap.tags_all_queries, 2);
        assert_eq!(snap.time_range_queries, 1);
        assert_eq!(snap.importance_scans, 1);
        assert_eq!(snap.complex_queries, 1);
        // None of these touch the id cache.
        assert_eq!(c.cache_stats().unwrap().hits + c.cache_stats().unwrap().misses, 0);
    }

    #[test]
    fn coordinator_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<IndexCoordinator>();
    }
}
