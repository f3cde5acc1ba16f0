//! Query counters for the index engine.
//!
//! Lock-free `AtomicU64` counters bumped on the query paths and read on
//! dashboard export.  Cache hit/miss figures live in
//! [`CacheStats`](crate::cache::CacheStats); these count work done against
//! the indexes themselves.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Atomic counters for index operations.
#[derive(Debug)]
pub struct IndexCounters {
    /// `get_by_id` calls.
    pub id_lookups: AtomicU64,
    /// Lookups that reached the primary index (cache misses or cache off).
    pub primary_lookups: AtomicU64,
    /// `get_by_tag` calls.
    pub tag_queries: AtomicU64,
    /// `get_by_tags_all` calls.
    pub tags_all_queries: AtomicU64,
    /// `get_by_time_range` calls.
    pub time_range_queries: AtomicU64,
    /// `get_by_importance_min` linear scans.
    pub importance_scans: AtomicU64,
    /// `get_by_complex_query` calls.
    pub complex_queries: AtomicU64,
    /// Generations published after the initial build.
    pub rebuilds: AtomicU64,
    /// Warm-up passes that inserted at least one entry.
    pub cache_warmups: AtomicU64,
}

impl IndexCounters {
    /// Create a new set of zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            id_lookups: AtomicU64::new(0),
            primary_lookups: AtomicU64::new(0),
            tag_queries: AtomicU64::new(0),
            tags_all_queries: AtomicU64::new(0),
            time_range_queries: AtomicU64::new(0),
            importance_scans: AtomicU64::new(0),
            complex_queries: AtomicU64::new(0),
            rebuilds: AtomicU64::new(0),
            cache_warmups: AtomicU64::new(0),
        }
    }

    /// Snapshot all counters for export.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            id_lookups: self.id_lookups.load(Ordering::Relaxed),
            primary_lookups: self.primary_lookups.load(Ordering::Relaxed),
            tag_queries: self.tag_queries.load(Ordering::Relaxed),
            tags_all_queries: self.tags_all_queries.load(Ordering::Relaxed),
            time_range_queries: self.time_range_queries.load(Ordering::Relaxed),
            importance_scans: self.importance_scans.load(Ordering::Relaxed),
            complex_queries: self.complex_queries.load(Ordering::Relaxed),
            rebuilds: self.rebuilds.load(Ordering::Relaxed),
            cache_warmups: self.cache_warmups.load(Ordering::Relaxed),
        }
    }

    /// Reset every counter to zero.
    pub fn reset(&self) {
        for counter in [
            &self.id_lookups,
            &self.primary_lookups,
            &self.tag_queries,
            &self.tags_all_queries,
            &self.time_range_queries,
            &self.importance_scans,
            &self.complex_queries,
            &self.rebuilds,
            &self.cache_warmups,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for IndexCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Bump a counter by one.
pub(crate) fn incr(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// A snapshot of counter values at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    /// `get_by_id` calls.
    pub id_lookups: u64,
    /// Primary index lookups.
    pub primary_lookups: u64,
    /// Single-tag queries.
    pub tag_queries: u64,
    /// Multi-tag AND queries.
    pub tags_all_queries: u64,
    /// Time-range queries.
    pub time_range_queries: u64,
    /// Importance scans.
    pub importance_scans: u64,
    /// Complex queries.
    pub complex_queries: u64,
    /// Rebuilds.
    pub rebuilds: u64,
    /// Warm-up passes.
    pub cache_warmups: u64,
}

impl CounterSnapshot {
    /// Format as Prometheus-compatible text.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        format!(
            "# HELP memz_index_id_lookups_total Record lookups by id\n\
             # TYPE memz_index_id_lookups_total counter\n\
             memz_index_id_lookups_total {}\n\
             # HELP memz_index_primary_lookups_total Lookups served by the primary index\n\
             # TYPE memz_index_primary_lookups_total counter\n\
             memz_index_primary_lookups_total {}\n\
             # HELP memz_index_queries_total Index queries by kind\n\
             # TYPE memz_index_queries_total counter\n\
             memz_index_queries_total{{kind=\"tag\"}} {}\n\
             memz_index_queries_total{{kind=\"tags_all\"}} {}\n\
             memz_index_queries_total{{kind=\"time_range\"}} {}\n\
             memz_index_queries_total{{kind=\"importance\"}} {}\n\
             memz_index_queries_total{{kind=\"complex\"}} {}\n\
             # HELP memz_index_rebuilds_total Generations published after startup\n\
             # TYPE memz_index_rebuilds_total counter\n\
             memz_index_rebuilds_total {}\n\
             # HELP memz_index_cache_warmups_total Cache warm-up passes\n\
             # TYPE memz_index_cache_warmups_total counter\n\
             memz_index_cache_warmups_total {}\n",
            self.id_lookups,
            self.primary_lookups,
            self.tag_queries,
            self.tags_all_queries,
            self.time_range_queries,
            self.importance_scans,
            self.complex_queries,
            self.rebuilds,
            self.cache_warmups,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_snapshot_and_reset() {
        let counters = IndexCounters::new();
        incr(&counters.id_lookups);
        incr(&counters.id_lookups);
        incr(&counters.rebuilds);
        let snap = counters.snapshot();
        assert_eq!(snap.id_lookups, 2);
        assert_eq!(snap.rebuilds, 1);

        counters.reset();
        assert_eq!(counters.snapshot(), CounterSnapshot::default());
    }

    #[test]
    fn prometheus_format() {
        let snap = CounterSnapshot {
            id_lookups: 7,
            tag_queries: 3,
            ..CounterSnapshot::default()
        };
        let text = snap.to_prometheus();
        assert!(text.contains("memz_index_id_lookups_total 7"));
        assert!(text.contains("memz_index_queries_total{kind=\"tag\"} 3"));
        assert!(text.contains("# TYPE memz_index_rebuilds_total counter"));
    }
}
