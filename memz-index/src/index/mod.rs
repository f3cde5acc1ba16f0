//! Index generations.
//!
//! A [`Generation`] bundles the primary, tag and time indexes built from one
//! record snapshot, plus that snapshot's fingerprint.  It is immutable:
//! a changed record set means building a new generation and swapping it in
//! whole, so a query never sees one index from the old snapshot and another
//! from the new.

pub mod primary;
pub mod range;
pub mod tags;

pub use primary::PrimaryIndex;
pub use range::RangeIndex;
pub use tags::TagIndex;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::fingerprint;
use crate::query::{ComplexQuery, WarmUpOptions};
use crate::types::{Record, RecordId, Timestamp};

/// Summary of a generation, cheap to clone and log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationInfo {
    /// Records indexed (after duplicate ids were collapsed).
    pub record_count: usize,
    /// Distinct tags.
    pub tag_count: usize,
    /// Fingerprint of the snapshot.
    pub version_hash: String,
    /// Wall-clock build time.
    pub built_at: DateTime<Utc>,
    /// Levels in the time index.
    pub range_depth: usize,
}

/// One immutable bundle of indexes over one record snapshot.
#[derive(Debug)]
pub struct Generation {
    records: Vec<Arc<Record>>,
    primary: PrimaryIndex,
    tags: TagIndex,
    time: RangeIndex<Timestamp, RecordId>,
    version_hash: String,
    built_at: DateTime<Utc>,
}

impl Generation {
    /// Build every index from `records`.
    ///
    /// Ids are expected to be unique; if one repeats, the last occurrence
    /// wins (in the position of the first) and a warning is logged.
    /// Cost is O(n log n), dominated by sorting the time keys.
    ///
    /// # Errors
    /// Returns `IndexError::InvalidConfiguration` if `degree < 2`.
    pub fn build<I>(records: I, degree: usize) -> Result<Self>
    where
        I: IntoIterator<Item = Record>,
    {
        let start = Instant::now();
        let (records, duplicates) = dedup_by_id(records);
        if duplicates > 0 {
            warn!(duplicates, kept = records.len(), "Duplicate record ids collapsed during build");
        }

        let version_hash = fingerprint::hash_pairs(records.iter().map(|r| (r.id.as_str(), r.updated_at)));
        let primary = PrimaryIndex::build(&records);
        let tags = TagIndex::build(&records);

        let mut time_pairs: Vec<(Timestamp, RecordId)> =
            records.iter().map(|r| (r.updated_at, r.id.clone())).collect();
        time_pairs.sort_unstable();
        let time = RangeIndex::build_from_sorted(time_pairs, degree)?;

        let generation = Self {
            records,
            primary,
            tags,
            time,
            version_hash,
            built_at: Utc::now(),
        };

        info!(
            records = generation.records.len(),
            tags = generation.tags.tag_count(),
            range_depth = generation.time.depth(),
            version = %generation.version_hash,
            elapsed_us = start.elapsed().as_micros(),
            "Index generation built"
        );

        Ok(generation)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Records in input order.
    #[must_use]
    pub fn records(&self) -> &[Arc<Record>] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the generation is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The id index.
    #[must_use]
    pub fn primary(&self) -> &PrimaryIndex {
        &self.primary
    }

    /// The tag index.
    #[must_use]
    pub fn tags(&self) -> &TagIndex {
        &self.tags
    }

    /// The `updated_at` index.
    #[must_use]
    pub fn time_index(&self) -> &RangeIndex<Timestamp, RecordId> {
        &self.time
    }

    /// Fingerprint of the snapshot this generation was built from.
    #[must_use]
    pub fn version_hash(&self) -> &str {
        &self.version_hash
    }

    /// When the generation was built.
    #[must_use]
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Summary for logging and dashboards.
    #[must_use]
    pub fn info(&self) -> GenerationInfo {
        GenerationInfo {
            record_count: self.records.len(),
            tag_count: self.tags.tag_count(),
            version_hash: self.version_hash.clone(),
            built_at: self.built_at,
            range_depth: self.time.depth(),
        }
    }

    // ------------------------------------------------------------------
    // Queries (uncached)
    // ------------------------------------------------------------------

    /// Record with `id`.
    #[must_use]
    pub fn by_id(&self, id: &str) -> Option<Arc<Record>> {
        self.primary.get(id).cloned()
    }

    /// Records carrying `tag`, in no particular order.
    #[must_use]
    pub fn by_tag(&self, tag: &str) -> Vec<Arc<Record>> {
        self.tags
            .ids(tag)
            .map(|ids| self.resolve(ids.iter()))
            .unwrap_or_default()
    }

    /// Records carrying every tag in `tags`.  Empty input selects nothing.
    #[must_use]
    pub fn by_tags_all<S: AsRef<str>>(&self, tags: &[S]) -> Vec<Arc<Record>> {
        let ids = self.tags.intersect_all(tags);
        self.resolve(ids.iter())
    }

    /// Records with `updated_at` in `[from, to]`, oldest first.
    #[must_use]
    pub fn by_time_range(&self, from: Timestamp, to: Timestamp) -> Vec<Arc<Record>> {
        let ids = self.time.find_range(&from, &to);
        self.resolve(ids.iter())
    }

    /// Records with importance ≥ `threshold`, in input order.  O(n).
    #[must_use]
    pub fn by_importance_min(&self, threshold: f64) -> Vec<Arc<Record>> {
        self.records
            .iter()
            .filter(|r| r.importance >= threshold)
            .cloned()
            .collect()
    }

    /// Apply tags → time → importance filters in that order.
    #[must_use]
    pub fn complex(&self, query: &ComplexQuery) -> Vec<Arc<Record>> {
        let mut results = match query.tag_filter() {
            Some(tags) => self.by_tags_all(tags),
            None => self.records.clone(),
        };

        if let Some(range) = query.time_range {
            let in_range: HashSet<RecordId> = self.time.find_range(&range.from, &range.to).into_iter().collect();
            results.retain(|r| in_range.contains(&r.id));
        }

        if let Some(min) = query.min_importance {
            results.retain(|r| r.importance >= min);
        }

        results
    }

    /// Records a warm-up pass should load, lowest priority first.
    ///
    /// With `target_ids`, those that resolve, in the order given.  Otherwise
    /// the `max_entries` most important records at or above the threshold,
    /// ordered so that the most important is inserted last (and therefore
    /// ends up most recently used).
    #[must_use]
    pub fn warm_up_candidates(&self, options: &WarmUpOptions) -> Vec<Arc<Record>> {
        if let Some(ids) = &options.target_ids {
            return self.resolve(ids.iter());
        }

        let mut selected: Vec<Arc<Record>> = self
            .records
            .iter()
            .filter(|r| r.importance >= options.importance_threshold)
            .cloned()
            .collect();
        selected.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        selected.truncate(options.max_entries);
        selected.reverse();
        selected
    }

    fn resolve<'a, I>(&self, ids: I) -> Vec<Arc<Record>>
    where
        I: Iterator<Item = &'a RecordId>,
    {
        ids.filter_map(|id| self.primary.get(id).cloned()).collect()
    }
}

/// Collapse repeated ids, keeping the last record in the first slot.
fn dedup_by_id<I>(records: I) -> (Vec<Arc<Record>>, usize)
where
    I: IntoIterator<Item = Record>,
{
    let records = records.into_iter();
    let mut out: Vec<Arc<Record>> = Vec::with_capacity(records.size_hint().0);
    let mut position: HashMap<RecordId, usize> = HashMap::with_capacity(out.capacity());
    let mut duplicates = 0;

    for record in records {
        if let Some(&slot) = position.get(&record.id) {
            out[slot] = Arc::new(record);
            duplicates += 1;
        } else {
            position.insert(record.id.clone(), out.len());
            out.push(Arc::new(record));
        }
    }

    (out, duplicates)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
