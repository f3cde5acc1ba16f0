//! Query and warm-up option types.

use serde::{Deserialize, Serialize};

use crate::config::WarmUpConfig;
use crate::types::{RecordId, Timestamp};

/// Inclusive `[from, to]` window over `updated_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Lower bound, inclusive.
    pub from: Timestamp,
    /// Upper bound, inclusive.
    pub to: Timestamp,
}

impl TimeRange {
    /// Create a window.  `from > to` is allowed and matches nothing.
    #[must_use]
    pub const fn new(from: Timestamp, to: Timestamp) -> Self {
        Self { from, to }
    }

    /// Whether `ts` falls inside the window.
    #[must_use]
    pub fn contains(&self, ts: Timestamp) -> bool {
        self.from <= ts && ts <= self.to
    }
}

/// A multi-filter query, applied in the fixed order tags → time → importance.
///
/// An empty `tags` list is treated the same as no tag filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexQuery {
    /// Records must carry every one of these tags.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Records must have `updated_at` inside this window.
    #[serde(default)]
    pub time_range: Option<TimeRange>,
    /// Records must have at least this importance.
    #[serde(default)]
    pub min_importance: Option<f64>,
}

impl ComplexQuery {
    /// An unfiltered query (selects every record).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require all of `tags`.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Restrict to `[from, to]`.
    #[must_use]
    pub fn with_time_range(mut self, from: Timestamp, to: Timestamp) -> Self {
        self.time_range = Some(TimeRange::new(from, to));
        self
    }

    /// Require importance ≥ `min`.
    #[must_use]
    pub fn with_min_importance(mut self, min: f64) -> Self {
        self.min_importance = Some(min);
        self
    }

    /// The tag filter, if it is present and non-empty.
    #[must_use]
    pub fn tag_filter(&self) -> Option<&[String]> {
        self.tags.as_deref().filter(|t| !t.is_empty())
    }
}

/// Which records to pre-load into the id cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarmUpOptions {
    /// Minimum importance when selecting by importance.
    pub importance_threshold: f64,
    /// Upper bound on records selected by importance.
    pub max_entries: usize,
    /// Warm exactly these ids instead (unknown ids are skipped).
    #[serde(default)]
    pub target_ids: Option<Vec<RecordId>>,
}

impl Default for WarmUpOptions {
    fn default() -> Self {
        Self::from(&WarmUpConfig::default())
    }
}

impl From<&WarmUpConfig> for WarmUpOptions {
    fn from(config: &WarmUpConfig) -> Self {
        Self {
            importance_threshold: config.importance_threshold,
            max_entries: config.max_entries,
            target_ids: None,
        }
    }
}

impl WarmUpOptions {
    /// Warm a fixed id list.
    #[must_use]
    pub fn targets<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<RecordId>,
    {
        Self {
            target_ids: Some(ids.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warm_up_defaults() {
        let opts = WarmUpOptions::default();
        assert_eq!(opts.importance_threshold, 8.0);
        assert_eq!(opts.max_entries, 128);
        assert!(opts.target_ids.is_none());
    }

    #[test]
    fn empty_tag_list_is_no_filter() {
        let q = ComplexQuery::new().with_tags(Vec::<String>::new());
        assert!(q.tag_filter().is_none());
        let q = ComplexQuery::new().with_tags(["a"]);
        assert_eq!(q.tag_filter().map(<[String]>::len), Some(1));
    }

    #[test]
    fn time_range_contains_is_inclusive() {
        let r = TimeRange::new(10, 20);
        assert!(r.contains(10));
        assert!(r.contains(20));
        assert!(!r.contains(21));
        assert!(!TimeRange::new(5, 1).contains(3));
    }
}
