//! Inverted tag index: tag → set of record ids.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::types::{Record, RecordId};

/// Maps each tag to the ids of the records carrying it.
#[derive(Debug, Clone, Default)]
pub struct TagIndex {
    by_tag: HashMap<String, HashSet<RecordId>>,
}

impl TagIndex {
    /// Build from every tag of every record.  Repeated tags on one record
    /// collapse into a single membership.
    #[must_use]
    pub fn build(records: &[Arc<Record>]) -> Self {
        let mut by_tag: HashMap<String, HashSet<RecordId>> = HashMap::new();
        for record in records {
            for tag in &record.tags {
                by_tag
                    .entry(tag.clone())
                    .or_default()
                    .insert(record.id.clone());
            }
        }
        Self { by_tag }
    }

    /// Ids carrying `tag`, or `None` if no record has it.
    #[must_use]
    pub fn ids(&self, tag: &str) -> Option<&HashSet<RecordId>> {
        self.by_tag.get(tag)
    }

    /// Whether any record carries `tag`.
    #[must_use]
    pub fn contains_tag(&self, tag: &str) -> bool {
        self.by_tag.contains_key(tag)
    }

    /// Number of distinct tags.
    #[must_use]
    pub fn tag_count(&self) -> usize {
        self.by_tag.len()
    }

    /// All distinct tags, unordered.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.by_tag.keys().map(String::as_str)
    }

    /// Ids carrying **every** tag in `tags`.
    ///
    /// Empty input, or any tag unknown to the index, selects nothing.
    /// Otherwise sets are intersected smallest-first and the walk stops as
    /// soon as the running intersection is empty.
    #[must_use]
    pub fn intersect_all<S: AsRef<str>>(&self, tags: &[S]) -> HashSet<RecordId> {
        let mut sets = Vec::with_capacity(tags.len());
        for tag in tags {
            match self.by_tag.get(tag.as_ref()) {
                Some(set) => sets.push(set),
                None => return HashSet::new(),
            }
        }
        sets.sort_by_key(|s| s.len());

        let mut sets = sets.into_iter();
        let Some(smallest) = sets.next() else {
            return HashSet::new();
        };
        let mut result = smallest.clone();
        for set in sets {
            if result.is_empty() {
                break;
            }
            result.retain(|id| set.contains(id));
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<Arc<Record>> {
        vec![
            Arc::new(Record::new("a", ["red", "round", "red"], 1, 1.0)),
            Arc::new(Record::new("b", ["red", "square"], 2, 1.0)),
            Arc::new(Record::new("c", ["blue", "round"], 3, 1.0)),
        ]
    }

    #[test]
    fn builds_inverted_sets() {
        let idx = TagIndex::build(&records());
        assert_eq!(idx.tag_count(), 4);
        assert_eq!(idx.ids("red").map(HashSet::len), Some(2));
        assert_eq!(idx.ids("round").map(HashSet::len), Some(2));
        assert!(idx.ids("green").is_none());
        assert!(idx.contains_tag("square"));
    }

    #[test]
    fn intersection_semantics() {
        let idx = TagIndex::build(&records());
        let both = idx.intersect_all(&["red", "round"]);
        assert_eq!(both, HashSet::from(["a".to_string()]));
        assert!(idx.intersect_all(&["red", "blue"]).is_empty());
        assert!(idx.intersect_all::<&str>(&[]).is_empty());
        assert!(idx.intersect_all(&["red", "green"]).is_empty());
        assert_eq!(idx.intersect_all(&["round"]).len(), 2);
    }
}
