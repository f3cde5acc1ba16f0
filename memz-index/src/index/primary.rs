//! Primary index: record id → record.

use std::collections::HashMap;
use std::sync::Arc;

use crate::types::Record;

/// Direct hash map from id to record, built once per generation.
#[derive(Debug, Clone, Default)]
pub struct PrimaryIndex {
    by_id: HashMap<String, Arc<Record>>,
}

impl PrimaryIndex {
    /// Index `records` by id.  A later record with the same id replaces an
    /// earlier one.
    #[must_use]
    pub fn build(records: &[Arc<Record>]) -> Self {
        let mut by_id = HashMap::with_capacity(records.len());
        for record in records {
            by_id.insert(record.id.clone(), Arc::clone(record));
        }
        Self { by_id }
    }

    /// Look up a record.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<Record>> {
        self.by_id.get(id)
    }

    /// Whether `id` is indexed.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Number of indexed records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexes_every_record() {
        let records: Vec<_> = (0..5)
            .map(|i| Arc::new(Record::new(format!("r{i}"), ["t"], i, 1.0)))
            .collect();
        let idx = PrimaryIndex::build(&records);
        assert_eq!(idx.len(), 5);
        assert_eq!(idx.get("r3").map(|r| r.created_at), Some(3));
        assert!(idx.get("r9").is_none());
        assert!(Arc::ptr_eq(idx.get("r0").unwrap(), &records[0]));
    }
}
