//! Static range index: an immutable, bulk-built B-tree-shaped structure.
//!
//! Built once from pairs already sorted by key, bottom-up:
//!
//! ```text
//!                    [ 1 | 33 | 65 ]                 root (separators = child mins)
//!            ┌──────────┼──────────┐
//!      [1 .. 32]   [33 .. 64]   [65 .. 80]           leaves (≤ degree pairs)
//! ```
//!
//! Every node also remembers its max key, so a range query skips any child
//! whose `[min, max]` span cannot overlap the query.  There is no insert or
//! delete; a changed key set means a new index.

use crate::error::{IndexError, Result};

/// Fan-out used for the time index unless configured otherwise.
pub const DEFAULT_DEGREE: usize = 32;

#[derive(Debug, Clone)]
struct Node<K, V> {
    /// Leaf: the keys.  Internal: each child's min key.
    keys: Vec<K>,
    min: K,
    max: K,
    kind: NodeKind<K, V>,
}

#[derive(Debug, Clone)]
enum NodeKind<K, V> {
    Leaf(Vec<V>),
    Internal(Vec<Node<K, V>>),
}

impl<K: Ord + Clone, V> Node<K, V> {
    fn leaf(keys: Vec<K>, values: Vec<V>) -> Option<Self> {
        let min = keys.first()?.clone();
        let max = keys.last()?.clone();
        Some(Self {
            keys,
            min,
            max,
            kind: NodeKind::Leaf(values),
        })
    }

    fn internal(children: Vec<Self>) -> Option<Self> {
        let min = children.first()?.min.clone();
        let max = children.last()?.max.clone();
        let keys = children.iter().map(|c| c.min.clone()).collect();
        Some(Self {
            keys,
            min,
            max,
            kind: NodeKind::Internal(children),
        })
    }
}

impl<K: Ord, V> Node<K, V> {
    fn overlaps(&self, from: &K, to: &K) -> bool {
        self.min <= *to && self.max >= *from
    }
}

/// Immutable ordered index supporting exact and inclusive range lookups.
#[derive(Debug, Clone)]
pub struct RangeIndex<K, V> {
    root: Option<Node<K, V>>,
    len: usize,
    degree: usize,
}

impl<K: Ord + Clone, V: Clone> RangeIndex<K, V> {
    /// Build from `(key, value)` pairs in ascending key order.
    ///
    /// The caller is responsible for the ordering; the result of feeding
    /// unsorted pairs is unspecified (but memory-safe).  Equal keys are
    /// allowed.  An empty input gives an empty index.
    ///
    /// # Errors
    /// Returns [`IndexError::InvalidConfiguration`] if `degree < 2`.
    pub fn build_from_sorted<I>(pairs: I, degree: usize) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        if degree < 2 {
            return Err(IndexError::InvalidConfiguration {
                field: "range_degree",
                reason: format!("must be at least 2 (got {degree})"),
            });
        }

        let mut level: Vec<Node<K, V>> = Vec::new();
        let mut keys = Vec::with_capacity(degree);
        let mut values = Vec::with_capacity(degree);
        let mut len = 0;

        for (key, value) in pairs {
            keys.push(key);
            values.push(value);
            len += 1;
            if keys.len() == degree {
                let full_keys = std::mem::replace(&mut keys, Vec::with_capacity(degree));
                let full_values = std::mem::replace(&mut values, Vec::with_capacity(degree));
                level.extend(Node::leaf(full_keys, full_values));
            }
        }
        level.extend(Node::leaf(keys, values));

        while level.len() > 1 {
            let mut parents = Vec::with_capacity(level.len().div_ceil(degree));
            let mut nodes = level.into_iter();
            loop {
                let group: Vec<_> = nodes.by_ref().take(degree).collect();
                if group.is_empty() {
                    break;
                }
                parents.extend(Node::internal(group));
            }
            level = parents;
        }

        Ok(Self {
            root: level.pop(),
            len,
            degree,
        })
    }

    /// Exact-match lookup.  With duplicate keys, any one matching value.
    #[must_use]
    pub fn find(&self, key: &K) -> Option<&V> {
        let mut node = self.root.as_ref()?;
        loop {
            match &node.kind {
                NodeKind::Leaf(values) => {
                    let i = node.keys.partition_point(|k| k < key);
                    return match node.keys.get(i) {
                        Some(k) if k == key => values.get(i),
                        _ => None,
                    };
                }
                NodeKind::Internal(children) => {
                    // Last child whose min key is <= target.
                    let i = node.keys.partition_point(|k| k <= key);
                    if i == 0 {
                        return None;
                    }
                    node = &children[i - 1];
                }
            }
        }
    }

    /// All values with keys in `[from, to]`, in ascending key order.
    ///
    /// `from > to` yields an empty result.
    #[must_use]
    pub fn find_range(&self, from: &K, to: &K) -> Vec<V> {
        let mut out = Vec::new();
        if from > to {
            return out;
        }
        if let Some(root) = &self.root {
            collect_range(root, from, to, &mut out);
        }
        out
    }

    /// Number of indexed pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the index holds no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Fan-out used at build time.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Number of levels, leaves included.  0 for an empty index.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut node = self.root.as_ref();
        while let Some(n) = node {
            depth += 1;
            node = match &n.kind {
                NodeKind::Leaf(_) => None,
                NodeKind::Internal(children) => children.first(),
            };
        }
        depth
    }

    /// Smallest and largest keys, if any.
    #[must_use]
    pub fn key_span(&self) -> Option<(&K, &K)> {
        self.root.as_ref().map(|r| (&r.min, &r.max))
    }
}

fn collect_range<K: Ord, V: Clone>(node: &Node<K, V>, from: &K, to: &K, out: &mut Vec<V>) {
    match &node.kind {
        NodeKind::Leaf(values) => {
            let start = node.keys.partition_point(|k| k < from);
            for (key, value) in node.keys[start..].iter().zip(&values[start..]) {
                if key > to {
                    break;
                }
                out.push(value.clone());
            }
        }
        NodeKind::Internal(children) => {
            for child in children {
                if child.min > *to {
                    break;
                }
                if child.overlaps(from, to) {
                    collect_range(child, from, to, out);
                }
            }
        }
    }
}

#[cfg(test)]
impl<K: Ord + Clone, V> RangeIndex<K, V> {
    /// Leaves a range query descends into.
    fn leaves_visited(&self, from: &K, to: &K) -> usize {
        fn walk<K: Ord + Clone, V>(node: &Node<K, V>, from: &K, to: &K) -> usize {
            if !node.overlaps(from, to) {
                return 0;
            }
            match &node.kind {
                NodeKind::Leaf(_) => 1,
                NodeKind::Internal(children) => children.iter().map(|c| walk(c, from, to)).sum(),
            }
        }
        self.root.as_ref().map_or(0, |r| walk(r, from, to))
    }
}
