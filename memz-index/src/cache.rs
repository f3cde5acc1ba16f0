//! Bounded LRU cache with hit/miss accounting.
//!
//! Recency order is a doubly linked list threaded through a dense slot
//! arena by integer handle; a `HashMap` maps keys to handles.  Every
//! operation is O(1):
//!
//! ```text
//!   map: key ──▶ handle
//!
//!   head (MRU)                                   tail (LRU)
//!   ┌──────┐ next ┌──────┐ next ┌──────┐
//!   │ e[3] │─────▶│ e[0] │─────▶│ e[2] │──▶ NIL
//!   │      │◀─────│      │◀─────│      │
//!   └──────┘ prev └──────┘ prev └──────┘
//! ```
//!
//! Removing an entry `swap_remove`s it out of the arena and re-points the
//! neighbours of the entry that moved into its slot, so the arena never has
//! holes and the map never holds a dangling handle.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;

use serde::Serialize;

use crate::error::{IndexError, Result};

/// Sentinel handle for "no neighbour".
const NIL: usize = usize::MAX;

/// Upper bound on slots reserved up front; larger caches grow on demand.
const PREALLOC_LIMIT: usize = 4096;

struct Entry<K, V> {
    key: K,
    value: V,
    prev: usize,
    next: usize,
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups that found an entry.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// `hits / (hits + misses)`, or 0.0 before any lookup.
    pub hit_rate: f64,
    /// Current number of entries.
    pub size: usize,
    /// Maximum number of entries.
    pub capacity: usize,
    /// Entries dropped to make room for new ones.
    pub evictions: u64,
}

/// Generic bounded least-recently-used cache.
pub struct LruCache<K, V> {
    map: HashMap<K, usize>,
    entries: Vec<Entry<K, V>>,
    head: usize,
    tail: usize,
    capacity: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<K: Hash + Eq + Clone, V> LruCache<K, V> {
    /// Create an empty cache holding at most `capacity` entries.
    ///
    /// # Errors
    /// Returns [`IndexError::InvalidConfiguration`] if `capacity` is 0.
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(IndexError::zero_capacity)?;
        Ok(Self::with_capacity(capacity))
    }

    /// Create an empty cache from an already-validated capacity.
    #[must_use]
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        let capacity = capacity.get();
        let reserve = capacity.min(PREALLOC_LIMIT);
        Self {
            map: HashMap::with_capacity(reserve),
            entries: Vec::with_capacity(reserve),
            head: NIL,
            tail: NIL,
            capacity,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Look up `key`, promoting it to most-recently-used on a hit.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&idx) = self.map.get(key) else {
            self.misses += 1;
            return None;
        };
        self.hits += 1;
        self.promote(idx);
        Some(&self.entries[idx].value)
    }

    /// Insert or overwrite `key`.
    ///
    /// An existing key is overwritten and promoted without changing
    /// occupancy.  A new key goes in at the MRU position; if the cache is
    /// full the LRU entry is evicted first and returned.
    pub fn set(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&idx) = self.map.get(&key) {
            self.entries[idx].value = value;
            self.promote(idx);
            return None;
        }

        let evicted = if self.entries.len() >= self.capacity {
            self.evictions += 1;
            self.pop_tail()
        } else {
            None
        };

        let idx = self.entries.len();
        self.entries.push(Entry {
            key: key.clone(),
            value,
            prev: NIL,
            next: NIL,
        });
        self.map.insert(key, idx);
        self.attach_front(idx);
        evicted
    }

    /// Whether `key` is cached.  Does not touch recency or counters.
    #[must_use]
    pub fn has<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    /// Remove `key`, returning whether it was present.
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&idx) = self.map.get(key) else {
            return false;
        };
        self.remove_at(idx);
        true
    }

    /// Drop every entry and reset hit/miss/eviction counters.
    pub fn clear(&mut self) {
        self.evict_all();
        self.hits = 0;
        self.misses = 0;
        self.evictions = 0;
    }

    /// Drop every entry but keep the counters.
    pub fn evict_all(&mut self) {
        self.map.clear();
        self.entries.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    /// Insert `entries` one by one through [`set`](Self::set).
    ///
    /// Warm-up follows normal eviction rules, so feeding more entries than
    /// the capacity leaves only the last `capacity` of them.  Returns the
    /// number of entries fed in.
    pub fn warm_up<I>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut count = 0;
        for (key, value) in entries {
            self.set(key, value);
            count += 1;
        }
        count
    }

    /// Current statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> CacheStats {
        let total = self.hits + self.misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        };
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            hit_rate,
            size: self.entries.len(),
            capacity: self.capacity,
            evictions: self.evictions,
        }
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Keys from most- to least-recently used.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys {
            entries: &self.entries,
            cursor: self.head,
        }
    }

    // ------------------------------------------------------------------
    // List plumbing
    // ------------------------------------------------------------------

    fn promote(&mut self, idx: usize) {
        if self.head == idx {
            return;
        }
        self.detach(idx);
        self.attach_front(idx);
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = (self.entries[idx].prev, self.entries[idx].next);
        if prev == NIL {
            self.head = next;
        } else {
            self.entries[prev].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.entries[next].prev = prev;
        }
        self.entries[idx].prev = NIL;
        self.entries[idx].next = NIL;
    }

    fn attach_front(&mut self, idx: usize) {
        self.entries[idx].prev = NIL;
        self.entries[idx].next = self.head;
        if self.head != NIL {
            self.entries[self.head].prev = idx;
        }
        self.head = idx;
        if self.tail == NIL {
            self.tail = idx;
        }
    }

    fn pop_tail(&mut self) -> Option<(K, V)> {
        if self.tail == NIL {
            return None;
        }
        Some(self.remove_at(self.tail))
    }

    fn remove_at(&mut self, idx: usize) -> (K, V) {
        self.detach(idx);
        let removed = self.entries.swap_remove(idx);
        self.map.remove(&removed.key);

        // The former last entry now lives at `idx`; re-point everything
        // that referred to its old handle.
        if idx < self.entries.len() {
            let (prev, next) = (self.entries[idx].prev, self.entries[idx].next);
            if prev == NIL {
                self.head = idx;
            } else {
                self.entries[prev].next = idx;
            }
            if next == NIL {
                self.tail = idx;
            } else {
                self.entries[next].prev = idx;
            }
            if let Some(slot) = self.map.get_mut(&self.entries[idx].key) {
                *slot = idx;
            }
        }

        (removed.key, removed.value)
    }
}

impl<K, V> fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("size", &self.entries.len())
            .field("capacity", &self.capacity)
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .field("evictions", &self.evictions)
            .finish()
    }
}

/// Iterator over cache keys in recency order, returned by [`LruCache::keys`].
pub struct Keys<'a, K, V> {
    entries: &'a [Entry<K, V>],
    cursor: usize,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.get(self.cursor)?;
        self.cursor = entry.next;
        Some(&entry.key)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
