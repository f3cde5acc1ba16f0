//! Content version fingerprint for staleness detection.
//!
//! The digest is SHA-256 over the `(id, updated_at)` pairs of a record set,
//! sorted so that input order does not matter:
//!
//! ```text
//! for (id, updated_at) in sorted(pairs):
//!     u64_le(len(id)) ‖ id ‖ i64_le(updated_at)
//! ```
//!
//! The length prefix keeps `("ab", 1)` and `("a", …)` from colliding by
//! concatenation.  Tags, importance and payload do not participate; a
//! change that should invalidate a generation must bump `updated_at`.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::types::{Record, Timestamp};

/// Hex-encoded SHA-256 fingerprint of a record set.
///
/// Owners compute this over their source of truth and compare it with
/// [`IndexCoordinator::source_version_hash`](crate::IndexCoordinator::source_version_hash).
/// A repeated id counts once with its last `updated_at`, matching how a
/// generation collapses duplicates at build.
#[must_use]
pub fn version_hash<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut latest: HashMap<&str, Timestamp> = HashMap::new();
    for record in records {
        latest.insert(record.id.as_str(), record.updated_at);
    }
    hash_pairs(latest)
}

/// Fingerprint an already-projected `(id, updated_at)` sequence.
///
/// Pairs are hashed as given; ids are expected to be unique.
#[must_use]
pub fn hash_pairs<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, Timestamp)>,
{
    let mut pairs: Vec<_> = pairs.into_iter().collect();
    pairs.sort_unstable();

    let mut hasher = Sha256::new();
    for (id, updated_at) in pairs {
        hasher.update((id.len() as u64).to_le_bytes());
        hasher.update(id.as_bytes());
        hasher.update(updated_at.to_le_bytes());
    }
    hex::encode(hasher.finalize())
}
