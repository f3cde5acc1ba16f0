//! # MEMZ Index Engine
//!
//! In-process read-path accelerator over an already-loaded record set.
//! Records are looked up by identifier, tag, and time range through a
//! bounded LRU cache in front of a set of read-optimized indexes:
//!
//! - **Cache** ([`LruCache`]): O(1) get/set/delete with hit/miss accounting
//! - **Primary index**: id → record
//! - **Tag index**: tag → set of ids (inverted index)
//! - **Range index** ([`RangeIndex`]): static B-tree over `updated_at`
//! - **Coordinator** ([`IndexCoordinator`]): the query surface
//!
//! The indexes of one record snapshot form an immutable [`Generation`].
//! Changing the record set means building a new generation and swapping it
//! in whole; there is no incremental insert or delete.
//!
//! ```rust
//! use memz_index::{IndexCoordinator, Record};
//!
//! let records = vec![
//!     Record::new("m-1", ["village", "quest"], 1_000, 9.0),
//!     Record::new("m-2", ["village"], 2_000, 3.0),
//! ];
//! let index = IndexCoordinator::with_defaults(records).unwrap();
//! assert_eq!(index.get_by_tags_all(&["village", "quest"]).len(), 1);
//! assert!(index.get_by_id("m-2").is_some());
//! ```
//!
//! ## Performance Contract
//!
//! Targets at 1–5K records:
//! - `get_by_id` (cache hit): < 1μs
//! - `get_by_tags_all` (2 tags): < 50μs
//! - `get_by_time_range` (narrow window): < 20μs
//! - Generation build (5K records): < 10ms

#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod fingerprint;
pub mod index;
pub mod metrics;
pub mod query;
pub mod types;

pub use cache::{CacheStats, LruCache};
pub use config::{IndexConfig, WarmUpConfig};
pub use coordinator::IndexCoordinator;
pub use error::{IndexError, Result};
pub use fingerprint::version_hash;
pub use index::{Generation, GenerationInfo, RangeIndex};
pub use metrics::{CounterSnapshot, IndexCounters};
pub use query::{ComplexQuery, TimeRange, WarmUpOptions};
pub use types::{Record, RecordId, Timestamp};
