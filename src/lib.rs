//! zset-index: the two structures behind a sorted set, and the glue that
//! keeps them in step.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: answer both "score of member" (O(1)) and "member at rank /
//!   members in score range" (O(log N)) over one collection, without ever
//!   pausing for a full table rehash.
//! - Layers:
//!   - Dict<K, V, S>: chained hash table with two bucket arrays. Growing
//!     or shrinking allocates the second array and migrates one bucket
//!     per `add`/`find`/`delete` (or a timed batch via `rehash_for`).
//!   - SkipList<M>: ordered by `(score, member)`; every forward link
//!     records a span so ranks come out of the same descent as lookups.
//!   - SortedSet<M, S>: owns one of each and is the only code that
//!     mutates both during a single logical operation.
//!
//! Constraints
//! - Single-threaded; wrap the whole `SortedSet` in one external lock if
//!   it must be shared.
//! - Entries and nodes live in generational arenas (`slotmap`); chains
//!   and links are arena keys, never raw pointers. Stale `EntryRef` /
//!   `NodeRef` handles resolve to `None`, as does an `EntryRef` handed to
//!   a table other than the one that issued it.
//! - Each dict entry stores its `u64` hash; migration never calls back
//!   into `K: Hash`.
//! - Resize policy is per instance (`DictConfig`), not process-wide.
//!
//! Iteration and mutation
//! - `Dict::iter` borrows the table, so the compiler rules out mutation.
//! - `SafeIter` is detached: the caller may add, delete or look up between
//!   steps. While one is registered, migration steps are skipped and new
//!   resizes are refused. It must be returned through `release`, to the
//!   same table; `rehash` reports no progress until then.
//! - `FingerprintIter` is detached and unregistered; `release` asserts
//!   that the table's structure is unchanged since the first step.
//! - `Dict::scan` is stateless: a reverse-binary cursor that visits every
//!   entry present for the whole scan at least once, across grows and
//!   shrinks.
//!
//! Failure semantics
//! - Allocation failure of a bucket array surfaces as `Alloc` errors.
//! - Duplicate keys and refused resizes are ordinary `Err`s.
//! - Lookup misses are `Option`/`bool`.
//! - NaN scores in the skip list, duplicate skip-list pairs and a table
//!   that disagrees with its ranked index are assertions.
//!
//! Logging
//! - Migration start/finish and forced grows are reported through
//!   `tracing`; no subscriber is installed here.

pub mod config;
pub mod dict;
mod dict_iter;
mod dict_proptest;
pub mod error;
pub mod range;
pub mod skiplist;
mod skiplist_proptest;
pub mod sorted_set;
mod sorted_set_proptest;
pub mod value;

// Public surface
pub use config::{DictConfig, SkipListConfig};
pub use dict::{Dict, DictStats, EntryRef, Replaced};
pub use dict_iter::{FingerprintIter, Iter, SafeIter};
pub use error::{InsertError, RangeParseError, ResizeError, ScoreError};
pub use range::{LexBound, LexRange, ScoreRange};
pub use skiplist::{Iter as SkipListIter, NodeRef, SkipList};
pub use sorted_set::{SortedSet, SortedSetStats, Upsert, UpsertFlags};
pub use value::Value;
