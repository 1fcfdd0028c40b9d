//! Error types shared by the table, the ranked index and the sorted set.
//!
//! Only ordinary, recoverable outcomes live here. Caller-side invariant
//! breaches (NaN scores, duplicate skip-list inserts, mutation during a
//! fingerprint-checked iteration) are assertions, not errors.

use std::collections::TryReserveError;

/// Failure of an insertion into a [`Dict`](crate::Dict).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InsertError {
    /// The key is already present in one of the two backing tables.
    #[error("key already exists")]
    DuplicateKey,
    /// Growing the bucket array before the insert could not allocate.
    #[error("bucket array allocation failed: {0}")]
    Alloc(#[from] TryReserveError),
}

/// Refusal to start a resize. None of these are fatal except `Alloc`;
/// callers usually ignore the refusal and retry later.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResizeError {
    /// A migration is already in progress.
    #[error("table is already rehashing")]
    Rehashing,
    /// Resizing was disabled on this instance.
    #[error("resizing is disabled")]
    Disabled,
    /// At least one safe iterator is registered against the table.
    #[error("{0} safe iterator(s) outstanding")]
    SafeIterators(usize),
    /// The requested capacity cannot hold the live entries.
    #[error("requested capacity {requested} is below the {used} live entries")]
    TooSmall { requested: usize, used: usize },
    /// The target capacity equals the current one; nothing to migrate.
    #[error("table already has capacity {0}")]
    Unchanged(usize),
    /// The new bucket array could not be allocated.
    #[error("bucket array allocation failed: {0}")]
    Alloc(#[from] TryReserveError),
}

/// Failure to parse a textual score or lexicographic range bound.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeParseError {
    #[error("min or max is not a float: {0:?}")]
    InvalidScore(String),
    #[error("min or max not valid string range item: {0:?}")]
    InvalidLexBound(String),
}

/// Failure of a score-changing operation on a [`SortedSet`](crate::SortedSet).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoreError {
    /// The given or resulting score is NaN.
    #[error("resulting score is not a number (NaN)")]
    NotANumber,
    #[error(transparent)]
    Insert(#[from] InsertError),
}
