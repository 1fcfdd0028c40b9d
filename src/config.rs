//! Per-instance tuning knobs.
//!
//! The resize switch and the force ratio are instance state rather than
//! process-wide flags, so two tables never influence each other.

/// Tuning for a [`Dict`](crate::Dict).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DictConfig {
    /// Capacity installed on the first insert; also the floor for `resize`.
    /// Rounded up to a power of two.
    pub initial_capacity: usize,
    /// Whether the load-factor-1 grow trigger and explicit `resize` are allowed.
    pub resize_enabled: bool,
    /// Load factor above which a grow happens even with resizing disabled.
    pub force_resize_ratio: usize,
    /// Buckets migrated per batch by `rehash_for`.
    pub rehash_batch: usize,
    /// Empty buckets a single migration step may skip, per requested bucket.
    pub empty_visits_per_step: usize,
}

impl Default for DictConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 4,
            resize_enabled: true,
            force_resize_ratio: 5,
            rehash_batch: 100,
            empty_visits_per_step: 10,
        }
    }
}

impl DictConfig {
    pub(crate) fn min_capacity(&self) -> usize {
        self.initial_capacity.max(1).next_power_of_two()
    }
}

/// Tuning for a [`SkipList`](crate::SkipList).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SkipListConfig {
    /// Maximum node height; 32 is enough for 2^64 elements at p = 1/4.
    pub max_level: usize,
    /// Probability of promoting a node one more level.
    pub p: f64,
    /// Fixed RNG seed for reproducible level draws; entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for SkipListConfig {
    fn default() -> Self {
        Self {
            max_level: 32,
            p: 0.25,
            seed: None,
        }
    }
}
