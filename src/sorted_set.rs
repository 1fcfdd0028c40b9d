//! SortedSet: a member → score table paired with a ranked skip list.
//!
//! The table answers "what is this member's score" in O(1); the skip list
//! answers everything order- or rank-shaped in O(log N). Every mutating
//! method below updates both, so that for every member `m`:
//! `m ∈ table ⇔ m ∈ list` and `table[m]` equals the score of `m`'s node.
//!
//! Members are stored in both structures. Use a cheaply clonable member
//! type (`Arc<str>`, `Rc<str>`, small integers) for large sets.

use crate::config::{DictConfig, SkipListConfig};
use crate::dict::{Dict, DictStats};
use crate::error::{ResizeError, ScoreError};
use crate::range::{LexRange, ScoreRange};
use crate::skiplist::{Iter, SkipList};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;
use rand::Rng;
use std::time::Duration;

/// Outcome of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
    /// Member present with exactly this score; nothing was touched.
    Unchanged,
    /// A condition in [`UpsertFlags`] ruled the write out.
    Skipped,
}

/// Conditions for [`SortedSet::upsert_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertFlags {
    /// Only insert new members.
    pub nx: bool,
    /// Only update existing members.
    pub xx: bool,
    /// Only update when the new score is greater.
    pub gt: bool,
    /// Only update when the new score is lower.
    pub lt: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SortedSetStats {
    pub len: usize,
    pub levels: usize,
    pub dict: DictStats,
}

pub struct SortedSet<M, S = DefaultHashBuilder> {
    dict: Dict<M, f64, S>,
    ranked: SkipList<M>,
}

impl<M> SortedSet<M>
where
    M: Ord + Hash + Clone,
{
    pub fn new() -> Self {
        Self::with_config(DictConfig::default(), SkipListConfig::default())
    }

    pub fn with_config(dict: DictConfig, ranked: SkipListConfig) -> Self {
        Self {
            dict: Dict::with_config(dict),
            ranked: SkipList::with_config(ranked),
        }
    }
}

impl<M> Default for SortedSet<M>
where
    M: Ord + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<M, S> SortedSet<M, S> {
    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// Read-only view of the member table.
    pub fn dict(&self) -> &Dict<M, f64, S> {
        &self.dict
    }

    /// Read-only view of the ranked index.
    pub fn ranked(&self) -> &SkipList<M> {
        &self.ranked
    }

    /// Members in ascending `(score, member)` order.
    pub fn iter(&self) -> Iter<'_, M> {
        self.ranked.iter()
    }

    pub fn stats(&self) -> SortedSetStats {
        SortedSetStats {
            len: self.len(),
            levels: self.ranked.level(),
            dict: self.dict.stats(),
        }
    }

    pub fn needs_maintenance(&self) -> bool {
        self.dict.needs_maintenance()
    }

    /// Drive the member table's migration for up to `budget`.
    pub fn rehash_for(&mut self, budget: Duration) -> usize {
        self.dict.rehash_for(budget)
    }

    /// Shrink the member table to fit, starting a migration.
    pub fn resize(&mut self) -> Result<(), ResizeError> {
        self.dict.resize()
    }

    pub fn clear(&mut self) {
        self.dict.clear();
        self.ranked.clear();
    }
}

impl<M, S> SortedSet<M, S>
where
    M: Ord + Hash + Clone,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            dict: Dict::with_hasher(hasher),
            ranked: SkipList::new(),
        }
    }

    /// Insert `member` or move it to `score`.
    pub fn upsert(&mut self, member: M, score: f64) -> Result<Upsert, ScoreError> {
        self.upsert_with(member, score, UpsertFlags::default())
    }

    pub fn upsert_with(
        &mut self,
        member: M,
        score: f64,
        flags: UpsertFlags,
    ) -> Result<Upsert, ScoreError> {
        if score.is_nan() {
            return Err(ScoreError::NotANumber);
        }
        let Some(entry) = self.dict.find(&member) else {
            if flags.xx {
                return Ok(Upsert::Skipped);
            }
            // Table first: it is the only fallible half.
            self.dict.add(member.clone(), score)?;
            self.ranked.insert(score, member);
            return Ok(Upsert::Inserted);
        };
        let current = match entry.value(&self.dict) {
            Some(&s) => s,
            None => unreachable!("entry vanished right after lookup"),
        };
        if flags.nx || (flags.gt && score <= current) || (flags.lt && score >= current) {
            return Ok(Upsert::Skipped);
        }
        if current == score {
            return Ok(Upsert::Unchanged);
        }
        self.ranked.update_score(current, &member, score);
        if let Some(v) = entry.value_mut(&mut self.dict) {
            *v = score;
        }
        Ok(Upsert::Updated)
    }

    /// Add `delta` to the member's score (absent members start at 0) and
    /// return the new score.
    pub fn incr_by(&mut self, member: M, delta: f64) -> Result<f64, ScoreError> {
        let current = self
            .dict
            .find(&member)
            .and_then(|e| e.value(&self.dict).copied())
            .unwrap_or(0.0);
        let score = current + delta;
        if score.is_nan() {
            return Err(ScoreError::NotANumber);
        }
        self.upsert(member, score)?;
        Ok(score)
    }

    /// Remove `member` from both structures.
    pub fn remove<Q>(&mut self, member: &Q) -> bool
    where
        M: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let Some((member, score)) = self.dict.remove(member) else {
            return false;
        };
        let removed = self.ranked.remove(score, &member);
        assert!(
            removed.is_some(),
            "member present in the table but missing from the ranked index"
        );
        true
    }

    pub fn contains<Q>(&self, member: &Q) -> bool
    where
        M: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.dict.contains_key(member)
    }

    pub fn score_of<Q>(&self, member: &Q) -> Option<f64>
    where
        M: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.dict.peek(member).copied()
    }

    /// 1-based rank from the lowest score.
    pub fn rank_of<Q>(&self, member: &Q) -> Option<usize>
    where
        M: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let entry = self.dict.peek_entry(member)?;
        let (m, &score) = entry.pair(&self.dict)?;
        self.ranked.rank_of(score, m)
    }

    /// 1-based rank from the highest score.
    pub fn rev_rank_of<Q>(&self, member: &Q) -> Option<usize>
    where
        M: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.rank_of(member).map(|r| self.len() + 1 - r)
    }

    /// Pairs at 1-based ranks `lo..=hi`, ascending.
    pub fn range_by_rank(&self, lo: usize, hi: usize) -> impl Iterator<Item = (&M, f64)> + '_ {
        let count = if lo == 0 || lo > hi { 0 } else { hi - lo + 1 };
        self.ranked
            .element_at_rank(lo)
            .map(|n| self.ranked.iter_from(n))
            .into_iter()
            .flatten()
            .take(count)
    }

    /// Resolve 0-based, possibly negative, inclusive indexes into 1-based
    /// ranks. `None` when the window is empty.
    fn index_window(&self, start: isize, stop: isize) -> Option<(usize, usize)> {
        let len = self.len() as isize;
        let start = if start < 0 { (len + start).max(0) } else { start };
        let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
        if start > stop || start >= len {
            return None;
        }
        Some((start as usize + 1, stop as usize + 1))
    }

    /// Pairs at 0-based positions `start..=stop` from the lowest score;
    /// negative positions count back from the highest (`-1` is the last).
    pub fn range_by_index(&self, start: isize, stop: isize) -> impl Iterator<Item = (&M, f64)> + '_ {
        let (lo, hi) = self.index_window(start, stop).unwrap_or((1, 0));
        self.range_by_rank(lo, hi)
    }

    /// Like `range_by_index`, but positions count from the highest score
    /// and pairs come out descending.
    pub fn rev_range_by_index(
        &self,
        start: isize,
        stop: isize,
    ) -> impl Iterator<Item = (&M, f64)> + '_ {
        let (count, from) = match self.index_window(start, stop) {
            Some((lo, hi)) => (hi - lo + 1, self.len() + 1 - lo),
            None => (0, 0),
        };
        self.ranked
            .element_at_rank(from)
            .map(|n| self.ranked.rev_iter_from(n))
            .into_iter()
            .flatten()
            .take(count)
    }

    /// Pairs with scores in `range`, ascending.
    pub fn range_by_score(&self, range: &ScoreRange) -> impl Iterator<Item = (&M, f64)> + '_ {
        let r = *range;
        self.ranked
            .first_in_range(range)
            .map(|n| self.ranked.iter_from(n))
            .into_iter()
            .flatten()
            .take_while(move |&(_, s)| r.lte_max(s))
    }

    /// Pairs with scores in `range`, descending.
    pub fn rev_range_by_score(&self, range: &ScoreRange) -> impl Iterator<Item = (&M, f64)> + '_ {
        let r = *range;
        self.ranked
            .last_in_range(range)
            .map(|n| self.ranked.rev_iter_from(n))
            .into_iter()
            .flatten()
            .take_while(move |&(_, s)| r.gte_min(s))
    }

    /// Members in `range`, ascending. Assumes all members share one score.
    pub fn range_by_lex<'a>(
        &'a self,
        range: &'a LexRange<M>,
    ) -> impl Iterator<Item = (&'a M, f64)> + 'a {
        self.ranked
            .first_in_lex_range(range)
            .map(|n| self.ranked.iter_from(n))
            .into_iter()
            .flatten()
            .take_while(move |(m, _)| range.lte_max(m))
    }

    pub fn rev_range_by_lex<'a>(
        &'a self,
        range: &'a LexRange<M>,
    ) -> impl Iterator<Item = (&'a M, f64)> + 'a {
        self.ranked
            .last_in_lex_range(range)
            .map(|n| self.ranked.rev_iter_from(n))
            .into_iter()
            .flatten()
            .take_while(move |(m, _)| range.gte_min(m))
    }

    /// Number of members with scores in `range`, in O(log N).
    pub fn count_in_range(&self, range: &ScoreRange) -> usize {
        let first = self.ranked.first_in_range(range);
        let last = self.ranked.last_in_range(range);
        match (
            first.and_then(|n| self.ranked.rank_of_node(n)),
            last.and_then(|n| self.ranked.rank_of_node(n)),
        ) {
            (Some(a), Some(b)) => b + 1 - a,
            _ => 0,
        }
    }

    pub fn count_in_lex_range(&self, range: &LexRange<M>) -> usize {
        let first = self.ranked.first_in_lex_range(range);
        let last = self.ranked.last_in_lex_range(range);
        match (
            first.and_then(|n| self.ranked.rank_of_node(n)),
            last.and_then(|n| self.ranked.rank_of_node(n)),
        ) {
            (Some(a), Some(b)) => b + 1 - a,
            _ => 0,
        }
    }

    /// Remove members with scores in `range`; returns how many.
    pub fn delete_range_by_score(&mut self, range: &ScoreRange) -> usize {
        let dict = &mut self.dict;
        self.ranked.delete_range_by_score(range, |m, _| {
            let gone = dict.delete(&m);
            debug_assert!(gone, "ranked member missing from the table");
        })
    }

    /// Remove members at 1-based ranks `lo..=hi`.
    pub fn delete_range_by_rank(&mut self, lo: usize, hi: usize) -> usize {
        let dict = &mut self.dict;
        self.ranked.delete_range_by_rank(lo, hi, |m, _| {
            let gone = dict.delete(&m);
            debug_assert!(gone, "ranked member missing from the table");
        })
    }

    pub fn delete_range_by_lex(&mut self, range: &LexRange<M>) -> usize {
        let dict = &mut self.dict;
        self.ranked.delete_range_by_lex(range, |m, _| {
            let gone = dict.delete(&m);
            debug_assert!(gone, "ranked member missing from the table");
        })
    }

    /// Remove and return up to `n` lowest-scored members, lowest first.
    pub fn pop_min(&mut self, n: usize) -> Vec<(M, f64)> {
        let mut out = Vec::with_capacity(n.min(self.len()));
        if n == 0 {
            return out;
        }
        let dict = &mut self.dict;
        self.ranked.delete_range_by_rank(1, n, |m, s| {
            dict.delete(&m);
            out.push((m, s));
        });
        out
    }

    /// Remove and return up to `n` highest-scored members, highest first.
    pub fn pop_max(&mut self, n: usize) -> Vec<(M, f64)> {
        let len = self.len();
        let mut out = Vec::with_capacity(n.min(len));
        if n == 0 || len == 0 {
            return out;
        }
        let lo = len.saturating_sub(n) + 1;
        let dict = &mut self.dict;
        self.ranked.delete_range_by_rank(lo, len, |m, s| {
            dict.delete(&m);
            out.push((m, s));
        });
        out.reverse();
        out
    }

    /// A random member, favouring members in sparse table buckets.
    pub fn random_member<R>(&mut self, rng: &mut R) -> Option<(&M, f64)>
    where
        R: Rng + ?Sized,
    {
        let e = self.dict.random_entry(rng)?;
        e.pair(&self.dict).map(|(m, &s)| (m, s))
    }

    /// Panic unless the table and the ranked index hold exactly the same
    /// `(member, score)` pairs and the ranked index is internally sound.
    pub fn check_consistency(&self) {
        self.ranked.check_invariants();
        assert_eq!(
            self.dict.len(),
            self.ranked.len(),
            "table and ranked index sizes differ"
        );
        for (m, score) in self.ranked.iter() {
            assert_eq!(
                self.dict.peek(m).copied(),
                Some(score),
                "table score disagrees with ranked index"
            );
        }
    }
}

impl<M, S> fmt::Debug for SortedSet<M, S>
where
    M: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.ranked.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn set(pairs: &[(&str, f64)]) -> SortedSet<String> {
        let mut z = SortedSet::new();
        for &(m, s) in pairs {
            z.upsert(m.to_string(), s).unwrap();
        }
        z
    }

    fn names<'a>(it: impl Iterator<Item = (&'a String, f64)>) -> Vec<&'a str> {
        it.map(|(m, _)| m.as_str()).collect()
    }

    /// Invariant: upsert reports insert, update and no-op distinctly, and a
    /// no-op leaves the ranked index untouched.
    #[test]
    fn upsert_outcomes() {
        let mut z: SortedSet<String> = SortedSet::new();
        assert_eq!(z.upsert("a".into(), 1.0), Ok(Upsert::Inserted));
        assert_eq!(z.upsert("a".into(), 1.0), Ok(Upsert::Unchanged));
        assert_eq!(z.upsert("a".into(), 2.0), Ok(Upsert::Updated));
        assert_eq!(z.score_of("a"), Some(2.0));
        assert_eq!(z.upsert("b".into(), f64::NAN), Err(ScoreError::NotANumber));
        assert_eq!(z.len(), 1);
        z.check_consistency();
    }

    /// Invariant: nx/xx/gt/lt gate writes the same way as ZADD flags.
    #[test]
    fn upsert_flags() {
        let mut z = set(&[("a", 5.0)]);
        let nx = UpsertFlags {
            nx: true,
            ..UpsertFlags::default()
        };
        let xx = UpsertFlags {
            xx: true,
            ..UpsertFlags::default()
        };
        let gt = UpsertFlags {
            gt: true,
            ..UpsertFlags::default()
        };
        let lt = UpsertFlags {
            lt: true,
            ..UpsertFlags::default()
        };
        assert_eq!(z.upsert_with("a".into(), 9.0, nx), Ok(Upsert::Skipped));
        assert_eq!(z.upsert_with("b".into(), 9.0, xx), Ok(Upsert::Skipped));
        assert!(!z.contains("b"));
        assert_eq!(z.upsert_with("a".into(), 4.0, gt), Ok(Upsert::Skipped));
        assert_eq!(z.upsert_with("a".into(), 6.0, gt), Ok(Upsert::Updated));
        assert_eq!(z.upsert_with("a".into(), 7.0, lt), Ok(Upsert::Skipped));
        assert_eq!(z.upsert_with("a".into(), 1.0, lt), Ok(Upsert::Updated));
        assert_eq!(z.upsert_with("c".into(), 3.0, gt), Ok(Upsert::Inserted));
        assert_eq!(z.score_of("a"), Some(1.0));
        z.check_consistency();
    }

    /// Invariant: incr_by starts absent members at zero and refuses NaN.
    #[test]
    fn incr_by_accumulates() {
        let mut z: SortedSet<String> = SortedSet::new();
        assert_eq!(z.incr_by("a".into(), 2.5), Ok(2.5));
        assert_eq!(z.incr_by("a".into(), -1.0), Ok(1.5));
        z.upsert("inf".into(), f64::INFINITY).unwrap();
        assert_eq!(
            z.incr_by("inf".into(), f64::NEG_INFINITY),
            Err(ScoreError::NotANumber)
        );
        assert_eq!(z.score_of("inf"), Some(f64::INFINITY));
        z.check_consistency();
    }

    /// Invariant: ranks are 1-based in both directions.
    #[test]
    fn rank_and_rev_rank() {
        let z = set(&[("a", 1.0), ("b", 2.0), ("c", 3.0)]);
        assert_eq!(z.rank_of("a"), Some(1));
        assert_eq!(z.rev_rank_of("a"), Some(3));
        assert_eq!(z.rank_of("zz"), None);
    }

    /// Invariant: index windows accept negative positions and clamp like
    /// ZRANGE.
    #[test]
    fn range_by_index_windows() {
        let z = set(&[("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0)]);
        assert_eq!(names(z.range_by_index(0, -1)), ["a", "b", "c", "d"]);
        assert_eq!(names(z.range_by_index(1, 2)), ["b", "c"]);
        assert_eq!(names(z.range_by_index(-2, 100)), ["c", "d"]);
        assert_eq!(names(z.range_by_index(-100, 0)), ["a"]);
        assert!(names(z.range_by_index(3, 1)).is_empty());
        assert!(names(z.range_by_index(10, 20)).is_empty());
        assert_eq!(names(z.rev_range_by_index(0, 1)), ["d", "c"]);
        assert_eq!(names(z.rev_range_by_index(-1, -1)), ["a"]);
    }

    /// Invariant: score ranges iterate in both directions and count in
    /// agreement with iteration.
    #[test]
    fn score_ranges_and_counts() {
        let z = set(&[("a", 1.0), ("b", 2.0), ("c", 2.0), ("d", 4.0)]);
        let r = ScoreRange::parse("(1", "4").unwrap();
        assert_eq!(names(z.range_by_score(&r)), ["b", "c", "d"]);
        assert_eq!(names(z.rev_range_by_score(&r)), ["d", "c", "b"]);
        assert_eq!(z.count_in_range(&r), 3);
        assert_eq!(z.count_in_range(&ScoreRange::new(2.5, 3.5)), 0);
        assert_eq!(z.count_in_range(&ScoreRange::all()), 4);
    }

    /// Invariant: lex queries and lex deletes act on member order.
    #[test]
    fn lex_queries() {
        let mut z = set(&[("a", 0.0), ("b", 0.0), ("c", 0.0), ("d", 0.0)]);
        let r = LexRange::parse("[b", "+").unwrap();
        assert_eq!(names(z.range_by_lex(&r)), ["b", "c", "d"]);
        assert_eq!(names(z.rev_range_by_lex(&r)), ["d", "c", "b"]);
        assert_eq!(z.count_in_lex_range(&r), 3);
        assert_eq!(z.delete_range_by_lex(&LexRange::parse("(a", "(d").unwrap()), 2);
        assert_eq!(names(z.iter()), ["a", "d"]);
        z.check_consistency();
    }

    /// Invariant: pops remove from both structures in score order.
    #[test]
    fn pop_min_and_max() {
        let mut z = set(&[("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0)]);
        assert_eq!(z.pop_min(1), [("a".to_string(), 1.0)]);
        assert_eq!(
            z.pop_max(2),
            [("d".to_string(), 4.0), ("c".to_string(), 3.0)]
        );
        assert_eq!(z.pop_max(10), [("b".to_string(), 2.0)]);
        assert!(z.pop_min(3).is_empty());
        assert!(z.dict().is_empty());
        z.check_consistency();
    }

    /// Invariant: removing keeps both structures in step and is idempotent.
    #[test]
    fn remove_from_both() {
        let mut z = set(&[("a", 1.0), ("b", 2.0)]);
        assert!(z.remove("a"));
        assert!(!z.remove("a"));
        assert_eq!(z.ranked().len(), 1);
        assert_eq!(z.dict().len(), 1);
        z.check_consistency();
    }

    /// Invariant: shared members work through `Borrow<str>` lookups.
    #[test]
    fn arc_members() {
        let mut z: SortedSet<Arc<str>> = SortedSet::new();
        z.upsert(Arc::from("x"), 1.0).unwrap();
        z.upsert(Arc::from("y"), 0.5).unwrap();
        assert_eq!(z.rank_of("x"), Some(2));
        assert!(z.remove("y"));
        z.check_consistency();
    }
}
