//! SkipList: ordered index over `(score, member)` with per-level spans.
//!
//! Every forward link records how many level-0 hops it skips, so rank
//! queries and positional lookups descend in O(log N) like ordinary
//! searches. Nodes live in a generational arena; the head's levels are kept
//! outside the arena, and a `None` position stands for the head.
//!
//! Constraints:
//! - `(score, member)` pairs are unique; callers check membership first.
//! - Scores are never NaN.
//! - For a link with no forward node the span is `len - rank(node)`.

use crate::config::SkipListConfig;
use crate::range::{LexRange, ScoreRange};
use core::fmt;
use core::iter::Rev;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use slotmap::{new_key_type, SecondaryMap, SlotMap};

/// Upper bound accepted for `SkipListConfig::max_level`.
pub const LEVEL_CAP: usize = 64;

new_key_type! {
    pub(crate) struct NodeKey;
}

type Path = [Option<NodeKey>; LEVEL_CAP];

/// Stable reference to a node. Stops resolving once the node is removed;
/// a moving `update_score` yields a new reference.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeRef(NodeKey);

impl NodeRef {
    pub fn member<'a, M>(&self, list: &'a SkipList<M>) -> Option<&'a M> {
        list.nodes.get(self.0).map(|n| &n.member)
    }

    pub fn score<M>(&self, list: &SkipList<M>) -> Option<f64> {
        list.nodes.get(self.0).map(|n| n.score)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Level {
    forward: Option<NodeKey>,
    span: usize,
}

#[derive(Debug)]
struct Node<M> {
    member: M,
    score: f64,
    backward: Option<NodeKey>,
    levels: Vec<Level>,
}

impl<M: Ord> Node<M> {
    #[inline]
    fn precedes(&self, score: f64, member: &M) -> bool {
        self.score < score || (self.score == score && self.member < *member)
    }

    #[inline]
    fn matches(&self, score: f64, member: &M) -> bool {
        self.score == score && self.member == *member
    }
}

/// Predecessor at every level plus the rank reached at that level.
struct Descent {
    update: Path,
    rank: [usize; LEVEL_CAP],
}

pub struct SkipList<M> {
    nodes: SlotMap<NodeKey, Node<M>>,
    head: Vec<Level>,
    tail: Option<NodeKey>,
    level: usize,
    config: SkipListConfig,
    rng: StdRng,
}

impl<M: Ord> Default for SkipList<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> SkipList<M> {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of levels currently in use (at least 1).
    pub fn level(&self) -> usize {
        self.level
    }

    pub fn config(&self) -> &SkipListConfig {
        &self.config
    }

    pub fn first(&self) -> Option<NodeRef> {
        self.head[0].forward.map(NodeRef)
    }

    pub fn last(&self) -> Option<NodeRef> {
        self.tail.map(NodeRef)
    }

    pub fn next_node(&self, node: NodeRef) -> Option<NodeRef> {
        self.nodes.get(node.0)?.levels[0].forward.map(NodeRef)
    }

    pub fn prev_node(&self, node: NodeRef) -> Option<NodeRef> {
        self.nodes.get(node.0)?.backward.map(NodeRef)
    }

    /// All pairs in ascending `(score, member)` order.
    pub fn iter(&self) -> Iter<'_, M> {
        Iter {
            list: self,
            front: self.head[0].forward,
            back: self.tail,
            remaining: self.len(),
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.head.fill(Level::default());
        self.tail = None;
        self.level = 1;
    }

    #[inline]
    fn level_at(&self, at: Option<NodeKey>, i: usize) -> &Level {
        match at {
            None => &self.head[i],
            Some(k) => &self.nodes[k].levels[i],
        }
    }

    #[inline]
    fn level_at_mut(&mut self, at: Option<NodeKey>, i: usize) -> &mut Level {
        match at {
            None => &mut self.head[i],
            Some(k) => &mut self.nodes[k].levels[i],
        }
    }

    fn random_level(&mut self) -> usize {
        let mut level = 1;
        while level < self.config.max_level && self.rng.gen_bool(self.config.p) {
            level += 1;
        }
        level
    }

    /// Walk down from the top level, advancing while `before(node, rank)`
    /// holds for the next node (`rank` is that node's 1-based rank).
    fn descend<F>(&self, mut before: F) -> Descent
    where
        F: FnMut(&Node<M>, usize) -> bool,
    {
        let mut d = Descent {
            update: [None; LEVEL_CAP],
            rank: [0; LEVEL_CAP],
        };
        let mut x: Option<NodeKey> = None;
        let mut traversed = 0;
        for i in (0..self.level).rev() {
            loop {
                let l = *self.level_at(x, i);
                match l.forward {
                    Some(next) if before(&self.nodes[next], traversed + l.span) => {
                        traversed += l.span;
                        x = Some(next);
                    }
                    _ => break,
                }
            }
            d.update[i] = x;
            d.rank[i] = traversed;
        }
        d
    }

    /// Splice `key` out of every level using its predecessors in `update`.
    fn unlink(&mut self, key: NodeKey, update: &Path) -> Option<Node<M>> {
        let node = self.nodes.remove(key)?;
        for (i, &prev) in update.iter().enumerate().take(self.level) {
            let l = self.level_at_mut(prev, i);
            if l.forward == Some(key) {
                let removed = node.levels[i];
                l.span = l.span + removed.span - 1;
                l.forward = removed.forward;
            } else {
                l.span -= 1;
            }
        }
        match node.levels[0].forward {
            Some(next) => self.nodes[next].backward = node.backward,
            None => self.tail = node.backward,
        }
        while self.level > 1 && self.head[self.level - 1].forward.is_none() {
            self.level -= 1;
        }
        Some(node)
    }

    /// Remove consecutive nodes starting after the `before` prefix for as
    /// long as `within(node, rank)` holds, handing each pair to `sink`.
    fn delete_run<B, C, F>(&mut self, before: B, mut within: C, mut sink: F) -> usize
    where
        B: FnMut(&Node<M>, usize) -> bool,
        C: FnMut(&Node<M>, usize) -> bool,
        F: FnMut(M, f64),
    {
        let d = self.descend(before);
        let mut rank = d.rank[0] + 1;
        let mut removed = 0;
        let mut x = self.level_at(d.update[0], 0).forward;
        while let Some(k) = x {
            if !within(&self.nodes[k], rank) {
                break;
            }
            // Predecessors in `update` stay valid: only the front of the
            // run is ever removed.
            let Some(node) = self.unlink(k, &d.update) else {
                break;
            };
            x = node.levels[0].forward;
            sink(node.member, node.score);
            removed += 1;
            rank += 1;
        }
        removed
    }

    /// Node at the 1-based `rank`.
    pub fn element_at_rank(&self, rank: usize) -> Option<NodeRef> {
        if rank == 0 || rank > self.len() {
            return None;
        }
        let d = self.descend(|_, r| r <= rank);
        if d.rank[0] == rank {
            d.update[0].map(NodeRef)
        } else {
            None
        }
    }

    /// Remove ranks `start..=end` (1-based).
    pub fn delete_range_by_rank<F>(&mut self, start: usize, end: usize, sink: F) -> usize
    where
        F: FnMut(M, f64),
    {
        if start == 0 || start > end {
            return 0;
        }
        self.delete_run(|_, r| r < start, |_, r| r <= end, sink)
    }
}

impl<M: Ord> SkipList<M> {
    pub fn new() -> Self {
        Self::with_config(SkipListConfig::default())
    }

    /// Panics if `max_level` is outside `1..=LEVEL_CAP` or `p` outside `[0, 1)`.
    pub fn with_config(config: SkipListConfig) -> Self {
        assert!(
            (1..=LEVEL_CAP).contains(&config.max_level),
            "max_level must be in 1..={LEVEL_CAP}"
        );
        assert!(
            (0.0..1.0).contains(&config.p),
            "level promotion probability must be in [0, 1)"
        );
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            nodes: SlotMap::with_key(),
            head: vec![Level::default(); config.max_level],
            tail: None,
            level: 1,
            config,
            rng,
        }
    }

    /// Insert a pair that is not already present.
    pub fn insert(&mut self, score: f64, member: M) -> NodeRef {
        assert!(!score.is_nan(), "skip list scores must not be NaN");
        let mut d = self.descend(|n, _| n.precedes(score, &member));
        debug_assert!(
            self.level_at(d.update[0], 0)
                .forward
                .map_or(true, |k| !self.nodes[k].matches(score, &member)),
            "pair already present in skip list"
        );
        let height = self.random_level();
        let len = self.len();
        if height > self.level {
            for i in self.level..height {
                d.update[i] = None;
                d.rank[i] = 0;
                self.head[i] = Level {
                    forward: None,
                    span: len,
                };
            }
            self.level = height;
        }
        let key = self.nodes.insert(Node {
            member,
            score,
            backward: d.update[0],
            levels: vec![Level::default(); height],
        });
        for i in 0..height {
            let skipped = d.rank[0] - d.rank[i];
            let prev = *self.level_at(d.update[i], i);
            self.nodes[key].levels[i] = Level {
                forward: prev.forward,
                span: prev.span - skipped,
            };
            *self.level_at_mut(d.update[i], i) = Level {
                forward: Some(key),
                span: skipped + 1,
            };
        }
        for i in height..self.level {
            self.level_at_mut(d.update[i], i).span += 1;
        }
        match self.nodes[key].levels[0].forward {
            Some(next) => self.nodes[next].backward = Some(key),
            None => self.tail = Some(key),
        }
        NodeRef(key)
    }

    /// Remove an exact pair, returning the owned member.
    pub fn remove(&mut self, score: f64, member: &M) -> Option<M> {
        let d = self.descend(|n, _| n.precedes(score, member));
        let x = self.level_at(d.update[0], 0).forward?;
        if !self.nodes[x].matches(score, member) {
            return None;
        }
        self.unlink(x, &d.update).map(|n| n.member)
    }

    pub fn delete(&mut self, score: f64, member: &M) -> bool {
        self.remove(score, member).is_some()
    }

    /// Change the score of an existing pair. The node stays where it is when
    /// its neighbours still bracket the new score; otherwise it is unlinked
    /// and reinserted with the same member.
    pub fn update_score(&mut self, current: f64, member: &M, new_score: f64) -> NodeRef {
        assert!(!new_score.is_nan(), "skip list scores must not be NaN");
        let d = self.descend(|n, _| n.precedes(current, member));
        let x = match self.level_at(d.update[0], 0).forward {
            Some(k) if self.nodes[k].matches(current, member) => k,
            _ => panic!("update_score on a pair that is not in the skip list"),
        };
        let node = &self.nodes[x];
        let fits_after_prev = node.backward.map_or(true, |b| self.nodes[b].score < new_score);
        let fits_before_next = node.levels[0]
            .forward
            .map_or(true, |f| self.nodes[f].score > new_score);
        if fits_after_prev && fits_before_next {
            self.nodes[x].score = new_score;
            return NodeRef(x);
        }
        let Some(node) = self.unlink(x, &d.update) else {
            unreachable!("node vanished between lookup and unlink");
        };
        self.insert(new_score, node.member)
    }

    pub fn contains(&self, score: f64, member: &M) -> bool {
        self.rank_of(score, member).is_some()
    }

    /// 1-based rank of an exact pair.
    pub fn rank_of(&self, score: f64, member: &M) -> Option<usize> {
        let d = self.descend(|n, _| n.precedes(score, member) || n.matches(score, member));
        let x = d.update[0]?;
        if self.nodes[x].matches(score, member) {
            Some(d.rank[0])
        } else {
            None
        }
    }

    pub fn rank_of_node(&self, node: NodeRef) -> Option<usize> {
        let n = self.nodes.get(node.0)?;
        self.rank_of(n.score, &n.member)
    }

    /// Ascending iteration starting at `node`.
    pub fn iter_from(&self, node: NodeRef) -> Iter<'_, M> {
        match self.rank_of_node(node) {
            Some(rank) => Iter {
                list: self,
                front: Some(node.0),
                back: self.tail,
                remaining: self.len() - rank + 1,
            },
            None => Iter::empty(self),
        }
    }

    /// Descending iteration starting at `node`.
    pub fn rev_iter_from(&self, node: NodeRef) -> Rev<Iter<'_, M>> {
        match self.rank_of_node(node) {
            Some(rank) => Iter {
                list: self,
                front: self.head[0].forward,
                back: Some(node.0),
                remaining: rank,
            }
            .rev(),
            None => Iter::empty(self).rev(),
        }
    }

    /// Cheap check that the list's extremes overlap `range` at all.
    pub fn is_in_range(&self, range: &ScoreRange) -> bool {
        if range.is_empty() {
            return false;
        }
        match (self.tail, self.head[0].forward) {
            (Some(last), Some(first)) => {
                range.gte_min(self.nodes[last].score) && range.lte_max(self.nodes[first].score)
            }
            _ => false,
        }
    }

    pub fn first_in_range(&self, range: &ScoreRange) -> Option<NodeRef> {
        if !self.is_in_range(range) {
            return None;
        }
        let d = self.descend(|n, _| !range.gte_min(n.score));
        let x = self.level_at(d.update[0], 0).forward?;
        range.lte_max(self.nodes[x].score).then_some(NodeRef(x))
    }

    pub fn last_in_range(&self, range: &ScoreRange) -> Option<NodeRef> {
        if !self.is_in_range(range) {
            return None;
        }
        let d = self.descend(|n, _| range.lte_max(n.score));
        let x = d.update[0]?;
        range.gte_min(self.nodes[x].score).then_some(NodeRef(x))
    }

    /// Remove every pair whose score is in `range`.
    pub fn delete_range_by_score<F>(&mut self, range: &ScoreRange, sink: F) -> usize
    where
        F: FnMut(M, f64),
    {
        if range.is_empty() {
            return 0;
        }
        self.delete_run(
            |n, _| !range.gte_min(n.score),
            |n, _| range.lte_max(n.score),
            sink,
        )
    }

    /// Lexicographic counterpart of `is_in_range`. Lex queries assume every
    /// member carries the same score.
    pub fn is_in_lex_range(&self, range: &LexRange<M>) -> bool {
        if range.is_empty() {
            return false;
        }
        match (self.tail, self.head[0].forward) {
            (Some(last), Some(first)) => {
                range.gte_min(&self.nodes[last].member) && range.lte_max(&self.nodes[first].member)
            }
            _ => false,
        }
    }

    pub fn first_in_lex_range(&self, range: &LexRange<M>) -> Option<NodeRef> {
        if !self.is_in_lex_range(range) {
            return None;
        }
        let d = self.descend(|n, _| !range.gte_min(&n.member));
        let x = self.level_at(d.update[0], 0).forward?;
        range.lte_max(&self.nodes[x].member).then_some(NodeRef(x))
    }

    pub fn last_in_lex_range(&self, range: &LexRange<M>) -> Option<NodeRef> {
        if !self.is_in_lex_range(range) {
            return None;
        }
        let d = self.descend(|n, _| range.lte_max(&n.member));
        let x = d.update[0]?;
        range.gte_min(&self.nodes[x].member).then_some(NodeRef(x))
    }

    pub fn delete_range_by_lex<F>(&mut self, range: &LexRange<M>, sink: F) -> usize
    where
        F: FnMut(M, f64),
    {
        if range.is_empty() {
            return 0;
        }
        self.delete_run(
            |n, _| !range.gte_min(&n.member),
            |n, _| range.lte_max(&n.member),
            sink,
        )
    }

    /// Walk the whole structure and panic on the first broken invariant:
    /// ordering, backward links, tail, level bounds and exact spans.
    pub fn check_invariants(&self) {
        let mut ranks: SecondaryMap<NodeKey, usize> = SecondaryMap::new();
        let mut prev: Option<NodeKey> = None;
        let mut x = self.head[0].forward;
        let mut rank = 0;
        while let Some(k) = x {
            rank += 1;
            let n = &self.nodes[k];
            assert!(!n.score.is_nan(), "NaN score at rank {rank}");
            assert_eq!(n.backward, prev, "backward link at rank {rank}");
            if let Some(p) = prev {
                assert!(
                    self.nodes[p].precedes(n.score, &n.member),
                    "order broken at rank {rank}"
                );
            }
            assert!(
                !n.levels.is_empty() && n.levels.len() <= self.level,
                "node height out of bounds at rank {rank}"
            );
            ranks.insert(k, rank);
            prev = x;
            x = n.levels[0].forward;
        }
        assert_eq!(rank, self.len(), "level 0 does not reach every node");
        assert_eq!(self.tail, prev, "tail is not the last node");
        assert!(self.level >= 1 && self.level <= self.config.max_level);
        if self.level > 1 {
            assert!(self.head[self.level - 1].forward.is_some(), "top level empty");
        }
        for i in 0..self.level {
            let mut at: Option<NodeKey> = None;
            let mut at_rank = 0;
            loop {
                let l = *self.level_at(at, i);
                match l.forward {
                    Some(f) => {
                        let f_rank = ranks[f];
                        assert!(f_rank > at_rank, "level {i} goes backwards");
                        assert_eq!(l.span, f_rank - at_rank, "span at level {i}, rank {at_rank}");
                        at = Some(f);
                        at_rank = f_rank;
                    }
                    None => {
                        assert_eq!(
                            l.span,
                            self.len() - at_rank,
                            "trailing span at level {i}, rank {at_rank}"
                        );
                        break;
                    }
                }
            }
        }
        for l in &self.head[self.level..] {
            assert!(l.forward.is_none(), "link above the active level");
        }
    }
}

/// Ordered iterator over `(&member, score)`; double-ended.
pub struct Iter<'a, M> {
    list: &'a SkipList<M>,
    front: Option<NodeKey>,
    back: Option<NodeKey>,
    remaining: usize,
}

impl<'a, M> Iter<'a, M> {
    fn empty(list: &'a SkipList<M>) -> Self {
        Self {
            list,
            front: None,
            back: None,
            remaining: 0,
        }
    }
}

impl<'a, M> Iterator for Iter<'a, M> {
    type Item = (&'a M, f64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let n = self.list.nodes.get(self.front?)?;
        self.front = n.levels[0].forward;
        self.remaining -= 1;
        Some((&n.member, n.score))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, M> DoubleEndedIterator for Iter<'a, M> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let n = self.list.nodes.get(self.back?)?;
        self.back = n.backward;
        self.remaining -= 1;
        Some((&n.member, n.score))
    }
}

impl<'a, M> ExactSizeIterator for Iter<'a, M> {}

impl<'a, M> IntoIterator for &'a SkipList<M> {
    type Item = (&'a M, f64);
    type IntoIter = Iter<'a, M>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<M: fmt::Debug> fmt::Debug for SkipList<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::LexBound;

    fn seeded() -> SkipList<String> {
        SkipList::with_config(SkipListConfig {
            seed: Some(42),
            ..SkipListConfig::default()
        })
    }

    fn members(list: &SkipList<String>) -> Vec<String> {
        list.iter().map(|(m, _)| m.clone()).collect()
    }

    /// Invariant: ascending `(score, member)` order and exact spans hold
    /// after a shuffled insert sequence.
    #[test]
    fn insert_keeps_order_and_spans() {
        let mut l = seeded();
        for i in [5, 3, 9, 1, 7, 2, 8, 6, 4, 0] {
            l.insert(i as f64, format!("m{i}"));
            l.check_invariants();
        }
        let got: Vec<f64> = l.iter().map(|(_, s)| s).collect();
        assert_eq!(got, (0..10).map(f64::from).collect::<Vec<_>>());
        assert_eq!(l.last().and_then(|n| n.score(&l)), Some(9.0));
    }

    /// Invariant: equal scores are ordered by member.
    #[test]
    fn ties_broken_by_member() {
        let mut l = seeded();
        for m in ["c", "a", "b"] {
            l.insert(1.0, m.to_string());
        }
        assert_eq!(members(&l), ["a", "b", "c"]);
        assert_eq!(l.rank_of(1.0, &"b".to_string()), Some(2));
    }

    /// Invariant: ranks are 1-based; rank 0 and ranks past the end miss.
    #[test]
    fn rank_and_element_at_rank_agree() {
        let mut l = seeded();
        for i in 0..100 {
            l.insert(i as f64, format!("m{i:03}"));
        }
        assert!(l.element_at_rank(0).is_none());
        assert!(l.element_at_rank(101).is_none());
        assert_eq!(l.element_at_rank(100), l.last());
        for r in 1..=100 {
            let n = l.element_at_rank(r).unwrap();
            assert_eq!(n.score(&l), Some((r - 1) as f64));
            assert_eq!(l.rank_of_node(n), Some(r));
        }
        assert_eq!(l.rank_of(5.0, &"nope".to_string()), None);
        assert_eq!(l.rank_of(6.0, &"m005".to_string()), None);
    }

    /// Invariant: deleting everything restores level 1 and an empty tail.
    #[test]
    fn delete_shrinks_level_and_fixes_tail() {
        let mut l = SkipList::with_config(SkipListConfig {
            p: 0.5,
            seed: Some(3),
            ..SkipListConfig::default()
        });
        for i in 0..200u32 {
            l.insert(i as f64, i);
        }
        assert!(l.level() > 1);
        assert!(!l.delete(3.0, &4));
        for i in (0..200u32).rev() {
            assert!(l.delete(i as f64, &i));
            l.check_invariants();
            assert_eq!(l.last().and_then(|n| n.member(&l)).copied(), i.checked_sub(1));
        }
        assert!(l.is_empty());
        assert_eq!(l.level(), 1);
        assert!(l.first().is_none());
    }

    /// Invariant: range endpoints honour exclusivity, and disjoint or empty
    /// ranges find nothing.
    #[test]
    fn first_and_last_in_range() {
        let mut l = seeded();
        for i in 1..=10 {
            l.insert(i as f64, format!("m{i:02}"));
        }
        let r = ScoreRange {
            min: 3.0,
            max: 7.0,
            min_exclusive: true,
            max_exclusive: false,
        };
        assert_eq!(l.first_in_range(&r).and_then(|n| n.score(&l)), Some(4.0));
        assert_eq!(l.last_in_range(&r).and_then(|n| n.score(&l)), Some(7.0));
        assert!(l.first_in_range(&ScoreRange::new(11.0, 20.0)).is_none());
        assert!(l.last_in_range(&ScoreRange::new(-5.0, 0.5)).is_none());
        assert!(l.first_in_range(&ScoreRange::new(4.2, 4.8)).is_none());
        assert!(l.first_in_range(&ScoreRange::exclusive(5.0, 5.0)).is_none());
    }

    /// Invariant: range deletes remove exactly the qualifying pairs and hand
    /// each one to the sink in order.
    #[test]
    fn delete_ranges_feed_sink() {
        let mut l = seeded();
        for i in 1..=10 {
            l.insert(i as f64, format!("m{i:02}"));
        }
        let mut gone = Vec::new();
        let n = l.delete_range_by_score(&ScoreRange::new(3.0, 5.0), |m, s| gone.push((m, s)));
        assert_eq!(n, 3);
        assert_eq!(
            gone,
            [
                ("m03".to_string(), 3.0),
                ("m04".to_string(), 4.0),
                ("m05".to_string(), 5.0)
            ]
        );
        l.check_invariants();

        let mut gone = Vec::new();
        assert_eq!(l.delete_range_by_rank(2, 3, |m, _| gone.push(m)), 2);
        assert_eq!(gone, ["m02", "m06"]);
        assert_eq!(l.delete_range_by_rank(0, 3, |_, _| {}), 0);
        assert_eq!(l.delete_range_by_rank(3, 2, |_, _| {}), 0);
        l.check_invariants();
        assert_eq!(members(&l), ["m01", "m07", "m08", "m09", "m10"]);
    }

    /// Invariant: lexicographic queries over same-score members follow
    /// member order and bound exclusivity.
    #[test]
    fn lex_ranges() {
        let mut l = seeded();
        for m in ["a", "b", "c", "d", "e"] {
            l.insert(0.0, m.to_string());
        }
        let r: LexRange<String> = LexRange::parse("(a", "[c").unwrap();
        assert_eq!(
            l.first_in_lex_range(&r).and_then(|n| n.member(&l)).map(String::as_str),
            Some("b")
        );
        assert_eq!(
            l.last_in_lex_range(&r).and_then(|n| n.member(&l)).map(String::as_str),
            Some("c")
        );
        let none = LexRange::new(LexBound::Exclusive("e".to_string()), LexBound::PosInf);
        assert!(l.first_in_lex_range(&none).is_none());
        assert_eq!(l.delete_range_by_lex(&r, |_, _| {}), 2);
        assert_eq!(members(&l), ["a", "d", "e"]);
        l.check_invariants();
    }

    /// Invariant: a score change that keeps the node between its neighbours
    /// updates in place; otherwise the node moves and order is restored.
    #[test]
    fn update_score_in_place_or_moves() {
        let mut l = seeded();
        let a = l.insert(1.0, "a".to_string());
        l.insert(2.0, "b".to_string());
        l.insert(3.0, "c".to_string());
        let same = l.update_score(1.0, &"a".to_string(), 1.5);
        assert_eq!(same, a);
        assert_eq!(a.score(&l), Some(1.5));
        let moved = l.update_score(1.5, &"a".to_string(), 10.0);
        assert_eq!(l.rank_of_node(moved), Some(3));
        assert_eq!(members(&l), ["b", "c", "a"]);
        l.check_invariants();
    }

    /// Invariant: iteration from a node covers the remainder in either
    /// direction.
    #[test]
    fn iter_from_either_direction() {
        let mut l = seeded();
        for i in 1..=5 {
            l.insert(i as f64, format!("m{i}"));
        }
        let third = l.element_at_rank(3).unwrap();
        let fwd: Vec<f64> = l.iter_from(third).map(|(_, s)| s).collect();
        assert_eq!(fwd, [3.0, 4.0, 5.0]);
        let back: Vec<f64> = l.rev_iter_from(third).map(|(_, s)| s).collect();
        assert_eq!(back, [3.0, 2.0, 1.0]);
        let all_rev: Vec<f64> = l.iter().rev().map(|(_, s)| s).collect();
        assert_eq!(all_rev, [5.0, 4.0, 3.0, 2.0, 1.0]);
        assert_eq!(l.next_node(third).and_then(|n| n.score(&l)), Some(4.0));
        assert_eq!(l.prev_node(third).and_then(|n| n.score(&l)), Some(2.0));
    }

    /// Invariant: NaN scores are rejected.
    #[test]
    #[should_panic(expected = "NaN")]
    fn nan_score_panics() {
        let mut l = seeded();
        l.insert(f64::NAN, "x".to_string());
    }
}
