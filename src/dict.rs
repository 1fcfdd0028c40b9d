//! Dict: chained hash table with two bucket arrays and incremental migration.
//!
//! Entries live in one generational arena shared by both bucket arrays;
//! chains are singly linked through arena keys, so moving a bucket from the
//! old array to the new one only rewrites links. Each entry caches its hash,
//! and migration never calls back into `K: Hash`.

use crate::config::DictConfig;
use crate::dict_iter::{FingerprintIter, Iter, SafeIter};
use crate::error::{InsertError, ResizeError};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;
use rand::Rng;
use slotmap::{new_key_type, SlotMap};
use std::collections::TryReserveError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

new_key_type! {
    pub(crate) struct EntryKey;
}

/// Stable reference to a live entry. Resolves to `None` once the entry is
/// removed, even if its arena slot is reused, and when handed to a table
/// other than the one that issued it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct EntryRef {
    owner: DictId,
    key: EntryKey,
}

impl EntryRef {
    #[inline]
    fn resolve<K, V, S>(&self, dict: &Dict<K, V, S>) -> Option<EntryKey> {
        (self.owner == dict.id).then_some(self.key)
    }

    pub fn key<'a, K, V, S>(&self, dict: &'a Dict<K, V, S>) -> Option<&'a K> {
        dict.entries.get(self.resolve(dict)?).map(|e| &e.key)
    }

    pub fn value<'a, K, V, S>(&self, dict: &'a Dict<K, V, S>) -> Option<&'a V> {
        dict.entries.get(self.resolve(dict)?).map(|e| &e.value)
    }

    pub fn value_mut<'a, K, V, S>(&self, dict: &'a mut Dict<K, V, S>) -> Option<&'a mut V> {
        let key = self.resolve(dict)?;
        dict.entries.get_mut(key).map(|e| &mut e.value)
    }

    pub fn pair<'a, K, V, S>(&self, dict: &'a Dict<K, V, S>) -> Option<(&'a K, &'a V)> {
        dict.entries.get(self.resolve(dict)?).map(|e| (&e.key, &e.value))
    }
}

#[derive(Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    hash: u64,
    pub(crate) next: Option<EntryKey>,
}

#[derive(Debug, Default)]
pub(crate) struct Table {
    pub(crate) buckets: Vec<Option<EntryKey>>,
    used: usize,
}

impl Table {
    fn with_capacity(capacity: usize) -> Result<Self, TryReserveError> {
        let mut buckets = Vec::new();
        buckets.try_reserve_exact(capacity)?;
        buckets.resize(capacity, None);
        Ok(Self { buckets, used: 0 })
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    fn mask(&self) -> usize {
        self.buckets.len().wrapping_sub(1)
    }

    #[inline]
    fn slot(&self, hash: u64) -> usize {
        hash as usize & self.mask()
    }
}

/// Add one to `v` counting from the top bit of `mask` downwards, so that
/// doubling the table splits each visited bucket into two already-visited
/// ones.
#[inline]
fn reverse_increment(v: usize, mask: usize) -> usize {
    (v | !mask).reverse_bits().wrapping_add(1).reverse_bits()
}

/// Process-unique table identity, stable across moves of the `Dict` value.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct DictId(u64);

impl DictId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        DictId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Outcome of [`Dict::replace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replaced {
    Inserted,
    Updated,
}

/// Snapshot of the table geometry for external maintenance policies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DictStats {
    pub len: usize,
    pub slots: usize,
    pub main_capacity: usize,
    pub main_used: usize,
    pub rehash_capacity: usize,
    pub rehash_used: usize,
    pub rehash_cursor: Option<usize>,
    pub safe_iterators: usize,
    pub load_factor: f64,
}

/// Position of an entry-by-entry walk over both bucket arrays.
#[derive(Debug, Clone, Default)]
pub(crate) struct Cursor {
    table: usize,
    index: Option<usize>,
    in_chain: bool,
    next: Option<EntryKey>,
    done: bool,
}

/// Hash table that grows by migrating one bucket per operation instead of
/// rehashing everything at once.
pub struct Dict<K, V, S = DefaultHashBuilder> {
    pub(crate) id: DictId,
    hasher: S,
    config: DictConfig,
    // tables[0] is the main table; tables[1] is only populated while migrating.
    tables: [Table; 2],
    rehash_idx: Option<usize>,
    pub(crate) safe_iterators: usize,
    pub(crate) entries: SlotMap<EntryKey, Entry<K, V>>,
}

impl<K, V> Dict<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_config(config: DictConfig) -> Self {
        Self::with_config_and_hasher(config, Default::default())
    }
}

impl<K, V> Default for Dict<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> Dict<K, V, S> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total bucket slots across both arrays.
    pub fn slots(&self) -> usize {
        self.tables[0].capacity() + self.tables[1].capacity()
    }

    /// Capacity of the table new entries will eventually live in.
    pub fn capacity(&self) -> usize {
        if self.is_rehashing() {
            self.tables[1].capacity()
        } else {
            self.tables[0].capacity()
        }
    }

    pub fn load_factor(&self) -> f64 {
        match self.capacity() {
            0 => 0.0,
            cap => self.len() as f64 / cap as f64,
        }
    }

    pub fn is_rehashing(&self) -> bool {
        self.rehash_idx.is_some()
    }

    pub fn config(&self) -> &DictConfig {
        &self.config
    }

    pub fn set_resize_enabled(&mut self, enabled: bool) {
        self.config.resize_enabled = enabled;
    }

    /// Number of registered safe iterators.
    pub fn safe_iterators(&self) -> usize {
        self.safe_iterators
    }

    /// True when fewer than 10% of the slots are used and the table is
    /// larger than its configured minimum.
    pub fn needs_shrink(&self) -> bool {
        let slots = self.slots();
        slots > self.config.min_capacity() && self.len().saturating_mul(100) / slots < 10
    }

    /// Whether an external scheduler has useful work to do here.
    pub fn needs_maintenance(&self) -> bool {
        self.is_rehashing() || self.needs_shrink()
    }

    pub fn stats(&self) -> DictStats {
        DictStats {
            len: self.len(),
            slots: self.slots(),
            main_capacity: self.tables[0].capacity(),
            main_used: self.tables[0].used,
            rehash_capacity: self.tables[1].capacity(),
            rehash_used: self.tables[1].used,
            rehash_cursor: self.rehash_idx,
            safe_iterators: self.safe_iterators,
            load_factor: self.load_factor(),
        }
    }

    /// 64-bit digest of both tables' array address, capacity and usage.
    /// Any structural mutation changes it with overwhelming probability.
    pub fn fingerprint(&self) -> u64 {
        let [t0, t1] = &self.tables;
        let integers = [
            t0.buckets.as_ptr() as u64,
            t0.capacity() as u64,
            t0.used as u64,
            t1.buckets.as_ptr() as u64,
            t1.capacity() as u64,
            t1.used as u64,
        ];
        // Thomas Wang's 64 bit integer mix, chained so order matters.
        let mut hash: u64 = 0;
        for n in integers {
            hash = hash.wrapping_add(n);
            hash = (!hash).wrapping_add(hash << 21);
            hash ^= hash >> 24;
            hash = hash.wrapping_add(hash << 3).wrapping_add(hash << 8);
            hash ^= hash >> 14;
            hash = hash.wrapping_add(hash << 2).wrapping_add(hash << 4);
            hash ^= hash >> 28;
            hash = hash.wrapping_add(hash << 31);
        }
        hash
    }

    /// Borrowing iterator; the borrow checker rules out mutation.
    pub fn iter(&self) -> Iter<'_, K, V, S> {
        Iter::new(self)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Detached iterator that tolerates add/delete/find between steps.
    /// Migration is suspended until it is released.
    pub fn safe_iter(&self) -> SafeIter {
        SafeIter::new(self.id)
    }

    /// Detached iterator that asserts on release that nothing structural
    /// changed since its first step.
    pub fn fingerprint_iter(&self) -> FingerprintIter {
        FingerprintIter::new(self.id)
    }

    /// Drop every entry and both bucket arrays.
    pub fn clear(&mut self) {
        self.clear_with(|| {});
    }

    /// Like `clear`, invoking `callback` every 65536 buckets so a caller can
    /// interleave other work while a huge table is torn down.
    pub fn clear_with<F>(&mut self, mut callback: F)
    where
        F: FnMut(),
    {
        for t in 0..2 {
            let table = core::mem::take(&mut self.tables[t]);
            let mut used = table.used;
            for (i, head) in table.buckets.into_iter().enumerate() {
                if used == 0 {
                    break;
                }
                if i & 0xffff == 0 {
                    callback();
                }
                let mut cur = head;
                while let Some(k) = cur {
                    cur = self.entries.remove(k).and_then(|e| e.next);
                    used -= 1;
                }
            }
        }
        debug_assert!(self.entries.is_empty());
        self.rehash_idx = None;
    }

    /// Migrate up to `n` non-empty buckets from the old array to the new one.
    /// Returns `true` while entries remain to be moved; the call that drains
    /// the old array promotes the new one and returns `false`.
    ///
    /// While safe iterators are registered nothing moves and the result is
    /// `false`, so `while d.rehash(1) {}` ends; `is_rehashing` still reports
    /// the pending migration.
    pub fn rehash(&mut self, n: usize) -> bool {
        let Some(mut idx) = self.rehash_idx else {
            return false;
        };
        if self.safe_iterators > 0 {
            return false;
        }
        let mut empty_visits = n
            .saturating_mul(self.config.empty_visits_per_step)
            .max(1);
        let mut remaining = n;
        while remaining > 0 && self.tables[0].used > 0 {
            // Buckets below idx are drained and new keys go to tables[1],
            // so a non-empty bucket exists at or after idx.
            while self.tables[0].buckets[idx].is_none() {
                idx += 1;
                empty_visits -= 1;
                if empty_visits == 0 {
                    self.rehash_idx = Some(idx);
                    return true;
                }
            }
            let mut cur = self.tables[0].buckets[idx].take();
            while let Some(k) = cur {
                let entry = &mut self.entries[k];
                cur = entry.next;
                let slot = self.tables[1].slot(entry.hash);
                entry.next = self.tables[1].buckets[slot];
                self.tables[1].buckets[slot] = Some(k);
                self.tables[0].used -= 1;
                self.tables[1].used += 1;
            }
            idx += 1;
            remaining -= 1;
        }
        if self.tables[0].used == 0 {
            self.finish_rehash();
            return false;
        }
        self.rehash_idx = Some(idx);
        true
    }

    /// Run migration batches until `budget` elapses or migration completes.
    /// Returns the number of bucket steps requested.
    pub fn rehash_for(&mut self, budget: Duration) -> usize {
        if self.safe_iterators > 0 {
            return 0;
        }
        let start = Instant::now();
        let batch = self.config.rehash_batch.max(1);
        let mut steps = 0;
        while self.rehash(batch) {
            steps += batch;
            if start.elapsed() > budget {
                break;
            }
        }
        tracing::trace!(
            steps,
            elapsed_us = start.elapsed().as_micros() as u64,
            rehashing = self.is_rehashing(),
            "rehash_for"
        );
        steps
    }

    fn finish_rehash(&mut self) {
        let new = core::mem::take(&mut self.tables[1]);
        let old = core::mem::replace(&mut self.tables[0], new);
        self.rehash_idx = None;
        tracing::debug!(
            old_capacity = old.capacity(),
            capacity = self.tables[0].capacity(),
            len = self.len(),
            "rehash complete"
        );
    }

    /// One opportunistic migration step, skipped while safe iterators exist.
    fn rehash_step(&mut self) {
        if self.safe_iterators == 0 {
            self.rehash(1);
        }
    }

    fn next_capacity(&self, size: usize) -> usize {
        size.max(self.config.min_capacity())
            .checked_next_power_of_two()
            .unwrap_or(1 << (usize::BITS - 1))
    }

    /// Grow (or shrink) to the smallest power of two >= `size`. The first
    /// call on an empty table installs the array directly; later calls start
    /// a migration.
    pub fn expand(&mut self, size: usize) -> Result<(), ResizeError> {
        if self.is_rehashing() {
            return Err(ResizeError::Rehashing);
        }
        let used = self.tables[0].used;
        if used > size {
            return Err(ResizeError::TooSmall {
                requested: size,
                used,
            });
        }
        let capacity = self.next_capacity(size);
        if self.tables[0].capacity() == 0 {
            self.tables[0] = Table::with_capacity(capacity)?;
            tracing::debug!(capacity, "table allocated");
            return Ok(());
        }
        if self.safe_iterators > 0 {
            return Err(ResizeError::SafeIterators(self.safe_iterators));
        }
        if capacity == self.tables[0].capacity() {
            return Err(ResizeError::Unchanged(capacity));
        }
        self.tables[1] = Table::with_capacity(capacity)?;
        self.rehash_idx = Some(0);
        tracing::debug!(
            old_capacity = self.tables[0].capacity(),
            capacity,
            len = used,
            "rehash started"
        );
        Ok(())
    }

    /// Fit the table to its live entries (never below the configured
    /// initial capacity).
    pub fn resize(&mut self) -> Result<(), ResizeError> {
        if !self.config.resize_enabled {
            return Err(ResizeError::Disabled);
        }
        if self.is_rehashing() {
            return Err(ResizeError::Rehashing);
        }
        let minimal = self.tables[0].used.max(self.config.min_capacity());
        self.expand(minimal)
    }

    fn expand_if_needed(&mut self) -> Result<(), TryReserveError> {
        if self.is_rehashing() {
            return Ok(());
        }
        let capacity = self.tables[0].capacity();
        let used = self.tables[0].used;
        let target = if capacity == 0 {
            self.config.initial_capacity
        } else {
            let forced = used / capacity > self.config.force_resize_ratio;
            if !((used >= capacity && self.config.resize_enabled) || forced) {
                return Ok(());
            }
            if forced && !self.config.resize_enabled {
                tracing::warn!(used, capacity, "forcing grow while resizing is disabled");
            }
            used.saturating_mul(2)
        };
        match self.expand(target) {
            Err(ResizeError::Alloc(e)) => Err(e),
            // Refusals (e.g. safe iterators) just leave chains longer.
            _ => Ok(()),
        }
    }

    #[inline]
    pub(crate) fn entry_ref(&self, key: EntryKey) -> EntryRef {
        EntryRef { owner: self.id, key }
    }

    pub(crate) fn chain(&self, head: Option<EntryKey>) -> impl Iterator<Item = EntryKey> + '_ {
        core::iter::successors(head, move |&k| self.entries.get(k).and_then(|e| e.next))
    }

    /// Step `cursor` to the next entry: bucket by bucket, main table first.
    /// A successor that vanished since the last step ends that chain.
    pub(crate) fn advance(&self, c: &mut Cursor) -> Option<EntryKey> {
        if c.done {
            return None;
        }
        loop {
            let head = if c.in_chain {
                c.next
            } else {
                let idx = c.index.map_or(0, |i| i + 1);
                c.index = Some(idx);
                if idx >= self.tables[c.table].capacity() {
                    if c.table == 0 && self.is_rehashing() {
                        c.table = 1;
                        c.index = None;
                        continue;
                    }
                    c.done = true;
                    return None;
                }
                self.tables[c.table].buckets[idx]
            };
            match head.and_then(|k| self.entries.get(k).map(|e| (k, e.next))) {
                Some((k, next)) => {
                    c.in_chain = true;
                    c.next = next;
                    return Some(k);
                }
                None => c.in_chain = false,
            }
        }
    }

    /// Sample up to `n` distinct entries by walking buckets from a random
    /// start. Far cheaper than `n` calls to `random_entry`, and far less
    /// random: results are runs of neighbouring buckets.
    pub fn random_entries<R>(&self, n: usize, rng: &mut R) -> Vec<EntryRef>
    where
        R: Rng + ?Sized,
    {
        let count = n.min(self.len());
        let mut out = Vec::with_capacity(count);
        if count == 0 {
            return out;
        }
        let tables = if self.is_rehashing() { 2 } else { 1 };
        for table in &self.tables[..tables] {
            let capacity = table.capacity();
            if capacity == 0 {
                continue;
            }
            let mut i = rng.gen_range(0..capacity);
            for _ in 0..capacity {
                for k in self.chain(table.buckets[i]) {
                    out.push(self.entry_ref(k));
                    if out.len() == count {
                        return out;
                    }
                }
                i = (i + 1) & table.mask();
            }
        }
        out
    }

    /// Reverse-binary cursor scan. Start with `0`, feed back the returned
    /// cursor, stop when it comes back as `0`. Every entry present for the
    /// whole scan is visited at least once, even if the table grows or
    /// shrinks between calls; some may be visited more than once.
    pub fn scan<F>(&self, cursor: usize, mut visit: F) -> usize
    where
        F: FnMut(&K, &V),
    {
        if self.is_empty() {
            return 0;
        }
        let mut v = cursor;
        if !self.is_rehashing() {
            let t0 = &self.tables[0];
            let m0 = t0.mask();
            self.visit_bucket(t0.buckets[v & m0], &mut visit);
            return reverse_increment(v, m0);
        }
        let (small, large) = if self.tables[0].capacity() <= self.tables[1].capacity() {
            (&self.tables[0], &self.tables[1])
        } else {
            (&self.tables[1], &self.tables[0])
        };
        let m0 = small.mask();
        let m1 = large.mask();
        self.visit_bucket(small.buckets[v & m0], &mut visit);
        // Every large-table bucket that folds onto the small bucket, counted
        // in the same reversed order as the cursor itself. The carry out of
        // the high bits advances the m0 bits.
        loop {
            self.visit_bucket(large.buckets[v & m1], &mut visit);
            v = reverse_increment(v, m1);
            if v & (m0 ^ m1) == 0 {
                return v;
            }
        }
    }

    fn visit_bucket<F>(&self, head: Option<EntryKey>, visit: &mut F)
    where
        F: FnMut(&K, &V),
    {
        for k in self.chain(head) {
            let e = &self.entries[k];
            visit(&e.key, &e.value);
        }
    }
}

impl<K, V, S> Dict<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_config_and_hasher(DictConfig::default(), hasher)
    }

    pub fn with_config_and_hasher(config: DictConfig, hasher: S) -> Self {
        Self {
            id: DictId::next(),
            hasher,
            config,
            tables: [Table::default(), Table::default()],
            rehash_idx: None,
            safe_iterators: 0,
            entries: SlotMap::with_key(),
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Locate `q` without side effects: main table first, then the new one
    /// while migrating.
    fn lookup<Q>(&self, hash: u64, q: &Q) -> Option<(usize, EntryKey)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        if self.tables[0].capacity() == 0 {
            return None;
        }
        for t in 0..=1 {
            let table = &self.tables[t];
            let head = table.buckets[table.slot(hash)];
            for k in self.chain(head) {
                let e = &self.entries[k];
                if e.hash == hash && e.key.borrow() == q {
                    return Some((t, k));
                }
            }
            if !self.is_rehashing() {
                break;
            }
        }
        None
    }

    fn insert_new<F>(&mut self, hash: u64, key: K, value: F) -> Result<EntryRef, InsertError>
    where
        F: FnOnce() -> V,
    {
        self.expand_if_needed()?;
        let t = usize::from(self.is_rehashing());
        let slot = self.tables[t].slot(hash);
        let next = self.tables[t].buckets[slot];
        let k = self.entries.insert(Entry {
            key,
            value: value(),
            hash,
            next,
        });
        self.tables[t].buckets[slot] = Some(k);
        self.tables[t].used += 1;
        Ok(self.entry_ref(k))
    }

    /// Insert a new key. Fails without touching the table if the key exists.
    pub fn add(&mut self, key: K, value: V) -> Result<EntryRef, InsertError> {
        self.add_with(key, || value)
    }

    /// Like `add`, but only builds the value when the insert succeeds.
    pub fn add_with<F>(&mut self, key: K, value: F) -> Result<EntryRef, InsertError>
    where
        F: FnOnce() -> V,
    {
        if self.is_rehashing() {
            self.rehash_step();
        }
        let hash = self.make_hash(&key);
        if self.lookup(hash, &key).is_some() {
            return Err(InsertError::DuplicateKey);
        }
        self.insert_new(hash, key, value)
    }

    /// Insert or overwrite. The new value is stored before the old one is
    /// dropped.
    pub fn replace(&mut self, key: K, value: V) -> Result<Replaced, InsertError> {
        if self.is_rehashing() {
            self.rehash_step();
        }
        let hash = self.make_hash(&key);
        if let Some((_, k)) = self.lookup(hash, &key) {
            let old = core::mem::replace(&mut self.entries[k].value, value);
            drop(old);
            return Ok(Replaced::Updated);
        }
        self.insert_new(hash, key, || value).map(|_| Replaced::Inserted)
    }

    /// Find `q`, performing one migration step first while rehashing.
    pub fn find<Q>(&mut self, q: &Q) -> Option<EntryRef>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.tables[0].capacity() == 0 {
            return None;
        }
        if self.is_rehashing() {
            self.rehash_step();
        }
        let hash = self.make_hash(q);
        self.lookup(hash, q).map(|(_, k)| self.entry_ref(k))
    }

    pub fn get<Q>(&mut self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let e = self.find(q)?;
        self.entries.get(e.key).map(|e| &e.value)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let e = self.find(q)?;
        self.entries.get_mut(e.key).map(|e| &mut e.value)
    }

    /// Find `q` without advancing a migration.
    pub fn peek_entry<Q>(&self, q: &Q) -> Option<EntryRef>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.lookup(hash, q).map(|(_, k)| self.entry_ref(k))
    }

    /// Read `q`'s value without advancing a migration.
    pub fn peek<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.lookup(hash, q).map(|(_, k)| &self.entries[k].value)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.peek_entry(q).is_some()
    }

    /// Unlink `q` and hand the owned key and value back to the caller
    /// without dropping them.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.tables[0].capacity() == 0 {
            return None;
        }
        if self.is_rehashing() {
            self.rehash_step();
        }
        let hash = self.make_hash(q);
        let (t, k) = self.lookup(hash, q)?;
        self.unlink(t, hash, k)
    }

    /// Remove `q`, dropping its key and value. Returns whether it existed.
    pub fn delete<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove(q).is_some()
    }

    /// Remove the entry behind a handle, e.g. the one a safe iterator just
    /// returned.
    pub fn remove_entry(&mut self, entry: EntryRef) -> Option<(K, V)> {
        let target = entry.resolve(self)?;
        let hash = self.entries.get(target)?.hash;
        for t in 0..=1 {
            let table = &self.tables[t];
            if table.capacity() == 0 {
                continue;
            }
            if self.chain(table.buckets[table.slot(hash)]).any(|k| k == target) {
                return self.unlink(t, hash, target);
            }
        }
        None
    }

    fn unlink(&mut self, t: usize, hash: u64, target: EntryKey) -> Option<(K, V)> {
        let slot = self.tables[t].slot(hash);
        let mut prev: Option<EntryKey> = None;
        let mut cur = self.tables[t].buckets[slot];
        while let Some(k) = cur {
            let next = self.entries[k].next;
            if k == target {
                match prev {
                    Some(p) => self.entries[p].next = next,
                    None => self.tables[t].buckets[slot] = next,
                }
                self.tables[t].used -= 1;
                let entry = self.entries.remove(k)?;
                return Some((entry.key, entry.value));
            }
            prev = cur;
            cur = next;
        }
        None
    }

    /// Pick a random entry: a random non-empty bucket (across both arrays
    /// while migrating), then a random element of its chain. Entries in
    /// short chains are favoured; this is not uniform over entries.
    pub fn random_entry<R>(&mut self, rng: &mut R) -> Option<EntryRef>
    where
        R: Rng + ?Sized,
    {
        if self.is_empty() {
            return None;
        }
        if self.is_rehashing() {
            self.rehash_step();
        }
        let head = if self.is_rehashing() {
            let c0 = self.tables[0].capacity();
            let total = c0 + self.tables[1].capacity();
            loop {
                let h = rng.gen_range(0..total);
                let head = if h >= c0 {
                    self.tables[1].buckets[h - c0]
                } else {
                    self.tables[0].buckets[h]
                };
                if head.is_some() {
                    break head;
                }
            }
        } else {
            let t0 = &self.tables[0];
            loop {
                let head = t0.buckets[rng.gen_range(0..t0.capacity())];
                if head.is_some() {
                    break head;
                }
            }
        };
        let len = self.chain(head).count();
        let pick = rng.gen_range(0..len);
        self.chain(head).nth(pick).map(|k| self.entry_ref(k))
    }
}

impl<K, V, S> fmt::Debug for Dict<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
