//! Iteration over a [`Dict`].
//!
//! Three flavours:
//! - `Iter` borrows the table; the borrow checker forbids mutation.
//! - `SafeIter` is detached and registers with the table so migration is
//!   suspended; the caller may add, delete or look up between steps.
//! - `FingerprintIter` is detached and unregistered; on release it asserts
//!   the table's structure did not change.
//!
//! Detached iterators are linear: a started `SafeIter` must be handed back
//! through `release`, otherwise its drop panics. Both remember the table
//! that created them and panic when stepped or released against another.

use crate::dict::{Cursor, Dict, DictId, EntryRef};

/// Borrowing iterator over `(&K, &V)`.
pub struct Iter<'a, K, V, S> {
    dict: &'a Dict<K, V, S>,
    cursor: Cursor,
    remaining: usize,
}

impl<'a, K, V, S> Iter<'a, K, V, S> {
    pub(crate) fn new(dict: &'a Dict<K, V, S>) -> Self {
        Self {
            dict,
            cursor: Cursor::default(),
            remaining: dict.len(),
        }
    }
}

impl<'a, K, V, S> Iterator for Iter<'a, K, V, S> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let dict = self.dict;
        let k = dict.advance(&mut self.cursor)?;
        self.remaining = self.remaining.saturating_sub(1);
        dict.entries.get(k).map(|e| (&e.key, &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V, S> ExactSizeIterator for Iter<'a, K, V, S> {}

impl<'a, K, V, S> IntoIterator for &'a Dict<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Detached iterator that keeps the table from migrating while it is live.
///
/// The next entry is remembered before the current one is yielded, so the
/// caller may delete the entry it was just handed.
#[derive(Debug)]
pub struct SafeIter {
    owner: DictId,
    cursor: Cursor,
    registered: bool,
}

impl SafeIter {
    pub(crate) fn new(owner: DictId) -> Self {
        Self {
            owner,
            cursor: Cursor::default(),
            registered: false,
        }
    }

    /// Yield the next entry. The first call registers with `dict`.
    pub fn next<K, V, S>(&mut self, dict: &mut Dict<K, V, S>) -> Option<EntryRef> {
        assert_eq!(self.owner, dict.id, "safe iterator stepped on a foreign table");
        if !self.registered {
            dict.safe_iterators += 1;
            self.registered = true;
        }
        dict.advance(&mut self.cursor).map(|k| dict.entry_ref(k))
    }

    /// Unregister from `dict`, letting migration resume.
    pub fn release<K, V, S>(mut self, dict: &mut Dict<K, V, S>) {
        assert_eq!(self.owner, dict.id, "safe iterator released on a foreign table");
        if self.registered {
            assert!(dict.safe_iterators > 0, "safe iterator count underflow");
            dict.safe_iterators -= 1;
            self.registered = false;
        }
    }
}

impl Drop for SafeIter {
    fn drop(&mut self) {
        if self.registered && !std::thread::panicking() {
            panic!("SafeIter dropped without release");
        }
    }
}

/// Detached iterator for callers that promise not to mutate the table.
#[derive(Debug)]
pub struct FingerprintIter {
    owner: DictId,
    cursor: Cursor,
    fingerprint: Option<u64>,
}

impl FingerprintIter {
    pub(crate) fn new(owner: DictId) -> Self {
        Self {
            owner,
            cursor: Cursor::default(),
            fingerprint: None,
        }
    }

    /// Yield the next entry. The first call records the table fingerprint.
    pub fn next<K, V, S>(&mut self, dict: &Dict<K, V, S>) -> Option<EntryRef> {
        assert_eq!(self.owner, dict.id, "fingerprint iterator stepped on a foreign table");
        if self.fingerprint.is_none() {
            self.fingerprint = Some(dict.fingerprint());
        }
        dict.advance(&mut self.cursor).map(|k| dict.entry_ref(k))
    }

    /// Finish iterating. Panics if the table was structurally modified since
    /// the first `next`.
    pub fn release<K, V, S>(self, dict: &Dict<K, V, S>) {
        assert_eq!(self.owner, dict.id, "fingerprint iterator released on a foreign table");
        if let Some(fp) = self.fingerprint {
            assert_eq!(
                fp,
                dict.fingerprint(),
                "table modified during fingerprint-checked iteration"
            );
        }
    }
}
