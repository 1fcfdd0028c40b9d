#![cfg(test)]

// Property tests for Dict kept inside the crate so they can reach the
// iterator constructors and table stats without extra plumbing.

use crate::config::DictConfig;
use crate::dict::{Dict, Replaced};
use crate::error::InsertError;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug)]
enum Op {
    Add(usize, i32),
    Replace(usize, i32),
    Delete(usize),
    Remove(usize),
    Find(usize),
    Peek(usize),
    Rehash(usize),
    Resize,
    Expand(usize),
    SafeSweep(i32),
    Scan,
    // Scan `at` calls, then resize (target 0) or expand to `target`, then
    // keep scanning with `steps` migration steps between calls.
    ScanAcrossResize { at: usize, target: usize, steps: usize },
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=40).prop_flat_map(|pool| {
        let idx = 0..pool.len();
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Add(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Replace(i, v)),
            2 => idx.clone().prop_map(Op::Delete),
            1 => idx.clone().prop_map(Op::Remove),
            2 => idx.clone().prop_map(Op::Find),
            1 => idx.clone().prop_map(Op::Peek),
            1 => (1usize..8).prop_map(Op::Rehash),
            1 => Just(Op::Resize),
            1 => (0usize..128).prop_map(Op::Expand),
            1 => (2i32..5).prop_map(Op::SafeSweep),
            1 => Just(Op::Scan),
            2 => (1usize..6, prop_oneof![Just(0usize), 1usize..256], 0usize..3)
                .prop_map(|(at, target, steps)| Op::ScanAcrossResize { at, target, steps }),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn snapshot(d: &Dict<Key, i32>) -> HashMap<Key, i32> {
    d.iter().map(|(k, v)| (k.clone(), *v)).collect()
}

// Property: state-machine equivalence against std::collections::HashMap,
// with migrations, explicit resizes, safe-iterator deletion sweeps and full
// scans interleaved.
// - Duplicate adds are rejected; replace reports insert vs update.
// - Every key lives in exactly one table; per-table counts add up to `len`.
// - Iteration yields each live entry exactly once.
// - A full scan visits every key present for the whole scan, including when
//   the table is resized partway through it.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let mut sut: Dict<Key, i32> = Dict::with_config(DictConfig {
            initial_capacity: 2,
            empty_visits_per_step: 2,
            ..DictConfig::default()
        });
        let mut model: HashMap<Key, i32> = HashMap::new();

        for op in ops {
            match op {
                Op::Add(i, v) => {
                    let k = Key(pool[i].clone());
                    let already = model.contains_key(&k);
                    match sut.add(k.clone(), v) {
                        Ok(e) => {
                            prop_assert!(!already, "add must fail on duplicate");
                            prop_assert_eq!(e.value(&sut), Some(&v));
                            model.insert(k, v);
                        }
                        Err(InsertError::DuplicateKey) => prop_assert!(already),
                        Err(e) => prop_assert!(false, "unexpected error {:?}", e),
                    }
                }
                Op::Replace(i, v) => {
                    let k = Key(pool[i].clone());
                    let expect = if model.insert(k.clone(), v).is_some() {
                        Replaced::Updated
                    } else {
                        Replaced::Inserted
                    };
                    prop_assert_eq!(sut.replace(k, v).unwrap(), expect);
                }
                Op::Delete(i) => {
                    let k = pool[i].as_str();
                    prop_assert_eq!(sut.delete(k), model.remove(k).is_some());
                }
                Op::Remove(i) => {
                    let k = pool[i].as_str();
                    let got = sut.remove(k).map(|(k, v)| (k.0, v));
                    let want = model.remove(k).map(|v| (k.to_string(), v));
                    prop_assert_eq!(got, want);
                }
                Op::Find(i) => {
                    let k = pool[i].as_str();
                    prop_assert_eq!(sut.get(k).copied(), model.get(k).copied());
                }
                Op::Peek(i) => {
                    let k = pool[i].as_str();
                    prop_assert_eq!(sut.peek(k).copied(), model.get(k).copied());
                    prop_assert_eq!(sut.contains_key(k), model.contains_key(k));
                }
                Op::Rehash(n) => {
                    let was = sut.is_rehashing();
                    let more = sut.rehash(n);
                    prop_assert!(was || !more);
                    prop_assert_eq!(more, sut.is_rehashing());
                }
                Op::Resize => {
                    let _ = sut.resize();
                }
                Op::Expand(n) => {
                    let _ = sut.expand(n);
                }
                Op::SafeSweep(m) => {
                    // Delete every entry whose value is a multiple of m while
                    // walking with a safe iterator.
                    let cursor = sut.stats().rehash_cursor;
                    let mut it = sut.safe_iter();
                    let mut seen = BTreeSet::new();
                    while let Some(e) = it.next(&mut sut) {
                        let (k, v) = e.pair(&sut).map(|(k, v)| (k.clone(), *v)).unwrap();
                        prop_assert!(seen.insert(k.clone()), "safe iterator repeated {:?}", k);
                        if v % m == 0 {
                            prop_assert!(sut.remove_entry(e).is_some());
                            model.remove(&k);
                        }
                        prop_assert_eq!(sut.stats().rehash_cursor, cursor);
                    }
                    it.release(&mut sut);
                    prop_assert_eq!(sut.safe_iterators(), 0);
                }
                Op::Scan => {
                    let mut seen = BTreeSet::new();
                    let mut cursor = 0;
                    loop {
                        cursor = sut.scan(cursor, |k, _| { seen.insert(k.clone()); });
                        if cursor == 0 {
                            break;
                        }
                    }
                    let want: BTreeSet<Key> = model.keys().cloned().collect();
                    prop_assert_eq!(seen, want);
                }
                Op::ScanAcrossResize { at, target, steps } => {
                    let want: BTreeSet<Key> = model.keys().cloned().collect();
                    let mut seen = BTreeSet::new();
                    let mut cursor = 0;
                    let mut calls = 0;
                    loop {
                        cursor = sut.scan(cursor, |k, _| { seen.insert(k.clone()); });
                        if cursor == 0 {
                            break;
                        }
                        calls += 1;
                        if calls == at {
                            while sut.rehash(100) {}
                            let _ = match target {
                                0 => sut.resize(),
                                n => sut.expand(n),
                            };
                        } else if calls > at {
                            sut.rehash(steps);
                        }
                    }
                    let missed: Vec<&Key> = want.difference(&seen).collect();
                    prop_assert!(missed.is_empty(), "scan missed {:?}", missed);
                }
            }

            let stats = sut.stats();
            prop_assert_eq!(stats.main_used + stats.rehash_used, sut.len());
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(stats.rehash_cursor.is_some(), stats.rehash_capacity > 0);
            prop_assert_eq!(snapshot(&sut), model.clone());
            prop_assert_eq!(sut.iter().count(), model.len());
        }
    }
}
