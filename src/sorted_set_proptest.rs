#![cfg(test)]

// Property tests for SortedSet: the member table and the ranked index must
// agree after every operation, and both must agree with a plain model.

use crate::config::{DictConfig, SkipListConfig};
use crate::range::ScoreRange;
use crate::sorted_set::{SortedSet, Upsert};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Clone, Debug)]
enum Op {
    Upsert(u8, i8),
    Remove(u8),
    Incr(u8, i8),
    DeleteRangeByScore(i8, i8),
    DeleteRangeByRank(usize, usize),
    PopMin(usize),
    PopMax(usize),
    Resize,
    Rehash,
}

fn arb_ops() -> impl Strategy<Value = (u64, Vec<Op>)> {
    let member = 0u8..48;
    let score = -10i8..10;
    let op = prop_oneof![
        8 => (member.clone(), score.clone()).prop_map(|(m, s)| Op::Upsert(m, s)),
        3 => member.clone().prop_map(Op::Remove),
        2 => (member, score.clone()).prop_map(|(m, d)| Op::Incr(m, d)),
        1 => (score.clone(), score).prop_map(|(a, b)| Op::DeleteRangeByScore(a, b)),
        1 => (0usize..20, 0usize..20).prop_map(|(a, b)| Op::DeleteRangeByRank(a, b)),
        1 => (0usize..4).prop_map(Op::PopMin),
        1 => (0usize..4).prop_map(Op::PopMax),
        1 => Just(Op::Resize),
        1 => Just(Op::Rehash),
    ];
    (any::<u64>(), proptest::collection::vec(op, 1..200))
}

fn sorted(model: &BTreeMap<u8, f64>) -> Vec<(u8, f64)> {
    let mut v: Vec<(u8, f64)> = model.iter().map(|(&m, &s)| (m, s)).collect();
    v.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    v
}

// Property: table-set equivalence and rank/score consistency under random
// upsert/remove/range-delete/pop sequences with resizes interleaved.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_composite_consistent((seed, ops) in arb_ops()) {
        let mut sut: SortedSet<u8> = SortedSet::with_config(
            DictConfig { initial_capacity: 1, ..DictConfig::default() },
            SkipListConfig { seed: Some(seed), ..SkipListConfig::default() },
        );
        let mut model: BTreeMap<u8, f64> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Upsert(m, s) => {
                    let s = f64::from(s);
                    let want = match model.insert(m, s) {
                        None => Upsert::Inserted,
                        Some(old) if old == s => Upsert::Unchanged,
                        Some(_) => Upsert::Updated,
                    };
                    let len_before = sut.ranked().len();
                    prop_assert_eq!(sut.upsert(m, s).unwrap(), want);
                    if want != Upsert::Inserted {
                        prop_assert_eq!(sut.ranked().len(), len_before);
                    }
                }
                Op::Remove(m) => {
                    prop_assert_eq!(sut.remove(&m), model.remove(&m).is_some());
                }
                Op::Incr(m, d) => {
                    let want = model.get(&m).copied().unwrap_or(0.0) + f64::from(d);
                    prop_assert_eq!(sut.incr_by(m, f64::from(d)).unwrap(), want);
                    model.insert(m, want);
                }
                Op::DeleteRangeByScore(a, b) => {
                    let r = ScoreRange::new(f64::from(a), f64::from(b));
                    let n = sut.delete_range_by_score(&r);
                    let before = model.len();
                    model.retain(|_, s| !r.contains(*s));
                    prop_assert_eq!(n, before - model.len());
                }
                Op::DeleteRangeByRank(a, b) => {
                    let n = sut.delete_range_by_rank(a, b);
                    let doomed: Vec<u8> = if a == 0 || a > b {
                        Vec::new()
                    } else {
                        sorted(&model).into_iter().skip(a - 1).take(b - a + 1).map(|(m, _)| m).collect()
                    };
                    prop_assert_eq!(n, doomed.len());
                    for m in doomed {
                        model.remove(&m);
                    }
                }
                Op::PopMin(n) => {
                    let want: Vec<(u8, f64)> = sorted(&model).into_iter().take(n).collect();
                    prop_assert_eq!(sut.pop_min(n), want.clone());
                    for (m, _) in want {
                        model.remove(&m);
                    }
                }
                Op::PopMax(n) => {
                    let want: Vec<(u8, f64)> = sorted(&model).into_iter().rev().take(n).collect();
                    prop_assert_eq!(sut.pop_max(n), want.clone());
                    for (m, _) in want {
                        model.remove(&m);
                    }
                }
                Op::Resize => {
                    let _ = sut.resize();
                }
                Op::Rehash => {
                    sut.rehash_for(Duration::from_millis(5));
                }
            }

            sut.check_consistency();
            let want = sorted(&model);
            let got: Vec<(u8, f64)> = sut.iter().map(|(&m, s)| (m, s)).collect();
            prop_assert_eq!(&got, &want);
            for (i, (m, s)) in want.iter().enumerate() {
                prop_assert_eq!(sut.score_of(m), Some(*s));
                prop_assert_eq!(sut.rank_of(m), Some(i + 1));
            }
        }
    }
}
