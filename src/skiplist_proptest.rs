#![cfg(test)]

// Property tests for SkipList against a BTreeSet model. Scores are drawn
// from a small integer range so ties (and therefore member ordering) are
// common.

use crate::config::SkipListConfig;
use crate::range::ScoreRange;
use crate::skiplist::SkipList;
use proptest::prelude::*;
use std::collections::BTreeSet;

#[derive(Clone, Debug)]
enum Op {
    Insert(i8, u8),
    Delete(i8, u8),
    UpdateScore(usize, i8),
    DeleteRangeByScore(i8, i8, bool, bool),
    DeleteRangeByRank(usize, usize),
    Query(i8, i8, bool, bool),
    Rank(usize),
}

fn arb_ops() -> impl Strategy<Value = (u64, Vec<Op>)> {
    let score = -8i8..8;
    let member = 0u8..24;
    let op = prop_oneof![
        6 => (score.clone(), member.clone()).prop_map(|(s, m)| Op::Insert(s, m)),
        2 => (score.clone(), member).prop_map(|(s, m)| Op::Delete(s, m)),
        2 => (0usize..64, score.clone()).prop_map(|(r, s)| Op::UpdateScore(r, s)),
        1 => (score.clone(), score.clone(), any::<bool>(), any::<bool>())
            .prop_map(|(a, b, x, y)| Op::DeleteRangeByScore(a, b, x, y)),
        1 => (0usize..40, 0usize..40).prop_map(|(a, b)| Op::DeleteRangeByRank(a, b)),
        2 => (score.clone(), score, any::<bool>(), any::<bool>())
            .prop_map(|(a, b, x, y)| Op::Query(a, b, x, y)),
        2 => (0usize..64).prop_map(Op::Rank),
    ];
    (any::<u64>(), proptest::collection::vec(op, 1..150))
}

// Model element: integer score then member, which orders exactly like the
// skip list's `(f64 score, member)` for these inputs.
type Model = BTreeSet<(i8, u8)>;

fn range(a: i8, b: i8, min_exclusive: bool, max_exclusive: bool) -> ScoreRange {
    ScoreRange {
        min: a as f64,
        max: b as f64,
        min_exclusive,
        max_exclusive,
    }
}

fn in_range(r: &ScoreRange, s: i8) -> bool {
    r.contains(s as f64)
}

// Property: after every operation the list matches the model element for
// element, spans are exact, and rank queries agree with model positions.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_matches_sorted_model((seed, ops) in arb_ops()) {
        let mut sut: SkipList<u8> = SkipList::with_config(SkipListConfig {
            p: 0.5,
            seed: Some(seed),
            ..SkipListConfig::default()
        });
        let mut model = Model::new();

        for op in ops {
            match op {
                Op::Insert(s, m) => {
                    if model.insert((s, m)) {
                        sut.insert(s as f64, m);
                    }
                }
                Op::Delete(s, m) => {
                    prop_assert_eq!(sut.delete(s as f64, &m), model.remove(&(s, m)));
                }
                Op::UpdateScore(r, s) => {
                    if let Some(&(old, m)) = model.iter().nth(r) {
                        if !model.contains(&(s, m)) || s == old {
                            let node = sut.update_score(old as f64, &m, s as f64);
                            model.remove(&(old, m));
                            model.insert((s, m));
                            let want = model.iter().position(|&e| e == (s, m)).unwrap() + 1;
                            prop_assert_eq!(sut.rank_of_node(node), Some(want));
                        }
                    }
                }
                Op::DeleteRangeByScore(a, b, x, y) => {
                    let r = range(a, b, x, y);
                    let mut gone = Vec::new();
                    let n = sut.delete_range_by_score(&r, |m, s| gone.push((s as i8, m)));
                    let want: Vec<(i8, u8)> = if r.is_empty() {
                        Vec::new()
                    } else {
                        model.iter().copied().filter(|&(s, _)| in_range(&r, s)).collect()
                    };
                    prop_assert_eq!(n, want.len());
                    prop_assert_eq!(&gone, &want);
                    for e in want {
                        model.remove(&e);
                    }
                }
                Op::DeleteRangeByRank(a, b) => {
                    let mut gone = Vec::new();
                    let n = sut.delete_range_by_rank(a, b, |m, s| gone.push((s as i8, m)));
                    let want: Vec<(i8, u8)> = if a == 0 || a > b {
                        Vec::new()
                    } else {
                        model.iter().copied().skip(a - 1).take(b - a + 1).collect()
                    };
                    prop_assert_eq!(n, want.len());
                    prop_assert_eq!(&gone, &want);
                    for e in want {
                        model.remove(&e);
                    }
                }
                Op::Query(a, b, x, y) => {
                    let r = range(a, b, x, y);
                    let hits: Vec<(i8, u8)> = if r.is_empty() {
                        Vec::new()
                    } else {
                        model.iter().copied().filter(|&(s, _)| in_range(&r, s)).collect()
                    };
                    let first = sut
                        .first_in_range(&r)
                        .map(|n| (n.score(&sut).unwrap() as i8, *n.member(&sut).unwrap()));
                    let last = sut
                        .last_in_range(&r)
                        .map(|n| (n.score(&sut).unwrap() as i8, *n.member(&sut).unwrap()));
                    prop_assert_eq!(first, hits.first().copied());
                    prop_assert_eq!(last, hits.last().copied());
                }
                Op::Rank(r) => {
                    let want = model.iter().nth(r.wrapping_sub(1)).copied().filter(|_| r > 0);
                    let got = sut
                        .element_at_rank(r)
                        .map(|n| (n.score(&sut).unwrap() as i8, *n.member(&sut).unwrap()));
                    prop_assert_eq!(got, want);
                    if let Some((s, m)) = want {
                        prop_assert_eq!(sut.rank_of(s as f64, &m), Some(r));
                    }
                }
            }

            sut.check_invariants();
            let got: Vec<(i8, u8)> = sut.iter().map(|(m, s)| (s as i8, *m)).collect();
            let want: Vec<(i8, u8)> = model.iter().copied().collect();
            prop_assert_eq!(got, want);
        }
    }
}
