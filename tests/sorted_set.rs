// SortedSet integration suite.
//
// The central invariant: for every member m, m is in the table iff m is in
// the ranked index, and the table's score for m equals the score on m's
// node. Every test ends with `check_consistency`, which also validates the
// skip list's spans.
use std::sync::Arc;
use zset_index::{
    DictConfig, LexRange, ScoreRange, SkipListConfig, SortedSet, Upsert,
};

fn members<'a>(it: impl Iterator<Item = (&'a String, f64)>) -> Vec<&'a str> {
    it.map(|(m, _)| m.as_str()).collect()
}

fn seeded() -> SortedSet<String> {
    SortedSet::with_config(
        DictConfig::default(),
        SkipListConfig {
            seed: Some(11),
            ..SkipListConfig::default()
        },
    )
}

// Test: insertion order does not leak into rank order.
#[test]
fn range_by_rank_is_score_ordered() {
    let mut z = seeded();
    z.upsert("c".to_string(), 3.0).unwrap();
    z.upsert("a".to_string(), 1.0).unwrap();
    z.upsert("b".to_string(), 2.0).unwrap();
    assert_eq!(members(z.range_by_rank(1, 3)), ["a", "b", "c"]);
    assert!(members(z.range_by_rank(4, 9)).is_empty());
    assert!(members(z.range_by_rank(0, 0)).is_empty());
    z.check_consistency();
}

// Test: a score change is an update, not a second insert.
#[test]
fn upsert_existing_member_moves_it() {
    let mut z = seeded();
    for (m, s) in [("a", 1.0), ("b", 2.0), ("c", 3.0)] {
        z.upsert(m.to_string(), s).unwrap();
    }
    assert_eq!(z.rank_of("a"), Some(1));
    assert_eq!(z.upsert("a".to_string(), 5.0), Ok(Upsert::Updated));
    assert_eq!(z.rank_of("a"), Some(3));
    assert_eq!(z.ranked().len(), 3);
    assert_eq!(z.dict().len(), 3);
    assert_eq!(z.score_of("a"), Some(5.0));
    z.check_consistency();
}

// Test: rank-window deletes hit exactly the requested ranks in both
// structures.
#[test]
fn delete_range_by_rank_removes_from_both() {
    let mut z = seeded();
    for (i, m) in ["a", "b", "c", "d", "e"].iter().enumerate() {
        z.upsert(m.to_string(), i as f64).unwrap();
    }
    assert_eq!(z.delete_range_by_rank(2, 3), 2);
    assert_eq!(members(z.iter()), ["a", "d", "e"]);
    assert!(!z.contains("b"));
    assert!(!z.contains("c"));
    assert_eq!(z.dict().len(), 3);
    z.check_consistency();
}

// Test: element_at_rank boundaries.
#[test]
fn element_at_rank_edges() {
    let mut z = seeded();
    for (i, m) in ["a", "b", "c"].iter().enumerate() {
        z.upsert(m.to_string(), i as f64).unwrap();
    }
    let list = z.ranked();
    assert!(list.element_at_rank(0).is_none());
    let tail = list.element_at_rank(list.len()).unwrap();
    assert_eq!(tail.member(list).map(String::as_str), Some("c"));
    assert_eq!(Some(tail), list.last());
    assert!(list.element_at_rank(list.len() + 1).is_none());
}

// Test: score-range deletes keep the table in step.
#[test]
fn delete_range_by_score_removes_from_both() {
    let mut z = seeded();
    for i in 0..100 {
        z.upsert(format!("m{i:03}"), f64::from(i)).unwrap();
    }
    let r = ScoreRange::parse("(10", "20").unwrap();
    assert_eq!(z.count_in_range(&r), 10);
    assert_eq!(z.delete_range_by_score(&r), 10);
    assert_eq!(z.len(), 90);
    assert!(z.contains("m010"));
    assert!(!z.contains("m011"));
    assert!(!z.contains("m020"));
    assert_eq!(z.delete_range_by_score(&ScoreRange::exclusive(5.0, 5.0)), 0);
    z.check_consistency();
}

// Test: lexicographic queries over a same-score set.
#[test]
fn lex_range_queries() {
    let mut z = seeded();
    for m in ["apple", "banana", "cherry", "date", "elder"] {
        z.upsert(m.to_string(), 0.0).unwrap();
    }
    let r: LexRange<String> = LexRange::parse("[b", "(d").unwrap();
    assert_eq!(members(z.range_by_lex(&r)), ["banana", "cherry"]);
    assert_eq!(z.count_in_lex_range(&r), 2);
    let all = LexRange::parse("-", "+").unwrap();
    assert_eq!(members(z.rev_range_by_lex(&all)).len(), 5);
}

// Test: a large workload with a slow-growing table, interleaved removals
// and maintenance keeps both structures consistent and migrations drain.
#[test]
fn churn_with_maintenance() {
    let mut z: SortedSet<Arc<str>> = SortedSet::with_config(
        DictConfig {
            initial_capacity: 1,
            ..DictConfig::default()
        },
        SkipListConfig {
            seed: Some(5),
            ..SkipListConfig::default()
        },
    );
    for i in 0..5_000u32 {
        let m: Arc<str> = Arc::from(format!("m{i}"));
        z.upsert(m, f64::from(i % 97)).unwrap();
    }
    for i in (0..5_000u32).step_by(3) {
        assert!(z.remove(format!("m{i}").as_str()));
    }
    z.check_consistency();
    z.rehash_for(std::time::Duration::from_secs(5));
    if z.needs_maintenance() {
        z.resize().unwrap();
        z.rehash_for(std::time::Duration::from_secs(5));
    }
    assert!(z.stats().dict.rehash_cursor.is_none());
    z.check_consistency();

    let mut last = f64::NEG_INFINITY;
    for (_, s) in z.iter() {
        assert!(s >= last);
        last = s;
    }
    let popped = z.pop_min(10);
    assert_eq!(popped.len(), 10);
    assert!(popped.iter().all(|(_, s)| *s == 0.0));
    z.check_consistency();
}
