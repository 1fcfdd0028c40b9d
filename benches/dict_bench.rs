use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;
use zset_index::{Dict, DictConfig};

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn filled(seed: u64, n: usize) -> Dict<String, u64> {
    let mut d = Dict::new();
    for (i, x) in lcg(seed).take(n).enumerate() {
        let _ = d.add(key(x), i as u64);
    }
    while d.rehash(100) {}
    d
}

fn bench_add_fresh_100k(c: &mut Criterion) {
    c.bench_function("dict::add_fresh_100k", |b| {
        b.iter_batched(
            Dict::<String, u64>::new,
            |mut d| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    let _ = d.add(key(x), i as u64).unwrap();
                }
                black_box(d)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_add_presized_100k(c: &mut Criterion) {
    c.bench_function("dict::add_presized_100k", |b| {
        b.iter_batched(
            || {
                let mut d = Dict::<String, u64>::with_config(DictConfig {
                    initial_capacity: 1 << 17,
                    ..DictConfig::default()
                });
                let _ = d.expand(1 << 17);
                d
            },
            |mut d| {
                for (i, x) in lcg(2).take(100_000).enumerate() {
                    let _ = d.add(key(x), i as u64).unwrap();
                }
                black_box(d)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_find_hit_100k(c: &mut Criterion) {
    let mut d = filled(3, 100_000);
    let keys: Vec<String> = lcg(3).take(100_000).map(key).collect();
    c.bench_function("dict::find_hit_100k", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for k in &keys {
                sum = sum.wrapping_add(*d.get(k.as_str()).unwrap());
            }
            black_box(sum)
        })
    });
}

fn bench_find_miss_100k(c: &mut Criterion) {
    let d = filled(4, 100_000);
    let keys: Vec<String> = lcg(40).take(100_000).map(key).collect();
    c.bench_function("dict::peek_miss_100k", |b| {
        b.iter(|| {
            let mut hits = 0usize;
            for k in &keys {
                hits += d.contains_key(k.as_str()) as usize;
            }
            black_box(hits)
        })
    });
}

fn bench_rehash_drain(c: &mut Criterion) {
    c.bench_function("dict::rehash_drain_100k_to_256k", |b| {
        b.iter_batched(
            || {
                let mut d = filled(5, 100_000);
                d.expand(1 << 18).unwrap();
                d
            },
            |mut d| {
                while d.rehash(100) {}
                black_box(d)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_scan_100k(c: &mut Criterion) {
    let d = filled(6, 100_000);
    c.bench_function("dict::scan_full_100k", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            let mut cursor = 0;
            loop {
                cursor = d.scan(cursor, |_, v| sum = sum.wrapping_add(*v));
                if cursor == 0 {
                    break;
                }
            }
            black_box(sum)
        })
    });
}

fn bench_iter_100k(c: &mut Criterion) {
    let d = filled(7, 100_000);
    c.bench_function("dict::iter_sum_100k", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for v in d.values() {
                sum = sum.wrapping_add(*v);
            }
            black_box(sum)
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_insert;
    config = bench_config();
    targets = bench_add_fresh_100k, bench_add_presized_100k
}

criterion_group! {
    name = benches_lookup;
    config = bench_config();
    targets = bench_find_hit_100k, bench_find_miss_100k
}

criterion_group! {
    name = benches_maintenance;
    config = bench_config();
    targets = bench_rehash_drain, bench_scan_100k, bench_iter_100k
}

criterion_main!(benches_insert, benches_lookup, benches_maintenance);
