use chained_hashset::policy::{DefaultKeyEqual, SetKeyPolicy};
use chained_hashset::table::HashTable;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::collections::hash_map::RandomState;
use std::time::Duration;

type Table = HashTable<SetKeyPolicy<u64>, RandomState, DefaultKeyEqual>;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn table(max_load_factor: f32) -> Table {
    HashTable::new(RandomState::new(), DefaultKeyEqual, 0, max_load_factor)
}

fn filled(seed: u64, n: usize, max_load_factor: f32) -> Table {
    let mut t = table(max_load_factor);
    for x in lcg(seed).take(n) {
        t.insert_if_missing(x);
    }
    t
}

// Rehash walks the global list and reuses cached hashes.
fn bench_rehash_100k(c: &mut Criterion) {
    c.bench_function("table::rehash_grow_100k", |b| {
        b.iter_batched(
            || filled(1, 100_000, 1.0),
            |mut t| {
                t.rehash_for_num_buckets(t.bucket_count() * 4);
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("table::rehash_shrink_100k", |b| {
        b.iter_batched(
            || {
                let mut t = filled(2, 100_000, 1.0);
                t.rehash_for_num_buckets(1 << 20);
                t
            },
            |mut t| {
                t.rehash_for_num_buckets(100_000);
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

// Longer chains under a high max load factor.
fn bench_find_by_load_factor(c: &mut Criterion) {
    for mlf in [0.5f32, 1.0, 4.0] {
        c.bench_function(&format!("table::find_hit_10k_on_100k_mlf_{}", mlf), |b| {
            let t = filled(3, 100_000, mlf);
            let queries: Vec<u64> = lcg(3).step_by(10).take(10_000).collect();
            b.iter(|| {
                for q in &queries {
                    black_box(t.find(q));
                }
            })
        });
    }
}

fn bench_retain_half_100k(c: &mut Criterion) {
    c.bench_function("table::retain_half_100k", |b| {
        b.iter_batched(
            || filled(4, 100_000, 1.0),
            |mut t| {
                t.retain(|v| v & 1 == 0);
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_table;
    config = bench_config();
    targets = bench_rehash_100k, bench_find_by_load_factor, bench_retain_half_100k
}
criterion_main!(benches_table);
