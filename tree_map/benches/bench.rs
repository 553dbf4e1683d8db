use core::hint::black_box;
use core::time::Duration;
use std::collections::BTreeMap;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tree_map::TreeMap;

// Sorted keys turn the tree into a list, so every size here uses shuffled keys.
const SIZES: [usize; 4] = [100, 1_000, 10_000, 100_000];

fn insert(c: &mut Criterion) {
    let mut g = c.benchmark_group("insert_new");

    macro_rules! bench {
        ($name:expr, $count:expr, $keys:expr, $($map:tt)*) => {
            g.bench_with_input(BenchmarkId::new($name, $count), &$count, |b, _i| {
                b.iter(|| {
                    let mut map = $($map)*::new();
                    for &x in $keys.iter() {
                        map.insert(x, x);
                    }
                    map
                })
            });
        };
    }

    for count in SIZES {
        let keys = gen_unique_keys_int(count, true);
        bench!("std_btree", count, keys, BTreeMap);
        bench!("tree_map", count, keys, TreeMap);
    }
}

fn get(c: &mut Criterion) {
    let mut g = c.benchmark_group("get_existing");

    macro_rules! bench {
        ($name:expr, $count:expr, $keys:expr, $access_keys:expr, $map:ident) => {
            let map = $keys.iter().map(|&x| (x, x)).collect::<$map<_, _>>();
            g.bench_with_input(BenchmarkId::new($name, $count), &$count, |b, _c| {
                b.iter(|| {
                    for k in $access_keys.iter() {
                        black_box(map.get(black_box(k)));
                    }
                })
            });
        };
    }

    for count in SIZES {
        let keys = gen_unique_keys_int(count, true);
        let access_keys = sample_keys(&keys, count.min(1000));
        bench!("std_btree", count, keys, access_keys, BTreeMap);
        bench!("tree_map", count, keys, access_keys, TreeMap);
    }
}

fn walk(c: &mut Criterion) {
    let mut g = c.benchmark_group("walk");

    for count in SIZES {
        let keys = gen_unique_keys_int(count, true);
        let map = keys.iter().map(|&x| (x, x)).collect::<TreeMap<_, _>>();

        g.bench_with_input(BenchmarkId::new("iter", count), &count, |b, _c| {
            b.iter(|| black_box(map.iter().map(|(_, v)| *v as i64).sum::<i64>()))
        });

        g.bench_with_input(BenchmarkId::new("cursor", count), &count, |b, _c| {
            b.iter(|| {
                let mut sum = 0i64;
                let mut cursor = map.begin();
                while let Ok(v) = cursor.value() {
                    sum += *v as i64;
                    let _ = cursor.move_next();
                }
                black_box(sum)
            })
        });
    }
}

fn remove(c: &mut Criterion) {
    let mut g = c.benchmark_group("remove");

    macro_rules! bench {
        ($name:expr, $count:expr, $keys:expr, $remove_keys:expr, $map:ident) => {
            let map = $keys.iter().map(|&x| (x, x)).collect::<$map<_, _>>();
            g.bench_with_input(BenchmarkId::new($name, $count), &$count, |b, _c| {
                b.iter_batched_ref(
                    || map.clone(),
                    |map| {
                        for k in $remove_keys.iter() {
                            black_box(map.remove(k));
                        }
                    },
                    criterion::BatchSize::LargeInput,
                )
            });
        };
    }

    for count in SIZES {
        let keys = gen_unique_keys_int(count, true);
        let remove_keys = sample_keys(&keys, count / 2);
        bench!("std_btree", count, keys, remove_keys, BTreeMap);
        bench!("tree_map", count, keys, remove_keys, TreeMap);
    }
}

pub fn gen_unique_keys_int(count: usize, random: bool) -> Vec<i32> {
    let mut keys = (0..count as i32).collect::<Vec<_>>();
    if random {
        let mut rng = ChaCha8Rng::seed_from_u64(123);
        keys.shuffle(&mut rng);
    }
    keys
}

pub fn sample_keys(keys: &[i32], count: usize) -> Vec<i32> {
    let mut rng = ChaCha8Rng::seed_from_u64(321);
    keys.choose_multiple(&mut rng, count).copied().collect()
}

criterion_group!(
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_millis(1000))
        ;
    targets = get, insert, remove, walk
);
criterion_main!(benches);
