//! Criterion benchmarks for the hot paths: LRU touch, ring lookup and a
//! fully cached group read.

use criterion::{criterion_group, criterion_main, Criterion};
use peercache::{
    ByteView, DynError, Group, GroupConfig, HashRing, LruCache, NoPeers, RingConfig,
};
use std::hint::black_box;

fn bench_lru(c: &mut Criterion) {
    let mut group = c.benchmark_group("lru");

    group.bench_function("add_new", |b| {
        let mut cache: LruCache<u64, u64> = LruCache::new(1024);
        let mut i = 0u64;
        b.iter(|| {
            cache.add(black_box(i), i);
            i = i.wrapping_add(1);
        });
    });

    group.bench_function("get_hit", |b| {
        let mut cache: LruCache<u64, u64> = LruCache::new(1024);
        for i in 0..1024u64 {
            cache.add(i, i);
        }
        let mut i = 0u64;
        b.iter(|| {
            let hit = cache.get(black_box(&(i % 1024)));
            i = i.wrapping_add(1);
            black_box(hit)
        });
    });

    group.finish();
}

fn bench_ring(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring");

    let mut ring = HashRing::new(RingConfig::default());
    for i in 0..16 {
        ring.add(&ByteView::from(format!("http://10.0.0.{}:8080", i)));
    }

    group.bench_function("get_16_members", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = i.to_le_bytes();
            i = i.wrapping_add(1);
            black_box(ring.get(black_box(&key)))
        });
    });

    group.finish();
}

fn bench_group_get(c: &mut Criterion) {
    let mut bench = c.benchmark_group("group");

    let group = Group::new(
        GroupConfig::new("bench", 1 << 20),
        Box::new(|key: &[u8]| -> Result<ByteView, DynError> {
            Ok(ByteView::copy_from_slice(key))
        }),
        Box::new(NoPeers),
    );
    // Prime the main cache so iterations measure the hit path.
    for i in 0..256u32 {
        group.get(i.to_le_bytes()).unwrap();
    }

    bench.bench_function("get_cached", |b| {
        let mut i = 0u32;
        b.iter(|| {
            let key = (i % 256).to_le_bytes();
            i = i.wrapping_add(1);
            black_box(group.get(black_box(key)).unwrap())
        });
    });

    bench.finish();
}

criterion_group!(benches, bench_lru, bench_ring, bench_group_get);
criterion_main!(benches);
