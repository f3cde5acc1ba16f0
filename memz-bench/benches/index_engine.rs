//! MEMZ Index Engine Benchmark Suite
//!
//! CI-enforced performance targets (5K records):
//!   id_lookup_cache_hit ............. < 1μs
//!   id_lookup_cache_off ............. < 1μs
//!   tags_all_two_tags ............... < 50μs
//!   time_range_narrow ............... < 20μs
//!   complex_query_all_filters ....... < 200μs
//!   generation_build_5k ............. < 10ms

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use memz_index::{ComplexQuery, Generation, IndexConfig, IndexCoordinator, Record};

const RECORDS: usize = 5_000;
const TAGS: [&str; 12] = [
    "village", "forest", "quest", "market", "tavern", "combat", "trade", "family", "rumor", "weather",
    "festival", "danger",
];

fn make_records(n: usize) -> Vec<Record> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..n)
        .map(|i| {
            let tag_count = rng.gen_range(1..4);
            let tags: Vec<&str> = (0..tag_count).map(|_| TAGS[rng.gen_range(0..TAGS.len())]).collect();
            Record::new(format!("mem-{i:05}"), tags, i as i64 * 1_000, rng.gen_range(0.0..10.0))
                .with_payload(serde_json::json!({ "text": format!("Memory number {i}") }))
        })
        .collect()
}

/// Benchmark: cached id lookup (target: < 1μs).
fn bench_id_lookup(c: &mut Criterion) {
    let records = make_records(RECORDS);
    let cached = IndexCoordinator::with_defaults(records.clone()).unwrap();
    let plain = IndexCoordinator::build_from(records, IndexConfig::without_cache()).unwrap();
    let _ = cached.get_by_id("mem-02500");

    c.bench_function("id_lookup_cache_hit", |b| {
        b.iter(|| black_box(cached.get_by_id(black_box("mem-02500"))));
    });
    c.bench_function("id_lookup_cache_off", |b| {
        b.iter(|| black_box(plain.get_by_id(black_box("mem-02500"))));
    });
}

/// Benchmark: two-tag AND query (target: < 50μs).
fn bench_tags_all(c: &mut Criterion) {
    let index = IndexCoordinator::with_defaults(make_records(RECORDS)).unwrap();
    c.bench_function("tags_all_two_tags", |b| {
        b.iter(|| black_box(index.get_by_tags_all(black_box(&["quest", "village"]))));
    });
}

/// Benchmark: narrow time window, ~50 records (target: < 20μs).
fn bench_time_range(c: &mut Criterion) {
    let index = IndexCoordinator::with_defaults(make_records(RECORDS)).unwrap();
    c.bench_function("time_range_narrow", |b| {
        b.iter(|| black_box(index.get_by_time_range(black_box(2_000_000), black_box(2_049_000))));
    });
}

/// Benchmark: tags + time + importance (target: < 200μs).
fn bench_complex(c: &mut Criterion) {
    let index = IndexCoordinator::with_defaults(make_records(RECORDS)).unwrap();
    let query = ComplexQuery::new()
        .with_tags(["quest"])
        .with_time_range(1_000_000, 4_000_000)
        .with_min_importance(5.0);
    c.bench_function("complex_query_all_filters", |b| {
        b.iter(|| black_box(index.get_by_complex_query(black_box(&query))));
    });
}

/// Benchmark: building one generation from 5K records (target: < 10ms).
fn bench_build(c: &mut Criterion) {
    let records = make_records(RECORDS);
    c.bench_function("generation_build_5k", |b| {
        b.iter(|| black_box(Generation::build(black_box(records.clone()), 32).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_id_lookup,
    bench_tags_all,
    bench_time_range,
    bench_complex,
    bench_build,
);
criterion_main!(benches);
