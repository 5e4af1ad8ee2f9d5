//! Partitioned set benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rankset_bench::{partitioned, populated, random_entries};
use rankset_core::{RangeQuery, RankedSet, TenantPath};

/// Benchmark inserting random scores into an empty set.
fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for count in [100usize, 1_000, 5_000].iter() {
        let entries = random_entries(*count);
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &entries, |b, entries| {
            b.iter(|| {
                let set = partitioned(4, 100);
                let tenant = TenantPath::root();
                for (member, score) in entries {
                    set.add(&tenant, member, *score).unwrap();
                }
                black_box(set);
            });
        });
    }

    group.finish();
}

/// Benchmark single-segment layout against the segmented one.
fn bench_segment_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment_count");
    let entries = random_entries(2_000);

    for segments in [1usize, 2, 4, 8].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(segments), segments, |b, &segments| {
            b.iter(|| {
                let (set, _tenant) = populated(segments, 50, black_box(&entries));
                black_box(set);
            });
        });
    }

    group.finish();
}

/// Benchmark reads against a populated set.
fn bench_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("read");
    let entries = random_entries(5_000);
    let (set, tenant) = populated(4, 250, &entries);

    group.bench_function("top_10", |b| {
        let query = RangeQuery::by_rank(0, 9).descending();
        b.iter(|| black_box(set.fetch(&tenant, black_box(&query)).unwrap()));
    });

    group.bench_function("rank_page_middle", |b| {
        let query = RangeQuery::by_rank(2_500, 2_549);
        b.iter(|| black_box(set.fetch(&tenant, black_box(&query)).unwrap()));
    });

    group.bench_function("score_window", |b| {
        let query = RangeQuery::by_score(250_000.0, 750_000.0).with_limit(100, 50);
        b.iter(|| black_box(set.fetch_members(&tenant, black_box(&query)).unwrap()));
    });

    group.bench_function("score_lookup", |b| {
        let member = entries[entries.len() - 1].0.clone();
        b.iter(|| black_box(set.score(&tenant, black_box(&member)).unwrap()));
    });

    group.finish();
}

/// Benchmark remove-then-reinsert, which exercises backfill and overflow.
fn bench_churn(c: &mut Criterion) {
    let entries = random_entries(2_000);
    let (set, tenant) = populated(4, 100, &entries);

    c.bench_function("remove_reinsert", |b| {
        let mut idx = 0;
        b.iter(|| {
            let (member, score) = &entries[idx % entries.len()];
            set.remove(&tenant, member).unwrap();
            set.add(&tenant, member, *score).unwrap();
            idx += 7;
        });
    });
}

criterion_group!(benches, bench_insert, bench_segment_count, bench_reads, bench_churn);

criterion_main!(benches);
