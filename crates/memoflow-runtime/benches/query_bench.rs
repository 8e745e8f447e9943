//! Benchmarks for memoized queries
//!
//! Run with: cargo bench -p memoflow-runtime

use std::hint::black_box;
use std::rc::Rc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use memoflow_access::Property;
use memoflow_runtime::{FnComputer, MemoCell, Snapshot};

type Cell = MemoCell<u32, i64, i64>;

fn cell_with_sources(count: u32) -> (Cell, Vec<Property<i64>>) {
    let cell = Cell::with_function(FnComputer::new(|inputs: &Snapshot<u32, i64>| {
        inputs.values().sum()
    }));
    let properties = (0..count)
        .map(|key| {
            let property = Property::new(i64::from(key));
            cell.register(key, Rc::new(property.clone()));
            property
        })
        .collect();
    (cell, properties)
}

// ============================================================================
// Cached query
// ============================================================================

fn bench_cached(c: &mut Criterion) {
    let mut group = c.benchmark_group("memo/cached");

    for count in [1_u32, 16, 256] {
        let (cell, _properties) = cell_with_sources(count);
        let _ = cell.query();

        group.bench_with_input(BenchmarkId::new("query", count), &(), |b, _| {
            b.iter(|| black_box(cell.query()))
        });
    }

    group.finish();
}

// ============================================================================
// Recompute after one input changes
// ============================================================================

fn bench_recompute(c: &mut Criterion) {
    let mut group = c.benchmark_group("memo/recompute");

    for count in [1_u32, 16, 256] {
        let (cell, properties) = cell_with_sources(count);
        let mut next = 0_i64;

        group.bench_with_input(BenchmarkId::new("one_changed", count), &(), |b, _| {
            b.iter(|| {
                next += 1;
                properties[0].set(next);
                black_box(cell.query())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_cached, bench_recompute);
criterion_main!(benches);
