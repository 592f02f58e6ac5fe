//! Criterion benchmarks for point edits flowing through a map stack.

use criterion::{criterion_group, criterion_main, Criterion};
use lure_bench::{edit_script, guidance_stack};
use lure_core::{DynamicMap, FlowMap, UpdateMode};
use std::hint::black_box;

const SIZE: u32 = 128;

/// Benchmark: one edit followed by one read at the edited cell.
fn bench_edit_then_read(c: &mut Criterion) {
    for (label, mode) in [("lazy", UpdateMode::Lazy), ("eager", UpdateMode::Eager)] {
        let stack = guidance_stack(SIZE, SIZE, mode, 1);
        let script = edit_script(1024, SIZE, SIZE, 2);
        let mut i = 0;
        c.bench_function(&format!("edit_then_read_{label}_128"), |b| {
            b.iter(|| {
                let (x, y, v) = script[i % script.len()];
                i += 1;
                stack.leaf.set(x, y, v);
                black_box(stack.steer.obtain_direction(x, y));
            });
        });
    }
}

/// Benchmark: 64 edits, then a sweep that brings every cell up to date.
fn bench_burst_then_sweep(c: &mut Criterion) {
    for (label, mode) in [("lazy", UpdateMode::Lazy), ("eager", UpdateMode::Eager)] {
        let stack = guidance_stack(SIZE, SIZE, mode, 3);
        let script = edit_script(64, SIZE, SIZE, 4);
        c.bench_function(&format!("burst64_then_sweep_{label}_128"), |b| {
            b.iter(|| {
                for &(x, y, v) in &script {
                    stack.leaf.set(x, y, v);
                }
                stack.steer.update_if_dirty_all();
                black_box(stack.steer.stats());
            });
        });
    }
}

/// Benchmark: full recompute of the whole stack after a bulk edit.
fn bench_bulk_edit(c: &mut Criterion) {
    let stack = guidance_stack(SIZE, SIZE, UpdateMode::Eager, 5);
    c.bench_function("bulk_edit_eager_128", |b| {
        b.iter(|| {
            stack.leaf.modify(|grid| grid.set(0, 0, 0.5));
            black_box(stack.toward.stats());
        });
    });
}

criterion_group!(
    benches,
    bench_edit_then_read,
    bench_burst_then_sweep,
    bench_bulk_edit
);
criterion_main!(benches);
