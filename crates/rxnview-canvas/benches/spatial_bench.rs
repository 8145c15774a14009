//! Benchmarks for the spatial index and scene hit-testing
//!
//! Run with: cargo bench -p rxnview-canvas

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rxnview_canvas::{HitTolerance, SceneGraph, SpatialIndex};
use rxnview_core::{Bounds, ElementId, Point};
use std::hint::black_box;

/// Lay out `n` 40x30 boxes on a grid with 60 unit spacing.
fn grid_bounds(n: usize) -> Vec<Bounds> {
    let cols = (n as f64).sqrt().ceil() as usize;
    (0..n)
        .map(|i| {
            let (col, row) = (i % cols, i / cols);
            Bounds::from_origin_size(col as f64 * 60.0, row as f64 * 60.0, 40.0, 30.0)
        })
        .collect()
}

fn make_index(n: usize) -> SpatialIndex {
    let mut index = SpatialIndex::default();
    for (i, b) in grid_bounds(n).iter().enumerate() {
        index.insert(ElementId(i as u64 + 1), b);
    }
    index
}

fn make_scene(n: usize) -> SceneGraph {
    let mut scene = SceneGraph::new();
    let mut prev = None;
    for (i, b) in grid_bounds(n).into_iter().enumerate() {
        let Ok(id) = scene.add_node(format!("S{}", i), b) else {
            continue;
        };
        if let Some(p) = prev.filter(|_| i % 4 == 0) {
            let _ = scene.add_reaction(format!("J{}", i), vec![p], vec![id]);
        }
        prev = Some(id);
    }
    scene
}

fn bench_index_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("spatial/query_rect");
    let viewport = Bounds::from_origin_size(300.0, 300.0, 800.0, 600.0);

    for n in [100, 1_000, 10_000] {
        let index = make_index(n);
        group.bench_with_input(BenchmarkId::new("viewport", n), &index, |b, index| {
            b.iter(|| black_box(index.query(black_box(&viewport))))
        });
    }

    group.finish();
}

fn bench_index_point(c: &mut Criterion) {
    let mut group = c.benchmark_group("spatial/query_point");
    let probe = Point::new(610.0, 615.0);

    for n in [100, 1_000, 10_000] {
        let index = make_index(n);
        group.bench_with_input(BenchmarkId::new("point", n), &index, |b, index| {
            b.iter(|| black_box(index.query_point(black_box(&probe))))
        });
    }

    group.finish();
}

fn bench_index_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("spatial/update");

    for n in [1_000, 10_000] {
        group.bench_with_input(BenchmarkId::new("move_one", n), &n, |b, &n| {
            b.iter_batched(
                || make_index(n),
                |mut index| {
                    let id = ElementId(n as u64 / 2);
                    index.update(id, &Bounds::from_origin_size(5.0, 5.0, 40.0, 30.0));
                    black_box(index)
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

fn bench_scene_hit_test(c: &mut Criterion) {
    let mut group = c.benchmark_group("scene/hit_test");
    let tolerance = HitTolerance::uniform(5.0);

    for n in [100, 1_000] {
        let scene = make_scene(n);
        let probe = Point::new(125.0, 75.0);
        group.bench_with_input(BenchmarkId::new("grid", n), &scene, |b, scene| {
            b.iter(|| black_box(scene.hit_test(black_box(&probe), &tolerance)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_index_query,
    bench_index_point,
    bench_index_update,
    bench_scene_hit_test,
);
criterion_main!(benches);
