//! Benchmarks for surface sampling, k-d tree queries and the full metric pass.
//!
//! Run with: cargo bench -p meshcomp-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use meshcomp_core::{
    sample_surface_seeded, symmetric_chamfer, KdTree, MeshCodec, MetricEvaluator,
    QuantizationCodec, SurfaceMesh,
};

/// UV sphere with `segments` slices and `segments / 2` stacks.
fn create_sphere(segments: u32) -> SurfaceMesh {
    let mut mesh = SurfaceMesh::new();
    let rings = segments / 2;
    for r in 0..=rings {
        let theta = std::f32::consts::PI * r as f32 / rings as f32;
        for s in 0..segments {
            let phi = 2.0 * std::f32::consts::PI * s as f32 / segments as f32;
            mesh.add_vertex([theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos()]);
        }
    }
    for r in 0..rings {
        for s in 0..segments {
            let a = r * segments + s;
            let b = r * segments + (s + 1) % segments;
            mesh.add_face([a.into(), (a + segments).into(), b.into()]);
            mesh.add_face([b.into(), (a + segments).into(), (b + segments).into()]);
        }
    }
    mesh
}

fn bench_sampling(c: &mut Criterion) {
    let mesh = create_sphere(64);
    let mut group = c.benchmark_group("Sampling");
    for n in [1_000usize, 20_000] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("sample_surface", n), &n, |b, &n| {
            b.iter(|| sample_surface_seeded(black_box(&mesh), n, Some(7)))
        });
    }
    group.finish();
}

fn bench_kd_tree(c: &mut Criterion) {
    let mesh = create_sphere(64);
    let mut group = c.benchmark_group("KdTree");
    for n in [1_000usize, 20_000] {
        let points = sample_surface_seeded(&mesh, n, Some(1)).unwrap();
        let queries = sample_surface_seeded(&mesh, n, Some(2)).unwrap();
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("build", n), &points, |b, points| {
            b.iter(|| KdTree::build(black_box(points)))
        });
        let tree = KdTree::build(&points).unwrap();
        group.bench_with_input(BenchmarkId::new("query_nearest", n), &queries, |b, queries| {
            b.iter(|| tree.query_nearest(black_box(queries)))
        });
        group.bench_with_input(BenchmarkId::new("symmetric_chamfer", n), &queries, |b, queries| {
            b.iter(|| symmetric_chamfer(black_box(&points), black_box(queries)))
        });
    }
    group.finish();
}

fn bench_metrics(c: &mut Criterion) {
    let mesh = create_sphere(64);
    let codec = QuantizationCodec::new();
    let mut group = c.benchmark_group("Metrics");
    group.sample_size(20);
    for bits in [8u8, 12] {
        let reconstructed = codec.decode(&codec.encode(&mesh, bits).unwrap()).unwrap();
        let evaluator = MetricEvaluator::default().with_seed(11);
        group.bench_with_input(BenchmarkId::new("evaluate", bits), &reconstructed, |b, recon| {
            b.iter(|| evaluator.evaluate(black_box(&mesh), black_box(recon)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_sampling, bench_kd_tree, bench_metrics);
criterion_main!(benches);
