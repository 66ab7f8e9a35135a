//! Benchmarks for rendering and dispatch.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use schur_specgen::codegen::{generate_all, render_factory};
use schur_specgen::{BlockSizes, Catalog, CodeGenConfig, Dispatcher, TemplateSet};

fn bench_render_factory(c: &mut Criterion) {
    let catalog = Catalog::ceres_default();
    let templates = TemplateSet::schur_eliminator();
    let config = CodeGenConfig::default();

    c.bench_function("render_factory", |b| {
        b.iter(|| render_factory(black_box(&templates), black_box(&catalog), &config))
    });
}

fn bench_generate_all(c: &mut Criterion) {
    let catalog = Catalog::ceres_default();
    let sets = TemplateSet::builtins();
    let config = CodeGenConfig::default();

    c.bench_function("generate_all_builtin", |b| {
        b.iter(|| generate_all(black_box(&catalog), black_box(&sets), &config))
    });
}

fn bench_resolve(c: &mut Criterion) {
    let dispatcher = Dispatcher::new(&Catalog::ceres_default());
    let hit = BlockSizes::new(4, 4, 4);
    let miss = BlockSizes::new(7, 7, 7);

    c.bench_function("resolve_hit", |b| {
        b.iter(|| dispatcher.resolve(black_box(hit)))
    });
    c.bench_function("resolve_fallback", |b| {
        b.iter(|| dispatcher.resolve(black_box(miss)))
    });
}

criterion_group!(benches, bench_render_factory, bench_generate_all, bench_resolve);
criterion_main!(benches);
