//! 의존성 그래프 벤치마크
//!
//! 트리 생성과 영향 경로 재구성 성능을 측정합니다.

use std::collections::BTreeSet;

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use depaudit_graph::{DependencyEdges, TreeBuilder, build_impact_paths};

/// 층마다 `width`개의 노드가 있고 각 노드가 다음 층 전체에 의존하는 그래프
fn layered_edges(layers: usize, width: usize) -> DependencyEdges {
    let mut edges = DependencyEdges::new();
    let first: Vec<String> = (0..width).map(|i| format!("npm://l0-{i}:1.0.0")).collect();
    edges.insert("npm://app:1.0.0".to_owned(), first);
    for layer in 0..layers.saturating_sub(1) {
        let next: Vec<String> = (0..width)
            .map(|i| format!("npm://l{}-{i}:1.0.0", layer + 1))
            .collect();
        for i in 0..width {
            edges.insert(format!("npm://l{layer}-{i}:1.0.0"), next.clone());
        }
    }
    edges
}

fn bench_tree_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_build");

    let small = layered_edges(3, 5);
    group.throughput(Throughput::Elements(15));
    group.bench_function("layered_3x5", |b| {
        b.iter(|| TreeBuilder::new().build(black_box("npm://app:1.0.0"), black_box(&small)))
    });

    let wide = layered_edges(6, 20);
    group.throughput(Throughput::Elements(120));
    group.bench_function("layered_6x20_bounded", |b| {
        b.iter(|| TreeBuilder::new().build(black_box("npm://app:1.0.0"), black_box(&wide)))
    });

    group.finish();
}

fn bench_impact_paths(c: &mut Criterion) {
    let mut group = c.benchmark_group("impact_paths");

    let edges = layered_edges(4, 8);
    let (tree, unique_ids) = TreeBuilder::new().build("npm://app:1.0.0", &edges);
    let forest = vec![tree];

    let single: BTreeSet<String> = BTreeSet::from(["npm://l3-0:1.0.0".to_owned()]);
    group.throughput(Throughput::Elements(1));
    group.bench_function("single_target", |b| {
        b.iter(|| build_impact_paths(black_box(&forest), black_box(&single)))
    });

    group.throughput(Throughput::Elements(unique_ids.len() as u64));
    group.bench_function("all_targets", |b| {
        b.iter(|| build_impact_paths(black_box(&forest), black_box(&unique_ids)))
    });

    group.finish();
}

criterion_group!(benches, bench_tree_build, bench_impact_paths);
criterion_main!(benches);
