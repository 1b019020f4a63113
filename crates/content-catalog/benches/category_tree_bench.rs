//! 分类树性能基准测试
//!
//! 针对森林物化、过滤和环检查在不同规模下的耗时。

use std::collections::BTreeMap;
use std::hint::black_box;

use chrono::Utc;
use content_catalog::tree::{build_forest, filter_forest, flatten, is_self_or_descendant};
use content_catalog::{Category, ModelSummary};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 创建随机分类表，父节点总是先于子节点生成
fn create_categories(count: usize) -> BTreeMap<i64, Category> {
    let mut rng = StdRng::seed_from_u64(2026);
    let now = Utc::now();

    (1..=count as i64)
        .map(|id| {
            let parent_id = if id == 1 || rng.random_bool(0.1) {
                None
            } else {
                Some(rng.random_range(1..id))
            };
            let category = Category {
                id,
                name: format!("category-{id}"),
                description: format!("generated node {id}"),
                sort: rng.random_range(0..10),
                is_active: rng.random_bool(0.9),
                parent_id,
                model_id: (id % 7 == 0).then_some(1),
                created_at: now,
                updated_at: now,
            };
            (id, category)
        })
        .collect()
}

fn model_of(model_id: i64) -> Option<ModelSummary> {
    Some(ModelSummary {
        id: model_id,
        name: "model".to_string(),
    })
}

/// 森林物化基准
fn bench_build_forest(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_forest");

    for size in [100, 1_000, 10_000] {
        let categories = create_categories(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &categories, |b, cats| {
            b.iter(|| build_forest(black_box(cats.values()), model_of))
        });
    }

    group.finish();
}

/// 过滤与展开基准
fn bench_filter_forest(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_forest");

    for size in [1_000, 10_000] {
        let forest = build_forest(create_categories(size).values(), model_of);
        group.bench_with_input(BenchmarkId::new("filter", size), &forest, |b, nodes| {
            b.iter(|| filter_forest(black_box(nodes), black_box("category-9")))
        });
        group.bench_with_input(BenchmarkId::new("flatten", size), &forest, |b, nodes| {
            b.iter(|| flatten(black_box(nodes)).len())
        });
    }

    group.finish();
}

/// 移动前的环检查基准
fn bench_cycle_check(c: &mut Criterion) {
    let categories = create_categories(10_000);
    let deepest = categories
        .keys()
        .copied()
        .max()
        .unwrap_or(1);

    c.bench_function("is_self_or_descendant", |b| {
        b.iter(|| is_self_or_descendant(black_box(&categories), black_box(1), black_box(deepest)))
    });
}

criterion_group!(
    benches,
    bench_build_forest,
    bench_filter_forest,
    bench_cycle_check
);
criterion_main!(benches);
