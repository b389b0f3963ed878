use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use jobly_store::{FieldMap, FilterSet, FilterSpec, SparseUpdate, partial_update};

/// A sparse update touching `n` fields, every other one renamed by the map.
fn build_update(n: usize) -> (SparseUpdate, FieldMap) {
    let mut update = SparseUpdate::new();
    let mut map = FieldMap::new();
    for i in 0..n {
        update = update.set(format!("field{i}"), i as i64);
        if i % 2 == 0 {
            map = map.map(format!("field{i}"), format!("column_{i}"));
        }
    }
    (update, map)
}

fn bench_partial_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("builders/partial_update");

    for n in [1, 5, 10, 50] {
        let input = build_update(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &input, |b, (update, map)| {
            b.iter(|| black_box(partial_update(update, map).unwrap()));
        });
    }

    group.finish();
}

fn bench_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("builders/filters");
    let filters = FilterSet::new()
        .contains_text("title", "title")
        .min_numeric("minSalary", "salary")
        .boolean_flag("hasEquity", "equity");

    let cases = [
        ("none", FilterSpec::new()),
        ("title", FilterSpec::new().with("title", "engineer")),
        (
            "all",
            FilterSpec::new()
                .with("title", "engineer")
                .with("minSalary", 50000)
                .with("hasEquity", true),
        ),
        (
            "unknown",
            FilterSpec::new().with("title", "engineer").with("remote", true),
        ),
    ];

    for (name, spec) in &cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), spec, |b, spec| {
            b.iter(|| black_box(filters.build(Some(spec)).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_partial_update, bench_filters);
criterion_main!(benches);
