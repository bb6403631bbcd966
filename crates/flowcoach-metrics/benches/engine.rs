use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use flowcoach_metrics::MetricsEngine;
use flowcoach_test_utils::{completed_stories, scenario_d_history, team_scope};

fn bench_compute(c: &mut Criterion) {
    let mut group = c.benchmark_group("metrics_compute");
    let engine = MetricsEngine::default();
    let scope = team_scope(84);
    let history = scenario_d_history();

    for size in [50usize, 500, 5_000] {
        let records = completed_stories(size, 30.0);
        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| {
                let snapshot = engine
                    .compute(black_box(&scope), black_box(records), &history)
                    .unwrap();
                black_box(snapshot.predicted_wip())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compute);
criterion_main!(benches);
