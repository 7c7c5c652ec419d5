mod common;

use acp_bench::{Flavor, PolicyEvaluator, RegoEvaluator};
use common::{SIZES, params};
use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn benchmark_partial_eval(c: &mut Criterion) {
    let mut group = c.benchmark_group("partial_eval_exact");
    group.sample_size(10);

    for amount in SIZES {
        let params = params(Flavor::Exact, amount, true);

        let metrics = RegoEvaluator
            .prepare(params.clone())
            .expect("partial preparation succeeds")
            .metrics;
        assert_eq!(metrics.counter_support_rules, amount * 8);

        group.bench_with_input(BenchmarkId::from_parameter(amount), &params, |b, params| {
            b.iter_batched(
                || params.clone(),
                |params| {
                    let prepared = RegoEvaluator
                        .prepare(black_box(params))
                        .expect("partial preparation succeeds");
                    black_box(prepared.metrics.counter_support_rules);
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_partial_eval);
criterion_main!(benches);
