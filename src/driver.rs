//! Wires a run together: generate the store, prepare the query, measure.

use std::convert::Infallible;
use std::time::Instant;

use tracing::info;

use crate::config::BenchConfig;
use crate::engine::{PolicyEvaluator, PrepareParams, RegoEvaluator};
use crate::error::BenchError;
use crate::generator::generate;
use crate::histogram::LatencyHistogram;
use crate::measure::MeasurementLoop;
use crate::metrics::LogSink;
use crate::policies::FlavorProfile;

/// Generate the store for `config` and combine it with the flavor's module.
pub fn build_params(profile: &FlavorProfile, config: &BenchConfig) -> PrepareParams {
    let started = Instant::now();
    let store = generate(profile.flavor, config.amount);
    info!(
        event = "Generate",
        flavor = %profile.flavor,
        policies = store.len(),
        elapsed = ?started.elapsed(),
        "Generated policies"
    );

    PrepareParams::from_profile(profile, store)
        .with_partial(config.partial)
        .with_instrument(config.instrument)
}

/// Prepare `params` on `evaluator` and log the preparation metrics.
pub fn prepare_query<E: PolicyEvaluator>(
    evaluator: &E,
    params: PrepareParams,
) -> Result<E::Query, BenchError> {
    if params.partial {
        info!("Running partial evaluation...");
    } else {
        info!("Preparing query...");
    }

    let prepared = evaluator.prepare(params)?;
    let metrics = serde_json::to_string_pretty(&prepared.metrics)?;
    info!("Preparation metrics: {metrics}");

    Ok(prepared.query)
}

/// Run the benchmark described by `config` until a fatal error.
pub fn run(config: &BenchConfig) -> Result<Infallible, BenchError> {
    config.validate()?;
    let profile = FlavorProfile::for_flavor(config.flavor);
    let params = build_params(&profile, config);
    let mut query = prepare_query(&RegoEvaluator, params)?;

    let mut histogram = LatencyHistogram::new();
    MeasurementLoop::new(
        &mut query,
        &profile.sample,
        profile.expected,
        &mut histogram,
        &LogSink,
    )
    .with_interval(config.report_interval)
    .run()
}
