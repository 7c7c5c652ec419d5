//! `regorus`-backed evaluator.

use regorus::{Engine, Value as RegoValue};
use serde::Serialize;
use tracing::{debug, info};

use crate::engine::{PolicyEvaluator, PrepareParams, Prepared, PreparedQuery, specialize};
use crate::error::BenchError;
use crate::metrics::{EvaluationPhases, PrepareMetrics, PreparePhases};
use crate::timers::timed;
use crate::types::{RequestInput, ResultSet};

/// Prepares queries on a fresh `regorus::Engine` per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegoEvaluator;

/// A loaded engine plus the rule to evaluate against it.
pub struct RegoQuery {
    engine: Engine,
    /// `Engine::eval_rule` takes the path by value; a copy is staged
    /// between measured calls.
    staged: Option<String>,
    query: String,
    instrument: bool,
    phases: EvaluationPhases,
}

impl PolicyEvaluator for RegoEvaluator {
    type Query = RegoQuery;

    fn prepare(&self, params: PrepareParams) -> Result<Prepared<RegoQuery>, BenchError> {
        let mut phases = PreparePhases::default();
        let mut engine = Engine::new();
        let mut metrics = PrepareMetrics {
            counter_policies: params.store.len(),
            counter_roles: params.store.roles.len(),
            counter_modules: 1,
            partial: params.partial,
            ..Default::default()
        };

        if params.partial {
            let residual = timed(&mut phases.partial_eval, || specialize(&params))?;
            metrics.counter_support_rules = residual.support_rules;
            metrics.counter_module_bytes = residual.module.len();

            timed(&mut phases.load_store, || load_document(&mut engine, &residual.document))?;
            let path = format!("partial/{}", params.module_name);
            timed(&mut phases.compile, || engine.add_policy(path, residual.module))
                .map_err(|e| BenchError::CompileError(e.to_string()))?;
        } else {
            timed(&mut phases.load_store, || {
                let document = params.store.to_document(params.flavor)?;
                load_document(&mut engine, &document)
            })?;

            metrics.counter_module_bytes = params.policy.len();
            timed(&mut phases.compile, || {
                engine.add_policy(params.module_name.clone(), params.policy.clone())
            })
            .map_err(|e| BenchError::CompileError(e.to_string()))?;
        }

        let mut query = RegoQuery {
            engine,
            staged: Some(params.query.clone()),
            query: params.query.clone(),
            instrument: params.instrument,
            phases: EvaluationPhases::default(),
        };

        if let Some(input) = &params.warmup_input {
            let results = timed(&mut phases.warmup, || query.evaluate_plain(input))?;
            debug!(event = "Prepare", phase = "Warmup", result = %results);
            query.stage_next();
        }

        let metrics = metrics.with_phases(&phases, params.instrument);
        info!(
            event = "Prepare",
            flavor = %params.flavor,
            policies = params.store.len(),
            partial = params.partial,
            elapsed = ?phases.total(),
            "Query prepared"
        );

        Ok(Prepared { query, metrics })
    }
}

impl RegoQuery {
    fn set_input(&mut self, input: &RequestInput) -> Result<(), BenchError> {
        let value = to_rego_value(input)?;
        self.engine.set_input(value);
        Ok(())
    }

    fn eval(&mut self) -> Result<RegoValue, BenchError> {
        let rule = self.staged.take().unwrap_or_else(|| self.query.clone());
        self.engine
            .eval_rule(rule)
            .map_err(|e| BenchError::EvalError(e.to_string()))
    }

    fn evaluate_plain(&mut self, input: &RequestInput) -> Result<ResultSet, BenchError> {
        self.set_input(input)?;
        let value = self.eval()?;
        to_result_set(&value)
    }
}

impl PreparedQuery for RegoQuery {
    fn evaluate(&mut self, input: &RequestInput) -> Result<ResultSet, BenchError> {
        if !self.instrument {
            return self.evaluate_plain(input);
        }

        let mut phases = self.phases;
        timed(&mut phases.input, || self.set_input(input))?;
        let results = timed(&mut phases.eval, || self.eval())?;
        let results = timed(&mut phases.result, || to_result_set(&results))?;
        phases.calls += 1;
        self.phases = phases;
        Ok(results)
    }

    fn stage_next(&mut self) {
        if self.staged.is_none() {
            self.staged = Some(self.query.clone());
        }
    }

    fn take_phases(&mut self) -> Option<EvaluationPhases> {
        self.instrument.then(|| std::mem::take(&mut self.phases))
    }
}

fn to_rego_value<T: Serialize>(value: &T) -> Result<RegoValue, BenchError> {
    Ok(serde_json::from_value(serde_json::to_value(value)?)?)
}

fn load_document(engine: &mut Engine, document: &serde_json::Value) -> Result<(), BenchError> {
    let data = to_rego_value(document).map_err(|e| BenchError::StoreError(e.to_string()))?;
    engine
        .add_data(data)
        .map_err(|e| BenchError::StoreError(e.to_string()))
}

/// An undefined rule yields no rows, anything else a single row.
fn to_result_set(value: &RegoValue) -> Result<ResultSet, BenchError> {
    if *value == RegoValue::Undefined {
        return Ok(ResultSet::default());
    }
    Ok(ResultSet::single(serde_json::to_value(value)?))
}
