//! The policy-evaluation engine seam.
//!
//! [`PolicyEvaluator`] turns a module, a query and a store into a
//! [`PreparedQuery`] that can be evaluated repeatedly. [`RegoEvaluator`]
//! backs it with the `regorus` Rego interpreter; tests substitute stubs.

use crate::error::BenchError;
use crate::metrics::{EvaluationPhases, PrepareMetrics};
use crate::policies::FlavorProfile;
use crate::types::{AcpStore, Flavor, RequestInput, ResultSet};

mod rego;
mod specialize;

pub use rego::{RegoEvaluator, RegoQuery};
pub use specialize::{Residual, specialize};

/// Everything needed to prepare one query.
#[derive(Debug, Clone)]
pub struct PrepareParams {
    pub flavor: Flavor,
    pub module_name: String,
    pub policy: String,
    pub query: String,
    pub store: AcpStore,
    /// Fully-qualified rules the partial pass must keep residual.
    pub disable_inlining: Vec<String>,
    pub partial: bool,
    pub instrument: bool,
    /// Evaluated once at the end of preparation to validate the query.
    pub warmup_input: Option<RequestInput>,
}

impl PrepareParams {
    pub fn from_profile(profile: &FlavorProfile, store: AcpStore) -> Self {
        PrepareParams {
            flavor: profile.flavor,
            module_name: profile.module_name.to_string(),
            policy: profile.policy.to_string(),
            query: profile.query.clone(),
            store,
            disable_inlining: profile.disable_inlining.clone(),
            partial: false,
            instrument: false,
            warmup_input: Some(profile.sample.clone()),
        }
    }

    pub fn with_partial(mut self, partial: bool) -> Self {
        self.partial = partial;
        self
    }

    pub fn with_instrument(mut self, instrument: bool) -> Self {
        self.instrument = instrument;
        self
    }
}

/// A prepared query together with the metrics collected while preparing it.
pub struct Prepared<Q> {
    pub query: Q,
    pub metrics: PrepareMetrics,
}

pub trait PolicyEvaluator {
    type Query: PreparedQuery;

    fn prepare(&self, params: PrepareParams) -> Result<Prepared<Self::Query>, BenchError>;
}

pub trait PreparedQuery {
    fn evaluate(&mut self, input: &RequestInput) -> Result<ResultSet, BenchError>;

    /// Called between measured evaluations for work that must not be
    /// charged to the next call.
    fn stage_next(&mut self) {}

    /// Phase timings accumulated since the last call, if instrumented.
    fn take_phases(&mut self) -> Option<EvaluationPhases> {
        None
    }
}

#[cfg(test)]
mod tests;
