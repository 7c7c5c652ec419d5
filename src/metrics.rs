//! Preparation metrics and latency reporting via a pluggable sink.
//!
//! Preparation produces a [`PrepareMetrics`] value that the driver dumps as
//! JSON once. The measurement loop hands a [`LatencyReport`] to a
//! [`ReportSink`] at the end of every window; the binary uses [`LogSink`],
//! which writes the table through `tracing`.
//!
//! ## Usage
//!
//! ```ignore
//! use acp_bench::metrics::{LatencyReport, ReportSink};
//!
//! struct CountingSink(std::cell::Cell<u64>);
//!
//! impl ReportSink for CountingSink {
//!     fn on_report(&self, _report: &LatencyReport) {
//!         self.0.set(self.0.get() + 1);
//!     }
//! }
//! ```

use serde::Serialize;
use std::time::Duration;
use tracing::info;

use crate::histogram::{HistogramSnapshot, nanos_to_duration};

/// Wall-clock time spent in each preparation phase.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PreparePhases {
    /// Building the data document and loading it into the engine
    pub load_store: Duration,
    /// Parsing and compiling the policy module
    pub compile: Duration,
    /// Specializing the module against the store
    pub partial_eval: Duration,
    /// First evaluation, used to validate the prepared query
    pub warmup: Duration,
}

impl PreparePhases {
    pub fn total(&self) -> Duration {
        self.load_store + self.compile + self.partial_eval + self.warmup
    }
}

/// Structural metrics of one preparation, serialized for the startup dump.
///
/// Counters are always present. Per-phase timers only appear when
/// instrumentation was requested; the total is always reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PrepareMetrics {
    pub counter_policies: usize,
    pub counter_roles: usize,
    pub counter_modules: usize,
    pub counter_module_bytes: usize,
    /// Residual rules emitted for predicates kept out of inlining
    pub counter_support_rules: usize,
    pub partial: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer_load_store_ns: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer_compile_ns: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer_partial_eval_ns: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer_warmup_eval_ns: Option<u64>,
    pub timer_prepare_total_ns: u64,
}

impl PrepareMetrics {
    /// Fill in the timers from measured phases.
    pub fn with_phases(mut self, phases: &PreparePhases, instrument: bool) -> Self {
        if instrument {
            self.timer_load_store_ns = Some(as_nanos(phases.load_store));
            self.timer_compile_ns = Some(as_nanos(phases.compile));
            self.timer_partial_eval_ns = Some(as_nanos(phases.partial_eval));
            self.timer_warmup_eval_ns = Some(as_nanos(phases.warmup));
        }
        self.timer_prepare_total_ns = as_nanos(phases.total());
        self
    }
}

fn as_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

/// Per-phase evaluation time accumulated by an instrumented prepared query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EvaluationPhases {
    pub calls: u64,
    /// Converting the request into the engine's input document
    pub input: Duration,
    /// Evaluating the query
    pub eval: Duration,
    /// Converting engine values into a result set
    pub result: Duration,
}

impl EvaluationPhases {
    fn mean(&self, total: Duration) -> Duration {
        match u32::try_from(self.calls) {
            Ok(0) => Duration::ZERO,
            Ok(calls) => total / calls,
            Err(_) => Duration::from_nanos(as_nanos(total) / self.calls),
        }
    }

    pub fn mean_input(&self) -> Duration {
        self.mean(self.input)
    }

    pub fn mean_eval(&self) -> Duration {
        self.mean(self.eval)
    }

    pub fn mean_result(&self) -> Duration {
        self.mean(self.result)
    }
}

/// Everything reported at the end of one measurement window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyReport {
    /// `None` when the window recorded no evaluations.
    pub latency: Option<HistogramSnapshot>,
    pub phases: Option<EvaluationPhases>,
}

impl LatencyReport {
    /// The mean and reported percentiles as durations, zero when empty.
    pub fn columns(&self) -> [Duration; 4] {
        match &self.latency {
            Some(s) => [s.mean, s.p90, s.p99, s.p999].map(nanos_to_duration),
            None => [Duration::ZERO; 4],
        }
    }
}

/// Consumer of latency reports.
pub trait ReportSink {
    /// Called once before the first evaluation.
    fn on_start(&self) {}

    /// Called at the end of every window, after the histogram was cleared.
    fn on_report(&self, report: &LatencyReport);
}

/// Writes the latency table to the log.
pub struct LogSink;

impl ReportSink for LogSink {
    fn on_start(&self) {
        info!("Running evaluation...");
        info!("{:<20} {:<20} {:<20} {:<20}", "mean", "90%", "99%", "99.9%");
    }

    fn on_report(&self, report: &LatencyReport) {
        let [mean, p90, p99, p999] = report.columns().map(|d| format!("{d:?}"));
        info!("{mean:<20} {p90:<20} {p99:<20} {p999:<20}");

        if let Some(phases) = &report.phases {
            info!(
                calls = phases.calls,
                input = ?phases.mean_input(),
                eval = ?phases.mean_eval(),
                result = ?phases.mean_result(),
                "Evaluation phases (mean per call)"
            );
        }
    }
}
