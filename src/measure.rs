//! The measurement loop.
//!
//! Evaluates one prepared query against one fixed input forever, recording
//! the wall-clock time of every call. When the report interval has passed
//! since the last report, the accumulated window is summarized, handed to
//! the sink and cleared.

use std::convert::Infallible;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::DEFAULT_REPORT_INTERVAL;
use crate::engine::PreparedQuery;
use crate::error::BenchError;
use crate::histogram::LatencyHistogram;
use crate::metrics::{LatencyReport, ReportSink};
use crate::types::{Decision, RequestInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Just reported; the histogram is empty.
    Warm,
    /// At least one sample recorded since the last report.
    Accumulating,
}

pub struct MeasurementLoop<'a, Q: PreparedQuery + ?Sized, S: ReportSink + ?Sized> {
    query: &'a mut Q,
    input: &'a RequestInput,
    expected: Decision,
    histogram: &'a mut LatencyHistogram,
    sink: &'a S,
    interval: Duration,
    last_report: Instant,
    state: LoopState,
    started: bool,
    iterations: u64,
}

impl<'a, Q: PreparedQuery + ?Sized, S: ReportSink + ?Sized> MeasurementLoop<'a, Q, S> {
    pub fn new(
        query: &'a mut Q,
        input: &'a RequestInput,
        expected: Decision,
        histogram: &'a mut LatencyHistogram,
        sink: &'a S,
    ) -> Self {
        MeasurementLoop {
            query,
            input,
            expected,
            histogram,
            sink,
            interval: DEFAULT_REPORT_INTERVAL,
            last_report: Instant::now(),
            state: LoopState::Warm,
            started: false,
            iterations: 0,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn histogram(&self) -> &LatencyHistogram {
        &*self.histogram
    }

    /// One iteration: report if the window expired, then evaluate and record.
    ///
    /// Returns the report emitted during this iteration, if any.
    pub fn step(&mut self) -> Result<Option<LatencyReport>, BenchError> {
        if !self.started {
            self.started = true;
            self.sink.on_start();
            self.last_report = Instant::now();
        }

        let report = self.maybe_report();

        let start = Instant::now();
        let results = self.query.evaluate(self.input)?;
        let decision = Decision::try_from(&results)?;
        if decision != self.expected {
            return Err(BenchError::UnexpectedResult {
                expected: self.expected.to_string(),
                actual: results.to_string(),
            });
        }
        self.histogram.record(start.elapsed());
        self.query.stage_next();

        self.iterations += 1;
        self.state = LoopState::Accumulating;
        Ok(report)
    }

    /// Evaluate until an iteration fails.
    pub fn run(mut self) -> Result<Infallible, BenchError> {
        loop {
            self.step()?;
        }
    }

    fn maybe_report(&mut self) -> Option<LatencyReport> {
        if self.state != LoopState::Accumulating || self.last_report.elapsed() <= self.interval {
            return None;
        }

        let report = LatencyReport {
            latency: self.histogram.take_snapshot(),
            phases: self.query.take_phases(),
        };
        debug!(
            event = "Report",
            iterations = self.iterations,
            window = ?self.last_report.elapsed()
        );
        self.sink.on_report(&report);

        self.last_report = Instant::now();
        self.state = LoopState::Warm;
        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::EvaluationPhases;
    use crate::types::ResultSet;
    use serde_json::{Value, json};
    use std::cell::{Cell, RefCell};

    /// Returns a scripted sequence of results, then repeats the last one.
    struct Scripted {
        results: Vec<Result<ResultSet, BenchError>>,
        calls: usize,
        staged: usize,
        phases: Option<EvaluationPhases>,
    }

    impl Scripted {
        fn always(value: Value) -> Self {
            Scripted {
                results: vec![Ok(ResultSet::single(value))],
                calls: 0,
                staged: 0,
                phases: None,
            }
        }

        fn then(mut self, result: Result<ResultSet, BenchError>) -> Self {
            self.results.push(result);
            self
        }
    }

    impl PreparedQuery for Scripted {
        fn evaluate(&mut self, _input: &RequestInput) -> Result<ResultSet, BenchError> {
            std::thread::sleep(Duration::from_micros(50));
            let idx = self.calls.min(self.results.len() - 1);
            self.calls += 1;
            if let Some(phases) = &mut self.phases {
                phases.calls += 1;
            }
            self.results[idx].clone()
        }

        fn stage_next(&mut self) {
            self.staged += 1;
        }

        fn take_phases(&mut self) -> Option<EvaluationPhases> {
            self.phases.as_mut().map(std::mem::take)
        }
    }

    #[derive(Default)]
    struct Collecting {
        starts: Cell<usize>,
        reports: RefCell<Vec<LatencyReport>>,
    }

    impl ReportSink for Collecting {
        fn on_start(&self) {
            self.starts.set(self.starts.get() + 1);
        }

        fn on_report(&self, report: &LatencyReport) {
            self.reports.borrow_mut().push(report.clone());
        }
    }

    fn input() -> RequestInput {
        RequestInput::new("subject", "check", "resource")
    }

    #[test]
    fn test_reports_when_interval_expires() {
        let mut query = Scripted::always(json!(false));
        let input = input();
        let mut histogram = LatencyHistogram::new();
        let sink = Collecting::default();
        let mut lp = MeasurementLoop::new(&mut query, &input, Decision::Deny, &mut histogram, &sink)
            .with_interval(Duration::ZERO);

        // first iteration only accumulates
        assert_eq!(lp.state(), LoopState::Warm);
        assert!(lp.step().unwrap().is_none());
        assert_eq!(lp.state(), LoopState::Accumulating);
        assert_eq!(lp.histogram().count(), 1);

        let report = lp.step().unwrap().expect("interval expired");
        let latency = report.latency.unwrap();
        assert_eq!(latency.count, 1);
        assert!(latency.mean >= 50_000.0);

        // the report cleared the window, the second sample starts a new one
        assert_eq!(lp.histogram().count(), 1);
        assert_eq!(lp.iterations(), 2);

        assert_eq!(sink.starts.get(), 1);
        assert_eq!(sink.reports.borrow().len(), 1);
    }

    #[test]
    fn test_no_report_before_interval() {
        let mut query = Scripted::always(json!(false));
        let input = input();
        let mut histogram = LatencyHistogram::new();
        let sink = Collecting::default();
        let mut lp = MeasurementLoop::new(&mut query, &input, Decision::Deny, &mut histogram, &sink)
            .with_interval(Duration::from_secs(3600));

        for _ in 0..5 {
            assert!(lp.step().unwrap().is_none());
        }
        assert_eq!(lp.histogram().count(), 5);
        assert!(sink.reports.borrow().is_empty());
        assert_eq!(sink.starts.get(), 1);
    }

    #[test]
    fn test_report_carries_phases() {
        let mut query = Scripted::always(json!(true));
        query.phases = Some(EvaluationPhases::default());
        let input = input();
        let mut histogram = LatencyHistogram::new();
        let sink = Collecting::default();
        let mut lp =
            MeasurementLoop::new(&mut query, &input, Decision::Allow, &mut histogram, &sink)
                .with_interval(Duration::ZERO);

        lp.step().unwrap();
        let report = lp.step().unwrap().unwrap();
        assert_eq!(report.phases.unwrap().calls, 1);
    }

    #[test]
    fn test_unexpected_decision_is_fatal() {
        let mut query = Scripted::always(json!(false)).then(Ok(ResultSet::single(json!(true))));
        let input = input();
        let mut histogram = LatencyHistogram::new();
        let sink = Collecting::default();
        let mut lp = MeasurementLoop::new(&mut query, &input, Decision::Deny, &mut histogram, &sink);

        assert!(lp.step().is_ok());
        let err = lp.step().unwrap_err();
        assert_eq!(
            err,
            BenchError::UnexpectedResult {
                expected: "deny".to_string(),
                actual: "[[true]]".to_string(),
            }
        );
        // the failing call is not recorded
        assert_eq!(lp.histogram().count(), 1);
    }

    #[test]
    fn test_unexpected_shape_is_fatal() {
        let mut query = Scripted::always(json!("allow"));
        let input = input();
        let mut histogram = LatencyHistogram::new();
        let sink = Collecting::default();
        let mut lp = MeasurementLoop::new(&mut query, &input, Decision::Deny, &mut histogram, &sink);

        assert!(matches!(
            lp.step(),
            Err(BenchError::UnexpectedResult { .. })
        ));
    }

    #[test]
    fn test_run_stops_on_evaluation_error() {
        let mut query = Scripted::always(json!(false))
            .then(Ok(ResultSet::single(json!(false))))
            .then(Err(BenchError::EvalError("boom".to_string())));
        let input = input();
        let mut histogram = LatencyHistogram::new();
        let sink = Collecting::default();

        let err = MeasurementLoop::new(&mut query, &input, Decision::Deny, &mut histogram, &sink)
            .run()
            .unwrap_err();
        assert_eq!(err, BenchError::EvalError("boom".to_string()));
        assert_eq!(query.calls, 3);
        assert_eq!(histogram.count(), 2);
        // staged after every recorded call, not after the failing one
        assert_eq!(query.staged, 2);
    }
}
