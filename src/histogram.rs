//! Latency histogram for the measurement loop.
//!
//! Samples are kept exactly, in nanoseconds, for the length of one report
//! window. Percentiles interpolate between the two closest ranks at
//! position `p * (n + 1)`, clamping to the minimum and maximum sample.

use std::time::Duration;

use serde::Serialize;

/// Percentiles reported for every window, in the order they are printed.
pub const REPORTED_PERCENTILES: [f64; 3] = [0.90, 0.99, 0.999];

#[derive(Debug, Clone, Default)]
pub struct LatencyHistogram {
    samples: Vec<u64>,
}

/// Summary of one window. All values are nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramSnapshot {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p90: f64,
    pub p99: f64,
    pub p999: f64,
}

impl LatencyHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, elapsed: Duration) {
        self.update(u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX));
    }

    pub fn update(&mut self, nanos: u64) {
        self.samples.push(nanos);
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: u128 = self.samples.iter().map(|&s| u128::from(s)).sum();
        Some(sum as f64 / self.samples.len() as f64)
    }

    pub fn percentile(&self, p: f64) -> Option<f64> {
        let mut sorted = self.samples.clone();
        sorted.sort_unstable();
        percentile_of_sorted(&sorted, p)
    }

    /// Summarize the current window, or `None` if it has no samples.
    pub fn snapshot(&self) -> Option<HistogramSnapshot> {
        let mean = self.mean()?;
        let mut sorted = self.samples.clone();
        sorted.sort_unstable();

        let [p90, p99, p999] = REPORTED_PERCENTILES.map(|p| {
            percentile_of_sorted(&sorted, p).unwrap_or_default()
        });

        Some(HistogramSnapshot {
            count: sorted.len(),
            min: sorted[0] as f64,
            max: sorted[sorted.len() - 1] as f64,
            mean,
            p90,
            p99,
            p999,
        })
    }

    /// Summarize and clear in one step.
    pub fn take_snapshot(&mut self) -> Option<HistogramSnapshot> {
        let snapshot = self.snapshot();
        self.clear();
        snapshot
    }
}

fn percentile_of_sorted(sorted: &[u64], p: f64) -> Option<f64> {
    let (first, last) = (*sorted.first()?, *sorted.last()?);
    let len = sorted.len() as f64;
    let pos = p * (len + 1.0);

    if pos < 1.0 {
        return Some(first as f64);
    }
    if pos >= len {
        return Some(last as f64);
    }

    let lower = sorted[pos as usize - 1] as f64;
    let upper = sorted[pos as usize] as f64;
    Some(lower + (pos - pos.floor()) * (upper - lower))
}

/// Convert a nanosecond value from a snapshot into a printable duration.
pub fn nanos_to_duration(nanos: f64) -> Duration {
    if nanos.is_finite() && nanos > 0.0 {
        Duration::from_nanos(nanos as u64)
    } else {
        Duration::ZERO
    }
}
