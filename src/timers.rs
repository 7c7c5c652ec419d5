//! Phase timing for preparation and instrumented evaluation.
//!
//! [`timed`] charges the wall-clock time of a closure to one `Duration`
//! slot of [`PreparePhases`](crate::metrics::PreparePhases) or
//! [`EvaluationPhases`](crate::metrics::EvaluationPhases). The time is
//! charged on drop, so a phase that exits early through `?` still counts.

use std::time::{Duration, Instant};

struct PhaseTimer<'a> {
    start: Instant,
    slot: &'a mut Duration,
}

impl Drop for PhaseTimer<'_> {
    fn drop(&mut self) {
        *self.slot += self.start.elapsed();
    }
}

/// Run `f`, charging its wall-clock time to `slot`.
pub fn timed<T>(slot: &mut Duration, f: impl FnOnce() -> T) -> T {
    let _timer = PhaseTimer {
        start: Instant::now(),
        slot,
    };
    f()
}
