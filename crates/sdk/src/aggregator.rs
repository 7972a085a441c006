//! Run bookkeeping: error aggregation, run summaries, timing and
//! cooperative cancellation.

use std::ops::AddAssign;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use theoria_core::reflect::panic_message;
use theoria_core::TheoryError;

// ──────────────────────────────────────────────
// ExceptionAggregator
// ──────────────────────────────────────────────

/// Collects errors from operations that must not stop the surrounding run.
#[derive(Debug, Clone, Default)]
pub struct ExceptionAggregator {
    errors: Vec<TheoryError>,
}

impl ExceptionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, error: TheoryError) {
        self.errors.push(error);
    }

    /// Run `f`, recording its error or panic.
    pub fn run<F>(&mut self, f: F)
    where
        F: FnOnce() -> Result<(), TheoryError>,
    {
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => self.add(e),
            Err(payload) => self.add(TheoryError::Panic(panic_message(payload.as_ref()))),
        }
    }

    /// Absorb every error recorded by `other`.
    pub fn aggregate(&mut self, other: &ExceptionAggregator) {
        self.errors.extend(other.errors.iter().cloned());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[TheoryError] {
        &self.errors
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }

    /// The single recorded error, or an `Aggregate` of all of them.
    pub fn to_error(&self) -> Option<TheoryError> {
        match self.errors.as_slice() {
            [] => None,
            [single] => Some(single.clone()),
            many => Some(TheoryError::Aggregate(many.to_vec())),
        }
    }
}

// ──────────────────────────────────────────────
// RunSummary
// ──────────────────────────────────────────────

/// Counts and elapsed time of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub failed: usize,
    pub skipped: usize,
    pub time: Duration,
}

impl RunSummary {
    pub fn passed(&self) -> usize {
        self.total - self.failed - self.skipped
    }

    pub fn aggregate(&mut self, other: RunSummary) {
        self.total += other.total;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.time += other.time;
    }
}

impl AddAssign for RunSummary {
    fn add_assign(&mut self, other: RunSummary) {
        self.aggregate(other);
    }
}

// ──────────────────────────────────────────────
// ExecutionTimer
// ──────────────────────────────────────────────

/// Accumulates the wall time of the operations it runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionTimer {
    total: Duration,
}

impl ExecutionTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aggregate<T>(&mut self, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.total += start.elapsed();
        out
    }

    pub fn total(&self) -> Duration {
        self.total
    }
}

// ──────────────────────────────────────────────
// CancellationTokenSource
// ──────────────────────────────────────────────

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationTokenSource {
    cancelled: Arc<AtomicBool>,
}

impl CancellationTokenSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancellation_requested(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregator_records_errors_and_panics() {
        let mut aggregator = ExceptionAggregator::new();
        aggregator.run(|| Ok(()));
        assert!(!aggregator.has_errors());

        aggregator.run(|| Err(TheoryError::User("first".to_string())));
        aggregator.run(|| panic!("second"));
        assert_eq!(
            aggregator.errors(),
            &[
                TheoryError::User("first".to_string()),
                TheoryError::Panic("second".to_string())
            ]
        );
        assert!(matches!(aggregator.to_error(), Some(TheoryError::Aggregate(v)) if v.len() == 2));
    }

    #[test]
    fn aggregate_merges_and_clear_resets() {
        let mut cleanup = ExceptionAggregator::new();
        cleanup.add(TheoryError::User("dispose".to_string()));

        let mut main = ExceptionAggregator::new();
        main.aggregate(&cleanup);
        assert_eq!(main.to_error(), Some(TheoryError::User("dispose".to_string())));

        main.clear();
        assert_eq!(main.to_error(), None);
    }

    #[test]
    fn summaries_add_up() {
        let mut summary = RunSummary::default();
        summary += RunSummary {
            total: 2,
            failed: 1,
            skipped: 0,
            time: Duration::from_millis(5),
        };
        summary.aggregate(RunSummary {
            total: 1,
            failed: 0,
            skipped: 1,
            time: Duration::from_millis(5),
        });
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed(), 1);
        assert_eq!(summary.time, Duration::from_millis(10));
    }

    #[test]
    fn cancellation_is_shared_between_clones() {
        let source = CancellationTokenSource::new();
        let clone = source.clone();
        clone.cancel();
        assert!(source.is_cancellation_requested());
    }
}
