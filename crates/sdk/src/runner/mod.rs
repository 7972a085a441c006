//! Test case runners.
//!
//! Every runner follows the same lifecycle, provided by
//! [`TestCaseLifecycle::run`]:
//!
//! 1. `TestCaseStarting` (a rejected message cancels the run; nothing else
//!    is reported for the case)
//! 2. [`after_test_case_starting`](TestCaseLifecycle::after_test_case_starting)
//! 3. [`run_test`](TestCaseLifecycle::run_test)
//! 4. the case aggregator is cleared, then
//!    [`before_test_case_finished`](TestCaseLifecycle::before_test_case_finished)
//! 5. `TestCaseCleanupFailure` if the aggregator holds errors again
//! 6. `TestCaseFinished`

pub mod test_case_runner;
pub mod test_runner;
pub mod theory_runner;

pub use test_case_runner::TestCaseRunner;
pub use test_runner::TestRunner;
pub use theory_runner::TheoryTestCaseRunner;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use theoria_core::{DataObject, TheoryError};
use tracing::warn;

use crate::aggregator::{CancellationTokenSource, ExceptionAggregator, ExecutionTimer, RunSummary};
use crate::message::{Message, MessageBus, Test};
use crate::test_case::TestCase;

/// Collaborators shared by every runner of one run.
#[derive(Clone)]
pub struct RunContext {
    pub bus: Arc<dyn MessageBus>,
    pub cancellation: CancellationTokenSource,
}

impl RunContext {
    pub fn new(bus: Arc<dyn MessageBus>) -> Self {
        RunContext {
            bus,
            cancellation: CancellationTokenSource::new(),
        }
    }

    /// Queue `message`, cancelling the run if the bus rejects it.
    pub async fn queue(&self, message: Message) -> bool {
        let accepted = self.bus.queue_message(message).await;
        if !accepted {
            self.cancellation.cancel();
        }
        accepted
    }
}

/// The shared test case lifecycle.
#[async_trait]
pub trait TestCaseLifecycle: Send {
    fn test_case(&self) -> &TestCase;

    fn context(&self) -> &RunContext;

    fn aggregator(&mut self) -> &mut ExceptionAggregator;

    async fn after_test_case_starting(&mut self) {}

    async fn run_test(&mut self) -> RunSummary;

    async fn before_test_case_finished(&mut self) {}

    async fn run(&mut self) -> RunSummary {
        let test_case_id = self.test_case().unique_id().to_string();
        let context = self.context().clone();

        let starting = Message::TestCaseStarting {
            test_case_id: test_case_id.clone(),
            display_name: self.test_case().display_name().to_string(),
        };
        // A case whose start was rejected never began, so it gets no
        // `TestCaseFinished` either.
        if !context.queue(starting).await {
            return RunSummary::default();
        }

        self.after_test_case_starting().await;
        let summary = self.run_test().await;

        self.aggregator().clear();
        self.before_test_case_finished().await;

        if let Some(error) = self.aggregator().to_error() {
            let failure = Message::TestCaseCleanupFailure {
                test_case_id: test_case_id.clone(),
                error,
            };
            context.queue(failure).await;
        }

        context
            .queue(Message::TestCaseFinished {
                test_case_id,
                summary,
            })
            .await;
        summary
    }
}

/// Report `test` as one failed result: `TestStarting`, `TestFailed`,
/// `TestFinished`, stopping at the first rejected message.
pub(crate) async fn report_failure(context: &RunContext, test: Test, error: TheoryError) -> RunSummary {
    let summary = RunSummary {
        total: 1,
        failed: 1,
        ..RunSummary::default()
    };

    if !context.queue(Message::TestStarting { test: test.clone() }).await {
        return summary;
    }
    let failed = Message::TestFailed {
        test: test.clone(),
        time: Duration::ZERO,
        error,
    };
    if !context.queue(failed).await {
        return summary;
    }
    context
        .queue(Message::TestFinished {
            test,
            time: Duration::ZERO,
        })
        .await;
    summary
}

/// Dispose every object, recording failures in `cleanup`. Returns the time
/// spent disposing.
pub(crate) fn dispose_all(objects: &[Arc<dyn DataObject>], cleanup: &mut ExceptionAggregator) -> Duration {
    let mut timer = ExecutionTimer::new();
    for object in objects {
        let Some(disposable) = object.disposable() else {
            continue;
        };
        timer.aggregate(|| {
            cleanup.run(|| {
                disposable.dispose().map_err(|message| {
                    warn!(type_name = object.type_name(), %message, "dispose failed");
                    TheoryError::Dispose {
                        type_name: object.type_name().to_string(),
                        message,
                    }
                })
            })
        });
    }
    timer.total()
}

/// The test a case reports under its own display name.
pub(crate) fn case_test(test_case: &TestCase) -> Test {
    Test {
        test_case_id: test_case.unique_id().to_string(),
        display_name: test_case.display_name().to_string(),
    }
}
