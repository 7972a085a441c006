//! Runs one sub-test: one invocation of a test method with one argument set.

use std::sync::Arc;

use theoria_core::{MethodInfo, Value};

use super::RunContext;
use crate::aggregator::{ExceptionAggregator, ExecutionTimer, RunSummary};
use crate::message::{Message, Test};

/// One sub-test.
///
/// The aggregator is a snapshot of the owning case's aggregator: errors
/// recorded before the test runs fail it without invoking the method.
pub struct TestRunner {
    test: Test,
    method: Arc<MethodInfo>,
    arguments: Vec<Value>,
    skip_reason: Option<String>,
    aggregator: ExceptionAggregator,
    context: RunContext,
}

impl TestRunner {
    pub fn new(
        test: Test,
        method: Arc<MethodInfo>,
        arguments: Vec<Value>,
        skip_reason: Option<String>,
        aggregator: ExceptionAggregator,
        context: RunContext,
    ) -> Self {
        TestRunner {
            test,
            method,
            arguments,
            skip_reason,
            aggregator,
            context,
        }
    }

    pub fn test(&self) -> &Test {
        &self.test
    }

    /// `TestStarting`, then `TestSkipped`, `TestPassed` or `TestFailed`,
    /// then `TestFinished`. Reporting stops at the first rejected message.
    pub async fn run(mut self) -> RunSummary {
        let mut summary = RunSummary {
            total: 1,
            ..RunSummary::default()
        };

        let starting = Message::TestStarting {
            test: self.test.clone(),
        };
        if !self.context.queue(starting).await {
            return summary;
        }

        let result = match self.skip_reason.take() {
            Some(reason) => {
                summary.skipped = 1;
                Message::TestSkipped {
                    test: self.test.clone(),
                    reason,
                }
            }
            None => {
                if !self.aggregator.has_errors() {
                    tokio::task::yield_now().await;
                    let mut timer = ExecutionTimer::new();
                    let (method, arguments) = (&self.method, &self.arguments);
                    let aggregator = &mut self.aggregator;
                    timer.aggregate(|| aggregator.run(|| method.invoke(arguments)));
                    summary.time = timer.total();
                }
                match self.aggregator.to_error() {
                    None => Message::TestPassed {
                        test: self.test.clone(),
                        time: summary.time,
                    },
                    Some(error) => {
                        summary.failed = 1;
                        Message::TestFailed {
                            test: self.test.clone(),
                            time: summary.time,
                            error,
                        }
                    }
                }
            }
        };
        if !self.context.queue(result).await {
            return summary;
        }

        self.context
            .queue(Message::TestFinished {
                test: self.test,
                time: summary.time,
            })
            .await;
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::CollectingMessageBus;
    use theoria_core::{TheoryError, TypeTag};

    fn test(name: &str) -> Test {
        Test {
            test_case_id: "case".to_string(),
            display_name: name.to_string(),
        }
    }

    fn is_positive() -> Arc<MethodInfo> {
        Arc::new(
            MethodInfo::new("IsPositive")
                .param("n", TypeTag::Int)
                .body(|args| match args[0].as_int() {
                    Some(n) if n > 0 => Ok(()),
                    _ => Err("not positive".to_string()),
                }),
        )
    }

    #[tokio::test]
    async fn passing_and_failing_invocations() {
        let bus = CollectingMessageBus::new();
        let context = RunContext::new(Arc::new(bus.clone()));

        let passed = TestRunner::new(
            test("ok"),
            is_positive(),
            vec![Value::Int(1)],
            None,
            ExceptionAggregator::new(),
            context.clone(),
        )
        .run()
        .await;
        let failed = TestRunner::new(
            test("bad"),
            is_positive(),
            vec![Value::Int(-1)],
            None,
            ExceptionAggregator::new(),
            context,
        )
        .run()
        .await;

        assert_eq!((passed.total, passed.failed), (1, 0));
        assert_eq!((failed.total, failed.failed), (1, 1));
        assert_eq!(
            bus.kinds(),
            vec![
                "TestStarting",
                "TestPassed",
                "TestFinished",
                "TestStarting",
                "TestFailed",
                "TestFinished"
            ]
        );
        assert_eq!(
            bus.failures(),
            vec![("bad".to_string(), TheoryError::Assertion("not positive".to_string()))]
        );
    }

    #[tokio::test]
    async fn skip_reason_wins() {
        let bus = CollectingMessageBus::new();
        let summary = TestRunner::new(
            test("skipped"),
            is_positive(),
            vec![Value::Int(-1)],
            Some("flaky".to_string()),
            ExceptionAggregator::new(),
            RunContext::new(Arc::new(bus.clone())),
        )
        .run()
        .await;
        assert_eq!(summary.skipped, 1);
        assert_eq!(bus.kinds(), vec!["TestStarting", "TestSkipped", "TestFinished"]);
    }

    #[tokio::test]
    async fn recorded_errors_fail_without_invoking() {
        let bus = CollectingMessageBus::new();
        let mut aggregator = ExceptionAggregator::new();
        aggregator.add(TheoryError::User("setup broke".to_string()));
        let method = Arc::new(MethodInfo::new("Never").body(|_| panic!("must not run")));

        let summary = TestRunner::new(
            test("t"),
            method,
            vec![],
            None,
            aggregator,
            RunContext::new(Arc::new(bus.clone())),
        )
        .run()
        .await;
        assert_eq!(summary.failed, 1);
        assert_eq!(
            bus.failures(),
            vec![("t".to_string(), TheoryError::User("setup broke".to_string()))]
        );
    }

    #[tokio::test]
    async fn rejection_cancels_and_stops_reporting() {
        let bus = CollectingMessageBus::accepting(1);
        let context = RunContext::new(Arc::new(bus.clone()));
        TestRunner::new(
            test("t"),
            is_positive(),
            vec![Value::Int(1)],
            None,
            ExceptionAggregator::new(),
            context.clone(),
        )
        .run()
        .await;
        assert_eq!(bus.kinds(), vec!["TestStarting"]);
        assert!(context.cancellation.is_cancellation_requested());
    }
}
