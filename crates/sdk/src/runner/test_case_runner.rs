//! Runner for test cases that were fully resolved at discovery time.

use std::sync::Arc;

use async_trait::async_trait;
use theoria_core::{DataObject, DataRow, MethodInfo, TestCaseInfo, TheoryError, Value};

use super::{case_test, dispose_all, report_failure, RunContext, TestCaseLifecycle, TestRunner};
use crate::aggregator::{ExceptionAggregator, RunSummary};
use crate::test_case::{TestCase, TestCaseKind};

/// Runs data-row, skipped and execution-error cases.
///
/// A data row runs as a single sub-test. A generic method is closed over
/// the types recorded at discovery; a missing instantiation fails the test.
pub struct TestCaseRunner {
    test_case: TestCase,
    context: RunContext,
    aggregator: ExceptionAggregator,
    cleanup_aggregator: ExceptionAggregator,
    method: Arc<MethodInfo>,
    arguments: Vec<Value>,
    to_dispose: Vec<Arc<dyn DataObject>>,
}

impl TestCaseRunner {
    pub fn new(test_case: TestCase, context: RunContext) -> Self {
        let method = Arc::clone(test_case.test_method().method());
        let arguments = test_case.arguments().to_vec();
        TestCaseRunner {
            test_case,
            context,
            aggregator: ExceptionAggregator::new(),
            cleanup_aggregator: ExceptionAggregator::new(),
            method,
            arguments,
            to_dispose: Vec::new(),
        }
    }
}

#[async_trait]
impl TestCaseLifecycle for TestCaseRunner {
    fn test_case(&self) -> &TestCase {
        &self.test_case
    }

    fn context(&self) -> &RunContext {
        &self.context
    }

    fn aggregator(&mut self) -> &mut ExceptionAggregator {
        &mut self.aggregator
    }

    async fn after_test_case_starting(&mut self) {
        if !matches!(
            self.test_case.kind(),
            TestCaseKind::DataRow | TestCaseKind::SkippedDataRow
        ) {
            return;
        }

        self.to_dispose = DataRow::new(self.arguments.clone()).disposables();

        if let Some(types) = self.test_case.generic_types() {
            match self.method.make_generic_method(types) {
                Ok(closed) => self.method = Arc::new(closed),
                Err(e) => {
                    self.aggregator.add(e);
                    return;
                }
            }
        }
        self.arguments = self.method.convert_arguments(std::mem::take(&mut self.arguments));
    }

    async fn run_test(&mut self) -> RunSummary {
        let test = case_test(&self.test_case);

        let mut summary = match self.test_case.kind() {
            TestCaseKind::ExecutionError { message } => {
                report_failure(&self.context, test, TheoryError::ExecutionError(message.clone())).await
            }
            _ => {
                TestRunner::new(
                    test,
                    Arc::clone(&self.method),
                    self.arguments.clone(),
                    self.test_case.skip_reason().map(str::to_string),
                    self.aggregator.clone(),
                    self.context.clone(),
                )
                .run()
                .await
            }
        };

        summary.time += dispose_all(&self.to_dispose, &mut self.cleanup_aggregator);
        summary
    }

    async fn before_test_case_finished(&mut self) {
        self.aggregator.aggregate(&self.cleanup_aggregator);
    }
}
