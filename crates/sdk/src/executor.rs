//! Runs discovered test cases and reports the outcome.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use theoria_core::TheoryError;
use tracing::{debug, info};

use crate::aggregator::RunSummary;
use crate::assembly::TestAssembly;
use crate::message::MessageBus;
use crate::runner::{RunContext, TestCaseLifecycle, TestCaseRunner, TheoryTestCaseRunner};
use crate::test_case::TestCase;

/// Summary of a full discovery and execution pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionReport {
    pub summary: RunSummary,
    /// Messages of methods that could not be discovered.
    pub discovery_errors: Vec<String>,
}

impl ExecutionReport {
    pub fn is_success(&self) -> bool {
        self.summary.failed == 0 && self.discovery_errors.is_empty()
    }
}

impl fmt::Display for ExecutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Theories: {}/{} passed ({} failed, {} skipped)",
            self.summary.passed(),
            self.summary.total,
            self.summary.failed,
            self.summary.skipped
        )?;
        for error in &self.discovery_errors {
            writeln!(f, "  DISCOVERY: {}", error)?;
        }
        Ok(())
    }
}

/// Runs test cases of one assembly against a message bus.
pub struct Executor {
    assembly: Arc<TestAssembly>,
    context: RunContext,
}

impl Executor {
    pub fn new(assembly: Arc<TestAssembly>, bus: Arc<dyn MessageBus>) -> Self {
        Executor {
            assembly,
            context: RunContext::new(bus),
        }
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    /// Run one case with the runner its kind calls for.
    pub async fn run_case(&self, test_case: TestCase) -> RunSummary {
        if test_case.kind().is_deferred() {
            TheoryTestCaseRunner::new(
                test_case,
                Arc::clone(self.assembly.registry()),
                self.context.clone(),
            )
            .run()
            .await
        } else {
            TestCaseRunner::new(test_case, self.context.clone()).run().await
        }
    }

    /// Run `cases` in order, stopping once the run is cancelled.
    pub async fn run_cases(&self, cases: Vec<TestCase>) -> RunSummary {
        let mut summary = RunSummary::default();
        for test_case in cases {
            if self.context.cancellation.is_cancellation_requested() {
                debug!("run cancelled; remaining test cases not started");
                break;
            }
            summary += self.run_case(test_case).await;
        }
        summary
    }

    /// Discover every method of the assembly and run the resulting cases.
    pub async fn execute(&self) -> ExecutionReport {
        let discovery = self.assembly.discover_all();
        let summary = self.run_cases(discovery.cases).await;
        let report = ExecutionReport {
            summary,
            discovery_errors: discovery
                .errors
                .iter()
                .map(TheoryError::to_string)
                .collect(),
        };
        info!(
            assembly = self.assembly.name(),
            total = report.summary.total,
            failed = report.summary.failed,
            skipped = report.summary.skipped,
            "execution finished"
        );
        report
    }
}
