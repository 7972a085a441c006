//! Runner for theories whose data is enumerated at run time.

use std::sync::Arc;

use async_trait::async_trait;
use theoria_core::{DataObject, MethodInfo, TestCaseInfo, TheoryError, TypeTag, Value};
use tracing::debug;

use super::{case_test, dispose_all, report_failure, RunContext, TestCaseLifecycle, TestRunner};
use crate::aggregator::{ExceptionAggregator, RunSummary};
use crate::discoverer::enumerate;
use crate::discovery::DiscovererRegistry;
use crate::message::Test;
use crate::test_case::{format_display_name, TestCase};

/// A sub-test prepared during setup.
struct PendingTest {
    test: Test,
    method: Arc<MethodInfo>,
    arguments: Vec<Value>,
    skip_reason: Option<String>,
}

/// Runs a deferred theory case: enumerates every data attribute, then runs
/// one sub-test per row in attribute-then-row order.
///
/// Rows are numbered from 1 on every run, whatever starting number the
/// theory configures, and only when ordering is enabled. Discoverer lookup
/// failures and null data are recorded against the case and fail every
/// sub-test. Any other enumeration error aborts setup and is reported as a
/// single failed test.
pub struct TheoryTestCaseRunner {
    test_case: TestCase,
    registry: Arc<DiscovererRegistry>,
    context: RunContext,
    aggregator: ExceptionAggregator,
    cleanup_aggregator: ExceptionAggregator,
    pending: Vec<PendingTest>,
    to_dispose: Vec<Arc<dyn DataObject>>,
    data_discovery_error: Option<TheoryError>,
}

impl TheoryTestCaseRunner {
    pub fn new(test_case: TestCase, registry: Arc<DiscovererRegistry>, context: RunContext) -> Self {
        TheoryTestCaseRunner {
            test_case,
            registry,
            context,
            aggregator: ExceptionAggregator::new(),
            cleanup_aggregator: ExceptionAggregator::new(),
            pending: Vec::new(),
            to_dispose: Vec::new(),
            data_discovery_error: None,
        }
    }

    fn discover_rows(&mut self) -> Result<(), TheoryError> {
        let test_method = self.test_case.test_method().clone();
        let method = test_method.method();
        let theory = method.theory_attribute();
        let base_display_name = self.test_case.display_name().to_string();
        let mut test_id = 0;

        for attribute in method.data_attributes() {
            let discoverer = match self.registry.resolve(&attribute.discoverer) {
                Ok(discoverer) => discoverer,
                Err(lookup) => {
                    self.aggregator.add(lookup.to_theory_error(attribute, &test_method));
                    continue;
                }
            };

            let Some(rows) = enumerate(discoverer.as_ref(), attribute, &test_method)? else {
                self.aggregator.add(TheoryError::NullData {
                    class: test_method.class_name().to_string(),
                    method: test_method.method_name().to_string(),
                });
                continue;
            };

            for row in rows {
                test_id += 1;
                self.to_dispose.extend(row.disposables());

                let arguments = method.resolve_method_arguments(row.into_values());
                let (method_to_run, generic_types): (Arc<MethodInfo>, Option<Vec<TypeTag>>) =
                    if method.is_generic_method_definition() {
                        let types = method.resolve_generic_types(&arguments);
                        (Arc::new(method.make_generic_method(&types)?), Some(types))
                    } else {
                        (Arc::clone(method), None)
                    };
                let arguments = method_to_run.convert_arguments(arguments);

                let display_name = format_display_name(
                    theory,
                    &self.test_case,
                    method,
                    &base_display_name,
                    &arguments,
                    generic_types.as_deref(),
                    theory.test_id_for(test_id),
                );
                let skip_reason = self
                    .test_case
                    .skip_reason()
                    .map(str::to_string)
                    .or_else(|| attribute.skip.clone());

                self.pending.push(PendingTest {
                    test: Test {
                        test_case_id: self.test_case.unique_id().to_string(),
                        display_name,
                    },
                    method: method_to_run,
                    arguments,
                    skip_reason,
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TestCaseLifecycle for TheoryTestCaseRunner {
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
        if let Err(e) = self.discover_rows() {
            debug!(
                method = %self.test_case.test_method().qualified_name(),
                error = %e,
                "runtime data discovery failed"
            );
            self.data_discovery_error = Some(e);
        } else if self.pending.is_empty() {
            // nothing would carry the recorded errors to a result
            self.data_discovery_error = self.aggregator.to_error();
        }
    }

    async fn run_test(&mut self) -> RunSummary {
        let mut summary = match self.data_discovery_error.take() {
            Some(error) => {
                report_failure(
                    &self.context,
                    case_test(&self.test_case),
                    error.unwrap_invocation(),
                )
                .await
            }
            None => {
                let mut summary = RunSummary::default();
                for pending in std::mem::take(&mut self.pending) {
                    if self.context.cancellation.is_cancellation_requested() {
                        break;
                    }
                    let runner = TestRunner::new(
                        pending.test,
                        pending.method,
                        pending.arguments,
                        pending.skip_reason,
                        self.aggregator.clone(),
                        self.context.clone(),
                    );
                    summary += runner.run().await;
                }
                summary
            }
        };

        summary.time += dispose_all(&self.to_dispose, &mut self.cleanup_aggregator);
        summary
    }

    async fn before_test_case_finished(&mut self) {
        self.aggregator.aggregate(&self.cleanup_aggregator);
    }
}
