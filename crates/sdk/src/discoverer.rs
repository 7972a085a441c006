//! Pre-enumeration of theories at discovery time.
//!
//! [`NumberedTheoryDiscoverer::discover`] turns one test method into its
//! test cases:
//!
//! 1. a skipped theory yields one skipped case and no data is touched;
//! 2. with pre-enumeration disabled, one deferred [`TestCaseKind::Theory`]
//!    case is returned;
//! 3. otherwise every data attribute is enumerated in declaration order and
//!    each row becomes its own numbered case.
//!
//! Any attribute whose discoverer opts out of discovery enumeration, and any
//! row that cannot be serialized, collapses the whole method back to a
//! single deferred case.
//!
//! [`TestCaseKind::Theory`]: crate::test_case::TestCaseKind::Theory

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use theoria_core::reflect::panic_message;
use theoria_core::{DataAttribute, DataRow, DiscoveryOptions, TestMethod, TheoryError};
use tracing::{debug, info};

use crate::discovery::{DataDiscoverer, DiscovererRegistry};
use crate::probe::SerializationProbe;
use crate::test_case::TestCase;

/// Discovers numbered test cases for theories.
pub struct NumberedTheoryDiscoverer {
    registry: Arc<DiscovererRegistry>,
    probe: Arc<dyn SerializationProbe>,
}

impl NumberedTheoryDiscoverer {
    pub fn new(registry: Arc<DiscovererRegistry>, probe: Arc<dyn SerializationProbe>) -> Self {
        NumberedTheoryDiscoverer { registry, probe }
    }

    /// Test cases for `test_method`.
    ///
    /// Fails with [`TheoryError::DiscoveryFailed`] when enumerating data
    /// raises anything other than a data shape error.
    pub fn discover(
        &self,
        options: &DiscoveryOptions,
        test_method: &TestMethod,
    ) -> Result<Vec<TestCase>, TheoryError> {
        let theory = test_method.method().theory_attribute();

        if let Some(reason) = &theory.skip {
            return Ok(vec![TestCase::skipped_theory(
                options,
                test_method.clone(),
                reason.clone(),
            )]);
        }

        if !options.pre_enumerate_theories {
            return Ok(vec![TestCase::theory(options, test_method.clone())]);
        }

        self.pre_enumerate(options, test_method)
            .map_err(|source| TheoryError::DiscoveryFailed {
                class: test_method.class_name().to_string(),
                method: test_method.method_name().to_string(),
                source: Box::new(source),
            })
    }

    fn pre_enumerate(
        &self,
        options: &DiscoveryOptions,
        test_method: &TestMethod,
    ) -> Result<Vec<TestCase>, TheoryError> {
        let theory = test_method.method().theory_attribute();
        let mut results = Vec::new();
        let mut test_id = theory.ordering.starting_test_number;

        for attribute in test_method.method().data_attributes() {
            let discoverer = match self.registry.resolve(&attribute.discoverer) {
                Ok(discoverer) => discoverer,
                Err(lookup) => {
                    let error = lookup.to_theory_error(attribute, test_method);
                    diagnostic(options, &error.to_string());
                    results.push(TestCase::execution_error(
                        options,
                        test_method.clone(),
                        error.to_string(),
                    ));
                    continue;
                }
            };

            if !discoverer.supports_discovery_enumeration(attribute, test_method) {
                diagnostic(
                    options,
                    &format!(
                        "{} on '{}' does not support discovery enumeration; falling back to single test case.",
                        attribute.name(),
                        test_method.qualified_name()
                    ),
                );
                return Ok(vec![TestCase::theory(options, test_method.clone())]);
            }

            let rows = match enumerate(discoverer.as_ref(), attribute, test_method) {
                Ok(Some(rows)) => rows,
                Ok(None) => {
                    let error = TheoryError::NullData {
                        class: test_method.class_name().to_string(),
                        method: test_method.method_name().to_string(),
                    };
                    results.push(TestCase::execution_error(
                        options,
                        test_method.clone(),
                        error.to_string(),
                    ));
                    continue;
                }
                Err(e) if e.is_data_shape_error() => {
                    debug!(
                        method = %test_method.qualified_name(),
                        attribute = %attribute.name(),
                        error = %e,
                        "data attribute failed to enumerate"
                    );
                    results.push(TestCase::execution_error(
                        options,
                        test_method.clone(),
                        e.to_string(),
                    ));
                    continue;
                }
                Err(e) => return Err(e),
            };

            for row in rows {
                if let Some(type_name) = self.probe.first_unserializable(&row) {
                    diagnostic(
                        options,
                        &format!(
                            "Non-serializable data ('{}') found for '{}'; falling back to single test case.",
                            type_name,
                            test_method.qualified_name()
                        ),
                    );
                    return Ok(vec![TestCase::theory(options, test_method.clone())]);
                }

                let id = theory.test_id_for(test_id);
                results.push(match &attribute.skip {
                    Some(reason) => TestCase::skipped_data_row(
                        options,
                        test_method.clone(),
                        row,
                        id,
                        reason.clone(),
                    ),
                    None => TestCase::data_row(options, test_method.clone(), row, id),
                });
                test_id += 1;
            }
        }

        if results.is_empty() {
            results.push(TestCase::execution_error(
                options,
                test_method.clone(),
                format!("No data found for {}", test_method.qualified_name()),
            ));
        }

        debug!(
            method = %test_method.qualified_name(),
            cases = results.len(),
            "pre-enumerated theory"
        );
        Ok(results)
    }
}

/// Rows from `discoverer`, with panics in user data code turned into errors.
pub(crate) fn enumerate(
    discoverer: &dyn DataDiscoverer,
    attribute: &DataAttribute,
    test_method: &TestMethod,
) -> Result<Option<Vec<DataRow>>, TheoryError> {
    panic::catch_unwind(AssertUnwindSafe(|| discoverer.get_data(attribute, test_method)))
        .unwrap_or_else(|payload| Err(TheoryError::Panic(panic_message(payload.as_ref()))))
}

fn diagnostic(options: &DiscoveryOptions, message: &str) {
    if options.diagnostic_messages {
        info!("{}", message);
    } else {
        debug!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::CodecSerializationProbe;
    use crate::test_case::TestCaseKind;
    use theoria_core::{row, MethodInfo, TestClass, TheoryAttribute, TypeTag};

    fn discoverer() -> NumberedTheoryDiscoverer {
        NumberedTheoryDiscoverer::new(
            Arc::new(DiscovererRegistry::with_builtins()),
            Arc::new(CodecSerializationProbe::default()),
        )
    }

    fn method(info: MethodInfo) -> TestMethod {
        let class = Arc::new(TestClass::new("Calc").method(info));
        let method = class.declared_methods()[0].clone();
        TestMethod::new(class, method)
    }

    fn add() -> MethodInfo {
        MethodInfo::new("Add")
            .param("a", TypeTag::Int)
            .param("b", TypeTag::Int)
            .param("expected", TypeTag::Int)
    }

    #[test]
    fn numbers_rows_across_attributes() {
        let method = method(
            add()
                .data(DataAttribute::inline(row![9, 1, 10]))
                .data(DataAttribute::inline(row![1, 1, 2])),
        );
        let cases = discoverer()
            .discover(&DiscoveryOptions::default(), &method)
            .unwrap();
        let names: Vec<&str> = cases.iter().map(|c| c.display_name()).collect();
        assert_eq!(
            names,
            vec![
                "  1) Calc.Add(a: 9, b: 1, expected: 10)",
                "  2) Calc.Add(a: 1, b: 1, expected: 2)",
            ]
        );
    }

    #[test]
    fn skipped_theory_does_not_enumerate() {
        let method = method(
            add()
                .theory(TheoryAttribute::formatted().with_skip("later"))
                .data(DataAttribute::inline(row![1, 2, 3])),
        );
        let cases = discoverer()
            .discover(&DiscoveryOptions::default(), &method)
            .unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].kind(), &TestCaseKind::SkippedTheory);
    }

    #[test]
    fn disabled_pre_enumeration_defers() {
        let method = method(add().data(DataAttribute::inline(row![1, 2, 3])));
        let options = DiscoveryOptions {
            pre_enumerate_theories: false,
            ..DiscoveryOptions::default()
        };
        let cases = discoverer().discover(&options, &method).unwrap();
        assert_eq!(cases.len(), 1);
        assert!(cases[0].kind().is_deferred());
    }

    #[test]
    fn no_attributes_means_no_data() {
        let cases = discoverer()
            .discover(&DiscoveryOptions::default(), &method(add()))
            .unwrap();
        assert_eq!(
            cases[0].kind(),
            &TestCaseKind::ExecutionError {
                message: "No data found for Calc.Add".to_string()
            }
        );
    }
}
