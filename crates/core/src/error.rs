/// All errors raised while enumerating, converting, or invoking theory data.
///
/// `Clone` so an aggregator can replay a recorded error into every sub-test
/// that runs after it was recorded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TheoryError {
    /// No static property, field, or method matched the member name (and
    /// parameter types, for methods) on the type or any of its ancestors.
    #[error("Could not find public static member (property, field, or method) named '{member}' on {type_name}{}", parameter_suffix(.parameter_types))]
    MemberNotFound {
        member: String,
        type_name: String,
        parameter_types: Vec<String>,
    },

    /// The member returned something that is not a collection.
    #[error("Property {member} on {type_name} did not return IEnumerable")]
    NotEnumerable { member: String, type_name: String },

    /// An item yielded by a member source does not match the declared data type.
    #[error("Property {member} on {type_name} yielded an item that is not an {expected}")]
    ItemTypeMismatch {
        member: String,
        type_name: String,
        expected: String,
    },

    /// A data class did not produce a collection of the declared data type.
    #[error("{class} must implement IEnumerable<{expected}> to be used as ClassTestData({class}, {expected}) for the test method named '{method}' on {declaring_type}")]
    ClassDataNotEnumerable {
        class: String,
        expected: String,
        method: String,
        declaring_type: String,
    },

    /// The discoverer named by a data attribute could not be used.
    #[error("Data discoverer specified for {attribute} on {class}.{method} {reason}")]
    Discoverer {
        attribute: String,
        class: String,
        method: String,
        reason: String,
    },

    /// A data discoverer returned no data at all.
    #[error("Test data returned null for {class}.{method}. Make sure it is statically initialized before this test method is called.")]
    NullData { class: String, method: String },

    /// Wrapper around a failure raised by user code invoked through the
    /// registry (member accessors, data factories).
    #[error("Exception has been thrown by the target of an invocation ({member}): {source}")]
    Invocation {
        member: String,
        #[source]
        source: Box<TheoryError>,
    },

    /// A generic method definition has no closed instantiation for the
    /// inferred type arguments.
    #[error("No instantiation of generic method {method} is registered for <{types}>")]
    GenericInstantiationMissing { method: String, types: String },

    /// Argument count did not match the method's parameter count.
    #[error("The test method expected {expected} parameter value{}, but {actual} parameter value{} {} provided.", plural(.expected), plural(.actual), was_were(.actual))]
    ParameterCountMismatch { expected: usize, actual: usize },

    /// An argument could not be bound to its parameter.
    #[error("Object of type '{actual}' cannot be converted to type '{expected}'.")]
    ArgumentType { actual: String, expected: String },

    /// A test body returned a failure.
    #[error("{0}")]
    Assertion(String),

    /// A test body or data factory panicked.
    #[error("panicked: {0}")]
    Panic(String),

    /// Disposing a data row element failed.
    #[error("failed to dispose {type_name}: {message}")]
    Dispose { type_name: String, message: String },

    /// A user data factory reported a failure.
    #[error("{0}")]
    User(String),

    /// Reported by a test case that discovery turned into an error.
    #[error("{0}")]
    ExecutionError(String),

    /// A test case could not be rebuilt from its serialized form.
    #[error("deserialization error: {0}")]
    Deserialize(String),

    /// Unexpected failure while pre-enumerating a theory; aborts discovery
    /// of the whole method.
    #[error("Exception thrown during theory discovery on '{class}.{method}'; falling back to single test case.\n{source}")]
    DiscoveryFailed {
        class: String,
        method: String,
        #[source]
        source: Box<TheoryError>,
    },

    /// Several errors collected by one aggregator.
    #[error("{}", join_errors(.0))]
    Aggregate(Vec<TheoryError>),
}

impl TheoryError {
    /// Configuration and shape errors are local to one data attribute during
    /// pre-enumeration; everything else aborts discovery of the method.
    pub fn is_data_shape_error(&self) -> bool {
        matches!(
            self,
            TheoryError::MemberNotFound { .. }
                | TheoryError::NotEnumerable { .. }
                | TheoryError::ItemTypeMismatch { .. }
                | TheoryError::ClassDataNotEnumerable { .. }
        )
    }

    /// Strips every `Invocation` wrapper and returns the root cause.
    pub fn unwrap_invocation(self) -> TheoryError {
        let mut error = self;
        while let TheoryError::Invocation { source, .. } = error {
            error = *source;
        }
        error
    }
}

fn parameter_suffix(parameter_types: &[String]) -> String {
    if parameter_types.is_empty() {
        String::new()
    } else {
        format!(" with parameter types: {}", parameter_types.join(", "))
    }
}

fn plural(count: &usize) -> &'static str {
    if *count == 1 {
        ""
    } else {
        "s"
    }
}

fn was_were(count: &usize) -> &'static str {
    if *count == 1 {
        "was"
    } else {
        "were"
    }
}

fn join_errors(errors: &[TheoryError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Errors loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A numbering format string is malformed.
    #[error("invalid test number format '{format}': {reason}")]
    InvalidFormat { format: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_not_found_lists_parameter_types() {
        let err = TheoryError::MemberNotFound {
            member: "Rows".to_string(),
            type_name: "CalculatorTests".to_string(),
            parameter_types: vec!["i64".to_string(), "(null)".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Could not find public static member (property, field, or method) named 'Rows' on CalculatorTests with parameter types: i64, (null)"
        );
    }

    #[test]
    fn member_not_found_without_parameters() {
        let err = TheoryError::MemberNotFound {
            member: "Rows".to_string(),
            type_name: "CalculatorTests".to_string(),
            parameter_types: vec![],
        };
        assert!(err.to_string().ends_with("on CalculatorTests"));
    }

    #[test]
    fn unwrap_invocation_strips_nested_wrappers() {
        let err = TheoryError::Invocation {
            member: "outer".to_string(),
            source: Box::new(TheoryError::Invocation {
                member: "inner".to_string(),
                source: Box::new(TheoryError::User("boom".to_string())),
            }),
        };
        assert_eq!(err.unwrap_invocation(), TheoryError::User("boom".to_string()));
    }

    #[test]
    fn parameter_count_mismatch_grammar() {
        let err = TheoryError::ParameterCountMismatch {
            expected: 1,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "The test method expected 1 parameter value, but 2 parameter values were provided."
        );
    }

    #[test]
    fn shape_errors_are_local() {
        assert!(TheoryError::NotEnumerable {
            member: "m".to_string(),
            type_name: "T".to_string()
        }
        .is_data_shape_error());
        assert!(!TheoryError::User("x".to_string()).is_data_shape_error());
    }
}
