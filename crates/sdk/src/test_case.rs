//! Test cases produced by discovery.
//!
//! A pre-enumerated theory yields one [`TestCase`] per data row; everything
//! else yields a single case that either reports a problem, is skipped, or
//! defers data enumeration to run time.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use theoria_core::reflect::format_argument;
use theoria_core::{
    DataRow, DiscoveryOptions, DisplayNameFormattingContext, MethodDisplay, MethodInfo,
    SerializationInfo, SerializedValue, TestCaseInfo, TestMethod, TheoryAttribute, TheoryError,
    TypeTag, Value,
};

use crate::assembly::TestAssembly;

/// What a test case runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TestCaseKind {
    /// One pre-enumerated data row.
    DataRow,
    /// A pre-enumerated row whose data attribute is skipped.
    SkippedDataRow,
    /// The whole theory is skipped; no data was enumerated.
    SkippedTheory,
    /// Data is enumerated when the case runs.
    Theory,
    /// Discovery failed for one data attribute; running the case reports
    /// `message` as a failure.
    ExecutionError { message: String },
}

impl TestCaseKind {
    pub fn is_deferred(&self) -> bool {
        matches!(self, TestCaseKind::Theory)
    }
}

impl fmt::Display for TestCaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestCaseKind::DataRow => write!(f, "data row"),
            TestCaseKind::SkippedDataRow => write!(f, "skipped data row"),
            TestCaseKind::SkippedTheory => write!(f, "skipped theory"),
            TestCaseKind::Theory => write!(f, "theory"),
            TestCaseKind::ExecutionError { .. } => write!(f, "execution error"),
        }
    }
}

/// A discovered test case.
#[derive(Debug, Clone)]
pub struct TestCase {
    kind: TestCaseKind,
    test_method: TestMethod,
    arguments: Vec<Value>,
    test_id: Option<i64>,
    skip_reason: Option<String>,
    generic_types: Option<Vec<TypeTag>>,
    method_display: MethodDisplay,
    display_name: String,
    unique_id: String,
}

impl TestCase {
    fn build(
        kind: TestCaseKind,
        method_display: MethodDisplay,
        test_method: TestMethod,
        arguments: Vec<Value>,
        test_id: Option<i64>,
        skip_reason: Option<String>,
    ) -> Self {
        let method = test_method.method();
        let generic_types = (method.is_generic_method_definition() && !arguments.is_empty())
            .then(|| method.resolve_generic_types(&arguments));

        let mut case = TestCase {
            kind,
            test_method,
            arguments,
            test_id,
            skip_reason,
            generic_types,
            method_display,
            display_name: String::new(),
            unique_id: String::new(),
        };
        case.display_name = case.compute_display_name();
        case.unique_id = case.compute_unique_id();
        case
    }

    /// One pre-enumerated row.
    pub fn data_row(
        options: &DiscoveryOptions,
        test_method: TestMethod,
        row: DataRow,
        test_id: Option<i64>,
    ) -> Self {
        let arguments = test_method.method().resolve_method_arguments(row.into_values());
        Self::build(
            TestCaseKind::DataRow,
            options.method_display,
            test_method,
            arguments,
            test_id,
            None,
        )
    }

    /// A pre-enumerated row of a skipped data attribute.
    pub fn skipped_data_row(
        options: &DiscoveryOptions,
        test_method: TestMethod,
        row: DataRow,
        test_id: Option<i64>,
        skip_reason: impl Into<String>,
    ) -> Self {
        let arguments = test_method.method().resolve_method_arguments(row.into_values());
        Self::build(
            TestCaseKind::SkippedDataRow,
            options.method_display,
            test_method,
            arguments,
            test_id,
            Some(skip_reason.into()),
        )
    }

    pub fn skipped_theory(
        options: &DiscoveryOptions,
        test_method: TestMethod,
        skip_reason: impl Into<String>,
    ) -> Self {
        Self::build(
            TestCaseKind::SkippedTheory,
            options.method_display,
            test_method,
            Vec::new(),
            None,
            Some(skip_reason.into()),
        )
    }

    /// A case that enumerates its data at run time.
    pub fn theory(options: &DiscoveryOptions, test_method: TestMethod) -> Self {
        Self::build(
            TestCaseKind::Theory,
            options.method_display,
            test_method,
            Vec::new(),
            None,
            None,
        )
    }

    pub fn execution_error(
        options: &DiscoveryOptions,
        test_method: TestMethod,
        message: impl Into<String>,
    ) -> Self {
        Self::build(
            TestCaseKind::ExecutionError {
                message: message.into(),
            },
            options.method_display,
            test_method,
            Vec::new(),
            None,
            None,
        )
    }

    pub fn kind(&self) -> &TestCaseKind {
        &self.kind
    }

    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    pub fn generic_types(&self) -> Option<&[TypeTag]> {
        self.generic_types.as_deref()
    }

    pub fn method_display(&self) -> MethodDisplay {
        self.method_display
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Stable identity derived from the case's content.
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn theory_attribute(&self) -> &TheoryAttribute {
        self.test_method.method().theory_attribute()
    }

    /// Base display name: the theory's own name or the method in the
    /// configured style.
    pub fn base_display_name(&self) -> String {
        self.method_display.base_display_name(&self.test_method)
    }

    fn compute_display_name(&self) -> String {
        let base = self.base_display_name();
        if self.arguments.is_empty() && !matches!(self.kind, TestCaseKind::DataRow | TestCaseKind::SkippedDataRow) {
            return base;
        }
        format_display_name(
            self.theory_attribute(),
            self,
            self.test_method.method(),
            &base,
            &self.arguments,
            self.generic_types(),
            self.test_id,
        )
    }

    fn compute_unique_id(&self) -> String {
        let mut canonical = format!(
            "{}\u{1f}{}\u{1f}{}",
            self.test_method.class_name(),
            self.test_method.method_name(),
            self.kind
        );
        if let TestCaseKind::ExecutionError { message } = &self.kind {
            canonical.push('\u{1f}');
            canonical.push_str(message);
        }
        if let Some(reason) = &self.skip_reason {
            canonical.push('\u{1f}');
            canonical.push_str(reason);
        }
        if let Some(id) = self.test_id {
            canonical.push_str(&format!("\u{1f}#{}", id));
        }
        for argument in &self.arguments {
            canonical.push('\u{1f}');
            canonical.push_str(&argument.type_name());
            canonical.push('=');
            canonical.push_str(&format_argument(argument));
        }
        format!("{:x}", Sha256::digest(canonical.as_bytes()))
    }

    // ── Serialization ────────────────────────────────────────────────────

    /// Persist this case. Fails if an argument cannot be encoded.
    pub fn serialize(&self, assembly: &TestAssembly) -> Result<SerializationInfo, TheoryError> {
        let arguments = assembly.codecs().encode_all(&self.arguments).ok_or_else(|| {
            TheoryError::Deserialize(format!(
                "arguments of '{}' cannot be serialized",
                self.display_name
            ))
        })?;

        let mut info = SerializationInfo::new();
        info.add_value("Kind", &self.kind)?;
        info.add_value("ClassName", self.test_method.class_name())?;
        info.add_value("MethodName", self.test_method.method_name())?;
        info.add_value("MethodDisplay", self.method_display)?;
        info.add_value("Arguments", arguments)?;
        info.add_value("SkipReason", &self.skip_reason)?;
        info.add_value("TestId", self.test_id)?;
        Ok(info)
    }

    /// Rebuild a case persisted by [`TestCase::serialize`]. The display
    /// name and identity are recomputed.
    pub fn deserialize(info: &SerializationInfo, assembly: &TestAssembly) -> Result<Self, TheoryError> {
        let kind: TestCaseKind = info.get_value("Kind")?;
        let class_name: String = info.get_value("ClassName")?;
        let method_name: String = info.get_value("MethodName")?;
        let method_display: MethodDisplay = info.get_value("MethodDisplay")?;
        let arguments: Vec<SerializedValue> = info.get_value("Arguments")?;
        let skip_reason: Option<String> = info.get_value("SkipReason")?;
        let test_id: Option<i64> = info.get_value("TestId")?;

        let test_method = assembly.test_method(&class_name, &method_name).ok_or_else(|| {
            TheoryError::Deserialize(format!(
                "test method '{}.{}' is not registered",
                class_name, method_name
            ))
        })?;
        let arguments = assembly.codecs().decode_all(arguments)?;

        Ok(Self::build(
            kind,
            method_display,
            test_method,
            arguments,
            test_id,
            skip_reason,
        ))
    }
}

impl TestCaseInfo for TestCase {
    fn test_method(&self) -> &TestMethod {
        &self.test_method
    }

    fn test_id(&self) -> Option<i64> {
        self.test_id
    }

    fn skip_reason(&self) -> Option<&str> {
        self.skip_reason.as_deref()
    }
}

/// Display name of one invocation: the theory's formatter when it has one,
/// otherwise `Base(name: value, ...)`.
pub fn format_display_name(
    theory: &TheoryAttribute,
    test_case: &dyn TestCaseInfo,
    method: &MethodInfo,
    base_display_name: &str,
    arguments: &[Value],
    generic_types: Option<&[TypeTag]>,
    test_id: Option<i64>,
) -> String {
    match &theory.formatter {
        Some(formatter) => {
            let ctx = DisplayNameFormattingContext::new(
                theory,
                test_case,
                method,
                base_display_name,
                arguments,
                generic_types,
                test_id,
            );
            formatter.display_name(&ctx)
        }
        None => method.display_name_with_arguments(base_display_name, arguments, generic_types),
    }
}
