//! Display-name formatting for theory invocations.

use std::fmt;
use std::sync::Arc;

use crate::format::NumberFormat;
use crate::reflect::{MethodInfo, TestMethod};
use crate::theory::TheoryAttribute;
use crate::value::{TypeTag, Value};

/// Read-only view of the test case a display name is computed for.
pub trait TestCaseInfo: Send + Sync {
    fn test_method(&self) -> &TestMethod;
    fn test_id(&self) -> Option<i64>;
    fn skip_reason(&self) -> Option<&str>;
}

// ──────────────────────────────────────────────
// Formatting context
// ──────────────────────────────────────────────

/// Everything needed to name one test invocation.
///
/// Built fresh each time a display name is computed and dropped right after.
#[derive(Clone, Copy)]
pub struct DisplayNameFormattingContext<'a> {
    theory: &'a TheoryAttribute,
    test_case: &'a dyn TestCaseInfo,
    method: &'a MethodInfo,
    base_display_name: &'a str,
    arguments: &'a [Value],
    generic_types: Option<&'a [TypeTag]>,
    test_id: Option<i64>,
}

impl<'a> DisplayNameFormattingContext<'a> {
    pub fn new(
        theory: &'a TheoryAttribute,
        test_case: &'a dyn TestCaseInfo,
        method: &'a MethodInfo,
        base_display_name: &'a str,
        arguments: &'a [Value],
        generic_types: Option<&'a [TypeTag]>,
        test_id: Option<i64>,
    ) -> Self {
        DisplayNameFormattingContext {
            theory,
            test_case,
            method,
            base_display_name,
            arguments,
            generic_types,
            test_id,
        }
    }

    pub fn theory(&self) -> &'a TheoryAttribute {
        self.theory
    }

    pub fn test_case(&self) -> &'a dyn TestCaseInfo {
        self.test_case
    }

    pub fn method(&self) -> &'a MethodInfo {
        self.method
    }

    pub fn base_display_name(&self) -> &'a str {
        self.base_display_name
    }

    pub fn arguments(&self) -> &'a [Value] {
        self.arguments
    }

    pub fn generic_types(&self) -> Option<&'a [TypeTag]> {
        self.generic_types
    }

    pub fn test_id(&self) -> Option<i64> {
        self.test_id
    }

    /// Prefix `name` with the test number when one is assigned.
    pub fn numbered_display_name(&self, name: &str, format: &NumberFormat) -> String {
        match self.test_id {
            Some(id) => format.render(id, name),
            None => name.to_string(),
        }
    }

    pub fn display_name_with_arguments(&self, name: Option<&str>) -> String {
        self.method.display_name_with_arguments(
            name.unwrap_or(self.base_display_name),
            self.arguments,
            self.generic_types,
        )
    }

    pub fn arguments_with_names(&self, name: Option<&str>) -> String {
        let args = self.method.arguments_with_names(self.arguments);
        match name {
            Some(name) => format!("{} ({})", name, args),
            None => args,
        }
    }

    pub fn arguments_without_names(&self, name: Option<&str>) -> String {
        let args = self.method.arguments_without_names(self.arguments);
        match name {
            Some(name) => format!("{} ({})", name, args),
            None => args,
        }
    }
}

impl fmt::Debug for DisplayNameFormattingContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayNameFormattingContext")
            .field("method", &self.method.name())
            .field("base_display_name", &self.base_display_name)
            .field("arguments", &self.arguments)
            .field("generic_types", &self.generic_types)
            .field("test_id", &self.test_id)
            .finish()
    }
}

// ──────────────────────────────────────────────
// Custom display names
// ──────────────────────────────────────────────

/// Supplies a display name for a test invocation.
///
/// Data objects expose it through
/// [`DataObject::custom_display_name`](crate::value::DataObject::custom_display_name);
/// theories carry one as their formatter.
pub trait CustomDisplayName: Send + Sync {
    fn display_name(&self, ctx: &DisplayNameFormattingContext<'_>) -> String;
}

/// The label used by the argument-list strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    None,
    BaseName,
    Text(String),
}

impl Label {
    fn resolve<'a>(&'a self, ctx: &DisplayNameFormattingContext<'a>) -> Option<&'a str> {
        match self {
            Label::None => None,
            Label::BaseName => Some(ctx.base_display_name()),
            Label::Text(text) => Some(text.as_str()),
        }
    }
}

/// How a [`FormattedTheory`] names an invocation before numbering.
#[derive(Clone, Default)]
pub enum DefaultDisplayName {
    /// `Base(a: 1, b: 2)`.
    #[default]
    WithArguments,
    BaseName,
    ArgumentsWithNames(Label),
    ArgumentsWithoutNames(Label),
    Custom(Arc<dyn Fn(&DisplayNameFormattingContext<'_>) -> String + Send + Sync>),
}

impl fmt::Debug for DefaultDisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultDisplayName::WithArguments => write!(f, "WithArguments"),
            DefaultDisplayName::BaseName => write!(f, "BaseName"),
            DefaultDisplayName::ArgumentsWithNames(label) => {
                f.debug_tuple("ArgumentsWithNames").field(label).finish()
            }
            DefaultDisplayName::ArgumentsWithoutNames(label) => {
                f.debug_tuple("ArgumentsWithoutNames").field(label).finish()
            }
            DefaultDisplayName::Custom(_) => write!(f, "Custom"),
        }
    }
}

/// The formatter attached to formatted theories.
///
/// An argument that names itself wins outright and is never numbered;
/// otherwise the default name is prefixed with the test number using the
/// theory's ordering format.
#[derive(Debug, Clone, Default)]
pub struct FormattedTheory {
    pub default_display_name: DefaultDisplayName,
}

impl FormattedTheory {
    pub fn new(default_display_name: DefaultDisplayName) -> Self {
        FormattedTheory {
            default_display_name,
        }
    }

    pub fn default_display_name(&self, ctx: &DisplayNameFormattingContext<'_>) -> String {
        match &self.default_display_name {
            DefaultDisplayName::WithArguments => ctx.display_name_with_arguments(None),
            DefaultDisplayName::BaseName => ctx.base_display_name().to_string(),
            DefaultDisplayName::ArgumentsWithNames(label) => {
                ctx.arguments_with_names(label.resolve(ctx))
            }
            DefaultDisplayName::ArgumentsWithoutNames(label) => {
                ctx.arguments_without_names(label.resolve(ctx))
            }
            DefaultDisplayName::Custom(f) => f(ctx),
        }
    }
}

impl CustomDisplayName for FormattedTheory {
    fn display_name(&self, ctx: &DisplayNameFormattingContext<'_>) -> String {
        // first match wins when several arguments can name themselves
        if let Some(custom) = ctx
            .arguments()
            .iter()
            .find_map(Value::as_custom_display_name)
        {
            return custom.display_name(ctx);
        }

        let name = self.default_display_name(ctx);
        ctx.numbered_display_name(&name, &ctx.theory().ordering.test_number_display_name_format)
    }
}
