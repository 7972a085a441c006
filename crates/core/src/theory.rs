//! Theory declarations and their ordering configuration.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::display::{CustomDisplayName, DefaultDisplayName, FormattedTheory};
use crate::format::NumberFormat;

/// Sequential numbering settings shared by every row of one theory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderedTheoryConfig {
    /// Prefix display names with a test number. Default: `true`.
    pub enable_ordered_tests: bool,
    /// First number assigned during discovery. Default: `1`.
    pub starting_test_number: i64,
    /// Argument 0 is the number, argument 1 the display name.
    /// Default: `"{0,3:D}) {1}"`.
    pub test_number_display_name_format: NumberFormat,
}

impl Default for OrderedTheoryConfig {
    fn default() -> Self {
        OrderedTheoryConfig {
            enable_ordered_tests: true,
            starting_test_number: 1,
            test_number_display_name_format: NumberFormat::default(),
        }
    }
}

impl OrderedTheoryConfig {
    /// Numbering switched off.
    pub fn disabled() -> Self {
        OrderedTheoryConfig {
            enable_ordered_tests: false,
            ..OrderedTheoryConfig::default()
        }
    }
}

/// The theory marker on a test method.
#[derive(Clone)]
pub struct TheoryAttribute {
    /// Replaces the `Class.Method` base display name.
    pub display_name: Option<String>,
    /// Skips the whole theory without enumerating data.
    pub skip: Option<String>,
    pub ordering: OrderedTheoryConfig,
    /// Names each invocation. `None` falls back to `Base(args)`.
    pub formatter: Option<Arc<dyn CustomDisplayName>>,
}

impl TheoryAttribute {
    /// A numbered theory using [`FormattedTheory`] with default settings.
    pub fn formatted() -> Self {
        Self::formatted_with(OrderedTheoryConfig::default())
    }

    pub fn formatted_with(ordering: OrderedTheoryConfig) -> Self {
        TheoryAttribute {
            display_name: None,
            skip: None,
            ordering,
            formatter: Some(Arc::new(FormattedTheory::default())),
        }
    }

    /// A theory without a formatter or numbering.
    pub fn plain() -> Self {
        TheoryAttribute {
            display_name: None,
            skip: None,
            ordering: OrderedTheoryConfig::disabled(),
            formatter: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_skip(mut self, reason: impl Into<String>) -> Self {
        self.skip = Some(reason.into());
        self
    }

    pub fn with_ordering(mut self, ordering: OrderedTheoryConfig) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn starting_at(mut self, number: i64) -> Self {
        self.ordering.starting_test_number = number;
        self
    }

    pub fn unordered(mut self) -> Self {
        self.ordering.enable_ordered_tests = false;
        self
    }

    /// Swap the default name strategy of a formatted theory.
    pub fn with_default_display_name(mut self, strategy: DefaultDisplayName) -> Self {
        self.formatter = Some(Arc::new(FormattedTheory::new(strategy)));
        self
    }

    pub fn with_formatter(mut self, formatter: Arc<dyn CustomDisplayName>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Test id to record for the next row, honoring the ordering switch.
    pub fn test_id_for(&self, counter: i64) -> Option<i64> {
        self.ordering.enable_ordered_tests.then_some(counter)
    }
}

impl Default for TheoryAttribute {
    fn default() -> Self {
        Self::formatted()
    }
}

impl fmt::Debug for TheoryAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TheoryAttribute")
            .field("display_name", &self.display_name)
            .field("skip", &self.skip)
            .field("ordering", &self.ordering)
            .field("formatter", &self.formatter.is_some())
            .finish()
    }
}
