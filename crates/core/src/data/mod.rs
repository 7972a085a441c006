//! Data attributes and the sources behind them.
//!
//! A [`DataAttribute`] couples a [`DataSource`] (what produces rows) with the
//! [`DiscovererRef`] naming the discoverer that enumerates it. Sources:
//!
//! - [`MemberTestData`] -- typed rows from a static property, field or method
//! - [`ClassTestData`] -- typed rows from a data class
//! - [`InlineData`] -- one literal row
//! - [`InlineObjectData`] -- one row holding a synthesized object

pub mod class;
pub mod inline;
pub mod member;

pub use class::ClassTestData;
pub use inline::{InlineData, InlineObject, InlineObjectData};
pub use member::{ElementMatch, MemberTestData};

use std::fmt;
use std::sync::Arc;

use crate::error::TheoryError;
use crate::reflect::{TestClass, TestMethod};
use crate::value::DataRow;

/// Assembly name of the built-in discoverers.
pub const BUILTIN_ASSEMBLY: &str = "theoria";

// ──────────────────────────────────────────────
// DataSource
// ──────────────────────────────────────────────

/// Produces the data rows of one data attribute.
pub trait DataSource: Send + Sync {
    /// Short name used in diagnostics, e.g. `MemberTestData(Rows)`.
    fn name(&self) -> String;

    /// Rows for `method`. `Ok(None)` means the source returned no
    /// collection at all.
    fn get_data(&self, method: &TestMethod) -> Result<Option<Vec<DataRow>>, TheoryError>;

    /// Opt out of pre-enumeration at discovery time.
    fn disable_discovery_enumeration(&self) -> bool {
        false
    }

    /// A copy that looks members up on `class` instead of the declaring
    /// class. `None` when the source has no member lookup or already names
    /// its member type.
    fn with_member_type(&self, _class: Arc<TestClass>) -> Option<Arc<dyn DataSource>> {
        None
    }
}

// ──────────────────────────────────────────────
// DiscovererRef
// ──────────────────────────────────────────────

/// Names a data discoverer by assembly and type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DiscovererRef {
    pub assembly: String,
    pub type_name: String,
}

impl DiscovererRef {
    pub fn new(assembly: impl Into<String>, type_name: impl Into<String>) -> Self {
        DiscovererRef {
            assembly: assembly.into(),
            type_name: type_name.into(),
        }
    }

    /// Enumerates any data attribute; always supports pre-enumeration.
    pub fn data() -> Self {
        Self::new(BUILTIN_ASSEMBLY, "DataAttributeDiscoverer")
    }

    pub fn member_data() -> Self {
        Self::new(BUILTIN_ASSEMBLY, "MemberDataDiscoverer")
    }

    pub fn inline_object() -> Self {
        Self::new(BUILTIN_ASSEMBLY, "InlineObjectDiscoverer")
    }
}

impl fmt::Display for DiscovererRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.type_name, self.assembly)
    }
}

// ──────────────────────────────────────────────
// DataAttribute
// ──────────────────────────────────────────────

/// A data attribute attached to a theory.
#[derive(Clone)]
pub struct DataAttribute {
    pub source: Arc<dyn DataSource>,
    /// Skips the rows of this attribute once they are materialized.
    pub skip: Option<String>,
    pub discoverer: DiscovererRef,
}

impl DataAttribute {
    pub fn new(source: Arc<dyn DataSource>, discoverer: DiscovererRef) -> Self {
        DataAttribute {
            source,
            skip: None,
            discoverer,
        }
    }

    pub fn inline(row: DataRow) -> Self {
        Self::new(Arc::new(InlineData::new(row)), DiscovererRef::data())
    }

    pub fn member(source: MemberTestData) -> Self {
        Self::new(Arc::new(source), DiscovererRef::member_data())
    }

    pub fn class(source: ClassTestData) -> Self {
        Self::new(Arc::new(source), DiscovererRef::data())
    }

    pub fn inline_object<T: InlineObject>(object: T) -> Self {
        Self::new(
            Arc::new(InlineObjectData::new(object)),
            DiscovererRef::inline_object(),
        )
    }

    pub fn with_skip(mut self, reason: impl Into<String>) -> Self {
        self.skip = Some(reason.into());
        self
    }

    pub fn with_discoverer(mut self, discoverer: DiscovererRef) -> Self {
        self.discoverer = discoverer;
        self
    }

    pub fn name(&self) -> String {
        self.source.name()
    }
}

impl fmt::Debug for DataAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataAttribute")
            .field("source", &self.source.name())
            .field("skip", &self.skip)
            .field("discoverer", &self.discoverer)
            .finish()
    }
}

/// The class that declares `method`, found on the reflected class's
/// ancestor chain.
pub(crate) fn declaring_class(method: &TestMethod) -> &TestClass {
    let declaring = method.method().declaring_class();
    method
        .class()
        .ancestors()
        .find(|class| class.name() == declaring)
        .unwrap_or_else(|| method.class().as_ref())
}
