//! Data discoverers: the pluggable components that enumerate data
//! attributes, and the registry that resolves them by name.
//!
//! A data attribute names its discoverer with a
//! [`DiscovererRef`](theoria_core::DiscovererRef). The
//! [`DiscovererRegistry`] maps those names to extensions; resolution fails
//! when nothing is registered under the name or when the registered
//! extension is not a data discoverer.

use std::collections::BTreeMap;
use std::sync::Arc;

use theoria_core::{DataAttribute, DataRow, DiscovererRef, TestMethod, TheoryError};
use tracing::debug;

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Why a discoverer reference could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiscovererLookupError {
    #[error("discoverer '{0}' does not exist")]
    NotFound(DiscovererRef),

    #[error("discoverer '{reference}' is a {kind}, not a data discoverer")]
    WrongKind {
        reference: DiscovererRef,
        kind: String,
    },
}

impl DiscovererLookupError {
    /// Sentence fragment used in test-case error messages.
    pub fn reason(&self) -> &'static str {
        match self {
            DiscovererLookupError::NotFound(_) => "does not exist.",
            DiscovererLookupError::WrongKind { .. } => "does not implement DataDiscoverer.",
        }
    }

    /// The error reported for `attribute` on `method`.
    pub fn to_theory_error(&self, attribute: &DataAttribute, method: &TestMethod) -> TheoryError {
        TheoryError::Discoverer {
            attribute: attribute.name(),
            class: method.class_name().to_string(),
            method: method.method_name().to_string(),
            reason: self.reason().to_string(),
        }
    }
}

// ──────────────────────────────────────────────
// Trait
// ──────────────────────────────────────────────

/// Enumerates the rows of a data attribute.
pub trait DataDiscoverer: Send + Sync {
    /// Rows for `attribute` on `method`. `Ok(None)` means the source
    /// produced no collection.
    fn get_data(
        &self,
        attribute: &DataAttribute,
        method: &TestMethod,
    ) -> Result<Option<Vec<DataRow>>, TheoryError>;

    /// Whether rows may be enumerated at discovery time.
    fn supports_discovery_enumeration(&self, attribute: &DataAttribute, method: &TestMethod) -> bool;
}

// ──────────────────────────────────────────────
// Built-in discoverers
// ──────────────────────────────────────────────

/// Reads any data attribute directly; always enumerable.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataAttributeDiscoverer;

impl DataDiscoverer for DataAttributeDiscoverer {
    fn get_data(
        &self,
        attribute: &DataAttribute,
        method: &TestMethod,
    ) -> Result<Option<Vec<DataRow>>, TheoryError> {
        attribute.source.get_data(method)
    }

    fn supports_discovery_enumeration(&self, _attribute: &DataAttribute, _method: &TestMethod) -> bool {
        true
    }
}

/// Member data; honors the source's discovery opt-out.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemberDataDiscoverer;

impl DataDiscoverer for MemberDataDiscoverer {
    fn get_data(
        &self,
        attribute: &DataAttribute,
        method: &TestMethod,
    ) -> Result<Option<Vec<DataRow>>, TheoryError> {
        attribute.source.get_data(method)
    }

    fn supports_discovery_enumeration(&self, attribute: &DataAttribute, _method: &TestMethod) -> bool {
        !attribute.source.disable_discovery_enumeration()
    }
}

/// Inline objects. When a member lookup fails on the declaring class, the
/// lookup is retried on the reflected class so a base class can name data
/// that only a subclass declares.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineObjectDiscoverer;

impl DataDiscoverer for InlineObjectDiscoverer {
    fn get_data(
        &self,
        attribute: &DataAttribute,
        method: &TestMethod,
    ) -> Result<Option<Vec<DataRow>>, TheoryError> {
        let error = match attribute.source.get_data(method) {
            Err(e @ TheoryError::MemberNotFound { .. }) => e,
            other => return other,
        };
        if method.class_name() == method.method().declaring_class() {
            return Err(error);
        }
        match attribute.source.with_member_type(Arc::clone(method.class())) {
            Some(retargeted) => {
                debug!(
                    attribute = %attribute.name(),
                    class = method.class_name(),
                    "member not found on declaring class; retrying on reflected class"
                );
                retargeted.get_data(method)
            }
            None => Err(error),
        }
    }

    fn supports_discovery_enumeration(&self, attribute: &DataAttribute, _method: &TestMethod) -> bool {
        !attribute.source.disable_discovery_enumeration()
    }
}

// ──────────────────────────────────────────────
// DiscovererRegistry
// ──────────────────────────────────────────────

/// A registered extension.
#[derive(Clone)]
pub enum Extension {
    DataDiscoverer(Arc<dyn DataDiscoverer>),
    /// Another kind of extension registered under the same namespace,
    /// described by its kind name.
    Other(String),
}

/// Maps discoverer references to extensions.
#[derive(Clone, Default)]
pub struct DiscovererRegistry {
    extensions: BTreeMap<DiscovererRef, Extension>,
}

impl DiscovererRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in discoverers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(DiscovererRef::data(), DataAttributeDiscoverer);
        registry.register(DiscovererRef::member_data(), MemberDataDiscoverer);
        registry.register(DiscovererRef::inline_object(), InlineObjectDiscoverer);
        registry
    }

    pub fn register<D: DataDiscoverer + 'static>(&mut self, reference: DiscovererRef, discoverer: D) {
        self.extensions
            .insert(reference, Extension::DataDiscoverer(Arc::new(discoverer)));
    }

    /// Register a non-discoverer extension under `reference`.
    pub fn register_other(&mut self, reference: DiscovererRef, kind: impl Into<String>) {
        self.extensions.insert(reference, Extension::Other(kind.into()));
    }

    pub fn resolve(&self, reference: &DiscovererRef) -> Result<Arc<dyn DataDiscoverer>, DiscovererLookupError> {
        match self.extensions.get(reference) {
            Some(Extension::DataDiscoverer(discoverer)) => Ok(Arc::clone(discoverer)),
            Some(Extension::Other(kind)) => Err(DiscovererLookupError::WrongKind {
                reference: reference.clone(),
                kind: kind.clone(),
            }),
            None => Err(DiscovererLookupError::NotFound(reference.clone())),
        }
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use theoria_core::{
        InlineObject, MemberTestData, MethodInfo, ParameterType, TestClass, TypeTag, Value,
    };

    struct FromRows;

    impl InlineObject for FromRows {
        fn get_object(&self, _method: &TestMethod) -> Result<Value, TheoryError> {
            Ok(Value::Int(1))
        }

        fn disable_discovery_enumeration(&self) -> bool {
            true
        }
    }

    fn method_on(class: Arc<TestClass>, name: &str) -> TestMethod {
        let method = class.find_method(name).unwrap();
        TestMethod::new(class, method)
    }

    #[test]
    fn builtins_resolve() {
        let registry = DiscovererRegistry::with_builtins();
        assert_eq!(registry.len(), 3);
        assert!(registry.resolve(&DiscovererRef::data()).is_ok());
        assert!(registry.resolve(&DiscovererRef::member_data()).is_ok());
        assert!(registry.resolve(&DiscovererRef::inline_object()).is_ok());
    }

    #[test]
    fn lookup_failures_are_distinguished() {
        let mut registry = DiscovererRegistry::new();
        registry.register_other(DiscovererRef::new("ext", "Fixture"), "fixture");

        let missing = registry
            .resolve(&DiscovererRef::new("ext", "Nope"))
            .err()
            .unwrap();
        assert_eq!(missing.reason(), "does not exist.");

        let wrong = registry
            .resolve(&DiscovererRef::new("ext", "Fixture"))
            .err()
            .unwrap();
        assert_eq!(wrong.reason(), "does not implement DataDiscoverer.");
    }

    #[test]
    fn discovery_opt_out_is_respected() {
        let class = Arc::new(TestClass::new("Tests").method(
            MethodInfo::new("M")
                .param("x", TypeTag::Int)
                .data(DataAttribute::inline_object(FromRows)),
        ));
        let method = method_on(class, "M");
        let attribute = &method.method().data_attributes()[0];

        assert!(!InlineObjectDiscoverer.supports_discovery_enumeration(attribute, &method));
        assert!(DataAttributeDiscoverer.supports_discovery_enumeration(attribute, &method));
    }

    #[test]
    fn inline_object_discoverer_retries_on_reflected_class() {
        let base = Arc::new(TestClass::new("Base").method(
            MethodInfo::new("M")
                .param("x", ParameterType::Type(TypeTag::Int))
                .data(
                    DataAttribute::member(MemberTestData::exact(TypeTag::Int, "Rows"))
                        .with_discoverer(DiscovererRef::inline_object()),
                ),
        ));
        let derived = Arc::new(
            TestClass::new("Derived")
                .extends(base)
                .field("Rows", Value::List(vec![Value::Int(1), Value::Int(2)])),
        );
        let method = method_on(derived, "M");
        let attribute = &method.method().data_attributes()[0];

        assert!(matches!(
            MemberDataDiscoverer.get_data(attribute, &method),
            Err(TheoryError::MemberNotFound { .. })
        ));
        let rows = InlineObjectDiscoverer
            .get_data(attribute, &method)
            .unwrap()
            .unwrap();
        assert_eq!(rows.len(), 2);
    }
}
