//! Runtime values bound to theory parameters.
//!
//! A data row is an ordered list of [`Value`]s. Primitive values are carried
//! inline; strongly-typed test data objects are carried behind
//! [`DataObject`], which exposes the optional capabilities the discovery and
//! execution pipeline probes for (serialization, custom display names,
//! disposal).

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::display::CustomDisplayName;

// ──────────────────────────────────────────────
// Type tags
// ──────────────────────────────────────────────

/// Runtime type identity of a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum TypeTag {
    /// The top type: every value is assignable to it.
    Object,
    Bool,
    Int,
    Float,
    Text,
    Array(Box<TypeTag>),
    Named(String),
}

impl TypeTag {
    pub fn named(name: impl Into<String>) -> Self {
        TypeTag::Named(name.into())
    }

    pub fn array_of(element: TypeTag) -> Self {
        TypeTag::Array(Box::new(element))
    }

    /// Value types cannot hold `null`.
    pub fn is_value_type(&self) -> bool {
        matches!(self, TypeTag::Bool | TypeTag::Int | TypeTag::Float)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Object => write!(f, "Object"),
            TypeTag::Bool => write!(f, "bool"),
            TypeTag::Int => write!(f, "i64"),
            TypeTag::Float => write!(f, "f64"),
            TypeTag::Text => write!(f, "String"),
            TypeTag::Array(element) => write!(f, "{}[]", element),
            TypeTag::Named(name) => write!(f, "{}", name),
        }
    }
}

// ──────────────────────────────────────────────
// Data objects
// ──────────────────────────────────────────────

/// Cleanup hook for row elements that own resources.
pub trait Disposable: Send + Sync {
    fn dispose(&self) -> Result<(), String>;
}

/// A strongly-typed test data object.
///
/// Only `type_name` and `as_any` are required. Every capability defaults to
/// "absent"; a type opts in by overriding the accessor.
pub trait DataObject: fmt::Debug + Send + Sync + 'static {
    /// Runtime type name; `TypeTag::Named` carries this string.
    fn type_name(&self) -> &str;

    fn as_any(&self) -> &dyn Any;

    /// Whether this object is assignable to `type_name`. Override to model
    /// base types or implemented interfaces.
    fn implements(&self, type_name: &str) -> bool {
        self.type_name() == type_name
    }

    /// Serialized form for case identity. `None` marks the object as
    /// non-serializable, which forces runtime discovery of its theory.
    fn to_json(&self) -> Option<serde_json::Value> {
        None
    }

    fn custom_display_name(&self) -> Option<&dyn CustomDisplayName> {
        None
    }

    fn disposable(&self) -> Option<&dyn Disposable> {
        None
    }

    /// Text used when the object is rendered as a test argument.
    fn describe(&self) -> String {
        self.type_name().to_string()
    }
}

// ──────────────────────────────────────────────
// Values
// ──────────────────────────────────────────────

/// A single argument value.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// A typed array. Used both as an array argument and as the carrier of a
    /// multi-element row produced by a member source.
    Array { element: TypeTag, items: Vec<Value> },
    /// A loosely typed collection; the "enumerable" result of a data member.
    List(Vec<Value>),
    Object(Arc<dyn DataObject>),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn object<T: DataObject>(object: T) -> Self {
        Value::Object(Arc::new(object))
    }

    pub fn array(element: TypeTag, items: Vec<Value>) -> Self {
        Value::Array { element, items }
    }

    /// Runtime type of the value; `None` for `null`.
    pub fn type_tag(&self) -> Option<TypeTag> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(TypeTag::Bool),
            Value::Int(_) => Some(TypeTag::Int),
            Value::Float(_) => Some(TypeTag::Float),
            Value::Text(_) => Some(TypeTag::Text),
            Value::Array { element, .. } => Some(TypeTag::array_of(element.clone())),
            Value::List(_) => Some(TypeTag::named("List")),
            Value::Object(obj) => Some(TypeTag::named(obj.type_name())),
        }
    }

    /// Human-readable runtime type name for error messages.
    pub fn type_name(&self) -> String {
        self.type_tag()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "(null)".to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Exact runtime type equality (strict sources).
    pub fn is_exactly(&self, tag: &TypeTag) -> bool {
        self.type_tag().as_ref() == Some(tag)
    }

    /// Assignability to `tag` (non-strict sources, parameter binding).
    pub fn is_instance_of(&self, tag: &TypeTag) -> bool {
        match (self, tag) {
            (Value::Null, t) => !t.is_value_type(),
            (_, TypeTag::Object) => true,
            (Value::Object(obj), TypeTag::Named(name)) => obj.implements(name),
            (Value::Array { element, .. }, TypeTag::Array(expected)) => {
                element == expected.as_ref() || **expected == TypeTag::Object
            }
            (v, t) => v.is_exactly(t),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Downcast a data object argument.
    pub fn downcast_ref<T: DataObject>(&self) -> Option<&T> {
        match self {
            Value::Object(obj) => obj.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn as_custom_display_name(&self) -> Option<&dyn CustomDisplayName> {
        match self {
            Value::Object(obj) => obj.custom_display_name(),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (
                Value::Array {
                    element: ea,
                    items: ia,
                },
                Value::Array {
                    element: eb,
                    items: ib,
                },
            ) => ea == eb && ia == ib,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => {
                Arc::ptr_eq(a, b)
                    || (a.type_name() == b.type_name()
                        && a.to_json().is_some()
                        && a.to_json() == b.to_json())
            }
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

// ──────────────────────────────────────────────
// Data rows
// ──────────────────────────────────────────────

/// One bound set of argument values for one invocation of a theory.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataRow(Vec<Value>);

impl DataRow {
    pub fn new(values: Vec<Value>) -> Self {
        DataRow(values)
    }

    /// A one-column row wrapping a single value.
    pub fn single(value: Value) -> Self {
        DataRow(vec![value])
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn into_values(self) -> Vec<Value> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Row elements that registered a cleanup hook.
    pub fn disposables(&self) -> Vec<Arc<dyn DataObject>> {
        self.0
            .iter()
            .filter_map(|v| match v {
                Value::Object(obj) if obj.disposable().is_some() => Some(Arc::clone(obj)),
                _ => None,
            })
            .collect()
    }
}

impl From<Vec<Value>> for DataRow {
    fn from(values: Vec<Value>) -> Self {
        DataRow(values)
    }
}

/// Build a [`DataRow`] from literal values: `row![9, 1, 10]`.
#[macro_export]
macro_rules! row {
    ($($value:expr),* $(,)?) => {
        $crate::value::DataRow::new(vec![$($crate::value::Value::from($value)),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Person {
        name: String,
    }

    impl DataObject for Person {
        fn type_name(&self) -> &str {
            "Person"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn implements(&self, type_name: &str) -> bool {
            type_name == "Person" || type_name == "Named"
        }
    }

    #[test]
    fn type_tags_of_primitives() {
        assert_eq!(Value::Int(1).type_tag(), Some(TypeTag::Int));
        assert_eq!(Value::text("a").type_tag(), Some(TypeTag::Text));
        assert_eq!(Value::Null.type_tag(), None);
        assert_eq!(
            Value::array(TypeTag::Int, vec![Value::Int(1)]).type_tag(),
            Some(TypeTag::array_of(TypeTag::Int))
        );
    }

    #[test]
    fn exact_versus_assignable() {
        let person = Value::object(Person {
            name: "Bob".to_string(),
        });
        assert!(person.is_exactly(&TypeTag::named("Person")));
        assert!(!person.is_exactly(&TypeTag::named("Named")));
        assert!(person.is_instance_of(&TypeTag::named("Named")));
        assert!(person.is_instance_of(&TypeTag::Object));
        assert_eq!(person.downcast_ref::<Person>().unwrap().name, "Bob");
    }

    #[test]
    fn null_is_not_a_value_type() {
        assert!(!Value::Null.is_instance_of(&TypeTag::Int));
        assert!(Value::Null.is_instance_of(&TypeTag::Text));
        assert!(Value::Null.is_instance_of(&TypeTag::named("Person")));
    }

    #[test]
    fn row_macro_converts_literals() {
        let row = row![9, "x", true];
        assert_eq!(
            row.values(),
            &[Value::Int(9), Value::text("x"), Value::Bool(true)]
        );
    }

    #[test]
    fn objects_without_json_compare_by_identity() {
        let a = Arc::new(Person {
            name: "a".to_string(),
        }) as Arc<dyn DataObject>;
        assert_eq!(Value::Object(Arc::clone(&a)), Value::Object(a));
        assert_ne!(
            Value::object(Person {
                name: "a".to_string()
            }),
            Value::object(Person {
                name: "a".to_string()
            })
        );
    }

    #[test]
    fn type_tag_display() {
        assert_eq!(TypeTag::array_of(TypeTag::Int).to_string(), "i64[]");
        assert_eq!(TypeTag::named("Person").to_string(), "Person");
    }
}
