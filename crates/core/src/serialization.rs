//! Key/value serialization of test cases and their argument values.
//!
//! A test case persists itself into a [`SerializationInfo`] bag. Argument
//! values go through [`ValueCodecs`]: primitives always encode, data
//! objects only when they expose a JSON form and a decoder is registered
//! for their type. Anything that cannot make the round trip is reported as
//! non-serializable.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::TheoryError;
use crate::value::{DataObject, TypeTag, Value};

// ──────────────────────────────────────────────
// SerializationInfo
// ──────────────────────────────────────────────

/// Ordered key/value bag a test case serializes into.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SerializationInfo {
    values: BTreeMap<String, serde_json::Value>,
}

impl SerializationInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_value<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), TheoryError> {
        let json = serde_json::to_value(value)
            .map_err(|e| TheoryError::Deserialize(format!("cannot store '{}': {}", key, e)))?;
        self.values.insert(key.to_string(), json);
        Ok(())
    }

    /// Read `key`. A missing key reads as JSON `null`, so optional values
    /// come back as `None`.
    pub fn get_value<T: DeserializeOwned>(&self, key: &str) -> Result<T, TheoryError> {
        let json = self
            .values
            .get(key)
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        serde_json::from_value(json)
            .map_err(|e| TheoryError::Deserialize(format!("invalid value for '{}': {}", key, e)))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn to_json_string(&self) -> Result<String, TheoryError> {
        serde_json::to_string(self).map_err(|e| TheoryError::Deserialize(e.to_string()))
    }

    pub fn from_json_str(s: &str) -> Result<Self, TheoryError> {
        serde_json::from_str(s).map_err(|e| TheoryError::Deserialize(e.to_string()))
    }
}

// ──────────────────────────────────────────────
// SerializedValue
// ──────────────────────────────────────────────

/// Wire form of a [`Value`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SerializedValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Array {
        element: TypeTag,
        items: Vec<SerializedValue>,
    },
    List(Vec<SerializedValue>),
    Object {
        type_name: String,
        data: serde_json::Value,
    },
}

// ──────────────────────────────────────────────
// ValueCodecs
// ──────────────────────────────────────────────

type Decoder = Arc<dyn Fn(&serde_json::Value) -> Result<Value, String> + Send + Sync>;

/// Decoders for data object types, keyed by type name.
#[derive(Clone, Default)]
pub struct ValueCodecs {
    decoders: BTreeMap<String, Decoder>,
}

impl fmt::Debug for ValueCodecs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueCodecs")
            .field("types", &self.decoders.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ValueCodecs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, type_name: impl Into<String>, decoder: F)
    where
        F: Fn(&serde_json::Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.decoders.insert(type_name.into(), Arc::new(decoder));
    }

    /// Register a decoder that deserializes `T` with serde.
    pub fn register_serde<T>(&mut self, type_name: impl Into<String>)
    where
        T: DataObject + DeserializeOwned,
    {
        self.register(type_name, |json| {
            serde_json::from_value::<T>(json.clone())
                .map(Value::object)
                .map_err(|e| e.to_string())
        });
    }

    pub fn knows(&self, type_name: &str) -> bool {
        self.decoders.contains_key(type_name)
    }

    /// Wire form of `value`, or `None` if it cannot round-trip.
    pub fn encode(&self, value: &Value) -> Option<SerializedValue> {
        Some(match value {
            Value::Null => SerializedValue::Null,
            Value::Bool(b) => SerializedValue::Bool(*b),
            Value::Int(i) => SerializedValue::Int(*i),
            Value::Float(f) if f.is_finite() => SerializedValue::Float(*f),
            Value::Float(_) => return None,
            Value::Text(s) => SerializedValue::Text(s.clone()),
            Value::Array { element, items } => SerializedValue::Array {
                element: element.clone(),
                items: self.encode_all(items)?,
            },
            Value::List(items) => SerializedValue::List(self.encode_all(items)?),
            Value::Object(obj) => {
                if !self.knows(obj.type_name()) {
                    return None;
                }
                SerializedValue::Object {
                    type_name: obj.type_name().to_string(),
                    data: obj.to_json()?,
                }
            }
        })
    }

    pub fn encode_all(&self, values: &[Value]) -> Option<Vec<SerializedValue>> {
        values.iter().map(|v| self.encode(v)).collect()
    }

    pub fn is_serializable(&self, value: &Value) -> bool {
        self.encode(value).is_some()
    }

    pub fn decode(&self, value: SerializedValue) -> Result<Value, TheoryError> {
        Ok(match value {
            SerializedValue::Null => Value::Null,
            SerializedValue::Bool(b) => Value::Bool(b),
            SerializedValue::Int(i) => Value::Int(i),
            SerializedValue::Float(f) => Value::Float(f),
            SerializedValue::Text(s) => Value::Text(s),
            SerializedValue::Array { element, items } => Value::Array {
                element,
                items: self.decode_all(items)?,
            },
            SerializedValue::List(items) => Value::List(self.decode_all(items)?),
            SerializedValue::Object { type_name, data } => {
                let decoder = self.decoders.get(&type_name).ok_or_else(|| {
                    TheoryError::Deserialize(format!("no decoder registered for '{}'", type_name))
                })?;
                decoder(&data).map_err(|e| {
                    TheoryError::Deserialize(format!("cannot decode '{}': {}", type_name, e))
                })?
            }
        })
    }

    pub fn decode_all(&self, values: Vec<SerializedValue>) -> Result<Vec<Value>, TheoryError> {
        values.into_iter().map(|v| self.decode(v)).collect()
    }
}
