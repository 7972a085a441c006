//! Typed rows from a data class.

use std::sync::Arc;

use super::{declaring_class, DataSource};
use crate::error::TheoryError;
use crate::reflect::TestMethod;
use crate::value::{DataRow, TypeTag, Value};

type Factory = Arc<dyn Fn() -> Value + Send + Sync>;

/// Rows produced by instantiating a data class that yields a collection of
/// `data_type` items. Every item must be exactly `data_type`.
#[derive(Clone)]
pub struct ClassTestData {
    class: String,
    data_type: TypeTag,
    factory: Factory,
}

impl ClassTestData {
    pub fn new<F>(class: impl Into<String>, data_type: TypeTag, factory: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        ClassTestData {
            class: class.into(),
            data_type,
            factory: Arc::new(factory),
        }
    }

    fn not_enumerable(&self, method: &TestMethod) -> TheoryError {
        TheoryError::ClassDataNotEnumerable {
            class: self.class.clone(),
            expected: self.data_type.to_string(),
            method: method.method_name().to_string(),
            declaring_type: declaring_class(method).name().to_string(),
        }
    }
}

impl DataSource for ClassTestData {
    fn name(&self) -> String {
        format!("ClassTestData({})", self.class)
    }

    fn get_data(&self, method: &TestMethod) -> Result<Option<Vec<DataRow>>, TheoryError> {
        let items = match (self.factory)() {
            Value::List(items) | Value::Array { items, .. } => items,
            _ => return Err(self.not_enumerable(method)),
        };

        items
            .into_iter()
            .map(|item| {
                if item.is_exactly(&self.data_type) {
                    Ok(DataRow::single(item))
                } else {
                    Err(self.not_enumerable(method))
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }
}
