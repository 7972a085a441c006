//! Inline data: literal rows and attribute-constructed objects.

use super::DataSource;
use crate::error::TheoryError;
use crate::reflect::{format_argument, TestMethod};
use crate::value::{DataRow, Value};

/// One literal row.
#[derive(Debug, Clone)]
pub struct InlineData {
    row: DataRow,
}

impl InlineData {
    pub fn new(row: DataRow) -> Self {
        InlineData { row }
    }
}

impl DataSource for InlineData {
    fn name(&self) -> String {
        let values: Vec<String> = self.row.values().iter().map(format_argument).collect();
        format!("InlineData({})", values.join(", "))
    }

    fn get_data(&self, _method: &TestMethod) -> Result<Option<Vec<DataRow>>, TheoryError> {
        Ok(Some(vec![self.row.clone()]))
    }
}

/// An attribute that builds its test object from its own settings.
///
/// Implementors hold whatever constructor arguments and named properties
/// they need and synthesize one value per discovery pass.
pub trait InlineObject: Send + Sync + 'static {
    fn name(&self) -> String {
        "InlineObject".to_string()
    }

    fn get_object(&self, method: &TestMethod) -> Result<Value, TheoryError>;

    fn disable_discovery_enumeration(&self) -> bool {
        false
    }
}

/// Wraps an [`InlineObject`] into a one-row, one-column data source.
pub struct InlineObjectData<T> {
    object: T,
}

impl<T: InlineObject> InlineObjectData<T> {
    pub fn new(object: T) -> Self {
        InlineObjectData { object }
    }

    pub fn inner(&self) -> &T {
        &self.object
    }
}

impl<T: InlineObject> DataSource for InlineObjectData<T> {
    fn name(&self) -> String {
        self.object.name()
    }

    fn get_data(&self, method: &TestMethod) -> Result<Option<Vec<DataRow>>, TheoryError> {
        let value = self.object.get_object(method)?;
        Ok(Some(vec![DataRow::single(value)]))
    }

    fn disable_discovery_enumeration(&self) -> bool {
        self.object.disable_discovery_enumeration()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{MethodInfo, TestClass};
    use std::sync::Arc;

    struct Greeting {
        name: &'static str,
        live: bool,
    }

    impl InlineObject for Greeting {
        fn get_object(&self, method: &TestMethod) -> Result<Value, TheoryError> {
            Ok(Value::text(format!("hello {} from {}", self.name, method.method_name())))
        }

        fn disable_discovery_enumeration(&self) -> bool {
            self.live
        }
    }

    fn test_method() -> TestMethod {
        let class = Arc::new(TestClass::new("Tests").method(MethodInfo::new("Greets")));
        let method = class.find_method("Greets").unwrap();
        TestMethod::new(class, method)
    }

    #[test]
    fn inline_object_yields_one_single_value_row() {
        let source = InlineObjectData::new(Greeting {
            name: "bob",
            live: false,
        });
        let rows = source.get_data(&test_method()).unwrap().unwrap();
        assert_eq!(rows, vec![DataRow::single(Value::text("hello bob from Greets"))]);
        assert!(!source.disable_discovery_enumeration());
    }

    #[test]
    fn opt_out_flag_is_forwarded() {
        let source = InlineObjectData::new(Greeting {
            name: "bob",
            live: true,
        });
        assert!(source.disable_discovery_enumeration());
    }

    #[test]
    fn inline_data_names_its_values() {
        let source = InlineData::new(crate::row![9, 1, 10]);
        assert_eq!(source.name(), "InlineData(9, 1, 10)");
        assert_eq!(source.get_data(&test_method()).unwrap().unwrap().len(), 1);
    }
}
