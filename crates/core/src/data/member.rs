//! Typed rows from a static data member.

use std::sync::Arc;

use tracing::trace;

use super::{declaring_class, DataSource};
use crate::error::TheoryError;
use crate::reflect::{TestClass, TestMethod};
use crate::value::{DataRow, TypeTag, Value};

/// How strictly yielded items must match the declared data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementMatch {
    /// Runtime type must equal the data type.
    Exact,
    /// Runtime type must be assignable to the data type.
    Assignable,
}

/// Rows from a static property, field or method returning a collection of
/// `data_type` items.
///
/// Each item becomes a one-column row. An item that is an array of
/// `data_type` is passed through as a multi-column row.
#[derive(Clone)]
pub struct MemberTestData {
    member_name: String,
    parameters: Vec<Value>,
    member_type: Option<Arc<TestClass>>,
    data_type: TypeTag,
    element_match: ElementMatch,
    disable_discovery_enumeration: bool,
}

impl MemberTestData {
    /// Items must be exactly `data_type`.
    pub fn exact(data_type: TypeTag, member_name: impl Into<String>) -> Self {
        MemberTestData {
            member_name: member_name.into(),
            parameters: Vec::new(),
            member_type: None,
            data_type,
            element_match: ElementMatch::Exact,
            disable_discovery_enumeration: false,
        }
    }

    /// Items may be any type assignable to `data_type`.
    pub fn assignable(data_type: TypeTag, member_name: impl Into<String>) -> Self {
        MemberTestData {
            element_match: ElementMatch::Assignable,
            ..Self::exact(data_type, member_name)
        }
    }

    /// Arguments passed to a static data method.
    pub fn with_parameters(mut self, parameters: Vec<Value>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Look the member up on `class` instead of the declaring class.
    pub fn in_class(mut self, class: Arc<TestClass>) -> Self {
        self.member_type = Some(class);
        self
    }

    pub fn without_discovery_enumeration(mut self) -> Self {
        self.disable_discovery_enumeration = true;
        self
    }

    pub fn member_name(&self) -> &str {
        &self.member_name
    }

    pub fn data_type(&self) -> &TypeTag {
        &self.data_type
    }

    /// Property, then field, then compatible method, each searched up the
    /// ancestor chain. `None` if nothing matches.
    fn read_member(&self, class: &TestClass) -> Option<Result<Value, TheoryError>> {
        let wrap = |e: TheoryError| TheoryError::Invocation {
            member: format!("{}.{}", class.name(), self.member_name),
            source: Box::new(e),
        };

        if let Some(accessor) = class.find_property(&self.member_name) {
            trace!(member = %self.member_name, class = class.name(), "reading static property");
            return Some(accessor().map_err(wrap));
        }
        if let Some(value) = class.find_field(&self.member_name) {
            trace!(member = %self.member_name, class = class.name(), "reading static field");
            return Some(Ok(value.clone()));
        }
        class
            .find_static_method(&self.member_name, &self.parameters)
            .map(|method| {
                trace!(member = %self.member_name, class = class.name(), "calling static method");
                method.call(&self.parameters).map_err(wrap)
            })
    }

    fn matches(&self, item: &Value) -> bool {
        match self.element_match {
            ElementMatch::Exact => item.is_exactly(&self.data_type),
            ElementMatch::Assignable => !item.is_null() && item.is_instance_of(&self.data_type),
        }
    }

    fn convert_item(&self, class: &TestClass, item: Value) -> Result<DataRow, TheoryError> {
        if self.matches(&item) {
            return Ok(DataRow::single(item));
        }
        match item {
            Value::Array { element, items } if element == self.data_type => Ok(DataRow::new(items)),
            _ => Err(TheoryError::ItemTypeMismatch {
                member: self.member_name.clone(),
                type_name: class.name().to_string(),
                expected: self.data_type.to_string(),
            }),
        }
    }
}

impl DataSource for MemberTestData {
    fn name(&self) -> String {
        format!("MemberTestData({})", self.member_name)
    }

    fn get_data(&self, method: &TestMethod) -> Result<Option<Vec<DataRow>>, TheoryError> {
        let class: &TestClass = match &self.member_type {
            Some(class) => class,
            None => declaring_class(method),
        };

        let value = self.read_member(class).ok_or_else(|| TheoryError::MemberNotFound {
            member: self.member_name.clone(),
            type_name: class.name().to_string(),
            parameter_types: self.parameters.iter().map(Value::type_name).collect(),
        })??;

        let items = match value {
            Value::Null => return Ok(None),
            Value::List(items) | Value::Array { items, .. } => items,
            _ => {
                return Err(TheoryError::NotEnumerable {
                    member: self.member_name.clone(),
                    type_name: class.name().to_string(),
                })
            }
        };

        items
            .into_iter()
            .map(|item| self.convert_item(class, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    fn disable_discovery_enumeration(&self) -> bool {
        self.disable_discovery_enumeration
    }

    fn with_member_type(&self, class: Arc<TestClass>) -> Option<Arc<dyn DataSource>> {
        if self.member_type.is_some() {
            return None;
        }
        Some(Arc::new(self.clone().in_class(class)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::MethodInfo;
    use crate::value::DataObject;
    use std::any::Any;

    #[derive(Debug)]
    struct Sample(i64);

    impl DataObject for Sample {
        fn type_name(&self) -> &str {
            "Sample"
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn implements(&self, type_name: &str) -> bool {
            type_name == "Sample" || type_name == "ISample"
        }
    }

    fn samples(n: i64) -> Value {
        Value::List((1..=n).map(|i| Value::object(Sample(i))).collect())
    }

    fn test_method(class: TestClass) -> TestMethod {
        let class = Arc::new(class.method(MethodInfo::new("Check").param("s", TypeTag::named("Sample"))));
        let method = class.find_method("Check").unwrap();
        TestMethod::new(class, method)
    }

    #[test]
    fn property_items_become_single_rows() {
        let method = test_method(TestClass::new("Tests").property("Rows", || Ok(samples(3))));
        let rows = MemberTestData::exact(TypeTag::named("Sample"), "Rows")
            .get_data(&method)
            .unwrap()
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.len() == 1));
        assert_eq!(rows[2].values()[0].downcast_ref::<Sample>().unwrap().0, 3);
    }

    #[test]
    fn property_beats_field_and_method() {
        let method = test_method(
            TestClass::new("Tests")
                .property("Rows", || Ok(samples(1)))
                .field("Rows", samples(2))
                .static_method("Rows", vec![], |_| Ok(samples(3))),
        );
        let rows = MemberTestData::exact(TypeTag::named("Sample"), "Rows")
            .get_data(&method)
            .unwrap()
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn method_parameters_select_the_overload() {
        let method = test_method(
            TestClass::new("Tests")
                .static_method("Rows", vec![TypeTag::Text.into()], |_| Ok(samples(1)))
                .static_method("Rows", vec![TypeTag::Int.into()], |args| {
                    Ok(samples(args[0].as_int().unwrap_or_default()))
                }),
        );
        let rows = MemberTestData::exact(TypeTag::named("Sample"), "Rows")
            .with_parameters(vec![Value::Int(4)])
            .get_data(&method)
            .unwrap()
            .unwrap();
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn missing_member_lists_parameter_types() {
        let method = test_method(TestClass::new("Tests"));
        let err = MemberTestData::exact(TypeTag::named("Sample"), "Nope")
            .with_parameters(vec![Value::Int(1), Value::Null])
            .get_data(&method)
            .unwrap_err();
        assert_eq!(
            err,
            TheoryError::MemberNotFound {
                member: "Nope".to_string(),
                type_name: "Tests".to_string(),
                parameter_types: vec!["i64".to_string(), "(null)".to_string()],
            }
        );
    }

    #[test]
    fn null_member_yields_no_data() {
        let method = test_method(TestClass::new("Tests").field("Rows", Value::Null));
        let rows = MemberTestData::exact(TypeTag::named("Sample"), "Rows")
            .get_data(&method)
            .unwrap();
        assert!(rows.is_none());
    }

    #[test]
    fn non_collection_is_not_enumerable() {
        let method = test_method(TestClass::new("Tests").field("Rows", Value::Int(3)));
        let err = MemberTestData::exact(TypeTag::named("Sample"), "Rows")
            .get_data(&method)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Property Rows on Tests did not return IEnumerable"
        );
    }

    #[test]
    fn wrong_item_type_is_a_shape_error() {
        let method = test_method(TestClass::new("Tests").field(
            "Rows",
            Value::List(vec![Value::object(Sample(1)), Value::text("oops")]),
        ));
        let err = MemberTestData::exact(TypeTag::named("Sample"), "Rows")
            .get_data(&method)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Property Rows on Tests yielded an item that is not an Sample"
        );
    }

    #[test]
    fn typed_arrays_pass_through() {
        let method = test_method(TestClass::new("Tests").field(
            "Rows",
            Value::List(vec![Value::array(
                TypeTag::named("Sample"),
                vec![Value::object(Sample(1)), Value::object(Sample(2))],
            )]),
        ));
        let rows = MemberTestData::exact(TypeTag::named("Sample"), "Rows")
            .get_data(&method)
            .unwrap()
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 2);
    }

    #[test]
    fn exact_rejects_what_assignable_accepts() {
        let method = test_method(TestClass::new("Tests").property("Rows", || Ok(samples(2))));
        assert!(MemberTestData::exact(TypeTag::named("ISample"), "Rows")
            .get_data(&method)
            .is_err());
        let rows = MemberTestData::assignable(TypeTag::named("ISample"), "Rows")
            .get_data(&method)
            .unwrap()
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn member_failures_are_wrapped() {
        let method = test_method(
            TestClass::new("Tests").property("Rows", || Err(TheoryError::User("db down".to_string()))),
        );
        let err = MemberTestData::exact(TypeTag::named("Sample"), "Rows")
            .get_data(&method)
            .unwrap_err();
        assert!(matches!(err, TheoryError::Invocation { .. }));
        assert_eq!(err.unwrap_invocation(), TheoryError::User("db down".to_string()));
    }

    #[test]
    fn members_are_found_on_ancestors() {
        let base = Arc::new(TestClass::new("Base").property("Rows", || Ok(samples(2))));
        let method = test_method(TestClass::new("Derived").extends(base));
        let rows = MemberTestData::exact(TypeTag::named("Sample"), "Rows")
            .get_data(&method)
            .unwrap()
            .unwrap();
        assert_eq!(rows.len(), 2);
    }
}
