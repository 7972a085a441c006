//! Explicit reflection registry.
//!
//! Test classes register their static data members (properties, fields and
//! methods) and their test methods up front. Everything the discovery and
//! execution pipeline needs to know about a method (parameters, generic
//! parameters, attached attributes, the callable body) lives on
//! [`MethodInfo`].

use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::data::DataAttribute;
use crate::error::TheoryError;
use crate::theory::TheoryAttribute;
use crate::value::{TypeTag, Value};

const MAX_STRING_LENGTH: usize = 50;
const MAX_ENUMERABLE_LENGTH: usize = 5;

/// A test body. `Err` carries the assertion failure message.
pub type TestFn = Arc<dyn Fn(&[Value]) -> Result<(), String> + Send + Sync>;

/// A static property accessor.
pub type PropertyFn = Arc<dyn Fn() -> Result<Value, TheoryError> + Send + Sync>;

/// A static method taking bound parameter values.
pub type StaticFn = Arc<dyn Fn(&[Value]) -> Result<Value, TheoryError> + Send + Sync>;

// ──────────────────────────────────────────────
// Parameters
// ──────────────────────────────────────────────

/// Declared type of a method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterType {
    Type(TypeTag),
    /// An open generic parameter, by name.
    Generic(String),
    Array(Box<ParameterType>),
}

impl ParameterType {
    pub fn generic(name: impl Into<String>) -> Self {
        ParameterType::Generic(name.into())
    }

    pub fn array_of(inner: ParameterType) -> Self {
        ParameterType::Array(Box::new(inner))
    }

    /// Whether `value` can be bound to a parameter of this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParameterType::Type(tag) => value.is_instance_of(tag),
            ParameterType::Generic(_) => true,
            ParameterType::Array(inner) => match value {
                Value::Null => true,
                Value::Array { element, .. } => match inner.as_ref() {
                    ParameterType::Generic(_) => true,
                    ParameterType::Type(TypeTag::Object) => true,
                    ParameterType::Type(tag) => element == tag,
                    ParameterType::Array(_) => matches!(element, TypeTag::Array(_)),
                },
                _ => false,
            },
        }
    }

    /// Substitute generic parameters with their bindings. Unbound
    /// parameters close over `Object`.
    pub fn close(&self, bindings: &BTreeMap<String, TypeTag>) -> TypeTag {
        match self {
            ParameterType::Type(tag) => tag.clone(),
            ParameterType::Generic(name) => bindings.get(name).cloned().unwrap_or(TypeTag::Object),
            ParameterType::Array(inner) => TypeTag::array_of(inner.close(bindings)),
        }
    }

    fn mentions(&self, generic: &str) -> bool {
        match self {
            ParameterType::Type(_) => false,
            ParameterType::Generic(name) => name == generic,
            ParameterType::Array(inner) => inner.mentions(generic),
        }
    }

    /// Infer the binding for `generic` from a value bound to this parameter.
    fn infer(&self, generic: &str, value: &Value) -> Option<TypeTag> {
        match (self, value) {
            (_, Value::Null) => None,
            (ParameterType::Generic(name), v) if name == generic => v.type_tag(),
            (ParameterType::Array(inner), Value::Array { element, items }) => match inner.as_ref() {
                ParameterType::Generic(name) if name == generic => Some(element.clone()),
                nested => items.iter().find_map(|item| nested.infer(generic, item)),
            },
            _ => None,
        }
    }
}

impl From<TypeTag> for ParameterType {
    fn from(tag: TypeTag) -> Self {
        ParameterType::Type(tag)
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterType::Type(tag) => write!(f, "{}", tag),
            ParameterType::Generic(name) => write!(f, "{}", name),
            ParameterType::Array(inner) => write!(f, "{}[]", inner),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterInfo {
    pub name: String,
    pub parameter_type: ParameterType,
    /// Default value of an optional parameter.
    pub default: Option<Value>,
}

impl ParameterInfo {
    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }
}

// ──────────────────────────────────────────────
// Methods
// ──────────────────────────────────────────────

/// Callable body of a test method.
#[derive(Clone)]
pub enum MethodBody {
    /// Placeholder for a method registered without a body.
    Empty,
    Fixed(TestFn),
    /// Closed instantiations of a generic method, keyed by the resolved
    /// generic type arguments in declaration order.
    Generic(BTreeMap<Vec<TypeTag>, TestFn>),
}

impl fmt::Debug for MethodBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodBody::Empty => write!(f, "Empty"),
            MethodBody::Fixed(_) => write!(f, "Fixed"),
            MethodBody::Generic(table) => f
                .debug_tuple("Generic")
                .field(&table.keys().collect::<Vec<_>>())
                .finish(),
        }
    }
}

/// A registered test method.
#[derive(Debug, Clone)]
pub struct MethodInfo {
    declaring_class: String,
    name: String,
    parameters: Vec<ParameterInfo>,
    generic_parameters: Vec<String>,
    type_arguments: Vec<TypeTag>,
    theory: TheoryAttribute,
    data_attributes: Vec<DataAttribute>,
    body: MethodBody,
}

impl MethodInfo {
    /// A new method. The declaring class is filled in when the method is
    /// added to a [`TestClass`].
    pub fn new(name: impl Into<String>) -> Self {
        MethodInfo {
            declaring_class: String::new(),
            name: name.into(),
            parameters: Vec::new(),
            generic_parameters: Vec::new(),
            type_arguments: Vec::new(),
            theory: TheoryAttribute::formatted(),
            data_attributes: Vec::new(),
            body: MethodBody::Empty,
        }
    }

    pub fn param(mut self, name: impl Into<String>, parameter_type: impl Into<ParameterType>) -> Self {
        self.parameters.push(ParameterInfo {
            name: name.into(),
            parameter_type: parameter_type.into(),
            default: None,
        });
        self
    }

    pub fn optional_param(
        mut self,
        name: impl Into<String>,
        parameter_type: impl Into<ParameterType>,
        default: Value,
    ) -> Self {
        self.parameters.push(ParameterInfo {
            name: name.into(),
            parameter_type: parameter_type.into(),
            default: Some(default),
        });
        self
    }

    pub fn generic_param(mut self, name: impl Into<String>) -> Self {
        self.generic_parameters.push(name.into());
        self
    }

    pub fn theory(mut self, theory: TheoryAttribute) -> Self {
        self.theory = theory;
        self
    }

    /// Attach a data attribute. Attributes keep declaration order.
    pub fn data(mut self, attribute: DataAttribute) -> Self {
        self.data_attributes.push(attribute);
        self
    }

    pub fn body<F>(mut self, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<(), String> + Send + Sync + 'static,
    {
        self.body = MethodBody::Fixed(Arc::new(f));
        self
    }

    /// Register the closed instantiation used for `types`.
    pub fn instantiation<F>(mut self, types: Vec<TypeTag>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<(), String> + Send + Sync + 'static,
    {
        let mut table = match std::mem::replace(&mut self.body, MethodBody::Empty) {
            MethodBody::Generic(table) => table,
            _ => BTreeMap::new(),
        };
        table.insert(types, Arc::new(f));
        self.body = MethodBody::Generic(table);
        self
    }

    pub(crate) fn declared_in(mut self, class: &str) -> Self {
        self.declaring_class = class.to_string();
        self
    }

    pub fn declaring_class(&self) -> &str {
        &self.declaring_class
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[ParameterInfo] {
        &self.parameters
    }

    pub fn generic_parameters(&self) -> &[String] {
        &self.generic_parameters
    }

    /// Generic type arguments of a closed generic method.
    pub fn type_arguments(&self) -> &[TypeTag] {
        &self.type_arguments
    }

    pub fn theory_attribute(&self) -> &TheoryAttribute {
        &self.theory
    }

    pub fn data_attributes(&self) -> &[DataAttribute] {
        &self.data_attributes
    }

    pub fn is_generic_method_definition(&self) -> bool {
        !self.generic_parameters.is_empty() && self.type_arguments.is_empty()
    }

    /// Append declared defaults for missing trailing optional parameters.
    pub fn resolve_method_arguments(&self, mut arguments: Vec<Value>) -> Vec<Value> {
        for parameter in self.parameters.iter().skip(arguments.len()) {
            match &parameter.default {
                Some(default) => arguments.push(default.clone()),
                None => break,
            }
        }
        arguments
    }

    /// Infer each generic parameter from the first non-null argument bound
    /// to a parameter that mentions it.
    pub fn resolve_generic_types(&self, arguments: &[Value]) -> Vec<TypeTag> {
        self.generic_parameters
            .iter()
            .map(|generic| {
                self.parameters
                    .iter()
                    .zip(arguments)
                    .filter(|(p, _)| p.parameter_type.mentions(generic))
                    .find_map(|(p, v)| p.parameter_type.infer(generic, v))
                    .unwrap_or(TypeTag::Object)
            })
            .collect()
    }

    /// Close a generic method definition over `types`.
    pub fn make_generic_method(&self, types: &[TypeTag]) -> Result<MethodInfo, TheoryError> {
        let body = match &self.body {
            MethodBody::Generic(table) => table.get(types).cloned(),
            _ => None,
        }
        .ok_or_else(|| TheoryError::GenericInstantiationMissing {
            method: format!("{}.{}", self.declaring_class, self.name),
            types: join_types(types),
        })?;

        let bindings: BTreeMap<String, TypeTag> = self
            .generic_parameters
            .iter()
            .cloned()
            .zip(types.iter().cloned())
            .collect();

        let mut closed = self.clone();
        closed.type_arguments = types.to_vec();
        closed.body = MethodBody::Fixed(body);
        for parameter in &mut closed.parameters {
            parameter.parameter_type = ParameterType::Type(parameter.parameter_type.close(&bindings));
        }
        Ok(closed)
    }

    /// Widen integer arguments bound to floating-point parameters.
    pub fn convert_arguments(&self, arguments: Vec<Value>) -> Vec<Value> {
        arguments
            .into_iter()
            .enumerate()
            .map(|(idx, value)| match (self.parameters.get(idx), value) {
                (
                    Some(ParameterInfo {
                        parameter_type: ParameterType::Type(TypeTag::Float),
                        ..
                    }),
                    Value::Int(i),
                ) => Value::Float(i as f64),
                (_, value) => value,
            })
            .collect()
    }

    /// `base<T1, T2>(name: value, ...)`.
    pub fn display_name_with_arguments(
        &self,
        base_display_name: &str,
        arguments: &[Value],
        generic_types: Option<&[TypeTag]>,
    ) -> String {
        let mut name = base_display_name.to_string();
        if let Some(types) = generic_types.filter(|t| !t.is_empty()) {
            name.push('<');
            name.push_str(&join_types(types));
            name.push('>');
        }
        format!("{}({})", name, self.arguments_with_names(arguments))
    }

    /// `name: value, ...`; missing arguments render as `name: ???`, surplus
    /// ones as `???: value`.
    pub fn arguments_with_names(&self, arguments: &[Value]) -> String {
        let count = arguments.len().max(self.parameters.len());
        (0..count)
            .map(|idx| {
                let name = self
                    .parameters
                    .get(idx)
                    .map(|p| p.name.as_str())
                    .unwrap_or("???");
                match (arguments.get(idx), self.parameters.get(idx)) {
                    (Some(value), _) => format!("{}: {}", name, format_argument(value)),
                    (None, Some(ParameterInfo {
                        default: Some(default),
                        ..
                    })) => format!("{}: {}", name, format_argument(default)),
                    (None, _) => format!("{}: ???", name),
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn arguments_without_names(&self, arguments: &[Value]) -> String {
        arguments
            .iter()
            .map(format_argument)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Bind `arguments` and run the body.
    pub fn invoke(&self, arguments: &[Value]) -> Result<(), TheoryError> {
        if arguments.len() != self.parameters.len() {
            return Err(TheoryError::ParameterCountMismatch {
                expected: self.parameters.len(),
                actual: arguments.len(),
            });
        }
        for (parameter, value) in self.parameters.iter().zip(arguments) {
            if !parameter.parameter_type.accepts(value) {
                return Err(TheoryError::ArgumentType {
                    actual: value.type_name(),
                    expected: parameter.parameter_type.to_string(),
                });
            }
        }

        let body = match &self.body {
            MethodBody::Fixed(body) => Arc::clone(body),
            MethodBody::Generic(_) => {
                let types = self.resolve_generic_types(arguments);
                return self.make_generic_method(&types)?.invoke(arguments);
            }
            MethodBody::Empty => return Ok(()),
        };

        match panic::catch_unwind(AssertUnwindSafe(|| body(arguments))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(message)) => Err(TheoryError::Assertion(message)),
            Err(payload) => Err(TheoryError::Panic(panic_message(payload.as_ref()))),
        }
    }
}

/// Message carried by a caught panic.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn join_types(types: &[TypeTag]) -> String {
    types
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render one argument value for a display name.
pub fn format_argument(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Text(s) => {
            if s.chars().count() > MAX_STRING_LENGTH {
                let head: String = s.chars().take(MAX_STRING_LENGTH).collect();
                format!("\"{}\"...", head)
            } else {
                format!("\"{}\"", s)
            }
        }
        Value::Array { items, .. } | Value::List(items) => {
            let mut parts: Vec<String> = items
                .iter()
                .take(MAX_ENUMERABLE_LENGTH)
                .map(format_argument)
                .collect();
            if items.len() > MAX_ENUMERABLE_LENGTH {
                parts.push("...".to_string());
            }
            format!("[{}]", parts.join(", "))
        }
        Value::Object(obj) => obj.describe(),
    }
}

// ──────────────────────────────────────────────
// Classes
// ──────────────────────────────────────────────

/// A static method registered as a data member.
#[derive(Clone)]
pub struct StaticMethod {
    pub name: String,
    pub parameters: Vec<ParameterType>,
    body: StaticFn,
}

impl StaticMethod {
    /// Every declared parameter accepts the supplied value (nulls match
    /// anything).
    pub fn is_compatible(&self, arguments: &[Value]) -> bool {
        self.parameters.len() == arguments.len()
            && self
                .parameters
                .iter()
                .zip(arguments)
                .all(|(p, v)| v.is_null() || p.accepts(v))
    }

    pub fn call(&self, arguments: &[Value]) -> Result<Value, TheoryError> {
        (self.body)(arguments)
    }
}

/// A registered test class with its static data members and test methods.
pub struct TestClass {
    name: String,
    base: Option<Arc<TestClass>>,
    properties: BTreeMap<String, PropertyFn>,
    fields: BTreeMap<String, Value>,
    static_methods: Vec<StaticMethod>,
    methods: Vec<Arc<MethodInfo>>,
}

impl fmt::Debug for TestClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestClass")
            .field("name", &self.name)
            .field("base", &self.base.as_ref().map(|b| b.name.clone()))
            .field("properties", &self.properties.keys().collect::<Vec<_>>())
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("methods", &self.methods.iter().map(|m| m.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl TestClass {
    pub fn new(name: impl Into<String>) -> Self {
        TestClass {
            name: name.into(),
            base: None,
            properties: BTreeMap::new(),
            fields: BTreeMap::new(),
            static_methods: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn extends(mut self, base: Arc<TestClass>) -> Self {
        self.base = Some(base);
        self
    }

    pub fn property<F>(mut self, name: impl Into<String>, accessor: F) -> Self
    where
        F: Fn() -> Result<Value, TheoryError> + Send + Sync + 'static,
    {
        self.properties.insert(name.into(), Arc::new(accessor));
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn static_method<F>(
        mut self,
        name: impl Into<String>,
        parameters: Vec<ParameterType>,
        body: F,
    ) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, TheoryError> + Send + Sync + 'static,
    {
        self.static_methods.push(StaticMethod {
            name: name.into(),
            parameters,
            body: Arc::new(body),
        });
        self
    }

    pub fn method(mut self, method: MethodInfo) -> Self {
        let method = method.declared_in(&self.name);
        self.methods.push(Arc::new(method));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> Option<&Arc<TestClass>> {
        self.base.as_ref()
    }

    /// This class followed by its ancestor chain.
    pub fn ancestors(&self) -> impl Iterator<Item = &TestClass> {
        std::iter::successors(Some(self), |class| class.base.as_deref())
    }

    pub fn find_property(&self, name: &str) -> Option<&PropertyFn> {
        self.ancestors().find_map(|class| class.properties.get(name))
    }

    pub fn find_field(&self, name: &str) -> Option<&Value> {
        self.ancestors().find_map(|class| class.fields.get(name))
    }

    pub fn find_static_method(&self, name: &str, arguments: &[Value]) -> Option<&StaticMethod> {
        self.ancestors().find_map(|class| {
            class
                .static_methods
                .iter()
                .find(|m| m.name == name && m.is_compatible(arguments))
        })
    }

    /// Test methods declared on this class only.
    pub fn declared_methods(&self) -> &[Arc<MethodInfo>] {
        &self.methods
    }

    /// Test methods visible on this class, own methods first. Inherited
    /// methods hidden by a same-named method are skipped.
    pub fn methods(&self) -> Vec<Arc<MethodInfo>> {
        let mut seen = std::collections::BTreeSet::new();
        let mut out = Vec::new();
        for class in self.ancestors() {
            for method in &class.methods {
                if seen.insert(method.name().to_string()) {
                    out.push(Arc::clone(method));
                }
            }
        }
        out
    }

    pub fn find_method(&self, name: &str) -> Option<Arc<MethodInfo>> {
        self.ancestors()
            .find_map(|class| class.methods.iter().find(|m| m.name() == name))
            .cloned()
    }
}

/// A test method as seen through a (possibly derived) test class.
#[derive(Debug, Clone)]
pub struct TestMethod {
    class: Arc<TestClass>,
    method: Arc<MethodInfo>,
}

impl TestMethod {
    pub fn new(class: Arc<TestClass>, method: Arc<MethodInfo>) -> Self {
        TestMethod { class, method }
    }

    /// The reflected class.
    pub fn class(&self) -> &Arc<TestClass> {
        &self.class
    }

    pub fn method(&self) -> &Arc<MethodInfo> {
        &self.method
    }

    pub fn class_name(&self) -> &str {
        self.class.name()
    }

    pub fn method_name(&self) -> &str {
        self.method.name()
    }

    /// `Class.Method`, used in diagnostics and error messages.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.class.name(), self.method.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::TypeTag;

    fn add_method() -> MethodInfo {
        MethodInfo::new("Add")
            .param("a", TypeTag::Int)
            .param("b", TypeTag::Int)
            .param("expected", TypeTag::Int)
            .body(|args| {
                let (a, b, expected) = (
                    args[0].as_int().unwrap_or_default(),
                    args[1].as_int().unwrap_or_default(),
                    args[2].as_int().unwrap_or_default(),
                );
                if a + b == expected {
                    Ok(())
                } else {
                    Err(format!("{} + {} != {}", a, b, expected))
                }
            })
    }

    #[test]
    fn display_name_with_arguments_renders_names() {
        let method = add_method();
        let args = vec![Value::Int(9), Value::Int(1), Value::Int(10)];
        assert_eq!(
            method.display_name_with_arguments("Calc.Add", &args, None),
            "Calc.Add(a: 9, b: 1, expected: 10)"
        );
    }

    #[test]
    fn missing_and_surplus_arguments() {
        let method = MethodInfo::new("M").param("a", TypeTag::Int);
        assert_eq!(method.arguments_with_names(&[]), "a: ???");
        assert_eq!(
            method.arguments_with_names(&[Value::Int(1), Value::text("x")]),
            "a: 1, ???: \"x\""
        );
        assert_eq!(
            method.arguments_without_names(&[Value::Int(1), Value::Null]),
            "1, null"
        );
    }

    #[test]
    fn long_strings_and_arrays_are_truncated() {
        let long = "x".repeat(60);
        assert_eq!(
            format_argument(&Value::text(long)),
            format!("\"{}\"...", "x".repeat(50))
        );
        let array = Value::array(TypeTag::Int, (1..=7).map(Value::Int).collect());
        assert_eq!(format_argument(&array), "[1, 2, 3, 4, 5, ...]");
    }

    #[test]
    fn optional_parameters_are_filled_in() {
        let method = MethodInfo::new("M")
            .param("a", TypeTag::Int)
            .optional_param("b", TypeTag::Text, Value::text("d"));
        let resolved = method.resolve_method_arguments(vec![Value::Int(1)]);
        assert_eq!(resolved, vec![Value::Int(1), Value::text("d")]);
    }

    #[test]
    fn generic_types_resolve_from_values() {
        let method = MethodInfo::new("Echo")
            .generic_param("T")
            .generic_param("U")
            .param("value", ParameterType::generic("T"))
            .param("items", ParameterType::array_of(ParameterType::generic("U")))
            .instantiation(vec![TypeTag::Text, TypeTag::Int], |_| Ok(()));
        let args = vec![
            Value::text("a"),
            Value::array(TypeTag::Int, vec![Value::Int(1)]),
        ];
        let types = method.resolve_generic_types(&args);
        assert_eq!(types, vec![TypeTag::Text, TypeTag::Int]);

        let closed = method.make_generic_method(&types).unwrap();
        assert_eq!(closed.type_arguments(), &[TypeTag::Text, TypeTag::Int]);
        assert_eq!(
            closed.parameters()[1].parameter_type,
            ParameterType::Type(TypeTag::array_of(TypeTag::Int))
        );
        assert!(closed.invoke(&args).is_ok());
    }

    #[test]
    fn unresolved_generic_defaults_to_object() {
        let method = MethodInfo::new("M")
            .generic_param("T")
            .param("value", ParameterType::generic("T"));
        assert_eq!(method.resolve_generic_types(&[Value::Null]), vec![TypeTag::Object]);
    }

    #[test]
    fn missing_instantiation_is_an_error() {
        let class = TestClass::new("Tests").method(
            MethodInfo::new("M")
                .generic_param("T")
                .param("value", ParameterType::generic("T")),
        );
        let method = class.find_method("M").unwrap();
        let err = method.make_generic_method(&[TypeTag::Bool]).unwrap_err();
        assert_eq!(
            err,
            TheoryError::GenericInstantiationMissing {
                method: "Tests.M".to_string(),
                types: "bool".to_string()
            }
        );
    }

    #[test]
    fn convert_arguments_widens_ints() {
        let method = MethodInfo::new("M").param("x", TypeTag::Float);
        assert_eq!(
            method.convert_arguments(vec![Value::Int(2)]),
            vec![Value::Float(2.0)]
        );
    }

    #[test]
    fn invoke_checks_arity_and_reports_failures() {
        let method = add_method();
        assert!(method
            .invoke(&[Value::Int(1), Value::Int(1), Value::Int(2)])
            .is_ok());
        assert_eq!(
            method.invoke(&[Value::Int(1)]),
            Err(TheoryError::ParameterCountMismatch {
                expected: 3,
                actual: 1
            })
        );
        assert_eq!(
            method.invoke(&[Value::Int(1), Value::Int(1), Value::Int(3)]),
            Err(TheoryError::Assertion("1 + 1 != 3".to_string()))
        );
        assert!(matches!(
            method.invoke(&[Value::text("1"), Value::Int(1), Value::Int(3)]),
            Err(TheoryError::ArgumentType { .. })
        ));
    }

    #[test]
    fn invoke_catches_panics() {
        let method = MethodInfo::new("Boom").body(|_| panic!("kaboom"));
        assert_eq!(
            method.invoke(&[]),
            Err(TheoryError::Panic("kaboom".to_string()))
        );
    }

    #[test]
    fn member_lookup_walks_ancestors() {
        let base = Arc::new(
            TestClass::new("Base")
                .field("Rows", Value::List(vec![]))
                .static_method("Make", vec![TypeTag::Int.into()], |_| Ok(Value::List(vec![]))),
        );
        let derived = TestClass::new("Derived").extends(base);
        assert!(derived.find_field("Rows").is_some());
        assert!(derived.find_static_method("Make", &[Value::Int(1)]).is_some());
        assert!(derived.find_static_method("Make", &[Value::Null]).is_some());
        assert!(derived.find_static_method("Make", &[Value::text("x")]).is_none());
    }

    #[test]
    fn derived_methods_hide_inherited_ones() {
        let base = Arc::new(
            TestClass::new("Base")
                .method(MethodInfo::new("A"))
                .method(MethodInfo::new("B")),
        );
        let derived = TestClass::new("Derived")
            .extends(base)
            .method(MethodInfo::new("B"));
        let methods = derived.methods();
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[0].declaring_class(), "Derived");
        assert_eq!(methods[1].declaring_class(), "Base");
    }
}
