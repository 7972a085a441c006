//! The registry of test classes a run discovers and executes.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use theoria_core::{
    read_config, ConfigError, TestClass, TestMethod, TheoriaConfig, TheoryError, ValueCodecs,
};
use tracing::warn;

use crate::discoverer::NumberedTheoryDiscoverer;
use crate::discovery::DiscovererRegistry;
use crate::probe::CodecSerializationProbe;
use crate::test_case::TestCase;

/// Registered test classes plus everything discovery needs: value codecs,
/// the discoverer registry and project configuration.
#[derive(Clone)]
pub struct TestAssembly {
    name: String,
    classes: BTreeMap<String, Arc<TestClass>>,
    codecs: Arc<ValueCodecs>,
    registry: Arc<DiscovererRegistry>,
    config: TheoriaConfig,
}

/// Outcome of discovering every method of an assembly.
#[derive(Debug, Default)]
pub struct Discovery {
    pub cases: Vec<TestCase>,
    /// Methods whose discovery failed outright. Each also left one
    /// execution-error case in `cases`.
    pub errors: Vec<TheoryError>,
}

impl TestAssembly {
    pub fn new(name: impl Into<String>) -> Self {
        TestAssembly {
            name: name.into(),
            classes: BTreeMap::new(),
            codecs: Arc::new(ValueCodecs::new()),
            registry: Arc::new(DiscovererRegistry::with_builtins()),
            config: TheoriaConfig::default(),
        }
    }

    pub fn with_class(mut self, class: Arc<TestClass>) -> Self {
        self.classes.insert(class.name().to_string(), class);
        self
    }

    pub fn with_codecs(mut self, codecs: ValueCodecs) -> Self {
        self.codecs = Arc::new(codecs);
        self
    }

    pub fn with_registry(mut self, registry: DiscovererRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn with_config(mut self, config: TheoriaConfig) -> Self {
        self.config = config;
        self
    }

    /// Load configuration from a TOML file.
    pub fn with_config_file(self, path: &Path) -> Result<Self, ConfigError> {
        let config = read_config(path)?;
        Ok(self.with_config(config))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn codecs(&self) -> &ValueCodecs {
        &self.codecs
    }

    pub fn registry(&self) -> &Arc<DiscovererRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &TheoriaConfig {
        &self.config
    }

    pub fn class(&self, name: &str) -> Option<&Arc<TestClass>> {
        self.classes.get(name)
    }

    /// `method_name` as seen through class `class_name`, inherited methods
    /// included.
    pub fn test_method(&self, class_name: &str, method_name: &str) -> Option<TestMethod> {
        let class = self.class(class_name)?;
        let method = class.find_method(method_name)?;
        Some(TestMethod::new(Arc::clone(class), method))
    }

    /// Every test method of every class, classes in name order.
    pub fn test_methods(&self) -> Vec<TestMethod> {
        self.classes
            .values()
            .flat_map(|class| {
                class
                    .methods()
                    .into_iter()
                    .map(move |method| TestMethod::new(Arc::clone(class), method))
            })
            .collect()
    }

    pub fn discoverer(&self) -> NumberedTheoryDiscoverer {
        NumberedTheoryDiscoverer::new(
            Arc::clone(&self.registry),
            Arc::new(CodecSerializationProbe::new(Arc::clone(&self.codecs))),
        )
    }

    pub fn discover_method(&self, test_method: &TestMethod) -> Result<Vec<TestCase>, TheoryError> {
        self.discoverer()
            .discover(&self.config.discovery, test_method)
    }

    /// Discover every method. A method whose discovery fails is recorded
    /// and stands in as a single execution-error case; the others still
    /// produce their cases.
    pub fn discover_all(&self) -> Discovery {
        let discoverer = self.discoverer();
        let mut discovery = Discovery::default();
        for test_method in self.test_methods() {
            match discoverer.discover(&self.config.discovery, &test_method) {
                Ok(cases) => discovery.cases.extend(cases),
                Err(e) => {
                    warn!(method = %test_method.qualified_name(), error = %e, "discovery failed");
                    discovery.cases.push(TestCase::execution_error(
                        &self.config.discovery,
                        test_method,
                        e.to_string(),
                    ));
                    discovery.errors.push(e);
                }
            }
        }
        discovery
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use theoria_core::{row, DataAttribute, MethodInfo, TypeTag};

    fn assembly() -> TestAssembly {
        let base = Arc::new(
            TestClass::new("Base").method(
                MethodInfo::new("Inherited")
                    .param("x", TypeTag::Int)
                    .data(DataAttribute::inline(row![1])),
            ),
        );
        let derived = Arc::new(TestClass::new("Derived").extends(base).method(
            MethodInfo::new("Own")
                .param("x", TypeTag::Int)
                .data(DataAttribute::inline(row![2]))
                .data(DataAttribute::inline(row![3])),
        ));
        TestAssembly::new("tests").with_class(derived)
    }

    #[test]
    fn inherited_methods_are_visible() {
        let assembly = assembly();
        let method = assembly.test_method("Derived", "Inherited").unwrap();
        assert_eq!(method.qualified_name(), "Derived.Inherited");
        assert_eq!(method.method().declaring_class(), "Base");
        assert!(assembly.test_method("Base", "Inherited").is_none());
    }

    #[test]
    fn discover_all_collects_every_method() {
        let discovery = assembly().discover_all();
        assert!(discovery.errors.is_empty());
        let names: Vec<&str> = discovery.cases.iter().map(|c| c.display_name()).collect();
        assert_eq!(
            names,
            vec![
                "  1) Derived.Own(x: 2)",
                "  2) Derived.Own(x: 3)",
                "  1) Derived.Inherited(x: 1)",
            ]
        );
    }
}
