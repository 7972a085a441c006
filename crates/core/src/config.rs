//! Project-wide discovery configuration.
//!
//! Loaded from a TOML file, typically `theoria.toml` at the workspace root.
//!
//! # Example
//!
//! ```toml
//! [discovery]
//! pre_enumerate_theories = true
//! method_display = "method"
//! diagnostic_messages = true
//!
//! [ordering]
//! starting_test_number = 10
//! test_number_display_name_format = "[{0:D3}] {1}"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::reflect::TestMethod;
use crate::theory::{OrderedTheoryConfig, TheoryAttribute};

// ── Types ─────────────────────────────────────────────────────────────────────

/// How the base display name of a test is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodDisplay {
    /// `Class.Method`.
    #[default]
    ClassAndMethod,
    /// `Method` only.
    Method,
}

impl MethodDisplay {
    /// Base display name of `method`: the theory's own display name, or
    /// the method name in this style.
    pub fn base_display_name(self, method: &TestMethod) -> String {
        if let Some(name) = &method.method().theory_attribute().display_name {
            return name.clone();
        }
        match self {
            MethodDisplay::ClassAndMethod => method.qualified_name(),
            MethodDisplay::Method => method.method_name().to_string(),
        }
    }
}

/// `[discovery]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryOptions {
    /// Materialize one test case per data row at discovery time.
    pub pre_enumerate_theories: bool,
    pub method_display: MethodDisplay,
    /// Report discovery fallbacks at `info` instead of `debug`.
    pub diagnostic_messages: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        DiscoveryOptions {
            pre_enumerate_theories: true,
            method_display: MethodDisplay::ClassAndMethod,
            diagnostic_messages: false,
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TheoriaConfig {
    #[serde(default)]
    pub discovery: DiscoveryOptions,
    /// Ordering defaults for theories built with [`TheoriaConfig::theory`].
    #[serde(default)]
    pub ordering: OrderedTheoryConfig,
}

impl TheoriaConfig {
    /// A formatted theory using this file's ordering defaults.
    pub fn theory(&self) -> TheoryAttribute {
        TheoryAttribute::formatted_with(self.ordering.clone())
    }
}

// ── Functions ─────────────────────────────────────────────────────────────────

pub fn from_toml_str(content: &str) -> Result<TheoriaConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Read and parse a configuration file from `path`.
pub fn read_config(path: &Path) -> Result<TheoriaConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    from_toml_str(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_uses_defaults() {
        let config = from_toml_str("").unwrap();
        assert_eq!(config, TheoriaConfig::default());
        assert!(config.discovery.pre_enumerate_theories);
        assert!(config.ordering.enable_ordered_tests);
    }

    #[test]
    fn read_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[discovery]
pre_enumerate_theories = false
method_display = "method"

[ordering]
starting_test_number = 10
test_number_display_name_format = "[{{0:D3}}] {{1}}"
"#
        )
        .unwrap();

        let config = read_config(file.path()).unwrap();
        assert!(!config.discovery.pre_enumerate_theories);
        assert_eq!(config.discovery.method_display, MethodDisplay::Method);
        assert_eq!(config.ordering.starting_test_number, 10);
        assert_eq!(
            config.ordering.test_number_display_name_format.render(7, "x"),
            "[007] x"
        );

        let theory = config.theory();
        assert_eq!(theory.ordering.starting_test_number, 10);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_config(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn bad_format_is_a_parse_error() {
        let err = from_toml_str("[ordering]\ntest_number_display_name_format = \"{0\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("invalid test number format"));
    }
}
