#![allow(clippy::result_large_err)]
//! theoria-core: typed theory data, display names and ordering.
//!
//! Provides the building blocks the discovery and execution pipeline in
//! `theoria-sdk` works on.
//!
//! # Public API
//!
//! - [`Value`], [`DataRow`], [`DataObject`] -- argument values and rows
//! - [`TestClass`], [`MethodInfo`], [`TestMethod`] -- the reflection registry
//! - [`DataAttribute`] and the [`data`] sources -- where rows come from
//! - [`TheoryAttribute`], [`OrderedTheoryConfig`] -- theory declarations
//! - [`DisplayNameFormattingContext`], [`CustomDisplayName`],
//!   [`FormattedTheory`] -- display-name computation
//! - [`TheoriaConfig`], [`DiscoveryOptions`] -- project configuration
//! - [`SerializationInfo`], [`ValueCodecs`] -- case persistence

pub mod config;
pub mod data;
pub mod display;
pub mod error;
pub mod format;
pub mod reflect;
pub mod serialization;
pub mod theory;
pub mod value;

// ── Convenience re-exports ───────────────────────────────────────────

pub use config::{read_config, DiscoveryOptions, MethodDisplay, TheoriaConfig};
pub use data::{
    ClassTestData, DataAttribute, DataSource, DiscovererRef, ElementMatch, InlineData,
    InlineObject, InlineObjectData, MemberTestData,
};
pub use display::{
    CustomDisplayName, DefaultDisplayName, DisplayNameFormattingContext, FormattedTheory, Label,
    TestCaseInfo,
};
pub use error::{ConfigError, TheoryError};
pub use format::NumberFormat;
pub use reflect::{MethodInfo, ParameterInfo, ParameterType, TestClass, TestMethod};
pub use serialization::{SerializationInfo, SerializedValue, ValueCodecs};
pub use theory::{OrderedTheoryConfig, TheoryAttribute};
pub use value::{DataObject, DataRow, Disposable, TypeTag, Value};
