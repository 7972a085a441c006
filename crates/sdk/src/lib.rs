#![allow(clippy::result_large_err)]
//! theoria-sdk: discovery and execution of ordered theories.
//!
//! Discovery pre-enumerates a theory's data into one numbered
//! [`TestCase`] per row when every row can be serialized, and otherwise
//! defers enumeration to run time. Execution reports progress through a
//! [`MessageBus`].
//!
//! # Public API
//!
//! - [`TestAssembly`] -- registered classes, codecs, discoverers, config
//! - [`NumberedTheoryDiscoverer`] -- pre-enumeration
//! - [`DataDiscoverer`], [`DiscovererRegistry`] -- the discoverer extension point
//! - [`TestCase`], [`TestCaseKind`] -- discovered cases and their persistence
//! - [`Executor`], [`TestCaseRunner`], [`TheoryTestCaseRunner`] -- execution
//! - [`MessageBus`], [`Message`], [`CollectingMessageBus`] -- reporting

pub mod aggregator;
pub mod assembly;
pub mod discoverer;
pub mod discovery;
pub mod executor;
pub mod message;
pub mod probe;
pub mod runner;
pub mod test_case;

// ── Convenience re-exports ───────────────────────────────────────────

pub use aggregator::{CancellationTokenSource, ExceptionAggregator, ExecutionTimer, RunSummary};
pub use assembly::{Discovery, TestAssembly};
pub use discoverer::NumberedTheoryDiscoverer;
pub use discovery::{
    DataAttributeDiscoverer, DataDiscoverer, DiscovererLookupError, DiscovererRegistry, Extension,
    InlineObjectDiscoverer, MemberDataDiscoverer,
};
pub use executor::{ExecutionReport, Executor};
pub use message::{CollectingMessageBus, Message, MessageBus, Test};
pub use probe::{CodecSerializationProbe, SerializationProbe};
pub use runner::{RunContext, TestCaseLifecycle, TestCaseRunner, TestRunner, TheoryTestCaseRunner};
pub use test_case::{format_display_name, TestCase, TestCaseKind};
