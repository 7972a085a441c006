//! Decides whether a data row can be persisted with its test case.

use std::sync::Arc;

use theoria_core::{DataRow, ValueCodecs};

/// Checks whether every value of a row survives serialization.
pub trait SerializationProbe: Send + Sync {
    /// Type name of the first value that cannot be serialized.
    fn first_unserializable(&self, row: &DataRow) -> Option<String>;
}

/// Probe backed by the assembly's value codecs.
#[derive(Debug, Clone, Default)]
pub struct CodecSerializationProbe {
    codecs: Arc<ValueCodecs>,
}

impl CodecSerializationProbe {
    pub fn new(codecs: Arc<ValueCodecs>) -> Self {
        CodecSerializationProbe { codecs }
    }
}

impl SerializationProbe for CodecSerializationProbe {
    fn first_unserializable(&self, row: &DataRow) -> Option<String> {
        row.values()
            .iter()
            .find(|v| !self.codecs.is_serializable(v))
            .map(|v| v.type_name())
    }
}
