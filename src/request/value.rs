//! Best-effort conversion of arbitrary input values to JSON.
//!
//! Encoding a payload must never fail, whatever the caller stuffed into the
//! input map. Instead of open-ended reflection, the conversion is a closed
//! enum plus an ordered dispatch in [`InputValue::to_json`]: a mapping dump
//! becomes an object, a set becomes a sorted list, raw bytes become lossily
//! decoded text, and anything else degrades to its display string.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

/// Capability for caller types that can dump themselves to a field mapping.
pub trait DumpMapping {
    /// Render self as an ordered name to value mapping.
    fn dump_mapping(&self) -> BTreeMap<String, InputValue>;
}

/// An input value carried opaquely through the payload.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    /// Plain text.
    Text(String),
    /// A value that is already JSON-representable.
    Json(Value),
    /// Raw bytes; decoded lossily when serialized.
    Bytes(Vec<u8>),
    /// An unordered set; serialized as a sorted list.
    Set(BTreeSet<String>),
    /// A nested mapping, typically produced via [`DumpMapping`].
    Mapping(BTreeMap<String, InputValue>),
    /// Anything else, pre-rendered to its display string.
    Opaque(String),
}

impl InputValue {
    /// Build a mapping value from any type exposing [`DumpMapping`].
    pub fn from_dump<T: DumpMapping + ?Sized>(source: &T) -> Self {
        Self::Mapping(source.dump_mapping())
    }

    /// Convert to JSON. Total: never fails, for any variant.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Json(value) => value.clone(),
            Self::Bytes(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
            Self::Set(items) => Value::Array(
                items
                    .iter()
                    .map(|item| Value::String(item.clone()))
                    .collect(),
            ),
            Self::Mapping(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
            Self::Opaque(repr) => Value::String(repr.clone()),
        }
    }
}

impl From<&str> for InputValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for InputValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Value> for InputValue {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<Vec<u8>> for InputValue {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<BTreeSet<String>> for InputValue {
    fn from(items: BTreeSet<String>) -> Self {
        Self::Set(items)
    }
}
