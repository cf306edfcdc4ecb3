//! Output-format normalization for process stdout.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::bridge::BridgeError;

use super::extract_agent_message;

/// One completion produced by the downstream process.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutput {
    /// A raw completion string.
    Text(String),
    /// A mapping of named output fields to string values.
    Fields(BTreeMap<String, String>),
}

impl CompletionOutput {
    /// The completion as text, if it is the raw variant.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Fields(_) => None,
        }
    }

    /// A named field value, if it is the structured variant.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        match self {
            Self::Fields(fields) => fields.get(name).map(String::as_str),
            Self::Text(_) => None,
        }
    }

    fn from_value(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            Value::Object(entries) => Self::Fields(
                entries
                    .into_iter()
                    .map(|(name, value)| (name, render_text(value)))
                    .collect(),
            ),
            other => Self::Text(other.to_string()),
        }
    }
}

/// Best-effort rendering of a field value to text: strings verbatim,
/// anything else as compact JSON.
fn render_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

/// Decode stdout that is required to be a whole-payload JSON document.
///
/// An object with an `"outputs"` key must hold a list, returned as-is. A
/// bare list is used directly. Anything else is a decode error.
///
/// # Errors
///
/// Returns [`BridgeError::Decode`] carrying the raw stdout when the text is
/// not valid JSON, when `"outputs"` is present but not a list, or when the
/// parsed document is not list-shaped.
pub fn decode_outputs(stdout: &str) -> Result<Vec<CompletionOutput>, BridgeError> {
    let decode_err = |reason: &str| BridgeError::Decode {
        reason: reason.to_string(),
        stdout: stdout.to_string(),
    };

    let parsed: Value = serde_json::from_str(stdout.trim())
        .map_err(|e| decode_err(&format!("stdout is not valid JSON: {e}")))?;

    let outputs = match parsed {
        Value::Object(mut entries) => match entries.remove("outputs") {
            Some(Value::Array(items)) => items,
            Some(_) => return Err(decode_err("\"outputs\" field is not a list")),
            None => return Err(decode_err("JSON object has no \"outputs\" list")),
        },
        Value::Array(items) => items,
        _ => return Err(decode_err("JSON document is not list-shaped")),
    };

    Ok(outputs.into_iter().map(CompletionOutput::from_value).collect())
}

/// Normalize raw stdout to a single completion string.
///
/// Trims, then tries the event-stream extraction; when no agent message is
/// found the trimmed text itself is the completion. Never fails.
#[must_use]
pub fn normalize_output(stdout: &str) -> String {
    let trimmed = stdout.trim();
    extract_agent_message(trimmed).unwrap_or_else(|| trimmed.to_string())
}
