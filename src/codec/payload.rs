//! Encoders for the stdin payload.
//!
//! Two encodings are supported. Structured mode emits one self-contained
//! JSON object for processes that want the full request; plain-text mode
//! emits a role-tagged transcript for processes that expect conversational
//! text.

use serde_json::Value;

use crate::bridge::BridgeError;
use crate::request::{Demo, GenerationRequest};

/// Identity tag stamped into every structured payload.
pub const ADAPTER_TAG: &str = "cli";

/// Encode a request as a single structured JSON payload.
///
/// The payload carries the adapter tag, the message sequence verbatim, the
/// input values, demonstrations, sampling options (`lm_kwargs`), and the
/// schema metadata (`signature`, `null` when the request carries none).
/// Total: succeeds for any request.
#[must_use]
pub fn encode_structured(request: &GenerationRequest) -> String {
    let inputs = Value::Object(
        request
            .inputs()
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect(),
    );
    let demos = Value::Array(request.demos().iter().map(Demo::to_payload).collect());
    let signature = request
        .schema()
        .map_or(Value::Null, crate::request::SchemaSpec::to_payload);

    let payload = serde_json::json!({
        "adapter": ADAPTER_TAG,
        "messages": request.messages(),
        "inputs": inputs,
        "demos": demos,
        "lm_kwargs": request.options().to_payload(),
        "signature": signature,
    });
    payload.to_string()
}

/// Encode a request as a plain role-tagged transcript.
///
/// Each message renders as `"<ROLE>:\n<content>"`; messages are separated by
/// a blank line.
///
/// # Errors
///
/// Returns [`BridgeError::EmptyRequest`] when the request has no messages;
/// there would be nothing to send.
pub fn encode_plain(request: &GenerationRequest) -> Result<String, BridgeError> {
    if request.messages().is_empty() {
        return Err(BridgeError::EmptyRequest);
    }
    let parts: Vec<String> = request
        .messages()
        .iter()
        .map(|message| format!("{}:\n{}", message.role.label(), message.content))
        .collect();
    Ok(parts.join("\n\n"))
}
