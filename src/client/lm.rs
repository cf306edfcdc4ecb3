//! Bare-LM client: plain-text transcript in, normalized text out.

use async_trait::async_trait;

use crate::bridge::{BridgeError, CliBridge, GenerationSlot, ProcessSpec};
use crate::codec::{encode_plain, normalize_output};
use crate::request::GenerationRequest;

use super::TextGenerator;

/// A CLI program used as a conversational language model.
///
/// The request is rendered as a role-tagged transcript, the command is
/// invoked once per requested completion, and each stdout is normalized
/// (event-stream extraction, then raw-text fallback).
#[derive(Debug, Clone)]
pub struct CliLm {
    bridge: CliBridge,
}

impl CliLm {
    /// Create a client over the given process spec.
    #[must_use]
    pub fn new(spec: ProcessSpec) -> Self {
        Self {
            bridge: CliBridge::new(spec),
        }
    }

    /// The underlying bridge.
    #[must_use]
    pub fn bridge(&self) -> &CliBridge {
        &self.bridge
    }

    /// Produce the requested completions without blocking the scheduler.
    ///
    /// Invocations run sequentially in index order; the first failure aborts
    /// the whole request. The result length always equals the requested `n`.
    ///
    /// # Errors
    ///
    /// [`BridgeError::EmptyRequest`] for a message-less request,
    /// [`BridgeError::InvalidOption`] for a malformed `n`, plus every bridge
    /// invocation failure.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Vec<String>, BridgeError> {
        let (prompt, total) = plan(request)?;
        let mut outputs = Vec::with_capacity(total);
        for index in 0..total {
            let stdout = self
                .bridge
                .invoke(&prompt, GenerationSlot::new(index, total))
                .await?;
            outputs.push(normalize_output(&stdout));
        }
        Ok(outputs)
    }

    /// Blocking variant of [`generate`](Self::generate). Must not be called
    /// from inside an async runtime.
    ///
    /// # Errors
    ///
    /// Same failures as [`generate`](Self::generate).
    pub fn generate_blocking(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<String>, BridgeError> {
        let (prompt, total) = plan(request)?;
        let mut outputs = Vec::with_capacity(total);
        for index in 0..total {
            let stdout = self
                .bridge
                .invoke_blocking(&prompt, GenerationSlot::new(index, total))?;
            outputs.push(normalize_output(&stdout));
        }
        Ok(outputs)
    }
}

#[async_trait]
impl TextGenerator for CliLm {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<String>, BridgeError> {
        CliLm::generate(self, request).await
    }
}

/// Requested sample count, or an [`BridgeError::InvalidOption`] naming the
/// offending `n` value.
pub(super) fn requested_samples(request: &GenerationRequest) -> Result<usize, BridgeError> {
    request
        .options()
        .n()
        .ok_or_else(|| BridgeError::InvalidOption {
            key: "n".to_string(),
            value: request
                .options()
                .get("n")
                .map_or_else(String::new, std::string::ToString::to_string),
        })
}

/// Validate the request and encode the transcript once; it is identical for
/// every sample.
fn plan(request: &GenerationRequest) -> Result<(String, usize), BridgeError> {
    let total = requested_samples(request)?;
    let prompt = encode_plain(request)?;
    Ok((prompt, total))
}
