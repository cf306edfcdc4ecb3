//! Schema-aware client: structured JSON payload in, structured outputs out.

use crate::bridge::{BridgeError, CliBridge, GenerationSlot, ProcessSpec};
use crate::codec::{decode_outputs, encode_structured, CompletionOutput};
use crate::request::GenerationRequest;

use super::lm::requested_samples;

/// A CLI program driven through the structured JSON payload.
///
/// Each invocation receives the full payload (messages, inputs, demos,
/// options, schema metadata) on stdin and must answer with whole-payload
/// JSON: an `{"outputs": [...]}` object or a bare list. One invocation runs
/// per requested completion, and each must yield exactly one output.
#[derive(Debug, Clone)]
pub struct CliAdapter {
    bridge: CliBridge,
}

impl CliAdapter {
    /// Create an adapter over the given process spec.
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
    /// [`BridgeError::InvalidOption`] for a malformed `n`,
    /// [`BridgeError::Decode`] when an invocation's stdout is not valid
    /// whole-payload JSON or yields anything but exactly one output, plus
    /// every bridge invocation failure.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<CompletionOutput>, BridgeError> {
        let total = requested_samples(request)?;
        let payload = encode_structured(request);
        let mut completions = Vec::with_capacity(total);
        for index in 0..total {
            let stdout = self
                .bridge
                .invoke(&payload, GenerationSlot::new(index, total))
                .await?;
            completions.push(single_output(&stdout, index)?);
        }
        Ok(completions)
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
    ) -> Result<Vec<CompletionOutput>, BridgeError> {
        let total = requested_samples(request)?;
        let payload = encode_structured(request);
        let mut completions = Vec::with_capacity(total);
        for index in 0..total {
            let stdout = self
                .bridge
                .invoke_blocking(&payload, GenerationSlot::new(index, total))?;
            completions.push(single_output(&stdout, index)?);
        }
        Ok(completions)
    }
}

/// Decode one invocation's stdout and require exactly one output for the
/// generation slot it served.
fn single_output(stdout: &str, index: usize) -> Result<CompletionOutput, BridgeError> {
    let mut outputs = decode_outputs(stdout)?;
    if outputs.len() == 1 {
        Ok(outputs.remove(0))
    } else {
        Err(BridgeError::Decode {
            reason: format!(
                "expected exactly 1 output for generation {index}, got {}",
                outputs.len()
            ),
            stdout: stdout.to_string(),
        })
    }
}
