//! Client-facing layers over the bridge.

mod adapter;
mod lm;

pub use adapter::*;
pub use lm::*;

use async_trait::async_trait;

use crate::bridge::BridgeError;
use crate::request::GenerationRequest;

/// Seam for interchangeable text-generation backends.
///
/// Callers program against this trait so a CLI-backed model can stand in for
/// any other source of completions.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce the requested completions, one string per sample.
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<String>, BridgeError>;
}
