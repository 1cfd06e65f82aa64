//! LLM provider trait and capabilities

use super::{Completion, CompletionRequest, LlmError};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Provider capabilities flags
#[derive(Debug, Clone, Default)]
pub struct ProviderCapabilities {
    /// Supports function/tool calling
    pub function_calling: bool,

    /// Can be constrained to a JSON response schema
    pub structured_output: bool,
}

/// Provider status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderStatus {
    /// Ready to accept requests
    Ready,

    /// Not available (no API key, server down, etc.)
    Unavailable(String),
}

impl ProviderStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, ProviderStatus::Ready)
    }
}

/// LLM provider trait
///
/// Implementations perform one blocking round trip per call. Use [`complete`]
/// from async code; it moves the call off the runtime and bounds it.
pub trait LlmProvider: Send + Sync {
    /// Get the provider's unique identifier (e.g., "gemini", "ollama")
    fn id(&self) -> &str;

    /// Get the provider's display name
    fn name(&self) -> &str;

    /// Get the currently active model name
    fn model(&self) -> String;

    /// Get provider capabilities
    fn capabilities(&self) -> ProviderCapabilities;

    /// Get current provider status
    fn status(&self) -> ProviderStatus;

    /// Run one completion
    fn generate(&self, request: &CompletionRequest) -> Result<Completion, LlmError>;

    /// Check if the provider is currently available
    fn is_available(&self) -> bool {
        self.status().is_ready()
    }
}

/// Shared handle to a provider
pub type SharedProvider = Arc<dyn LlmProvider>;

/// Run a completion on the blocking pool, bounded by `timeout` and `cancel`.
///
/// When the deadline passes or the token fires, the caller gets an error right
/// away. The worker thread finishes on its own, limited by the HTTP agent timeout.
pub async fn complete(
    provider: SharedProvider,
    request: CompletionRequest,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Completion, LlmError> {
    if cancel.is_cancelled() {
        return Err(LlmError::Cancelled);
    }

    let status = provider.status();
    if let ProviderStatus::Unavailable(reason) = status {
        return Err(LlmError::ProviderUnavailable(format!(
            "{}: {}",
            provider.id(),
            reason
        )));
    }

    let provider_id = provider.id().to_string();
    let handle = tokio::task::spawn_blocking(move || provider.generate(&request));

    tokio::select! {
        _ = cancel.cancelled() => {
            tracing::debug!(provider = %provider_id, "completion cancelled");
            Err(LlmError::Cancelled)
        }
        joined = tokio::time::timeout(timeout, handle) => match joined {
            Err(_) => {
                tracing::warn!(provider = %provider_id, timeout_secs = timeout.as_secs(), "completion timed out");
                Err(LlmError::Timeout)
            }
            Ok(Err(join_err)) => Err(LlmError::Internal(format!("provider task failed: {}", join_err))),
            Ok(Ok(result)) => result,
        }
    }
}
