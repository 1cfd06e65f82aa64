//! LLM integration module
//!
//! Provider-neutral completion requests with tool declarations and JSON
//! response schemas.
//!
//! Supported providers:
//! - Gemini (Google AI)
//! - Ollama (local inference)

mod error;
mod gemini;
mod message;
mod ollama;
mod provider;
mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use error::LlmError;
pub use message::{
    strip_code_fences, ChatMessage, Completion, CompletionRequest, MessageContent, Role, ToolCall,
    ToolDeclaration, ToolResult,
};
pub use provider::{complete, LlmProvider, ProviderCapabilities, ProviderStatus, SharedProvider};
pub use registry::{ProviderInfo, ProviderRegistry};

// Provider implementations
pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;
