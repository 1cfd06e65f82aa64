//! Error types for Kisan Core
//!
//! Provides a unified error type for all advisory operations.

use crate::llm::LlmError;
use thiserror::Error;

/// Result type for Kisan Core operations
pub type Result<T> = std::result::Result<T, KisanError>;

/// Unified error type for Kisan Core
#[derive(Error, Debug)]
pub enum KisanError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Model output did not match the declared output schema
    #[error("Schema error in {flow}: {message}")]
    Schema { flow: String, message: String },

    /// Prompt template could not be rendered
    #[error("Template error: {0}")]
    Template(String),

    /// Data gateway transport or parse failure
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request rejected before any work was done
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The advisory deadline elapsed
    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    /// The request was cancelled by the caller
    #[error("Request cancelled")]
    Cancelled,
}

impl KisanError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        KisanError::Config(msg.into())
    }

    /// Create a schema error for a named flow
    pub fn schema(flow: impl Into<String>, msg: impl Into<String>) -> Self {
        KisanError::Schema {
            flow: flow.into(),
            message: msg.into(),
        }
    }

    /// Create a template error
    pub fn template(msg: impl Into<String>) -> Self {
        KisanError::Template(msg.into())
    }

    /// Create a gateway error
    pub fn gateway(msg: impl Into<String>) -> Self {
        KisanError::Gateway(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        KisanError::NotFound(msg.into())
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        KisanError::InvalidRequest(msg.into())
    }

    /// Whether the error came from the caller giving up rather than a fault
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            KisanError::Cancelled | KisanError::Llm(LlmError::Cancelled)
        )
    }
}

impl From<serde_json::Error> for KisanError {
    fn from(err: serde_json::Error) -> Self {
        KisanError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_display() {
        let err = KisanError::schema("soil_analysis", "missing field `summary`");
        assert_eq!(
            err.to_string(),
            "Schema error in soil_analysis: missing field `summary`"
        );
    }

    #[test]
    fn test_llm_error_converts() {
        let err: KisanError = LlmError::Timeout.into();
        assert!(matches!(err, KisanError::Llm(LlmError::Timeout)));
    }

    #[test]
    fn test_cancellation_detection() {
        assert!(KisanError::Cancelled.is_cancellation());
        assert!(KisanError::Llm(LlmError::Cancelled).is_cancellation());
        assert!(!KisanError::Timeout(5).is_cancellation());
    }
}
