//! Advisory request and response types

use crate::config::AdvisoryMode;
use crate::types::Language;
use crate::{KisanError, Result};
use serde::{Deserialize, Serialize};

/// A farmer question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryRequest {
    pub query: String,
    pub user_id: String,
    /// Falls back to the configured default language
    #[serde(default)]
    pub language: Option<Language>,
    /// Overrides the configured advisor
    #[serde(default)]
    pub mode: Option<AdvisoryMode>,
}

impl AdvisoryRequest {
    pub fn new(query: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            user_id: user_id.into(),
            language: None,
            mode: None,
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    pub fn with_mode(mut self, mode: AdvisoryMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Reject requests no advisor could answer
    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(KisanError::invalid_request("query is empty"));
        }
        if self.user_id.trim().is_empty() {
            return Err(KisanError::invalid_request("user id is empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Succeeded,
    Failed,
}

/// What happened to one tool call during an advisory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialistOutcome {
    /// Tool name as the model called it
    pub tool: String,
    pub status: OutcomeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Zero-based tool turn the call was made in
    pub turn: usize,
}

impl SpecialistOutcome {
    pub fn succeeded(tool: impl Into<String>, turn: usize) -> Self {
        Self {
            tool: tool.into(),
            status: OutcomeStatus::Succeeded,
            error: None,
            turn,
        }
    }

    pub fn failed(tool: impl Into<String>, turn: usize, error: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            status: OutcomeStatus::Failed,
            error: Some(error.into()),
            turn,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Succeeded
    }
}

/// The synthesized answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryResponse {
    /// Markdown
    pub advice_text: String,
    pub language: Language,
    /// Advisor that actually answered
    pub mode: AdvisoryMode,
    pub provider: String,
    pub specialists: Vec<SpecialistOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_deserializes_with_defaults() {
        let request: AdvisoryRequest =
            serde_json::from_str(r#"{"query":"When to sow?","userId":"u1"}"#).unwrap();
        assert_eq!(request.language, None);
        assert_eq!(request.mode, None);

        let request: AdvisoryRequest = serde_json::from_str(
            r#"{"query":"q","userId":"u1","language":"mr","mode":"direct"}"#,
        )
        .unwrap();
        assert_eq!(request.language, Some(Language::Marathi));
        assert_eq!(request.mode, Some(AdvisoryMode::Direct));
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        assert!(AdvisoryRequest::new("  ", "u1").validate().is_err());
        assert!(AdvisoryRequest::new("q", "").validate().is_err());
        assert!(AdvisoryRequest::new("q", "u1").validate().is_ok());
    }

    #[test]
    fn test_outcome_serialization() {
        let ok = serde_json::to_value(SpecialistOutcome::succeeded("soil_analysis", 0)).unwrap();
        assert_eq!(ok["status"], "succeeded");
        assert!(ok.get("error").is_none());

        let failed =
            serde_json::to_value(SpecialistOutcome::failed("market_forecast", 1, "boom")).unwrap();
        assert_eq!(failed["status"], "failed");
        assert_eq!(failed["error"], "boom");
        assert_eq!(failed["turn"], 1);
    }
}
