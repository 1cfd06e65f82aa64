//! Configuration types for Kisan
//!
//! Defines the structure of `.kisan.toml` configuration.

use crate::types::Language;
use crate::{KisanError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KisanConfig {
    /// LLM configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Advisory orchestration settings
    #[serde(default)]
    pub advisory: AdvisoryConfig,

    /// Farm data source
    #[serde(default)]
    pub data: DataConfig,
}

impl KisanConfig {
    /// Reject settings that would make every advisory fail
    pub fn validate(&self) -> Result<()> {
        if self.llm.timeout == 0 {
            return Err(KisanError::config("llm.timeout must be at least 1 second"));
        }
        if self.advisory.deadline == 0 {
            return Err(KisanError::config(
                "advisory.deadline must be at least 1 second",
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(KisanError::config(format!(
                "llm.temperature must be within 0.0..=2.0, got {}",
                self.llm.temperature
            )));
        }
        Ok(())
    }
}

/// LLM configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Default provider to use (gemini, ollama)
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Per-call timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Upper bound on tool-calling rounds in one advisory
    #[serde(default = "default_max_tool_turns")]
    pub max_tool_turns: usize,

    /// Sampling temperature for specialist flows
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Provider configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "gemini".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_max_tool_turns() -> usize {
    6
}

fn default_temperature() -> f32 {
    0.4
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            timeout: default_timeout(),
            max_tool_turns: default_max_tool_turns(),
            temperature: default_temperature(),
            providers: default_providers(),
        }
    }
}

/// Individual provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Whether this provider is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// API key (supports ${ENV_VAR} syntax)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL for the API
    #[serde(default)]
    pub base_url: Option<String>,

    /// Default model for this provider
    #[serde(default)]
    pub default_model: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            base_url: None,
            default_model: None,
        }
    }
}

/// Create default provider configurations
fn default_providers() -> HashMap<String, ProviderConfig> {
    let mut providers = HashMap::new();

    // Gemini - requires API key
    providers.insert(
        "gemini".to_string(),
        ProviderConfig {
            enabled: false, // Disabled by default until API key is set
            api_key: None,
            base_url: Some("https://generativelanguage.googleapis.com".to_string()),
            default_model: Some("gemini-2.0-flash".to_string()),
        },
    );

    // Ollama - local, no API key needed
    providers.insert(
        "ollama".to_string(),
        ProviderConfig {
            enabled: true,
            api_key: None,
            base_url: Some("http://localhost:11434".to_string()),
            default_model: Some("llama3.1:8b".to_string()),
        },
    );

    providers
}

/// Which top-level advisor answers farmer questions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryMode {
    /// Single model call over prefetched context, no tools
    Direct,
    /// Model may call specialist flows as tools
    #[default]
    MultiAgent,
}

impl AdvisoryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdvisoryMode::Direct => "direct",
            AdvisoryMode::MultiAgent => "multi_agent",
        }
    }
}

/// Advisory section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryConfig {
    /// Preferred advisor
    #[serde(default)]
    pub mode: AdvisoryMode,

    /// Overall deadline for one advisory request, in seconds
    #[serde(default = "default_deadline")]
    pub deadline: u64,

    /// Soil reports included in a history snapshot
    #[serde(default = "default_soil_report_limit")]
    pub soil_report_limit: usize,

    /// Scans included in a history snapshot
    #[serde(default = "default_scan_limit")]
    pub scan_limit: usize,

    /// Community posts given to the market specialist
    #[serde(default = "default_community_limit")]
    pub community_limit: usize,

    /// Language used when a request does not name one
    #[serde(default)]
    pub default_language: Language,
}

fn default_deadline() -> u64 {
    180
}

fn default_soil_report_limit() -> usize {
    2
}

fn default_scan_limit() -> usize {
    10
}

fn default_community_limit() -> usize {
    3
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            mode: AdvisoryMode::default(),
            deadline: default_deadline(),
            soil_report_limit: default_soil_report_limit(),
            scan_limit: default_scan_limit(),
            community_limit: default_community_limit(),
            default_language: Language::default(),
        }
    }
}

/// Farm data section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    /// JSON file used to seed the in-memory store
    #[serde(default)]
    pub seed_path: Option<PathBuf>,
}
