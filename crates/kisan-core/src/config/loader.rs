//! Configuration loader with environment variable expansion
//!
//! Loads configuration from `.kisan.toml` in the working directory or the user config directory.

use super::types::{KisanConfig, ProviderConfig};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Configuration loading error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Load configuration from various sources
///
/// Priority order:
/// 1. Project-level `.kisan.toml`
/// 2. User-level `~/.config/kisan/config.toml`
/// 3. Default configuration
pub fn load_config(project_dir: &Path) -> Result<KisanConfig, ConfigError> {
    let project_config = project_dir.join(".kisan.toml");
    if project_config.exists() {
        return load_from_file(&project_config);
    }

    if let Some(user_config) = get_user_config_path() {
        if user_config.exists() {
            return load_from_file(&user_config);
        }
    }

    Ok(apply_env_overrides(KisanConfig::default()))
}

/// Get user config directory path
fn get_user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("kisan").join("config.toml"))
}

/// Load configuration from a specific file
pub fn load_from_file(path: &Path) -> Result<KisanConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config: KisanConfig = toml::from_str(&content)?;

    expand_env_vars(&mut config);

    // Relative seed paths are resolved against the config file's directory
    if let (Some(seed), Some(dir)) = (config.data.seed_path.as_ref(), path.parent()) {
        if seed.is_relative() {
            config.data.seed_path = Some(dir.join(seed));
        }
    }

    Ok(apply_env_overrides(config))
}

fn env_regex() -> &'static Regex {
    static ENV_REGEX: OnceLock<Regex> = OnceLock::new();
    ENV_REGEX.get_or_init(|| {
        Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is a valid regex")
    })
}

/// Expand ${VAR} patterns in string values
fn expand_env_vars(config: &mut KisanConfig) {
    let env_regex = env_regex();

    for provider in config.llm.providers.values_mut() {
        if let Some(ref api_key) = provider.api_key {
            provider.api_key = Some(expand_string(api_key, env_regex));
        }
        if let Some(ref base_url) = provider.base_url {
            provider.base_url = Some(expand_string(base_url, env_regex));
        }
    }
}

/// Expand environment variables in a single string
fn expand_string(s: &str, regex: &Regex) -> String {
    regex
        .replace_all(s, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
}

/// Apply environment variable overrides for common settings
///
/// Supports direct environment variables:
/// - GEMINI_API_KEY / GOOGLE_API_KEY -> gemini.api_key
/// - OLLAMA_BASE_URL -> ollama.base_url
/// - KISAN_DEFAULT_PROVIDER -> llm.default_provider
/// - KISAN_DATA_PATH -> data.seed_path
fn apply_env_overrides(mut config: KisanConfig) -> KisanConfig {
    for env_var in ["GEMINI_API_KEY", "GOOGLE_API_KEY"] {
        if let Ok(key) = std::env::var(env_var) {
            if !key.is_empty() {
                let provider = config
                    .llm
                    .providers
                    .entry("gemini".to_string())
                    .or_insert_with(ProviderConfig::default);
                provider.api_key = Some(key);
                provider.enabled = true;
                break;
            }
        }
    }

    if let Ok(url) = std::env::var("OLLAMA_BASE_URL") {
        if !url.is_empty() {
            let provider = config
                .llm
                .providers
                .entry("ollama".to_string())
                .or_insert_with(ProviderConfig::default);
            provider.base_url = Some(url);
        }
    }

    if let Ok(provider) = std::env::var("KISAN_DEFAULT_PROVIDER") {
        if !provider.is_empty() {
            config.llm.default_provider = provider;
        }
    }

    if let Ok(path) = std::env::var("KISAN_DATA_PATH") {
        if !path.is_empty() {
            config.data.seed_path = Some(PathBuf::from(path));
        }
    }

    config
}

/// Create a sample configuration file content
pub fn sample_config() -> &'static str {
    r#"# Kisan Configuration
# Place this file in your project root as .kisan.toml
# or in ~/.config/kisan/config.toml for global settings

[llm]
# Default provider: gemini, ollama
default_provider = "gemini"

# Per-call timeout in seconds
timeout = 60

# Maximum tool-calling rounds per question
max_tool_turns = 6

[llm.providers.gemini]
enabled = true
api_key = "${GEMINI_API_KEY}"
default_model = "gemini-2.0-flash"

[llm.providers.ollama]
enabled = true
base_url = "http://localhost:11434"
default_model = "llama3.1:8b"

[advisory]
# multi_agent or direct
mode = "multi_agent"
deadline = 180
soil_report_limit = 2
scan_limit = 10
community_limit = 3
default_language = "en"

[data]
seed_path = "data/sample_farm.json"
"#
}
