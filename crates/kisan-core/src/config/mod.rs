//! Configuration module for Kisan
//!
//! Handles loading and parsing of `.kisan.toml` configuration files
//! with support for environment variable expansion.

mod loader;
mod types;

pub use loader::{load_config, load_from_file, sample_config, ConfigError};
pub use types::{AdvisoryConfig, AdvisoryMode, DataConfig, KisanConfig, LlmConfig, ProviderConfig};
