//! Provider registry for managing multiple LLM providers

use super::{GeminiProvider, LlmError, OllamaProvider, SharedProvider};
use crate::config::LlmConfig;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Registry for managing multiple LLM providers
pub struct ProviderRegistry {
    /// All registered providers
    providers: HashMap<String, SharedProvider>,

    /// Currently active provider ID
    active_provider: RwLock<String>,

    /// Fallback chain for automatic failover
    fallback_chain: Vec<String>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            active_provider: RwLock::new(String::new()),
            fallback_chain: Vec::new(),
        }
    }

    /// Create a registry from configuration and register every enabled provider
    pub fn from_config(config: &LlmConfig) -> Self {
        let mut registry = Self::new();
        *registry.active_provider.write() = config.default_provider.clone();

        let timeout = Duration::from_secs(config.timeout);

        // Enabled providers, default first, the rest in name order
        let mut enabled: Vec<&String> = config
            .providers
            .iter()
            .filter(|(_, cfg)| cfg.enabled)
            .map(|(name, _)| name)
            .collect();
        enabled.sort_by_key(|name| (*name != &config.default_provider, (*name).clone()));
        registry.fallback_chain = enabled.iter().map(|name| (*name).clone()).collect();

        for name in enabled {
            let cfg = &config.providers[name];
            match name.as_str() {
                "gemini" => {
                    let mut provider = GeminiProvider::new(
                        cfg.api_key.as_deref().unwrap_or_default(),
                        cfg.default_model.as_deref().unwrap_or("gemini-2.0-flash"),
                    )
                    .with_timeout(timeout);
                    if let Some(url) = &cfg.base_url {
                        provider = provider.with_base_url(url);
                    }
                    registry.register(Arc::new(provider));
                }
                "ollama" => {
                    let provider = OllamaProvider::new(
                        cfg.base_url.as_deref().unwrap_or("http://localhost:11434"),
                        cfg.default_model.as_deref().unwrap_or("llama3.1:8b"),
                    )
                    .with_timeout(timeout);
                    registry.register(Arc::new(provider));
                }
                other => {
                    tracing::warn!(provider = other, "unsupported provider in config, skipping");
                }
            }
        }

        registry
    }

    /// Register a provider
    pub fn register(&mut self, provider: SharedProvider) {
        let id = provider.id().to_string();
        self.providers.insert(id, provider);
    }

    /// Get a provider by ID
    pub fn get(&self, id: &str) -> Option<SharedProvider> {
        self.providers.get(id).cloned()
    }

    /// Get the currently active provider
    pub fn active(&self) -> Option<SharedProvider> {
        let id = self.active_provider.read();
        self.get(&id)
    }

    /// Set the active provider
    pub fn set_active(&self, id: &str) -> Result<(), LlmError> {
        if !self.providers.contains_key(id) {
            return Err(LlmError::ProviderUnavailable(format!(
                "Provider '{}' not registered",
                id
            )));
        }
        *self.active_provider.write() = id.to_string();
        Ok(())
    }

    /// Get active provider ID
    pub fn active_id(&self) -> String {
        self.active_provider.read().clone()
    }

    /// The active provider if ready, otherwise the first ready one in the fallback chain
    pub fn resolve(&self) -> Result<SharedProvider, LlmError> {
        let active_id = self.active_id();
        if let Some(provider) = self.get(&active_id) {
            if provider.is_available() {
                return Ok(provider);
            }
        }

        for fallback_id in &self.fallback_chain {
            if let Some(provider) = self.get(fallback_id) {
                if provider.is_available() {
                    tracing::info!(
                        requested = %active_id,
                        using = %fallback_id,
                        "active provider unavailable, falling back"
                    );
                    return Ok(provider);
                }
            }
        }

        Err(LlmError::ProviderUnavailable(format!(
            "no ready provider (active: '{}')",
            active_id
        )))
    }

    /// Get display info for all providers
    pub fn provider_info(&self) -> Vec<ProviderInfo> {
        let mut info: Vec<ProviderInfo> = self
            .providers
            .values()
            .map(|p| ProviderInfo {
                id: p.id().to_string(),
                name: p.name().to_string(),
                model: p.model(),
                ready: p.is_available(),
            })
            .collect();
        info.sort_by(|a, b| a.id.cmp(&b.id));
        info
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Provider information for display
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
    pub model: String,
    pub ready: bool,
}
