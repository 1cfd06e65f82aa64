//! Advisory service
//!
//! Entry point for the server and CLI: resolves the provider, picks the
//! advisor, enforces the overall deadline and records answered advisories.

use super::direct::advise_direct;
use super::orchestrator::{advise_multi_agent, Synthesis};
use super::types::{AdvisoryRequest, AdvisoryResponse};
use crate::config::{AdvisoryMode, KisanConfig};
use crate::data::{
    AdvisoryLogEntry, FarmStore, FarmerHistory, Gateways, MarketQuote, MemoryStore,
};
use crate::flows::{run_specialist, FarmerContext, FlowContext, SpecialistKind, SpecialistRegistry};
use crate::llm::{ProviderInfo, ProviderRegistry, SharedProvider};
use crate::types::Language;
use crate::{KisanError, Result};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Farmer advisory service
pub struct AdvisoryService {
    config: KisanConfig,
    providers: ProviderRegistry,
    gateways: Gateways,
    registry: Arc<SpecialistRegistry>,
}

impl AdvisoryService {
    /// Build from configuration, seeding the store from `data.seed_path` when set
    pub fn new(config: KisanConfig) -> Result<Self> {
        config.validate()?;
        let store: Arc<dyn FarmStore> = match &config.data.seed_path {
            Some(path) => {
                tracing::info!(path = %path.display(), "loading farm data");
                Arc::new(MemoryStore::from_json_file(path)?)
            }
            None => Arc::new(MemoryStore::new()),
        };
        let providers = ProviderRegistry::from_config(&config.llm);
        Ok(Self::with_parts(config, providers, store))
    }

    /// Build from ready-made providers and store
    pub fn with_parts(
        config: KisanConfig,
        providers: ProviderRegistry,
        store: Arc<dyn FarmStore>,
    ) -> Self {
        let gateways = Gateways::new(store, &config.advisory);
        Self {
            config,
            providers,
            gateways,
            registry: Arc::new(SpecialistRegistry::standard()),
        }
    }

    pub fn config(&self) -> &KisanConfig {
        &self.config
    }

    pub fn registry(&self) -> &SpecialistRegistry {
        &self.registry
    }

    pub fn provider_info(&self) -> Vec<ProviderInfo> {
        self.providers.provider_info()
    }

    pub fn active_provider_id(&self) -> String {
        self.providers.active_id()
    }

    /// Localized generic failure text
    pub fn failure_message(&self, language: Option<Language>) -> &'static str {
        language
            .unwrap_or(self.config.advisory.default_language)
            .failure_message()
    }

    /// Answer a farmer question
    pub async fn advise(&self, request: AdvisoryRequest) -> Result<AdvisoryResponse> {
        self.advise_with_cancel(request, CancellationToken::new())
            .await
    }

    /// Answer a farmer question; cancelling `cancel` stops in-flight work
    pub async fn advise_with_cancel(
        &self,
        request: AdvisoryRequest,
        cancel: CancellationToken,
    ) -> Result<AdvisoryResponse> {
        request.validate()?;
        let language = request
            .language
            .unwrap_or(self.config.advisory.default_language);
        let farmer = FarmerContext::new(request.user_id.trim(), language);
        let provider = self.providers.resolve()?;

        let mut mode = request.mode.unwrap_or(self.config.advisory.mode);
        if mode == AdvisoryMode::MultiAgent && !provider.capabilities().function_calling {
            tracing::info!(
                provider = provider.id(),
                "provider has no function calling, using direct advisor"
            );
            mode = AdvisoryMode::Direct;
        }

        tracing::info!(
            user_id = %farmer.user_id,
            language = %language,
            mode = mode.as_str(),
            provider = provider.id(),
            "advisory started"
        );

        let ctx = self.flow_context(Arc::clone(&provider), &cancel);
        let query = request.query.trim();
        let synthesis = self
            .within_deadline(&ctx.cancel, async {
                match mode {
                    AdvisoryMode::Direct => advise_direct(&ctx, &farmer, query)
                        .await
                        .map(|advice_text| Synthesis {
                            advice_text,
                            specialists: Vec::new(),
                        }),
                    AdvisoryMode::MultiAgent => {
                        advise_multi_agent(&ctx, &farmer, query, self.config.llm.max_tool_turns)
                            .await
                    }
                }
            })
            .await?;

        tracing::info!(
            user_id = %farmer.user_id,
            specialists = synthesis.specialists.len(),
            failed = synthesis.specialists.iter().filter(|s| !s.is_success()).count(),
            "advisory answered"
        );

        self.gateways.spawn_record_advisory(AdvisoryLogEntry {
            user_id: farmer.user_id.clone(),
            query: query.to_string(),
            advice_text: synthesis.advice_text.clone(),
            created_at: chrono::Utc::now(),
        });

        Ok(AdvisoryResponse {
            advice_text: synthesis.advice_text,
            language,
            mode,
            provider: provider.id().to_string(),
            specialists: synthesis.specialists,
        })
    }

    /// Run one specialist by tool name outside an advisory conversation
    pub async fn run_specialist(
        &self,
        tool_name: &str,
        farmer: FarmerContext,
        arguments: Value,
    ) -> Result<Value> {
        let kind = SpecialistKind::from_tool_name(tool_name)
            .ok_or_else(|| KisanError::not_found(format!("specialist '{}'", tool_name)))?;
        if farmer.user_id.trim().is_empty() {
            return Err(KisanError::invalid_request("user id is empty"));
        }
        let provider = self.providers.resolve()?;
        let cancel = CancellationToken::new();
        let ctx = self.flow_context(provider, &cancel);

        self.within_deadline(&ctx.cancel, run_specialist(&ctx, kind, &farmer, arguments))
            .await
    }

    pub async fn market_quote(&self, crop: &str, region: &str) -> Result<Option<MarketQuote>> {
        if crop.trim().is_empty() {
            return Err(KisanError::invalid_request("crop is empty"));
        }
        self.gateways.market_quote(crop, region).await
    }

    pub async fn farmer_history(&self, user_id: &str) -> Result<FarmerHistory> {
        self.gateways.farmer_history(user_id).await
    }

    fn flow_context(&self, provider: SharedProvider, parent: &CancellationToken) -> FlowContext {
        FlowContext {
            provider,
            gateways: self.gateways.clone(),
            registry: Arc::clone(&self.registry),
            call_timeout: Duration::from_secs(self.config.llm.timeout),
            temperature: self.config.llm.temperature,
            cancel: parent.child_token(),
        }
    }

    /// Bound `fut` by the advisory deadline; `cancel` fires on timeout or drop
    async fn within_deadline<T, F>(&self, cancel: &CancellationToken, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let _guard = cancel.clone().drop_guard();
        let deadline = self.config.advisory.deadline;
        match tokio::time::timeout(Duration::from_secs(deadline), fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(deadline_secs = deadline, "advisory deadline passed");
                Err(KisanError::Timeout(deadline))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedProvider;
    use crate::llm::{Completion, LlmError, ToolCall};
    use crate::orchestration::OutcomeStatus;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const HISTORY_JSON: &str =
        r#"{"summary":"No records yet.","recurringIssues":[],"nextSteps":["Get a soil test"]}"#;

    fn service(provider: Arc<ScriptedProvider>, store: Arc<MemoryStore>) -> AdvisoryService {
        service_with(provider, store, KisanConfig::default())
    }

    fn service_with(
        provider: Arc<ScriptedProvider>,
        store: Arc<MemoryStore>,
        config: KisanConfig,
    ) -> AdvisoryService {
        let mut providers = ProviderRegistry::new();
        providers.register(provider);
        providers.set_active("scripted").unwrap();
        AdvisoryService::with_parts(config, providers, store)
    }

    async fn wait_for_advisories(store: &MemoryStore, count: usize) {
        for _ in 0..100 {
            if store.advisories().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_zero_history_farmer_gets_advice() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .with_tool_calls(vec![ToolCall::new("farm_history", json!({}))])
                .with_text(HISTORY_JSON)
                .with_text("Start with a soil test at the nearest KVK."),
        );
        let store = Arc::new(MemoryStore::new());
        let service = service(provider, store.clone());

        let response = service
            .advise(AdvisoryRequest::new("What should I do this season?", "new-farmer"))
            .await
            .unwrap();
        assert!(!response.advice_text.is_empty());
        assert_eq!(response.mode, AdvisoryMode::MultiAgent);
        assert_eq!(response.provider, "scripted");
        assert_eq!(response.language, Language::English);
        assert_eq!(response.specialists[0].status, OutcomeStatus::Succeeded);

        wait_for_advisories(&store, 1).await;
        let logged = store.advisories();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].user_id, "new-farmer");
    }

    #[tokio::test]
    async fn test_without_function_calling_uses_direct() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .with_text("Irrigate lightly.")
                .without_function_calling(),
        );
        let service = service(provider.clone(), Arc::new(MemoryStore::new()));

        let response = service
            .advise(AdvisoryRequest::new("Water?", "u1").with_language(Language::Tamil))
            .await
            .unwrap();
        assert_eq!(response.mode, AdvisoryMode::Direct);
        assert_eq!(response.language, Language::Tamil);
        assert!(provider.requests()[0].tools.is_empty());
    }

    #[tokio::test]
    async fn test_request_mode_overrides_config() {
        let provider = Arc::new(ScriptedProvider::new().with_text("Direct answer."));
        let service = service(provider.clone(), Arc::new(MemoryStore::new()));
        let response = service
            .advise(AdvisoryRequest::new("q", "u1").with_mode(AdvisoryMode::Direct))
            .await
            .unwrap();
        assert_eq!(response.mode, AdvisoryMode::Direct);
        assert_eq!(provider.request_count(), 1);
    }

    #[tokio::test]
    async fn test_deadline_is_timeout_error() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .with_text("too late")
                .with_delay(Duration::from_millis(1500)),
        );
        let mut config = KisanConfig::default();
        config.advisory.deadline = 1;
        let service = service_with(provider, Arc::new(MemoryStore::new()), config);

        let err = service
            .advise(AdvisoryRequest::new("q", "u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, KisanError::Timeout(1)));
    }

    #[tokio::test]
    async fn test_cancellation_is_distinct_from_timeout() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .with_text("never seen")
                .with_delay(Duration::from_millis(500)),
        );
        let service = service(provider, Arc::new(MemoryStore::new()));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = service
            .advise_with_cancel(AdvisoryRequest::new("q", "u1"), cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancellation());
        assert!(!matches!(err, KisanError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let provider = Arc::new(ScriptedProvider::new().with_error(LlmError::Connection(
            "connection refused".to_string(),
        )));
        let service = service(provider, Arc::new(MemoryStore::new()));
        let err = service
            .advise(AdvisoryRequest::new("q", "u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, KisanError::Llm(LlmError::Connection(_))));
        assert_eq!(service.failure_message(Some(Language::Hindi)), Language::Hindi.failure_message());
    }

    #[tokio::test]
    async fn test_invalid_request_makes_no_call() {
        let provider = Arc::new(ScriptedProvider::new());
        let service = service(provider.clone(), Arc::new(MemoryStore::new()));
        let err = service
            .advise(AdvisoryRequest::new("", "u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, KisanError::InvalidRequest(_)));
        assert_eq!(provider.request_count(), 0);
    }

    #[tokio::test]
    async fn test_run_specialist_by_name() {
        let provider = Arc::new(ScriptedProvider::new().with_handler(|_| {
            Ok(Completion::Text(HISTORY_JSON.to_string()))
        }));
        let service = service(provider, Arc::new(MemoryStore::new()));

        let report = service
            .run_specialist(
                "farm_history",
                FarmerContext::new("u1", Language::English),
                json!({}),
            )
            .await
            .unwrap();
        assert_eq!(report["insights"]["summary"], "No records yet.");

        let err = service
            .run_specialist("weather", FarmerContext::new("u1", Language::English), json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, KisanError::NotFound(_)));
    }
}
