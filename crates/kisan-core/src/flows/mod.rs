//! Specialist flows
//!
//! Each specialist gathers context through the gateways, computes whatever is
//! deterministic in code, renders its instruction template and asks the model
//! for a structured answer that must parse into the declared output type.

pub mod history;
pub mod market;
pub mod profitability;
mod registry;
pub mod satellite;
mod schema;
pub mod soil;
mod template;

pub use registry::{SpecialistKind, SpecialistRegistry, SpecialistSpec};
pub use schema::{parse_output, schema_of};
pub use template::PromptTemplate;

use crate::data::{guarded, Gateways};
use crate::llm::{complete, ChatMessage, CompletionRequest, SharedProvider};
use crate::types::Language;
use crate::{KisanError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const SPECIALIST_SYSTEM_PROMPT: &str = "You are a specialist agricultural advisor working for \
Kisan, an assistant for Indian smallholder farmers. Work only from the data you are given. \
Figures supplied to you are already computed; repeat them, never recompute or change them. \
Answer with a single JSON object matching the response schema and nothing else.";

/// Who the advice is for; set by the caller, never by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmerContext {
    pub user_id: String,
    #[serde(default)]
    pub language: Language,
}

impl FarmerContext {
    pub fn new(user_id: impl Into<String>, language: Language) -> Self {
        Self {
            user_id: user_id.into(),
            language,
        }
    }
}

/// Shared state for running specialists within one request
#[derive(Clone)]
pub struct FlowContext {
    pub provider: SharedProvider,
    pub gateways: Gateways,
    pub registry: Arc<SpecialistRegistry>,
    /// Bound on each model call
    pub call_timeout: Duration,
    pub temperature: f32,
    pub cancel: CancellationToken,
}

impl FlowContext {
    /// Await a gateway read, aborting when the request is cancelled
    pub async fn gateway<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        guarded(&self.cancel, fut).await
    }

    /// Render the specialist's template and parse the structured answer
    pub async fn generate<O: DeserializeOwned>(
        &self,
        kind: SpecialistKind,
        vars: &[(&str, String)],
    ) -> Result<O> {
        let spec = self.registry.get(kind);
        let prompt = spec.template.render(vars)?;

        let mut request = CompletionRequest::new(SPECIALIST_SYSTEM_PROMPT)
            .with_message(ChatMessage::user(prompt))
            .with_temperature(self.temperature);
        // Without native schema support the answer is still checked by `parse_output`
        if self.provider.capabilities().structured_output {
            request = request.with_response_schema(spec.output_schema.clone());
        }

        tracing::debug!(specialist = %kind, provider = self.provider.id(), "running specialist");
        let text = complete(
            Arc::clone(&self.provider),
            request,
            self.call_timeout,
            &self.cancel,
        )
        .await?
        .into_text()?;

        parse_output(kind.tool_name(), &text)
    }
}

/// Run a specialist from raw tool arguments and return its report as JSON
pub async fn run_specialist(
    ctx: &FlowContext,
    kind: SpecialistKind,
    farmer: &FarmerContext,
    args: Value,
) -> Result<Value> {
    let report = match kind {
        SpecialistKind::Soil => {
            serde_json::to_value(soil::run(ctx, farmer, parse_args(kind, args)?).await?)?
        }
        SpecialistKind::Market => {
            serde_json::to_value(market::run(ctx, farmer, parse_args(kind, args)?).await?)?
        }
        SpecialistKind::Profitability => serde_json::to_value(
            profitability::run(ctx, farmer, parse_args(kind, args)?).await?,
        )?,
        SpecialistKind::History => {
            serde_json::to_value(history::run(ctx, farmer, parse_args(kind, args)?).await?)?
        }
        SpecialistKind::Satellite => {
            serde_json::to_value(satellite::run(ctx, farmer, parse_args(kind, args)?).await?)?
        }
    };
    Ok(report)
}

fn parse_args<T: DeserializeOwned>(kind: SpecialistKind, args: Value) -> Result<T> {
    let args = match args {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(args).map_err(|e| {
        KisanError::invalid_request(format!("bad arguments for {}: {}", kind.tool_name(), e))
    })
}

/// Pretty JSON for prompt embedding
pub(crate) fn prompt_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::config::AdvisoryConfig;
    use crate::data::MemoryStore;
    use crate::llm::testing::ScriptedProvider;

    pub(crate) fn context(provider: Arc<ScriptedProvider>, store: Arc<MemoryStore>) -> FlowContext {
        FlowContext {
            provider,
            gateways: Gateways::new(store, &AdvisoryConfig::default()),
            registry: Arc::new(SpecialistRegistry::standard()),
            call_timeout: Duration::from_secs(5),
            temperature: 0.2,
            cancel: CancellationToken::new(),
        }
    }

    pub(crate) fn farmer() -> FarmerContext {
        FarmerContext::new("farmer-1", Language::Hindi)
    }
}
