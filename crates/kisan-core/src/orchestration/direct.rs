//! Direct advisor: prefetched context, one model call, no tools

use crate::flows::{prompt_json, FarmerContext, FlowContext, PromptTemplate};
use crate::llm::{complete, ChatMessage, CompletionRequest, LlmError};
use crate::{KisanError, Result};
use std::sync::Arc;

const DIRECT_TEMPLATE: PromptTemplate = PromptTemplate::new(
    "direct_advisor",
    r#"You are Kisan, a trusted farming advisor for Indian smallholder farmers.
Today is {{today}}. Answer in {{language}}, in simple words a farmer can act on.

The farmer's recent records (most recent first):
{{history}}

Latest satellite reading of the farm:
{{satellite}}

Use the records when they are relevant. When they are missing, give sound
general advice for the crop and season. Format the answer in markdown: a
one-line summary, then short sections or bullet points with concrete steps."#,
);

const NOT_AVAILABLE: &str = "Not available right now.";

pub async fn advise_direct(ctx: &FlowContext, farmer: &FarmerContext, query: &str) -> Result<String> {
    let (history, satellite) = tokio::join!(
        ctx.gateway(ctx.gateways.farmer_history(&farmer.user_id)),
        ctx.gateway(ctx.gateways.satellite_summary(&farmer.user_id)),
    );
    if ctx.cancel.is_cancelled() {
        return Err(KisanError::Cancelled);
    }

    let history = match history {
        Ok(h) if h.is_empty() => "No soil reports or crop scans on record.".to_string(),
        Ok(h) => prompt_json(&h),
        Err(e) => {
            tracing::warn!(user_id = %farmer.user_id, error = %e, "history unavailable, advising without it");
            NOT_AVAILABLE.to_string()
        }
    };
    let satellite = match satellite {
        Ok(Some(summary)) => prompt_json(&summary),
        Ok(None) => "No satellite data for this farm.".to_string(),
        Err(e) => {
            tracing::warn!(user_id = %farmer.user_id, error = %e, "satellite summary unavailable");
            NOT_AVAILABLE.to_string()
        }
    };

    let system = DIRECT_TEMPLATE.render(&[
        ("language", farmer.language.display_name().to_string()),
        ("today", chrono::Utc::now().format("%d %B %Y").to_string()),
        ("history", history),
        ("satellite", satellite),
    ])?;
    let request = CompletionRequest::new(system)
        .with_message(ChatMessage::user(query))
        .with_temperature(ctx.temperature);

    let text = complete(
        Arc::clone(&ctx.provider),
        request,
        ctx.call_timeout,
        &ctx.cancel,
    )
    .await?
    .into_text()?;

    let text = text.trim();
    if text.is_empty() {
        return Err(LlmError::InvalidResponse("model returned empty advice".to_string()).into());
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{
        AdvisoryLogEntry, CommunityPost, CostBreakdown, FarmStore, MarketRecord, MemoryStore,
        SatelliteSummary, ScanResult, SoilReport,
    };
    use crate::flows::fixtures::{context, farmer};
    use crate::llm::testing::ScriptedProvider;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    /// Store whose history reads fail
    struct BrokenHistoryStore;

    #[async_trait]
    impl FarmStore for BrokenHistoryStore {
        async fn market_records(&self, _crop: &str) -> Result<Vec<MarketRecord>> {
            Ok(vec![])
        }
        async fn soil_reports(&self, _user_id: &str) -> Result<Vec<SoilReport>> {
            Err(KisanError::gateway("connection reset"))
        }
        async fn scans(&self, _user_id: &str) -> Result<Vec<ScanResult>> {
            Ok(vec![])
        }
        async fn cost_inputs(&self, _user_id: &str, _crop: &str) -> Result<Option<CostBreakdown>> {
            Ok(None)
        }
        async fn satellite_summary(&self, user_id: &str) -> Result<Option<SatelliteSummary>> {
            Ok(Some(SatelliteSummary {
                user_id: user_id.to_string(),
                ndvi: 0.62,
                soil_moisture: 28.0,
                observed_at: Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap(),
                note: None,
            }))
        }
        async fn community_posts(&self, _crop: Option<&str>) -> Result<Vec<CommunityPost>> {
            Ok(vec![])
        }
        async fn record_advisory(&self, _entry: AdvisoryLogEntry) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_empty_history_still_advises() {
        let provider = Arc::new(ScriptedProvider::new().with_text("Sow after the first good rain."));
        let ctx = context(provider.clone(), Arc::new(MemoryStore::new()));

        let text = advise_direct(&ctx, &farmer(), "When should I sow soybean?")
            .await
            .unwrap();
        assert_eq!(text, "Sow after the first good rain.");

        let request = &provider.requests()[0];
        assert!(request.tools.is_empty());
        let system = request.system.as_deref().unwrap();
        assert!(system.contains("No soil reports or crop scans on record."));
        assert!(system.contains("No satellite data for this farm."));
        assert_eq!(request.messages[0].text(), "When should I sow soybean?");
    }

    #[tokio::test]
    async fn test_failed_prefetch_degrades() {
        let provider = Arc::new(ScriptedProvider::new().with_text("General advice."));
        let mut ctx = context(provider.clone(), Arc::new(MemoryStore::new()));
        ctx.gateways =
            crate::data::Gateways::new(Arc::new(BrokenHistoryStore), &Default::default());

        let text = advise_direct(&ctx, &farmer(), "How is my field?").await.unwrap();
        assert_eq!(text, "General advice.");

        let system = provider.requests()[0].system.clone().unwrap();
        assert!(system.contains(NOT_AVAILABLE));
        assert!(system.contains("0.62"));
    }

    #[tokio::test]
    async fn test_cancelled_before_call() {
        let provider = Arc::new(ScriptedProvider::new().with_text("unused"));
        let ctx = context(provider.clone(), Arc::new(MemoryStore::new()));
        ctx.cancel.cancel();
        let err = advise_direct(&ctx, &farmer(), "q").await.unwrap_err();
        assert!(err.is_cancellation());
        assert_eq!(provider.request_count(), 0);
    }
}
