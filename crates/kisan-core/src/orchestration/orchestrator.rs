//! Multi-agent advisor
//!
//! One conversation with the model, every specialist declared as a tool. Tool
//! calls of a turn run concurrently; a failing specialist is reported back to
//! the model as `{"error": ...}` and synthesis goes on with the rest.

use super::types::SpecialistOutcome;
use crate::flows::{run_specialist, FarmerContext, FlowContext, PromptTemplate, SpecialistKind};
use crate::llm::{complete, ChatMessage, Completion, CompletionRequest, ToolCall, ToolResult};
use crate::{KisanError, Result};
use futures::future::join_all;
use serde_json::{json, Value};
use std::sync::Arc;

const POLICY_TEMPLATE: PromptTemplate = PromptTemplate::new(
    "orchestrator_policy",
    r#"You are Kisan, a trusted farming advisor for Indian smallholder farmers.
Today is {{today}}. Answer in {{language}}, in simple words a farmer can act on.

You have specialists available as tools:
- soil_analysis: soil health card, nutrients, fertilizer doses
- market_forecast: mandi prices, price trend, when to sell
- profitability_analysis: cost, revenue, profit and ROI of a crop
- farm_history: the farmer's past soil reports and disease scans
- field_health: satellite view of crop vigour and soil moisture

Policy:
1. Call only the specialists the question needs. Greetings and general
   questions need none.
2. Call independent specialists together in one turn.
3. The farmer is already identified; never ask for or pass an id.
4. Figures in specialist results are exact. Quote them, do not recompute.
5. A result with an "error" field means that specialist failed. Answer from
   the rest and mention briefly what could not be checked.
6. When the farmer has no records, give sound general advice for their
   crop and season instead of refusing.

Format the answer in markdown: a one-line summary, then short sections or
bullet points with concrete steps."#,
);

const FINAL_ANSWER_PROMPT: &str =
    "Answer the farmer now using only the information gathered so far. Do not call tools.";

/// Identity keys the model may not set on tool arguments
const RESERVED_ARGUMENTS: &[&str] = &["user_id", "userId", "language"];

pub(crate) fn policy_prompt(farmer: &FarmerContext) -> Result<String> {
    POLICY_TEMPLATE.render(&[
        ("language", farmer.language.display_name().to_string()),
        ("today", chrono::Utc::now().format("%d %B %Y").to_string()),
    ])
}

/// Answer plus the specialists that ran
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub advice_text: String,
    pub specialists: Vec<SpecialistOutcome>,
}

/// Run the tool loop for up to `max_tool_turns` turns, then force a text answer
pub async fn advise_multi_agent(
    ctx: &FlowContext,
    farmer: &FarmerContext,
    query: &str,
    max_tool_turns: usize,
) -> Result<Synthesis> {
    let system = policy_prompt(farmer)?;
    let tools = ctx.registry.tool_declarations();
    let mut messages = vec![ChatMessage::user(query)];
    let mut specialists = Vec::new();

    for turn in 0..max_tool_turns {
        let request = CompletionRequest::new(system.clone())
            .with_messages(messages.clone())
            .with_tools(tools.clone())
            .with_temperature(ctx.temperature);

        let calls = match complete(
            Arc::clone(&ctx.provider),
            request,
            ctx.call_timeout,
            &ctx.cancel,
        )
        .await?
        {
            Completion::Text(text) => return finish(text, specialists),
            Completion::ToolCalls(calls) if calls.is_empty() => break,
            Completion::ToolCalls(calls) => calls,
        };

        tracing::debug!(
            turn,
            tools = ?calls.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            "model requested specialists"
        );

        let results = join_all(calls.iter().map(|call| run_tool_call(ctx, farmer, call))).await;
        if ctx.cancel.is_cancelled() {
            return Err(KisanError::Cancelled);
        }

        messages.push(ChatMessage::tool_calls(calls.clone()));
        for (call, (outcome, content)) in calls.iter().zip(results) {
            specialists.push(SpecialistOutcome { turn, ..outcome });
            messages.push(ChatMessage::tool_result(ToolResult {
                call_id: call.id.clone(),
                name: call.name.clone(),
                content,
            }));
        }
    }

    tracing::info!(
        max_tool_turns,
        "tool turns exhausted, requesting final answer without tools"
    );
    let request = CompletionRequest::new(system)
        .with_messages(messages)
        .with_message(ChatMessage::user(FINAL_ANSWER_PROMPT))
        .with_temperature(ctx.temperature);
    let text = complete(
        Arc::clone(&ctx.provider),
        request,
        ctx.call_timeout,
        &ctx.cancel,
    )
    .await?
    .into_text()?;

    finish(text, specialists)
}

fn finish(text: String, specialists: Vec<SpecialistOutcome>) -> Result<Synthesis> {
    let advice_text = text.trim().to_string();
    if advice_text.is_empty() {
        return Err(KisanError::Llm(crate::llm::LlmError::InvalidResponse(
            "model returned empty advice".to_string(),
        )));
    }
    Ok(Synthesis {
        advice_text,
        specialists,
    })
}

/// Run one tool call; failures become an error payload for the model
async fn run_tool_call(
    ctx: &FlowContext,
    farmer: &FarmerContext,
    call: &ToolCall,
) -> (SpecialistOutcome, Value) {
    let Some(kind) = SpecialistKind::from_tool_name(&call.name) else {
        tracing::warn!(tool = %call.name, "model called an unknown tool");
        let message = format!("unknown tool '{}'", call.name);
        return (
            SpecialistOutcome::failed(&call.name, 0, &message),
            json!({ "error": message }),
        );
    };

    let arguments = without_identity(call.arguments.clone());
    match run_specialist(ctx, kind, farmer, arguments).await {
        Ok(report) => (SpecialistOutcome::succeeded(&call.name, 0), report),
        Err(e) => {
            tracing::warn!(tool = %call.name, error = %e, "specialist failed");
            (
                SpecialistOutcome::failed(&call.name, 0, e.to_string()),
                json!({ "error": e.to_string() }),
            )
        }
    }
}

fn without_identity(arguments: Value) -> Value {
    match arguments {
        Value::Object(mut map) => {
            for key in RESERVED_ARGUMENTS {
                if map.remove(*key).is_some() {
                    tracing::debug!(key, "dropped identity argument set by the model");
                }
            }
            Value::Object(map)
        }
        other => other,
    }
}
