//! Ollama local LLM provider
//!
//! Connects to a local Ollama instance through `/api/chat`.

use super::{
    Completion, CompletionRequest, LlmError, LlmProvider, MessageContent, ProviderCapabilities,
    ProviderStatus, ToolCall,
};
use serde_json::{json, Value};
use std::time::Duration;

/// Ollama provider for local inference
pub struct OllamaProvider {
    /// Base URL (default: http://localhost:11434)
    base_url: String,

    /// Current model
    model: String,

    /// HTTP agent with the configured timeout
    agent: ureq::Agent,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            agent: ureq::Agent::new(),
        }
    }

    /// Bound every HTTP round trip
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::AgentBuilder::new().timeout(timeout).build();
        self
    }
}

impl LlmProvider for OllamaProvider {
    fn id(&self) -> &str {
        "ollama"
    }

    fn name(&self) -> &str {
        "Ollama"
    }

    fn model(&self) -> String {
        self.model.clone()
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            function_calling: true,
            structured_output: true,
        }
    }

    fn status(&self) -> ProviderStatus {
        // Reachability is only known after a request; a local server is assumed
        ProviderStatus::Ready
    }

    fn generate(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        let model = self.model.clone();
        let url = format!("{}/api/chat", self.base_url);
        let body = build_request_body(&model, request);

        let response = self
            .agent
            .post(&url)
            .set("Content-Type", "application/json")
            .send_json(&body)
            .map_err(|e| match e {
                ureq::Error::Status(404, _) => LlmError::Api {
                    status: 404,
                    message: format!("Model not found: {}", model),
                },
                other => other.into(),
            })?;

        let json: Value = response.into_json()?;
        parse_response(&json)
    }
}

/// Convert a completion request into an Ollama chat body
fn build_request_body(model: &str, request: &CompletionRequest) -> Value {
    let mut messages: Vec<Value> = Vec::new();

    if let Some(system) = &request.system {
        messages.push(json!({ "role": "system", "content": system }));
    }

    for msg in &request.messages {
        let entry = match &msg.content {
            MessageContent::Text { text } => json!({ "role": msg.role_str(), "content": text }),
            MessageContent::ToolCalls { calls } => {
                let tool_calls: Vec<Value> = calls
                    .iter()
                    .map(|call| {
                        json!({ "function": { "name": call.name, "arguments": call.arguments } })
                    })
                    .collect();
                json!({ "role": "assistant", "content": "", "tool_calls": tool_calls })
            }
            MessageContent::ToolResult { result } => json!({
                "role": "tool",
                "tool_name": result.name,
                "content": result.content.to_string()
            }),
        };
        messages.push(entry);
    }

    let mut body = json!({
        "model": model,
        "messages": messages,
        "stream": false,
        "options": { "temperature": request.temperature.unwrap_or(0.7) }
    });

    if !request.tools.is_empty() {
        let tools: Vec<Value> = request
            .tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.parameters
                    }
                })
            })
            .collect();
        body["tools"] = Value::Array(tools);
    }

    if let Some(schema) = &request.response_schema {
        body["format"] = schema.clone();
    }

    body
}

/// Parse an `/api/chat` response body
fn parse_response(json: &Value) -> Result<Completion, LlmError> {
    if let Some(error) = json.get("error").and_then(|e| e.as_str()) {
        return Err(LlmError::Api {
            status: 500,
            message: error.to_string(),
        });
    }

    let message = json
        .get("message")
        .ok_or_else(|| LlmError::InvalidResponse("Ollama response has no message".into()))?;

    if let Some(tool_calls) = message.get("tool_calls").and_then(|t| t.as_array()) {
        let calls: Vec<ToolCall> = tool_calls
            .iter()
            .filter_map(|call| {
                let function = call.get("function")?;
                let name = function.get("name")?.as_str()?;
                let arguments = match function.get("arguments") {
                    // Some models send arguments as an encoded string; an undecodable
                    // one stays a string so the specialist rejects it
                    Some(Value::String(raw)) => serde_json::from_str(raw)
                        .unwrap_or_else(|_| Value::String(raw.clone())),
                    Some(args) => args.clone(),
                    None => json!({}),
                };
                Some(ToolCall::new(name, arguments))
            })
            .collect();
        if !calls.is_empty() {
            return Ok(Completion::ToolCalls(calls));
        }
    }

    let content = message
        .get("content")
        .and_then(|c| c.as_str())
        .unwrap_or_default();
    Ok(Completion::Text(content.to_string()))
}
