//! Gemini (Google AI) LLM provider
//!
//! Connects to Google's Gemini `generateContent` API with function calling
//! and JSON response schemas.

use super::{
    ChatMessage, Completion, CompletionRequest, LlmError, LlmProvider, MessageContent,
    ProviderCapabilities, ProviderStatus, Role, ToolCall,
};
use serde_json::{json, Value};
use std::time::Duration;

/// Gemini provider for Google AI
pub struct GeminiProvider {
    /// API key
    api_key: String,

    /// Base URL for the API
    base_url: String,

    /// Current model
    model: String,

    /// HTTP agent with the configured timeout
    agent: ureq::Agent,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: model.to_string(),
            agent: ureq::Agent::new(),
        }
    }

    /// Create with a specific base URL
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Bound every HTTP round trip
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::AgentBuilder::new().timeout(timeout).build();
        self
    }
}

impl LlmProvider for GeminiProvider {
    fn id(&self) -> &str {
        "gemini"
    }

    fn name(&self) -> &str {
        "Gemini"
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
        if self.api_key.is_empty() {
            ProviderStatus::Unavailable("No API key configured".to_string())
        } else {
            ProviderStatus::Ready
        }
    }

    fn generate(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        let model = self.model.clone();
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let body = build_request_body(request);
        let response = self
            .agent
            .post(&url)
            .set("Content-Type", "application/json")
            .send_json(&body)?;

        let json: Value = response.into_json()?;
        parse_response(&json)
    }
}

/// Convert a completion request into a Gemini request body
fn build_request_body(request: &CompletionRequest) -> Value {
    let mut contents: Vec<Value> = Vec::new();

    for msg in &request.messages {
        let (role, parts) = message_parts(msg);

        // Parallel tool results must travel in one content block
        if let Some(last) = contents.last_mut() {
            if msg.role == Role::Tool && last["role"] == role && is_function_response(last) {
                if let Some(existing) = last["parts"].as_array_mut() {
                    existing.extend(parts);
                    continue;
                }
            }
        }

        contents.push(json!({ "role": role, "parts": parts }));
    }

    let mut generation_config = json!({
        "maxOutputTokens": 8192,
        "temperature": request.temperature.unwrap_or(0.7)
    });
    if let Some(schema) = &request.response_schema {
        generation_config["responseMimeType"] = json!("application/json");
        generation_config["responseSchema"] = schema.clone();
    }

    let mut body = json!({
        "contents": contents,
        "generationConfig": generation_config
    });

    if let Some(instruction) = &request.system {
        body["system_instruction"] = json!({ "parts": [{ "text": instruction }] });
    }

    if !request.tools.is_empty() {
        let declarations: Vec<Value> = request
            .tools
            .iter()
            .map(|tool| {
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.parameters
                })
            })
            .collect();
        body["tools"] = json!([{ "functionDeclarations": declarations }]);
    }

    body
}

fn is_function_response(content: &Value) -> bool {
    content["parts"]
        .as_array()
        .and_then(|parts| parts.first())
        .map(|part| part.get("functionResponse").is_some())
        .unwrap_or(false)
}

fn message_parts(msg: &ChatMessage) -> (&'static str, Vec<Value>) {
    match &msg.content {
        MessageContent::Text { text } => {
            let role = match msg.role {
                Role::Assistant => "model",
                _ => "user",
            };
            (role, vec![json!({ "text": text })])
        }
        MessageContent::ToolCalls { calls } => {
            let parts = calls
                .iter()
                .map(|call| json!({ "functionCall": { "name": call.name, "args": call.arguments } }))
                .collect();
            ("model", parts)
        }
        MessageContent::ToolResult { result } => {
            // functionResponse.response must be an object
            let response = if result.content.is_object() {
                result.content.clone()
            } else {
                json!({ "result": result.content })
            };
            (
                "user",
                vec![json!({ "functionResponse": { "name": result.name, "response": response } })],
            )
        }
    }
}

/// Parse a `generateContent` response body
fn parse_response(json: &Value) -> Result<Completion, LlmError> {
    if let Some(error) = json.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error");
        return Err(LlmError::Api {
            status: error.get("code").and_then(|c| c.as_u64()).unwrap_or(500) as u16,
            message: message.to_string(),
        });
    }

    if let Some(reason) = json
        .get("promptFeedback")
        .and_then(|f| f.get("blockReason"))
        .and_then(|r| r.as_str())
    {
        return Err(LlmError::InvalidResponse(format!("prompt blocked: {}", reason)));
    }

    let parts = json
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .ok_or_else(|| LlmError::InvalidResponse("Gemini response has no candidates".into()))?;

    let calls: Vec<ToolCall> = parts
        .iter()
        .filter_map(|part| part.get("functionCall"))
        .filter_map(|call| {
            let name = call.get("name")?.as_str()?;
            let args = call.get("args").cloned().unwrap_or_else(|| json!({}));
            Some(ToolCall::new(name, args))
        })
        .collect();

    if !calls.is_empty() {
        return Ok(Completion::ToolCalls(calls));
    }

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
        .collect();

    Ok(Completion::Text(text))
}
