//! Chat message and completion types shared by all providers

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned id, or a generated one when the provider has none
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: format!("call_{}", uuid::Uuid::new_v4().simple()),
            name: name.into(),
            arguments,
        }
    }
}

/// Output of a tool, sent back to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub call_id: String,
    pub name: String,
    pub content: Value,
}

/// Message content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    /// Plain text
    Text { text: String },

    /// Tool calls made by the assistant
    ToolCalls { calls: Vec<ToolCall> },

    /// Result of one tool call
    ToolResult { result: ToolResult },
}

/// Chat message for LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: Role,

    /// Message content
    pub content: MessageContent,
}

impl ChatMessage {
    /// Create a new user message with text content
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text {
                text: content.into(),
            },
        }
    }

    /// Assistant turn that requested tools
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::ToolCalls { calls },
        }
    }

    /// Tool output answering a previous call
    pub fn tool_result(result: ToolResult) -> Self {
        Self {
            role: Role::Tool,
            content: MessageContent::ToolResult { result },
        }
    }

    /// Get the role as a string
    pub fn role_str(&self) -> &str {
        self.role.as_str()
    }

    /// Text of the message, empty for tool traffic
    pub fn text(&self) -> &str {
        match &self.content {
            MessageContent::Text { text } => text,
            _ => "",
        }
    }
}

/// A callable tool as described to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object
    pub parameters: Value,
}

/// One request to a provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// System instruction
    pub system: Option<String>,

    /// Conversation so far
    pub messages: Vec<ChatMessage>,

    /// Tools the model may call
    pub tools: Vec<ToolDeclaration>,

    /// When set, the model must answer with JSON matching this schema
    pub response_schema: Option<Value>,

    /// Sampling temperature
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_messages(mut self, messages: Vec<ChatMessage>) -> Self {
        self.messages.extend(messages);
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDeclaration>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_response_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// What the model answered
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Text(String),
    ToolCalls(Vec<ToolCall>),
}

impl Completion {
    /// Text of the completion, or an error if the model asked for tools
    pub fn into_text(self) -> Result<String, super::LlmError> {
        match self {
            Completion::Text(text) => Ok(text),
            Completion::ToolCalls(calls) => Err(super::LlmError::InvalidResponse(format!(
                "expected text, model requested {} tool call(s)",
                calls.len()
            ))),
        }
    }
}

/// Strip markdown code fences the model sometimes wraps JSON in
pub fn strip_code_fences(content: &str) -> &str {
    content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}
