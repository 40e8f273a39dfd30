//! Chat completion abstraction with optional tool use.
//!
//! The protocol controller only ever sees [`GeneratorReply`], a tagged union
//! of "direct answer" and "tool requested" — response shape is decided here,
//! never by sniffing strings downstream.

mod openai;

pub use openai::OpenAIGenerator;

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// A message in a generation conversation.
#[derive(Debug, Clone)]
pub enum ChatMessage {
    /// User text.
    User(String),
    /// Assistant text.
    Assistant(String),
    /// Assistant tool invocation (replayed to the model in round 2).
    ToolCall {
        id: String,
        name: String,
        arguments: String,
    },
    /// Result of a tool invocation.
    ToolResult { id: String, content: String },
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::User(content.into())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant(content.into())
    }
}

/// A tool schema described to the generator.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema for the tool arguments.
    pub parameters: Value,
}

/// Generator response: either a final text answer or a tool request.
#[derive(Debug, Clone)]
pub enum GeneratorReply {
    /// Direct text answer; the query is finished.
    Answer(String),
    /// The generator wants a tool executed before answering.
    ToolUse {
        id: String,
        name: String,
        arguments: String,
    },
}

/// Trait for chat completion backends.
///
/// Tools are permitted but never forced when `tools` is `Some`; passing
/// `None` withholds tools entirely (used for the final protocol round).
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        system: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<GeneratorReply>;
}
