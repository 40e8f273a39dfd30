//! Two-round tool-calling protocol.
//!
//! One query gets at most one tool round: the generator is first invoked
//! with tools available; if it requests one, the tool runs and the
//! generator is re-invoked with the result and tools withheld. The state
//! machine makes a second tool round structurally impossible rather than a
//! convention.

use super::tools::{parse_tool_call, tool_definitions, ToolContext};
use crate::error::{PensumError, Result};
use crate::generation::{ChatMessage, Generator, GeneratorReply};
use std::sync::Arc;
use tracing::{debug, info};

/// Protocol states. `ToolExecuted` is folded into the transition from
/// `ToolRequested` to `AwaitFinalResponse`: executing the tool is what
/// moves the machine forward.
enum ProtocolState {
    AwaitFirstResponse,
    ToolRequested {
        id: String,
        name: String,
        arguments: String,
    },
    AwaitFinalResponse,
    Done(String),
}

/// Drives the two-round generation protocol against a [`Generator`] and a
/// [`ToolContext`].
pub struct ToolController {
    generator: Arc<dyn Generator>,
    tools: Arc<ToolContext>,
}

impl ToolController {
    /// Create a new controller.
    pub fn new(generator: Arc<dyn Generator>, tools: Arc<ToolContext>) -> Self {
        Self { generator, tools }
    }

    /// Run one query through the protocol and return the final answer text.
    ///
    /// Tool execution failures are absorbed: the failure text becomes the
    /// tool result and the final round still runs. Only generator failures
    /// propagate.
    pub async fn run(&self, system: &str, user_prompt: &str) -> Result<String> {
        let definitions = tool_definitions();
        let mut messages = vec![ChatMessage::user(user_prompt)];
        let mut state = ProtocolState::AwaitFirstResponse;

        loop {
            state = match state {
                ProtocolState::AwaitFirstResponse => {
                    let reply = self
                        .generator
                        .generate(system, &messages, Some(&definitions))
                        .await?;
                    match reply {
                        GeneratorReply::Answer(text) => ProtocolState::Done(text),
                        GeneratorReply::ToolUse {
                            id,
                            name,
                            arguments,
                        } => ProtocolState::ToolRequested {
                            id,
                            name,
                            arguments,
                        },
                    }
                }

                ProtocolState::ToolRequested {
                    id,
                    name,
                    arguments,
                } => {
                    info!("Executing tool '{}'", name);
                    let result = self.execute_tool(&name, &arguments).await;
                    debug!("Tool result: {} chars", result.len());

                    messages.push(ChatMessage::ToolCall {
                        id: id.clone(),
                        name,
                        arguments,
                    });
                    messages.push(ChatMessage::ToolResult {
                        id,
                        content: result,
                    });
                    ProtocolState::AwaitFinalResponse
                }

                ProtocolState::AwaitFinalResponse => {
                    // Tools withheld: a second tool request cannot be honored.
                    let reply = self.generator.generate(system, &messages, None).await?;
                    match reply {
                        GeneratorReply::Answer(text) => ProtocolState::Done(text),
                        GeneratorReply::ToolUse { name, .. } => {
                            return Err(PensumError::Generation(format!(
                                "tool '{}' requested in the final round",
                                name
                            )));
                        }
                    }
                }

                ProtocolState::Done(text) => return Ok(text),
            };
        }
    }

    /// Execute a tool call, turning every failure into result text.
    async fn execute_tool(&self, name: &str, arguments: &str) -> String {
        match parse_tool_call(name, arguments) {
            Ok(call) => match self.tools.execute(&call).await {
                Ok(output) => output,
                Err(e) => format!("Tool execution error: {}", e),
            },
            Err(e) => format!("Tool execution error: {}", e),
        }
    }
}
