//! OpenAI-backed chat generation.

use super::{ChatMessage, Generator, GeneratorReply, ToolDefinition};
use crate::error::{PensumError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionCall,
    FunctionObject,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// OpenAI chat completion generator.
pub struct OpenAIGenerator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAIGenerator {
    /// Create a new generator for the given model.
    pub fn new(model: &str, max_tokens: u32, temperature: f32) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
            max_tokens,
            temperature,
        }
    }

    fn build_messages(
        system: &str,
        messages: &[ChatMessage],
    ) -> Result<Vec<ChatCompletionRequestMessage>> {
        let map_err = |e: async_openai::error::OpenAIError| PensumError::Generation(e.to_string());

        let mut out: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(map_err)?
                .into(),
        ];

        for message in messages {
            let mapped: ChatCompletionRequestMessage = match message {
                ChatMessage::User(content) => ChatCompletionRequestUserMessageArgs::default()
                    .content(content.clone())
                    .build()
                    .map_err(map_err)?
                    .into(),
                ChatMessage::Assistant(content) => {
                    ChatCompletionRequestAssistantMessageArgs::default()
                        .content(content.clone())
                        .build()
                        .map_err(map_err)?
                        .into()
                }
                ChatMessage::ToolCall {
                    id,
                    name,
                    arguments,
                } => ChatCompletionRequestAssistantMessageArgs::default()
                    .tool_calls(vec![ChatCompletionMessageToolCall {
                        id: id.clone(),
                        r#type: ChatCompletionToolType::Function,
                        function: FunctionCall {
                            name: name.clone(),
                            arguments: arguments.clone(),
                        },
                    }])
                    .build()
                    .map_err(map_err)?
                    .into(),
                ChatMessage::ToolResult { id, content } => {
                    ChatCompletionRequestToolMessageArgs::default()
                        .tool_call_id(id)
                        .content(content.clone())
                        .build()
                        .map_err(map_err)?
                        .into()
                }
            };
            out.push(mapped);
        }

        Ok(out)
    }

    fn map_tools(tools: &[ToolDefinition]) -> Vec<ChatCompletionTool> {
        tools
            .iter()
            .map(|tool| ChatCompletionTool {
                r#type: ChatCompletionToolType::Function,
                function: FunctionObject {
                    name: tool.name.clone(),
                    description: Some(tool.description.clone()),
                    parameters: Some(tool.parameters.clone()),
                    strict: None,
                },
            })
            .collect()
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    #[instrument(skip(self, system, messages, tools), fields(model = %self.model))]
    async fn generate(
        &self,
        system: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<GeneratorReply> {
        let request_messages = Self::build_messages(system, messages)?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.model)
            .messages(request_messages)
            .max_tokens(self.max_tokens)
            .temperature(self.temperature);
        if let Some(tools) = tools {
            builder.tools(Self::map_tools(tools));
        }
        let request = builder
            .build()
            .map_err(|e| PensumError::Generation(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| PensumError::OpenAI(format!("Chat API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| PensumError::Generation("No response from model".to_string()))?;

        // A tool request takes precedence over any partial text content.
        if let Some(tool_calls) = choice.message.tool_calls {
            if let Some(call) = tool_calls.into_iter().next() {
                debug!("Generator requested tool '{}'", call.function.name);
                return Ok(GeneratorReply::ToolUse {
                    id: call.id,
                    name: call.function.name,
                    arguments: call.function.arguments,
                });
            }
        }

        let text = choice
            .message
            .content
            .ok_or_else(|| PensumError::Generation("Empty response from model".to_string()))?;

        Ok(GeneratorReply::Answer(text))
    }
}
