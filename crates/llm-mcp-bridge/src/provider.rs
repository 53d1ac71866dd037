use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionCall,
    FunctionObject,
};
use async_openai::Client;
use async_trait::async_trait;

use crate::catalog::ToolSchema;
use crate::config::{BackendConfig, TurnConfig};
use crate::error::{BridgeError, Result};
use crate::types::{Message, Role, ToolCall};

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    FunctionCall,
    /// Missing, or a value this crate does not know
    Unspecified,
}

impl FinishReason {
    /// Parse the `finish_reason` string used on the wire.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "stop" => FinishReason::Stop,
            "length" => FinishReason::Length,
            "tool_calls" => FinishReason::ToolCalls,
            "content_filter" => FinishReason::ContentFilter,
            "function_call" => FinishReason::FunctionCall,
            _ => FinishReason::Unspecified,
        }
    }
}

/// Sampling limits sent with each request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationConfig {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: Some(4096),
            temperature: Some(0.0),
        }
    }
}

impl From<&TurnConfig> for GenerationConfig {
    fn from(config: &TurnConfig) -> Self {
        Self {
            max_tokens: Some(config.max_tokens),
            temperature: Some(config.temperature),
        }
    }
}

/// First choice of a chat completion
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletionResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: FinishReason,
}

impl ChatCompletionResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
            finish_reason: FinishReason::Stop,
        }
    }

    pub fn tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: None,
            tool_calls,
            finish_reason: FinishReason::ToolCalls,
        }
    }
}

/// A chat completion service.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolSchema]>,
        config: &GenerationConfig,
    ) -> Result<ChatCompletionResponse>;
}

/// Completion backend for any OpenAI-compatible endpoint (OpenAI, Ollama, vLLM, ...)
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiProvider {
    pub fn new(config: &BackendConfig) -> Self {
        let mut openai = OpenAIConfig::new().with_api_base(config.base_url.trim_end_matches('/'));
        if let Some(key) = &config.api_key {
            openai = openai.with_api_key(key);
        }

        Self {
            client: Client::with_config(openai),
            model: config.model.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Convert transcript messages to request messages
    pub fn convert_messages(messages: &[Message]) -> Result<Vec<ChatCompletionRequestMessage>> {
        messages.iter().map(Self::convert_message).collect()
    }

    fn convert_message(message: &Message) -> Result<ChatCompletionRequestMessage> {
        let converted: ChatCompletionRequestMessage = match message.role {
            Role::System => ChatCompletionRequestSystemMessageArgs::default()
                .content(message.content.clone())
                .build()
                .map_err(completion_error)?
                .into(),
            Role::User => ChatCompletionRequestUserMessageArgs::default()
                .content(message.content.clone())
                .build()
                .map_err(completion_error)?
                .into(),
            Role::Assistant => {
                let mut args = ChatCompletionRequestAssistantMessageArgs::default();
                if !message.content.is_empty() || message.tool_calls.is_empty() {
                    args.content(message.content.clone());
                }
                if !message.tool_calls.is_empty() {
                    args.tool_calls(
                        message
                            .tool_calls
                            .iter()
                            .map(|call| ChatCompletionMessageToolCall {
                                id: call.id.0.clone(),
                                r#type: ChatCompletionToolType::Function,
                                function: FunctionCall {
                                    name: call.name.clone(),
                                    arguments: call.arguments.clone(),
                                },
                            })
                            .collect::<Vec<_>>(),
                    );
                }
                args.build().map_err(completion_error)?.into()
            }
            Role::Tool => {
                let tool_call_id = message.tool_call_id.as_ref().ok_or_else(|| {
                    BridgeError::protocol("tool message without a tool_call_id")
                })?;
                ChatCompletionRequestToolMessageArgs::default()
                    .content(message.content.clone())
                    .tool_call_id(tool_call_id.0.clone())
                    .build()
                    .map_err(completion_error)?
                    .into()
            }
        };
        Ok(converted)
    }

    /// Convert schema fragments to request tools
    pub fn convert_tools(tools: &[ToolSchema]) -> Vec<ChatCompletionTool> {
        tools
            .iter()
            .map(|tool| ChatCompletionTool {
                r#type: ChatCompletionToolType::Function,
                function: FunctionObject {
                    name: tool.function.name.clone(),
                    description: tool.function.description.clone(),
                    parameters: Some(tool.function.parameters.clone()),
                    strict: None,
                },
            })
            .collect()
    }
}

#[async_trait]
impl CompletionBackend for OpenAiProvider {
    #[allow(deprecated)]
    #[tracing::instrument(
        skip(self, messages, tools, config),
        fields(
            llm.model = %self.model,
            llm.messages = messages.len(),
            llm.tools = tools.map_or(0, |t| t.len()),
        )
    )]
    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolSchema]>,
        config: &GenerationConfig,
    ) -> Result<ChatCompletionResponse> {
        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(self.model.clone())
            .messages(Self::convert_messages(messages)?);

        if let Some(tools) = tools {
            builder.tools(Self::convert_tools(tools));
        }
        if let Some(max_tokens) = config.max_tokens {
            builder.max_tokens(max_tokens);
        }
        if let Some(temperature) = config.temperature {
            builder.temperature(temperature);
        }

        let request = builder.build().map_err(completion_error)?;
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(completion_error)?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| BridgeError::protocol("completion returned no choices"))?;

        let finish_reason = choice
            .finish_reason
            .and_then(|reason| serde_json::to_value(reason).ok())
            .and_then(|value| value.as_str().map(FinishReason::from_wire))
            .unwrap_or(FinishReason::Unspecified);

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCall::new(call.id, call.function.name, call.function.arguments))
            .collect();

        Ok(ChatCompletionResponse {
            content: choice.message.content,
            tool_calls,
            finish_reason,
        })
    }
}

fn completion_error(err: async_openai::error::OpenAIError) -> BridgeError {
    BridgeError::Completion(err.to_string())
}
