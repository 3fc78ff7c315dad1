use crate::error::BackendError;
use crate::state::{Role, TurnRecord};
use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use tracing::debug;

/// A finite, single-use stream of reply text chunks.
///
/// Concatenating every `Ok` chunk in order yields the full reply. An `Err` item
/// is terminal.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<String, BackendError>> + Send>>;

/// Boundary to the language-model backend.
///
/// The caller windows the history before calling; implementations send it as-is.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Starts a streaming reply to `history` under `system_prompt`.
    async fn converse(
        &self,
        system_prompt: String,
        history: Vec<TurnRecord>,
    ) -> Result<ChatStream, BackendError>;
}

/// Builds the request message list: the system prompt followed by the history.
pub fn build_messages(
    system_prompt: &str,
    history: &[TurnRecord],
) -> Result<Vec<ChatCompletionRequestMessage>, OpenAIError> {
    let mut messages: Vec<ChatCompletionRequestMessage> = vec![
        ChatCompletionRequestSystemMessageArgs::default()
            .content(system_prompt)
            .build()?
            .into(),
    ];
    for record in history {
        let message = match record.role {
            Role::User => ChatCompletionRequestUserMessageArgs::default()
                .content(record.content.clone())
                .build()?
                .into(),
            Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                .content(record.content.clone())
                .build()?
                .into(),
        };
        messages.push(message);
    }
    Ok(messages)
}

/// A `ChatGateway` for any OpenAI-compatible API (OpenAI, Gemini, Ollama).
pub struct OpenAICompatibleClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAICompatibleClient {
    /// Creates a new client for an OpenAI-compatible service.
    ///
    /// # Arguments
    ///
    /// * `config` - The configuration for the OpenAI client, including API key and base URL.
    /// * `model` - The model identifier to use for chat completions (e.g., "llama3").
    pub fn new(config: OpenAIConfig, model: String) -> Self {
        Self {
            client: Client::with_config(config),
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn unavailable(&self, error: OpenAIError) -> BackendError {
        BackendError::Unavailable {
            model: self.model.clone(),
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl ChatGateway for OpenAICompatibleClient {
    async fn converse(
        &self,
        system_prompt: String,
        history: Vec<TurnRecord>,
    ) -> Result<ChatStream, BackendError> {
        debug!(model = %self.model, history_len = history.len(), "Starting streaming reply");
        let messages =
            build_messages(&system_prompt, &history).map_err(|e| self.unavailable(e))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .stream(true)
            .build()
            .map_err(|e| self.unavailable(e))?;

        let stream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(|e| self.unavailable(e))?;

        Ok(Box::pin(stream.filter_map(|result| async move {
            match result {
                Ok(response) => response
                    .choices
                    .first()
                    .and_then(|choice| choice.delta.content.clone())
                    .filter(|content| !content.is_empty())
                    .map(Ok),
                Err(e) => Some(Err(BackendError::Stream(e.to_string()))),
            }
        })))
    }
}
