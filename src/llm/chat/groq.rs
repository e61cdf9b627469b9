use async_trait::async_trait;
use std::error::Error as StdError;

use super::openai::OpenAIChatClient;
use super::{ChatClient, CompletionOptions, CompletionResponse};
use crate::llm::LlmConfig;
use crate::models::chat::ChatMessage;

/// Groq serves an OpenAI-compatible completion API.
pub struct GroqChatClient {
    inner: OpenAIChatClient,
}

impl GroqChatClient {
    pub const DEFAULT_URL: &'static str = "https://api.groq.com/openai/v1/chat/completions";
    pub const DEFAULT_MODEL: &'static str = "llama-3.1-8b-instant";

    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let inner = OpenAIChatClient::new(
            api_key,
            model.unwrap_or_else(|| Self::DEFAULT_MODEL.to_string()),
            base_url.unwrap_or_else(|| Self::DEFAULT_URL.to_string()),
        )?;
        Ok(Self { inner })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let api_key = config.api_key
            .clone()
            .ok_or_else(|| "Groq API key is required".to_string())?;

        Self::new(
            api_key,
            config.completion_model.clone(),
            config.base_url.clone(),
        )
    }
}

#[async_trait]
impl ChatClient for GroqChatClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
        self.inner.complete(messages, options).await
    }

    fn get_model(&self) -> String {
        self.inner.get_model()
    }

    fn get_base_url(&self) -> Option<String> {
        self.inner.get_base_url()
    }
}
