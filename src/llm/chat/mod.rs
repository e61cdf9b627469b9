pub mod ollama;
pub mod openai;
pub mod groq;

use async_trait::async_trait;
use serde::Deserialize;
use std::error::Error as StdError;
use std::sync::Arc;
use super::{ LlmConfig, LlmType };
use self::ollama::OllamaClient;
use self::openai::OpenAIChatClient;
use self::groq::GroqChatClient;
use crate::models::chat::ChatMessage;

#[derive(Deserialize, Debug, Clone)]
pub struct CompletionResponse {
    pub response: String,
}

/// Sampling parameters sent with every completion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

impl CompletionOptions {
    /// Deterministic replies for the tutor persona.
    pub fn tutor() -> Self {
        Self { temperature: 0.0, max_tokens: 1024, top_p: 1.0 }
    }

    pub fn evaluation() -> Self {
        Self { temperature: 0.5, max_tokens: 1024, top_p: 1.0 }
    }
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self { temperature: 0.7, max_tokens: 1024, top_p: 1.0 }
    }
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Sends the full transcript and returns the single reply.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> Option<String>;
}

pub fn new_client(
    config: &LlmConfig
) -> Result<Arc<dyn ChatClient>, Box<dyn StdError + Send + Sync>> {
    let client: Arc<dyn ChatClient> = match config.llm_type {
        LlmType::Ollama => {
            let specific_client = OllamaClient::from_config(config)?;
            Arc::new(specific_client)
        }
        LlmType::OpenAI => {
            let specific_client = OpenAIChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
        LlmType::Groq => {
            let specific_client = GroqChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
        LlmType::HuggingFace => {
            return Err("HuggingFace is only supported as an embedding provider".into());
        }
    };
    Ok(client)
}
