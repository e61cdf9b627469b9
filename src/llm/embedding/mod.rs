pub mod huggingface;
pub mod rllm_backend;

use async_trait::async_trait;
use std::error::Error as StdError;
use std::sync::Arc;
use log::warn;

use super::{ LlmConfig, LlmType };
use self::huggingface::HuggingFaceEmbeddingClient;
use self::rllm_backend::RllmEmbeddingClient;

#[derive(Debug, Clone)]
pub struct EmbeddingResponse {
    pub embedding: Vec<f32>,
}

#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> Result<EmbeddingResponse, Box<dyn StdError + Send + Sync>>;
}

pub fn new_client(
    config: &LlmConfig
) -> Result<Arc<dyn EmbeddingClient>, Box<dyn StdError + Send + Sync>> {
    let client: Arc<dyn EmbeddingClient> = match config.llm_type {
        LlmType::HuggingFace => {
            let specific_client = HuggingFaceEmbeddingClient::from_config(config)?;
            Arc::new(specific_client)
        }
        LlmType::OpenAI | LlmType::Ollama => {
            let specific_client = RllmEmbeddingClient::from_config(config)?;
            Arc::new(specific_client)
        }
        LlmType::Groq => {
            warn!("Groq does not serve embedding models");
            return Err("Groq is not supported as an embedding provider".into());
        }
    };
    Ok(client)
}
