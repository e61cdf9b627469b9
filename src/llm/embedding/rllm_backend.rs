use async_trait::async_trait;
use ::rllm::{ builder::{ LLMBackend, LLMBuilder }, LLMProvider };
use std::error::Error as StdError;
use super::super::{ LlmConfig, LlmType };
use super::{ EmbeddingClient, EmbeddingResponse };

/// Embeddings through an `rllm` backend (OpenAI or Ollama).
pub struct RllmEmbeddingClient {
    llm: Box<dyn LLMProvider + Send + Sync>,
    provider: LlmType,
}

impl RllmEmbeddingClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let mut builder = match config.llm_type {
            LlmType::OpenAI => {
                let api_key = config.api_key
                    .clone()
                    .ok_or_else(|| "OpenAI API key is required for embeddings".to_string())?;
                LLMBuilder::new()
                    .backend(LLMBackend::OpenAI)
                    .api_key(api_key)
                    .model(
                        config.embedding_model.as_deref().unwrap_or("text-embedding-3-small")
                    )
            }
            LlmType::Ollama =>
                LLMBuilder::new()
                    .backend(LLMBackend::Ollama)
                    .base_url(
                        config.base_url.clone().unwrap_or_else(|| "http://localhost:11434".into())
                    )
                    .model(config.embedding_model.as_deref().unwrap_or("all-minilm"))
                    .stream(false),
            other => {
                return Err(format!("{} has no rllm embedding backend", other).into());
            }
        };

        if config.llm_type == LlmType::OpenAI {
            if let Some(url) = config.base_url.clone() {
                builder = builder.base_url(url);
            }
        }

        Ok(Self { llm: builder.build()?, provider: config.llm_type })
    }
}

#[async_trait]
impl EmbeddingClient for RllmEmbeddingClient {
    async fn embed(
        &self,
        text: &str
    ) -> Result<EmbeddingResponse, Box<dyn StdError + Send + Sync>> {
        let mut embeddings = self.llm.embed(vec![text.to_string()]).await?;
        let embedding = embeddings
            .pop()
            .ok_or_else(|| format!("{} embedding generation returned no results", self.provider))?;

        Ok(EmbeddingResponse { embedding })
    }
}
