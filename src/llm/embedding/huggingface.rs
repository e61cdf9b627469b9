use async_trait::async_trait;
use log::debug;
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE } };
use serde::{ Deserialize, Serialize };
use std::error::Error as StdError;

use super::super::LlmConfig;
use super::{ EmbeddingClient, EmbeddingResponse };

pub const DEFAULT_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const DEFAULT_BASE_URL: &str = "https://router.huggingface.co/hf-inference/models";

/// Hosted feature-extraction inference endpoint.
pub struct HuggingFaceEmbeddingClient {
    http: HttpClient,
    url: String,
}

#[derive(Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a str,
    options: RequestOptions,
}

#[derive(Serialize)]
struct RequestOptions {
    wait_for_model: bool,
}

/// Sentence-transformer models return one vector; plain transformer models
/// return one vector per token, optionally wrapped in a batch dimension.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum FeatureOutput {
    Sentence(Vec<f32>),
    Tokens(Vec<Vec<f32>>),
    Batch(Vec<Vec<Vec<f32>>>),
}

impl FeatureOutput {
    /// Collapses the output to a single vector, mean pooling over tokens.
    pub fn into_embedding(self) -> Result<Vec<f32>, String> {
        let pooled = match self {
            FeatureOutput::Sentence(v) => v,
            FeatureOutput::Tokens(tokens) => mean_pool(&tokens)?,
            FeatureOutput::Batch(mut batch) => {
                if batch.is_empty() {
                    return Err("feature extraction returned an empty batch".to_string());
                }
                mean_pool(&batch.swap_remove(0))?
            }
        };
        if pooled.is_empty() {
            return Err("feature extraction returned an empty vector".to_string());
        }
        Ok(pooled)
    }
}

fn mean_pool(tokens: &[Vec<f32>]) -> Result<Vec<f32>, String> {
    let first = tokens.first().ok_or_else(|| "no token vectors to pool".to_string())?;
    let dim = first.len();
    let mut sum = vec![0.0f32; dim];
    for token in tokens {
        if token.len() != dim {
            return Err(format!("token vector length {} does not match {}", token.len(), dim));
        }
        sum.iter_mut().zip(token).for_each(|(s, v)| *s += v);
    }
    let n = tokens.len() as f32;
    Ok(sum.into_iter().map(|s| s / n).collect())
}

impl HuggingFaceEmbeddingClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let model = model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let base = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let url = format!("{}/{}/pipeline/feature-extraction", base.trim_end_matches('/'), model);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| format!("Invalid API key format: {}", e))?
        );
        let http = HttpClient::builder().default_headers(headers).build()?;

        Ok(Self { http, url })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let api_key = config.api_key
            .clone()
            .ok_or_else(|| "HuggingFace API key is required for embeddings".to_string())?;
        Self::new(api_key, config.embedding_model.clone(), config.base_url.clone())
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl EmbeddingClient for HuggingFaceEmbeddingClient {
    async fn embed(
        &self,
        text: &str
    ) -> Result<EmbeddingResponse, Box<dyn StdError + Send + Sync>> {
        debug!("Requesting feature extraction from {}", self.url);
        let req = FeatureExtractionRequest {
            inputs: text,
            options: RequestOptions { wait_for_model: true },
        };
        let output = self.http
            .post(&self.url)
            .json(&req)
            .send().await?
            .error_for_status()?
            .json::<FeatureOutput>().await?;

        Ok(EmbeddingResponse { embedding: output.into_embedding()? })
    }
}
