//! OpenAI embedding provider adapter.
//!
//! Calls the `/embeddings` endpoint of any OpenAI-compatible API
//! (OpenAI, Azure OpenAI, local servers).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::EmbeddingConfig;
use crate::domain::ports::EmbeddingProvider;

/// OpenAI embedding provider.
pub struct OpenAiEmbeddingProvider {
    model: String,
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenAiEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> DomainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DomainError::Embedding(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client,
        })
    }

    fn api_key(&self) -> DomainResult<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                DomainError::Embedding(
                    "OpenAI API key not set. Set OPENAI_API_KEY env var or configure embedding.api_key."
                        .to_string(),
                )
            })
    }

    async fn call_embeddings_api(&self, texts: Vec<String>) -> DomainResult<Vec<Vec<f32>>> {
        let api_key = self.api_key()?;
        let url = format!("{}/embeddings", self.base_url);
        let expected = texts.len();

        let request_body = EmbeddingsRequest {
            model: self.model.clone(),
            input: texts,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| DomainError::Embedding(format!("Embedding API request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(DomainError::Embedding(format!(
                "Embedding API returned {status}: {body}"
            )));
        }

        let result: EmbeddingsResponse = response.json().await.map_err(|e| {
            DomainError::Serialization(format!("Failed to parse embedding response: {e}"))
        })?;

        // Sort by index to maintain input order
        let mut data = result.data;
        data.sort_by_key(|d| d.index);

        if data.len() != expected {
            return Err(DomainError::Embedding(format!(
                "Embedding API returned {} vectors for {expected} inputs",
                data.len()
            )));
        }

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        self.call_embeddings_api(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::Embedding("Empty embedding response".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> DomainResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.call_embeddings_api(texts.to_vec()).await
    }
}

// -- OpenAI API request/response types --

#[derive(Debug, Serialize)]
struct EmbeddingsRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
