//! OpenAI embedding provider (`POST {endpoint}/v1/embeddings`).

use super::ollama::check_batch;
use crate::embeddings::EmbeddingProvider;
use async_trait::async_trait;
use mytherapy_core::{AppError, AppResult, EmbeddingSettings};
use reqwest::header;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com";
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Embeddings from the OpenAI API, one request per batch.
#[derive(Debug)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    url_embeddings: String,
    model: String,
    dimensions: usize,
    batch_size: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
    /// Only the `text-embedding-3` family accepts a target size.
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiProvider {
    /// Create a provider with bearer authentication.
    pub fn new(settings: &EmbeddingSettings, api_key: &str) -> AppResult<Self> {
        if api_key.trim().is_empty() {
            return Err(AppError::Config(
                "OpenAI embedding provider requires an API key".to_string(),
            ));
        }

        let mut headers = header::HeaderMap::new();
        let auth = header::HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|e| AppError::Embedding(format!("Invalid API key header: {}", e)))?;
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::Embedding(format!("Failed to create HTTP client: {}", e)))?;

        let endpoint = settings.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
        let url_embeddings = format!("{}/v1/embeddings", endpoint.trim().trim_end_matches('/'));

        Ok(Self {
            client,
            url_embeddings,
            model: settings.model.clone(),
            dimensions: settings.dimensions,
            batch_size: settings.batch_size.max(1),
        })
    }

    fn request_dimensions(&self) -> Option<usize> {
        self.model
            .starts_with("text-embedding-3")
            .then_some(self.dimensions)
    }

    async fn embed_request(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let request = EmbeddingsRequest {
            model: &self.model,
            input: texts,
            dimensions: self.request_dimensions(),
        };

        debug!("POST {} ({} inputs)", self.url_embeddings, texts.len());

        let response = self
            .client
            .post(&self.url_embeddings)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("OpenAI request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(300).collect();
            return Err(AppError::Embedding(format!(
                "OpenAI /v1/embeddings returned {}: {}",
                status, snippet
            )));
        }

        let mut body: EmbeddingsResponse = response.json().await.map_err(|e| {
            AppError::Embedding(format!("Failed to decode /v1/embeddings response: {}", e))
        })?;

        body.data.sort_by_key(|item| item.index);
        let embeddings: Vec<Vec<f32>> = body.data.into_iter().map(|item| item.embedding).collect();

        check_batch(&embeddings, texts.len(), self.dimensions)?;

        Ok(embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), provider = "openai", model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            embeddings.extend(self.embed_request(batch).await?);
        }

        Ok(embeddings)
    }
}
