//! OpenAI chat completion provider.
//!
//! Non-streaming client for `POST {endpoint}/v1/chat/completions`. The
//! request carries an optional system message followed by the user prompt.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use mytherapy_core::{AppError, AppResult};
use reqwest::header;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Longest error body echoed back in an error message.
const MAX_ERROR_SNIPPET: usize = 300;

/// OpenAI chat completion client.
#[derive(Debug)]
pub struct OpenAiClient {
    client: reqwest::Client,
    url_chat: String,
}

impl OpenAiClient {
    /// Create a client for the public OpenAI endpoint.
    pub fn new(api_key: &str) -> AppResult<Self> {
        Self::with_endpoint(api_key, DEFAULT_ENDPOINT, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client for a custom endpoint (proxies, Azure-compatible gateways).
    ///
    /// # Errors
    /// Returns `AppError::Llm` when the key is blank, the endpoint is not
    /// http(s), or the HTTP client cannot be built.
    pub fn with_endpoint(api_key: &str, endpoint: &str, timeout: Duration) -> AppResult<Self> {
        if api_key.trim().is_empty() {
            return Err(AppError::Llm("OpenAI provider requires API key".to_string()));
        }

        let endpoint = endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(AppError::Llm(format!(
                "Invalid OpenAI endpoint: {:?}",
                endpoint
            )));
        }

        let mut headers = header::HeaderMap::new();
        let auth = header::HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|e| AppError::Llm(format!("Invalid API key header: {}", e)))?;
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to create HTTP client: {}", e)))?;

        let url_chat = format!("{}/v1/chat/completions", endpoint.trim_end_matches('/'));

        tracing::debug!(url = %url_chat, timeout_secs = timeout.as_secs(), "OpenAI client initialized");

        Ok(Self { client, url_chat })
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let started = Instant::now();
        let body = ChatCompletionRequest::from_request(request);

        tracing::debug!(
            model = %request.model,
            prompt_len = request.prompt.len(),
            has_system = request.system.is_some(),
            "POST {}",
            self.url_chat
        );

        let response = self
            .client
            .post(&self.url_chat)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to OpenAI: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            tracing::error!(
                %status,
                latency_ms = started.elapsed().as_millis() as u64,
                "OpenAI chat completion returned non-success status"
            );
            return Err(AppError::Llm(format!(
                "OpenAI API error ({}): {}",
                status,
                make_snippet(&text)
            )));
        }

        let out: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse OpenAI response: {}", e)))?;

        let model = out.model.unwrap_or_else(|| request.model.clone());
        let usage = out
            .usage
            .map(|u| LlmUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        let content = out
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or_else(|| AppError::Llm("OpenAI response contained no choices".to_string()))?;

        tracing::debug!(
            latency_ms = started.elapsed().as_millis() as u64,
            total_tokens = usage.total_tokens,
            "Chat completion completed"
        );

        Ok(LlmResponse {
            content,
            model,
            usage,
        })
    }
}

/// Truncate an error body for inclusion in messages.
fn make_snippet(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= MAX_ERROR_SNIPPET {
        trimmed.to_string()
    } else {
        let head: String = trimmed.chars().take(MAX_ERROR_SNIPPET).collect();
        format!("{}...", head)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl<'a> ChatCompletionRequest<'a> {
    fn from_request(request: &'a LlmRequest) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(ref system) = request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        Self {
            model: &request.model,
            messages,
            temperature: request.temperature,
            top_p: request.top_p,
            max_tokens: request.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}
