//! Advice generation: retrieve, assemble, one completion request.
//!
//! Generation never fails outright. Every error is captured in an
//! [`AdviceOutcome`] together with the stage it came from, and the caller
//! decides how to present it.

use crate::retriever::Retriever;
use mytherapy_core::{AppConfig, AppError, AppResult};
use mytherapy_llm::{create_client, LlmClient, LlmRequest};
use mytherapy_prompt::{assemble, build_direct_prompt, BuiltPrompt, PromptSet};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

const CHUNK_PREVIEW_CHARS: usize = 250;
const PROMPT_PREVIEW_CHARS: usize = 1000;

/// Which prompt produced the advice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdviceMode {
    Rag,
    Fallback,
    Direct,
}

/// Generated advice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Advice {
    /// Completion text, trimmed
    pub text: String,
    pub mode: AdviceMode,
    /// Context chunks interpolated into the prompt
    pub chunks: Vec<String>,
}

/// Where generation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Retrieval,
    Prompt,
    Generation,
    FallbackGeneration,
    DirectGeneration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdviceFailure {
    pub stage: FailureStage,
    pub message: String,
}

impl AdviceFailure {
    fn new(stage: FailureStage, error: AppError) -> Self {
        Self {
            stage,
            message: error.to_string(),
        }
    }

    /// User-facing error text.
    pub fn render(&self) -> String {
        let prefix = match self.stage {
            FailureStage::FallbackGeneration => "Error generating fallback advice",
            FailureStage::DirectGeneration => "Error generating rag advice",
            FailureStage::Retrieval | FailureStage::Prompt | FailureStage::Generation => {
                "Error generating advice"
            }
        };
        format!("{}: {}", prefix, self.message)
    }
}

/// Result of an advice request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AdviceOutcome {
    Generated(Advice),
    Failed(AdviceFailure),
}

impl AdviceOutcome {
    /// Advice text, or the rendered error message.
    pub fn render(&self) -> String {
        match self {
            Self::Generated(advice) => advice.text.clone(),
            Self::Failed(failure) => failure.render(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn advice(&self) -> Option<&Advice> {
        match self {
            Self::Generated(advice) => Some(advice),
            Self::Failed(_) => None,
        }
    }

    pub fn into_result(self) -> Result<Advice, AdviceFailure> {
        match self {
            Self::Generated(advice) => Ok(advice),
            Self::Failed(failure) => Err(failure),
        }
    }
}

impl fmt::Display for AdviceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Request parameters for advice generation.
#[derive(Debug, Clone, PartialEq)]
pub struct AdviceOptions {
    /// Completion model
    pub model: String,
    /// Chunks to retrieve per request
    pub top_k: usize,
    pub max_tokens: u32,
}

impl AdviceOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.model.clone(),
            top_k: config.rag.top_k,
            max_tokens: config.rag.max_tokens,
        }
    }
}

impl Default for AdviceOptions {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            top_k: 3,
            max_tokens: 300,
        }
    }
}

/// Produces advice for a description of a patient's situation.
pub struct AdviceGenerator {
    retriever: Retriever,
    llm: Arc<dyn LlmClient>,
    prompts: PromptSet,
    options: AdviceOptions,
}

impl AdviceGenerator {
    pub fn new(
        retriever: Retriever,
        llm: Arc<dyn LlmClient>,
        prompts: PromptSet,
        options: AdviceOptions,
    ) -> Self {
        Self {
            retriever,
            llm,
            prompts,
            options,
        }
    }

    /// Wire up the configured retriever, completion client and prompts.
    ///
    /// The retriever degrades on its own; only a misconfigured completion
    /// client or an invalid prompt override is an error here.
    pub async fn from_config(config: &AppConfig) -> AppResult<Self> {
        let retriever = Retriever::load(config).await;

        let provider = config.provider.as_str();
        let endpoint = config.provider_endpoint(provider);
        let api_key = config.resolve_api_key(provider);
        let timeout = config.get_provider_config(provider).and_then(|pc| pc.timeout());
        let llm = create_client(provider, endpoint.as_deref(), api_key.as_deref(), timeout)?;

        let prompts = PromptSet::load(&config.workspace)?;

        Ok(Self::new(
            retriever,
            llm,
            prompts,
            AdviceOptions::from_config(config),
        ))
    }

    /// Retriever backing [`AdviceGenerator::generate_advice`].
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Retrieve similar examples and generate advice from them, or from the
    /// fallback prompt when nothing was retrieved.
    pub async fn generate_advice(&self, user_input: &str) -> AdviceOutcome {
        tracing::info!("Generating advice for input: {}", user_input);

        let chunks = match self.retriever.retrieve(user_input, self.options.top_k).await {
            Ok(chunks) => chunks,
            Err(e) => {
                tracing::error!("Retrieval failed: {}", e);
                return AdviceOutcome::Failed(AdviceFailure::new(FailureStage::Retrieval, e));
            }
        };

        tracing::info!("Retrieved {} chunks", chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            tracing::info!("Chunk {}: {}", i + 1, preview(chunk, CHUNK_PREVIEW_CHARS));
        }

        let (mode, stage) = if chunks.is_empty() {
            tracing::warn!("No relevant context retrieved, using fallback prompt");
            (AdviceMode::Fallback, FailureStage::FallbackGeneration)
        } else {
            (AdviceMode::Rag, FailureStage::Generation)
        };

        let prompt = match assemble(&self.prompts, &chunks, user_input) {
            Ok(prompt) => prompt,
            Err(e) => return AdviceOutcome::Failed(AdviceFailure::new(FailureStage::Prompt, e)),
        };

        self.complete(prompt, mode, stage, chunks).await
    }

    /// Generate advice from caller-supplied documents, skipping retrieval.
    pub async fn advise_with_documents(&self, user_input: &str, documents: &[String]) -> AdviceOutcome {
        tracing::info!(
            "Generating advice from {} supplied documents",
            documents.len()
        );

        let prompt = match build_direct_prompt(&self.prompts, documents, user_input) {
            Ok(prompt) => prompt,
            Err(e) => return AdviceOutcome::Failed(AdviceFailure::new(FailureStage::Prompt, e)),
        };

        self.complete(
            prompt,
            AdviceMode::Direct,
            FailureStage::DirectGeneration,
            documents.to_vec(),
        )
        .await
    }

    async fn complete(
        &self,
        prompt: BuiltPrompt,
        mode: AdviceMode,
        stage: FailureStage,
        chunks: Vec<String>,
    ) -> AdviceOutcome {
        tracing::debug!(
            "Prompt {}: {}",
            prompt.metadata.source_prompt_id,
            preview(&prompt.user, PROMPT_PREVIEW_CHARS)
        );

        let mut request = LlmRequest::new(prompt.user, self.options.model.as_str())
            .with_max_tokens(self.options.max_tokens);
        if let Some(system) = prompt.system {
            request = request.with_system(system);
        }

        match self.llm.complete(&request).await {
            Ok(response) => {
                tracing::info!(
                    "Advice generated by {} ({} tokens)",
                    self.llm.provider_name(),
                    response.usage.total_tokens
                );
                AdviceOutcome::Generated(Advice {
                    text: response.content.trim().to_string(),
                    mode,
                    chunks,
                })
            }
            Err(e) => {
                tracing::error!("Completion failed: {}", e);
                AdviceOutcome::Failed(AdviceFailure::new(stage, e))
            }
        }
    }
}

/// First `max_chars` characters of `text`, marked when cut.
fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
