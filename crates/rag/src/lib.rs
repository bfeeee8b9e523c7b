//! Retrieval-augmented advice for the MyTherapy engine.
//!
//! - CSV corpus loading
//! - Embedding providers (trigram, Ollama, OpenAI)
//! - Exact L2 vector index and id-to-text metadata map
//! - Offline index build
//! - Query-time retrieval with a degraded mode
//! - Advice generation with retrieval-augmented and fallback prompts

pub mod advice;
pub mod builder;
pub mod corpus;
pub mod embeddings;
pub mod index;
pub mod metadata;
pub mod retriever;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use advice::{
    Advice, AdviceFailure, AdviceGenerator, AdviceMode, AdviceOptions, AdviceOutcome, FailureStage,
};
pub use builder::{build_from_corpus, build_index};
pub use corpus::{load_corpus, read_corpus};
pub use embeddings::{create_provider, EmbeddingProvider};
pub use index::{FlatL2Index, Neighbor};
pub use metadata::MetadataMap;
pub use retriever::{RetrievalContext, Retriever};
pub use types::{BuildStats, Corpus, Document, IndexStats, RetrievedChunk};

use mytherapy_core::{AppConfig, AppError, AppResult};

/// Describe the persisted index of the configured vectors directory.
pub fn index_stats(config: &AppConfig) -> AppResult<IndexStats> {
    let index_path = config.index_path();
    let metadata_path = config.metadata_path();

    if !index_path.exists() {
        return Err(AppError::Index(format!(
            "No index at {:?}. Run 'mytherapy index build' first.",
            index_path
        )));
    }

    let index = FlatL2Index::load(&index_path)?;
    let metadata = MetadataMap::load(&metadata_path)?;

    let file_size = |path: &std::path::Path| std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    Ok(IndexStats {
        vectors: index.len(),
        metadata_entries: metadata.len(),
        dimension: index.dimension(),
        index_size_bytes: file_size(&index_path),
        metadata_size_bytes: file_size(&metadata_path),
        index_path,
        metadata_path,
    })
}
