//! Query-time retrieval over the persisted index.
//!
//! A [`Retriever`] loads the index, the metadata map and the embedding
//! provider once. If any of them cannot be loaded it runs degraded and
//! every query returns no chunks, so advice falls back to the context-free
//! prompt instead of failing.

use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::index::FlatL2Index;
use crate::metadata::MetadataMap;
use crate::types::RetrievedChunk;
use mytherapy_core::{AppConfig, AppError, AppResult};
use std::path::Path;
use std::sync::Arc;

/// Loaded retrieval state. Immutable and shared across concurrent queries.
#[derive(Debug)]
pub struct RetrievalContext {
    index: FlatL2Index,
    metadata: MetadataMap,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl RetrievalContext {
    pub fn new(
        index: FlatL2Index,
        metadata: MetadataMap,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> AppResult<Self> {
        if embedder.dimensions() != index.dimension() {
            return Err(AppError::Index(format!(
                "Embedding provider '{}' produces {} dimensions but the index has {}",
                embedder.provider_name(),
                embedder.dimensions(),
                index.dimension()
            )));
        }

        Ok(Self {
            index,
            metadata,
            embedder,
        })
    }

    /// Load both artifacts from disk.
    pub fn from_paths(
        index_path: &Path,
        metadata_path: &Path,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> AppResult<Self> {
        let index = FlatL2Index::load(index_path)?;
        let metadata = MetadataMap::load(metadata_path)?;

        if metadata.len() != index.len() {
            tracing::warn!(
                "Index has {} vectors but metadata has {} entries",
                index.len(),
                metadata.len()
            );
        }

        Self::new(index, metadata, embedder)
    }

    /// Load the configured artifacts and embedding provider.
    pub async fn load(config: &AppConfig) -> AppResult<Self> {
        let api_key = config.resolve_embedding_api_key();
        let embedder = create_provider(&config.rag.embedding, api_key.as_deref()).await?;
        Self::from_paths(&config.index_path(), &config.metadata_path(), embedder)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Nearest documents to `query`, closest first.
    ///
    /// Ids with no metadata entry are skipped, so fewer than `top_k`
    /// chunks may come back.
    pub async fn search(&self, query: &str, top_k: usize) -> AppResult<Vec<RetrievedChunk>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed(query).await?;
        let neighbors = self.index.search(&query_vector, top_k)?;

        let chunks = neighbors
            .into_iter()
            .filter_map(|n| match self.metadata.get(n.id) {
                Some(text) => Some(RetrievedChunk {
                    id: n.id,
                    distance: n.distance,
                    text: text.to_string(),
                }),
                None => {
                    tracing::debug!("No metadata for index id {}, skipping", n.id);
                    None
                }
            })
            .collect();

        Ok(chunks)
    }
}

/// Retrieval entry point; either ready or degraded.
#[derive(Debug, Clone, Default)]
pub struct Retriever {
    context: Option<Arc<RetrievalContext>>,
}

impl Retriever {
    /// Load retrieval state, degrading instead of failing.
    pub async fn load(config: &AppConfig) -> Self {
        match RetrievalContext::load(config).await {
            Ok(context) => {
                tracing::info!(
                    "Retriever ready: {} documents from {:?}",
                    context.len(),
                    config.vectors_dir()
                );
                Self::from_context(context)
            }
            Err(e) => {
                tracing::warn!("Failed to load vector index or metadata, retrieval disabled: {}", e);
                Self::degraded()
            }
        }
    }

    pub fn from_context(context: RetrievalContext) -> Self {
        Self {
            context: Some(Arc::new(context)),
        }
    }

    /// Retriever that always returns nothing.
    pub fn degraded() -> Self {
        Self { context: None }
    }

    pub fn is_degraded(&self) -> bool {
        self.context.is_none()
    }

    /// Up to `top_k` document texts nearest to `query`, closest first.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> AppResult<Vec<String>> {
        Ok(self
            .retrieve_scored(query, top_k)
            .await?
            .into_iter()
            .map(|c| c.text)
            .collect())
    }

    /// Like [`Retriever::retrieve`], keeping ids and distances.
    pub async fn retrieve_scored(&self, query: &str, top_k: usize) -> AppResult<Vec<RetrievedChunk>> {
        match &self.context {
            Some(context) => context.search(query, top_k).await,
            None => Ok(Vec::new()),
        }
    }
}
