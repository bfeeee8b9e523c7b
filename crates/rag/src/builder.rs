//! Offline index build: corpus -> embeddings -> index + metadata artifacts.

use crate::corpus::load_corpus;
use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::index::FlatL2Index;
use crate::metadata::MetadataMap;
use crate::types::{BuildStats, Corpus};
use chrono::Utc;
use mytherapy_core::{AppConfig, AppError, AppResult};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Build the index for the configured corpus and embedding provider.
///
/// Any failure aborts the build; existing artifacts are only replaced once
/// every document has been embedded.
pub async fn build_index(config: &AppConfig) -> AppResult<BuildStats> {
    let corpus = load_corpus(&config.corpus_path(), &config.rag.text_column)?;

    let api_key = config.resolve_embedding_api_key();
    let provider = create_provider(&config.rag.embedding, api_key.as_deref()).await?;

    build_from_corpus(
        &corpus,
        provider.as_ref(),
        &config.index_path(),
        &config.metadata_path(),
    )
    .await
}

/// Embed every document of `corpus` and persist the index and metadata map.
pub async fn build_from_corpus(
    corpus: &Corpus,
    provider: &dyn EmbeddingProvider,
    index_path: &Path,
    metadata_path: &Path,
) -> AppResult<BuildStats> {
    let start = Instant::now();

    if corpus.is_empty() {
        return Err(AppError::Corpus(
            "Corpus has no usable documents; nothing to index".to_string(),
        ));
    }

    tracing::info!(
        "Embedding {} documents with provider '{}' (model: {})",
        corpus.len(),
        provider.provider_name(),
        provider.model_name()
    );

    let embeddings = provider.embed_batch(&corpus.texts()).await?;

    if embeddings.len() != corpus.len() {
        return Err(AppError::Embedding(format!(
            "Provider returned {} embeddings for {} documents",
            embeddings.len(),
            corpus.len()
        )));
    }

    let mut index = FlatL2Index::new(provider.dimensions())?;
    for (document, embedding) in corpus.documents.iter().zip(&embeddings) {
        let id = index.add(embedding)?;
        debug_assert_eq!(id, document.id);
    }

    let metadata = MetadataMap::from_documents(&corpus.documents);

    persist(&index, &metadata, index_path, metadata_path)?;

    let duration = start.elapsed();

    tracing::info!(
        "Index built: {} vectors of dimension {} in {:.2}s",
        index.len(),
        index.dimension(),
        duration.as_secs_f64()
    );

    Ok(BuildStats {
        documents: index.len(),
        dropped_rows: corpus.dropped_rows,
        dimension: index.dimension(),
        provider: provider.provider_name().to_string(),
        model: provider.model_name().to_string(),
        index_path: index_path.to_path_buf(),
        metadata_path: metadata_path.to_path_buf(),
        built_at: Utc::now(),
        duration_secs: duration.as_secs_f64(),
    })
}

/// Write both artifacts next to their targets, then move them into place.
///
/// A failed write leaves the previous index and metadata untouched.
fn persist(
    index: &FlatL2Index,
    metadata: &MetadataMap,
    index_path: &Path,
    metadata_path: &Path,
) -> AppResult<()> {
    let index_staging = staging_path(index_path);
    let metadata_staging = staging_path(metadata_path);

    let result: AppResult<()> = (|| {
        index.save(&index_staging)?;
        metadata.save(&metadata_staging)?;
        std::fs::rename(&metadata_staging, metadata_path)?;
        std::fs::rename(&index_staging, index_path)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(&index_staging);
        let _ = std::fs::remove_file(&metadata_staging);
    }

    result
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::read_corpus;
    use crate::tests::support::FixedEmbedder;
    use tempfile::TempDir;

    fn corpus(texts: &[&str]) -> Corpus {
        let mut csv = String::from("Context\n");
        for t in texts {
            csv.push_str(&format!("\"{}\"\n", t));
        }
        read_corpus(csv.as_bytes(), "Context").unwrap()
    }

    #[tokio::test]
    async fn test_writes_both_artifacts() {
        let temp = TempDir::new().unwrap();
        let index_path = temp.path().join("vectors/index.bin");
        let metadata_path = temp.path().join("vectors/metadata.json");
        let embedder = FixedEmbedder::new(2)
            .with("first", &[0.0, 1.0])
            .with("second", &[1.0, 0.0]);

        let stats = build_from_corpus(&corpus(&["first", "second"]), &embedder, &index_path, &metadata_path)
            .await
            .unwrap();

        assert_eq!(stats.documents, 2);
        assert_eq!(stats.dimension, 2);

        let index = FlatL2Index::load(&index_path).unwrap();
        assert_eq!(index.vector(1), Some(&[1.0, 0.0][..]));
        let metadata = MetadataMap::load(&metadata_path).unwrap();
        assert_eq!(metadata.get(0), Some("first"));
    }

    #[tokio::test]
    async fn test_empty_corpus_is_an_error() {
        let temp = TempDir::new().unwrap();
        let embedder = FixedEmbedder::new(2);

        let err = build_from_corpus(
            &Corpus::default(),
            &embedder,
            &temp.path().join("index.bin"),
            &temp.path().join("metadata.json"),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Corpus(_)));
    }

    #[tokio::test]
    async fn test_embedding_failure_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let index_path = temp.path().join("index.bin");
        let embedder = FixedEmbedder::new(2).with("known", &[1.0, 1.0]);

        let result = build_from_corpus(
            &corpus(&["known", "unknown"]),
            &embedder,
            &index_path,
            &temp.path().join("metadata.json"),
        )
        .await;

        assert!(result.is_err());
        assert!(!index_path.exists());
    }

    #[tokio::test]
    async fn test_metadata_write_failure_keeps_previous_index() {
        let temp = TempDir::new().unwrap();
        let index_path = temp.path().join("index.bin");
        let metadata_path = temp.path().join("metadata.json");
        let embedder = FixedEmbedder::new(1)
            .with("a", &[0.0])
            .with("b", &[1.0]);

        build_from_corpus(&corpus(&["a", "b"]), &embedder, &index_path, &metadata_path)
            .await
            .unwrap();

        // A file where the metadata directory should be
        let blocker = temp.path().join("blocked");
        std::fs::write(&blocker, "").unwrap();

        let result = build_from_corpus(
            &corpus(&["b"]),
            &embedder,
            &index_path,
            &blocker.join("metadata.json"),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(FlatL2Index::load(&index_path).unwrap().len(), 2);
        assert!(!staging_path(&index_path).exists());
    }

    #[tokio::test]
    async fn test_rebuild_overwrites() {
        let temp = TempDir::new().unwrap();
        let index_path = temp.path().join("index.bin");
        let metadata_path = temp.path().join("metadata.json");
        let embedder = FixedEmbedder::new(1)
            .with("a", &[0.0])
            .with("b", &[1.0])
            .with("c", &[2.0]);

        build_from_corpus(&corpus(&["a", "b", "c"]), &embedder, &index_path, &metadata_path)
            .await
            .unwrap();
        build_from_corpus(&corpus(&["c"]), &embedder, &index_path, &metadata_path)
            .await
            .unwrap();

        assert_eq!(FlatL2Index::load(&index_path).unwrap().len(), 1);
        assert_eq!(MetadataMap::load(&metadata_path).unwrap().get(0), Some("c"));
    }

    #[tokio::test]
    async fn test_build_index_from_config() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("train.csv"),
            "Context,Response\nExam stress,Breathe\nLonely at night,Call a friend\n",
        )
        .unwrap();

        let mut config = AppConfig {
            workspace: temp.path().to_path_buf(),
            ..Default::default()
        };
        config.rag.corpus_path = "train.csv".into();
        config.rag.embedding.dimensions = 64;

        let stats = build_index(&config).await.unwrap();

        assert_eq!(stats.documents, 2);
        assert_eq!(stats.provider, "trigram");
        assert!(config.index_path().exists());
        assert!(config.metadata_path().exists());
    }
}
