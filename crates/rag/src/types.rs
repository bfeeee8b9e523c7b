//! Retrieval and index type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A single corpus entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Position in the loaded sequence; also the index id of its vector
    pub id: usize,

    /// Document text, unchanged from the corpus
    pub text: String,
}

/// The loaded corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    /// Documents in corpus order, ids `0..len`
    pub documents: Vec<Document>,

    /// Rows skipped because the text field was missing or blank
    pub dropped_rows: usize,
}

impl Corpus {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Document texts in id order.
    pub fn texts(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.text.clone()).collect()
    }
}

/// A retrieved document with its distance to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// Index id
    pub id: usize,

    /// Squared L2 distance to the query vector (lower is closer)
    pub distance: f32,

    /// Document text from the metadata map
    pub text: String,
}

/// Outcome of an index build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildStats {
    /// Number of documents indexed
    pub documents: usize,

    /// Corpus rows dropped for a missing or blank text field
    pub dropped_rows: usize,

    /// Vector dimension
    pub dimension: usize,

    /// Embedding provider and model used
    pub provider: String,
    pub model: String,

    /// Written artifacts
    pub index_path: PathBuf,
    pub metadata_path: PathBuf,

    pub built_at: DateTime<Utc>,
    pub duration_secs: f64,
}

/// Description of the persisted artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Vectors in the index
    pub vectors: usize,

    /// Entries in the metadata map
    pub metadata_entries: usize,

    /// Vector dimension
    pub dimension: usize,

    pub index_path: PathBuf,
    pub index_size_bytes: u64,
    pub metadata_path: PathBuf,
    pub metadata_size_bytes: u64,
}
