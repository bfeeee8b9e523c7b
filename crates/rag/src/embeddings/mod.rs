//! Embedding providers.
//!
//! One provider embeds both the corpus at build time and queries at
//! retrieval time.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
pub use providers::{OllamaProvider, OpenAiProvider, TrigramProvider};
