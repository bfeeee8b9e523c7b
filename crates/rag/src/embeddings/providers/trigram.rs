//! Trigram embedding provider: deterministic, offline, content-aware vectors.

use crate::embeddings::provider::EmbeddingProvider;
use mytherapy_core::{AppError, AppResult};
use std::collections::{HashMap, HashSet};
use unicode_segmentation::UnicodeSegmentation;

const MODEL_NAME: &str = "trigram-v1";

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "i'm", "i've", "i'll", "i'd", "you", "your", "she",
    "her", "him", "his", "our", "not", "just", "very", "really",
];

/// Trigram-based embedding provider for local, offline operation.
///
/// Each significant word contributes its character trigrams and the whole
/// word to hashed buckets, weighted by frequency, and the result is scaled
/// to unit length. Texts that share vocabulary end up close in L2 space.
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
    stop_words: HashSet<&'static str>,
}

impl TrigramProvider {
    /// Create a new trigram provider with specified dimensions.
    pub fn new(dimensions: usize) -> AppResult<Self> {
        if dimensions == 0 {
            return Err(AppError::Embedding(
                "Trigram dimensions must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            dimensions,
            stop_words: STOP_WORDS.iter().copied().collect(),
        })
    }

    /// Lowercased significant words of `text`.
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.unicode_words()
            .map(|w| w.to_lowercase().replace('\u{2019}', "'"))
            .filter(|w| w.chars().count() > 2 && !self.stop_words.contains(w.as_str()))
            .collect()
    }

    fn bucket(&self, token: &str, multiplier: u64) -> usize {
        let hash = token
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(multiplier).wrapping_add(b as u64));
        (hash % self.dimensions as u64) as usize
    }

    /// Generate a trigram-based embedding for text.
    fn generate_trigram_embedding(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dimensions];

        let mut word_freq: HashMap<String, usize> = HashMap::new();
        for word in self.tokenize(text) {
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                let idx = self.bucket(&trigram, 37);
                embedding[idx] += (*freq as f32).sqrt();
            }

            let idx = self.bucket(word, 31);
            embedding[idx] += *freq as f32;
        }

        // Unit length; empty input stays the zero vector
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| self.generate_trigram_embedding(text))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    fn l2(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let err = TrigramProvider::new(0).unwrap_err();
        assert!(matches!(err, mytherapy_core::AppError::Embedding(_)));
    }

    #[test]
    fn test_tokenize_drops_short_and_stop_words() {
        let provider = TrigramProvider::new(64).unwrap();
        assert_eq!(provider.tokenize("I'm scared of my EXAM"), vec!["scared", "exam"]);
        assert_eq!(provider.tokenize("I\u{2019}m fine"), vec!["fine"]);
    }

    #[tokio::test]
    async fn test_trigram_provider_embed_batch() {
        let provider = TrigramProvider::new(384).unwrap();
        let texts = vec![
            "I feel anxious about exams".to_string(),
            "My partner and I argue constantly".to_string(),
            "Trouble sleeping lately".to_string(),
        ];

        let embeddings = provider.embed_batch(&texts).await.unwrap();

        assert_eq!(embeddings.len(), 3);
        for embedding in &embeddings {
            assert_eq!(embedding.len(), 384);
            assert!((norm(embedding) - 1.0).abs() < 0.001);
        }
    }

    #[tokio::test]
    async fn test_trigram_provider_deterministic() {
        let provider = TrigramProvider::new(384).unwrap();
        let text = "deterministic test";

        let embedding1 = provider.embed(text).await.unwrap();
        let embedding2 = provider.embed(text).await.unwrap();

        assert_eq!(embedding1, embedding2);
    }

    #[tokio::test]
    async fn test_shared_vocabulary_is_closer() {
        let provider = TrigramProvider::new(384).unwrap();

        let query = provider.embed("scared about my exam").await.unwrap();
        let related = provider.embed("exam stress keeps me awake").await.unwrap();
        let unrelated = provider.embed("I feel happy today").await.unwrap();

        assert!(l2(&query, &related) < l2(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_trigram_provider_empty_text() {
        let provider = TrigramProvider::new(384).unwrap();
        let embedding = provider.embed("").await.unwrap();

        assert_eq!(embedding.len(), 384);
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_trigram_provider_utf8_safety() {
        let provider = TrigramProvider::new(384).unwrap();

        let text = "Ansiedade é difícil 😟 durante provas";
        let embedding = provider.embed(text).await.unwrap();

        assert_eq!(embedding.len(), 384);
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }
}
