//! Deterministic in-memory embedder.
//!
//! Maps each whitespace token to a hashed bucket, so identical texts always
//! produce identical vectors and texts sharing words land near each other.
//! Lets the ingest and search pipelines run without a live Ollama server.

use std::hash::{DefaultHasher, Hash, Hasher};

use anyhow::Result;

use crate::embeddings::EmbeddingProvider;

const DEFAULT_DIMENSIONS: usize = 384;

/// Bag-of-words feature-hashing embedder with a fixed dimension.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    model: String,
    dimensions: usize,
}

impl MockEmbedder {
    #[inline]
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            model: "mock-embed".to_string(),
            dimensions,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    #[inline]
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];

        for token in text.split_whitespace() {
            let token = token.to_lowercase();
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let bucket = (hasher.finish() % self.dimensions as u64) as usize;
            embedding[bucket] += 1.0;
        }

        embedding
    }
}

impl Default for MockEmbedder {
    #[inline]
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

impl EmbeddingProvider for MockEmbedder {
    #[inline]
    fn model(&self) -> &str {
        &self.model
    }

    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let embedder = MockEmbedder::new(128);
        let a = embedder.embed("the quick brown fox");
        let b = embedder.embed("the quick brown fox");
        assert_eq!(a, b, "same input should produce same output");
    }

    #[test]
    fn different_inputs_differ() {
        let embedder = MockEmbedder::new(128);
        let a = embedder.embed("hello world");
        let b = embedder.embed("goodbye moon");
        assert_ne!(a, b);
    }

    #[test]
    fn shared_words_score_closer() {
        let embedder = MockEmbedder::new(256);
        let base = embedder.embed("the quick brown fox");
        let near = embedder.embed("quick brown fox");
        let far = embedder.embed("jumps over the lazy dog");

        let dot = |x: &[f32], y: &[f32]| -> f32 { x.iter().zip(y).map(|(a, b)| a * b).sum() };
        let norm = |x: &[f32]| -> f32 { dot(x, x).sqrt() };

        let cos_near = dot(&base, &near) / (norm(&base) * norm(&near));
        let cos_far = dot(&base, &far) / (norm(&base) * norm(&far));
        assert!(cos_near > cos_far);
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let embedder = MockEmbedder::new(64);
        let vector = embedder.embed("");
        assert!(vector.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn batch_preserves_order_and_count() {
        let embedder = MockEmbedder::new(64);
        let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let vectors = embedder.embed_batch(&texts).expect("mock embed never fails");
        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors[0], embedder.embed("a"));
        assert_eq!(vectors[2], embedder.embed("c"));
    }
}
