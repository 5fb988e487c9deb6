// Search module
// Embeds a query and scores it against a loaded store snapshot


use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

use crate::RagError;
use crate::embeddings::EmbeddingProvider;
use crate::index::normalize_l2;
use crate::store::Store;

/// One ranked hit, already joined with its metadata record
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub score: f32,
    pub source_path: String,
    pub chunk_ordinal: usize,
    pub offset_start: usize,
    pub offset_end: usize,
    pub text: String,
}

/// Read-only query front over a persisted store.
///
/// Loads the store snapshot fresh per call and never mutates it, so any
/// number of searches can run against the same store concurrently.
pub struct SearchEngine<'a> {
    embedder: &'a dyn EmbeddingProvider,
}

impl<'a> SearchEngine<'a> {
    #[inline]
    #[must_use]
    pub fn new(embedder: &'a dyn EmbeddingProvider) -> Self {
        Self { embedder }
    }

    /// Return the top `k` chunks for `query`, best score first.
    ///
    /// `k` must be at least 1 and is clamped to the store size. The store's
    /// recorded model must match the provider's; vectors from different
    /// models are not comparable. An empty store yields an empty result
    /// list. `threshold`, when set, drops hits scoring below it.
    #[inline]
    pub fn search(
        &self,
        store_path: &Path,
        query: &str,
        k: usize,
        threshold: Option<f32>,
    ) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Err(RagError::InvalidK(k).into());
        }

        let store = Store::open(store_path)?;

        if store.manifest.model != self.embedder.model() {
            return Err(RagError::ModelMismatch {
                store_model: store.manifest.model.clone(),
                query_model: self.embedder.model().to_string(),
            }
            .into());
        }

        if store.is_empty() {
            debug!("Store {} is empty, returning no results", store_path.display());
            return Ok(Vec::new());
        }

        let texts = [query.to_string()];
        let mut vectors = self
            .embedder
            .embed_batch(&texts)
            .context("Failed to embed query")?;

        if vectors.len() != 1 {
            return Err(RagError::Embedding(format!(
                "Provider returned {} vectors for one query",
                vectors.len()
            ))
            .into());
        }
        let mut query_vector = vectors.remove(0);

        if query_vector.len() != store.manifest.dimension {
            return Err(RagError::DimensionMismatch {
                expected: store.manifest.dimension,
                actual: query_vector.len(),
            }
            .into());
        }

        if !normalize_l2(&mut query_vector) {
            return Err(
                RagError::Embedding("Query embedded to a zero-norm vector".to_string()).into(),
            );
        }

        let scored = store.index.search(&query_vector, k);

        let results = scored
            .into_iter()
            .filter(|hit| threshold.is_none_or(|t| hit.score >= t))
            .map(|hit| {
                let record = &store.records[hit.ordinal];
                SearchResult {
                    score: hit.score,
                    source_path: record.source_path.clone(),
                    chunk_ordinal: record.chunk_ordinal,
                    offset_start: record.offset_start,
                    offset_end: record.offset_end,
                    text: record.text.clone(),
                }
            })
            .collect();

        Ok(results)
    }
}
