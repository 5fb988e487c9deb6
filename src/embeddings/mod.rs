// Embeddings module
// Boundary to the embedding provider: one vector per text, input order

pub mod mock;
pub mod ollama;

pub use mock::MockEmbedder;
pub use ollama::OllamaClient;

use anyhow::Result;

/// Contract to an embedding provider.
///
/// Implementations must return exactly one vector per input text, in input
/// order, with a stable dimension for a given model. Provider failures must
/// surface as hard errors, never as a short or reordered batch.
pub trait EmbeddingProvider {
    /// Identifier of the embedding model behind this provider
    fn model(&self) -> &str;

    /// Embed a batch of texts, preserving input order
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
