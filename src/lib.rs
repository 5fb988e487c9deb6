use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Chunk {ordinal} embedded to a zero-norm vector")]
    ZeroVector { ordinal: usize },

    #[error("Embedding model mismatch: store was built with '{store_model}', query uses '{query_model}'")]
    ModelMismatch {
        store_model: String,
        query_model: String,
    },

    #[error("Invalid k: {0} (must be at least 1)")]
    InvalidK(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod chunking;
pub mod commands;
pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod index;
pub mod indexer;
pub mod search;
pub mod store;
