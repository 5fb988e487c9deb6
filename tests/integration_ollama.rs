#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// Integration tests that require a local Ollama instance.
// Run with: cargo test --test integration_ollama -- --ignored
//
// Requirements:
// - Ollama server running on localhost:11434 (or set OLLAMA_HOST/OLLAMA_PORT)
// - mxbai-embed-large model pulled (or set OLLAMA_MODEL)

use std::env;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

use ragdex::chunking::ChunkingConfig;
use ragdex::config::OllamaConfig;
use ragdex::corpus::CorpusConfig;
use ragdex::embeddings::{EmbeddingProvider, OllamaClient};
use ragdex::indexer::Indexer;
use ragdex::search::SearchEngine;

const DEFAULT_OLLAMA_HOST: &str = "localhost";
const DEFAULT_OLLAMA_PORT: u16 = 11434;
const DEFAULT_MODEL: &str = "mxbai-embed-large";

fn create_integration_test_client() -> OllamaClient {
    let host = env::var("OLLAMA_HOST").unwrap_or_else(|_| DEFAULT_OLLAMA_HOST.to_string());
    let port = env::var("OLLAMA_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_OLLAMA_PORT);
    let model = env::var("OLLAMA_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

    let config = OllamaConfig {
        protocol: "http".to_string(),
        host,
        port,
        model,
        batch_size: 5,
    };

    OllamaClient::new(&config)
        .expect("Failed to create Ollama client")
        .with_timeout(Duration::from_secs(120))
        .with_retry_attempts(3)
}

fn init_test_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init()
        .ok();
}

#[test]
#[ignore = "requires a local Ollama instance"]
fn real_ollama_ping() {
    init_test_tracing();

    let client = create_integration_test_client();
    client.ping().expect("Ollama server should be reachable");
}

#[test]
#[ignore = "requires a local Ollama instance"]
fn real_ollama_embeds_batches_in_order() {
    init_test_tracing();

    let client = create_integration_test_client();
    let texts: Vec<String> = (0..12)
        .map(|i| format!("test sentence number {i} about embeddings"))
        .collect();

    let vectors = client
        .embed_batch(&texts)
        .expect("batch embedding should succeed");

    assert_eq!(vectors.len(), texts.len());
    let dimension = vectors[0].len();
    assert!(dimension > 0);
    assert!(vectors.iter().all(|v| v.len() == dimension));

    // Identical input must embed identically regardless of batch position
    let again = client
        .embed_batch(&texts[..1].to_vec())
        .expect("single embedding should succeed");
    assert_eq!(again[0], vectors[0]);
}

#[test]
#[ignore = "requires a local Ollama instance"]
fn real_ollama_end_to_end_self_retrieval() {
    init_test_tracing();

    let client = create_integration_test_client();
    let temp_dir = TempDir::new().expect("should create temp dir");
    let corpus = temp_dir.path().join("corpus");
    fs::create_dir_all(&corpus).expect("should create corpus dir");
    fs::write(
        corpus.join("fox.txt"),
        "The quick brown fox jumps over the lazy dog",
    )
    .expect("should write corpus file");
    fs::write(
        corpus.join("other.txt"),
        "An entirely different document about databases",
    )
    .expect("should write corpus file");

    let store_path = temp_dir.path().join("store");
    Indexer::new(&client, ChunkingConfig::default(), CorpusConfig::default())
        .expect("configs should validate")
        .ingest(&corpus, &store_path)
        .expect("ingest should succeed");

    let results = SearchEngine::new(&client)
        .search(&store_path, "quick brown fox", 1, None)
        .expect("search should succeed");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].source_path, "fox.txt");
}
