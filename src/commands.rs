use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::config::Config;
use crate::embeddings::OllamaClient;
use crate::indexer::Indexer;
use crate::search::SearchEngine;
use crate::store::load_manifest;

fn build_client(config: &Config, model: Option<&str>) -> Result<OllamaClient> {
    let mut ollama = config.ollama.clone();
    if let Some(model) = model {
        ollama.model = model.to_string();
    }
    OllamaClient::new(&ollama).context("Failed to initialize Ollama client")
}

/// Rebuild the store at `store_path` from the corpus under `corpus_root`
#[inline]
pub fn ingest(
    config: &Config,
    corpus_root: &Path,
    store_path: &Path,
    model: Option<&str>,
) -> Result<()> {
    let client = build_client(config, model)?;

    // Fail fast with a clear message instead of erroring mid-pipeline
    client
        .health_check()
        .context("Embedding provider is not reachable; is `ollama serve` running?")?;

    let indexer = Indexer::new(&client, config.chunking.clone(), config.corpus.clone())?
        .with_batch_size(config.ollama.batch_size as usize)
        .with_progress(true);

    let stats = indexer.ingest(corpus_root, store_path)?;

    println!(
        "Ingest complete: {} chunks from {} files (dimension {})",
        stats.chunks_indexed, stats.files_read, stats.dimension
    );
    if stats.files_skipped > 0 {
        println!("  Skipped {} unreadable files", stats.files_skipped);
    }

    Ok(())
}

/// Search the store and print one ranked hit per line
#[inline]
pub fn search(
    config: &Config,
    store_path: &Path,
    query: &str,
    k: usize,
    threshold: Option<f32>,
    model: Option<&str>,
) -> Result<()> {
    let client = build_client(config, model)?;

    info!("Searching {} for: {}", store_path.display(), query);
    let results = SearchEngine::new(&client).search(store_path, query, k, threshold)?;

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for hit in &results {
        let snippet: String = hit.text.replace('\n', " ").chars().take(300).collect();
        println!(
            "{:.4} | {} [{}:{}] | {}",
            hit.score, hit.source_path, hit.offset_start, hit.offset_end, snippet
        );
    }

    Ok(())
}

/// Print a summary of a persisted store from its manifest
#[inline]
pub fn show_status(store_path: &Path) -> Result<()> {
    let manifest = load_manifest(store_path)?;

    println!("Store: {}", store_path.display());
    println!("  Model: {}", manifest.model);
    println!("  Dimension: {}", manifest.dimension);
    println!("  Entries: {}", manifest.entry_count);
    println!(
        "  Created: {}",
        manifest.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    Ok(())
}

/// Print the active configuration as TOML
#[inline]
pub fn show_config(config: &Config) -> Result<()> {
    println!("Config file: {}", config.config_file_path().display());
    println!();

    let content =
        toml::to_string_pretty(config).context("Failed to serialize config to TOML")?;
    print!("{content}");

    Ok(())
}

/// Write the default configuration file, unless one already exists
#[inline]
pub fn init_config(config: &Config) -> Result<()> {
    let config_path = config.config_file_path();

    if config_path.exists() {
        println!("Config file already exists: {}", config_path.display());
        return Ok(());
    }

    config.save()?;
    println!("Wrote default config: {}", config_path.display());

    Ok(())
}
