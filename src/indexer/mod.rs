// Ingest pipeline module
// Drives corpus reading, chunking, embedding, index assembly and the final
// atomic store write


use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::{info, warn};

use crate::RagError;
use crate::chunking::{ChunkingConfig, chunk_document};
use crate::corpus::{CorpusConfig, read_corpus};
use crate::embeddings::EmbeddingProvider;
use crate::index::{FlatIpIndex, IndexBuilder};
use crate::search::SearchEngine;
use crate::store::{MetadataRecord, write_store};

const DEFAULT_EMBED_BATCH_SIZE: usize = 32;

/// Outcome of one ingest run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub files_read: usize,
    pub files_skipped: usize,
    pub chunks_indexed: usize,
    pub dimension: usize,
}

/// One-shot ingest pipeline: full rebuild of a store from a corpus.
///
/// The embedding provider is injected, so the same pipeline runs against a
/// live Ollama server or an offline deterministic embedder.
pub struct Indexer<'a> {
    embedder: &'a dyn EmbeddingProvider,
    chunking: ChunkingConfig,
    corpus: CorpusConfig,
    batch_size: usize,
    show_progress: bool,
}

impl<'a> Indexer<'a> {
    #[inline]
    pub fn new(
        embedder: &'a dyn EmbeddingProvider,
        chunking: ChunkingConfig,
        corpus: CorpusConfig,
    ) -> Result<Self> {
        chunking.validate().context("Invalid chunking configuration")?;
        corpus.validate().context("Invalid corpus configuration")?;

        Ok(Self {
            embedder,
            chunking,
            corpus,
            batch_size: DEFAULT_EMBED_BATCH_SIZE,
            show_progress: false,
        })
    }

    /// How many chunks go to the embedding provider per call
    #[inline]
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Draw an indicatif progress bar over the embedding phase
    #[inline]
    #[must_use]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Rebuild the store at `store_path` from the corpus under `corpus_root`.
    ///
    /// Any previous store contents are replaced wholesale; a failure at any
    /// stage aborts the run and leaves the previous store untouched. Per-file
    /// read failures are warnings, everything else is fatal.
    #[inline]
    pub fn ingest(&self, corpus_root: &Path, store_path: &Path) -> Result<IngestStats> {
        info!(
            "Starting ingest: corpus {}, store {}",
            corpus_root.display(),
            store_path.display()
        );

        let (documents, corpus_stats) = read_corpus(corpus_root, &self.corpus)?;

        let mut records = Vec::new();
        for document in &documents {
            for chunk in chunk_document(&document.text, &self.chunking) {
                records.push(MetadataRecord {
                    id: records.len(),
                    source_path: document.rel_path.clone(),
                    chunk_ordinal: chunk.ordinal,
                    offset_start: chunk.start_char,
                    offset_end: chunk.end_char,
                    text: chunk.text,
                });
            }
        }

        info!(
            "Prepared {} chunks from {} documents",
            records.len(),
            documents.len()
        );

        let index = self.embed_all(&records)?;
        let dimension = index.dimension();

        write_store(store_path, &index, &records, self.embedder.model())?;

        self.self_check(store_path, &records);

        Ok(IngestStats {
            files_read: corpus_stats.files_read,
            files_skipped: corpus_stats.files_skipped,
            chunks_indexed: records.len(),
            dimension,
        })
    }

    /// Embed every chunk batch by batch and assemble the normalized matrix.
    ///
    /// Batches are issued sequentially in chunk order, so the row order of
    /// the matrix is the record order by construction.
    fn embed_all(&self, records: &[MetadataRecord]) -> Result<FlatIpIndex> {
        let progress = if self.show_progress {
            let bar = ProgressBar::new(records.len() as u64);
            bar.set_style(
                ProgressStyle::with_template(
                    "{bar:40.cyan/blue} {pos}/{len} chunks embedded ({eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        let mut builder = IndexBuilder::new();

        for batch in records.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|r| r.text.clone()).collect();

            let vectors = self
                .embedder
                .embed_batch(&texts)
                .context("Embedding provider failed, aborting ingest")?;

            if vectors.len() != texts.len() {
                return Err(RagError::Embedding(format!(
                    "Provider returned {} vectors for {} texts",
                    vectors.len(),
                    texts.len()
                ))
                .into());
            }

            builder.add(vectors)?;
            progress.inc(batch.len() as u64);
        }

        progress.finish_and_clear();
        Ok(builder.finalize())
    }

    /// Lightweight sanity probe after ingest: search the fresh store for a
    /// word taken from the first chunk. Failures only warn.
    fn self_check(&self, store_path: &Path, records: &[MetadataRecord]) {
        let Some(first) = records.first() else {
            return;
        };

        let sample = first
            .text
            .split_whitespace()
            .map(|word| word.trim_matches(|c: char| c.is_ascii_punctuation()))
            .find(|word| word.chars().count() >= 4);

        let Some(word) = sample else {
            return;
        };

        match SearchEngine::new(self.embedder).search(store_path, word, 1, None) {
            Ok(results) => {
                if let Some(hit) = results.first() {
                    info!(
                        "Self-check: query '{}' returned {} (score={:.4})",
                        word, hit.source_path, hit.score
                    );
                } else {
                    warn!("Self-check: query '{}' returned no results", word);
                }
            }
            Err(e) => warn!("Self-check failed: {}", e),
        }
    }
}
