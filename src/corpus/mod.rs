// Corpus reading module
// Walks a directory tree and loads every accepted file as a UTF-8 document


use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::RagError;
use crate::config::ConfigError;

/// One source file successfully read from the corpus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Path relative to the corpus root
    pub rel_path: String,
    pub text: String,
}

/// Which files a corpus walk picks up
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CorpusConfig {
    /// Accepted file extensions, without the leading dot
    pub extensions: Vec<String>,
}

impl Default for CorpusConfig {
    #[inline]
    fn default() -> Self {
        Self {
            extensions: vec!["md".to_string(), "txt".to_string(), "py".to_string()],
        }
    }
}

impl CorpusConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for ext in &self.extensions {
            if ext.is_empty()
                || ext.starts_with('.')
                || ext.contains('/')
                || ext.contains('\\')
            {
                return Err(ConfigError::InvalidExtension(ext.clone()));
            }
        }
        Ok(())
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.extensions
                    .iter()
                    .any(|accepted| accepted.eq_ignore_ascii_case(ext))
            })
    }
}

/// Outcome counters for one corpus walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorpusStats {
    pub files_read: usize,
    pub files_skipped: usize,
}

/// Walk `root` and read every file matching the accepted extension set.
///
/// Files that cannot be read or are not valid UTF-8 are skipped with a
/// warning and the walk continues. Documents come back in a stable
/// lexicographic order, so repeated runs over an unchanged corpus see the
/// same sequence. An empty result is valid, not an error.
#[inline]
pub fn read_corpus(root: &Path, config: &CorpusConfig) -> Result<(Vec<Document>, CorpusStats)> {
    if !root.is_dir() {
        return Err(
            RagError::Config(format!("Corpus directory not found: {}", root.display())).into(),
        );
    }

    let mut documents = Vec::new();
    let mut stats = CorpusStats::default();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable directory entry: {}", e);
                stats.files_skipped += 1;
                continue;
            }
        };

        if !entry.file_type().is_file() || !config.accepts(entry.path()) {
            continue;
        }

        match fs::read_to_string(entry.path()) {
            Ok(text) => {
                let rel_path = entry
                    .path()
                    .strip_prefix(root)
                    .unwrap_or_else(|_| entry.path())
                    .to_string_lossy()
                    .into_owned();
                debug!("Read {} ({} bytes)", rel_path, text.len());
                documents.push(Document { rel_path, text });
                stats.files_read += 1;
            }
            Err(e) => {
                warn!("Skipping file {}: {}", entry.path().display(), e);
                stats.files_skipped += 1;
            }
        }
    }

    info!(
        "Corpus walk finished: {} files read, {} skipped",
        stats.files_read, stats.files_skipped
    );

    Ok((documents, stats))
}
