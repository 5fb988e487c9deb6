// Content chunking module
// Splits document text into bounded, optionally overlapping character windows


use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// A bounded span of a document's text, the unit that gets embedded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position of this chunk within its document
    pub ordinal: usize,
    /// Start of the half-open character range this chunk was cut from
    pub start_char: usize,
    /// End of the half-open character range (exclusive)
    pub end_char: usize,
    pub text: String,
}

/// Configuration for the sliding chunk window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window size in characters
    pub chunk_size: usize,
    /// Characters shared between adjacent windows
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 900,
            overlap: 150,
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize(self.chunk_size));
        }

        // The window must advance, otherwise the iterator never terminates
        if self.overlap >= self.chunk_size {
            return Err(ConfigError::OverlapTooLarge(self.overlap, self.chunk_size));
        }

        Ok(())
    }
}

/// Lazy iterator over the chunk windows of one document.
///
/// Windows cover the text end-to-end with no gaps. Adjacent windows share
/// `overlap` characters when configured. The iterator stops at the first
/// window that reaches end-of-text, so a trailing window is never a pure
/// suffix of its predecessor. A document shorter than one window yields
/// exactly one chunk spanning the whole document; an empty document yields
/// no chunks.
#[derive(Debug, Clone)]
pub struct ChunkIter<'a> {
    text: &'a str,
    /// Byte offset of every char boundary, with `text.len()` as sentinel
    boundaries: Vec<usize>,
    chunk_size: usize,
    step: usize,
    next_start: usize,
    ordinal: usize,
    done: bool,
}

impl<'a> ChunkIter<'a> {
    fn char_count(&self) -> usize {
        self.boundaries.len() - 1
    }
}

impl Iterator for ChunkIter<'_> {
    type Item = Chunk;

    #[inline]
    fn next(&mut self) -> Option<Chunk> {
        if self.done || self.next_start >= self.char_count() {
            return None;
        }

        let start = self.next_start;
        let end = (start + self.chunk_size).min(self.char_count());

        // Boundaries are char boundaries by construction, so slicing is safe
        #[expect(clippy::string_slice, reason = "indices come from char_indices")]
        let text = self.text[self.boundaries[start]..self.boundaries[end]].to_string();

        let chunk = Chunk {
            ordinal: self.ordinal,
            start_char: start,
            end_char: end,
            text,
        };

        self.ordinal += 1;
        if end == self.char_count() {
            self.done = true;
        } else {
            self.next_start = start + self.step;
        }

        Some(chunk)
    }
}

/// Cut `text` into chunk windows according to `config`.
///
/// Offsets are character offsets (not bytes), matching what the metadata
/// records persist. The returned iterator is finite and can be recreated at
/// any time for the same document.
#[inline]
pub fn chunk_document<'a>(text: &'a str, config: &ChunkingConfig) -> ChunkIter<'a> {
    let boundaries = text
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()))
        .collect();

    ChunkIter {
        text,
        boundaries,
        chunk_size: config.chunk_size.max(1),
        // Validated configs always advance; saturate anyway so an unchecked
        // config can never stall the iterator
        step: config.chunk_size.saturating_sub(config.overlap).max(1),
        next_start: 0,
        ordinal: 0,
        done: false,
    }
}
