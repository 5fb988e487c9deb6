// Persisted store module
// On-disk layout: vectors.bin (dense f32 matrix) + meta.jsonl + manifest.json,
// replaced wholesale by each ingest through an atomic directory swap

#[cfg(test)]
mod tests;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::RagError;
use crate::index::FlatIpIndex;

pub const VECTORS_FILE: &str = "vectors.bin";
pub const META_FILE: &str = "meta.jsonl";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Store-level facts every reader needs before touching the matrix
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Manifest {
    /// Embedding model the store was built with; queries must use the same
    pub model: String,
    pub dimension: usize,
    pub entry_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Descriptive data for one indexed chunk.
///
/// Line N of meta.jsonl describes row N of vectors.bin; `id` is that shared
/// ordinal position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetadataRecord {
    pub id: usize,
    pub source_path: String,
    /// Position of the chunk within its source document
    pub chunk_ordinal: usize,
    pub offset_start: usize,
    pub offset_end: usize,
    pub text: String,
}

/// A fully loaded, immutable store snapshot
#[derive(Debug, Clone)]
pub struct Store {
    pub manifest: Manifest,
    pub index: FlatIpIndex,
    pub records: Vec<MetadataRecord>,
}

impl Store {
    /// Load a persisted store into memory, verifying ordinal alignment
    /// between the vector matrix and the metadata records.
    #[inline]
    pub fn open(path: &Path) -> Result<Self, RagError> {
        if !path.is_dir() {
            return Err(RagError::Store(format!(
                "Store not found: {}",
                path.display()
            )));
        }

        let manifest = load_manifest(path)?;

        let bytes = fs::read(path.join(VECTORS_FILE))?;
        if bytes.len() % size_of::<f32>() != 0 {
            return Err(RagError::Store(format!(
                "Vector file length {} is not a multiple of {}",
                bytes.len(),
                size_of::<f32>()
            )));
        }
        let data: Vec<f32> = bytemuck::pod_collect_to_vec(&bytes);
        let index = FlatIpIndex::from_parts(manifest.dimension, data)?;

        let records = load_records(&path.join(META_FILE))?;

        if records.len() != index.len() || records.len() != manifest.entry_count {
            return Err(RagError::Store(format!(
                "Ordinal alignment broken: {} metadata records, {} vectors, manifest says {}",
                records.len(),
                index.len(),
                manifest.entry_count
            )));
        }

        debug!(
            "Opened store {} ({} entries, dimension {}, model {})",
            path.display(),
            manifest.entry_count,
            manifest.dimension,
            manifest.model
        );

        Ok(Self {
            manifest,
            index,
            records,
        })
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Read just the manifest of a persisted store.
#[inline]
pub fn load_manifest(store_path: &Path) -> Result<Manifest, RagError> {
    let manifest_path = store_path.join(MANIFEST_FILE);
    if !manifest_path.is_file() {
        return Err(RagError::Store(format!(
            "Store not found: {} has no {}",
            store_path.display(),
            MANIFEST_FILE
        )));
    }

    let content = fs::read_to_string(&manifest_path)?;
    serde_json::from_str(&content)
        .map_err(|e| RagError::Store(format!("Malformed manifest: {e}")))
}

fn load_records(meta_path: &Path) -> Result<Vec<MetadataRecord>, RagError> {
    let reader = BufReader::new(fs::File::open(meta_path)?);
    let mut records = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }

        let record: MetadataRecord = serde_json::from_str(&line).map_err(|e| {
            RagError::Store(format!("Malformed metadata record on line {}: {e}", line_no + 1))
        })?;

        if record.id != records.len() {
            return Err(RagError::Store(format!(
                "Metadata record out of order on line {}: id {} at position {}",
                line_no + 1,
                record.id,
                records.len()
            )));
        }

        records.push(record);
    }

    Ok(records)
}

/// Serialize a finalized index and its metadata records to `target`,
/// atomically replacing whatever store was there before.
///
/// Everything is written to a staging directory next to the target first;
/// only a completely written store is renamed into place. A failure at any
/// point leaves the previous store untouched.
#[inline]
pub fn write_store(
    target: &Path,
    index: &FlatIpIndex,
    records: &[MetadataRecord],
    model: &str,
) -> Result<(), RagError> {
    if records.len() != index.len() {
        return Err(RagError::Store(format!(
            "Refusing to write misaligned store: {} metadata records, {} vectors",
            records.len(),
            index.len()
        )));
    }

    let parent = store_parent(target)?;
    fs::create_dir_all(parent)?;

    let staging = staging_path(parent, target, "staging");
    fs::create_dir_all(&staging)?;

    if let Err(e) = write_store_files(&staging, index, records, model) {
        let _ = fs::remove_dir_all(&staging);
        return Err(e);
    }

    if let Err(e) = swap_into_place(&staging, target, parent) {
        let _ = fs::remove_dir_all(&staging);
        return Err(e);
    }

    info!(
        "Store written: {} ({} entries, dimension {})",
        target.display(),
        records.len(),
        index.dimension()
    );

    Ok(())
}

fn store_parent(target: &Path) -> Result<&Path, RagError> {
    let parent = target.parent().ok_or_else(|| {
        RagError::Store(format!("Invalid store path: {}", target.display()))
    })?;

    // A bare relative name like "store" has an empty parent
    if parent.as_os_str().is_empty() {
        Ok(Path::new("."))
    } else {
        Ok(parent)
    }
}

fn staging_path(parent: &Path, target: &Path, label: &str) -> PathBuf {
    let name = target
        .file_name()
        .map_or_else(|| "store".to_string(), |n| n.to_string_lossy().into_owned());
    parent.join(format!(".{name}.{label}-{}", Uuid::new_v4()))
}

fn write_store_files(
    staging: &Path,
    index: &FlatIpIndex,
    records: &[MetadataRecord],
    model: &str,
) -> Result<(), RagError> {
    fs::write(
        staging.join(VECTORS_FILE),
        bytemuck::cast_slice::<f32, u8>(index.data()),
    )?;

    let mut meta = BufWriter::new(fs::File::create(staging.join(META_FILE))?);
    for record in records {
        let line = serde_json::to_string(record)
            .map_err(|e| RagError::Store(format!("Failed to serialize metadata record: {e}")))?;
        meta.write_all(line.as_bytes())?;
        meta.write_all(b"\n")?;
    }
    meta.flush()?;

    let manifest = Manifest {
        model: model.to_string(),
        dimension: index.dimension(),
        entry_count: index.len(),
        created_at: Utc::now(),
    };
    let manifest_json = serde_json::to_string_pretty(&manifest)
        .map_err(|e| RagError::Store(format!("Failed to serialize manifest: {e}")))?;
    fs::write(staging.join(MANIFEST_FILE), manifest_json)?;

    Ok(())
}

/// Rename the staging directory into place. An existing store is moved
/// aside first and restored if the final rename fails, so readers only ever
/// observe the old store or the new one, never a mix.
fn swap_into_place(staging: &Path, target: &Path, parent: &Path) -> Result<(), RagError> {
    if target.exists() {
        let retired = staging_path(parent, target, "old");
        fs::rename(target, &retired)?;

        if let Err(e) = fs::rename(staging, target) {
            if let Err(rollback) = fs::rename(&retired, target) {
                warn!(
                    "Failed to restore previous store at {}: {}",
                    target.display(),
                    rollback
                );
            }
            return Err(e.into());
        }

        if let Err(e) = fs::remove_dir_all(&retired) {
            warn!("Failed to clean up old store {}: {}", retired.display(), e);
        }
    } else {
        fs::rename(staging, target)?;
    }

    Ok(())
}
