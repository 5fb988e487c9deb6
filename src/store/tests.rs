use super::*;
use crate::index::IndexBuilder;
use tempfile::TempDir;

fn sample_records(count: usize) -> Vec<MetadataRecord> {
    (0..count)
        .map(|i| MetadataRecord {
            id: i,
            source_path: format!("doc_{i}.txt"),
            chunk_ordinal: 0,
            offset_start: 0,
            offset_end: 10,
            text: format!("chunk text {i}"),
        })
        .collect()
}

fn sample_index(count: usize) -> crate::index::FlatIpIndex {
    let mut builder = IndexBuilder::new();
    for i in 0..count {
        let mut vector = vec![0.0f32; 4];
        vector[i % 4] = 1.0;
        builder.add(vec![vector]).expect("vector should append");
    }
    builder.finalize()
}

#[test]
fn write_and_open_round_trip() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let store_path = temp_dir.path().join("store");

    let index = sample_index(3);
    let records = sample_records(3);
    write_store(&store_path, &index, &records, "test-model").expect("write should succeed");

    let store = Store::open(&store_path).expect("open should succeed");

    assert_eq!(store.len(), 3);
    assert_eq!(store.manifest.model, "test-model");
    assert_eq!(store.manifest.dimension, 4);
    assert_eq!(store.manifest.entry_count, 3);
    assert_eq!(store.records, records);
    assert_eq!(store.index, index);
}

#[test]
fn rewrite_replaces_store_wholesale() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let store_path = temp_dir.path().join("store");

    write_store(&store_path, &sample_index(3), &sample_records(3), "test-model")
        .expect("first write should succeed");
    write_store(&store_path, &sample_index(1), &sample_records(1), "test-model")
        .expect("rebuild should succeed");

    let store = Store::open(&store_path).expect("open should succeed");
    assert_eq!(store.len(), 1);
}

#[test]
fn no_staging_directories_left_behind() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let store_path = temp_dir.path().join("store");

    write_store(&store_path, &sample_index(2), &sample_records(2), "test-model")
        .expect("write should succeed");
    write_store(&store_path, &sample_index(2), &sample_records(2), "test-model")
        .expect("rebuild should succeed");

    let entries: Vec<String> = std::fs::read_dir(temp_dir.path())
        .expect("should list parent dir")
        .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, vec!["store".to_string()]);
}

#[test]
fn empty_store_round_trip() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let store_path = temp_dir.path().join("store");

    write_store(&store_path, &sample_index(0), &sample_records(0), "test-model")
        .expect("empty write should succeed");

    let store = Store::open(&store_path).expect("open should succeed");
    assert!(store.is_empty());
    assert_eq!(store.manifest.dimension, 0);
    assert_eq!(store.manifest.entry_count, 0);
}

#[test]
fn open_missing_store_is_a_store_error() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let result = Store::open(&temp_dir.path().join("nope"));
    assert!(matches!(result, Err(RagError::Store(_))));
}

#[test]
fn refuses_to_write_misaligned_store() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let store_path = temp_dir.path().join("store");

    let result = write_store(&store_path, &sample_index(1), &sample_records(2), "test-model");

    assert!(matches!(result, Err(RagError::Store(_))));
    assert!(!store_path.exists());
}

#[test]
fn failed_write_leaves_previous_store_untouched() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let store_path = temp_dir.path().join("store");

    write_store(&store_path, &sample_index(3), &sample_records(3), "test-model")
        .expect("first write should succeed");

    // Misaligned input aborts before any swap
    let result = write_store(&store_path, &sample_index(1), &sample_records(2), "test-model");
    assert!(result.is_err());

    let store = Store::open(&store_path).expect("previous store should still open");
    assert_eq!(store.len(), 3);
}

#[test]
fn detects_out_of_order_metadata() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let store_path = temp_dir.path().join("store");

    write_store(&store_path, &sample_index(2), &sample_records(2), "test-model")
        .expect("write should succeed");

    // Swap the two metadata lines on disk
    let meta_path = store_path.join(META_FILE);
    let contents = std::fs::read_to_string(&meta_path).expect("should read meta file");
    let reversed: Vec<&str> = contents.lines().rev().collect();
    std::fs::write(&meta_path, reversed.join("\n")).expect("should rewrite meta file");

    let result = Store::open(&store_path);
    assert!(matches!(result, Err(RagError::Store(_))));
}

#[test]
fn detects_truncated_vector_file() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let store_path = temp_dir.path().join("store");

    write_store(&store_path, &sample_index(2), &sample_records(2), "test-model")
        .expect("write should succeed");

    let vectors_path = store_path.join(VECTORS_FILE);
    let bytes = std::fs::read(&vectors_path).expect("should read vectors file");
    std::fs::write(&vectors_path, &bytes[..bytes.len() - 3]).expect("should truncate");

    let result = Store::open(&store_path);
    assert!(matches!(result, Err(RagError::Store(_))));
}

#[test]
fn load_manifest_reads_without_loading_vectors() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let store_path = temp_dir.path().join("store");

    write_store(&store_path, &sample_index(5), &sample_records(5), "test-model")
        .expect("write should succeed");

    let manifest = load_manifest(&store_path).expect("manifest should load");
    assert_eq!(manifest.entry_count, 5);
    assert_eq!(manifest.model, "test-model");
}

#[test]
fn metadata_lines_are_self_describing_json() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let store_path = temp_dir.path().join("store");

    write_store(&store_path, &sample_index(1), &sample_records(1), "test-model")
        .expect("write should succeed");

    let contents =
        std::fs::read_to_string(store_path.join(META_FILE)).expect("should read meta file");
    let line = contents.lines().next().expect("should have one line");
    let value: serde_json::Value = serde_json::from_str(line).expect("line should be JSON");

    assert_eq!(value["id"], 0);
    assert_eq!(value["source_path"], "doc_0.txt");
    assert_eq!(value["offset_start"], 0);
    assert_eq!(value["offset_end"], 10);
}
