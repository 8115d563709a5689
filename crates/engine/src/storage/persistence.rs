//! On-disk collection layout
//!
//! One directory per collection, `<persistence_path>/<collection_name>/`:
//!
//! - `ann_index.faiss`: serialized accelerated structure, or an empty
//!   placeholder when the collection runs brute force only
//! - `ann_metadata.json`: [`AnnSnapshot`], including every vector
//! - `payloads.json`: `[[id, payload], ...]` in insertion order
//!
//! Files are written to a `.tmp` sibling and renamed into place.
//! `ann_metadata.json` is written last.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use mnemos_core::{Payload, RecordId, StorageConfig, VectorError, VectorResult};

use crate::ann::AnnSnapshot;

/// Serialized ANN structure
pub const INDEX_FILE: &str = "ann_index.faiss";
/// Index metadata and vectors
pub const METADATA_FILE: &str = "ann_metadata.json";
/// Record payloads
pub const PAYLOADS_FILE: &str = "payloads.json";

/// Everything persisted for one collection
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedState {
    /// Index metadata and vectors
    pub snapshot: AnnSnapshot,
    /// Accelerated structure, empty for brute force
    pub index_bytes: Vec<u8>,
    /// Payloads in insertion order
    pub payloads: Vec<(RecordId, Payload)>,
}

/// Result of reading a collection directory
#[derive(Debug)]
pub enum LoadOutcome {
    /// No persisted state
    Missing,
    /// State read successfully
    Loaded(PersistedState),
    /// Files present but unreadable
    Corrupt(VectorError),
}

/// Paths of one collection's files
#[derive(Debug, Clone)]
pub struct CollectionLayout {
    /// Collection directory
    pub dir: PathBuf,
    /// `ann_index.faiss`
    pub index_path: PathBuf,
    /// `ann_metadata.json`
    pub metadata_path: PathBuf,
    /// `payloads.json`
    pub payloads_path: PathBuf,
}

impl CollectionLayout {
    /// Layout for `collection` under `base`
    pub fn new(base: &Path, collection: &str) -> Self {
        let dir = base.join(collection);
        Self {
            index_path: dir.join(INDEX_FILE),
            metadata_path: dir.join(METADATA_FILE),
            payloads_path: dir.join(PAYLOADS_FILE),
            dir,
        }
    }

    /// Layout for a collection config
    pub fn for_config(config: &StorageConfig) -> Self {
        Self::new(&config.persistence_path, &config.collection_name)
    }

    /// Whether persisted metadata exists
    pub fn exists(&self) -> bool {
        self.metadata_path.is_file()
    }

    /// Read the collection directory
    ///
    /// Missing metadata means no state. A missing index file or payload
    /// file is tolerated (empty index bytes, empty payloads).
    pub fn load(&self) -> LoadOutcome {
        if !self.exists() {
            return LoadOutcome::Missing;
        }
        match self.read() {
            Ok(state) => LoadOutcome::Loaded(state),
            Err(e) => LoadOutcome::Corrupt(e),
        }
    }

    fn read(&self) -> VectorResult<PersistedState> {
        let bytes = fs::read(&self.metadata_path)
            .map_err(|e| VectorError::persistence(&self.metadata_path, e))?;
        let snapshot: AnnSnapshot = serde_json::from_slice(&bytes)
            .map_err(|e| VectorError::persistence(&self.metadata_path, e))?;

        let payloads = match fs::read(&self.payloads_path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| VectorError::persistence(&self.payloads_path, e))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(VectorError::persistence(&self.payloads_path, e)),
        };

        let index_bytes = match fs::read(&self.index_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(VectorError::persistence(&self.index_path, e)),
        };

        Ok(PersistedState {
            snapshot,
            index_bytes,
            payloads,
        })
    }

    /// Write all three files, creating the directory if needed
    pub fn save(&self, state: &PersistedState) -> VectorResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| VectorError::persistence(&self.dir, e))?;

        let payloads = serde_json::to_vec(&state.payloads)?;
        write_atomic(&self.payloads_path, &payloads)?;
        write_atomic(&self.index_path, &state.index_bytes)?;
        let metadata = serde_json::to_vec(&state.snapshot)?;
        write_atomic(&self.metadata_path, &metadata)?;
        Ok(())
    }

    /// Remove the collection's files and, if then empty, its directory
    pub fn remove(&self) -> VectorResult<()> {
        for path in [&self.metadata_path, &self.index_path, &self.payloads_path] {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(VectorError::persistence(path, e)),
            }
        }
        // Fails if other files live there; that is fine
        let _ = fs::remove_dir(&self.dir);
        Ok(())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> VectorResult<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let write = || -> std::io::Result<()> {
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)?;
        f.write_all(bytes)?;
        f.flush()?;
        f.sync_data()?;
        fs::rename(&tmp, path)
    };
    write().map_err(|e| VectorError::persistence(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemos_core::Algorithm;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_state() -> PersistedState {
        let mut payload = Payload::new();
        payload.insert("text".into(), json!("hello"));
        PersistedState {
            snapshot: AnnSnapshot {
                dimension: 2,
                algorithm: Algorithm::BruteForce,
                vector_count: 2,
                accelerated_available: false,
                vectors: vec![(1.into(), vec![1.0, 0.0]), ("b".into(), vec![0.0, 1.0])],
            },
            index_bytes: Vec::new(),
            payloads: vec![(1.into(), payload), ("b".into(), Payload::new())],
        }
    }

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        let layout = CollectionLayout::new(dir.path(), "knowledge");
        assert!(matches!(layout.load(), LoadOutcome::Missing));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let layout = CollectionLayout::new(dir.path(), "knowledge");
        let state = sample_state();
        layout.save(&state).unwrap();

        assert!(layout.index_path.is_file());
        assert_eq!(fs::read(&layout.index_path).unwrap().len(), 0);
        match layout.load() {
            LoadOutcome::Loaded(loaded) => assert_eq!(loaded, state),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_file_formats() {
        let dir = TempDir::new().unwrap();
        let layout = CollectionLayout::new(dir.path(), "knowledge");
        layout.save(&sample_state()).unwrap();

        let metadata: serde_json::Value =
            serde_json::from_slice(&fs::read(&layout.metadata_path).unwrap()).unwrap();
        assert_eq!(metadata["dimension"], json!(2));
        assert_eq!(metadata["algorithm"], json!("brute-force"));
        assert_eq!(metadata["vectorCount"], json!(2));
        assert_eq!(metadata["acceleratedAvailable"], json!(false));
        assert_eq!(metadata["vectors"][1], json!(["b", [0.0, 1.0]]));

        let payloads: serde_json::Value =
            serde_json::from_slice(&fs::read(&layout.payloads_path).unwrap()).unwrap();
        assert_eq!(payloads, json!([[1, {"text": "hello"}], ["b", {}]]));
    }

    #[test]
    fn test_corrupt_metadata() {
        let dir = TempDir::new().unwrap();
        let layout = CollectionLayout::new(dir.path(), "knowledge");
        fs::create_dir_all(&layout.dir).unwrap();
        fs::write(&layout.metadata_path, b"{ not json").unwrap();
        assert!(matches!(layout.load(), LoadOutcome::Corrupt(_)));
    }

    #[test]
    fn test_missing_payloads_tolerated() {
        let dir = TempDir::new().unwrap();
        let layout = CollectionLayout::new(dir.path(), "knowledge");
        layout.save(&sample_state()).unwrap();
        fs::remove_file(&layout.payloads_path).unwrap();

        match layout.load() {
            LoadOutcome::Loaded(loaded) => {
                assert!(loaded.payloads.is_empty());
                assert_eq!(loaded.snapshot.vector_count, 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_remove() {
        let dir = TempDir::new().unwrap();
        let layout = CollectionLayout::new(dir.path(), "knowledge");
        layout.save(&sample_state()).unwrap();
        layout.remove().unwrap();
        assert!(!layout.exists());
        assert!(!layout.dir.exists());
        // removing again is fine
        layout.remove().unwrap();
    }
}
