//! On-disk persistence for the built corpus
//!
//! The embedded index is written with bincode next to a small JSON metadata
//! file. Startup reloads the pair when both are present, skipping the
//! embedding rebuild and its cost.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::loader::CorpusError;
use crate::index::EmbeddingIndex;

const INDEX_FILE: &str = "corpus_index.bin";
const META_FILE: &str = "corpus_meta.json";

/// Metadata about a persisted corpus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusMetadata {
    pub created_at: DateTime<Utc>,
    pub entry_count: usize,
    /// File name of the glossary the corpus was built from
    pub source_name: String,
}

/// Filesystem store for the corpus index + metadata pair
#[derive(Debug, Clone)]
pub struct CorpusStore {
    data_dir: PathBuf,
}

impl CorpusStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn index_path(&self) -> PathBuf {
        self.data_dir.join(INDEX_FILE)
    }

    fn meta_path(&self) -> PathBuf {
        self.data_dir.join(META_FILE)
    }

    /// Whether a persisted corpus exists
    pub fn exists(&self) -> bool {
        self.index_path().exists() && self.meta_path().exists()
    }

    /// Persist the index and its metadata, creating the data dir if needed
    pub fn save(
        &self,
        index: &EmbeddingIndex,
        metadata: &CorpusMetadata,
    ) -> Result<(), CorpusError> {
        fs::create_dir_all(&self.data_dir)?;

        let encoded =
            bincode::serialize(index).map_err(|e| CorpusError::Serialization(e.to_string()))?;
        fs::write(self.index_path(), encoded)?;

        let meta_json = serde_json::to_string_pretty(metadata)
            .map_err(|e| CorpusError::Serialization(e.to_string()))?;
        fs::write(self.meta_path(), meta_json)?;

        tracing::info!(
            entries = metadata.entry_count,
            dir = %self.data_dir.display(),
            "Persisted corpus index"
        );
        Ok(())
    }

    /// Load the persisted pair; `None` when either file is missing
    pub fn load(&self) -> Result<Option<(EmbeddingIndex, CorpusMetadata)>, CorpusError> {
        if !self.exists() {
            return Ok(None);
        }

        let encoded = fs::read(self.index_path())?;
        let index: EmbeddingIndex =
            bincode::deserialize(&encoded).map_err(|e| CorpusError::Serialization(e.to_string()))?;

        let meta_json = fs::read_to_string(self.meta_path())?;
        let metadata: CorpusMetadata = serde_json::from_str(&meta_json)
            .map_err(|e| CorpusError::Serialization(e.to_string()))?;

        Ok(Some((index, metadata)))
    }

    /// Remove any persisted corpus files
    pub fn remove(&self) -> Result<(), CorpusError> {
        for path in [self.index_path(), self.meta_path()] {
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ReferenceEntry;

    fn sample_index() -> EmbeddingIndex {
        let mut index = EmbeddingIndex::new(3);
        index
            .insert(ReferenceEntry::new("salt", "ملح"), &[0.0, 1.0, 0.0])
            .unwrap();
        index
            .insert(ReferenceEntry::new("sugar", "سكر"), &[0.0, 0.0, 1.0])
            .unwrap();
        index
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CorpusStore::new(dir.path());
        assert!(!store.exists());

        let index = sample_index();
        let metadata = CorpusMetadata {
            created_at: Utc::now(),
            entry_count: index.len(),
            source_name: "glossary.csv".to_string(),
        };
        store.save(&index, &metadata).unwrap();
        assert!(store.exists());

        let (loaded, meta) = store.load().unwrap().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.dimension(), 3);
        assert_eq!(meta.entry_count, 2);
        assert_eq!(meta.source_name, "glossary.csv");
    }

    #[test]
    fn test_load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = CorpusStore::new(dir.path().join("nothing"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = CorpusStore::new(dir.path());

        let index = sample_index();
        let metadata = CorpusMetadata {
            created_at: Utc::now(),
            entry_count: index.len(),
            source_name: "glossary.csv".to_string(),
        };
        store.save(&index, &metadata).unwrap();
        store.remove().unwrap();
        assert!(!store.exists());
    }
}
