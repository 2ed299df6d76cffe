//! The document store (D): docID → lightweight metadata.
//!
//! Writes are append-only from the ingest path; a `DocRecord` is written
//! once per document and never mutated (§4.3). `contains` is the canonical
//! idempotence check the incremental indexer uses to drop already-seen
//! documents from a batch.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::Storage;

const DOC_STORE_KEY: &str = "doc_store";

/// A document's unique identifier, as supplied by the corpus (e.g. an
/// arXiv ID). Never generated by the engine.
pub type DocId = String;

/// Lightweight, immutable per-document metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocRecord {
    pub title: String,
    pub authors: String,
    pub categories: String,
}

/// docID → [`DocRecord`] store.
#[derive(Debug, Default)]
pub struct DocStore {
    records: AHashMap<DocId, DocRecord>,
}

impl DocStore {
    pub fn new() -> Self {
        Self {
            records: AHashMap::new(),
        }
    }

    pub fn put(&mut self, doc_id: DocId, record: DocRecord) {
        self.records.insert(doc_id, record);
    }

    pub fn get(&self, doc_id: &str) -> Option<&DocRecord> {
        self.records.get(doc_id)
    }

    /// The canonical idempotence check: has this document ever been ingested?
    pub fn contains(&self, doc_id: &str) -> bool {
        self.records.contains_key(doc_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn load(storage: &dyn Storage) -> Result<Self> {
        let Some(bytes) = storage.read(DOC_STORE_KEY)? else {
            return Ok(Self::new());
        };
        let records: AHashMap<DocId, DocRecord> = serde_json::from_slice(&bytes)?;
        Ok(Self { records })
    }

    pub fn save(&self, storage: &dyn Storage) -> Result<()> {
        let bytes = serde_json::to_vec(&self.records)?;
        storage.write_atomic(DOC_STORE_KEY, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileStorage;
    use tempfile::TempDir;

    #[test]
    fn put_then_contains_and_get() {
        let mut store = DocStore::new();
        assert!(!store.contains("d1"));
        store.put(
            "d1".to_string(),
            DocRecord {
                title: "Neural Networks".to_string(),
                authors: "A. Researcher".to_string(),
                categories: "cs.LG".to_string(),
            },
        );
        assert!(store.contains("d1"));
        assert_eq!(store.get("d1").unwrap().title, "Neural Networks");
        assert!(store.get("d2").is_none());
    }

    #[test]
    fn round_trips_through_storage() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();

        let mut store = DocStore::new();
        store.put(
            "d1".to_string(),
            DocRecord {
                title: "Title".to_string(),
                authors: "Authors".to_string(),
                categories: "cs.LG".to_string(),
            },
        );
        store.save(&storage).unwrap();

        let reloaded = DocStore::load(&storage).unwrap();
        assert!(reloaded.contains("d1"));
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn load_missing_artifact_yields_empty_store() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        let store = DocStore::load(&storage).unwrap();
        assert!(store.is_empty());
    }
}
