//! The forward index (F): docID → per-word hit lists.
//!
//! Serves as the input used to (re)build barrels during ingest, and is
//! available for future features beyond the required query path (§4.4).

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::config::FieldCode;
use crate::docstore::DocId;
use crate::error::Result;
use crate::lexicon::WordId;
use crate::storage::Storage;

const FORWARD_INDEX_KEY: &str = "forward_index";

/// A single occurrence of a word at a position in a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hit {
    pub position: u32,
    pub field: FieldCode,
}

/// A document's complete set of hits, grouped by word.
pub type ForwardEntry = AHashMap<WordId, Vec<Hit>>;

/// docID → [`ForwardEntry`] store.
#[derive(Debug, Default)]
pub struct ForwardIndex {
    entries: AHashMap<DocId, ForwardEntry>,
}

impl ForwardIndex {
    pub fn new() -> Self {
        Self {
            entries: AHashMap::new(),
        }
    }

    /// Written once per document; a re-ingest of the same docID would
    /// replace the entry, but the incremental indexer never calls this for
    /// a docID already present in the doc store (idempotence, §4.9).
    pub fn put(&mut self, doc_id: DocId, entry: ForwardEntry) {
        self.entries.insert(doc_id, entry);
    }

    pub fn get(&self, doc_id: &str) -> Option<&ForwardEntry> {
        self.entries.get(doc_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn load(storage: &dyn Storage) -> Result<Self> {
        let Some(bytes) = storage.read(FORWARD_INDEX_KEY)? else {
            return Ok(Self::new());
        };
        let entries: AHashMap<DocId, AHashMap<WordId, Vec<Hit>>> = serde_json::from_slice(&bytes)?;
        Ok(Self { entries })
    }

    pub fn save(&self, storage: &dyn Storage) -> Result<()> {
        let bytes = serde_json::to_vec(&self.entries)?;
        storage.write_atomic(FORWARD_INDEX_KEY, &bytes)
    }
}
