//! The barrel set (B): partitioned inverted index.
//!
//! A barrel is one shard of the inverted index, holding every word whose
//! `wordID mod num_barrels` equals the shard index (§4.5). Shards are loaded
//! lazily and cached in memory, keyed by shard index; a shard file that has
//! never been written is treated as empty, never as an error.

use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::docstore::DocId;
use crate::error::Result;
use crate::forward::Hit;
use crate::lexicon::WordId;
use crate::storage::Storage;

fn shard_key(shard_index: u32) -> String {
    format!("barrels/{shard_index}")
}

/// One document's contribution to a word's posting list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub hits: Vec<Hit>,
}

/// A single shard: every word assigned to this shard, mapped to its
/// posting list in insertion order. Insertion order is load-bearing — the
/// query engine relies on set membership, never on docID sort order
/// within a posting list (§4.5).
pub type Shard = AHashMap<WordId, Vec<Posting>>;

/// Partitioned inverted index, one file per shard, with an in-memory cache
/// of shards already loaded this process. The cache is the serving
/// process's own — the incremental indexer writes through a fresh
/// `BarrelSet` of its own and never shares this cache (§5); the parent
/// invalidates the affected entries here after a successful reload.
#[derive(Debug)]
pub struct BarrelSet {
    num_barrels: u32,
    cache: RwLock<AHashMap<u32, Arc<Shard>>>,
}

impl BarrelSet {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            num_barrels: config.num_barrels,
            cache: RwLock::new(AHashMap::new()),
        }
    }

    /// The shard index a word belongs to.
    pub fn shard_index(&self, word_id: WordId) -> u32 {
        word_id.shard(self.num_barrels)
    }

    /// Load a shard, consulting the in-memory cache first and populating it
    /// on a miss. A shard file that was never written comes back as an
    /// empty map rather than an error (§4.5, §7 ShardMissing) and is
    /// cached as such.
    pub fn load_shard(&self, storage: &dyn Storage, shard_index: u32) -> Result<Arc<Shard>> {
        if let Some(shard) = self.cache.read().get(&shard_index) {
            return Ok(shard.clone());
        }

        let shard = match storage.read(&shard_key(shard_index))? {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => Shard::new(),
        };
        let shard = Arc::new(shard);
        self.cache.write().insert(shard_index, shard.clone());
        Ok(shard)
    }

    /// Merge new postings into a shard and write it back. For each word,
    /// new postings are appended to the existing list, preserving
    /// insertion order across ingests. Refreshes the cache entry with the
    /// merged result.
    pub fn merge_into_shard(
        &self,
        storage: &dyn Storage,
        shard_index: u32,
        new_postings: AHashMap<WordId, Vec<Posting>>,
    ) -> Result<()> {
        let mut shard = (*self.load_shard(storage, shard_index)?).clone();
        for (word_id, postings) in new_postings {
            shard.entry(word_id).or_default().extend(postings);
        }
        let bytes = serde_json::to_vec(&shard)?;
        storage.write_atomic(&shard_key(shard_index), &bytes)?;
        self.cache.write().insert(shard_index, Arc::new(shard));
        Ok(())
    }

    /// Look up a word's posting list, loading its shard on demand.
    /// Returns an empty slice if the word has never been indexed.
    pub fn lookup(&self, storage: &dyn Storage, word_id: WordId) -> Result<Vec<Posting>> {
        let shard = self.load_shard(storage, self.shard_index(word_id))?;
        Ok(shard.get(&word_id).cloned().unwrap_or_default())
    }

    /// Drop cached entries for `indices` so the next lookup re-reads them
    /// from storage. Called after a reload following a successful ingest.
    pub fn invalidate_shards(&self, indices: &[u32]) {
        let mut cache = self.cache.write();
        for index in indices {
            cache.remove(index);
        }
    }

    /// Number of shards currently cached in memory.
    pub fn cached_shard_count(&self) -> usize {
        self.cache.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldCode;
    use crate::storage::FileStorage;
    use tempfile::TempDir;

    fn hit(position: u32) -> Hit {
        Hit {
            position,
            field: FieldCode::Title,
        }
    }

    #[test]
    fn missing_shard_loads_as_empty() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        let barrels = BarrelSet::new(&EngineConfig::default());
        let shard = barrels.load_shard(&storage, 3).unwrap();
        assert!(shard.is_empty());
    }

    #[test]
    fn shard_index_matches_modulus() {
        let config = EngineConfig::default();
        let barrels = BarrelSet::new(&config);
        assert_eq!(barrels.shard_index(WordId(130)), 130 % config.num_barrels);
    }

    #[test]
    fn merge_then_lookup_round_trips() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        let config = EngineConfig::default();
        let barrels = BarrelSet::new(&config);
        let shard_index = barrels.shard_index(WordId(5));

        let mut new_postings = AHashMap::new();
        new_postings.insert(
            WordId(5),
            vec![Posting {
                doc_id: "d1".to_string(),
                hits: vec![hit(0)],
            }],
        );
        barrels
            .merge_into_shard(&storage, shard_index, new_postings)
            .unwrap();

        let postings = barrels.lookup(&storage, WordId(5)).unwrap();
        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].doc_id, "d1");
    }

    #[test]
    fn merge_appends_rather_than_replaces() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        let config = EngineConfig::default();
        let barrels = BarrelSet::new(&config);
        let shard_index = barrels.shard_index(WordId(7));

        let mut first = AHashMap::new();
        first.insert(
            WordId(7),
            vec![Posting {
                doc_id: "d1".to_string(),
                hits: vec![hit(0)],
            }],
        );
        barrels
            .merge_into_shard(&storage, shard_index, first)
            .unwrap();

        let mut second = AHashMap::new();
        second.insert(
            WordId(7),
            vec![Posting {
                doc_id: "d2".to_string(),
                hits: vec![hit(1)],
            }],
        );
        barrels
            .merge_into_shard(&storage, shard_index, second)
            .unwrap();

        let postings = barrels.lookup(&storage, WordId(7)).unwrap();
        assert_eq!(postings.len(), 2);
        assert_eq!(postings[0].doc_id, "d1");
        assert_eq!(postings[1].doc_id, "d2");
    }

    #[test]
    fn lookup_unknown_word_returns_empty() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        let barrels = BarrelSet::new(&EngineConfig::default());
        assert!(barrels.lookup(&storage, WordId(999)).unwrap().is_empty());
    }

    #[test]
    fn repeated_lookup_populates_and_reuses_the_shard_cache() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        let config = EngineConfig::default();
        let barrels = BarrelSet::new(&config);
        let shard_index = barrels.shard_index(WordId(9));

        let mut postings = AHashMap::new();
        postings.insert(
            WordId(9),
            vec![Posting {
                doc_id: "d1".to_string(),
                hits: vec![hit(0)],
            }],
        );
        barrels
            .merge_into_shard(&storage, shard_index, postings)
            .unwrap();
        assert_eq!(barrels.cached_shard_count(), 1);

        barrels.lookup(&storage, WordId(9)).unwrap();
        assert_eq!(
            barrels.cached_shard_count(),
            1,
            "a second lookup should hit the cache, not grow it"
        );
    }

    #[test]
    fn invalidate_shards_forces_a_reload_on_next_lookup() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        let config = EngineConfig::default();
        let barrels = BarrelSet::new(&config);
        let shard_index = barrels.shard_index(WordId(11));

        barrels.load_shard(&storage, shard_index).unwrap();
        assert_eq!(barrels.cached_shard_count(), 1);

        barrels.invalidate_shards(&[shard_index]);
        assert_eq!(barrels.cached_shard_count(), 0);
    }
}
