//! The cache manager (C): owned, in-memory snapshots of L, D, R, S, plus
//! the serving process's one long-lived [`BarrelSet`] and its lazy-loading
//! shard cache (§4.10).
//!
//! `EngineState` replaces a mutable-globals pattern: every query and admin
//! operation is handed a single owned value rather than reaching into
//! process-scoped references.
//! `reload()` swaps that state atomically; queries already in flight keep
//! their own `Arc` clone and never observe a half-updated snapshot (§5).
//! The shard cache lives inside `BarrelSet` itself rather than here, since
//! it's indexed by shard, not by the L/D/R/S generation; `invalidate_shards`
//! and `status().cached_barrels` simply delegate to it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::barrel::BarrelSet;
use crate::config::EngineConfig;
use crate::docstore::DocStore;
use crate::error::{CorpusError, Result};
use crate::lexicon::Lexicon;
use crate::semantic::SemanticModel;
use crate::storage::Storage;
use crate::trie::Trie;

/// A frozen view of the engine's state, handed to a single in-flight query.
/// Cloning an `Arc<EngineState>` is cheap; the contents are never mutated
/// in place, only replaced wholesale by `reload()`.
pub struct EngineState {
    pub lexicon: Lexicon,
    pub doc_store: DocStore,
    pub trie: Trie,
    pub semantic: SemanticModel,
}

/// Reported by [`CacheManager::status`].
pub struct CacheStatus {
    pub trie_ready: bool,
    pub lexicon_ready: bool,
    pub cached_barrels: usize,
    pub lexicon_size: usize,
    pub doc_store_loaded: bool,
    pub last_initialized: Option<DateTime<Utc>>,
}

/// Holds the current [`EngineState`] plus the one long-lived [`BarrelSet`]
/// queries read through. The incremental indexer never touches this
/// `BarrelSet` directly — it writes shards through a `BarrelSet` of its
/// own, and the parent calls `reload()`/`invalidate_shards()` afterward so
/// this cache drops exactly the entries the ingest touched (§5).
pub struct CacheManager {
    state: RwLock<Option<Arc<EngineState>>>,
    barrels: BarrelSet,
    last_initialized: RwLock<Option<DateTime<Utc>>>,
}

impl CacheManager {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            state: RwLock::new(None),
            barrels: BarrelSet::new(config),
            last_initialized: RwLock::new(None),
        }
    }

    /// First-time load of L and D, build R from L's keys, load S filtered
    /// by L's keys. An unreadable glove file is tolerated — semantic
    /// expansion degrades to a no-op rather than blocking startup, since
    /// it is the one optional subsystem (§4.7 describes it as augmenting,
    /// not gating, search).
    pub fn initialize(
        &self,
        storage: &dyn Storage,
        semantic_source: Option<impl std::io::BufRead>,
    ) -> Result<()> {
        let lexicon = Lexicon::load(storage)?;
        let doc_store = DocStore::load(storage)?;
        let trie = Trie::build(lexicon.all_tokens())?;
        let semantic = match semantic_source {
            Some(reader) => SemanticModel::load(reader, &lexicon)?,
            None => SemanticModel::empty(),
        };

        *self.state.write() = Some(Arc::new(EngineState {
            lexicon,
            doc_store,
            trie,
            semantic,
        }));
        *self.last_initialized.write() = Some(now());
        Ok(())
    }

    /// Re-read L and D, rebuild R. Re-reading S is not required — newly
    /// interned words won't have pretrained vectors anyway — so the
    /// existing semantic model carries over unchanged (§4.10).
    pub fn reload(&self, storage: &dyn Storage) -> Result<()> {
        let lexicon = Lexicon::load(storage)?;
        let doc_store = DocStore::load(storage)?;
        let trie = Trie::build(lexicon.all_tokens())?;
        let semantic = self
            .state
            .read()
            .as_ref()
            .map(|s| s.semantic.clone())
            .unwrap_or_else(SemanticModel::empty);

        *self.state.write() = Some(Arc::new(EngineState {
            lexicon,
            doc_store,
            trie,
            semantic,
        }));
        *self.last_initialized.write() = Some(now());
        Ok(())
    }

    /// Drop shard cache entries so the next query reloads them from disk.
    /// Called after a completed ingest, with the shard indices its batch
    /// touched (§5).
    pub fn invalidate_shards(&self, indices: &[u32]) {
        self.barrels.invalidate_shards(indices);
    }

    /// A frozen snapshot for one query, or `NotInitialized` if
    /// `initialize()` has never completed (§7).
    pub fn snapshot(&self) -> Result<Arc<EngineState>> {
        self.state
            .read()
            .clone()
            .ok_or(CorpusError::NotInitialized)
    }

    pub fn barrels(&self) -> &BarrelSet {
        &self.barrels
    }

    pub fn status(&self) -> CacheStatus {
        let state = self.state.read();
        CacheStatus {
            trie_ready: state.as_ref().is_some_and(|s| !s.trie.is_empty()),
            lexicon_ready: state.is_some(),
            cached_barrels: self.barrels.cached_shard_count(),
            lexicon_size: state.as_ref().map(|s| s.lexicon.len()).unwrap_or(0),
            doc_store_loaded: state.as_ref().is_some_and(|s| !s.doc_store.is_empty()),
            last_initialized: *self.last_initialized.read(),
        }
    }
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileStorage;
    use tempfile::TempDir;

    #[test]
    fn uninitialized_snapshot_is_not_initialized_error() {
        let cache = CacheManager::new(&EngineConfig::default());
        assert!(matches!(
            cache.snapshot(),
            Err(CorpusError::NotInitialized)
        ));
    }

    #[test]
    fn initialize_then_reload_updates_status() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        let cache = CacheManager::new(&EngineConfig::default());
        cache
            .initialize(&storage, None::<std::io::Empty>)
            .unwrap();
        assert!(cache.snapshot().is_ok());
        let status_before = cache.status();
        assert!(status_before.lexicon_ready);
        assert_eq!(status_before.lexicon_size, 0);

        cache.reload(&storage).unwrap();
        assert!(cache.status().last_initialized.is_some());
    }

    #[test]
    fn invalidate_shards_clears_named_entries() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        let cache = CacheManager::new(&EngineConfig::default());

        cache.barrels().load_shard(&storage, 0).unwrap();
        cache.barrels().load_shard(&storage, 1).unwrap();
        assert_eq!(cache.status().cached_barrels, 2);

        cache.invalidate_shards(&[0, 1, 2]);
        assert_eq!(cache.status().cached_barrels, 0);
    }

    #[test]
    fn lookups_through_the_same_cache_manager_populate_its_barrel_cache() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        let cache = CacheManager::new(&EngineConfig::default());

        assert_eq!(cache.status().cached_barrels, 0);
        cache
            .barrels()
            .lookup(&storage, crate::lexicon::WordId(5))
            .unwrap();
        assert_eq!(cache.status().cached_barrels, 1);
    }
}
