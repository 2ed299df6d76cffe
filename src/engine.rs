//! `Engine`: the crate's single public entry point, bundling a
//! [`CacheManager`] with a background [`IngestWorker`] behind one facade
//! that exposes `search`, `autocomplete`, `status` and `submit_index`.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{error, info};

use crate::cache::{CacheManager, CacheStatus};
use crate::config::EngineConfig;
use crate::error::{CorpusError, Result};
use crate::ingest::{self, IngestOutcome, RawDocument};
use crate::query::{self, SearchResponse};
use crate::storage::Storage;
use crate::trie::suggest;

/// Status surface for the out-of-scope HTTP layer (§6's `status()`).
#[derive(Debug, Clone)]
pub struct EngineStatus {
    pub trie_ready: bool,
    pub lexicon_ready: bool,
    pub cached_barrels: usize,
    pub lexicon_size: usize,
    pub doc_store_loaded: bool,
    pub last_initialized: Option<chrono::DateTime<chrono::Utc>>,
    pub ingest_in_flight: bool,
}

impl From<(CacheStatus, bool)> for EngineStatus {
    fn from((status, ingest_in_flight): (CacheStatus, bool)) -> Self {
        Self {
            trie_ready: status.trie_ready,
            lexicon_ready: status.lexicon_ready,
            cached_barrels: status.cached_barrels,
            lexicon_size: status.lexicon_size,
            doc_store_loaded: status.doc_store_loaded,
            last_initialized: status.last_initialized,
            ingest_in_flight,
        }
    }
}

/// A single background ingest job runner. Enforces §4.9's "exactly one
/// incremental-indexer job may be in flight at a time per process" by
/// rejecting a submission while `busy` is set, rather than queuing — the
/// caller gets an immediate, actionable answer instead of silent buffering.
struct IngestWorker {
    storage: Arc<dyn Storage>,
    config: EngineConfig,
    cache: Arc<CacheManager>,
    busy: Arc<AtomicBool>,
    outcome_tx: Sender<IngestOutcome>,
    outcome_rx: Receiver<IngestOutcome>,
}

impl IngestWorker {
    fn new(storage: Arc<dyn Storage>, config: EngineConfig, cache: Arc<CacheManager>) -> Self {
        let (outcome_tx, outcome_rx) = unbounded();
        Self {
            storage,
            config,
            cache,
            busy: Arc::new(AtomicBool::new(false)),
            outcome_tx,
            outcome_rx,
        }
    }

    /// Accept a batch immediately and run it on a detached thread. Returns
    /// `Err(WorkerFailure)` without spawning anything if a job is already
    /// in flight.
    fn submit(&self, batch: Vec<RawDocument>) -> Result<()> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CorpusError::WorkerFailure(
                "an ingest job is already in flight".to_string(),
            ));
        }

        let storage = self.storage.clone();
        let config = self.config.clone();
        let cache = self.cache.clone();
        let busy = self.busy.clone();
        let outcome_tx = self.outcome_tx.clone();
        let batch_len = batch.len();

        thread::spawn(move || {
            info!("ingest: starting batch of {batch_len} document(s)");
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                ingest::run_ingest(batch, storage.as_ref(), &config)
            }));

            let outcome = match result {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(e)) => IngestOutcome::Failure {
                    message: e.to_string(),
                },
                Err(_) => IngestOutcome::Failure {
                    message: "ingest worker panicked".to_string(),
                },
            };

            match &outcome {
                IngestOutcome::Success {
                    indexed_count,
                    message,
                    touched_shards,
                } => {
                    info!("ingest: {message}");
                    if let Err(e) = cache.reload(storage.as_ref()) {
                        error!("ingest: cache reload after successful ingest failed: {e}");
                    }
                    cache.invalidate_shards(touched_shards);
                    let _ = indexed_count;
                }
                IngestOutcome::Failure { message } => {
                    error!("ingest: job failed, caches left untouched: {message}");
                }
            }

            let _ = outcome_tx.send(outcome);
            busy.store(false, Ordering::SeqCst);
        });

        Ok(())
    }

    fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Block for up to `timeout` for the next completed job's outcome.
    /// Exists for tests and for callers willing to wait synchronously;
    /// production callers are expected to poll `status().last_initialized`
    /// instead (§6).
    fn wait(&self, timeout: Duration) -> Option<IngestOutcome> {
        self.outcome_rx.recv_timeout(timeout).ok()
    }
}

/// The crate's public service surface: `search`, `autocomplete`, `status`,
/// `submit_index` (§6).
pub struct Engine {
    storage: Arc<dyn Storage>,
    config: EngineConfig,
    cache: Arc<CacheManager>,
    worker: IngestWorker,
}

impl Engine {
    /// Construct an engine over `storage`, without loading anything yet.
    /// Call [`Engine::initialize`] before issuing queries.
    pub fn new(storage: Arc<dyn Storage>, config: EngineConfig) -> Self {
        let cache = Arc::new(CacheManager::new(&config));
        let worker = IngestWorker::new(storage.clone(), config.clone(), cache.clone());
        Self {
            storage,
            config,
            cache,
            worker,
        }
    }

    /// First-time load of L, D; build R; load S from `semantic_source` if
    /// given (§4.10). An absent or unreadable semantic source degrades to
    /// no synonym expansion rather than failing startup.
    pub fn initialize(&self, semantic_source: Option<impl std::io::BufRead>) -> Result<()> {
        self.cache.initialize(self.storage.as_ref(), semantic_source)
    }

    /// Stage 1-7 of §4.8 against the current frozen snapshot.
    pub fn search(&self, q: &str, page: usize, limit: usize) -> Result<SearchResponse> {
        let state = self.cache.snapshot()?;
        query::search(
            q,
            page,
            limit,
            &state.lexicon,
            &state.doc_store,
            self.cache.barrels(),
            self.storage.as_ref(),
            &state.semantic,
            &self.config,
        )
    }

    /// §4.6's multi-word suggestion assembly.
    pub fn autocomplete(&self, q: &str) -> Result<Vec<String>> {
        let state = self.cache.snapshot()?;
        Ok(suggest(q, &state.trie, &self.config))
    }

    /// §6's `status()` surface, enriched with whether an ingest job is
    /// currently running.
    pub fn status(&self) -> EngineStatus {
        EngineStatus::from((self.cache.status(), self.worker.is_busy()))
    }

    /// Accept a batch for background ingestion. Returns as soon as the job
    /// is scheduled (or rejected, if one is already running) — completion
    /// is observable via `status().last_initialized` advancing (§6).
    pub fn submit_index(&self, batch: Vec<RawDocument>) -> Result<()> {
        self.worker.submit(batch)
    }

    /// Parse the `arxiv` batch JSON array (§6) and submit it. A malformed
    /// payload (not a JSON array, or unparsable) is rejected as
    /// [`CorpusError::BadInput`] before anything is scheduled; per-document
    /// issues inside an otherwise well-formed array are handled by the
    /// worker itself (§7).
    pub fn submit_index_json(&self, bytes: &[u8]) -> Result<()> {
        let batch: Vec<RawDocument> =
            serde_json::from_slice(bytes).map_err(|e| CorpusError::BadInput(e.to_string()))?;
        self.submit_index(batch)
    }

    /// Block for up to `timeout` for the next ingest job's outcome. Test
    /// and batch-tooling convenience; not part of the serving path.
    pub fn wait_for_ingest(&self, timeout: Duration) -> Option<IngestOutcome> {
        self.worker.wait(timeout)
    }

    pub fn run_ingest_sync(&self, batch: Vec<RawDocument>) -> Result<IngestOutcome> {
        let outcome = ingest::run_ingest(batch, self.storage.as_ref(), &self.config)?;
        if let IngestOutcome::Success { touched_shards, .. } = &outcome {
            self.cache.reload(self.storage.as_ref())?;
            self.cache.invalidate_shards(touched_shards);
        }
        Ok(outcome)
    }
}
