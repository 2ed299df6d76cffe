//! # corpusdex
//!
//! A small-scale document search engine core for a scholarly-article
//! corpus: prefix-based autocomplete, ranked multi-term search with
//! optional semantic query expansion, and non-blocking incremental
//! ingestion of new documents while the serving path stays available.
//!
//! The crate is organized leaves-first, matching the system's own
//! dependency order:
//!
//! - [`tokenizer`] — deterministic text → token stream.
//! - [`lexicon`] — token ↔ word-ID bijection.
//! - [`docstore`] — document metadata store.
//! - [`forward`] — per-document forward index.
//! - [`barrel`] — the partitioned inverted index.
//! - [`trie`] — prefix-based autocomplete.
//! - [`semantic`] — pretrained word vectors and synonym expansion.
//! - [`query`] — the ranked search engine composing all of the above.
//! - [`ingest`] — the incremental indexer.
//! - [`cache`] — in-memory snapshots and atomic reload.
//! - [`engine`] — the public facade bundling the cache manager and a
//!   background ingest worker.

pub mod barrel;
pub mod cache;
pub mod config;
pub mod docstore;
pub mod engine;
pub mod error;
pub mod forward;
pub mod ingest;
pub mod lexicon;
pub mod query;
pub mod semantic;
pub mod storage;
pub mod tokenizer;
pub mod trie;

pub use cache::{CacheManager, CacheStatus, EngineState};
pub use config::{EngineConfig, FieldCode};
pub use docstore::{DocId, DocRecord, DocStore};
pub use engine::{Engine, EngineStatus};
pub use error::{CorpusError, Result};
pub use ingest::{IngestOutcome, RawDocument};
pub use lexicon::{Lexicon, WordId};
pub use query::{MatchType, SearchResponse, SearchResult};
pub use storage::{FileStorage, Storage};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
