//! Crate-wide error taxonomy.
//!
//! Only conditions that genuinely must abort an operation become an
//! `Err`. Missing shards are not represented here at all — `BarrelSet`
//! treats a missing shard file as an empty shard, recovering locally
//! instead of propagating an error.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, CorpusError>;

/// Errors surfaced by the engine's public operations.
#[derive(Debug, Error)]
pub enum CorpusError {
    /// A persistent artifact (lexicon, doc store, barrel, ...) could not be
    /// read or written at startup or during a reload.
    #[error("config error: {0}")]
    ConfigError(String),

    /// A query or autocomplete operation was attempted before
    /// `CacheManager::initialize` completed successfully.
    #[error("engine not initialized")]
    NotInitialized,

    /// The ingest payload itself was malformed (not a JSON array, or
    /// unparsable). Per-document issues inside an otherwise well-formed
    /// batch are dropped silently by the worker, not reported here.
    #[error("bad input: {0}")]
    BadInput(String),

    /// The background ingest job panicked or returned an error. Caches are
    /// left untouched when this occurs.
    #[error("worker failure: {0}")]
    WorkerFailure(String),

    /// Transparent I/O failure at the storage boundary.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Transparent (de)serialization failure at the storage boundary.
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}
