//! Persistence abstraction.
//!
//! Storage here is an abstract persistent key-value surface (§1); the
//! only hard requirement is that the `lexicon` and `docStore` artifacts be
//! replaceable atomically (§6, "write-temp-rename is recommended but not
//! mandated"). [`Storage`] is that surface; [`FileStorage`] is the one
//! concrete implementation the crate ships, rooted at a directory on disk,
//! used by both the serving process and the incremental indexer's isolated
//! working copies.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// An abstract key-value persistence surface.
///
/// Keys are opaque strings (`"lexicon"`, `"doc_store"`, `"forward_index"`,
/// `"barrels/7"`, ...); values are raw bytes, with JSON serialization
/// layered on top by each component per §1's "JSON is used only as the
/// concrete interchange".
pub trait Storage: Send + Sync {
    /// Read the bytes stored under `key`, or `Ok(None)` if the key has
    /// never been written (e.g. a shard that has never received a posting).
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Atomically replace the bytes stored under `key`. Implementations
    /// should write to a temporary location and rename into place so that
    /// concurrent readers never observe a partially-written file.
    fn write_atomic(&self, key: &str, bytes: &[u8]) -> Result<()>;
}

/// A [`Storage`] rooted at a directory on disk. Keys map to file paths
/// relative to the root; keys containing `/` (e.g. `barrels/7`) create
/// nested directories on first write.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Open (creating if necessary) a file-backed storage rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_atomic(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let dir = path.parent().unwrap_or(&self.root);
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        use std::io::Write;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }
}
