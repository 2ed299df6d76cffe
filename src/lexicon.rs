//! The token ↔ [`WordId`] bijection.
//!
//! Word IDs get a dedicated numeric type rather than being smuggled
//! around as raw `u32`s or stringified JSON map keys — the string
//! conversion needed for JSON object keys is isolated here, at the
//! persistence boundary, via a custom `Serialize`/`Deserialize` impl on
//! the lexicon's on-disk shape.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::storage::Storage;

const LEXICON_KEY: &str = "lexicon";

/// A dense, positive, never-reused word identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WordId(pub u32);

impl WordId {
    /// The shard this word's postings live in, per `wordID mod NUM_BARRELS`.
    pub fn shard(self, num_barrels: u32) -> u32 {
        self.0 % num_barrels
    }
}

impl fmt::Display for WordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Token → [`WordId`] bijection with single-writer `intern` semantics.
#[derive(Debug, Default)]
pub struct Lexicon {
    forward: AHashMap<String, WordId>,
    next_id: u32,
}

/// On-disk shape: a plain JSON object of token → integer ID (§6's
/// `lexicon` artifact). `WordId` is `#[serde(transparent)]` so this
/// serializes exactly as `{"token": 5, ...}`, not `{"token": {"0": 5}}`.
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
struct LexiconOnDisk(AHashMap<String, WordId>);

impl Lexicon {
    pub fn new() -> Self {
        Self {
            forward: AHashMap::new(),
            next_id: 1,
        }
    }

    /// Look up the current ID for a token, if it has ever been interned.
    pub fn lookup(&self, token: &str) -> Option<WordId> {
        self.forward.get(token).copied()
    }

    /// Return the existing ID for `token`, or allocate `max_existing_id + 1`.
    pub fn intern(&mut self, token: &str) -> WordId {
        if let Some(&id) = self.forward.get(token) {
            return id;
        }
        let id = WordId(self.next_id);
        self.next_id += 1;
        self.forward.insert(token.to_string(), id);
        id
    }

    /// Iterate every token ever interned, in no particular order. Used to
    /// (re)build the autocomplete trie.
    pub fn all_tokens(&self) -> impl Iterator<Item = &str> {
        self.forward.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Load a lexicon from storage, rebuilding `next_id` from the maximum
    /// ID present. Per §4.2, this is acceptable as long as IDs stay dense
    /// enough for barrel balance — an absent artifact yields an empty,
    /// fresh lexicon rather than an error, so a brand-new corpus can bootstrap.
    pub fn load(storage: &dyn Storage) -> Result<Self> {
        let Some(bytes) = storage.read(LEXICON_KEY)? else {
            return Ok(Self::new());
        };
        let on_disk: LexiconOnDisk = serde_json::from_slice(&bytes)?;
        let forward = on_disk.0;
        let next_id = forward.values().map(|id| id.0).max().unwrap_or(0) + 1;
        Ok(Self { forward, next_id })
    }

    /// Persist the lexicon atomically.
    pub fn save(&self, storage: &dyn Storage) -> Result<()> {
        let on_disk = LexiconOnDisk(self.forward.clone());
        let bytes = serde_json::to_vec(&on_disk)?;
        storage.write_atomic(LEXICON_KEY, &bytes)
    }
}
