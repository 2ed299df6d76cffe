//! The autocomplete trie (R): a prefix index over lexicon keys.
//!
//! Built fresh from the current lexicon on every cache load/reload (§4.10).
//! Backed by `fst::Set`, an ordered, byte-packed finite-state transducer —
//! the deterministic-DFS-over-sorted-children behavior §4.6 asks for falls
//! out of iterating a prefix-filtered stream over a sorted FST directly,
//! with no explicit tree of child nodes to maintain.

use fst::automaton::Str;
use fst::{Automaton, IntoStreamer, Set, Streamer};

use crate::config::EngineConfig;
use crate::error::{CorpusError, Result};

/// Prefix tree over lexicon tokens.
pub struct Trie {
    set: Set<Vec<u8>>,
}

impl Trie {
    /// Build a trie from an arbitrary iterator of tokens. Duplicates are
    /// collapsed; input need not be pre-sorted.
    pub fn build<I, S>(tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut sorted: Vec<String> = tokens.into_iter().map(|s| s.as_ref().to_string()).collect();
        sorted.sort_unstable();
        sorted.dedup();

        let mut builder = fst::SetBuilder::memory();
        for token in &sorted {
            builder
                .insert(token)
                .map_err(|e| CorpusError::BadInput(e.to_string()))?;
        }
        let set = builder.into_set();
        Ok(Self { set })
    }

    /// An empty trie, as used before the first `initialize()`.
    pub fn empty() -> Self {
        Self::build(std::iter::empty::<&str>()).expect("empty input always builds")
    }

    /// Up to `limit` tokens starting with `prefix`, in lexicographic order,
    /// filtered to tokens of at least `min_token_length` (§4.6). `prefix` is
    /// lowercased before matching — the trie holds only the lowercase
    /// tokens the tokenizer ever interns, so a mixed-case query would
    /// otherwise never match anything.
    pub fn autocomplete(&self, prefix: &str, limit: usize, min_token_length: usize) -> Vec<String> {
        if prefix.is_empty() {
            return Vec::new();
        }
        let prefix = prefix.to_lowercase();
        let matcher = Str::new(&prefix).starts_with();
        let mut stream = self.set.search(matcher).into_stream();
        let mut out = Vec::new();
        while let Some(bytes) = stream.next() {
            if out.len() >= limit {
                break;
            }
            let Ok(token) = std::str::from_utf8(bytes) else {
                continue;
            };
            if token.chars().count() >= min_token_length {
                out.push(token.to_string());
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

/// Suggestion assembly for multi-word queries (§4.6): split on the last
/// space, autocomplete only the trailing word, and re-prefix each
/// suggestion with everything before it. An empty trailing fragment
/// yields no suggestions. The whole query is lowercased first, matching
/// every other entry point into the lexicon (tokenization, ingestion).
pub fn suggest(query: &str, trie: &Trie, config: &EngineConfig) -> Vec<String> {
    let query = query.to_lowercase();
    let (base, prefix) = match query.rfind(' ') {
        Some(idx) => (&query[..=idx], &query[idx + 1..]),
        None => ("", query.as_str()),
    };
    if prefix.is_empty() {
        return Vec::new();
    }
    trie.autocomplete(
        prefix,
        config.max_autocomplete_suggestions,
        config.min_token_length,
    )
    .into_iter()
    .map(|w| format!("{base}{w}"))
    .collect()
}
