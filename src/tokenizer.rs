//! Deterministic text tokenization shared by indexing and querying.
//!
//! A token is a maximal run of lowercase ASCII letters extracted from the
//! lowercased input. Position is assigned by a counter that advances on
//! every candidate token encountered — including ones filtered out for
//! being too short or a stop word — so that proximity scoring (§4.8)
//! remains meaningful even though some positions carry no hit.

use crate::config::{EngineConfig, FieldCode, STOP_WORDS};

/// A single accepted `(position, token)` pair.
pub type TokenSpan = (u32, String);

/// Stateless tokenizer. All behavior is expressed as associated functions
/// since tokenization carries no state beyond a position counter local to
/// each call.
pub struct Tokenizer;

impl Tokenizer {
    /// Tokenize a single string, with the position counter reset to zero at
    /// the start of this call.
    pub fn tokenize(text: &str, config: &EngineConfig) -> Vec<TokenSpan> {
        let mut position = 0u32;
        let mut out = Vec::new();
        Self::scan(text, &mut position, config, &mut out);
        out
    }

    /// Tokenize the canonical fields of a document in order (TITLE,
    /// ABSTRACT, CATEGORIES, AUTHORS, SUBMITTER), with a single position
    /// counter that runs continuously across field boundaries. Returns
    /// accepted tokens tagged with the field they occurred in.
    ///
    /// This is the incremental indexer's approach: a single monotonically
    /// advancing position counter, not per-field-joined text.
    pub fn tokenize_document(
        fields: &[(FieldCode, &str)],
        config: &EngineConfig,
    ) -> Vec<(String, u32, FieldCode)> {
        let mut position = 0u32;
        let mut out = Vec::new();
        for &(field, text) in fields {
            let mut spans = Vec::new();
            Self::scan(text, &mut position, config, &mut spans);
            out.extend(spans.into_iter().map(|(pos, token)| (token, pos, field)));
        }
        out
    }

    /// Scan `text`, advancing `position` for every candidate run of ASCII
    /// letters (accepted or not), appending accepted `(position, token)`
    /// pairs to `out`.
    fn scan(text: &str, position: &mut u32, config: &EngineConfig, out: &mut Vec<TokenSpan>) {
        let mut candidate = String::new();
        let mut flush = |candidate: &mut String, position: &mut u32, out: &mut Vec<TokenSpan>| {
            if candidate.is_empty() {
                return;
            }
            let len = candidate.chars().count();
            if len >= config.min_word_length && !is_stop_word(candidate) {
                out.push((*position, std::mem::take(candidate)));
            } else {
                candidate.clear();
            }
            *position += 1;
        };

        for c in text.chars() {
            let lower = c.to_ascii_lowercase();
            if lower.is_ascii_lowercase() {
                candidate.push(lower);
            } else {
                flush(&mut candidate, position, out);
            }
        }
        flush(&mut candidate, position, out);
    }
}

/// `true` iff `token` is in the fixed stop-word set.
pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.binary_search(&token).is_ok()
}
