//! Fixed configuration constants and the overridable [`EngineConfig`].
//!
//! Values that are fixed compile-time constants (the canonical defaults,
//! listed here as `pub const`s) are distinguished from values that may be
//! overridden at startup only, via [`EngineConfig`].
//! Everything downstream of construction reads the effective value from
//! an `EngineConfig`, never the bare constant, so an override actually
//! takes effect end to end.

use serde::{Deserialize, Serialize};

/// Minimum accepted token length, both for indexing and for query-side
/// tokenization.
pub const MIN_WORD_LENGTH: usize = 3;

/// Minimum token length retained by autocomplete.
pub const MIN_TOKEN_LENGTH: usize = 3;

/// Number of inverted-index shards. Fixed after the first build — all
/// barrels and the query engine must agree on this value.
pub const NUM_BARRELS: u32 = 64;

/// Cap on autocomplete suggestions returned per request.
pub const MAX_AUTOCOMPLETE_SUGGESTIONS: usize = 10;

/// Span (in token positions) beyond which the proximity bonus is zero.
pub const MAX_SPAN: u32 = 500;

/// Minimum cosine similarity for a candidate synonym.
pub const SIMILARITY_THRESHOLD: f32 = 0.65;

/// Maximum number of synonyms kept per query token.
pub const MAX_SYNONYMS: usize = 3;

/// Closed set of stop words. Sorted so [`is_stop_word`] can binary-search.
pub const STOP_WORDS: &[&str] = &[
    "a", "all", "an", "and", "are", "as", "at", "be", "but", "by", "can", "for", "from", "i", "if",
    "in", "is", "it", "its", "my", "no", "not", "of", "on", "or", "our", "such", "that", "the",
    "their", "then", "there", "these", "they", "this", "to", "was", "we", "which", "will", "with",
    "your",
];

fn sorted_invariant_holds() -> bool {
    STOP_WORDS.windows(2).all(|w| w[0] < w[1])
}

/// The five fixed fields of a document, in canonical position-counting
/// order: TITLE, ABSTRACT, CATEGORIES, AUTHORS, SUBMITTER.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum FieldCode {
    Title = 1,
    Abstract = 2,
    Categories = 3,
    Authors = 4,
    Submitter = 5,
}

impl FieldCode {
    /// All field codes in canonical order.
    pub const CANONICAL_ORDER: [FieldCode; 5] = [
        FieldCode::Title,
        FieldCode::Abstract,
        FieldCode::Categories,
        FieldCode::Authors,
        FieldCode::Submitter,
    ];

    /// The fixed scoring weight for this field, per §6's `FIELD_WEIGHTS`.
    pub fn weight(self) -> u32 {
        match self {
            FieldCode::Title => 5,
            FieldCode::Abstract => 1,
            FieldCode::Categories => 3,
            FieldCode::Authors => 1,
            FieldCode::Submitter => 1,
        }
    }
}

/// Effective, overridable engine configuration.
///
/// Constructed via [`EngineConfig::default`] for the literal defaults
/// above, or via [`EngineConfig::builder`] to override individual
/// constants at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub num_barrels: u32,
    pub min_word_length: usize,
    pub min_token_length: usize,
    pub max_autocomplete_suggestions: usize,
    pub max_span: u32,
    pub similarity_threshold: f32,
    pub max_synonyms: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        debug_assert!(sorted_invariant_holds(), "STOP_WORDS must stay sorted");
        Self {
            num_barrels: NUM_BARRELS,
            min_word_length: MIN_WORD_LENGTH,
            min_token_length: MIN_TOKEN_LENGTH,
            max_autocomplete_suggestions: MAX_AUTOCOMPLETE_SUGGESTIONS,
            max_span: MAX_SPAN,
            similarity_threshold: SIMILARITY_THRESHOLD,
            max_synonyms: MAX_SYNONYMS,
        }
    }
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}

/// Builder for [`EngineConfig`], following the same pattern as the rest of
/// the crate's config types: start from the literal defaults, override
/// only what you need.
#[derive(Default)]
pub struct EngineConfigBuilder {
    config: Option<EngineConfig>,
}

impl EngineConfigBuilder {
    fn base(&mut self) -> &mut EngineConfig {
        self.config.get_or_insert_with(EngineConfig::default)
    }

    pub fn num_barrels(mut self, value: u32) -> Self {
        self.base().num_barrels = value;
        self
    }

    pub fn max_autocomplete_suggestions(mut self, value: usize) -> Self {
        self.base().max_autocomplete_suggestions = value;
        self
    }

    pub fn max_span(mut self, value: u32) -> Self {
        self.base().max_span = value;
        self
    }

    pub fn similarity_threshold(mut self, value: f32) -> Self {
        self.base().similarity_threshold = value;
        self
    }

    pub fn max_synonyms(mut self, value: usize) -> Self {
        self.base().max_synonyms = value;
        self
    }

    pub fn build(mut self) -> EngineConfig {
        self.config.take().unwrap_or_default()
    }
}
