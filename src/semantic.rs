//! The semantic model (S): pretrained word vectors filtered by the lexicon.
//!
//! Loaded once at startup from a GloVe-style text file (`<token> <f1> ... <fk>`
//! per line) and refreshed on cache reload (§4.7). Only tokens already
//! present in the lexicon are retained — the model answers questions about
//! words the corpus actually contains, not the full pretrained vocabulary.

use ahash::AHashMap;
use std::io::BufRead;

use crate::config::EngineConfig;
use crate::error::{CorpusError, Result};
use crate::lexicon::Lexicon;

/// token → vector, all vectors sharing the same dimension.
#[derive(Debug, Default, Clone)]
pub struct SemanticModel {
    vectors: AHashMap<String, Vec<f32>>,
    dim: Option<usize>,
}

impl SemanticModel {
    pub fn empty() -> Self {
        Self {
            vectors: AHashMap::new(),
            dim: None,
        }
    }

    /// Parse a GloVe-style stream, keeping only rows whose token is present
    /// in `lexicon`. The dimension is inferred from the first accepted row
    /// and is invariant thereafter; rows of a different width are skipped
    /// rather than treated as fatal, matching the tokenizer's total-failure
    /// stance elsewhere in the crate.
    pub fn load(reader: impl BufRead, lexicon: &Lexicon) -> Result<Self> {
        let mut vectors = AHashMap::new();
        let mut dim = None;

        for line in reader.lines() {
            let line = line.map_err(CorpusError::Io)?;
            let mut parts = line.split_whitespace();
            let Some(token) = parts.next() else {
                continue;
            };
            if lexicon.lookup(token).is_none() {
                continue;
            }
            let values: Vec<f32> = parts.filter_map(|v| v.parse().ok()).collect();
            match dim {
                None => dim = Some(values.len()),
                Some(k) if values.len() != k => continue,
                Some(_) => {}
            }
            if !values.is_empty() {
                vectors.insert(token.to_string(), values);
            }
        }

        Ok(Self { vectors, dim })
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Up to `max_synonyms` tokens whose vector has cosine similarity
    /// ≥ `similarity_threshold` against `token`'s vector, ordered by
    /// descending similarity and tie-broken lexicographically (§4.7).
    /// Returns empty if `token` was never loaded.
    pub fn find_synonyms(&self, token: &str, config: &EngineConfig) -> Vec<String> {
        let Some(query_vector) = self.vectors.get(token) else {
            return Vec::new();
        };

        let mut candidates: Vec<(String, f32)> = self
            .vectors
            .iter()
            .filter(|(t, _)| t.as_str() != token)
            .filter_map(|(t, v)| {
                let sim = cosine_similarity(query_vector, v);
                (sim >= config.similarity_threshold).then(|| (t.clone(), sim))
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        candidates.truncate(config.max_synonyms);
        candidates.into_iter().map(|(t, _)| t).collect()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
