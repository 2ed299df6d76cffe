//! The query engine (Q): composes the lexicon, barrels and semantic model
//! into ranked, paginated result pages (§4.8).
//!
//! The seven stages below run in sequence: tokenize, expand into synonym
//! groups, load the shards those groups touch, build one exact-preferring
//! candidate map per group, intersect the maps in ascending-size order,
//! score survivors, then sort and paginate.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::barrel::{BarrelSet, Posting};
use crate::config::EngineConfig;
use crate::docstore::{DocId, DocStore};
use crate::lexicon::Lexicon;
use crate::semantic::SemanticModel;
use crate::storage::Storage;
use crate::tokenizer::Tokenizer;

/// `Exact` iff every surviving group contributed through its literal query
/// word; `Semantic` iff at least one group matched only through a synonym.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchType {
    Exact,
    Semantic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub doc_id: DocId,
    pub score: f64,
    pub word_count: usize,
    pub match_type: MatchType,
    pub title: String,
    pub authors: String,
    pub categories: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub time_ms: u64,
    pub tokens: Vec<String>,
    pub total_results: usize,
    pub has_more: bool,
    pub page: usize,
    pub limit: usize,
}

/// A candidate posting for one word, tagged with whether the word was the
/// literal query token (`true`) or a synonym (`false`).
struct Candidate {
    posting: Posting,
    is_exact: bool,
}

/// Run a search against a frozen view of the index (§5's "frozen snapshot"
/// guarantee is the caller's responsibility — this function takes whatever
/// references it's given and is deterministic in them).
pub fn search(
    query: &str,
    page: usize,
    limit: usize,
    lexicon: &Lexicon,
    doc_store: &DocStore,
    barrels: &BarrelSet,
    storage: &dyn Storage,
    semantic: &SemanticModel,
    config: &EngineConfig,
) -> crate::error::Result<SearchResponse> {
    let start = Instant::now();

    // Stage 1 — tokenize.
    let tokens: Vec<String> = Tokenizer::tokenize(query, config)
        .into_iter()
        .map(|(_, token)| token)
        .collect();

    if tokens.is_empty() {
        return Ok(SearchResponse {
            results: Vec::new(),
            time_ms: elapsed_ms(start),
            tokens,
            total_results: 0,
            has_more: false,
            page,
            limit,
        });
    }

    // Stage 2 — group expansion: each query token plus its synonyms.
    let groups: Vec<Vec<(String, bool)>> = tokens
        .iter()
        .map(|t| {
            let mut members = vec![(t.clone(), true)];
            for synonym in semantic.find_synonyms(t, config) {
                members.push((synonym, false));
            }
            members
        })
        .collect();

    // Stage 3 — barrel loading happens lazily inside `BarrelSet::lookup`,
    // which loads (and the cache manager caches) shards on demand.

    // Stage 4 — per-group candidate maps.
    let mut candidate_maps: Vec<AHashMap<DocId, Candidate>> = Vec::with_capacity(groups.len());
    for group in &groups {
        let mut map: AHashMap<DocId, Candidate> = AHashMap::new();
        for (word, is_exact) in group {
            let Some(word_id) = lexicon.lookup(word) else {
                continue;
            };
            for posting in barrels.lookup(storage, word_id)? {
                map.entry(posting.doc_id.clone())
                    .and_modify(|existing| {
                        if *is_exact && !existing.is_exact {
                            existing.posting = posting.clone();
                            existing.is_exact = true;
                        }
                    })
                    .or_insert_with(|| Candidate {
                        posting: posting.clone(),
                        is_exact: *is_exact,
                    });
            }
        }
        candidate_maps.push(map);
    }

    // Stage 5 — conjunction, smallest map first.
    let mut order: Vec<usize> = (0..candidate_maps.len()).collect();
    order.sort_by_key(|&i| candidate_maps[i].len());

    let mut surviving: Option<AHashMap<DocId, Vec<Candidate>>> = None;
    for &i in &order {
        surviving = Some(match surviving.take() {
            None => candidate_maps[i]
                .iter()
                .map(|(doc_id, c)| {
                    (
                        doc_id.clone(),
                        vec![Candidate {
                            posting: c.posting.clone(),
                            is_exact: c.is_exact,
                        }],
                    )
                })
                .collect(),
            Some(acc) => {
                let mut next = AHashMap::new();
                for (doc_id, mut chain) in acc {
                    if let Some(c) = candidate_maps[i].get(&doc_id) {
                        chain.push(Candidate {
                            posting: c.posting.clone(),
                            is_exact: c.is_exact,
                        });
                        next.insert(doc_id, chain);
                    }
                }
                next
            }
        });
        if surviving.as_ref().is_some_and(|m| m.is_empty()) {
            break;
        }
    }
    let surviving = surviving.unwrap_or_default();

    // Stage 6 — scoring.
    let mut scored: Vec<(DocId, f64, usize, MatchType)> = surviving
        .into_iter()
        .map(|(doc_id, candidates)| {
            let word_count = candidates.len();
            let match_type = if candidates.iter().all(|c| c.is_exact) {
                MatchType::Exact
            } else {
                MatchType::Semantic
            };
            let term_total: f64 = candidates
                .iter()
                .map(|c| term_score(&c.posting, c.is_exact))
                .sum();
            let bonus = if candidates.len() > 1 {
                proximity_bonus(&candidates, config.max_span)
            } else {
                0.0
            };
            (doc_id, term_total + bonus, word_count, match_type)
        })
        .collect();

    // Stage 7 — order and paginate.
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    let total_results = scored.len();
    let begin = (page.saturating_sub(1)) * limit;
    let end = (begin + limit).min(total_results);
    let has_more = end < total_results;

    let results = scored
        .get(begin.min(total_results)..end)
        .unwrap_or_default()
        .iter()
        .map(|(doc_id, score, word_count, match_type)| {
            let record = doc_store.get(doc_id);
            SearchResult {
                doc_id: doc_id.clone(),
                score: *score,
                word_count: *word_count,
                match_type: *match_type,
                title: record.map(|r| r.title.clone()).unwrap_or_default(),
                authors: record.map(|r| r.authors.clone()).unwrap_or_default(),
                categories: record.map(|r| r.categories.clone()).unwrap_or_default(),
            }
        })
        .collect();

    Ok(SearchResponse {
        results,
        time_ms: elapsed_ms(start),
        tokens,
        total_results,
        has_more,
        page,
        limit,
    })
}

fn term_score(posting: &Posting, is_exact: bool) -> f64 {
    let base: u32 = posting.hits.iter().map(|h| h.field.weight()).sum();
    base as f64 * if is_exact { 1.0 } else { 0.5 }
}

/// `max(0, MAX_SPAN - min(span, MAX_SPAN)) / 100`, span being the distance
/// between the farthest-apart matched positions across the whole candidate
/// set (§4.8 Stage 6).
fn proximity_bonus(candidates: &[Candidate], max_span: u32) -> f64 {
    let positions: Vec<u32> = candidates
        .iter()
        .flat_map(|c| c.posting.hits.iter().map(|h| h.position))
        .collect();
    let Some(&min) = positions.iter().min() else {
        return 0.0;
    };
    let max = *positions.iter().max().unwrap();
    let span = max - min;
    (max_span.saturating_sub(span.min(max_span))) as f64 / 100.0
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
