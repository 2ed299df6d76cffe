//! The incremental indexer (I): idempotent ingestion of a batch of new
//! documents (§4.9).
//!
//! `run_ingest` loads L/D/F, drops already-seen or ID-less documents,
//! tokenizes and interns the rest, merges their postings into the shards
//! they touch, and writes everything back. `engine::Engine` wraps it for
//! background execution; this module only contains the pure,
//! single-threaded ingest logic so it can be unit-tested without spawning
//! anything.

use ahash::AHashMap;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::barrel::{BarrelSet, Posting};
use crate::config::{EngineConfig, FieldCode};
use crate::docstore::{DocId, DocRecord, DocStore};
use crate::error::Result;
use crate::forward::{ForwardEntry, ForwardIndex, Hit};
use crate::lexicon::{Lexicon, WordId};
use crate::storage::Storage;
use crate::tokenizer::Tokenizer;

/// One document as it arrives in an ingest batch (the `arxiv` artifact of
/// §6): `{ id, title, abstract, categories, authors, submitter }`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawDocument {
    pub id: Option<DocId>,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub categories: String,
    #[serde(default)]
    pub authors: String,
    #[serde(default)]
    pub submitter: String,
}

impl RawDocument {
    /// The five fields in canonical position-counting order (§3).
    fn fields(&self) -> [(FieldCode, &str); 5] {
        [
            (FieldCode::Title, self.title.as_str()),
            (FieldCode::Abstract, self.abstract_text.as_str()),
            (FieldCode::Categories, self.categories.as_str()),
            (FieldCode::Authors, self.authors.as_str()),
            (FieldCode::Submitter, self.submitter.as_str()),
        ]
    }
}

/// The tagged result posted back to the parent (§9's design note: a tagged
/// variant, never a string-sniffed status field). `touched_shards` lets the
/// caller invalidate exactly the serving cache's entries this batch made
/// stale, rather than dropping the whole shard cache on every ingest (§5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IngestOutcome {
    Success {
        indexed_count: usize,
        message: String,
        touched_shards: Vec<u32>,
    },
    Failure {
        message: String,
    },
}

/// Run one ingest batch to completion against `storage`, per §4.9's
/// numbered algorithm. Idempotent: documents already present in the doc
/// store are silently dropped, and re-running the same batch leaves every
/// artifact unchanged (§8 invariant 5).
pub fn run_ingest(
    batch: Vec<RawDocument>,
    storage: &dyn Storage,
    config: &EngineConfig,
) -> Result<IngestOutcome> {
    // 1. Load current L, D, F.
    let mut lexicon = Lexicon::load(storage)?;
    let mut doc_store = DocStore::load(storage)?;
    let mut forward = ForwardIndex::load(storage)?;
    let barrels = BarrelSet::new(config);

    // 2. Filter: drop documents lacking an ID or already present.
    let surviving: Vec<RawDocument> = batch
        .into_iter()
        .filter(|doc| match &doc.id {
            Some(id) if !doc_store.contains(id) => true,
            Some(id) => {
                warn!("ingest: skipping already-indexed document {id}");
                false
            }
            None => {
                warn!("ingest: skipping document with no id");
                false
            }
        })
        .collect();

    // 3-4. Tokenize and intern each surviving document, accumulating
    // postings grouped by the shard they'll land in. A per-document
    // failure (e.g. no accepted tokens at all) is logged and skipped
    // rather than aborting the whole batch (§7 partial-success ingest).
    let mut shard_postings: AHashMap<u32, AHashMap<WordId, Vec<Posting>>> = AHashMap::new();
    let mut indexed_count = 0usize;

    for doc in surviving {
        let doc_id = doc.id.clone().expect("filtered above");
        match index_one(&doc, &mut lexicon, config) {
            Some(entry) => {
                for (&word_id, hits) in &entry {
                    let shard = barrels.shard_index(word_id);
                    shard_postings
                        .entry(shard)
                        .or_default()
                        .entry(word_id)
                        .or_default()
                        .push(Posting {
                            doc_id: doc_id.clone(),
                            hits: hits.clone(),
                        });
                }
                forward.put(doc_id.clone(), entry);
                doc_store.put(
                    doc_id,
                    DocRecord {
                        title: doc.title.clone(),
                        authors: doc.authors.clone(),
                        categories: doc.categories.clone(),
                    },
                );
                indexed_count += 1;
            }
            None => {
                warn!("ingest: document {doc_id} produced no indexable tokens, skipping");
            }
        }
    }

    // 5. Merge new postings into every shard touched.
    let touched_shards: Vec<u32> = shard_postings.keys().copied().collect();
    for (shard_index, postings) in shard_postings {
        barrels.merge_into_shard(storage, shard_index, postings)?;
    }

    // 6. Persist L, D, F.
    lexicon.save(storage)?;
    doc_store.save(storage)?;
    forward.save(storage)?;

    let message = format!("indexed {indexed_count} document(s)");
    Ok(IngestOutcome::Success {
        indexed_count,
        message,
        touched_shards,
    })
}

/// Tokenize one document and intern its tokens, returning its forward-index
/// entry, or `None` if it produced no accepted tokens at all (an empty
/// document is not an error, just inert).
fn index_one(doc: &RawDocument, lexicon: &mut Lexicon, config: &EngineConfig) -> Option<ForwardEntry> {
    let spans = Tokenizer::tokenize_document(&doc.fields(), config);
    if spans.is_empty() {
        return None;
    }

    let mut entry = ForwardEntry::new();
    for (token, position, field) in spans {
        let word_id = lexicon.intern(&token);
        entry.entry(word_id).or_default().push(Hit { position, field });
    }
    Some(entry)
}
