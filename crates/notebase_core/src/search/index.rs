//! In-memory inverted index over note content.
//!
//! # Responsibility
//! - Map normalized tokens to the notes that contain them.
//! - Answer substring/prefix/exact token queries with ranked keys.
//!
//! # Invariants
//! - Non-text notes are skipped and reported, never fatal.
//! - Re-adding a key replaces its previous tokens (last write wins).
//! - `None`, blank queries and `limit == 0` return no hits.
//! - Ordering is deterministic: exact-token hits first, then insertion order.

use crate::config::{IndexOptions, MatchMode};
use crate::model::corpus::{Corpus, NoteContent};
use crate::search::tokenizer::tokenize;
use log::{info, warn};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound;
use std::time::Instant;

type DocId = usize;

/// Note excluded from the index because its content is not text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedNote {
    pub key: String,
    pub kind: &'static str,
}

/// Outcome of building an index from a corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexBuildReport {
    /// Notes that made it into the index.
    pub indexed: usize,
    /// Notes skipped for malformed content, in key order.
    pub skipped: Vec<SkippedNote>,
}

/// Token index for one corpus snapshot.
#[derive(Debug, Clone)]
pub struct SearchIndex {
    options: IndexOptions,
    keys: Vec<String>,
    doc_ids: HashMap<String, DocId>,
    doc_tokens: Vec<BTreeSet<String>>,
    postings: BTreeMap<String, BTreeSet<DocId>>,
}

impl SearchIndex {
    /// Creates an empty index with fixed options.
    pub fn new(options: IndexOptions) -> Self {
        Self {
            options,
            keys: Vec::new(),
            doc_ids: HashMap::new(),
            doc_tokens: Vec::new(),
            postings: BTreeMap::new(),
        }
    }

    /// Indexes every text note of `corpus`.
    ///
    /// # Side effects
    /// - Emits one `index_skip` warning per malformed note.
    /// - Emits an `index_build` event with counts and duration.
    pub fn build(corpus: &Corpus, options: IndexOptions) -> (Self, IndexBuildReport) {
        let started_at = Instant::now();
        let mut index = Self::new(options);
        let mut report = IndexBuildReport::default();

        for (key, content) in corpus.iter() {
            match content {
                NoteContent::Text(text) => {
                    index.add(key, text);
                    report.indexed += 1;
                }
                NoteContent::Malformed { kind } => {
                    warn!(
                        "event=index_skip module=search status=skipped reason=non_text kind={} key={}",
                        kind, key
                    );
                    report.skipped.push(SkippedNote {
                        key: key.to_string(),
                        kind: *kind,
                    });
                }
            }
        }

        info!(
            "event=index_build module=search status=ok notes={} skipped={} tokens={} duration_ms={}",
            report.indexed,
            report.skipped.len(),
            index.token_count(),
            started_at.elapsed().as_millis()
        );
        (index, report)
    }

    /// Adds or replaces one note.
    pub fn add(&mut self, key: &str, content: &str) {
        let tokens: BTreeSet<String> = tokenize(content, &self.options).into_iter().collect();

        let doc_id = match self.doc_ids.get(key) {
            Some(&doc_id) => {
                self.clear_postings(doc_id);
                doc_id
            }
            None => {
                let doc_id = self.keys.len();
                self.keys.push(key.to_string());
                self.doc_ids.insert(key.to_string(), doc_id);
                self.doc_tokens.push(BTreeSet::new());
                doc_id
            }
        };

        for token in &tokens {
            self.postings
                .entry(token.clone())
                .or_default()
                .insert(doc_id);
        }
        self.doc_tokens[doc_id] = tokens;
    }

    /// Returns up to `limit` keys matching every term of `query`.
    pub fn search(&self, query: Option<&str>, limit: usize) -> Vec<String> {
        let Some(query) = query else {
            return Vec::new();
        };
        if limit == 0 {
            return Vec::new();
        }

        let mut terms = tokenize(query, &self.options);
        terms.sort();
        terms.dedup();
        if terms.is_empty() {
            return Vec::new();
        }

        let mut exact_all: Option<BTreeSet<DocId>> = None;
        let mut matched_all: Option<BTreeSet<DocId>> = None;
        for term in &terms {
            let exact = self.postings.get(term).cloned().unwrap_or_default();
            let matched = self.matching_docs(term);
            if matched.is_empty() {
                return Vec::new();
            }
            exact_all = Some(intersect(exact_all, exact));
            matched_all = Some(intersect(matched_all, matched));
        }

        let exact_all = exact_all.unwrap_or_default();
        let matched_all = matched_all.unwrap_or_default();
        exact_all
            .iter()
            .chain(matched_all.difference(&exact_all))
            .take(limit)
            .map(|&doc_id| self.keys[doc_id].clone())
            .collect()
    }

    /// Number of indexed notes.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.doc_ids.contains_key(key)
    }

    /// Number of distinct tokens.
    pub fn token_count(&self) -> usize {
        self.postings.len()
    }

    pub fn options(&self) -> IndexOptions {
        self.options
    }

    fn matching_docs(&self, term: &str) -> BTreeSet<DocId> {
        match self.options.match_mode {
            MatchMode::Exact => self.postings.get(term).cloned().unwrap_or_default(),
            MatchMode::Prefix => self
                .postings
                .range::<str, _>((Bound::Included(term), Bound::Unbounded))
                .take_while(|(token, _)| token.starts_with(term))
                .flat_map(|(_, docs)| docs.iter().copied())
                .collect(),
            MatchMode::Substring => self
                .postings
                .iter()
                .filter(|(token, _)| token.contains(term))
                .flat_map(|(_, docs)| docs.iter().copied())
                .collect(),
        }
    }

    fn clear_postings(&mut self, doc_id: DocId) {
        let previous = std::mem::take(&mut self.doc_tokens[doc_id]);
        for token in previous {
            if let Some(docs) = self.postings.get_mut(&token) {
                docs.remove(&doc_id);
                if docs.is_empty() {
                    self.postings.remove(&token);
                }
            }
        }
    }
}

fn intersect(acc: Option<BTreeSet<DocId>>, next: BTreeSet<DocId>) -> BTreeSet<DocId> {
    match acc {
        None => next,
        Some(acc) => acc.intersection(&next).copied().collect(),
    }
}
