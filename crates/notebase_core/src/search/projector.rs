//! Resolves index hits against the current corpus.

use crate::model::corpus::{Corpus, NoteContent};
use crate::search::index::SearchIndex;
use log::debug;

/// One display-ready search hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectedNote<'a> {
    pub key: &'a str,
    pub content: &'a NoteContent,
}

/// Runs `query` against `index` and resolves hits in `corpus`.
///
/// Ranking is the index's; hits whose key is no longer in `corpus` are dropped,
/// which covers an index built from an older corpus. A missing index yields no
/// hits.
pub fn project<'a>(
    query: Option<&str>,
    index: Option<&SearchIndex>,
    corpus: &'a Corpus,
    limit: usize,
) -> Vec<ProjectedNote<'a>> {
    let Some(index) = index else {
        return Vec::new();
    };

    let keys = index.search(query, limit);
    let total = keys.len();
    let projected = keys
        .into_iter()
        .filter_map(|key| {
            corpus
                .get_key_value(&key)
                .map(|(key, content)| ProjectedNote { key, content })
        })
        .collect::<Vec<_>>();

    if projected.len() < total {
        debug!(
            "event=project module=search status=stale dropped={} kept={}",
            total - projected.len(),
            projected.len()
        );
    }
    projected
}

#[cfg(test)]
mod tests {
    use super::project;
    use crate::config::IndexOptions;
    use crate::model::corpus::{Corpus, NoteContent};
    use crate::search::index::SearchIndex;

    fn corpus_of(notes: &[(&str, &str)]) -> Corpus {
        let mut corpus = Corpus::new();
        for (key, content) in notes {
            corpus.insert(*key, *content);
        }
        corpus
    }

    #[test]
    fn preserves_index_order_and_resolves_content() {
        let corpus = corpus_of(&[("a", "rusty"), ("b", "rust")]);
        let (index, _) = SearchIndex::build(&corpus, IndexOptions::default());

        let hits = project(Some("rust"), Some(&index), &corpus, 15);
        let keys: Vec<&str> = hits.iter().map(|hit| hit.key).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(hits[0].content, &NoteContent::Text("rust".to_string()));
    }

    #[test]
    fn drops_keys_missing_from_newer_corpus() {
        let old = corpus_of(&[("a", "shared"), ("b", "shared"), ("c", "shared")]);
        let (stale_index, _) = SearchIndex::build(&old, IndexOptions::default());
        let current = corpus_of(&[("b", "shared")]);

        let hits = project(Some("shared"), Some(&stale_index), &current, 15);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, "b");
        assert!(hits.iter().all(|hit| current.contains_key(hit.key)));
    }

    #[test]
    fn missing_index_or_query_yields_nothing() {
        let corpus = corpus_of(&[("a", "alpha")]);
        assert!(project(Some("alpha"), None, &corpus, 15).is_empty());

        let (index, _) = SearchIndex::build(&corpus, IndexOptions::default());
        assert!(project(None, Some(&index), &corpus, 15).is_empty());
        assert!(project(Some(""), Some(&index), &corpus, 15).is_empty());
    }
}
