//! Query evaluation over an [`InvertedIndex`].

use crate::error::Result;
use crate::index::InvertedIndex;
use crate::postings::PostingList;
use crate::DocId;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub text: String,
    /// Query terms (repeats included) found in the document.
    pub match_count: u32,
    /// Sum of the matched terms' positions; lower ranks higher.
    pub score: u64,
}

impl InvertedIndex {
    /// Ranked retrieval seeded by the first query term.
    ///
    /// Only documents containing the first term are candidates. Every later term adds one
    /// match and its position to the candidates it occurs in. Hits are ordered by match
    /// count descending, then score ascending, then doc id.
    pub fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let terms = self.tokenizer().tokenize(query);
        let Some((first, rest)) = terms.split_first() else {
            return Ok(Vec::new());
        };
        let mut lists = TermLists::new(self);

        let mut candidates: HashMap<DocId, (u32, u64)> =
            lists.get(first)?.iter().map(|(&doc, &pos)| (doc, (1, u64::from(pos)))).collect();
        if !candidates.is_empty() {
            for term in rest {
                let postings = lists.get(term)?;
                if candidates.len() <= postings.len() {
                    for (doc, (count, score)) in candidates.iter_mut() {
                        if let Some(&pos) = postings.get(doc) {
                            *count += 1;
                            *score += u64::from(pos);
                        }
                    }
                } else {
                    for (doc, &pos) in postings.iter() {
                        if let Some((count, score)) = candidates.get_mut(doc) {
                            *count += 1;
                            *score += u64::from(pos);
                        }
                    }
                }
            }
        }

        let mut ranked: Vec<(DocId, u32, u64)> =
            candidates.into_iter().map(|(doc, (count, score))| (doc, count, score)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)).then(a.0.cmp(&b.0)));
        tracing::debug!(query_terms = terms.len(), hits = ranked.len(), "ranked search");
        Ok(self.hits(ranked))
    }

    /// Strict conjunctive retrieval: documents containing every query term, by doc id.
    pub fn search_all(&self, query: &str) -> Result<Vec<SearchHit>> {
        let terms = self.tokenizer().tokenize(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let mut lists = TermLists::new(self);
        for term in &terms {
            if lists.get(term)?.is_empty() {
                return Ok(Vec::new());
            }
        }

        let smallest = terms.iter().min_by_key(|t| lists.cached_len(t)).map(String::as_str).unwrap_or_default();
        let mut matched = Vec::new();
        'docs: for &doc in lists.cached(smallest).keys() {
            let mut score = 0u64;
            for term in &terms {
                match lists.cached(term).get(&doc) {
                    Some(&pos) => score += u64::from(pos),
                    None => continue 'docs,
                }
            }
            matched.push((doc, terms.len() as u32, score));
        }
        tracing::debug!(query_terms = terms.len(), hits = matched.len(), "conjunctive search");
        Ok(self.hits(matched))
    }

    fn hits(&self, ranked: Vec<(DocId, u32, u64)>) -> Vec<SearchHit> {
        ranked
            .into_iter()
            .filter_map(|(doc_id, match_count, score)| {
                self.document(doc_id).map(|text| SearchHit { doc_id, text: text.to_string(), match_count, score })
            })
            .collect()
    }
}

/// Postings fetched once per distinct query term.
struct TermLists<'a> {
    index: &'a InvertedIndex,
    lists: HashMap<String, Cow<'a, PostingList>>,
}

impl<'a> TermLists<'a> {
    fn new(index: &'a InvertedIndex) -> Self {
        Self { index, lists: HashMap::new() }
    }

    fn get(&mut self, term: &str) -> Result<&PostingList> {
        if !self.lists.contains_key(term) {
            let list = self.index.postings_for(term)?;
            self.lists.insert(term.to_string(), list);
        }
        Ok(self.cached(term))
    }

    /// A list already loaded by [`get`](Self::get); empty otherwise.
    fn cached(&self, term: &str) -> &PostingList {
        static EMPTY: PostingList = PostingList::new();
        self.lists.get(term).map_or(&EMPTY, |list| list.as_ref())
    }

    fn cached_len(&self, term: &str) -> usize {
        self.cached(term).len()
    }
}
