//! Unindexed baseline: every query scans every document's term set.

use crate::tokenizer::Tokenizer;
use crate::DocId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

struct StoredDoc {
    id: DocId,
    terms: HashSet<String>,
    text: String,
}

pub struct NaiveMatcher {
    tokenizer: Arc<dyn Tokenizer>,
    docs: Vec<StoredDoc>,
    slots: HashMap<DocId, usize>,
}

impl NaiveMatcher {
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self { tokenizer, docs: Vec::new(), slots: HashMap::new() }
    }

    /// Store the distinct terms of `text`. Re-inserting an id keeps its original slot.
    pub fn insert_document(&mut self, id: DocId, text: impl Into<String>) {
        let text = text.into();
        let terms: HashSet<String> = self.tokenizer.tokenize(&text).into_iter().collect();
        let doc = StoredDoc { id, terms, text };
        match self.slots.get(&id) {
            Some(&slot) => self.docs[slot] = doc,
            None => {
                self.slots.insert(id, self.docs.len());
                self.docs.push(doc);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn document(&self, id: DocId) -> Option<&str> {
        self.slots.get(&id).map(|&slot| self.docs[slot].text.as_str())
    }

    /// Ids of documents containing every query term, in insertion order.
    pub fn search(&self, query: &str) -> Vec<DocId> {
        let wanted: HashSet<String> = self.tokenizer.tokenize(query).into_iter().collect();
        if wanted.is_empty() {
            return Vec::new();
        }
        self.docs.iter().filter(|doc| wanted.is_subset(&doc.terms)).map(|doc| doc.id).collect()
    }
}
