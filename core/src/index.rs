use crate::codec::Bits;
use crate::config::IndexConfig;
use crate::error::{IndexError, Result};
use crate::postings::{decode_postings, encode_postings, encoded_len, raw_heap_bytes, PostingList};
use crate::tokenizer::Tokenizer;
use crate::{DocId, Position};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

enum Postings {
    Raw(HashMap<String, PostingList>),
    Compressed(HashMap<String, Bits>),
}

impl Postings {
    fn len(&self) -> usize {
        match self {
            Postings::Raw(map) => map.len(),
            Postings::Compressed(map) => map.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub num_docs: usize,
    pub num_terms: usize,
    /// Sum of postings list lengths.
    pub num_postings: usize,
    /// Estimated heap bytes held by term keys plus postings.
    pub postings_bytes: usize,
    pub compressed: bool,
}

/// Term -> postings map over an owned document store.
///
/// Every document id found in a postings list is present in the store, and no term is
/// ever kept with an empty list. While compressed, reads decode only the terms they touch.
pub struct InvertedIndex {
    tokenizer: Arc<dyn Tokenizer>,
    config: IndexConfig,
    postings: Postings,
    docs: HashMap<DocId, String>,
}

impl InvertedIndex {
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self::with_config(tokenizer, IndexConfig::default())
    }

    pub fn with_config(tokenizer: Arc<dyn Tokenizer>, config: IndexConfig) -> Self {
        Self { tokenizer, config, postings: Postings::Raw(HashMap::new()), docs: HashMap::new() }
    }

    pub fn tokenizer(&self) -> &dyn Tokenizer {
        self.tokenizer.as_ref()
    }

    pub fn config(&self) -> IndexConfig {
        self.config
    }

    pub fn num_docs(&self) -> usize {
        self.docs.len()
    }

    pub fn num_terms(&self) -> usize {
        self.postings.len()
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self.postings, Postings::Compressed(_))
    }

    pub fn contains(&self, id: DocId) -> bool {
        self.docs.contains_key(&id)
    }

    pub fn document(&self, id: DocId) -> Option<&str> {
        self.docs.get(&id).map(String::as_str)
    }

    /// Index `text` under `id`, replacing whatever was stored for `id` before.
    ///
    /// Each distinct term records the position of its first occurrence.
    pub fn insert_document(&mut self, id: DocId, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        let tokens = self.tokenizer.tokenize(&text);
        let mut fresh: HashMap<String, Position> = HashMap::with_capacity(tokens.len());
        for (pos, term) in tokens.into_iter().enumerate().rev() {
            fresh.insert(term, token_position(id, pos)?);
        }
        let stale: HashSet<String> = match self.docs.get(&id) {
            Some(old) => self.tokenizer.tokenize(old).into_iter().collect(),
            None => HashSet::new(),
        };

        let codec = self.config.codec;
        match &mut self.postings {
            Postings::Raw(map) => apply_document(map, id, &stale, &fresh),
            Postings::Compressed(map) => {
                let touched: HashSet<&String> = stale.iter().chain(fresh.keys()).collect();
                let mut scratch = HashMap::with_capacity(touched.len());
                for term in &touched {
                    if let Some(bits) = map.get(term.as_str()) {
                        let list =
                            decode_postings(bits, codec).map_err(|e| IndexError::codec(term, e))?;
                        scratch.insert((*term).clone(), list);
                    }
                }
                apply_document(&mut scratch, id, &stale, &fresh);
                let mut encoded: Vec<(String, Option<Bits>)> = Vec::with_capacity(touched.len());
                for term in touched {
                    let bits = match scratch.get(term) {
                        Some(list) => Some(
                            encode_postings(list, codec).map_err(|e| IndexError::codec(term, e))?,
                        ),
                        None => None,
                    };
                    encoded.push((term.clone(), bits));
                }
                for (term, bits) in encoded {
                    match bits {
                        Some(bits) => {
                            map.insert(term, bits);
                        }
                        None => {
                            map.remove(&term);
                        }
                    }
                }
            }
        }

        let replaced = self.docs.contains_key(&id);
        tracing::debug!(doc_id = id, terms = fresh.len(), replaced, "indexed document");
        self.docs.insert(id, text);
        Ok(())
    }

    /// Insert every `(id, text)` record in order; returns how many were indexed.
    pub fn extend_documents<I, S>(&mut self, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = (DocId, S)>,
        S: Into<String>,
    {
        let mut count = 0;
        for (id, text) in records {
            self.insert_document(id, text)?;
            count += 1;
        }
        Ok(count)
    }

    /// Postings of `term`; empty when the term was never indexed.
    pub fn postings_for(&self, term: &str) -> Result<Cow<'_, PostingList>> {
        match &self.postings {
            Postings::Raw(map) => {
                Ok(map.get(term).map_or_else(|| Cow::Owned(PostingList::new()), Cow::Borrowed))
            }
            Postings::Compressed(map) => match map.get(term) {
                Some(bits) => decode_postings(bits, self.config.codec)
                    .map(Cow::Owned)
                    .map_err(|e| IndexError::codec(term, e)),
                None => Ok(Cow::Owned(PostingList::new())),
            },
        }
    }

    /// Replace every raw postings list with its coded form.
    ///
    /// All-or-nothing: on error the index keeps its raw postings.
    pub fn compress(&mut self) -> Result<()> {
        let Postings::Raw(map) = &self.postings else {
            tracing::debug!("postings already compressed");
            return Ok(());
        };
        let codec = self.config.codec;
        let before = self.stats().postings_bytes;
        let mut coded = HashMap::with_capacity(map.len());
        for (term, list) in map {
            match encode_postings(list, codec) {
                Ok(bits) => {
                    coded.insert(term.clone(), bits);
                }
                Err(e) => {
                    tracing::warn!(%term, error = %e, "compression aborted, postings left raw");
                    return Err(IndexError::codec(term, e));
                }
            }
        }
        self.postings = Postings::Compressed(coded);
        let after = self.stats().postings_bytes;
        tracing::info!(
            %codec,
            terms = self.num_terms(),
            bytes_before = before,
            bytes_after = after,
            "compressed postings"
        );
        Ok(())
    }

    /// Restore raw postings. All-or-nothing like [`compress`](Self::compress).
    pub fn decompress(&mut self) -> Result<()> {
        let Postings::Compressed(map) = &self.postings else {
            tracing::debug!("postings already raw");
            return Ok(());
        };
        let codec = self.config.codec;
        let mut raw = HashMap::with_capacity(map.len());
        for (term, bits) in map {
            match decode_postings(bits, codec) {
                Ok(list) => {
                    raw.insert(term.clone(), list);
                }
                Err(e) => {
                    tracing::warn!(%term, error = %e, "decompression aborted, postings left coded");
                    return Err(IndexError::codec(term, e));
                }
            }
        }
        self.postings = Postings::Raw(raw);
        tracing::info!(%codec, terms = self.num_terms(), "decompressed postings");
        Ok(())
    }

    pub fn stats(&self) -> IndexStats {
        let (num_postings, postings_bytes) = match &self.postings {
            Postings::Raw(map) => map.iter().fold((0, 0), |(n, bytes), (term, list)| {
                (n + list.len(), bytes + term.capacity() + raw_heap_bytes(list))
            }),
            Postings::Compressed(map) => map.iter().fold((0, 0), |(n, bytes), (term, bits)| {
                let len = encoded_len(bits, self.config.codec).unwrap_or_else(|e| {
                    tracing::warn!(%term, error = %e, "unreadable postings header, counted as empty");
                    0
                });
                (n + len, bytes + term.capacity() + bits.heap_bytes())
            }),
        };
        IndexStats {
            num_docs: self.docs.len(),
            num_terms: self.postings.len(),
            num_postings,
            postings_bytes,
            compressed: self.is_compressed(),
        }
    }

    #[cfg(test)]
    pub(crate) fn compressed_bits_mut(&mut self, term: &str) -> Option<&mut Bits> {
        match &mut self.postings {
            Postings::Compressed(map) => map.get_mut(term),
            Postings::Raw(_) => None,
        }
    }
}

impl fmt::Debug for InvertedIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvertedIndex")
            .field("config", &self.config)
            .field("docs", &self.docs.len())
            .field("terms", &self.postings.len())
            .field("compressed", &self.is_compressed())
            .finish()
    }
}

fn token_position(id: DocId, pos: usize) -> Result<Position> {
    Position::try_from(pos).map_err(|_| IndexError::DocumentTooLong { id, tokens: pos + 1 })
}

/// Drop `id` from the lists of its previous terms, then record its new positions.
fn apply_document(
    map: &mut HashMap<String, PostingList>,
    id: DocId,
    stale: &HashSet<String>,
    fresh: &HashMap<String, Position>,
) {
    for term in stale {
        if let Some(list) = map.get_mut(term) {
            list.remove(&id);
            if list.is_empty() {
                map.remove(term);
            }
        }
    }
    for (term, &pos) in fresh {
        map.entry(term.clone()).or_default().insert(id, pos);
    }
}
