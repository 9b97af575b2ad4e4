//! Postings lists and their bit-coded form.
//!
//! Encoded layout, every value written with the index's [`CodecKind`]:
//!
//! ```text
//! count + 1
//! first_doc_id + 1, first_position + 1
//! doc_gap,          position + 1        (repeated count - 1 times)
//! ```
//!
//! Doc ids are strictly increasing, so every gap is at least 1. Shifting the other
//! values by one keeps zero out of the stream for both code families.

use crate::codec::{BitReader, Bits, CodecError, CodecKind};
use crate::{DocId, Position};
use std::collections::BTreeMap;
use std::mem::size_of;

/// Documents containing a term, with the term's first position in each.
pub type PostingList = BTreeMap<DocId, Position>;

pub fn encode_postings(list: &PostingList, codec: CodecKind) -> Result<Bits, CodecError> {
    let mut out = Bits::new();
    codec.write(&mut out, list.len() as u64 + 1)?;
    let mut prev: Option<DocId> = None;
    for (&doc_id, &position) in list {
        let gap = match prev {
            None => u64::from(doc_id) + 1,
            Some(p) => u64::from(doc_id - p),
        };
        codec.write(&mut out, gap)?;
        codec.write(&mut out, u64::from(position) + 1)?;
        prev = Some(doc_id);
    }
    out.shrink_to_fit();
    Ok(out)
}

pub fn decode_postings(bits: &Bits, codec: CodecKind) -> Result<PostingList, CodecError> {
    let mut reader = BitReader::new(bits);
    let count = codec.read(&mut reader)? - 1;
    let mut list = PostingList::new();
    let mut prev: Option<DocId> = None;
    for _ in 0..count {
        let offset = reader.position();
        let gap = codec.read(&mut reader)?;
        let doc_id = match prev {
            None => Some(gap - 1),
            Some(p) => u64::from(p).checked_add(gap),
        };
        let doc_id = doc_id
            .and_then(|id| DocId::try_from(id).ok())
            .ok_or(CodecError::MalformedCode { offset, reason: "document id out of range" })?;
        let offset = reader.position();
        let position = Position::try_from(codec.read(&mut reader)? - 1)
            .map_err(|_| CodecError::MalformedCode { offset, reason: "position out of range" })?;
        list.insert(doc_id, position);
        prev = Some(doc_id);
    }
    if reader.remaining() != 0 {
        let offset = reader.position();
        return Err(CodecError::MalformedCode { offset, reason: "trailing bits after postings" });
    }
    Ok(list)
}

/// Number of entries in a coded list, read from its header alone.
pub fn encoded_len(bits: &Bits, codec: CodecKind) -> Result<usize, CodecError> {
    let count = codec.read(&mut BitReader::new(bits))? - 1;
    usize::try_from(count).map_err(|_| CodecError::MalformedCode { offset: 0, reason: "entry count out of range" })
}

// std's B-tree leaves hold up to 11 entries plus parent/length bookkeeping.
const BTREE_NODE_ENTRIES: usize = 11;
const BTREE_NODE_OVERHEAD: usize = 2 * size_of::<usize>();

/// Rough heap footprint of a raw postings list.
pub fn raw_heap_bytes(list: &PostingList) -> usize {
    if list.is_empty() {
        return 0;
    }
    let nodes = list.len().div_ceil(BTREE_NODE_ENTRIES);
    nodes * (BTREE_NODE_ENTRIES * (size_of::<DocId>() + size_of::<Position>()) + BTREE_NODE_OVERHEAD)
}
