//! In-memory inverted index with first-position ranking, a naive scan baseline and
//! Elias gamma/delta postings compression.

mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod index;
pub mod naive;
pub mod postings;
pub mod search;
pub mod tokenizer;

pub type DocId = u32;
/// Zero-based index into a document's token sequence.
pub type Position = u32;

pub use codec::{CodecError, CodecKind};
pub use config::{IndexConfig, Language, TokenizerConfig};
pub use error::IndexError;
pub use index::{IndexStats, InvertedIndex};
pub use naive::NaiveMatcher;
pub use postings::PostingList;
pub use search::SearchHit;
pub use tokenizer::{NormalizingTokenizer, Tokenizer, WhitespaceTokenizer};
