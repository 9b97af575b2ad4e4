use crate::codec::CodecError;
use crate::DocId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("postings for term '{term}' could not be coded: {source}")]
    Codec {
        term: String,
        #[source]
        source: CodecError,
    },

    #[error("document {id} has {tokens} tokens, more than a position can address")]
    DocumentTooLong { id: DocId, tokens: usize },
}

impl IndexError {
    pub(crate) fn codec(term: &str, source: CodecError) -> Self {
        IndexError::Codec { term: term.to_string(), source }
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
