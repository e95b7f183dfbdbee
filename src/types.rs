//! Crate-wide error type shared by ingestion, indexing, and query paths.

/// Errors surfaced by the lexsmith pipeline.
///
/// Ingestion-time data-quality problems ([`LexError::EmptyCorpus`]) are
/// recoverable per document; configuration and index problems are fatal.
/// Query-time failures are all distinguishable by variant and are never
/// retried internally.
// `Display`/`Error`/`From` are written by hand because `thiserror` would
// treat the `EmptyCorpus.source` field (a `String`, part of the public API)
// as the error source, which does not implement `std::error::Error`.
#[derive(Debug)]
pub enum LexError {
    /// The segmenter found no units in a document. Ingestion logs this and
    /// continues with the remaining documents.
    EmptyCorpus { source: String },

    /// Invalid chunker/retriever/composer configuration. Fatal at startup.
    InvalidConfig(String),

    /// A persisted index was unreadable or schema-incompatible. Fatal; the
    /// caller must not fall back to an empty index.
    CorruptIndex(String),

    /// The generation collaborator failed or returned an empty response.
    GenerationFailed(String),

    /// Retrieval produced no chunks above the relevance floor; the question
    /// cannot be answered from the corpus.
    NoRelevantContext,

    /// The embedding collaborator failed or returned malformed vectors.
    Embedding(String),

    Io(String),

    Http(reqwest::Error),
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexError::EmptyCorpus { source } => {
                write!(f, "no units found in document '{source}'")
            }
            LexError::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            LexError::CorruptIndex(msg) => write!(f, "corrupt or incompatible index: {msg}"),
            LexError::GenerationFailed(msg) => write!(f, "generation failed: {msg}"),
            LexError::NoRelevantContext => {
                write!(f, "no relevant context found in the corpus for this question")
            }
            LexError::Embedding(msg) => write!(f, "embedding failed: {msg}"),
            LexError::Io(msg) => write!(f, "io error: {msg}"),
            LexError::Http(err) => write!(f, "http error: {err}"),
        }
    }
}

impl std::error::Error for LexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LexError::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for LexError {
    fn from(err: reqwest::Error) -> Self {
        LexError::Http(err)
    }
}

impl From<std::io::Error> for LexError {
    fn from(err: std::io::Error) -> Self {
        LexError::Io(err.to_string())
    }
}
