//! Statutory-corpus ingestion and retrieval for grounded legal question
//! answering.
//!
//! ```text
//! Raw documents ──► segment::SegmentStrategy ──► corpus::LegalUnit
//!                                  │
//!                                  ▼
//!                     chunking::Chunker ──► chunking::Chunk
//!                                  │
//!                                  ▼
//!        embeddings::EmbeddingProvider ──► index::VectorIndex
//!                                  │            │ persist / load
//!                                  ▼            ▼
//! Question ──► retrieval::Retriever (MMR) ──► answer::AnswerComposer
//!                                                  │
//!                                                  ▼
//!                        assistant::LawAssistant::ask ──► (answer, citations)
//! ```
//!
//! Ingestion is a one-shot batch pipeline ([`ingestion::IngestionPipeline`]);
//! the built [`index::VectorIndex`] is immutable and shared across concurrent
//! queries. Embedding and generation models are external collaborators behind
//! the [`embeddings::EmbeddingProvider`] and [`generation::GenerationProvider`]
//! traits, with deterministic mocks for offline tests.

pub mod answer;
pub mod assistant;
pub mod chunking;
pub mod corpus;
pub mod embeddings;
pub mod generation;
pub mod index;
pub mod ingestion;
pub mod retrieval;
pub mod segment;
pub mod types;

pub use answer::{Answer, AnswerComposer, Citation, ComposerConfig};
pub use assistant::{AskResponse, LawAssistant, LawAssistantBuilder};
pub use chunking::{Chunk, ChunkOrigin, Chunker, ChunkerConfig};
pub use corpus::{DocumentFamily, LegalUnit, SourceDocument, UnitKind};
pub use embeddings::{EmbeddingProvider, HttpEmbeddingProvider, MockEmbeddingProvider};
pub use generation::{GenerationProvider, HttpGenerationProvider, MockGenerationProvider};
pub use index::{INDEX_SCHEMA_VERSION, IndexHit, VectorIndex};
pub use ingestion::{IngestionPipeline, IngestionReport};
pub use retrieval::{QueryResult, Retriever, RetrieverConfig, ScoredChunk};
pub use segment::{SegmentOutcome, SegmentStrategy};
pub use types::LexError;
