//! The application-context object tying the pipeline together.
//!
//! A [`LawAssistant`] is constructed once at startup with the collaborator
//! handles and a built (or loaded) index, then shared immutably across any
//! number of concurrent requests. Swapping in a rebuilt index means building
//! a new assistant; nothing is mutated in place.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::answer::{AnswerComposer, Citation, ComposerConfig};
use crate::embeddings::EmbeddingProvider;
use crate::generation::GenerationProvider;
use crate::index::VectorIndex;
use crate::retrieval::{Retriever, RetrieverConfig};
use crate::types::LexError;

/// Response of the one operation the front end invokes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub citations: Vec<Citation>,
}

/// Query-time facade over retriever and composer.
#[derive(Debug)]
pub struct LawAssistant {
    retriever: Retriever,
    composer: AnswerComposer,
    k: usize,
}

impl LawAssistant {
    pub fn builder() -> LawAssistantBuilder {
        LawAssistantBuilder::default()
    }

    /// Answers a question from the corpus, with citations.
    ///
    /// Failures are surfaced with a distinguishable reason:
    /// [`LexError::NoRelevantContext`] when nothing in the corpus is
    /// relevant enough to ground an answer, [`LexError::GenerationFailed`]
    /// when the generation collaborator fails. Nothing is retried here.
    pub async fn ask(&self, question: &str) -> Result<AskResponse, LexError> {
        let retrieved = self.retriever.retrieve(question, self.k).await?;
        tracing::debug!(hits = retrieved.len(), "retrieved grounding chunks");

        let answer = self.composer.answer(question, &retrieved.hits).await?;
        Ok(AskResponse {
            answer: answer.text,
            citations: answer.citations,
        })
    }
}

/// Builder collecting the collaborators and configuration for a
/// [`LawAssistant`].
#[derive(Default)]
pub struct LawAssistantBuilder {
    index: Option<Arc<VectorIndex>>,
    embedding: Option<Arc<dyn EmbeddingProvider>>,
    generation: Option<Arc<dyn GenerationProvider>>,
    retriever_config: Option<RetrieverConfig>,
    composer_config: Option<ComposerConfig>,
}

impl LawAssistantBuilder {
    #[must_use]
    pub fn with_index(mut self, index: Arc<VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Must be the same provider the index was built with.
    #[must_use]
    pub fn with_embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding = Some(provider);
        self
    }

    #[must_use]
    pub fn with_generation_provider(mut self, provider: Arc<dyn GenerationProvider>) -> Self {
        self.generation = Some(provider);
        self
    }

    #[must_use]
    pub fn with_retriever_config(mut self, config: RetrieverConfig) -> Self {
        self.retriever_config = Some(config);
        self
    }

    #[must_use]
    pub fn with_composer_config(mut self, config: ComposerConfig) -> Self {
        self.composer_config = Some(config);
        self
    }

    pub fn build(self) -> Result<LawAssistant, LexError> {
        let index = self
            .index
            .ok_or_else(|| LexError::InvalidConfig("assistant requires an index".to_string()))?;
        let embedding = self.embedding.ok_or_else(|| {
            LexError::InvalidConfig("assistant requires an embedding provider".to_string())
        })?;
        let generation = self.generation.ok_or_else(|| {
            LexError::InvalidConfig("assistant requires a generation provider".to_string())
        })?;

        let retriever_config = self.retriever_config.unwrap_or_default();
        let retriever = Retriever::new(index, embedding, retriever_config)?;
        let composer = AnswerComposer::new(generation, self.composer_config.unwrap_or_default())?;

        Ok(LawAssistant {
            retriever,
            composer,
            k: retriever_config.k,
        })
    }
}
