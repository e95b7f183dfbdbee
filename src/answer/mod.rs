//! Grounded answer composition: build a context from retrieved chunks, fill
//! the fixed instruction template, delegate to the generation collaborator,
//! and derive citations from chunk provenance.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::chunking::Chunk;
use crate::generation::GenerationProvider;
use crate::retrieval::ScoredChunk;
use crate::types::LexError;

/// Provenance of a passage used in an answer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub source: String,
    pub number: String,
    pub title: Option<String>,
}

impl Citation {
    fn of(chunk: &Chunk) -> Self {
        Self {
            source: chunk.origin.source.clone(),
            number: chunk.origin.number.clone(),
            title: chunk.origin.title.clone(),
        }
    }
}

/// A grounded answer with the provenance of every passage that informed it.
#[derive(Clone, Debug)]
pub struct Answer {
    pub text: String,
    /// Derived strictly from chunk origins, deduplicated by
    /// (source, number), first occurrence first. Never taken from generator
    /// output.
    pub citations: Vec<Citation>,
}

/// Context assembly limits.
#[derive(Clone, Debug)]
pub struct ComposerConfig {
    /// Cap on the grounding context, in characters. Whole chunks are dropped
    /// from the end when the cap would be exceeded; a chunk is never cut
    /// mid-text. The first chunk is always grounded whole, so a single chunk
    /// larger than the cap exceeds it rather than producing an empty context.
    pub max_context_chars: usize,
    /// Separator between chunk texts in the grounding context.
    pub delimiter: String,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            max_context_chars: 6000,
            delimiter: "\n\n---\n\n".to_string(),
        }
    }
}

// Static contract with the generator: answer only from the supplied
// passages, refuse when they are insufficient. Not configurable per request.
const ANSWER_TEMPLATE: &str = "\
You are a legal assistant for a statutory corpus. Answer the question using \
only the context passages below. If the context does not contain the answer, \
state that the provided material does not answer the question. Do not guess \
or make up facts.

Context:
{context}

Question: {question}

Answer in formal legal English, citing the provisions you rely on.";

/// Assembles grounded prompts and delegates generation.
pub struct AnswerComposer {
    provider: Arc<dyn GenerationProvider>,
    config: ComposerConfig,
}

impl std::fmt::Debug for AnswerComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerComposer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AnswerComposer {
    pub fn new(
        provider: Arc<dyn GenerationProvider>,
        config: ComposerConfig,
    ) -> Result<Self, LexError> {
        if config.max_context_chars == 0 {
            return Err(LexError::InvalidConfig(
                "composer max_context_chars must be greater than zero".to_string(),
            ));
        }
        Ok(Self { provider, config })
    }

    /// Produces a grounded answer from retrieved chunks.
    ///
    /// Returns [`LexError::NoRelevantContext`] when no chunks survive into
    /// the grounding context (the generator is never called with nothing to
    /// ground on), and [`LexError::GenerationFailed`] for any collaborator
    /// failure or empty response.
    pub async fn answer(
        &self,
        question: &str,
        retrieved: &[ScoredChunk],
    ) -> Result<Answer, LexError> {
        let grounded = self.grounding_context(retrieved);
        if grounded.chunks.is_empty() {
            return Err(LexError::NoRelevantContext);
        }

        let prompt = ANSWER_TEMPLATE
            .replace("{context}", &grounded.context)
            .replace("{question}", question);

        tracing::debug!(
            chunks = grounded.chunks.len(),
            context_chars = grounded.context.chars().count(),
            "dispatching grounded prompt"
        );

        let text = match self.provider.generate(&prompt).await {
            Ok(text) => text,
            Err(err @ LexError::GenerationFailed(_)) => return Err(err),
            Err(other) => return Err(LexError::GenerationFailed(other.to_string())),
        };
        if text.trim().is_empty() {
            return Err(LexError::GenerationFailed(
                "generator returned an empty response".to_string(),
            ));
        }

        Ok(Answer {
            text,
            citations: citations(&grounded.chunks),
        })
    }

    /// Concatenates chunk texts in the order received, separated by the
    /// configured delimiter, truncating whole chunks from the end once the
    /// cap would be exceeded.
    fn grounding_context<'a>(&self, retrieved: &'a [ScoredChunk]) -> GroundedContext<'a> {
        let mut context = String::new();
        let mut chunks = Vec::new();
        let mut used = 0usize;

        for scored in retrieved {
            let chunk_chars = scored.chunk.text.chars().count();
            let delimiter_chars = if chunks.is_empty() {
                0
            } else {
                self.config.delimiter.chars().count()
            };
            if used + delimiter_chars + chunk_chars > self.config.max_context_chars
                && !chunks.is_empty()
            {
                break;
            }
            if !chunks.is_empty() {
                context.push_str(&self.config.delimiter);
            }
            context.push_str(&scored.chunk.text);
            used += delimiter_chars + chunk_chars;
            chunks.push(&scored.chunk);
        }

        GroundedContext { context, chunks }
    }
}

struct GroundedContext<'a> {
    context: String,
    chunks: Vec<&'a Chunk>,
}

/// Citations for the chunks that made it into the grounding context,
/// deduplicated by (source, number) in first-occurrence order.
fn citations(chunks: &[&Chunk]) -> Vec<Citation> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut out = Vec::new();
    for chunk in chunks {
        let key = (chunk.origin.source.clone(), chunk.origin.number.clone());
        if seen.insert(key) {
            out.push(Citation::of(chunk));
        }
    }
    out
}
