//! Embedding collaborator contract and implementations.
//!
//! The pipeline never talks to a model directly; it goes through
//! [`EmbeddingProvider`] so ingestion and retrieval stay testable without a
//! live model. The same provider instance must be used at build time and at
//! query time — mismatched models silently degrade relevance and are a
//! deployment precondition, not something this crate defends against.

mod http;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::types::LexError;

pub use http::HttpEmbeddingProvider;

/// Text-to-vector collaborator. Implementations must be internally safe for
/// concurrent use; the pipeline shares one handle across requests.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds every input text, preserving order. A failure for any subset
    /// must fail the whole call; callers rely on that for atomic builds.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LexError>;

    /// Fixed output dimension of every vector this provider produces.
    fn dimension(&self) -> usize;

    /// Stable identifier recorded in persisted indexes.
    fn name(&self) -> &str;
}

// Common function words carry no retrieval signal for the mock; filtering
// them keeps unrelated questions at zero similarity.
const MOCK_STOPWORDS: &[&str] = &[
    "a", "an", "and", "any", "are", "be", "by", "for", "in", "is", "it", "of", "on", "or", "shall",
    "such", "that", "the", "to", "what", "which", "with",
];

/// Deterministic embedding provider for tests and offline runs.
///
/// Each text becomes a normalized bag-of-tokens vector: every non-stopword
/// token hashes to a pseudo-random direction and the directions are summed.
/// Identical texts embed identically, and texts sharing vocabulary score
/// higher under cosine similarity than unrelated ones, which is enough to
/// exercise retrieval end to end.
#[derive(Debug)]
pub struct MockEmbeddingProvider {
    dimension: usize,
    batches: Mutex<usize>,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        // Same width as the MiniLM family; wide enough that unrelated texts
        // stay near zero cosine similarity.
        Self::with_dimension(384)
    }

    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension,
            batches: Mutex::new(0),
        }
    }

    /// Number of `embed_batch` calls served so far.
    pub fn batches(&self) -> usize {
        *self.batches.lock()
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in tokenize(text) {
            let seed = hash_token(token);
            for (position, slot) in vector.iter_mut().enumerate() {
                *slot += component(seed, position);
            }
        }
        let norm: f32 = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if norm > 0.0 {
            for slot in &mut vector {
                *slot /= norm;
            }
        }
        vector
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LexError> {
        *self.batches.lock() += 1;
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "mock-token-hash"
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| token.len() > 1)
        .filter(|token| {
            !MOCK_STOPWORDS
                .iter()
                .any(|stop| token.eq_ignore_ascii_case(stop))
        })
}

fn hash_token(token: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    token.to_ascii_lowercase().hash(&mut hasher);
    hasher.finish()
}

fn component(seed: u64, position: usize) -> f32 {
    let mut hasher = DefaultHasher::new();
    (seed, position).hash(&mut hasher);
    let bits = hasher.finish();
    (bits as f64 / u64::MAX as f64) as f32 * 2.0 - 1.0
}
