//! In-memory nearest-neighbor index over chunk embeddings, persisted as a
//! single versioned file artifact.
//!
//! Build and query use the same fixed metric (cosine); mixing metrics would
//! degrade relevance without any error, so the metric is part of the
//! persisted envelope and checked on load. Once built, an index is immutable
//! and safely shared behind an `Arc`; rebuilds produce a new index that the
//! owner swaps in, never a mutation in place.

use std::cmp::Ordering;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::chunking::Chunk;
use crate::embeddings::EmbeddingProvider;
use crate::types::LexError;

/// Bumped whenever the persisted layout, chunk schema, or chunking policy
/// changes incompatibly; an old artifact then fails to load instead of being
/// silently interpreted as compatible.
pub const INDEX_SCHEMA_VERSION: u32 = 1;

const METRIC: &str = "cosine";

/// A chunk paired with its embedding vector. Opaque to callers beyond
/// "vector associated with chunk metadata".
#[derive(Clone, Debug, Serialize, Deserialize)]
struct IndexEntry {
    chunk: Chunk,
    vector: Vec<f32>,
}

#[derive(Serialize, Deserialize)]
struct PersistedIndex {
    schema_version: u32,
    metric: String,
    embedder: String,
    dimension: usize,
    entries: Vec<IndexEntry>,
}

/// One nearest-neighbor match.
#[derive(Clone, Debug)]
pub struct IndexHit {
    pub chunk: Chunk,
    /// Cosine similarity to the query vector.
    pub score: f32,
    pub(crate) vector: Vec<f32>,
}

/// Semantic index over chunk vectors.
#[derive(Debug)]
pub struct VectorIndex {
    embedder: String,
    dimension: usize,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Embeds every chunk in the order given and builds the index.
    ///
    /// The build is atomic: if the provider fails for any subset, no index
    /// is produced, so a persisted index can never silently under-cover the
    /// corpus.
    pub async fn build(
        provider: &dyn EmbeddingProvider,
        chunks: Vec<Chunk>,
    ) -> Result<Self, LexError> {
        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let vectors = provider.embed_batch(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(LexError::Embedding(format!(
                "provider returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let dimension = provider.dimension();
        for vector in &vectors {
            if vector.len() != dimension {
                return Err(LexError::Embedding(format!(
                    "provider produced a vector of dimension {}, expected {}",
                    vector.len(),
                    dimension
                )));
            }
        }

        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry { chunk, vector })
            .collect();
        Ok(Self {
            embedder: provider.name().to_string(),
            dimension,
            entries,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Identifier of the provider the index was built with. Queries must use
    /// the same provider; this is recorded for diagnostics, not enforced.
    pub fn embedder(&self) -> &str {
        &self.embedder
    }

    /// Returns the `k` nearest entries by cosine similarity, descending.
    /// Ties keep insertion (document) order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<IndexHit>, LexError> {
        if query.len() != self.dimension {
            return Err(LexError::Embedding(format!(
                "query vector has dimension {}, index expects {}",
                query.len(),
                self.dimension
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (position, cosine_similarity(query, &entry.vector)))
            .collect();
        // Stable sort so equal scores stay in document order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(position, score)| IndexHit {
                chunk: self.entries[position].chunk.clone(),
                score,
                vector: self.entries[position].vector.clone(),
            })
            .collect())
    }

    /// Serializes the index plus chunk metadata as a unit.
    pub async fn persist(&self, path: impl AsRef<Path>) -> Result<(), LexError> {
        let envelope = PersistedIndex {
            schema_version: INDEX_SCHEMA_VERSION,
            metric: METRIC.to_string(),
            embedder: self.embedder.clone(),
            dimension: self.dimension,
            entries: self.entries.clone(),
        };
        let data =
            serde_json::to_vec(&envelope).map_err(|err| LexError::Io(err.to_string()))?;
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(path, data).await?;
        Ok(())
    }

    /// Loads a previously persisted index.
    ///
    /// Anything that was not produced by a compatible [`VectorIndex::persist`]
    /// fails with [`LexError::CorruptIndex`]; there is no fallback to an
    /// empty index.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LexError> {
        let data = fs::read(path.as_ref()).await.map_err(|err| {
            LexError::CorruptIndex(format!(
                "unable to read index at {}: {err}",
                path.as_ref().display()
            ))
        })?;
        let envelope: PersistedIndex = serde_json::from_slice(&data)
            .map_err(|err| LexError::CorruptIndex(format!("unable to parse index: {err}")))?;

        if envelope.schema_version != INDEX_SCHEMA_VERSION {
            return Err(LexError::CorruptIndex(format!(
                "schema version {} is not supported (expected {})",
                envelope.schema_version, INDEX_SCHEMA_VERSION
            )));
        }
        if envelope.metric != METRIC {
            return Err(LexError::CorruptIndex(format!(
                "index was built with metric '{}', this build queries with '{METRIC}'",
                envelope.metric
            )));
        }
        if let Some(entry) = envelope
            .entries
            .iter()
            .find(|entry| entry.vector.len() != envelope.dimension)
        {
            return Err(LexError::CorruptIndex(format!(
                "entry for unit {} has dimension {}, envelope declares {}",
                entry.chunk.origin.number,
                entry.vector.len(),
                envelope.dimension
            )));
        }

        Ok(Self {
            embedder: envelope.embedder,
            dimension: envelope.dimension,
            entries: envelope.entries,
        })
    }
}

/// Cosine similarity; zero when either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (lhs, rhs) in a.iter().zip(b) {
        dot += lhs * rhs;
        norm_a += lhs * lhs;
        norm_b += rhs * rhs;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
