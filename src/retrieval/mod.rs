//! Query-time retrieval: embed the question, over-fetch candidates, then
//! select a diverse subset with Maximal Marginal Relevance.
//!
//! MMR trades relevance against redundancy: at each step it picks the
//! remaining candidate maximizing
//! `lambda * sim(query, candidate) - (1 - lambda) * max_selected sim(candidate, selected)`.
//! When the candidate pool is no larger than `k`, the policy degenerates to
//! plain similarity ranking.

use std::sync::Arc;

use crate::chunking::Chunk;
use crate::embeddings::EmbeddingProvider;
use crate::index::{IndexHit, VectorIndex, cosine_similarity};
use crate::types::LexError;

/// Retrieval tuning knobs.
#[derive(Clone, Copy, Debug)]
pub struct RetrieverConfig {
    /// Number of chunks selected per query.
    pub k: usize,
    /// Candidate pool size fetched before MMR selection.
    pub pool_size: usize,
    /// Relevance/diversity trade-off; 1.0 is pure relevance.
    pub lambda: f32,
    /// Minimum query similarity for a candidate to stay in the pool. A query
    /// whose entire pool falls below this floor yields an empty result.
    pub min_score: f32,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            k: 4,
            pool_size: 20,
            lambda: 0.5,
            min_score: 0.05,
        }
    }
}

/// A retrieved chunk with its query relevance score.
#[derive(Clone, Debug)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Ordered retrieval result, most relevant/diverse first. Selection order is
/// final; it is never re-sorted downstream.
#[derive(Clone, Debug, Default)]
pub struct QueryResult {
    pub hits: Vec<ScoredChunk>,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }
}

/// Diversity-aware retriever over a shared immutable index.
///
/// Precondition: `provider` must be the same embedding collaborator the
/// index was built with. A mismatch is a deployment misconfiguration and is
/// not detected here beyond the vector-dimension check in the index.
pub struct Retriever {
    index: Arc<VectorIndex>,
    provider: Arc<dyn EmbeddingProvider>,
    config: RetrieverConfig,
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("index", &self.index)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Retriever {
    pub fn new(
        index: Arc<VectorIndex>,
        provider: Arc<dyn EmbeddingProvider>,
        config: RetrieverConfig,
    ) -> Result<Self, LexError> {
        if config.k == 0 {
            return Err(LexError::InvalidConfig(
                "retriever k must be greater than zero".to_string(),
            ));
        }
        if config.pool_size < config.k {
            return Err(LexError::InvalidConfig(format!(
                "candidate pool ({}) must be at least k ({})",
                config.pool_size, config.k
            )));
        }
        if !(0.0..=1.0).contains(&config.lambda) {
            return Err(LexError::InvalidConfig(format!(
                "lambda must lie in [0, 1], got {}",
                config.lambda
            )));
        }
        Ok(Self {
            index,
            provider,
            config,
        })
    }

    pub fn config(&self) -> RetrieverConfig {
        self.config
    }

    /// Retrieves up to `k` diverse, relevant chunks for a question.
    pub async fn retrieve(&self, question: &str, k: usize) -> Result<QueryResult, LexError> {
        let question_batch = [question.to_string()];
        let mut vectors = self.provider.embed_batch(&question_batch).await?;
        if vectors.is_empty() {
            return Err(LexError::Embedding(
                "provider returned no embedding for the question".to_string(),
            ));
        }
        let query = vectors.remove(0);

        let pool_size = self.config.pool_size.max(k);
        let pool: Vec<IndexHit> = self
            .index
            .search(&query, pool_size)?
            .into_iter()
            .filter(|hit| hit.score >= self.config.min_score)
            .collect();

        tracing::debug!(
            candidates = pool.len(),
            k,
            "retrieval candidate pool assembled"
        );

        Ok(QueryResult {
            hits: mmr_select(&pool, k, self.config.lambda),
        })
    }
}

/// Greedy MMR over a pool pre-ranked by query similarity.
///
/// Ties break toward the earlier candidate, i.e. the better original
/// similarity rank, with document order inherited from the index's stable
/// ranking. A pool no larger than `k` is returned as-is.
fn mmr_select(pool: &[IndexHit], k: usize, lambda: f32) -> Vec<ScoredChunk> {
    if pool.len() <= k {
        return pool
            .iter()
            .map(|hit| ScoredChunk {
                chunk: hit.chunk.clone(),
                score: hit.score,
            })
            .collect();
    }

    let mut remaining: Vec<usize> = (0..pool.len()).collect();
    let mut selected: Vec<usize> = Vec::with_capacity(k);

    while selected.len() < k && !remaining.is_empty() {
        let mut best_position = 0usize;
        let mut best_score = f32::NEG_INFINITY;
        for (position, &candidate) in remaining.iter().enumerate() {
            let redundancy = selected
                .iter()
                .map(|&chosen| cosine_similarity(&pool[candidate].vector, &pool[chosen].vector))
                .fold(0.0f32, f32::max);
            let score = lambda * pool[candidate].score - (1.0 - lambda) * redundancy;
            // Strict comparison keeps the earlier (better-ranked) candidate
            // on ties.
            if score > best_score {
                best_score = score;
                best_position = position;
            }
        }
        selected.push(remaining.remove(best_position));
    }

    selected
        .into_iter()
        .map(|candidate| ScoredChunk {
            chunk: pool[candidate].chunk.clone(),
            score: pool[candidate].score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use uuid::Uuid;

    use super::*;
    use crate::chunking::ChunkOrigin;
    use crate::corpus::UnitKind;
    use crate::embeddings::MockEmbeddingProvider;
    use crate::index::VectorIndex;

    fn hit(number: &str, score: f32, vector: Vec<f32>) -> IndexHit {
        IndexHit {
            chunk: Chunk {
                id: Uuid::new_v4(),
                text: format!("text of {number}"),
                origin: ChunkOrigin {
                    kind: UnitKind::Article,
                    number: number.to_string(),
                    title: Some(format!("Article {number}")),
                    source: "Constitution".to_string(),
                },
                sequence_index: 0,
            },
            score,
            vector,
        }
    }

    #[test]
    fn k_of_one_returns_highest_similarity_candidate() {
        let pool = vec![
            hit("1", 0.9, vec![1.0, 0.0, 0.0]),
            hit("2", 0.8, vec![0.9, 0.1, 0.0]),
            hit("3", 0.2, vec![0.0, 1.0, 0.0]),
        ];
        let selected = mmr_select(&pool, 1, 0.5);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].chunk.origin.number, "1");
    }

    #[test]
    fn selection_never_duplicates_and_never_exceeds_k() {
        let pool: Vec<IndexHit> = (0..30)
            .map(|n| {
                let angle = n as f32 * 0.1;
                hit(
                    &n.to_string(),
                    1.0 - n as f32 * 0.01,
                    vec![angle.cos(), angle.sin(), 0.0],
                )
            })
            .collect();
        let selected = mmr_select(&pool, 5, 0.5);
        assert_eq!(selected.len(), 5);
        let mut numbers: Vec<String> = selected
            .iter()
            .map(|scored| scored.chunk.origin.number.clone())
            .collect();
        numbers.sort();
        numbers.dedup();
        assert_eq!(numbers.len(), 5, "no duplicate chunks selected");
    }

    #[test]
    fn small_pool_degenerates_to_similarity_ranking() {
        let pool = vec![
            hit("1", 0.9, vec![1.0, 0.0]),
            hit("2", 0.5, vec![0.0, 1.0]),
        ];
        let selected = mmr_select(&pool, 4, 0.5);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].chunk.origin.number, "1");
        assert_eq!(selected[1].chunk.origin.number, "2");
    }

    #[test]
    fn diversity_penalizes_near_duplicates() {
        // Candidate 2 is nearly identical to candidate 1; MMR should prefer
        // the dissimilar candidate 3 for the second slot despite its lower
        // query similarity.
        let pool = vec![
            hit("1", 0.95, vec![1.0, 0.0, 0.0]),
            hit("2", 0.94, vec![0.999, 0.01, 0.0]),
            hit("3", 0.60, vec![0.0, 1.0, 0.0]),
            hit("4", 0.10, vec![0.0, 0.0, 1.0]),
        ];
        let selected = mmr_select(&pool, 2, 0.5);
        assert_eq!(selected[0].chunk.origin.number, "1");
        assert_eq!(selected[1].chunk.origin.number, "3");
    }

    #[tokio::test]
    async fn retriever_rejects_invalid_config() {
        let provider = Arc::new(MockEmbeddingProvider::new());
        let index = Arc::new(
            VectorIndex::build(provider.as_ref(), Vec::new())
                .await
                .unwrap(),
        );

        let err = Retriever::new(
            index.clone(),
            provider.clone(),
            RetrieverConfig {
                k: 0,
                ..RetrieverConfig::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, LexError::InvalidConfig(_)));

        let err = Retriever::new(
            index.clone(),
            provider.clone(),
            RetrieverConfig {
                k: 10,
                pool_size: 5,
                ..RetrieverConfig::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, LexError::InvalidConfig(_)));

        let err = Retriever::new(
            index,
            provider,
            RetrieverConfig {
                lambda: 1.5,
                ..RetrieverConfig::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, LexError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn relevance_floor_filters_unrelated_candidates() {
        let provider = Arc::new(MockEmbeddingProvider::new());
        let chunks = vec![Chunk {
            id: Uuid::new_v4(),
            text: "freedom speech expression citizens press".to_string(),
            origin: ChunkOrigin {
                kind: UnitKind::Article,
                number: "19".to_string(),
                title: Some("Article 19".to_string()),
                source: "Constitution".to_string(),
            },
            sequence_index: 0,
        }];
        let index = Arc::new(
            VectorIndex::build(provider.as_ref(), chunks).await.unwrap(),
        );
        let retriever = Retriever::new(
            index,
            provider,
            RetrieverConfig {
                min_score: 0.3,
                ..RetrieverConfig::default()
            },
        )
        .unwrap();

        let unrelated = retriever
            .retrieve("boiling temperature water chemistry", 4)
            .await
            .unwrap();
        assert!(unrelated.is_empty());

        let related = retriever.retrieve("freedom speech", 4).await.unwrap();
        assert_eq!(related.len(), 1);
    }

    // Maps any text mentioning "speech" onto one axis and everything else
    // onto the orthogonal one, so candidate scores are exactly 1.0 or 0.0.
    struct AxisProvider;

    #[async_trait]
    impl EmbeddingProvider for AxisProvider {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LexError> {
            Ok(texts
                .iter()
                .map(|text| {
                    if text.contains("speech") {
                        vec![1.0, 0.0]
                    } else {
                        vec![0.0, 1.0]
                    }
                })
                .collect())
        }

        fn dimension(&self) -> usize {
            2
        }

        fn name(&self) -> &str {
            "axis"
        }
    }

    #[tokio::test]
    async fn default_relevance_floor_drops_zero_similarity_candidates() {
        let provider = Arc::new(AxisProvider);
        let chunks = vec![
            Chunk {
                id: Uuid::new_v4(),
                text: "freedom of speech for every citizen".to_string(),
                origin: ChunkOrigin {
                    kind: UnitKind::Article,
                    number: "19".to_string(),
                    title: Some("Article 19".to_string()),
                    source: "Constitution".to_string(),
                },
                sequence_index: 0,
            },
            Chunk {
                id: Uuid::new_v4(),
                text: "registration of land titles".to_string(),
                origin: ChunkOrigin {
                    kind: UnitKind::Section,
                    number: "42".to_string(),
                    title: None,
                    source: "Code".to_string(),
                },
                sequence_index: 0,
            },
        ];
        let index = Arc::new(
            VectorIndex::build(provider.as_ref(), chunks).await.unwrap(),
        );

        // The shipped default floor keeps only the relevant candidate.
        let retriever = Retriever::new(
            index.clone(),
            provider.clone(),
            RetrieverConfig::default(),
        )
        .unwrap();
        let result = retriever.retrieve("speech", 4).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.hits[0].chunk.origin.number, "19");

        // Without a floor the orthogonal candidate comes back too, so the
        // filtering above is the default floor's doing.
        let unfloored = Retriever::new(
            index,
            provider,
            RetrieverConfig {
                min_score: 0.0,
                ..RetrieverConfig::default()
            },
        )
        .unwrap();
        let result = unfloored.retrieve("speech", 4).await.unwrap();
        assert_eq!(result.len(), 2);
    }
}
