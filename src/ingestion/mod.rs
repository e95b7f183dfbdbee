//! One-shot batch ingestion: documents → units → chunks → index.
//!
//! Structural and data-quality problems are recovered per document so one
//! bad source never aborts the whole corpus build; anything that could leave
//! the index under-covering the corpus (an embedding failure) is fatal. The
//! resulting index is written exactly once at the end of a build.

use std::sync::Arc;

use crate::chunking::{Chunk, Chunker};
use crate::corpus::SourceDocument;
use crate::embeddings::EmbeddingProvider;
use crate::index::VectorIndex;
use crate::segment::SegmentStrategy;
use crate::types::LexError;

/// Counters accumulated over a corpus build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestionReport {
    /// Documents that produced at least one unit.
    pub documents: usize,
    /// Documents skipped because no units were found.
    pub skipped_documents: usize,
    /// Units emitted across all documents.
    pub units: usize,
    /// Units accepted with an empty body (adjacent markers in the source).
    pub empty_bodies: usize,
    /// Chunks embedded into the index.
    pub chunks: usize,
}

/// Batch pipeline from raw documents to a built [`VectorIndex`].
pub struct IngestionPipeline {
    chunker: Chunker,
    provider: Arc<dyn EmbeddingProvider>,
}

impl IngestionPipeline {
    pub fn new(chunker: Chunker, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { chunker, provider }
    }

    /// Segments and chunks every document, then builds the index atomically
    /// over all surviving chunks.
    pub async fn ingest(
        &self,
        documents: &[SourceDocument],
    ) -> Result<(VectorIndex, IngestionReport), LexError> {
        let mut report = IngestionReport::default();
        let mut chunks: Vec<Chunk> = Vec::new();

        for document in documents {
            let strategy = SegmentStrategy::for_family(document.family);
            match strategy.segment(&document.text, &document.source) {
                Ok(outcome) => {
                    report.documents += 1;
                    report.units += outcome.units.len();
                    report.empty_bodies += outcome.empty_bodies;
                    tracing::info!(
                        source = %document.source,
                        units = outcome.units.len(),
                        empty_bodies = outcome.empty_bodies,
                        "segmented document"
                    );
                    for unit in &outcome.units {
                        // Empty bodies are counted but carry nothing to embed.
                        if unit.body.is_empty() {
                            continue;
                        }
                        chunks.extend(self.chunker.split_unit(unit));
                    }
                }
                Err(LexError::EmptyCorpus { source }) => {
                    tracing::warn!(source = %source, "no units found, skipping document");
                    report.skipped_documents += 1;
                }
                Err(other) => return Err(other),
            }
        }

        report.chunks = chunks.len();
        let index = VectorIndex::build(self.provider.as_ref(), chunks).await?;
        tracing::info!(
            documents = report.documents,
            skipped = report.skipped_documents,
            units = report.units,
            chunks = report.chunks,
            "corpus index built"
        );
        Ok((index, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::ChunkerConfig;
    use crate::embeddings::MockEmbeddingProvider;

    fn pipeline() -> IngestionPipeline {
        IngestionPipeline::new(
            Chunker::new(ChunkerConfig::default()).unwrap(),
            Arc::new(MockEmbeddingProvider::new()),
        )
    }

    #[test]
    fn report_defaults_to_zero() {
        assert_eq!(IngestionReport::default().documents, 0);
    }

    #[tokio::test]
    async fn one_empty_document_does_not_abort_the_build() {
        let documents = vec![
            SourceDocument::new(
                "Constitution",
                "Article 19\nEvery citizen shall have the right to freedom of speech.",
            ),
            SourceDocument::new("PPC", "scanned garbage with no markers"),
        ];

        let (index, report) = pipeline().ingest(&documents).await.unwrap();
        assert_eq!(report.documents, 1);
        assert_eq!(report.skipped_documents, 1);
        assert_eq!(report.units, 1);
        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn empty_bodies_are_counted_but_not_indexed() {
        let documents = vec![SourceDocument::new(
            "Constitution",
            "Article 8\nArticle 9\nSecurity of person: no one shall be deprived of liberty.",
        )];

        let (index, report) = pipeline().ingest(&documents).await.unwrap();
        assert_eq!(report.units, 2);
        assert_eq!(report.empty_bodies, 1);
        assert_eq!(report.chunks, 1);
        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn mixed_families_ingest_together() {
        let documents = vec![
            SourceDocument::new(
                "Constitution",
                "Article 19\nFreedom of speech and expression for every citizen.",
            ),
            SourceDocument::new(
                "PPC",
                "Section 379. Punishment for theft\nWhoever commits theft shall be punished.",
            ),
        ];

        let (index, report) = pipeline().ingest(&documents).await.unwrap();
        assert_eq!(report.documents, 2);
        assert_eq!(report.units, 2);
        assert_eq!(index.len(), 2);
    }
}
