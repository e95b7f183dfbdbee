//! Structural segmentation: raw document text into ordered [`LegalUnit`]s.
//!
//! The two legal document styles are modeled as a fixed tagged-variant set
//! rather than trait objects: [`SegmentStrategy::Articles`] for
//! constitution-style text and [`SegmentStrategy::Sections`] for penal and
//! procedural codes. Both tolerate markers split across page boundaries
//! (arbitrary whitespace between the marker token and its number) and
//! numbers with trailing letters ("19A", "25A").

mod articles;
mod sections;

use crate::corpus::{DocumentFamily, LegalUnit};
use crate::types::LexError;

/// Result of segmenting one document.
#[derive(Clone, Debug)]
pub struct SegmentOutcome {
    /// Units in document order; never re-sorted.
    pub units: Vec<LegalUnit>,
    /// Units accepted with an empty body because two markers were adjacent.
    /// A data-quality count, not an error.
    pub empty_bodies: usize,
}

/// Segmentation strategy for one document family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentStrategy {
    /// `Article N` markers, body until the next marker, synthesized titles.
    Articles,
    /// `Section N.` markers with a same-line title phrase.
    Sections,
}

impl SegmentStrategy {
    /// Strategy lookup by document family.
    pub fn for_family(family: DocumentFamily) -> Self {
        match family {
            DocumentFamily::Constitution => SegmentStrategy::Articles,
            DocumentFamily::Code => SegmentStrategy::Sections,
        }
    }

    /// Segments raw text into ordered units.
    ///
    /// Returns [`LexError::EmptyCorpus`] when no markers of the expected
    /// kind exist, so ingestion can skip the document and continue.
    pub fn segment(&self, text: &str, source: &str) -> Result<SegmentOutcome, LexError> {
        let outcome = match self {
            SegmentStrategy::Articles => articles::segment(text, source),
            SegmentStrategy::Sections => sections::segment(text, source),
        };
        if outcome.units.is_empty() {
            return Err(LexError::EmptyCorpus {
                source: source.to_string(),
            });
        }
        Ok(outcome)
    }
}
