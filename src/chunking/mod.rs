//! Splits long legal units into bounded, overlapping retrieval chunks.
//!
//! Each chunk carries a copied [`ChunkOrigin`] back-reference for citation
//! lookup; lineage is by value, never by pointer, since units are immutable.
//! Boundaries are measured in grapheme clusters so a split can never land
//! inside a multi-byte character, and a chunk always starts exactly
//! `overlap_chars` graphemes before the previous chunk's end, which makes
//! reconstruction by trailing-overlap removal exact.

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;
use uuid::Uuid;

use crate::corpus::{LegalUnit, UnitKind};
use crate::types::LexError;

/// Non-owning back-reference from a chunk to its originating unit, used
/// purely for citation lookup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkOrigin {
    pub kind: UnitKind,
    pub number: String,
    pub title: Option<String>,
    pub source: String,
}

impl ChunkOrigin {
    /// Copies the identity fields of a unit.
    pub fn of(unit: &LegalUnit) -> Self {
        Self {
            kind: unit.kind,
            number: unit.number.clone(),
            title: unit.title.clone(),
            source: unit.source.clone(),
        }
    }
}

/// A retrieval-sized slice of a unit's body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: Uuid,
    pub text: String,
    pub origin: ChunkOrigin,
    /// Position within the unit's split sequence, from 0. Diagnostic only.
    pub sequence_index: usize,
}

/// Chunking limits, in grapheme clusters.
///
/// Defaults match the original corpus build: 1000-character chunks with a
/// 150-character overlap.
#[derive(Clone, Copy, Debug)]
pub struct ChunkerConfig {
    pub max_chars: usize,
    pub overlap_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chars: 1000,
            overlap_chars: 150,
        }
    }
}

// Preferred split points, most structural first. Each chunk ends just after
// the separator so concatenation covers the body without loss.
const PARAGRAPH_BREAKS: &[&str] = &["\n\n"];
const SENTENCE_BREAKS: &[&str] = &[". ", ".\n", "? ", "?\n", "! ", "!\n"];

/// Splits unit bodies into overlapping chunks under a fixed length budget.
#[derive(Clone, Debug)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    /// Validates the configuration up front. An overlap that reaches the
    /// maximum length would produce non-advancing boundaries, so it is
    /// rejected with [`LexError::InvalidConfig`] rather than looping.
    pub fn new(config: ChunkerConfig) -> Result<Self, LexError> {
        if config.max_chars == 0 {
            return Err(LexError::InvalidConfig(
                "chunk max_chars must be greater than zero".to_string(),
            ));
        }
        if config.overlap_chars >= config.max_chars {
            return Err(LexError::InvalidConfig(format!(
                "chunk overlap ({}) must be smaller than max length ({})",
                config.overlap_chars, config.max_chars
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> ChunkerConfig {
        self.config
    }

    /// Splits one unit's body into chunks.
    ///
    /// A body at or under `max_chars` yields exactly one chunk equal to the
    /// whole body. Longer bodies are cut at the structural break nearest
    /// below the limit, falling back to a hard cut, with each subsequent
    /// chunk starting `overlap_chars` before the previous end.
    pub fn split_unit(&self, unit: &LegalUnit) -> Vec<Chunk> {
        let origin = ChunkOrigin::of(unit);
        let body = unit.body.as_str();
        // Byte offset of every grapheme boundary; index `total` maps to EOF.
        let boundaries: Vec<usize> = body.grapheme_indices(true).map(|(at, _)| at).collect();
        let total = boundaries.len();
        let byte_at = |grapheme: usize| {
            if grapheme == total {
                body.len()
            } else {
                boundaries[grapheme]
            }
        };

        if total <= self.config.max_chars {
            return vec![Chunk {
                id: Uuid::new_v4(),
                text: body.to_string(),
                origin,
                sequence_index: 0,
            }];
        }

        let mut chunks = Vec::new();
        let mut start = 0usize;
        loop {
            let hard_end = (start + self.config.max_chars).min(total);
            let end = if hard_end == total {
                total
            } else {
                self.snap_end(body, &boundaries, start, hard_end)
            };

            chunks.push(Chunk {
                id: Uuid::new_v4(),
                text: body[byte_at(start)..byte_at(end)].to_string(),
                origin: origin.clone(),
                sequence_index: chunks.len(),
            });

            if end == total {
                break;
            }
            start = end - self.config.overlap_chars;
        }
        chunks
    }

    /// Picks the chunk end nearest below `hard_end`, preferring paragraph
    /// breaks, then sentence breaks, then the hard limit. The end must lie
    /// strictly past `start + overlap` so the next start always advances.
    fn snap_end(&self, body: &str, boundaries: &[usize], start: usize, hard_end: usize) -> usize {
        let min_end = start + self.config.overlap_chars + 1;
        let window = &body[boundaries[start]..boundaries[hard_end]];

        for separators in [PARAGRAPH_BREAKS, SENTENCE_BREAKS] {
            let mut best: Option<usize> = None;
            for separator in separators {
                let Some(found) = window.rfind(separator) else {
                    continue;
                };
                let end_byte = boundaries[start] + found + separator.len();
                // Separators are ASCII, but only accept ends that land on a
                // grapheme boundary.
                let Ok(end) = boundaries.binary_search(&end_byte) else {
                    continue;
                };
                if end >= min_end {
                    best = Some(best.map_or(end, |current| current.max(end)));
                }
            }
            if let Some(end) = best {
                return end;
            }
        }
        hard_end
    }
}
