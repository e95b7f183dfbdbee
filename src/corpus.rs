//! Core corpus data model: documents as delivered by acquisition, and the
//! addressable legal units the segmenter extracts from them.

use serde::{Deserialize, Serialize};

/// The kind of addressable provision a [`LegalUnit`] represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Constitutional article ("Article 19", "Article 19A").
    Article,
    /// Code section ("Section 302. Punishment of qatl-i-amd").
    Section,
}

/// One addressable statutory provision.
///
/// `number` + `source` uniquely identify a unit. Units are created once per
/// parse of a source document and are immutable thereafter; re-running
/// ingestion is the only way to replace them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LegalUnit {
    pub kind: UnitKind,
    /// Normalized identifier, digits plus optional trailing letters ("19A").
    pub number: String,
    /// Short label. Synthesized as `"Article {number}"` for constitutional
    /// articles; the captured heading phrase for code sections, absent when
    /// the source text carried none.
    pub title: Option<String>,
    /// Full provision text. May be empty when two markers were adjacent in
    /// the source; the segmenter counts those rather than erroring.
    pub body: String,
    /// Origin document tag ("Constitution", "PPC", "CrPC").
    pub source: String,
}

/// Segmentation family of a source document.
///
/// A small closed set: constitutions are article-delimited, penal and
/// procedural codes are section-delimited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentFamily {
    Constitution,
    Code,
}

impl DocumentFamily {
    /// Default family for a source tag: "Constitution" parses as articles,
    /// everything else as code sections.
    pub fn for_source(source: &str) -> Self {
        if source.eq_ignore_ascii_case("constitution") {
            DocumentFamily::Constitution
        } else {
            DocumentFamily::Code
        }
    }
}

/// Raw document text plus its source tag, as delivered by the external
/// acquisition step. Text is assumed already extracted from any binary
/// format (naive concatenation of paginated extraction included).
#[derive(Clone, Debug)]
pub struct SourceDocument {
    pub source: String,
    pub family: DocumentFamily,
    pub text: String,
}

impl SourceDocument {
    /// Creates a document, inferring the family from the source tag.
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        let source = source.into();
        let family = DocumentFamily::for_source(&source);
        Self {
            source,
            family,
            text: text.into(),
        }
    }

    /// Overrides the inferred segmentation family.
    #[must_use]
    pub fn with_family(mut self, family: DocumentFamily) -> Self {
        self.family = family;
        self
    }
}
