//! Article-delimited segmentation for constitution-style documents.

use std::sync::LazyLock;

use regex::Regex;

use super::SegmentOutcome;
use crate::corpus::{LegalUnit, UnitKind};

// `\s+` between the token and the number absorbs page-boundary splits left
// over from paginated text extraction.
static ARTICLE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Article\s+(\d+[A-Za-z]*)").expect("article marker pattern is valid")
});

pub(super) fn segment(text: &str, source: &str) -> SegmentOutcome {
    let markers: Vec<(usize, usize, String)> = ARTICLE_MARKER
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let number = caps.get(1)?;
            Some((whole.start(), whole.end(), number.as_str().to_string()))
        })
        .collect();

    let mut units = Vec::with_capacity(markers.len());
    let mut empty_bodies = 0usize;

    for (idx, (_, body_start, number)) in markers.iter().enumerate() {
        let body_end = markers
            .get(idx + 1)
            .map(|(next_start, _, _)| *next_start)
            .unwrap_or(text.len());
        let body = text[*body_start..body_end].trim().to_string();
        if body.is_empty() {
            empty_bodies += 1;
        }
        units.push(LegalUnit {
            kind: UnitKind::Article,
            number: number.clone(),
            title: Some(format!("Article {number}")),
            body,
            source: source.to_string(),
        });
    }

    SegmentOutcome {
        units,
        empty_bodies,
    }
}
