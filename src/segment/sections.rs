//! Section-delimited segmentation for penal and procedural codes.

use std::sync::LazyLock;

use regex::Regex;

use super::SegmentOutcome;
use crate::corpus::{LegalUnit, UnitKind};

// Code sections read "Section 302. Punishment of qatl-i-amd" with the title
// phrase on the same logical line as the marker.
static SECTION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Section\s+(\d+[A-Za-z]*)\.[ \t]*").expect("section marker pattern is valid")
});

pub(super) fn segment(text: &str, source: &str) -> SegmentOutcome {
    let markers: Vec<(usize, usize, String)> = SECTION_MARKER
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let number = caps.get(1)?;
            Some((whole.start(), whole.end(), number.as_str().to_string()))
        })
        .collect();

    let mut units = Vec::with_capacity(markers.len());
    let mut empty_bodies = 0usize;

    for (idx, (_, title_start, number)) in markers.iter().enumerate() {
        let unit_end = markers
            .get(idx + 1)
            .map(|(next_start, _, _)| *next_start)
            .unwrap_or(text.len());
        let span = &text[*title_start..unit_end];

        // Title runs to the end of the marker's logical line; the body is
        // everything after it up to the next marker.
        let (title_line, body) = match span.find('\n') {
            Some(newline) => (&span[..newline], &span[newline + 1..]),
            None => (span, ""),
        };

        let title = title_line.trim();
        let title = (!title.is_empty()).then(|| title.to_string());
        let body = body.trim().to_string();
        if body.is_empty() {
            empty_bodies += 1;
        }

        units.push(LegalUnit {
            kind: UnitKind::Section,
            number: number.clone(),
            title,
            body,
            source: source.to_string(),
        });
    }

    SegmentOutcome {
        units,
        empty_bodies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_paragraph_body_runs_to_next_marker() {
        let text = "Section 378. Theft\n\
                    Whoever, intending to take dishonestly any movable property.\n\n\
                    Explanation: A thing so long as it is attached to the earth.\n\
                    Section 379. Punishment for theft\n\
                    Whoever commits theft shall be punished.";
        let outcome = segment(text, "PPC");
        assert_eq!(outcome.units.len(), 2);
        assert!(outcome.units[0].body.contains("Explanation"));
        assert!(!outcome.units[0].body.contains("Section 379"));
    }

    #[test]
    fn marker_number_split_across_page_boundary() {
        let text = "Section\n154. Information in cognizable cases\nEvery information shall be recorded.";
        let outcome = segment(text, "CrPC");
        assert_eq!(outcome.units.len(), 1);
        assert_eq!(outcome.units[0].number, "154");
        assert_eq!(
            outcome.units[0].title.as_deref(),
            Some("Information in cognizable cases")
        );
    }

    #[test]
    fn missing_title_phrase_yields_none() {
        let text = "Section 5.\nBody without a heading phrase.";
        let outcome = segment(text, "PPC");
        assert_eq!(outcome.units[0].title, None);
        assert_eq!(outcome.units[0].body, "Body without a heading phrase.");
    }
}
