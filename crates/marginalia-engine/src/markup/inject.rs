use tracing::debug;

use crate::anchoring::validate::{RangeError, sorted_validated};
use crate::doctree::{MARK_ID_ATTR, MARK_TAG};
use crate::models::{Highlight, HighlightId};

/// Opening marker tag for a highlight.
pub fn marker_open(id: HighlightId) -> String {
    format!(
        "<{MARK_TAG} {MARK_ID_ATTR}=\"{}\">",
        html_escape::encode_double_quoted_attribute(&id.to_string())
    )
}

/// Closing marker tag.
pub fn marker_close() -> String {
    format!("</{MARK_TAG}>")
}

/// Embed markers for the non-stale highlights into raw source text.
///
/// The batch is validated as a whole; overlap or a range past the end of the
/// source rejects every highlight. The output is built in one pass over the
/// ascending-sorted list: each segment of untouched source is copied once,
/// so no offset ever has to survive an earlier splice. The wrapped text is
/// the text *as extracted from the source*, not the stored copy, so minor
/// whitespace drift renders faithfully.
pub fn inject_markers(source: &str, highlights: &[Highlight]) -> Result<String, RangeError> {
    let active: Vec<Highlight> = highlights
        .iter()
        .filter(|h| !h.is_stale)
        .cloned()
        .collect();
    let sorted = sorted_validated(&active)?;

    if let Some(last) = sorted.last()
        && last.end_offset > source.len()
    {
        return Err(RangeError::OutOfBounds {
            start: last.start_offset,
            end: last.end_offset,
            len: source.len(),
        });
    }

    let mut out = String::with_capacity(source.len() + sorted.len() * 64);
    let mut cursor = 0;
    for highlight in &sorted {
        if !source.is_char_boundary(highlight.start_offset)
            || !source.is_char_boundary(highlight.end_offset)
        {
            // A mid-character range means the anchor is stale but not yet
            // reclassified; leave that span untouched.
            debug!(id = %highlight.id, "skipping highlight off character boundaries");
            continue;
        }
        out.push_str(&source[cursor..highlight.start_offset]);
        out.push_str(&marker_open(highlight.id));
        out.push_str(&source[highlight.start_offset..highlight.end_offset]);
        out.push_str(&marker_close());
        cursor = highlight.end_offset;
    }
    out.push_str(&source[cursor..]);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use relative_path::RelativePath;
    use uuid::Uuid;

    fn highlight(range: std::ops::Range<usize>, text: &str, id: u128) -> Highlight {
        let mut h = Highlight::new(
            RelativePath::new("doc.md").to_relative_path_buf(),
            range,
            text,
            None,
        );
        h.id = Uuid::from_u128(id);
        h
    }

    #[test]
    fn test_injects_markers_around_extracted_text() {
        let out = inject_markers("Hello World", &[highlight(0..5, "Hello", 1)]).unwrap();
        assert_snapshot!(
            out,
            @r#"<mark data-highlight-id="00000000-0000-0000-0000-000000000001">Hello</mark> World"#
        );
    }

    #[test]
    fn test_unsorted_batch_injects_in_text_order_in_one_pass() {
        let source = "one two three";
        let batch = vec![
            highlight(8..13, "three", 2),
            highlight(0..3, "one", 1),
        ];
        let out = inject_markers(source, &batch).unwrap();
        assert_snapshot!(
            out,
            @r#"<mark data-highlight-id="00000000-0000-0000-0000-000000000001">one</mark> two <mark data-highlight-id="00000000-0000-0000-0000-000000000002">three</mark>"#
        );
    }

    #[test]
    fn test_injection_is_a_pure_function_of_source_and_batch() {
        let source = "alpha beta gamma";
        let batch = vec![highlight(6..10, "beta", 7)];
        let first = inject_markers(source, &batch).unwrap();
        let second = inject_markers(source, &batch).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_stale_highlights_are_excluded() {
        let mut stale = highlight(0..5, "Hello", 1);
        stale.mark_stale(true);
        let out = inject_markers("Hello World", &[stale]).unwrap();
        assert_eq!(out, "Hello World");
    }

    #[test]
    fn test_wraps_source_text_not_stored_text() {
        // The source drifted in whitespace only; the extracted span wins.
        let source = "Hello    World!";
        let out = inject_markers(source, &[highlight(0..14, "Hello World", 1)]).unwrap();
        assert!(out.contains(">Hello    World</mark>"));
    }

    #[test]
    fn test_overlap_rejects_the_whole_batch() {
        let batch = vec![
            highlight(0..5, "Hello", 1),
            highlight(3..8, "lo Wo", 2),
        ];
        let err = inject_markers("Hello World", &batch).unwrap_err();
        assert!(matches!(err, RangeError::Overlap { .. }));
    }

    #[test]
    fn test_range_past_end_of_source_is_rejected() {
        let err = inject_markers("short", &[highlight(0..50, "short", 1)]).unwrap_err();
        assert_eq!(
            err,
            RangeError::OutOfBounds {
                start: 0,
                end: 50,
                len: 5
            }
        );
    }

    #[test]
    fn test_marker_id_attribute_is_escaped() {
        let open = marker_open(Uuid::from_u128(3));
        assert_eq!(
            open,
            "<mark data-highlight-id=\"00000000-0000-0000-0000-000000000003\">"
        );
    }
}
