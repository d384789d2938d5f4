use crate::anchoring::search::normalize_whitespace;
use crate::models::Highlight;

/// Does the stored range still correspond to the expected text in `source`?
///
/// A range matches when it lies inside the document, lands on character
/// boundaries, and its extracted text equals the expected text after
/// whitespace normalization on both sides. This is a read-time judgement:
/// it is recomputed on every render against the *current* source, and the
/// persisted stale flag is updated whenever the judgement flips.
pub fn is_range_stale(source: &str, start: usize, end: usize, expected_text: &str) -> bool {
    if start >= end || end > source.len() {
        return true;
    }
    if !source.is_char_boundary(start) || !source.is_char_boundary(end) {
        return true;
    }
    normalize_whitespace(&source[start..end]).text != normalize_whitespace(expected_text).text
}

/// Convenience wrapper over [`is_range_stale`] for a stored highlight.
pub fn is_anchor_stale(source: &str, highlight: &Highlight) -> bool {
    is_range_stale(
        source,
        highlight.start_offset,
        highlight.end_offset,
        &highlight.highlighted_text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    // Range still holds the expected text.
    #[case("Hello World, again", 0, 11, "Hello World", false)]
    // Whitespace drift inside the range does not go stale.
    #[case("Hello    World", 0, 14, "Hello World", false)]
    // The text at the range changed.
    #[case("Goodbye World, again", 0, 11, "Hello World", true)]
    // The document shrank underneath the range.
    #[case("short", 0, 11, "Hello World", true)]
    // Degenerate stored range.
    #[case("Hello World", 5, 5, "", true)]
    fn test_is_range_stale(
        #[case] source: &str,
        #[case] start: usize,
        #[case] end: usize,
        #[case] expected: &str,
        #[case] stale: bool,
    ) {
        assert_eq!(is_range_stale(source, start, end, expected), stale);
    }

    #[test]
    fn test_offsets_inside_a_multibyte_character_are_stale() {
        // 'é' occupies bytes 0..2; offset 1 is not a char boundary.
        assert!(is_range_stale("été", 1, 3, "t"));
    }
}
