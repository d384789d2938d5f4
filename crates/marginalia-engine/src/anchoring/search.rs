use std::ops::Range;

/// All start offsets of `needle` in `haystack`, left to right.
///
/// The scan resumes one character (not one needle-length) past each hit, so
/// overlapping occurrences are each counted. This is the single occurrence
/// counting discipline shared by offset resolution and by
/// [`crate::selection::SelectionContext::occurrence_index`].
pub fn scan_occurrences(haystack: &str, needle: &str) -> Vec<usize> {
    let mut offsets = Vec::new();
    if needle.is_empty() {
        return offsets;
    }

    let mut from = 0;
    while let Some(pos) = haystack[from..].find(needle) {
        let at = from + pos;
        offsets.push(at);
        // Step over one full character so the next scan can still see an
        // overlapping hit starting inside this one.
        let step = haystack[at..].chars().next().map_or(1, char::len_utf8);
        from = at + step;
    }

    offsets
}

/// A whitespace-normalized view of a string that can map offsets back into
/// the raw text.
///
/// Runs of whitespace collapse to a single space and the ends are trimmed.
/// `raw_offsets` holds, for every byte of the normalized text plus one end
/// sentinel, the corresponding byte offset in the raw text. A collapsed space
/// maps to the start of the whitespace run it replaced, so a normalized match
/// maps back onto the span of the original, unnormalized substring.
#[derive(Debug, Clone)]
pub struct NormalizedText {
    pub text: String,
    raw_offsets: Vec<usize>,
}

impl NormalizedText {
    /// Map a range in normalized space back to raw byte offsets.
    pub fn raw_range(&self, normalized: Range<usize>) -> Range<usize> {
        self.raw_offsets[normalized.start]..self.raw_offsets[normalized.end]
    }
}

/// Collapse whitespace runs to single spaces and trim the ends, keeping a
/// byte-accurate mapping back to the raw text.
pub fn normalize_whitespace(raw: &str) -> NormalizedText {
    let mut text = String::with_capacity(raw.len());
    let mut raw_offsets = Vec::with_capacity(raw.len() + 1);
    let mut ws_run_start: Option<usize> = None;
    let mut end_sentinel = 0;

    for (i, ch) in raw.char_indices() {
        if ch.is_whitespace() {
            ws_run_start.get_or_insert(i);
            continue;
        }
        if let Some(run_start) = ws_run_start.take() {
            // Leading whitespace is trimmed, interior runs collapse to one space.
            if !text.is_empty() {
                text.push(' ');
                raw_offsets.push(run_start);
            }
        }
        text.push(ch);
        for k in 0..ch.len_utf8() {
            raw_offsets.push(i + k);
        }
        end_sentinel = i + ch.len_utf8();
    }

    raw_offsets.push(end_sentinel);
    debug_assert_eq!(raw_offsets.len(), text.len() + 1);
    NormalizedText { text, raw_offsets }
}

/// All occurrences of `search_text` in `content` as raw byte ranges.
///
/// Exact substring search runs first. Only when it finds nothing at all does
/// the scan retry against whitespace-normalized views of both strings,
/// mapping the normalized hits back onto the original text, so a selection
/// of `"Hello World"` still resolves in a source that reads
/// `"Hello    World"`.
pub fn find_all_occurrences(content: &str, search_text: &str) -> Vec<Range<usize>> {
    let exact: Vec<Range<usize>> = scan_occurrences(content, search_text)
        .into_iter()
        .map(|start| start..start + search_text.len())
        .collect();
    if !exact.is_empty() {
        return exact;
    }

    let norm_content = normalize_whitespace(content);
    let norm_needle = normalize_whitespace(search_text).text;
    if norm_needle.is_empty() {
        return Vec::new();
    }

    scan_occurrences(&norm_content.text, &norm_needle)
        .into_iter()
        .map(|start| norm_content.raw_range(start..start + norm_needle.len()))
        .collect()
}

/// Resolve the `occurrence_index`-th occurrence (zero-based) of `search_text`
/// to its raw byte range, or `None` when the index is out of range for both
/// the exact and the normalized search.
pub fn find_text_offset(
    content: &str,
    search_text: &str,
    occurrence_index: usize,
) -> Option<Range<usize>> {
    find_all_occurrences(content, search_text)
        .into_iter()
        .nth(occurrence_index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("test test test", "test", vec![0, 5, 10])]
    #[case("aaaa", "aa", vec![0, 1, 2])]
    #[case("no hits here", "absent", vec![])]
    #[case("", "x", vec![])]
    #[case("anything", "", vec![])]
    fn test_scan_occurrences(
        #[case] haystack: &str,
        #[case] needle: &str,
        #[case] expected: Vec<usize>,
    ) {
        assert_eq!(scan_occurrences(haystack, needle), expected);
    }

    #[test]
    fn test_scan_occurrences_steps_over_multibyte_characters() {
        // 'é' is two bytes; overlapping hits land on char boundaries.
        assert_eq!(scan_occurrences("ééé", "éé"), vec![0, 2]);
    }

    #[test]
    fn test_every_exact_occurrence_slices_back_to_the_needle() {
        let content = "the theme of the theater";
        for range in find_all_occurrences(content, "the") {
            assert_eq!(&content[range], "the");
        }
        assert_eq!(find_all_occurrences(content, "the").len(), 4);
    }

    #[rstest]
    #[case("Hello World", "Hello World")]
    #[case("  Hello World  ", "Hello World")]
    #[case("Hello    World", "Hello World")]
    #[case("Hello\n\tWorld", "Hello World")]
    #[case("", "")]
    #[case(" \t\n ", "")]
    fn test_normalize_whitespace(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_whitespace(raw).text, expected);
    }

    #[test]
    fn test_normalized_match_maps_back_to_raw_span() {
        // Exact search fails, normalized search succeeds, and the returned
        // range spans the original unnormalized substring.
        let content = "Hello    World";
        let hits = find_all_occurrences(content, "Hello World");
        assert_eq!(hits, vec![0..14]);
        assert_eq!(&content[hits[0].clone()], "Hello    World");
    }

    #[test]
    fn test_normalized_match_inside_larger_document() {
        let content = "intro\n\nHello  \t World trailer";
        let hits = find_all_occurrences(content, "Hello World");
        assert_eq!(hits.len(), 1);
        assert_eq!(&content[hits[0].clone()], "Hello  \t World");
    }

    #[test]
    fn test_exact_hits_suppress_normalized_fallback() {
        // "a b" appears exactly once; the normalized view of "a  b" would
        // match too, but exact hits win.
        let content = "a b and a  b";
        let hits = find_all_occurrences(content, "a b");
        assert_eq!(hits, vec![0..3]);
    }

    #[rstest]
    #[case(0, Some(0..4))]
    #[case(1, Some(5..9))]
    #[case(2, Some(10..14))]
    #[case(3, None)]
    #[case(5, None)]
    fn test_find_text_offset_disambiguates_by_index(
        #[case] index: usize,
        #[case] expected: Option<Range<usize>>,
    ) {
        assert_eq!(find_text_offset("test test test", "test", index), expected);
    }

    #[test]
    fn test_find_text_offset_whitespace_only_search_finds_nothing() {
        assert_eq!(find_text_offset("some content", "   ", 0), None);
    }
}
