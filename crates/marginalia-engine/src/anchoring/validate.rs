use crate::models::Highlight;

/// Violation of the highlight-range invariants for a single document.
///
/// Any violation rejects the whole batch: ranges are never clipped, merged or
/// partially applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("invalid range {start}..{end}: start must be less than end")]
    Empty { start: usize, end: usize },
    #[error(
        "range {second_start}..{second_end} overlaps range {first_start}..{first_end}"
    )]
    Overlap {
        first_start: usize,
        first_end: usize,
        second_start: usize,
        second_end: usize,
    },
    #[error("range {start}..{end} extends past end of document ({len} bytes)")]
    OutOfBounds { start: usize, end: usize, len: usize },
}

/// Return a copy of `highlights` sorted by `start_offset`, or the first
/// invariant violation.
///
/// Degenerate ranges (`start >= end`) are rejected before the overlap check.
/// Overlap between sorted neighbours `(a, b)` means `a.end > b.start`;
/// adjacency (`a.end == b.start`) is allowed.
pub fn sorted_validated(highlights: &[Highlight]) -> Result<Vec<Highlight>, RangeError> {
    for h in highlights {
        if h.start_offset >= h.end_offset {
            return Err(RangeError::Empty {
                start: h.start_offset,
                end: h.end_offset,
            });
        }
    }

    let mut sorted = highlights.to_vec();
    sorted.sort_by_key(|h| h.start_offset);

    for pair in sorted.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if a.end_offset > b.start_offset {
            return Err(RangeError::Overlap {
                first_start: a.start_offset,
                first_end: a.end_offset,
                second_start: b.start_offset,
                second_end: b.end_offset,
            });
        }
    }

    Ok(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use relative_path::RelativePath;

    fn highlight(range: std::ops::Range<usize>) -> Highlight {
        Highlight::new(
            RelativePath::new("doc.md").to_relative_path_buf(),
            range,
            "text",
            None,
        )
    }

    #[test]
    fn test_sorts_by_start_offset() {
        let input = vec![highlight(10..12), highlight(0..5), highlight(5..8)];
        let sorted = sorted_validated(&input).unwrap();
        let starts: Vec<usize> = sorted.iter().map(|h| h.start_offset).collect();
        assert_eq!(starts, vec![0, 5, 10]);
    }

    #[test]
    fn test_overlapping_ranges_fail_the_whole_batch() {
        let input = vec![highlight(0..5), highlight(3..8)];
        let err = sorted_validated(&input).unwrap_err();
        assert_eq!(
            err,
            RangeError::Overlap {
                first_start: 0,
                first_end: 5,
                second_start: 3,
                second_end: 8,
            }
        );
    }

    #[test]
    fn test_adjacent_ranges_are_allowed() {
        let input = vec![highlight(0..5), highlight(5..8)];
        assert!(sorted_validated(&input).is_ok());
    }

    #[test]
    fn test_degenerate_range_is_rejected_before_overlap() {
        let input = vec![highlight(7..7), highlight(0..20)];
        let err = sorted_validated(&input).unwrap_err();
        assert_eq!(err, RangeError::Empty { start: 7, end: 7 });
    }

    #[test]
    fn test_empty_batch_is_valid() {
        assert_eq!(sorted_validated(&[]).unwrap(), Vec::<Highlight>::new());
    }
}
