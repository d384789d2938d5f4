use tracing::debug;

use crate::anchoring::validate::{RangeError, sorted_validated};
use crate::doctree::extract::{NodeSlice, OffsetMap};
use crate::doctree::{DocTree, MARK_ID_ATTR, MARK_TAG, NodeId, NodeKind};
use crate::models::{Highlight, HighlightId};

/// Apply a batch of stored highlights to a rendered tree.
///
/// Existing markers are stripped first and adjacent text nodes re-merged, so
/// re-rendering the same batch is idempotent. The batch is then validated as
/// a whole (any overlap rejects every range) and applied in reverse sorted
/// order: earlier ranges keep their global offsets valid while later ones are
/// wrapped. The offset map is rebuilt between applications because each wrap
/// splits text nodes.
pub fn apply_highlights(tree: &mut DocTree, highlights: &[Highlight]) -> Result<(), RangeError> {
    clear_markers(tree);

    let active: Vec<Highlight> = highlights
        .iter()
        .filter(|h| !h.is_stale)
        .cloned()
        .collect();
    let sorted = sorted_validated(&active)?;

    for highlight in sorted.iter().rev() {
        let map = OffsetMap::build(tree);
        let slices = map.nodes_in_range(highlight.range());
        if slices.is_empty() {
            debug!(id = %highlight.id, "highlight range is outside the rendered text");
            continue;
        }
        for slice in slices.iter().rev() {
            wrap_slice(tree, slice, highlight.id);
        }
    }

    Ok(())
}

/// Remove every marker element, splicing its children back into the parent,
/// then merge adjacent text nodes so the tree matches a fresh render.
pub fn clear_markers(tree: &mut DocTree) {
    let markers = collect_markers(tree);
    for marker in markers {
        tree.unwrap_node(marker);
    }
    tree.normalize();
}

fn collect_markers(tree: &DocTree) -> Vec<NodeId> {
    let mut found = Vec::new();
    let mut stack = vec![tree.root()];
    while let Some(id) = stack.pop() {
        if tree.is_marker(id) {
            found.push(id);
        }
        if matches!(tree.kind(id), NodeKind::Element { .. }) {
            stack.extend_from_slice(tree.children(id));
        }
    }
    found
}

/// Split one text node at the slice boundaries and wrap the middle part in a
/// marker element carrying the highlight id. Empty before/after parts are
/// omitted.
fn wrap_slice(tree: &mut DocTree, slice: &NodeSlice, id: HighlightId) {
    let Some(content) = tree.text(slice.node).map(str::to_owned) else {
        return;
    };
    let Some(parent) = tree.parent(slice.node) else {
        return;
    };
    if !content.is_char_boundary(slice.local_start) || !content.is_char_boundary(slice.local_end)
    {
        debug!(?slice, "slice does not land on character boundaries");
        return;
    }

    let before = &content[..slice.local_start];
    let middle = &content[slice.local_start..slice.local_end];
    let after = &content[slice.local_end..];
    if middle.is_empty() {
        return;
    }

    let mut replacements = Vec::with_capacity(3);
    if !before.is_empty() {
        let node = tree.new_text(before);
        replacements.push(node);
    }
    let marker = tree.new_element(MARK_TAG);
    tree.set_attr(marker, MARK_ID_ATTR, id.to_string());
    let middle_node = tree.new_text(middle);
    tree.append_child(marker, middle_node);
    replacements.push(marker);
    if !after.is_empty() {
        let node = tree.new_text(after);
        replacements.push(node);
    }

    tree.replace_child(parent, slice.node, replacements);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doctree::canonical_text;
    use pretty_assertions::assert_eq;
    use relative_path::RelativePath;

    fn highlight(range: std::ops::Range<usize>, text: &str) -> Highlight {
        Highlight::new(
            RelativePath::new("doc.md").to_relative_path_buf(),
            range,
            text,
            None,
        )
    }

    /// `<p>AB CD EF</p>`, canonical text `"AB CD EF"`.
    fn sample_tree() -> DocTree {
        let mut tree = DocTree::new();
        let p = tree.append_element(tree.root(), "p");
        tree.append_text(p, "AB CD EF");
        tree
    }

    #[test]
    fn test_wraps_ranges_and_excludes_them_from_canonical_text() {
        let mut tree = sample_tree();
        let batch = vec![highlight(0..2, "AB"), highlight(6..8, "EF")];

        apply_highlights(&mut tree, &batch).unwrap();

        // The wrapped spans vanish from the canonical stream; offsets of the
        // remaining text are not double-counted.
        assert_eq!(canonical_text(&tree), " CD ");
        let html = tree.to_html();
        assert!(html.contains(">AB</mark>"));
        assert!(html.contains(">EF</mark>"));
    }

    #[test]
    fn test_reapplication_is_idempotent() {
        let mut tree = sample_tree();
        let batch = vec![highlight(3..5, "CD")];

        apply_highlights(&mut tree, &batch).unwrap();
        let first = tree.to_html();
        apply_highlights(&mut tree, &batch).unwrap();
        let second = tree.to_html();

        assert_eq!(first, second);
    }

    #[test]
    fn test_range_spanning_multiple_nodes_wraps_each_piece() {
        let mut tree = DocTree::new();
        let p = tree.append_element(tree.root(), "p");
        tree.append_text(p, "AB ");
        let em = tree.append_element(p, "em");
        tree.append_text(em, "CD");
        tree.append_text(p, " EF");

        // "B CD E" crosses all three text nodes.
        apply_highlights(&mut tree, &[highlight(1..7, "B CD E")]).unwrap();

        assert_eq!(canonical_text(&tree), "AF");
        let html = tree.to_html();
        assert_eq!(html.matches("<mark ").count(), 3);
    }

    #[test]
    fn test_overlapping_batch_is_rejected_entirely() {
        let mut tree = sample_tree();
        let batch = vec![highlight(0..5, "AB CD"), highlight(3..8, "CD EF")];

        let err = apply_highlights(&mut tree, &batch);
        assert!(matches!(err, Err(RangeError::Overlap { .. })));
        // Nothing was applied.
        assert_eq!(canonical_text(&tree), "AB CD EF");
    }

    #[test]
    fn test_stale_highlights_are_not_wrapped() {
        let mut tree = sample_tree();
        let mut stale = highlight(0..2, "AB");
        stale.mark_stale(true);

        apply_highlights(&mut tree, &[stale]).unwrap();

        assert_eq!(canonical_text(&tree), "AB CD EF");
        assert!(!tree.to_html().contains("<mark"));
    }

    #[test]
    fn test_clear_markers_restores_plain_tree() {
        let mut tree = sample_tree();
        apply_highlights(&mut tree, &[highlight(3..5, "CD")]).unwrap();
        assert!(tree.to_html().contains("<mark"));

        clear_markers(&mut tree);

        assert_eq!(tree.to_html(), "<p>AB CD EF</p>");
        assert_eq!(canonical_text(&tree), "AB CD EF");
    }

    #[test]
    fn test_range_beyond_rendered_text_is_skipped() {
        let mut tree = sample_tree();
        apply_highlights(&mut tree, &[highlight(100..110, "gone")]).unwrap();
        assert_eq!(tree.to_html(), "<p>AB CD EF</p>");
    }
}
