use std::ops::Range;

use crate::doctree::{DocTree, NodeId, NodeKind};

/// One text node's interval in canonical-text space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    pub node: NodeId,
    pub start: usize,
    pub end: usize,
}

/// A text node intersected by a highlight range, with the intersection
/// clamped to node-local offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSlice {
    pub node: NodeId,
    pub local_start: usize,
    pub local_end: usize,
}

/// Visit every text node in document order, skipping subtrees rooted at
/// highlight markers and raw-HTML nodes. This single walk defines both the
/// canonical text and the offset map, so the two can never disagree.
fn visit_text_nodes(tree: &DocTree, mut visit: impl FnMut(NodeId, &str)) {
    let mut stack = vec![tree.root()];
    while let Some(id) = stack.pop() {
        match tree.kind(id) {
            NodeKind::Text(text) => visit(id, text),
            NodeKind::Raw(_) => {}
            NodeKind::Element { .. } => {
                if tree.is_marker(id) {
                    continue;
                }
                for &child in tree.children(id).iter().rev() {
                    stack.push(child);
                }
            }
        }
    }
}

/// The linear text of a rendered tree, concatenated verbatim in document
/// order, excluding text inside highlight markers.
///
/// This string is the ground truth render-side offsets refer to. It is
/// rebuilt on every call rather than cached: node identities change whenever
/// the applier splits a text node.
pub fn canonical_text(tree: &DocTree) -> String {
    let mut out = String::new();
    visit_text_nodes(tree, |_, text| out.push_str(text));
    out
}

/// Ordered `{node, global start, global end}` records over the same
/// marker-excluding walk as [`canonical_text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetMap {
    spans: Vec<TextSpan>,
    len: usize,
}

impl OffsetMap {
    /// Walk the tree and accumulate a running offset per text node.
    /// Must be rebuilt after any mutation: splitting a node shifts both node
    /// boundaries and identities.
    pub fn build(tree: &DocTree) -> Self {
        let mut spans = Vec::new();
        let mut offset = 0;
        visit_text_nodes(tree, |node, text| {
            let end = offset + text.len();
            spans.push(TextSpan {
                node,
                start: offset,
                end,
            });
            offset = end;
        });
        Self { spans, len: offset }
    }

    /// Total canonical-text length.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn spans(&self) -> &[TextSpan] {
        &self.spans
    }

    /// Every node whose interval intersects `range`, with the intersection
    /// clamped to node-local positions.
    pub fn nodes_in_range(&self, range: Range<usize>) -> Vec<NodeSlice> {
        self.spans
            .iter()
            .filter(|span| span.start < range.end && span.end > range.start)
            .map(|span| NodeSlice {
                node: span.node,
                local_start: range.start.saturating_sub(span.start),
                local_end: range.end.min(span.end) - span.start,
            })
            .collect()
    }
}
