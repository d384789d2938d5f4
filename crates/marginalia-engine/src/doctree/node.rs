/// Tag used for highlight marker elements.
pub const MARK_TAG: &str = "mark";
/// Attribute carrying the highlight id on a marker element.
pub const MARK_ID_ATTR: &str = "data-highlight-id";

/// Index into a [`DocTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    /// Raw HTML passed through verbatim; carries no canonical text.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed document tree.
///
/// Nodes detached by [`DocTree::replace_child`] stay in the arena but are no
/// longer reachable from the root; trees live for a single render pass, so
/// nothing reclaims them.
#[derive(Debug, Clone, PartialEq)]
pub struct DocTree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Default for DocTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DocTree {
    pub fn new() -> Self {
        let root = NodeData {
            kind: NodeKind::Element {
                tag: "#document".to_string(),
                attrs: Vec::new(),
            },
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Text content, for text nodes only.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    /// Is this node a highlight marker element?
    pub fn is_marker(&self, id: NodeId) -> bool {
        match &self.nodes[id.0].kind {
            NodeKind::Element { tag, .. } => {
                tag == MARK_TAG && self.attr(id, MARK_ID_ATTR).is_some()
            }
            _ => false,
        }
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Create a detached text node.
    pub fn new_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push_node(NodeKind::Text(text.into()))
    }

    /// Create a detached element.
    pub fn new_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.push_node(NodeKind::Element {
            tag: tag.into(),
            attrs: Vec::new(),
        })
    }

    /// Create a detached raw-HTML node.
    pub fn new_raw(&mut self, html: impl Into<String>) -> NodeId {
        self.push_node(NodeKind::Raw(html.into()))
    }

    pub fn set_attr(&mut self, id: NodeId, name: impl Into<String>, value: impl Into<String>) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[id.0].kind {
            attrs.push((name.into(), value.into()));
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Create a text node and attach it under `parent`.
    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        let id = self.new_text(text);
        self.append_child(parent, id);
        id
    }

    /// Create an element and attach it under `parent`.
    pub fn append_element(&mut self, parent: NodeId, tag: impl Into<String>) -> NodeId {
        let id = self.new_element(tag);
        self.append_child(parent, id);
        id
    }

    /// Replace `old` in `parent`'s child list with `replacements`, in order.
    /// `old` is detached; it stays in the arena but becomes unreachable.
    pub fn replace_child(&mut self, parent: NodeId, old: NodeId, replacements: Vec<NodeId>) {
        let Some(pos) = self.nodes[parent.0].children.iter().position(|&c| c == old) else {
            return;
        };
        self.nodes[old.0].parent = None;
        for &r in &replacements {
            self.nodes[r.0].parent = Some(parent);
        }
        self.nodes[parent.0]
            .children
            .splice(pos..pos + 1, replacements);
    }

    /// Replace an element with its own children (used to strip markers).
    pub fn unwrap_node(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id.0].parent else {
            return;
        };
        let children = std::mem::take(&mut self.nodes[id.0].children);
        self.replace_child(parent, id, children);
    }

    /// Merge adjacent sibling text nodes throughout the tree, so offset maps
    /// built after marker removal see the same node boundaries as a fresh
    /// render.
    pub fn normalize(&mut self) {
        self.normalize_children(self.root);
    }

    fn normalize_children(&mut self, id: NodeId) {
        let old_children = self.nodes[id.0].children.clone();
        let mut merged: Vec<NodeId> = Vec::with_capacity(old_children.len());

        for child in old_children {
            let is_text = matches!(self.nodes[child.0].kind, NodeKind::Text(_));
            if is_text
                && let Some(&prev) = merged.last()
                && let NodeKind::Text(prev_text) = &self.nodes[prev.0].kind
            {
                let appended = format!("{}{}", prev_text, self.text(child).unwrap_or_default());
                self.nodes[prev.0].kind = NodeKind::Text(appended);
                self.nodes[child.0].parent = None;
                continue;
            }
            merged.push(child);
        }

        self.nodes[id.0].children = merged.clone();
        for child in merged {
            if matches!(self.nodes[child.0].kind, NodeKind::Element { .. }) {
                self.normalize_children(child);
            }
        }
    }

    /// Serialize the tree to an HTML fragment.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for &child in self.children(self.root) {
            self.write_node(child, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].kind {
            NodeKind::Text(t) => out.push_str(&html_escape::encode_text(t)),
            NodeKind::Raw(h) => out.push_str(h),
            NodeKind::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(value));
                    out.push('"');
                }
                out.push('>');
                if is_void_tag(tag) {
                    return;
                }
                for &child in &self.nodes[id.0].children {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

fn is_void_tag(tag: &str) -> bool {
    matches!(tag, "br" | "hr" | "img")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_and_serialize_simple_fragment() {
        let mut tree = DocTree::new();
        let p = tree.append_element(tree.root(), "p");
        tree.append_text(p, "Hello ");
        let em = tree.append_element(p, "em");
        tree.append_text(em, "World");

        assert_eq!(tree.to_html(), "<p>Hello <em>World</em></p>");
    }

    #[test]
    fn test_text_is_escaped_attributes_are_escaped() {
        let mut tree = DocTree::new();
        let p = tree.append_element(tree.root(), "p");
        tree.append_text(p, "a < b & c");
        let a = tree.append_element(p, "a");
        tree.set_attr(a, "href", "x\"y");
        tree.append_text(a, "link");

        let html = tree.to_html();
        assert!(html.contains("a &lt; b &amp; c"));
        assert!(html.contains("href=\"x&quot;y\""));
    }

    #[test]
    fn test_marker_detection_requires_id_attribute() {
        let mut tree = DocTree::new();
        let plain_mark = tree.append_element(tree.root(), "mark");
        let marker = tree.append_element(tree.root(), "mark");
        tree.set_attr(marker, MARK_ID_ATTR, "some-id");

        assert!(!tree.is_marker(plain_mark));
        assert!(tree.is_marker(marker));
    }

    #[test]
    fn test_replace_child_splices_in_order() {
        let mut tree = DocTree::new();
        let p = tree.append_element(tree.root(), "p");
        let old = tree.append_text(p, "abc");
        let first = tree.new_text("a");
        let second = tree.new_text("bc");
        tree.replace_child(p, old, vec![first, second]);

        assert_eq!(tree.children(p), &[first, second]);
        assert_eq!(tree.parent(first), Some(p));
        assert_eq!(tree.parent(old), None);
    }

    #[test]
    fn test_unwrap_and_normalize_restores_single_text_node() {
        let mut tree = DocTree::new();
        let p = tree.append_element(tree.root(), "p");
        tree.append_text(p, "before ");
        let marker = tree.append_element(p, MARK_TAG);
        tree.set_attr(marker, MARK_ID_ATTR, "id-1");
        tree.append_text(marker, "marked");
        tree.append_text(p, " after");

        tree.unwrap_node(marker);
        tree.normalize();

        assert_eq!(tree.children(p).len(), 1);
        let only = tree.children(p)[0];
        assert_eq!(tree.text(only), Some("before marked after"));
    }
}
