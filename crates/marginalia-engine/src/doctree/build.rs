use std::sync::OnceLock;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};
use regex::Regex;

use crate::doctree::{DocTree, MARK_ID_ATTR, MARK_TAG, NodeId};

/// Open tag of an injected highlight marker, e.g.
/// `<mark data-highlight-id="...">`.
fn marker_open_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"^<mark\s+data-highlight-id="([^"]*)">$"#).unwrap()
    })
}

/// Render markdown source into a [`DocTree`].
///
/// Inline HTML is passed through as raw nodes, with one exception: highlight
/// markers injected into the source by
/// [`crate::markup::inject_markers`] are recognized and become real marker
/// elements, so the render-side walk can exclude their text.
pub fn build_tree(markdown: &str) -> DocTree {
    let mut tree = DocTree::new();
    let mut stack: Vec<NodeId> = vec![tree.root()];
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES;

    for event in Parser::new_ext(markdown, options) {
        let top = *stack.last().unwrap_or(&tree.root());
        match event {
            Event::Start(tag) => {
                let opened = open_tag(&mut tree, top, tag);
                stack.push(opened);
            }
            Event::End(_) => {
                if stack.len() > 1 {
                    stack.pop();
                }
            }
            Event::Text(text) => {
                tree.append_text(top, &*text);
            }
            Event::Code(code) => {
                let el = tree.append_element(top, "code");
                tree.append_text(el, &*code);
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                handle_raw_html(&mut tree, &mut stack, &html);
            }
            Event::SoftBreak => {
                tree.append_text(top, "\n");
            }
            Event::HardBreak => {
                tree.append_element(top, "br");
            }
            Event::Rule => {
                tree.append_element(top, "hr");
            }
            _ => {}
        }
    }

    tree.normalize();
    tree
}

/// Open the element(s) for a start tag and return the node that children
/// should attach to.
fn open_tag(tree: &mut DocTree, parent: NodeId, tag: Tag<'_>) -> NodeId {
    match tag {
        Tag::Paragraph => tree.append_element(parent, "p"),
        Tag::Heading { level, .. } => tree.append_element(parent, heading_tag(level)),
        Tag::BlockQuote(_) => tree.append_element(parent, "blockquote"),
        Tag::CodeBlock(kind) => {
            // <pre><code> pair; the stack tracks the inner element only,
            // since <pre> is already attached to its parent.
            let pre = tree.append_element(parent, "pre");
            let code = tree.append_element(pre, "code");
            if let CodeBlockKind::Fenced(lang) = kind
                && !lang.is_empty()
            {
                tree.set_attr(code, "class", format!("language-{lang}"));
            }
            code
        }
        Tag::List(Some(start)) => {
            let ol = tree.append_element(parent, "ol");
            if start != 1 {
                tree.set_attr(ol, "start", start.to_string());
            }
            ol
        }
        Tag::List(None) => tree.append_element(parent, "ul"),
        Tag::Item => tree.append_element(parent, "li"),
        Tag::Emphasis => tree.append_element(parent, "em"),
        Tag::Strong => tree.append_element(parent, "strong"),
        Tag::Strikethrough => tree.append_element(parent, "del"),
        Tag::Link {
            dest_url, title, ..
        } => {
            let a = tree.append_element(parent, "a");
            tree.set_attr(a, "href", &*dest_url);
            if !title.is_empty() {
                tree.set_attr(a, "title", &*title);
            }
            a
        }
        Tag::Image {
            dest_url, title, ..
        } => {
            let img = tree.append_element(parent, "img");
            tree.set_attr(img, "src", &*dest_url);
            if !title.is_empty() {
                tree.set_attr(img, "title", &*title);
            }
            img
        }
        // Block HTML is transparent; its events land on the current parent.
        Tag::HtmlBlock => parent,
        Tag::Table(_) => tree.append_element(parent, "table"),
        Tag::TableHead => {
            let thead = tree.append_element(parent, "thead");
            tree.append_element(thead, "tr")
        }
        Tag::TableRow => tree.append_element(parent, "tr"),
        Tag::TableCell => tree.append_element(parent, "td"),
        _ => tree.append_element(parent, "div"),
    }
}

fn heading_tag(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 => "h1",
        HeadingLevel::H2 => "h2",
        HeadingLevel::H3 => "h3",
        HeadingLevel::H4 => "h4",
        HeadingLevel::H5 => "h5",
        HeadingLevel::H6 => "h6",
    }
}

fn handle_raw_html(tree: &mut DocTree, stack: &mut Vec<NodeId>, html: &str) {
    let top = *stack.last().unwrap_or(&tree.root());

    if let Some(captures) = marker_open_pattern().captures(html.trim()) {
        let marker = tree.append_element(top, MARK_TAG);
        tree.set_attr(marker, MARK_ID_ATTR, &captures[1]);
        stack.push(marker);
        return;
    }

    if html.trim() == format!("</{MARK_TAG}>") {
        // Close only a marker we opened; stray closers stay raw.
        if stack.len() > 1
            && let Some(&open) = stack.last()
            && tree.is_marker(open)
        {
            stack.pop();
            return;
        }
    }

    let raw = tree.new_raw(html);
    tree.append_child(top, raw);
}
