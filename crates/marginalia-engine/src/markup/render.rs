use pulldown_cmark::{Options, Parser, html};

use crate::anchoring::validate::RangeError;
use crate::markup::inject_markers;
use crate::models::Highlight;

fn parser_options() -> Options {
    Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES
}

/// Render markdown source to an HTML string.
pub fn render_html(markdown: &str) -> String {
    let mut out = String::new();
    html::push_html(&mut out, Parser::new_ext(markdown, parser_options()));
    out
}

/// Inject markers for the given highlights, then render to HTML.
pub fn render_marked(source: &str, highlights: &[Highlight]) -> Result<String, RangeError> {
    let marked = inject_markers(source, highlights)?;
    Ok(render_html(&marked))
}

#[cfg(test)]
mod tests {
    use super::*;
    use relative_path::RelativePath;
    use uuid::Uuid;

    #[test]
    fn test_markers_survive_markdown_rendering() {
        let source = "A paragraph with a *highlighted* phrase.";
        let mut h = Highlight::new(
            RelativePath::new("doc.md").to_relative_path_buf(),
            2..11,
            "paragraph",
            None,
        );
        h.id = Uuid::from_u128(9);

        let html = render_marked(source, &[h]).unwrap();

        // The renderer passed the marker through as inline HTML rather than
        // escaping it.
        assert!(html.contains(
            "<mark data-highlight-id=\"00000000-0000-0000-0000-000000000009\">paragraph</mark>"
        ));
        assert!(!html.contains("&lt;mark"));
    }

    #[test]
    fn test_plain_render_has_no_markers() {
        let html = render_marked("plain text", &[]).unwrap();
        assert_eq!(html.trim(), "<p>plain text</p>");
    }
}
