/*!
 * Source-side markup: embedding highlight markers into raw source text and
 * rendering the result.
 *
 * Injection happens *before* markdown rendering: the marker is inline HTML
 * that the renderer passes through rather than escaping, so the rendered
 * output carries `<mark data-highlight-id="…">` elements the client can
 * attach handlers to. The alternative path, applying markers to an
 * already-rendered tree, lives in [`crate::doctree`].
 */

mod inject;
mod render;

pub use inject::{inject_markers, marker_close, marker_open};
pub use render::{render_html, render_marked};
