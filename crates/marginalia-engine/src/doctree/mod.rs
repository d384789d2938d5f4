/*!
 * An abstract rendered-document tree.
 *
 * The render-side half of the highlight engine never touches a real browser
 * DOM. It works against this small tree model instead, which only has to
 * satisfy one capability: expose a linear sequence of text nodes in document
 * order, excluding any subtree rooted at a highlight marker. Everything else
 * (building trees from markdown, serializing them back to HTML, splitting
 * and wrapping text nodes) exists so that the offset mapping and marker
 * application can be exercised end to end without a rendering engine.
 *
 * The canonical text produced by [`canonical_text`] is the addressing space
 * for render-side offsets. It is rebuilt fresh on every walk; node splits
 * invalidate any previously built [`OffsetMap`], so the applier rebuilds the
 * map between highlight applications.
 */

mod apply;
mod build;
mod extract;
mod node;

pub use apply::{apply_highlights, clear_markers};
pub use build::build_tree;
pub use extract::{NodeSlice, OffsetMap, TextSpan, canonical_text};
pub use node::{DocTree, MARK_ID_ATTR, MARK_TAG, NodeId, NodeKind};
