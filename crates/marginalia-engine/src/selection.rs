//! Session-scoped selection handling for the viewing client.
//!
//! When the user selects text in a rendered document, the selection is
//! expressed as a start position in the canonical text of the current render
//! plus the selected string. Because the same string may occur many times,
//! the client disambiguates by sending an *occurrence index*: how many times
//! the selected text appears strictly before the selection start. The server
//! resolves that index against source text with the same scan, so the two
//! sides always mean the same occurrence.

use crate::anchoring::search::scan_occurrences;
use crate::doctree::{DocTree, canonical_text};

/// Selection state for one rendered page.
///
/// Holds the canonical text the selection offsets refer to. Built fresh per
/// render; it is never shared across sessions or cached across re-renders,
/// since the canonical text changes whenever markers are applied.
#[derive(Debug, Clone)]
pub struct SelectionContext {
    canonical: String,
}

impl SelectionContext {
    /// Capture the canonical text of a rendered tree.
    pub fn for_tree(tree: &DocTree) -> Self {
        Self {
            canonical: canonical_text(tree),
        }
    }

    /// Build directly from canonical text.
    pub fn from_text(canonical: impl Into<String>) -> Self {
        Self {
            canonical: canonical.into(),
        }
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// The zero-based occurrence index for a selection of `selected_text`
    /// starting at `selection_start` in the canonical text.
    ///
    /// Counts occurrences strictly before the selection start using the
    /// advance-by-one scan shared with the server-side locator.
    pub fn occurrence_index(&self, selected_text: &str, selection_start: usize) -> usize {
        scan_occurrences(&self.canonical, selected_text)
            .into_iter()
            .filter(|&offset| offset < selection_start)
            .count()
    }
}
