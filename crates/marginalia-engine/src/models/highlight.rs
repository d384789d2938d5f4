use chrono::{DateTime, Utc};
use relative_path::RelativePathBuf;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier assigned to a highlight at creation.
pub type HighlightId = Uuid;

/// A persisted highlight.
///
/// The offsets form a half-open byte range `[start_offset, end_offset)` into
/// the **source text** of the document at `resource_path`, never into
/// rendered HTML. Offsets are validated against the current source whenever
/// the document is rendered; a highlight whose anchor no longer matches is
/// flagged stale rather than moved (see [`crate::anchoring::stale`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub id: HighlightId,
    pub resource_path: RelativePathBuf,
    pub start_offset: usize,
    pub end_offset: usize,
    /// The literal substring the user selected, kept for display and for
    /// re-validation against the current source.
    pub highlighted_text: String,
    /// True once the stored range no longer reliably corresponds to
    /// `highlighted_text` in the current source.
    pub is_stale: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Highlight {
    /// Create a fresh, non-stale highlight over the given source range.
    pub fn new(
        resource_path: RelativePathBuf,
        range: std::ops::Range<usize>,
        highlighted_text: impl Into<String>,
        notes: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            resource_path,
            start_offset: range.start,
            end_offset: range.end,
            highlighted_text: highlighted_text.into(),
            is_stale: false,
            notes,
            created_at: now,
            updated_at: now,
        }
    }

    /// The highlight's source range as a `Range`.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start_offset..self.end_offset
    }

    /// Flip the stale flag. `updated_at` only changes on actual transitions.
    pub fn mark_stale(&mut self, stale: bool) -> bool {
        if self.is_stale == stale {
            return false;
        }
        self.is_stale = stale;
        self.updated_at = Utc::now();
        true
    }

    /// Replace the free-text annotation, bumping `updated_at`.
    pub fn edit_notes(&mut self, notes: Option<String>) {
        self.notes = notes;
        self.updated_at = Utc::now();
    }
}
