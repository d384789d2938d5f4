/*!
 * Orchestration over the highlight engine: the operations a UI layer calls.
 *
 * Highlight creation is a read-modify-write against current source text with
 * no locking: the source is read, offsets are computed, the record is
 * written. If the document changes in between, the new highlight simply
 * classifies stale on the next render. Accepted, not prevented.
 *
 * The store is treated as fail-soft: a render never dies because the record
 * store is unavailable, it degrades to a no-highlights render. A rejected
 * (overlapping) batch also keeps the document readable: the plain render is
 * returned together with the rejection so the caller can show a banner.
 */

use std::path::{Path, PathBuf};

use relative_path::{RelativePath, RelativePathBuf};
use tracing::{debug, warn};

use crate::anchoring::search::find_text_offset;
use crate::anchoring::stale::{is_anchor_stale, is_range_stale};
use crate::anchoring::validate::{RangeError, sorted_validated};
use crate::io::backup::BackupStore;
use crate::io::{self, IoError};
use crate::markup::{render_html, render_marked};
use crate::models::{Highlight, HighlightId};
use crate::store::{HighlightStore, JsonFileStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum HighlightError {
    #[error("document not found: {0}")]
    ResourceNotFound(RelativePathBuf),
    #[error(
        "occurrence {occurrence_index} of {highlighted_text:?} not found in {resource}"
    )]
    UnresolvableOccurrence {
        resource: RelativePathBuf,
        highlighted_text: String,
        occurrence_index: usize,
    },
    #[error("highlight not found: {0}")]
    HighlightNotFound(HighlightId),
    #[error(transparent)]
    Overlap(#[from] RangeError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Io(#[from] IoError),
}

/// Creation request as sent by the viewing client: the selected text plus the
/// occurrence index computed by [`crate::selection::SelectionContext`].
#[derive(Debug, Clone)]
pub struct CreateHighlight {
    pub resource_path: RelativePathBuf,
    pub highlighted_text: String,
    pub occurrence_index: usize,
    pub notes: Option<String>,
}

/// One rendered page: HTML with markers embedded for active highlights, the
/// full (revalidated) highlight list including stale entries, and the batch
/// rejection, if any, for the caller's error banner.
#[derive(Debug)]
pub struct RenderedDocument {
    pub html: String,
    pub highlights: Vec<Highlight>,
    pub marker_error: Option<RangeError>,
}

pub struct HighlightService<S> {
    docs_root: PathBuf,
    store: S,
    backups: BackupStore,
}

impl HighlightService<JsonFileStore> {
    /// Conventional layout: `<data_dir>/highlights.json` plus
    /// `<data_dir>/backups/`.
    pub fn with_json_store(
        docs_root: impl Into<PathBuf>,
        data_dir: impl AsRef<Path>,
    ) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref();
        let store = JsonFileStore::open(data_dir.join("highlights.json"))?;
        let backups = BackupStore::new(data_dir.join("backups"));
        Ok(Self::new(docs_root, store, backups))
    }
}

impl<S: HighlightStore> HighlightService<S> {
    pub fn new(docs_root: impl Into<PathBuf>, store: S, backups: BackupStore) -> Self {
        Self {
            docs_root: docs_root.into(),
            store,
            backups,
        }
    }

    pub fn docs_root(&self) -> &Path {
        &self.docs_root
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn source(&self, resource: &RelativePath) -> Result<String, HighlightError> {
        match io::read_source(resource, &self.docs_root) {
            Ok(source) => Ok(source),
            Err(IoError::NotFound(path)) => Err(HighlightError::ResourceNotFound(path)),
            Err(other) => Err(other.into()),
        }
    }

    /// Resolve a (text, occurrence index) pair against current source and
    /// persist the resulting highlight.
    ///
    /// The non-overlap invariant is enforced against the document's current
    /// non-stale highlights; a conflicting request is rejected rather than
    /// clipped. An unresolvable occurrence is an error (there is no range to
    /// store), while a resolvable one that no longer matches byte-for-byte
    /// is stored flagged stale so the note isn't lost.
    pub fn create(&mut self, request: CreateHighlight) -> Result<Highlight, HighlightError> {
        let source = self.source(&request.resource_path)?;

        let range = find_text_offset(
            &source,
            &request.highlighted_text,
            request.occurrence_index,
        )
        .ok_or_else(|| HighlightError::UnresolvableOccurrence {
            resource: request.resource_path.clone(),
            highlighted_text: request.highlighted_text.clone(),
            occurrence_index: request.occurrence_index,
        })?;

        let mut candidate = Highlight::new(
            request.resource_path.clone(),
            range.clone(),
            request.highlighted_text,
            request.notes,
        );
        candidate.is_stale = is_range_stale(
            &source,
            candidate.start_offset,
            candidate.end_offset,
            &candidate.highlighted_text,
        );

        if !candidate.is_stale {
            let mut batch: Vec<Highlight> = self
                .store
                .get(&request.resource_path)?
                .into_iter()
                .filter(|h| !h.is_stale)
                .collect();
            batch.push(candidate.clone());
            sorted_validated(&batch)?;
        }

        self.backups.record_original(&request.resource_path, &source)?;
        self.store.put(candidate.clone())?;
        debug!(
            id = %candidate.id,
            resource = %candidate.resource_path,
            range = ?range,
            "created highlight"
        );
        Ok(candidate)
    }

    /// Stored highlights for one document, stale entries included.
    pub fn list(&self, resource: &RelativePath) -> Result<Vec<Highlight>, HighlightError> {
        Ok(self.store.get(resource)?)
    }

    /// Stored highlights for every document under a directory prefix.
    pub fn list_directory(
        &self,
        prefix: &RelativePath,
    ) -> Result<Vec<Highlight>, HighlightError> {
        Ok(self.store.list_by_directory_prefix(prefix)?)
    }

    pub fn delete(&mut self, id: HighlightId) -> Result<(), HighlightError> {
        if self.store.delete(id)? {
            Ok(())
        } else {
            Err(HighlightError::HighlightNotFound(id))
        }
    }

    pub fn update_notes(
        &mut self,
        id: HighlightId,
        notes: Option<String>,
    ) -> Result<Highlight, HighlightError> {
        let Some(mut highlight) = self.store.find(id)? else {
            return Err(HighlightError::HighlightNotFound(id));
        };
        highlight.edit_notes(notes);
        self.store.put(highlight.clone())?;
        Ok(highlight)
    }

    /// Re-judge every stored anchor against the current source, persisting
    /// flag flips lazily in both directions.
    pub fn revalidate(&mut self, resource: &RelativePath) -> Result<Vec<Highlight>, HighlightError> {
        let source = self.source(resource)?;
        self.revalidate_against(resource, &source)
            .map_err(HighlightError::Store)
    }

    fn revalidate_against(
        &mut self,
        resource: &RelativePath,
        source: &str,
    ) -> Result<Vec<Highlight>, StoreError> {
        let mut records = self.store.get(resource)?;
        for highlight in &mut records {
            let stale = is_anchor_stale(source, highlight);
            if highlight.mark_stale(stale)
                && let Err(err) = self.store.put(highlight.clone())
            {
                // Classification stands for this render even if the flag
                // couldn't be persisted.
                warn!(id = %highlight.id, %err, "could not persist stale-flag transition");
            }
        }
        Ok(records)
    }

    /// Render a document with markers embedded for its active highlights.
    pub fn render(&mut self, resource: &RelativePath) -> Result<RenderedDocument, HighlightError> {
        let source = self.source(resource)?;

        let highlights = match self.revalidate_against(resource, &source) {
            Ok(records) => records,
            Err(err) => {
                warn!(%err, "record store unavailable, rendering without highlights");
                Vec::new()
            }
        };

        match render_marked(&source, &highlights) {
            Ok(html) => Ok(RenderedDocument {
                html,
                highlights,
                marker_error: None,
            }),
            Err(rejected) => {
                warn!(resource = %resource, %rejected, "highlight batch rejected");
                Ok(RenderedDocument {
                    html: render_html(&source),
                    highlights,
                    marker_error: Some(rejected),
                })
            }
        }
    }

    /// Restore the original snapshot of the highlight's document, either in
    /// place or as a timestamped copy.
    pub fn restore(
        &mut self,
        id: HighlightId,
        use_timestamp: bool,
    ) -> Result<PathBuf, HighlightError> {
        let Some(highlight) = self.store.find(id)? else {
            return Err(HighlightError::HighlightNotFound(id));
        };
        Ok(self
            .backups
            .restore(&highlight.resource_path, &self.docs_root, use_timestamp)?)
    }
}
