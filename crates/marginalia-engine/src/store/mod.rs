/*!
 * The highlight record store.
 *
 * Highlights are keyed by resource path. Only the access contract matters to
 * the rest of the engine; callers treat the store as fail-soft and degrade to
 * a no-highlights render when it errors. Two implementations are provided:
 * a JSON file store used by the viewer and an in-memory store used by tests.
 */

mod json;
mod memory;

use std::collections::BTreeMap;
use std::path::PathBuf;

use relative_path::{RelativePath, RelativePathBuf};

use crate::models::{Highlight, HighlightId};

pub use json::JsonFileStore;
pub use memory::MemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read highlight store at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write highlight store at {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("highlight store at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Keyed record store for highlights.
pub trait HighlightStore {
    /// All highlights for one document.
    fn get(&self, resource: &RelativePath) -> Result<Vec<Highlight>, StoreError>;

    /// Insert or replace (by id) a highlight record.
    fn put(&mut self, highlight: Highlight) -> Result<(), StoreError>;

    /// Delete by id; `false` when no such record exists.
    fn delete(&mut self, id: HighlightId) -> Result<bool, StoreError>;

    /// Look up a single record by id.
    fn find(&self, id: HighlightId) -> Result<Option<Highlight>, StoreError>;

    /// All highlights for documents under a directory prefix.
    fn list_by_directory_prefix(
        &self,
        prefix: &RelativePath,
    ) -> Result<Vec<Highlight>, StoreError>;
}

/// Shared record-map operations backing both store implementations.
pub(crate) type RecordMap = BTreeMap<String, Vec<Highlight>>;

pub(crate) fn map_get(map: &RecordMap, resource: &RelativePath) -> Vec<Highlight> {
    let mut records = map
        .get(resource.normalize().as_str())
        .cloned()
        .unwrap_or_default();
    records.sort_by_key(|h| h.start_offset);
    records
}

pub(crate) fn map_put(map: &mut RecordMap, highlight: Highlight) {
    map_remove(map, highlight.id);
    let key = highlight.resource_path.normalize().as_str().to_string();
    map.entry(key).or_default().push(highlight);
}

pub(crate) fn map_remove(map: &mut RecordMap, id: HighlightId) -> bool {
    let mut removed = false;
    map.retain(|_, records| {
        let before = records.len();
        records.retain(|h| h.id != id);
        removed |= records.len() != before;
        !records.is_empty()
    });
    removed
}

pub(crate) fn map_find(map: &RecordMap, id: HighlightId) -> Option<Highlight> {
    map.values()
        .flat_map(|records| records.iter())
        .find(|h| h.id == id)
        .cloned()
}

pub(crate) fn map_list_prefix(map: &RecordMap, prefix: &RelativePath) -> Vec<Highlight> {
    let prefix = prefix.normalize();
    let mut records: Vec<Highlight> = map
        .iter()
        .filter(|(resource, _)| {
            prefix.as_str().is_empty()
                || prefix.as_str() == "."
                || RelativePathBuf::from(resource.as_str()).starts_with(&prefix)
        })
        .flat_map(|(_, records)| records.iter().cloned())
        .collect();
    records.sort_by(|a, b| {
        (a.resource_path.as_str(), a.start_offset).cmp(&(b.resource_path.as_str(), b.start_offset))
    });
    records
}
