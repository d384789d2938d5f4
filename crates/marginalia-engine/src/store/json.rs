use std::fs;
use std::path::{Path, PathBuf};

use relative_path::RelativePath;

use crate::models::{Highlight, HighlightId};
use crate::store::{HighlightStore, RecordMap, StoreError};

/// File-backed record store: one JSON document mapping resource path to its
/// highlight records, rewritten on every mutation. Documents are small and
/// mutations are user-paced, so a full rewrite is fine.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: RecordMap,
}

impl JsonFileStore {
    /// Open (or lazily create) the store file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self {
                path,
                records: RecordMap::new(),
            });
        }

        let raw = fs::read_to_string(&path).map_err(|source| StoreError::Read {
            path: path.clone(),
            source,
        })?;
        let records = serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(&self.records).map_err(|source| {
            StoreError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, json).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl HighlightStore for JsonFileStore {
    fn get(&self, resource: &RelativePath) -> Result<Vec<Highlight>, StoreError> {
        Ok(super::map_get(&self.records, resource))
    }

    fn put(&mut self, highlight: Highlight) -> Result<(), StoreError> {
        super::map_put(&mut self.records, highlight);
        self.persist()
    }

    fn delete(&mut self, id: HighlightId) -> Result<bool, StoreError> {
        let removed = super::map_remove(&mut self.records, id);
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    fn find(&self, id: HighlightId) -> Result<Option<Highlight>, StoreError> {
        Ok(super::map_find(&self.records, id))
    }

    fn list_by_directory_prefix(
        &self,
        prefix: &RelativePath,
    ) -> Result<Vec<Highlight>, StoreError> {
        Ok(super::map_list_prefix(&self.records, prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use relative_path::RelativePath;

    fn highlight(resource: &str) -> Highlight {
        Highlight::new(
            RelativePath::new(resource).to_relative_path_buf(),
            0..4,
            "text",
            Some("note".to_string()),
        )
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("highlights.json");

        let h = highlight("a.md");
        {
            let mut store = JsonFileStore::open(&path).unwrap();
            store.put(h.clone()).unwrap();
        }

        let store = JsonFileStore::open(&path).unwrap();
        let records = store.get(RelativePath::new("a.md")).unwrap();
        assert_eq!(records, vec![h]);
    }

    #[test]
    fn test_open_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("none.json")).unwrap();
        assert!(store.get(RelativePath::new("a.md")).unwrap().is_empty());
    }

    #[test]
    fn test_open_corrupt_file_reports_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("highlights.json");
        fs::write(&path, "not json at all").unwrap();

        let err = JsonFileStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn test_delete_persists_removal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("highlights.json");

        let h = highlight("a.md");
        let id = h.id;
        {
            let mut store = JsonFileStore::open(&path).unwrap();
            store.put(h).unwrap();
            assert!(store.delete(id).unwrap());
        }

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.find(id).unwrap(), None);
    }
}
