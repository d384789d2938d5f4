use relative_path::RelativePath;

use crate::models::{Highlight, HighlightId};
use crate::store::{HighlightStore, RecordMap, StoreError};

/// In-memory record store, used by tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: RecordMap,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HighlightStore for MemoryStore {
    fn get(&self, resource: &RelativePath) -> Result<Vec<Highlight>, StoreError> {
        Ok(super::map_get(&self.records, resource))
    }

    fn put(&mut self, highlight: Highlight) -> Result<(), StoreError> {
        super::map_put(&mut self.records, highlight);
        Ok(())
    }

    fn delete(&mut self, id: HighlightId) -> Result<bool, StoreError> {
        Ok(super::map_remove(&mut self.records, id))
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
