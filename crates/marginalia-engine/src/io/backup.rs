use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use relative_path::{RelativePath, RelativePathBuf};
use tracing::debug;

use crate::io::IoError;

/// Per-resource snapshots of original document content.
///
/// The first highlight created for a document records the source it anchored
/// to. When later edits leave highlights stale, the snapshot can be restored
/// either in place or as a timestamped sibling copy, leaving the edited
/// file untouched.
#[derive(Debug, Clone)]
pub struct BackupStore {
    root: PathBuf,
}

impl BackupStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn backup_path(&self, resource: &RelativePath) -> Result<PathBuf, IoError> {
        let mut path = crate::io::resolve(resource, &self.root)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.set_file_name(format!("{name}.orig"));
        Ok(path)
    }

    /// Record `content` as the resource's original snapshot. Later calls are
    /// no-ops: the snapshot always reflects the source the *first* highlight
    /// anchored to. Returns whether a snapshot was written.
    pub fn record_original(
        &self,
        resource: &RelativePath,
        content: &str,
    ) -> Result<bool, IoError> {
        let path = self.backup_path(resource)?;
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(IoError::Io)?;
        }
        fs::write(&path, content).map_err(IoError::Io)?;
        debug!(resource = %resource, "recorded original snapshot");
        Ok(true)
    }

    /// The stored snapshot, if one exists.
    pub fn read(&self, resource: &RelativePath) -> Result<Option<String>, IoError> {
        let path = self.backup_path(resource)?;
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path).map(Some).map_err(IoError::Io)
    }

    /// Restore the snapshot into the docs tree.
    ///
    /// With `use_timestamp` the snapshot lands next to the document as
    /// `<stem>.restored-<UTC stamp>.<ext>`; otherwise the document itself is
    /// overwritten. Returns the path written.
    pub fn restore(
        &self,
        resource: &RelativePath,
        docs_root: &Path,
        use_timestamp: bool,
    ) -> Result<PathBuf, IoError> {
        let Some(content) = self.read(resource)? else {
            return Err(IoError::NoBackup(resource.to_owned()));
        };

        let target: RelativePathBuf = if use_timestamp {
            let stamp = Utc::now().format("%Y%m%d%H%M%S");
            let stem = resource.file_stem().unwrap_or("restored");
            let name = match resource.extension() {
                Some(ext) => format!("{stem}.restored-{stamp}.{ext}"),
                None => format!("{stem}.restored-{stamp}"),
            };
            resource
                .parent()
                .unwrap_or_else(|| RelativePath::new(""))
                .join(name)
        } else {
            resource.to_owned()
        };

        crate::io::write_source(&target, docs_root, &content)?;
        Ok(target.to_path(docs_root))
    }
}
