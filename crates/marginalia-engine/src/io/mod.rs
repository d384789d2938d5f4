pub mod backup;

use std::fs;
use std::path::{Path, PathBuf};

use relative_path::{RelativePath, RelativePathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("document not found: {0}")]
    NotFound(RelativePathBuf),
    #[error("invalid resource path: {0}")]
    InvalidResourcePath(RelativePathBuf),
    #[error("invalid docs directory: {0}")]
    InvalidDocsDir(String),
    #[error("no backup recorded for {0}")]
    NoBackup(RelativePathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolve a resource path under `root`, rejecting empty paths and anything
/// that would escape the root after lexical normalization.
pub(crate) fn resolve(resource: &RelativePath, root: &Path) -> Result<PathBuf, IoError> {
    let normalized = resource.normalize();
    if normalized.as_str().is_empty() || normalized.starts_with("..") {
        return Err(IoError::InvalidResourcePath(resource.to_owned()));
    }
    Ok(normalized.to_path(root))
}

/// Read a document's source text.
pub fn read_source(resource: &RelativePath, docs_root: &Path) -> Result<String, IoError> {
    let absolute = resolve(resource, docs_root)?;
    if !absolute.exists() {
        return Err(IoError::NotFound(resource.to_owned()));
    }
    fs::read_to_string(&absolute).map_err(IoError::Io)
}

/// Write a document's source text, creating parent directories as needed.
pub fn write_source(
    resource: &RelativePath,
    docs_root: &Path,
    content: &str,
) -> Result<(), IoError> {
    let absolute = resolve(resource, docs_root)?;
    if let Some(parent) = absolute.parent() {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }
    fs::write(&absolute, content).map_err(IoError::Io)
}

/// All markdown documents under the docs directory, as sorted resource paths.
pub fn scan_documents(docs_root: &Path) -> Result<Vec<RelativePathBuf>, IoError> {
    validate_docs_dir(docs_root)?;

    let mut found = Vec::new();
    scan_directory_recursive(docs_root, docs_root, &mut found)?;
    found.sort();
    Ok(found)
}

fn scan_directory_recursive(
    root: &Path,
    dir: &Path,
    found: &mut Vec<RelativePathBuf>,
) -> Result<(), IoError> {
    for entry in fs::read_dir(dir).map_err(IoError::Io)? {
        let path = entry.map_err(IoError::Io)?.path();
        if path.is_dir() {
            scan_directory_recursive(root, &path, found)?;
        } else if path.extension().is_some_and(|ext| ext == "md")
            && let Ok(relative) = path.strip_prefix(root)
            && let Some(resource) = relative_resource(relative)
        {
            found.push(resource);
        }
    }
    Ok(())
}

fn relative_resource(relative: &Path) -> Option<RelativePathBuf> {
    let mut resource = RelativePathBuf::new();
    for component in relative.components() {
        resource.push(component.as_os_str().to_str()?);
    }
    Some(resource)
}

pub fn validate_docs_dir(path: &Path) -> Result<(), IoError> {
    if !path.exists() || !path.is_dir() {
        return Err(IoError::InvalidDocsDir(format!(
            "{} is not a directory",
            path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn docs_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    fn create_doc(dir: &tempfile::TempDir, resource: &str, content: &str) {
        let path = RelativePath::new(resource).to_path(dir.path());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_read_source_round_trips_content() {
        let dir = docs_dir();
        create_doc(&dir, "guide.md", "# Guide\n\nBody text");

        let content = read_source(RelativePath::new("guide.md"), dir.path()).unwrap();
        assert_eq!(content, "# Guide\n\nBody text");
    }

    #[test]
    fn test_read_source_missing_document() {
        let dir = docs_dir();
        let err = read_source(RelativePath::new("absent.md"), dir.path()).unwrap_err();
        assert!(matches!(err, IoError::NotFound(_)));
    }

    #[test]
    fn test_read_source_rejects_traversal() {
        let dir = docs_dir();
        let err = read_source(RelativePath::new("../outside.md"), dir.path()).unwrap_err();
        assert!(matches!(err, IoError::InvalidResourcePath(_)));
    }

    #[test]
    fn test_scan_finds_nested_markdown_only() {
        let dir = docs_dir();
        create_doc(&dir, "a.md", "a");
        create_doc(&dir, "nested/deep/b.md", "b");
        create_doc(&dir, "ignored.txt", "x");

        let docs = scan_documents(dir.path()).unwrap();
        let names: Vec<&str> = docs.iter().map(|d| d.as_str()).collect();
        assert_eq!(names, vec!["a.md", "nested/deep/b.md"]);
    }

    #[test]
    fn test_scan_missing_directory_fails() {
        let result = scan_documents(Path::new("/this/path/does/not/exist"));
        assert!(matches!(result, Err(IoError::InvalidDocsDir(_))));
    }

    #[test]
    fn test_write_source_creates_parents() {
        let dir = docs_dir();
        write_source(RelativePath::new("sub/new.md"), dir.path(), "content").unwrap();
        let back = read_source(RelativePath::new("sub/new.md"), dir.path()).unwrap();
        assert_eq!(back, "content");
    }
}
