use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// Returns `path` if it is a directory, creating it (and its parents) when
/// `create` is set. Fails if `path` or any existing ancestor is not a
/// directory.
pub fn ensure_dir(path: &Path, create: bool) -> Result<Option<PathBuf>> {
    if path.is_dir() {
        return Ok(Some(path.to_path_buf()));
    }

    if let Some(blocker) = path.ancestors().find(|p| p.exists()) {
        if !blocker.is_dir() {
            return Err(Error::NotADirectory(blocker.to_path_buf()));
        }
    }

    if !create {
        return Ok(None);
    }

    debug!(path = %path.display(), "creating directory");
    fs::create_dir_all(path)?;
    Ok(Some(path.to_path_buf()))
}

/// Like [`ensure_dir`], for the directory that will hold the file `path`.
pub fn ensure_file(path: &Path, create: bool) -> Result<Option<PathBuf>> {
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    Ok(ensure_dir(parent, create)?.map(|_| path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_directories_on_request() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c");

        assert_eq!(ensure_dir(&nested, false).unwrap(), None);
        assert!(!nested.exists());

        assert_eq!(ensure_dir(&nested, true).unwrap(), Some(nested.clone()));
        assert!(nested.is_dir());
    }

    #[test]
    fn fails_when_a_component_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a");
        fs::write(&file, "x").unwrap();

        match ensure_dir(&file.join("b/c"), true) {
            Err(Error::NotADirectory(path)) => assert_eq!(path, file),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(ensure_dir(&file, true), Err(Error::NotADirectory(_))));
    }

    #[test]
    fn ensures_parent_of_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("objects/ab/cdef");

        assert_eq!(ensure_file(&file, true).unwrap(), Some(file.clone()));
        assert!(dir.path().join("objects/ab").is_dir());
        assert!(!file.exists());
    }
}
