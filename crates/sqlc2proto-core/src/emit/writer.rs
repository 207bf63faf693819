//! Artifact writes.

use crate::error::{GenerateError, GenerateResult};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Write `contents` to `path` through a temporary file in the same
/// directory, renamed into place once fully written.
///
/// Missing parent directories are created. On failure the previous file,
/// if any, is left untouched.
pub fn write_atomic(path: &Path, contents: &str) -> GenerateResult<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| GenerateError::io(parent, e))?;

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| GenerateError::io(parent, e))?;
    if let Err(e) = temp.write_all(contents.as_bytes()) {
        return Err(GenerateError::io(temp.path(), e));
    }
    temp.persist(path)
        .map_err(|e| GenerateError::io(path, e.error))?;

    debug!(path = %path.display(), bytes = contents.len(), "wrote file");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_atomic___creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("proto/mappers/mappers.go");

        write_atomic(&path, "package mappers\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "package mappers\n");
    }

    #[test]
    fn write_atomic___replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("models.proto");
        fs::write(&path, "old contents that are longer").unwrap();

        write_atomic(&path, "new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn write_atomic___leaves_no_temporary_files() {
        let dir = TempDir::new().unwrap();

        write_atomic(&dir.path().join("a.proto"), "a").unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn write_atomic___parent_is_a_file___io_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("proto");
        fs::write(&blocker, "").unwrap();

        let err = write_atomic(&blocker.join("models.proto"), "x").unwrap_err();

        assert!(matches!(err, GenerateError::Io { .. }));
    }
}
