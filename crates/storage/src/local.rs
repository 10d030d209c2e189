//! Local filesystem primitives.
//!
//! Every disk operation the manager performs goes through one of these, so
//! that [`std::io::Error`]s are mapped onto [`ErrorKind`] in one place and
//! every file handle is closed before the function returns. Unlike a plain
//! [`std::fs::rename`], nothing in here ever silently replaces an existing
//! entry.

use crate::error::{ErrorKind, Result};
use std::fs::{self, Metadata, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Fetch metadata, following symlinks.
pub fn metadata(path: &Path) -> Result<Metadata> {
    Ok(fs::metadata(path).map_err(|e| ErrorKind::from_io(e, path))?)
}

/// Fetch metadata for `path` itself, never following a final symlink.
pub fn symlink_metadata(path: &Path) -> Result<Metadata> {
    Ok(fs::symlink_metadata(path).map_err(|e| ErrorKind::from_io(e, path))?)
}

/// Absolute form of `path` with every symlink resolved. The path must exist.
pub fn canonicalize(path: &Path) -> Result<PathBuf> {
    Ok(fs::canonicalize(path).map_err(|e| ErrorKind::from_io(e, path))?)
}

/// Does *anything* (including a dangling symlink) occupy `path`?
pub fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Create a single directory. The parent must already exist.
pub fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir(path).map_err(|e| ErrorKind::from_io(e, path))?;
    tracing::debug!(path = %path.display(), "Created directory");
    Ok(())
}

/// Create a brand-new file containing `data`.
///
/// Fails with [`AlreadyExists`](ErrorKind::AlreadyExists) rather than
/// truncating a file that is already there.
pub fn create_file(path: &Path, data: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| ErrorKind::from_io(e, path))?;
    file.write_all(data).map_err(|e| ErrorKind::from_io(e, path))?;
    tracing::debug!(path = %path.display(), bytes = data.len(), "Created file");
    Ok(())
}

/// Rename/move a file or a whole directory tree.
///
/// Returns [`NotFound`](ErrorKind::NotFound) if `from` does not exist and
/// [`AlreadyExists`](ErrorKind::AlreadyExists) if `to` is already taken.
pub fn rename(from: &Path, to: &Path) -> Result<()> {
    if !occupied(from) {
        exn::bail!(ErrorKind::NotFound(from.to_path_buf()));
    }
    if occupied(to) {
        exn::bail!(ErrorKind::AlreadyExists(to.to_path_buf()));
    }
    fs::rename(from, to).map_err(|e| ErrorKind::from_io(e, from))?;
    tracing::debug!(from = %from.display(), to = %to.display(), "Renamed");
    Ok(())
}

pub fn remove_file(path: &Path) -> Result<()> {
    fs::remove_file(path).map_err(|e| ErrorKind::from_io(e, path))?;
    tracing::debug!(path = %path.display(), "Deleted file");
    Ok(())
}

/// Recursively delete a directory and everything inside it.
pub fn remove_dir_all(path: &Path) -> Result<()> {
    fs::remove_dir_all(path).map_err(|e| ErrorKind::from_io(e, path))?;
    tracing::debug!(path = %path.display(), "Deleted directory");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_file_refuses_to_overwrite() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("file.txt");
        create_file(&path, b"first").unwrap();
        let err = create_file(&path, b"second").unwrap_err();
        assert!(matches!(&*err, ErrorKind::AlreadyExists(_)));
        assert_eq!(fs::read(&path).unwrap(), b"first");
    }

    #[test]
    fn test_create_dir_requires_parent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = create_dir(&temp_dir.path().join("a/b")).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        create_dir(&temp_dir.path().join("a")).unwrap();
        create_dir(&temp_dir.path().join("a/b")).unwrap();
        assert!(temp_dir.path().join("a/b").is_dir());
    }

    #[test]
    fn test_rename() {
        let temp_dir = tempfile::tempdir().unwrap();
        let old = temp_dir.path().join("old.txt");
        let new = temp_dir.path().join("new.txt");
        create_file(&old, b"data").unwrap();
        rename(&old, &new).unwrap();
        assert!(!old.exists());
        assert_eq!(fs::read(&new).unwrap(), b"data");
        // Source is gone now.
        let err = rename(&old, &new).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[test]
    fn test_rename_never_overwrites() {
        let temp_dir = tempfile::tempdir().unwrap();
        let a = temp_dir.path().join("a.txt");
        let b = temp_dir.path().join("b.txt");
        create_file(&a, b"a").unwrap();
        create_file(&b, b"b").unwrap();
        let err = rename(&a, &b).unwrap_err();
        assert!(matches!(&*err, ErrorKind::AlreadyExists(_)));
        assert_eq!(fs::read(&b).unwrap(), b"b");
    }

    #[test]
    fn test_rename_directory_tree() {
        let temp_dir = tempfile::tempdir().unwrap();
        create_dir(&temp_dir.path().join("src")).unwrap();
        create_dir(&temp_dir.path().join("dst")).unwrap();
        create_file(&temp_dir.path().join("src/inner.txt"), b"x").unwrap();
        rename(&temp_dir.path().join("src"), &temp_dir.path().join("dst/src")).unwrap();
        assert!(temp_dir.path().join("dst/src/inner.txt").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_metadata_does_not_follow() {
        let temp_dir = tempfile::tempdir().unwrap();
        create_dir(&temp_dir.path().join("real")).unwrap();
        std::os::unix::fs::symlink(temp_dir.path().join("real"), temp_dir.path().join("link")).unwrap();
        assert!(metadata(&temp_dir.path().join("link")).unwrap().is_dir());
        assert!(symlink_metadata(&temp_dir.path().join("link")).unwrap().file_type().is_symlink());
        let err = symlink_metadata(&temp_dir.path().join("missing")).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[test]
    fn test_remove() {
        let temp_dir = tempfile::tempdir().unwrap();
        create_dir(&temp_dir.path().join("dir")).unwrap();
        create_file(&temp_dir.path().join("dir/file.txt"), b"x").unwrap();
        remove_file(&temp_dir.path().join("dir/file.txt")).unwrap();
        let err = remove_file(&temp_dir.path().join("dir/file.txt")).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        create_file(&temp_dir.path().join("dir/again.txt"), b"x").unwrap();
        remove_dir_all(&temp_dir.path().join("dir")).unwrap();
        assert!(!occupied(&temp_dir.path().join("dir")));
    }
}
