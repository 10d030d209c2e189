//! The [`Directory`] entity.

use crate::error::{ErrorKind, Result};
use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// One directory, identified by its absolute path.
///
/// Constructing a `Directory` does no I/O. [`contains`](Self::contains) is
/// the only operation that goes to disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Directory {
    path: PathBuf,
    name: String,
}
impl Directory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = Self::derive_name(&path);
        Self { path, name }
    }

    /// The same directory value, relocated to `path`. Does not touch the disk.
    pub fn with_path(self, path: impl Into<PathBuf>) -> Self {
        Self::new(path)
    }

    fn derive_name(path: &Path) -> String {
        // Empty for paths without a final component (e.g. "/").
        path.file_name().unwrap_or_default().to_string_lossy().into_owned()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Checks the live filesystem (not any cache) for an entry called exactly
    /// `entry_name` directly inside this directory.
    ///
    /// The comparison is case-sensitive and on the full entry name, so
    /// `"notes"` does not match `notes.txt`.
    pub fn contains(&self, entry_name: &str) -> Result<bool> {
        let target = OsStr::new(entry_name);
        let entries = fs::read_dir(&self.path).map_err(|e| ErrorKind::from_io(e, &self.path))?;
        for entry in entries {
            let entry = entry.map_err(|e| ErrorKind::from_io(e, &self.path))?;
            if entry.file_name() == target {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
impl fmt::Display for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
