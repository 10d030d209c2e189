//! Path validation and security utilities.
//!
//! Sub-paths handed to the manager are always relative to its root and use
//! `/` as separator. Nothing in here touches the filesystem: a path is
//! resolved lexically so that `..` can never climb out of the root, even
//! through segments that don't exist yet.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Lexically normalizes a root-relative path.
///
/// `.` segments, repeated and trailing separators are dropped and `..` pops
/// the previous segment. An empty result is allowed and means "the root
/// itself".
///
/// > **Note:** This does **not** normalize backslashes on Unix, non-UTF8
/// >           bytes, or platform-specific weirdness. Null bytes are
/// >           explicitly rejected.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use dirman_storage::path::normalize;
/// assert_eq!(normalize("src//pkg/./mod/..").unwrap(), Path::new("src/pkg"));
/// assert_eq!(normalize("").unwrap(), Path::new(""));
/// assert!(normalize("../etc/passwd").is_err());
/// ```
pub fn normalize(path: impl AsRef<Path>) -> Result<PathBuf> {
    // Use Rust's built-in path component parser for robust handling. Means we
    // don't have to deal with non-UTF8 by hand.
    let mut components = Vec::new();
    for component in path.as_ref().components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls, reject them explicitly.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
            },
        }
    }
    Ok(components.into_iter().collect())
}

/// Same as [`normalize`], but the path must name something below the root.
///
/// # Examples
///
/// ```
/// use dirman_storage::validate_path;
/// assert!(validate_path("a/b/c/file.txt").is_ok());
/// assert!(validate_path("a/../file.txt").is_ok()); // (never leaves root)
/// assert!(validate_path("a/../../b").is_err()); // (leaves root)
/// assert!(validate_path("./.").is_err()); // (that's the root itself)
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let normalized = normalize(path.as_ref())?;
    match normalized.as_os_str().is_empty() {
        true => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
        false => Ok(normalized),
    }
}

/// Joins an optional sub-path onto `root`.
///
/// `None` and `""` both resolve to `root`. Multi-segment sub-paths such as
/// `"src/pkg"` are fine; anything that would resolve outside of `root` is
/// rejected with [`InvalidPath`](ErrorKind::InvalidPath).
pub fn resolve(root: &Path, sub_path: Option<&str>) -> Result<PathBuf> {
    match sub_path {
        None => Ok(root.to_path_buf()),
        Some(sub_path) => {
            let relative = normalize(sub_path)?;
            match relative.as_os_str().is_empty() {
                true => Ok(root.to_path_buf()),
                false => Ok(root.join(relative)),
            }
        },
    }
}

/// Validates a single entry name (no separators, not `.` or `..`).
///
/// Used wherever a caller supplies the final name of a file, since a name
/// that smuggles in separators would silently turn a rename into a move.
pub fn validate_name(name: &str) -> Result<&str> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    match invalid {
        true => exn::bail!(ErrorKind::InvalidPath(PathBuf::from(name))),
        false => Ok(name),
    }
}
