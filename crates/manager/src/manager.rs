//! The [`DirectoryManager`] itself: construction, gathering and accessors.
//!
//! Queries live in [`query`](crate::query), mutations in
//! [`mutate`](crate::mutate) and the tree/diff views in
//! [`present`](crate::present); they are all methods on the same type.

use crate::cache::Cache;
use crate::error::{ErrorKind, Result};
use dirman_storage::{Directory, Encoding, File, WalkEntry, WalkFilter, local, path, walk};
use exn::ResultExt;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Tunables for a [`DirectoryManager`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Options {
    /// Encoding handed to every gathered or created [`File`].
    pub encoding: Encoding,
    /// Restricts which entries are indexed. Applied by [`gather`] and by
    /// every mutation, so the cache always equals what a fresh gather would
    /// produce.
    ///
    /// [`gather`]: DirectoryManager::gather
    pub filter: WalkFilter,
}

/// An in-memory index of every directory and regular file below a root,
/// kept consistent with disk across the manager's own mutations.
///
/// The index is not a watcher: changes made to the tree by anyone else are
/// only picked up by the next [`gather`](Self::gather).
#[derive(Clone, Debug)]
pub struct DirectoryManager {
    pub(crate) root: PathBuf,
    pub(crate) options: Options,
    pub(crate) cache: Cache,
}
impl DirectoryManager {
    /// Index `root` with default [`Options`].
    ///
    /// An empty `root` means the current working directory. The root is
    /// canonicalized (symlinks resolved, made absolute) and must be an
    /// existing directory, otherwise [`InvalidPath`](ErrorKind::InvalidPath).
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        Self::with_options(root, Options::default())
    }

    pub fn with_options(root: impl AsRef<Path>, options: Options) -> Result<Self> {
        let root = root.as_ref();
        let root = match root.as_os_str().is_empty() {
            true => std::env::current_dir().or_raise(|| ErrorKind::InvalidPath(root.to_path_buf()))?,
            false => root.to_path_buf(),
        };
        let root = local::canonicalize(&root).or_raise(|| ErrorKind::InvalidPath(root.clone()))?;
        let metadata = local::metadata(&root).or_raise(|| ErrorKind::InvalidPath(root.clone()))?;
        if !metadata.is_dir() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        let mut manager = Self { root, options, cache: Cache::default() };
        manager.gather();
        Ok(manager)
    }

    /// Re-walk the whole tree and replace the cache with what is on disk now.
    ///
    /// Entries that can't be read (permissions, or removed mid-walk) are
    /// logged and skipped; gathering itself never fails.
    #[instrument(skip_all, fields(root = %self.root.display()))]
    pub fn gather(&mut self) {
        let mut cache = Cache::default();
        let mut skipped = 0usize;
        for entry in walk(&self.root, &self.options.filter) {
            match entry {
                Ok(WalkEntry::Directory(path)) => cache.insert_directory(Directory::new(path)),
                Ok(WalkEntry::File(path)) => match File::open(&path) {
                    Ok(file) => cache.insert_file(file.with_encoding(self.options.encoding)),
                    Err(err) => {
                        skipped += 1;
                        tracing::warn!(path = %path.display(), error = ?err, "Skipping file that vanished or can't be read");
                    },
                },
                Err(err) => {
                    skipped += 1;
                    tracing::warn!(error = ?err, "Skipping unreadable entry");
                },
            }
        }
        self.cache = cache;
        tracing::debug!(
            directories = self.cache.directories().len(),
            files = self.cache.files().len(),
            extensions = self.cache.extensions().len(),
            skipped,
            "Gathered directory tree"
        );
    }

    /// Absolute, canonical root of the managed tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Every cached directory, in walk order (later additions last).
    pub fn directories(&self) -> impl ExactSizeIterator<Item = &Directory> {
        self.cache.directories()
    }

    /// Every cached file, in walk order (later additions last).
    pub fn files(&self) -> impl ExactSizeIterator<Item = &File> {
        self.cache.files()
    }

    /// The distinct lower-case extensions of the cached files, sorted.
    pub fn extensions(&self) -> impl ExactSizeIterator<Item = &str> {
        self.cache.extensions()
    }

    /// Live check for an entry named exactly `entry_name` directly inside
    /// the directory `sub_path` (`None` for the root). Looks at the disk, not
    /// the cache.
    pub fn contains(&self, sub_path: Option<&str>, entry_name: &str) -> Result<bool> {
        let directory = path::resolve(&self.root, sub_path).map_err(ErrorKind::storage)?;
        Directory::new(directory).contains(entry_name).map_err(ErrorKind::storage)
    }

    /// Would a fresh gather index the directory at `path`?
    pub(crate) fn admits_directory(&self, path: &Path) -> bool {
        admits(&self.root, &self.options.filter, path, false)
    }

    /// Would a fresh gather index the file at `path`?
    pub(crate) fn admits_file(&self, path: &Path) -> bool {
        admits(&self.root, &self.options.filter, path, true)
    }

    /// Re-point cached entries after a batch of renames or moves on disk,
    /// dropping any that the walk filter would no longer admit at their new
    /// location.
    pub(crate) fn relocate(&mut self, moves: &[(PathBuf, PathBuf)]) {
        self.cache.relocate(moves);
        if !self.options.filter.is_unrestricted() {
            let (root, filter) = (&self.root, &self.options.filter);
            self.cache
                .retain(|p| admits(root, filter, p, false), |p| admits(root, filter, p, true));
        }
    }
}

fn admits(root: &Path, filter: &WalkFilter, path: &Path, is_file: bool) -> bool {
    match path.strip_prefix(root) {
        Ok(relative) if is_file => filter.admits_file(relative),
        Ok(relative) => filter.admits_directory(relative),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_new_rejects_bad_roots() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = DirectoryManager::new(temp_dir.path().join("missing")).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
        fs::write(temp_dir.path().join("file.txt"), b"x").unwrap();
        let err = DirectoryManager::new(temp_dir.path().join("file.txt")).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[test]
    fn test_new_canonicalizes_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::create_dir(temp_dir.path().join("sub")).unwrap();
        let manager = DirectoryManager::new(temp_dir.path().join("sub/../sub/.")).unwrap();
        assert_eq!(manager.root(), fs::canonicalize(temp_dir.path().join("sub")).unwrap());
    }

    #[test]
    fn test_empty_root_is_cwd() {
        let manager = DirectoryManager::new("").unwrap();
        assert_eq!(manager.root(), fs::canonicalize(std::env::current_dir().unwrap()).unwrap());
    }

    #[test]
    fn test_gather_populates_cache() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp_dir.path().join("a/b")).unwrap();
        fs::write(temp_dir.path().join("a/one.TXT"), b"1").unwrap();
        fs::write(temp_dir.path().join("a/b/two.md"), b"22").unwrap();
        fs::write(temp_dir.path().join("Makefile"), b"").unwrap();
        let mut manager = DirectoryManager::new(temp_dir.path()).unwrap();
        assert_eq!(manager.directories().len(), 2);
        assert_eq!(manager.files().len(), 3);
        assert_eq!(manager.extensions().collect::<Vec<_>>(), vec!["md", "txt"]);

        // Changes made behind the manager's back only show up after a gather.
        fs::write(temp_dir.path().join("late.rs"), b"").unwrap();
        assert_eq!(manager.files().len(), 3);
        manager.gather();
        assert_eq!(manager.files().len(), 4);
        assert_eq!(manager.extensions().collect::<Vec<_>>(), vec!["md", "rs", "txt"]);
    }

    #[test]
    fn test_gather_respects_walk_filter() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp_dir.path().join("target/debug")).unwrap();
        fs::write(temp_dir.path().join("target/debug/out.rs"), b"").unwrap();
        fs::write(temp_dir.path().join("main.rs"), b"").unwrap();
        fs::write(temp_dir.path().join("notes.md"), b"").unwrap();
        let options = Options {
            filter: WalkFilter::new().ignore_path_components(["target"]).target_extensions(["rs"]),
            ..Options::default()
        };
        let manager = DirectoryManager::with_options(temp_dir.path(), options).unwrap();
        assert_eq!(manager.directories().len(), 0);
        let names: Vec<_> = manager.files().map(|f| f.name()).collect();
        assert_eq!(names, vec!["main.rs"]);
    }

    #[test]
    fn test_contains() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::create_dir(temp_dir.path().join("docs")).unwrap();
        fs::write(temp_dir.path().join("docs/readme.md"), b"").unwrap();
        let manager = DirectoryManager::new(temp_dir.path()).unwrap();
        assert!(manager.contains(None, "docs").unwrap());
        assert!(manager.contains(Some("docs"), "readme.md").unwrap());
        assert!(!manager.contains(Some("docs"), "readme").unwrap());
        // Live, not cached.
        fs::write(temp_dir.path().join("docs/new.md"), b"").unwrap();
        assert!(manager.contains(Some("docs"), "new.md").unwrap());
        let err = manager.contains(Some("missing"), "x").unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        let err = manager.contains(Some("../.."), "x").unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }
}
