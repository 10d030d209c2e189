//! Mutations: each one changes the disk first and then patches the cache to
//! match, so that after it returns the cache is exactly what a fresh
//! [`gather`](DirectoryManager::gather) would produce.
//!
//! Batch operations work entry by entry. If one entry fails, the entries
//! before it stay done (on disk *and* in the cache) and the error is
//! returned; nothing is rolled back.

use crate::error::{ErrorKind, Result};
use crate::filter::{Filter, normalize_extension};
use crate::manager::DirectoryManager;
use dirman_storage::{Directory, File, local, path};
use std::path::{Component, Path, PathBuf};
use tracing::instrument;

impl DirectoryManager {
    /// Create `name` (which may itself be nested, e.g. `"a/b"`) under
    /// `sub_path`, creating any missing parents. Existing directories along
    /// the way are fine; an existing *file* in the way is
    /// [`AlreadyExists`](ErrorKind::AlreadyExists). An absolute `name` is
    /// [`InvalidPath`](ErrorKind::InvalidPath), since joining it would
    /// silently discard `sub_path`.
    #[instrument(skip(self))]
    pub fn create_directory(&mut self, sub_path: Option<&str>, name: &str) -> Result<Directory> {
        if matches!(Path::new(name).components().next(), Some(Component::RootDir | Component::Prefix(_))) {
            exn::bail!(ErrorKind::InvalidPath(PathBuf::from(name)));
        }
        let relative = Path::new(sub_path.unwrap_or_default()).join(name);
        let relative = path::validate(&relative).map_err(ErrorKind::storage)?;
        let path = self.ensure_directory(&relative)?;
        Ok(Directory::new(path))
    }

    /// Create a new file `stem[.extension]` inside `sub_path` (created if
    /// missing) containing `content`.
    ///
    /// The extension is stored lower-case without a leading dot. Never
    /// overwrites: an existing entry of the same name is
    /// [`AlreadyExists`](ErrorKind::AlreadyExists).
    #[instrument(skip(self, content))]
    pub fn create_file(&mut self, sub_path: Option<&str>, stem: &str, extension: Option<&str>, content: &str) -> Result<File> {
        let stem = path::validate_name(stem).map_err(ErrorKind::storage)?;
        let file_name = match extension.and_then(normalize_extension) {
            Some(extension) => format!("{stem}.{extension}"),
            None => stem.to_string(),
        };
        let relative = path::normalize(sub_path.unwrap_or_default()).map_err(ErrorKind::storage)?;
        let directory = match relative.as_os_str().is_empty() {
            true => self.root.clone(),
            false => self.ensure_directory(&relative)?,
        };

        let target = directory.join(&file_name);
        let encoding = self.options.encoding;
        local::create_file(&target, &encoding.encode(content)).map_err(ErrorKind::storage)?;
        let file = File::open(&target).map_err(ErrorKind::storage)?.with_encoding(encoding);
        if self.admits_file(file.path()) {
            self.cache.insert_file(file.clone());
        }
        Ok(file)
    }

    /// Rename the first file matching `current` to `new_full_name`
    /// (extension included), in the same directory.
    #[instrument(skip(self, current), fields(current = %current))]
    pub fn rename_file(&mut self, new_full_name: &str, current: &Filter) -> Result<File> {
        let matches = self.find_files(current)?;
        if matches.len() > 1 {
            tracing::warn!(matches = matches.len(), "Filter is ambiguous, renaming the first match only");
        }
        let Some(mut file) = matches.into_iter().next() else {
            exn::bail!(ErrorKind::NotFound(format!("file matching {current}")));
        };
        let old = file.path().to_path_buf();
        file.rename(new_full_name).map_err(ErrorKind::storage)?;
        self.relocate(&[(old.clone(), file.path().to_path_buf())]);
        tracing::debug!(from = %old.display(), to = %file.path().display(), "Renamed file");
        Ok(file)
    }

    /// Move every file matching `filter` into the first directory matching
    /// `destination`. Returns the moved files at their new locations.
    ///
    /// If nothing matches `filter` this is a no-op and `destination` is not
    /// even looked up. Files already directly inside the destination stay
    /// where they are and are not part of the result.
    #[instrument(skip_all, fields(filter = %filter, destination = %destination))]
    pub fn move_files(&mut self, filter: &Filter, destination: &Filter) -> Result<Vec<File>> {
        let files = self.find_files(filter)?;
        if files.is_empty() {
            return Ok(Vec::new());
        }
        let destination = self.find_directory(destination)?;
        let files: Vec<File> = files
            .into_iter()
            .filter(|f| f.path().parent() != Some(destination.path()))
            .collect();
        let moves: Vec<_> = files
            .iter()
            .map(|f| (f.path().to_path_buf(), destination.path().join(f.name())))
            .collect();
        self.rename_all(&moves, "file")?;
        Ok(files.into_iter().zip(moves).map(|(file, (_, to))| file.with_path(to)).collect())
    }

    /// Move the first file matching `filter` into the first directory
    /// matching `destination`.
    #[instrument(skip_all, fields(filter = %filter, destination = %destination))]
    pub fn move_file(&mut self, filter: &Filter, destination: &Filter) -> Result<File> {
        let file = self.find_file(filter)?;
        let destination = self.find_directory(destination)?;
        let target = destination.path().join(file.name());
        if target == file.path() {
            return Ok(file);
        }
        self.rename_all(&[(file.path().to_path_buf(), target.clone())], "file")?;
        Ok(file.with_path(target))
    }

    /// Move every directory matching `filter` (with its whole subtree) into
    /// the first directory matching `destination`.
    ///
    /// When matches are nested inside one another only the outermost one is
    /// moved, the rest travel along with it. The destination itself is never
    /// a candidate, and moving a directory into its own subtree is
    /// [`InvalidPath`](ErrorKind::InvalidPath); that check happens before
    /// anything is moved.
    #[instrument(skip_all, fields(filter = %filter, destination = %destination))]
    pub fn move_directories(&mut self, filter: &Filter, destination: &Filter) -> Result<Vec<Directory>> {
        let candidates = self.find_directories(filter, false)?;
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let destination = self.find_directory(destination)?;
        let candidates: Vec<Directory> = candidates.into_iter().filter(|d| d != &destination).collect();
        let candidates = outermost(candidates);
        if let Some(ancestor) = candidates.iter().find(|d| destination.path().starts_with(d.path())) {
            exn::bail!(ErrorKind::InvalidPath(ancestor.path().to_path_buf()));
        }

        let candidates: Vec<Directory> = candidates
            .into_iter()
            .filter(|d| d.path().parent() != Some(destination.path()))
            .collect();
        let moves: Vec<_> = candidates
            .iter()
            .map(|d| (d.path().to_path_buf(), destination.path().join(d.name())))
            .collect();
        self.rename_all(&moves, "directory")?;
        Ok(candidates.into_iter().zip(moves).map(|(directory, (_, to))| directory.with_path(to)).collect())
    }

    /// Renames every `(from, to)` pair on disk in order, stopping at the
    /// first failure. Whatever made it across is relocated in the cache in
    /// a single pass before the error (if any) is returned.
    fn rename_all(&mut self, moves: &[(PathBuf, PathBuf)], what: &str) -> Result<()> {
        let mut failure = None;
        let mut done = 0;
        for (from, to) in moves {
            if let Err(err) = local::rename(from, to) {
                failure = Some(err);
                break;
            }
            tracing::debug!(from = %from.display(), to = %to.display(), "Moved {what}");
            done += 1;
        }
        self.relocate(&moves[..done]);
        match failure {
            Some(err) => Err(ErrorKind::storage(err)),
            None => Ok(()),
        }
    }

    /// Delete every file matching `filter`. Returns the deleted paths.
    #[instrument(skip_all, fields(filter = %filter))]
    pub fn delete_files(&mut self, filter: &Filter) -> Result<Vec<PathBuf>> {
        let files = self.find_files(filter)?;
        let mut deleted = Vec::with_capacity(files.len());
        for file in files {
            local::remove_file(file.path()).map_err(ErrorKind::storage)?;
            self.cache.remove(file.path());
            deleted.push(file.path().to_path_buf());
        }
        Ok(deleted)
    }

    /// Recursively delete every directory matching `filter`. Nested matches
    /// collapse into their outermost match. Returns the deleted paths.
    #[instrument(skip_all, fields(filter = %filter))]
    pub fn delete_directories(&mut self, filter: &Filter) -> Result<Vec<PathBuf>> {
        let directories = outermost(self.find_directories(filter, false)?);
        let mut deleted = Vec::with_capacity(directories.len());
        for directory in directories {
            local::remove_dir_all(directory.path()).map_err(ErrorKind::storage)?;
            self.cache.remove(directory.path());
            deleted.push(directory.path().to_path_buf());
        }
        Ok(deleted)
    }

    /// Make sure every component of root-relative `relative` exists as a
    /// directory, caching the ones that had to be created.
    ///
    /// A symlink anywhere along the way is [`InvalidPath`](ErrorKind::InvalidPath):
    /// gather never follows links, so writing through one would put entries
    /// on disk (possibly outside the root) that the cache can't account for.
    fn ensure_directory(&mut self, relative: &Path) -> Result<PathBuf> {
        let mut current = self.root.clone();
        for component in relative.components() {
            current.push(component);
            match local::symlink_metadata(&current) {
                Ok(m) if m.file_type().is_symlink() => exn::bail!(ErrorKind::InvalidPath(current)),
                Ok(m) if m.is_dir() => continue,
                Ok(_) => exn::bail!(ErrorKind::AlreadyExists(current)),
                Err(_) => {},
            }
            local::create_dir(&current).map_err(ErrorKind::storage)?;
            if self.admits_directory(&current) {
                self.cache.insert_directory(Directory::new(current.clone()));
            }
        }
        Ok(current)
    }
}

/// Drops every directory that lies inside another one in the list.
fn outermost(directories: Vec<Directory>) -> Vec<Directory> {
    directories
        .iter()
        .filter(|d| !directories.iter().any(|other| other != *d && d.path().starts_with(other.path())))
        .cloned()
        .collect()
}
