//! Read-only lookups against the cache.
//!
//! Everything here answers from the in-memory index, in cache order, except
//! [`find_text`](DirectoryManager::find_text) which has to read file contents.

use crate::error::{ErrorKind, Result};
use crate::filter::Filter;
use crate::manager::DirectoryManager;
use dirman_storage::{Directory, File};
use exn::OptionExt;

impl DirectoryManager {
    /// Every cached file matching `filter`.
    pub fn find_files(&self, filter: &Filter) -> Result<Vec<File>> {
        let matcher = filter.matcher(&self.root)?;
        Ok(self.cache.files().filter(|f| matcher.matches_file(f)).cloned().collect())
    }

    /// The first cached file matching `filter`, or [`NotFound`](ErrorKind::NotFound).
    pub fn find_file(&self, filter: &Filter) -> Result<File> {
        let matcher = filter.matcher(&self.root)?;
        self.cache
            .files()
            .find(|f| matcher.matches_file(f))
            .cloned()
            .ok_or_raise(|| ErrorKind::NotFound(format!("file matching {filter}")))
    }

    /// Cached directories matching `filter` (its extension is ignored). With
    /// `first_only` the result holds at most one directory.
    pub fn find_directories(&self, filter: &Filter, first_only: bool) -> Result<Vec<Directory>> {
        let matcher = filter.matcher(&self.root)?;
        let matches = self.cache.directories().filter(|d| matcher.matches_directory(d)).cloned();
        Ok(match first_only {
            true => matches.take(1).collect(),
            false => matches.collect(),
        })
    }

    /// The first cached directory matching `filter`, or [`NotFound`](ErrorKind::NotFound).
    pub fn find_directory(&self, filter: &Filter) -> Result<Directory> {
        self.find_directories(filter, true)?
            .into_iter()
            .next()
            .ok_or_raise(|| ErrorKind::NotFound(format!("directory matching {filter}")))
    }

    /// Cached files whose decoded content contains `needle` (case-sensitive).
    ///
    /// Files that can no longer be read are skipped rather than failing the
    /// search. Undecodable bytes never match anything but themselves, since
    /// decoding is lossy.
    pub fn find_text(&self, needle: &str) -> Vec<File> {
        self.cache
            .files()
            .filter(|file| match file.read() {
                Ok(content) => content.contains(needle),
                Err(err) => {
                    tracing::debug!(path = %file.path().display(), error = ?err, "Skipping unreadable file in text search");
                    false
                },
            })
            .cloned()
            .collect()
    }

    /// Cached files equal to or nested under `sub_path` (`None` for all).
    pub fn get_files(&self, sub_path: Option<&str>) -> Result<Vec<File>> {
        self.find_files(&scoped(sub_path))
    }

    /// Cached directories equal to or nested under `sub_path` (`None` for all).
    pub fn get_directories(&self, sub_path: Option<&str>) -> Result<Vec<Directory>> {
        self.find_directories(&scoped(sub_path), false)
    }
}

fn scoped(sub_path: Option<&str>) -> Filter {
    match sub_path {
        Some(sub_path) => Filter::new().sub_path(sub_path),
        None => Filter::new(),
    }
}
