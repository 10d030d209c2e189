//! The in-memory index.
//!
//! Directories and files live in two path-keyed, insertion-ordered maps so
//! that lookups by path are O(1) while "first match" stays deterministic (it
//! is always walk order, with later additions appended). The extension set
//! is reference-counted per file so that it can be kept up to date without
//! rescanning.

use dirman_storage::{Directory, File};
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default)]
pub(crate) struct Cache {
    directories: IndexMap<PathBuf, Directory>,
    files: IndexMap<PathBuf, File>,
    extensions: BTreeMap<String, usize>,
}
impl Cache {
    pub(crate) fn directories(&self) -> impl ExactSizeIterator<Item = &Directory> {
        self.directories.values()
    }

    pub(crate) fn files(&self) -> impl ExactSizeIterator<Item = &File> {
        self.files.values()
    }

    /// Distinct non-empty extensions of the cached files, sorted.
    pub(crate) fn extensions(&self) -> impl ExactSizeIterator<Item = &str> {
        self.extensions.keys().map(String::as_str)
    }

    pub(crate) fn has_directory(&self, path: &Path) -> bool {
        self.directories.contains_key(path)
    }

    pub(crate) fn insert_directory(&mut self, directory: Directory) {
        self.directories.insert(directory.path().to_path_buf(), directory);
    }

    /// Adds a file, replacing (in place) any entry already cached at its path.
    pub(crate) fn insert_file(&mut self, file: File) {
        self.count_extension(file.extension());
        if let Some(previous) = self.files.insert(file.path().to_path_buf(), file) {
            self.uncount_extension(previous.extension());
        }
    }

    /// Drops `path` and everything cached below it.
    pub(crate) fn remove(&mut self, path: &Path) {
        self.directories.retain(|key, _| !key.starts_with(path));
        let extensions = &mut self.extensions;
        self.files.retain(|key, file| {
            let keep = !key.starts_with(path);
            if !keep {
                uncount(extensions, file.extension());
            }
            keep
        });
    }

    /// Applies a batch of renames: each `from`, and every cached path below
    /// it, is rewritten to sit under its `to` instead. Entries keep their
    /// position in the cache.
    ///
    /// Works for single files (the only entry affected is the file itself,
    /// whose name and extension are re-derived) as well as for directories.
    /// The maps are rebuilt once per batch, and each cached path only looks
    /// up its own ancestors, so moving m entries costs O(n * depth) rather
    /// than O(n * m).
    pub(crate) fn relocate(&mut self, moves: &[(PathBuf, PathBuf)]) {
        if moves.is_empty() {
            return;
        }
        let targets: HashMap<&Path, &Path> = moves.iter().map(|(from, to)| (from.as_path(), to.as_path())).collect();
        let rebase = |path: &Path| -> Option<PathBuf> {
            path.ancestors().find_map(|ancestor| {
                let to = targets.get(ancestor)?;
                let rest = path.strip_prefix(ancestor).ok()?;
                match rest.as_os_str().is_empty() {
                    true => Some(to.to_path_buf()),
                    false => Some(to.join(rest)),
                }
            })
        };
        self.directories = std::mem::take(&mut self.directories)
            .into_iter()
            .map(|(path, directory)| match rebase(&path) {
                Some(new) => (new.clone(), directory.with_path(new)),
                None => (path, directory),
            })
            .collect();
        self.files = std::mem::take(&mut self.files)
            .into_iter()
            .map(|(path, file)| match rebase(&path) {
                Some(new) => (new.clone(), file.with_path(new)),
                None => (path, file),
            })
            .collect();
        self.recount_extensions();
    }

    /// Keeps only the entries `keep_directory`/`keep_file` accept.
    pub(crate) fn retain(&mut self, keep_directory: impl Fn(&Path) -> bool, keep_file: impl Fn(&Path) -> bool) {
        self.directories.retain(|path, _| keep_directory(path));
        let before = self.files.len();
        self.files.retain(|path, _| keep_file(path));
        if self.files.len() != before {
            self.recount_extensions();
        }
    }

    fn recount_extensions(&mut self) {
        self.extensions.clear();
        for file in self.files.values() {
            count(&mut self.extensions, file.extension());
        }
    }

    fn count_extension(&mut self, extension: &str) {
        count(&mut self.extensions, extension);
    }

    fn uncount_extension(&mut self, extension: &str) {
        uncount(&mut self.extensions, extension);
    }
}

fn count(extensions: &mut BTreeMap<String, usize>, extension: &str) {
    if !extension.is_empty() {
        *extensions.entry(extension.to_string()).or_default() += 1;
    }
}

fn uncount(extensions: &mut BTreeMap<String, usize>, extension: &str) {
    if let Some(count) = extensions.get_mut(extension) {
        *count -= 1;
        if *count == 0 {
            extensions.remove(extension);
        }
    }
}
