//! Query filters.

use crate::error::{ErrorKind, Result};
use dirman_storage::{Directory, File, path};
use std::fmt;
use std::path::{Path, PathBuf};

/// Selects cached entries by name, location and extension.
///
/// Every criterion is optional and an unset criterion matches everything, so
/// `Filter::new()` selects every entry in the cache. When several are set an
/// entry must satisfy all of them.
///
/// - **name**: the file *stem* (the name without its extension), or the
///   directory name. Exact and case-sensitive.
/// - **sub_path**: a root-relative directory; matches entries equal to or
///   nested under it, compared by whole path components (`"a"` does not match
///   `"ab/x.txt"`). Multi-segment values like `"src/pkg"` are allowed.
/// - **extension**: files only, leading dot optional, case-insensitive.
///   Ignored for directories.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filter {
    name: Option<String>,
    sub_path: Option<String>,
    extension: Option<String>,
}
impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn sub_path(mut self, sub_path: impl Into<String>) -> Self {
        self.sub_path = Some(sub_path.into());
        self
    }

    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    /// Resolve the filter against `root`, validating the sub-path.
    pub(crate) fn matcher(&self, root: &Path) -> Result<Matcher<'_>> {
        let scope = match &self.sub_path {
            Some(sub_path) => Some(path::resolve(root, Some(sub_path)).map_err(ErrorKind::storage)?),
            None => None,
        };
        Ok(Matcher {
            name: self.name.as_deref(),
            scope,
            extension: self.extension.as_deref().and_then(normalize_extension),
        })
    }
}
impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let criteria: Vec<String> = [("name", &self.name), ("sub_path", &self.sub_path), ("extension", &self.extension)]
            .into_iter()
            .filter_map(|(key, value)| value.as_ref().map(|v| format!("{key}={v:?}")))
            .collect();
        match criteria.is_empty() {
            true => f.write_str("any entry"),
            false => f.write_str(&criteria.join(", ")),
        }
    }
}

/// Lower-cased extension without its leading dot; `None` for blank input.
pub(crate) fn normalize_extension(extension: &str) -> Option<String> {
    let extension = extension.trim().trim_start_matches('.').to_lowercase();
    (!extension.is_empty()).then_some(extension)
}

/// A [`Filter`] with its sub-path resolved to an absolute scope.
#[derive(Debug)]
pub(crate) struct Matcher<'a> {
    name: Option<&'a str>,
    scope: Option<PathBuf>,
    extension: Option<String>,
}
impl Matcher<'_> {
    fn in_scope(&self, path: &Path) -> bool {
        self.scope.as_deref().is_none_or(|scope| path.starts_with(scope))
    }

    pub(crate) fn matches_file(&self, file: &File) -> bool {
        self.name.is_none_or(|name| name == file.stem())
            && self.extension.as_deref().is_none_or(|ext| ext == file.extension())
            && self.in_scope(file.path())
    }

    pub(crate) fn matches_directory(&self, directory: &Directory) -> bool {
        self.name.is_none_or(|name| name == directory.name()) && self.in_scope(directory.path())
    }
}
