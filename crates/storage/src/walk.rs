//! Recursive directory walking.

use crate::error::{Error, ErrorKind, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// A single entry discovered by [`walk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEntry {
    Directory(PathBuf),
    File(PathBuf),
}

/// Restricts which entries a walk admits.
///
/// All comparisons are case-insensitive. Directories are only subject to
/// [`ignore_path_components`](Self::ignore_path_components); an ignored
/// directory is not descended into. Files must pass every configured check:
///
/// 1. no component of the root-relative path is an ignored component,
/// 2. if target extensions or exact file names are configured, the file has
///    one of the extensions *or* one of the exact names,
/// 3. if whitelist substrings are configured, the name contains one of them,
/// 4. the name contains none of the ignored substrings.
///
/// The default filter admits everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WalkFilter {
    ignore_path_components: HashSet<String>,
    target_extensions: HashSet<String>,
    target_exact_filenames: HashSet<String>,
    whitelist_filename_substrings: Vec<String>,
    ignore_filename_substrings: Vec<String>,
}
impl WalkFilter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lowercase<I: IntoIterator<Item = S>, S: AsRef<str>, C: FromIterator<String>>(values: I) -> C {
        values
            .into_iter()
            .map(|s| s.as_ref().trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn ignore_path_components<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, components: I) -> Self {
        self.ignore_path_components = Self::lowercase(components);
        self
    }

    /// Extensions may be given with or without their leading dot.
    pub fn target_extensions<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, extensions: I) -> Self {
        let extensions: Vec<String> = Self::lowercase(extensions);
        self.target_extensions = extensions
            .into_iter()
            .map(|ext| ext.trim_start_matches('.').to_string())
            .filter(|ext| !ext.is_empty())
            .collect();
        self
    }

    pub fn target_exact_filenames<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, names: I) -> Self {
        self.target_exact_filenames = Self::lowercase(names);
        self
    }

    pub fn whitelist_filename_substrings<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, substrings: I) -> Self {
        self.whitelist_filename_substrings = Self::lowercase(substrings);
        self
    }

    pub fn ignore_filename_substrings<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, substrings: I) -> Self {
        self.ignore_filename_substrings = Self::lowercase(substrings);
        self
    }

    /// `true` if this filter admits every entry.
    pub fn is_unrestricted(&self) -> bool {
        self == &Self::default()
    }

    fn ignored_component(&self, relative: &Path) -> bool {
        !self.ignore_path_components.is_empty()
            && relative
                .components()
                .any(|c| self.ignore_path_components.contains(&c.as_os_str().to_string_lossy().to_lowercase()))
    }

    /// Should a directory at this root-relative path be listed (and walked)?
    pub fn admits_directory(&self, relative: &Path) -> bool {
        !self.ignored_component(relative)
    }

    /// Should a file at this root-relative path be listed?
    pub fn admits_file(&self, relative: &Path) -> bool {
        if self.ignored_component(relative) {
            return false;
        }
        let name = relative.file_name().unwrap_or_default().to_string_lossy().to_lowercase();
        let extension = relative.extension().unwrap_or_default().to_string_lossy().to_lowercase();

        let targeted = !self.target_extensions.is_empty() || !self.target_exact_filenames.is_empty();
        if targeted && !self.target_extensions.contains(&extension) && !self.target_exact_filenames.contains(&name) {
            return false;
        }
        if !self.whitelist_filename_substrings.is_empty()
            && !self.whitelist_filename_substrings.iter().any(|sub| name.contains(sub.as_str()))
        {
            return false;
        }
        !self.ignore_filename_substrings.iter().any(|sub| name.contains(sub.as_str()))
    }

    fn admits_entry(&self, root: &Path, entry: &DirEntry) -> bool {
        let Ok(relative) = entry.path().strip_prefix(root) else {
            return false;
        };
        match entry.file_type() {
            t if t.is_dir() => self.admits_directory(relative),
            t if t.is_file() => self.admits_file(relative),
            // Dropped further down anyway.
            _ => true,
        }
    }
}

/// Walks everything below `root` (not `root` itself) in a stable,
/// name-sorted, depth-first order: every directory is yielded before its
/// contents.
///
/// Symbolic links are never followed, and are not listed themselves, so the
/// walk can neither loop nor leave `root`. Failures to read an entry are
/// yielded as errors and the walk carries on with the next one.
pub fn walk<'a>(root: &'a Path, filter: &'a WalkFilter) -> impl Iterator<Item = Result<WalkEntry>> + 'a {
    WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| filter.admits_entry(root, entry))
        .filter_map(move |entry| match entry {
            Ok(entry) if entry.file_type().is_dir() => Some(Ok(WalkEntry::Directory(entry.into_path()))),
            Ok(entry) if entry.file_type().is_file() => Some(Ok(WalkEntry::File(entry.into_path()))),
            // Note: silently drop symlinks, sockets, fifos...
            Ok(_) => None,
            Err(err) => Some(Err(map_walk_error(err, root))),
        })
}

fn map_walk_error(err: walkdir::Error, root: &Path) -> Error {
    let path = err.path().unwrap_or(root).to_path_buf();
    let message = err.to_string();
    match err.into_io_error() {
        Some(io) => ErrorKind::from_io(io, &path).into(),
        // Only loop detection lands here, which can't happen without following links.
        None => ErrorKind::Io(std::io::Error::other(message)).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;

    fn populate(root: &Path) {
        for dir in ["src", "src/pkg", "node_modules", "node_modules/dep", "docs"] {
            fs::create_dir(root.join(dir)).unwrap();
        }
        for file in [
            "Makefile",
            "README.md",
            "src/main.rs",
            "src/main.test.rs",
            "src/pkg/lib.rs",
            "node_modules/dep/index.js",
            "docs/guide.md",
        ] {
            fs::write(root.join(file), b"x").unwrap();
        }
    }

    fn collect(root: &Path, filter: &WalkFilter) -> Vec<WalkEntry> {
        walk(root, filter).collect::<Result<Vec<_>>>().unwrap()
    }

    fn relative(root: &Path, entries: &[WalkEntry]) -> Vec<String> {
        entries
            .iter()
            .map(|e| match e {
                WalkEntry::Directory(p) => format!("{}/", p.strip_prefix(root).unwrap().display()),
                WalkEntry::File(p) => p.strip_prefix(root).unwrap().display().to_string(),
            })
            .collect()
    }

    #[test]
    fn test_walk_everything() {
        let temp_dir = tempfile::tempdir().unwrap();
        populate(temp_dir.path());
        let entries = collect(temp_dir.path(), &WalkFilter::default());
        assert_eq!(
            relative(temp_dir.path(), &entries),
            vec![
                "Makefile",
                "README.md",
                "docs/",
                "docs/guide.md",
                "node_modules/",
                "node_modules/dep/",
                "node_modules/dep/index.js",
                "src/",
                "src/main.rs",
                "src/main.test.rs",
                "src/pkg/",
                "src/pkg/lib.rs",
            ]
        );
    }

    #[test]
    fn test_walk_is_stable() {
        let temp_dir = tempfile::tempdir().unwrap();
        populate(temp_dir.path());
        let filter = WalkFilter::default();
        assert_eq!(collect(temp_dir.path(), &filter), collect(temp_dir.path(), &filter));
    }

    #[test]
    fn test_walk_prunes_ignored_components() {
        let temp_dir = tempfile::tempdir().unwrap();
        populate(temp_dir.path());
        let filter = WalkFilter::new().ignore_path_components(["NODE_MODULES", "docs"]);
        let entries = relative(temp_dir.path(), &collect(temp_dir.path(), &filter));
        assert!(entries.iter().all(|e| !e.starts_with("node_modules") && !e.starts_with("docs")));
        assert!(entries.contains(&"src/pkg/lib.rs".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_skips_symlinks() {
        let temp_dir = tempfile::tempdir().unwrap();
        populate(temp_dir.path());
        // A cycle back to the root must not be followed.
        std::os::unix::fs::symlink(temp_dir.path(), temp_dir.path().join("src/loop")).unwrap();
        let entries = relative(temp_dir.path(), &collect(temp_dir.path(), &WalkFilter::default()));
        assert_eq!(entries.len(), 12);
        assert!(!entries.iter().any(|e| e.contains("loop")));
    }

    #[rstest]
    #[case(WalkFilter::new(), "src/main.rs", true)]
    #[case(WalkFilter::new().target_extensions([".rs"]), "src/main.rs", true)]
    #[case(WalkFilter::new().target_extensions(["RS"]), "src/main.rs", true)]
    #[case(WalkFilter::new().target_extensions(["."]), "src/main.rs", true)]
    #[case(WalkFilter::new().target_extensions(["rs"]), "README.md", false)]
    #[case(WalkFilter::new().target_extensions(["rs"]).target_exact_filenames(["makefile"]), "Makefile", true)]
    #[case(WalkFilter::new().target_exact_filenames(["Makefile"]), "src/main.rs", false)]
    #[case(WalkFilter::new().whitelist_filename_substrings(["main"]), "src/main.rs", true)]
    #[case(WalkFilter::new().whitelist_filename_substrings(["main"]), "src/pkg/lib.rs", false)]
    #[case(WalkFilter::new().ignore_filename_substrings([".test."]), "src/main.test.rs", false)]
    #[case(WalkFilter::new().ignore_filename_substrings([".test."]), "src/main.rs", true)]
    #[case(WalkFilter::new().ignore_path_components(["pkg"]), "src/pkg/lib.rs", false)]
    fn test_admits_file(#[case] filter: WalkFilter, #[case] path: &str, #[case] expected: bool) {
        assert_eq!(filter.admits_file(Path::new(path)), expected);
    }

    #[test]
    fn test_directories_only_see_components() {
        let filter = WalkFilter::new().target_extensions(["rs"]).ignore_filename_substrings(["src"]);
        assert!(filter.admits_directory(Path::new("src")));
        let filter = WalkFilter::new().ignore_path_components(["Target"]);
        assert!(!filter.admits_directory(Path::new("crates/target")));
    }

    #[test]
    fn test_unrestricted() {
        assert!(WalkFilter::new().is_unrestricted());
        // Blank entries don't count as restrictions.
        assert!(WalkFilter::new().target_extensions([" "]).is_unrestricted());
        assert!(WalkFilter::new().target_extensions([".", " .. "]).is_unrestricted());
        assert!(!WalkFilter::new().target_extensions(["rs"]).is_unrestricted());
    }
}
