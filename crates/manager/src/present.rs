//! Views over the cache: tree rendering and comparison with another manager.

use crate::error::{ErrorKind, Result};
use crate::manager::DirectoryManager;
use dirman_storage::{Directory, File, path};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

#[derive(Default)]
struct Children<'a> {
    directories: Vec<&'a Directory>,
    files: Vec<&'a File>,
}

impl DirectoryManager {
    /// Paths of the files cached by exactly one of `self` and `other`.
    ///
    /// Paths are absolute: managers over disjoint roots share nothing, while
    /// overlapping roots agree on the files they both see.
    pub fn compare_to(&self, other: &DirectoryManager) -> BTreeSet<PathBuf> {
        let ours: BTreeSet<&Path> = self.files().map(File::path).collect();
        let theirs: BTreeSet<&Path> = other.files().map(File::path).collect();
        ours.symmetric_difference(&theirs).map(|p| p.to_path_buf()).collect()
    }

    /// Render the cached tree below `start` (`None` for the root).
    ///
    /// One line per entry, indented two spaces per level. Directories end in
    /// `/` and come before files; both are ordered by name, ignoring case.
    ///
    /// ```text
    /// project/
    ///   docs/
    ///     guide.md
    ///   README.md
    /// ```
    pub fn render_tree(&self, start: Option<&str>) -> Result<String> {
        let start = path::resolve(&self.root, start).map_err(ErrorKind::storage)?;
        let label = match start == self.root {
            true => self
                .root
                .file_name()
                .map_or_else(|| self.root.display().to_string(), |n| n.to_string_lossy().into_owned()),
            false if self.cache.has_directory(&start) => Directory::new(&start).name().to_string(),
            false => exn::bail!(ErrorKind::NotFound(format!("directory {}", start.display()))),
        };

        let mut children: HashMap<&Path, Children<'_>> = HashMap::new();
        for directory in self.cache.directories() {
            if let Some(parent) = directory.path().parent() {
                children.entry(parent).or_default().directories.push(directory);
            }
        }
        for file in self.cache.files() {
            if let Some(parent) = file.path().parent() {
                children.entry(parent).or_default().files.push(file);
            }
        }

        let mut out = format!("{label}/\n");
        render_level(&children, &start, 1, &mut out);
        Ok(out)
    }

    /// [`render_tree`](Self::render_tree), straight to standard output.
    pub fn print_tree(&self, start: Option<&str>) -> Result<()> {
        print!("{}", self.render_tree(start)?);
        Ok(())
    }
}

fn render_level(children: &HashMap<&Path, Children<'_>>, parent: &Path, depth: usize, out: &mut String) {
    let Some(level) = children.get(parent) else {
        return;
    };
    let indent = "  ".repeat(depth);
    let mut directories = level.directories.clone();
    directories.sort_by_cached_key(|d| (d.name().to_lowercase(), d.name().to_string()));
    for directory in directories {
        out.push_str(&format!("{indent}{}/\n", directory.name()));
        render_level(children, directory.path(), depth + 1, out);
    }
    let mut files = level.files.clone();
    files.sort_by_cached_key(|f| (f.name().to_lowercase(), f.name().to_string()));
    for file in files {
        out.push_str(&format!("{indent}{}\n", file.name()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;
    use std::fs;

    fn populate(root: &Path) {
        for dir in ["docs", "docs/api", "Build"] {
            fs::create_dir(root.join(dir)).unwrap();
        }
        for file in ["README.md", "a.txt", "docs/guide.md", "docs/api/Index.md", "docs/api/b.md"] {
            fs::write(root.join(file), b"x").unwrap();
        }
    }

    #[test]
    fn test_render_tree() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::create_dir(temp_dir.path().join("project")).unwrap();
        populate(&temp_dir.path().join("project"));
        let manager = DirectoryManager::new(temp_dir.path().join("project")).unwrap();
        let expected = "\
project/
  Build/
  docs/
    api/
      b.md
      Index.md
    guide.md
  a.txt
  README.md
";
        assert_eq!(manager.render_tree(None).unwrap(), expected);
        assert_eq!(manager.render_tree(Some("")).unwrap(), expected);
    }

    #[test]
    fn test_render_subtree() {
        let temp_dir = tempfile::tempdir().unwrap();
        populate(temp_dir.path());
        let manager = DirectoryManager::new(temp_dir.path()).unwrap();
        assert_eq!(manager.render_tree(Some("docs/api")).unwrap(), "api/\n  b.md\n  Index.md\n");
        assert_eq!(manager.render_tree(Some("Build")).unwrap(), "Build/\n");
        let err = manager.render_tree(Some("missing")).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        let err = manager.render_tree(Some("..")).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[test]
    fn test_render_tree_follows_mutations() {
        let temp_dir = tempfile::tempdir().unwrap();
        populate(temp_dir.path());
        let mut manager = DirectoryManager::new(temp_dir.path()).unwrap();
        manager.delete_directories(&Filter::new().name("docs")).unwrap();
        manager.create_file(Some("Build"), "out", Some("log"), "").unwrap();
        let rendered = manager.render_tree(None).unwrap();
        let lines: Vec<_> = rendered.lines().skip(1).collect();
        assert_eq!(lines, vec!["  Build/", "    out.log", "  a.txt", "  README.md"]);
    }

    #[test]
    fn test_compare_to() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        for dir in ["first", "second", "first/sub"] {
            fs::create_dir(root.join(dir)).unwrap();
        }
        fs::write(root.join("first/sub/only.txt"), b"x").unwrap();
        let mut whole = DirectoryManager::new(root).unwrap();
        let first = DirectoryManager::new(root.join("first")).unwrap();
        let second = DirectoryManager::new(root.join("second")).unwrap();

        assert!(whole.compare_to(&whole.clone()).is_empty());
        let diff = first.compare_to(&second);
        assert_eq!(diff.len(), 1);
        assert_eq!(diff, second.compare_to(&first));
        // Same file, seen through two different roots: same absolute path.
        assert!(whole.compare_to(&first).is_empty());

        whole.create_file(Some("second"), "new", Some("txt"), "").unwrap();
        let diff = whole.compare_to(&second);
        assert_eq!(
            diff.into_iter().collect::<Vec<_>>(),
            vec![whole.root().join("first/sub/only.txt"), whole.root().join("second/new.txt")]
        );
    }
}
