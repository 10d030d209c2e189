//! The [`File`] entity: a snapshot of one regular file on disk.

use crate::encoding::Encoding;
use crate::error::{ErrorKind, Result};
use crate::local;
use crate::models::FileMetadata;
use crate::path::validate_name;
use exn::OptionExt;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

/// One regular file, identified by its absolute path.
///
/// A `File` is a *snapshot*: its size, timestamps and read-only flag are
/// whatever the filesystem reported when the value was constructed (or last
/// [refreshed](Self::refresh)). Writing through one `File` value updates that
/// value only; any other copy of the same path, such as the one held in a
/// manager's cache, keeps its old metadata until it is re-gathered.
///
/// Two `File`s are equal if and only if their paths are equal.
#[derive(Debug, Clone)]
pub struct File {
    path: PathBuf,
    name: String,
    stem: String,
    extension: String,
    meta: FileMetadata,
    encoding: Encoding,
}
impl File {
    /// Read metadata for the file at `path` and build a snapshot of it.
    ///
    /// Returns [`NotFound`](ErrorKind::NotFound) if nothing is there and
    /// [`InvalidPath`](ErrorKind::InvalidPath) if it isn't a regular file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let metadata = local::metadata(&path)?;
        if !metadata.is_file() {
            exn::bail!(ErrorKind::InvalidPath(path));
        }
        let (name, stem, extension) = Self::derive_names(&path);
        Ok(Self {
            path,
            name,
            stem,
            extension,
            meta: FileMetadata::from(&metadata),
            encoding: Encoding::default(),
        })
    }

    /// Use `encoding` for [`read`](Self::read) and [`write`](Self::write).
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// The same snapshot, relocated to `path`. Does not touch the disk.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.set_path(path.into());
        self
    }

    fn set_path(&mut self, path: PathBuf) {
        let (name, stem, extension) = Self::derive_names(&path);
        self.path = path;
        self.name = name;
        self.stem = stem;
        self.extension = extension;
    }

    fn derive_names(path: &Path) -> (String, String, String) {
        let lossy = |s: Option<&std::ffi::OsStr>| s.unwrap_or_default().to_string_lossy().into_owned();
        // For dotfiles like ".bashrc" the stem is ".bashrc" and there's no extension.
        (
            lossy(path.file_name()),
            lossy(path.file_stem()),
            lossy(path.extension()).to_lowercase(),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Full file name, including the extension.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name without its extension.
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Lowercase extension without the leading dot; empty if there is none.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn size(&self) -> u64 {
        self.meta.size
    }

    pub fn last_modified(&self) -> Option<OffsetDateTime> {
        self.meta.last_modified
    }

    pub fn creation_time(&self) -> Option<OffsetDateTime> {
        self.meta.creation_time
    }

    /// Read-only flag as of the snapshot. See [`is_read_only`](Self::is_read_only)
    /// for a fresh check.
    pub fn read_only(&self) -> bool {
        self.meta.is_read_only
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Re-read this snapshot's metadata from disk.
    pub fn refresh(&mut self) -> Result<()> {
        self.meta = self.get_metadata()?;
        Ok(())
    }

    /// Fresh metadata, straight from disk. Does not update the snapshot.
    pub fn get_metadata(&self) -> Result<FileMetadata> {
        Ok(FileMetadata::from(&local::metadata(&self.path)?))
    }

    pub fn is_read_only(&self) -> Result<bool> {
        Ok(self.get_metadata()?.is_read_only)
    }

    /// Read the whole file as text.
    ///
    /// Malformed byte sequences are replaced, so this only fails when the
    /// file can't be read at all. A file that vanished since the snapshot was
    /// taken is an [`Io`](ErrorKind::Io) failure like any other.
    pub fn read(&self) -> Result<String> {
        let bytes = fs::read(&self.path).map_err(ErrorKind::Io)?;
        Ok(self.encoding.decode(&bytes).into_owned())
    }

    /// Write text to the file, creating it if it doesn't exist.
    ///
    /// With `overwrite` the file ends up containing exactly `content`.
    /// Without it, `content` and a single `\n` are appended to whatever is
    /// already there. The snapshot's metadata is refreshed afterwards.
    pub fn write(&mut self, content: &str, overwrite: bool) -> Result<()> {
        let mut options = OpenOptions::new();
        options.create(true);
        if overwrite {
            options.write(true).truncate(true);
        } else {
            options.append(true);
        }
        let mut file = options.open(&self.path).map_err(|e| ErrorKind::from_io(e, &self.path))?;
        file.write_all(&self.encoding.encode(content)).map_err(ErrorKind::Io)?;
        if !overwrite {
            file.write_all(self.encoding.encode("\n").as_ref()).map_err(ErrorKind::Io)?;
        }
        drop(file);
        self.refresh()
    }

    /// Rename the file within its current directory.
    ///
    /// `new_full_name` is the complete new file name, extension included.
    /// Never overwrites: fails with [`AlreadyExists`](ErrorKind::AlreadyExists)
    /// if the name is taken, and [`NotFound`](ErrorKind::NotFound) if this
    /// file has disappeared in the meantime.
    pub fn rename(&mut self, new_full_name: &str) -> Result<()> {
        let new_full_name = validate_name(new_full_name)?;
        let parent = self.path.parent().ok_or_raise(|| ErrorKind::InvalidPath(self.path.clone()))?;
        let destination = parent.join(new_full_name);
        if destination == self.path {
            return Ok(());
        }
        local::rename(&self.path, &destination)?;
        self.set_path(destination);
        Ok(())
    }
}
impl PartialEq for File {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}
impl Eq for File {}
impl Hash for File {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}
impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
