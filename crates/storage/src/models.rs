//! Storage models.

use std::fs::Metadata;
use time::OffsetDateTime;

/// File metadata as reported by the filesystem at a single point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// Last modified timestamp
    pub last_modified: Option<OffsetDateTime>,
    /// Creation (birth) timestamp; not every platform/filesystem records one
    pub creation_time: Option<OffsetDateTime>,
    /// Whether the permissions mark the file read-only
    pub is_read_only: bool,
    /// File size in bytes
    pub size: u64,
}
impl From<&Metadata> for FileMetadata {
    fn from(metadata: &Metadata) -> Self {
        Self {
            last_modified: metadata.modified().ok().map(OffsetDateTime::from),
            creation_time: metadata.created().ok().map(OffsetDateTime::from),
            is_read_only: metadata.permissions().readonly(),
            size: metadata.len(),
        }
    }
}
