//! Filesystem layer for dirman.
//!
//! Holds the entity types the manager caches ([`File`], [`Directory`]), the
//! root-relative path rules every sub-path goes through, and the only code
//! in the workspace that talks to [`std::fs`].

mod directory;
pub mod encoding;
pub mod error;
mod file;
pub mod local;
mod models;
pub mod path;
mod walk;

pub use crate::directory::Directory;
pub use crate::encoding::Encoding;
pub use crate::file::File;
pub use crate::models::FileMetadata;
pub use crate::path::validate as validate_path;
pub use crate::walk::{WalkEntry, WalkFilter, walk};
