//! An in-memory index over a directory tree.
//!
//! [`DirectoryManager`] walks a root once, caches every directory and regular
//! file below it, and then answers queries from that cache. Its own
//! mutations (create, rename, move, delete) change the disk and patch the
//! cache in the same call, so the cache never needs a full re-walk to stay
//! correct. Changes made by anyone else need an explicit
//! [`gather`](DirectoryManager::gather).
//!
//! ```no_run
//! use dirman_manager::{DirectoryManager, Filter};
//!
//! let mut manager = DirectoryManager::new("/srv/notes")?;
//! manager.create_file(Some("inbox"), "todo", Some("md"), "- [ ] write docs")?;
//! for file in manager.find_files(&Filter::new().extension("md"))? {
//!     println!("{}", file.path().display());
//! }
//! manager.print_tree(None)?;
//! # Ok::<(), dirman_manager::error::Error>(())
//! ```

mod cache;
pub mod error;
mod filter;
mod manager;
mod mutate;
mod present;
mod query;

pub use crate::filter::Filter;
pub use crate::manager::{DirectoryManager, Options};
pub use dirman_storage::{Directory, Encoding, File, FileMetadata, WalkFilter};
