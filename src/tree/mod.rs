//! Concurrent directory tree processing
//!
//! `TreeWalker` enumerates a tree through a [`DirectorySource`] and hands
//! every regular file to a caller-supplied action on a bounded worker pool.
//! Symlinks and special files are skipped; so are `.`/`..` and any entry
//! whose name matches an ignore pattern.

mod config;
mod filter;
mod source;
mod walker;

// Re-export public types
pub use config::{DEFAULT_MAX_PARALLEL_FILES, WalkerConfig};
pub use filter::EntryFilter;
pub use source::{DirEntry, DirectorySource, FsEntries, FsSource};
pub use walker::{FileFailure, TreeWalker, WalkSummary};
