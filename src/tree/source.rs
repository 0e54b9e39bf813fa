//! Directory enumeration
//!
//! The walker never reads directories itself; it asks a [`DirectorySource`]
//! for the entries of one directory at a time. The returned iterator is the
//! open directory handle: dropping it releases the handle.

use std::ffi::{OsStr, OsString};
use std::fs::ReadDir;
use std::io;
use std::path::Path;

/// One entry of a directory, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirEntry {
    /// Regular file
    File(OsString),
    /// Subdirectory
    Dir(OsString),
}

impl DirEntry {
    pub fn name(&self) -> &OsStr {
        match self {
            DirEntry::File(name) | DirEntry::Dir(name) => name,
        }
    }
}

/// Something that can list the entries of a directory.
pub trait DirectorySource: Sync {
    type Entries: Iterator<Item = io::Result<DirEntry>>;

    fn open(&self, dir: &Path) -> io::Result<Self::Entries>;
}

/// Real file system. Symlinks and special files are neither files nor
/// directories here, so they are never yielded.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl DirectorySource for FsSource {
    type Entries = FsEntries;

    fn open(&self, dir: &Path) -> io::Result<FsEntries> {
        std::fs::read_dir(dir).map(FsEntries)
    }
}

/// Open directory handle over the real file system.
#[derive(Debug)]
pub struct FsEntries(ReadDir);

impl Iterator for FsEntries {
    type Item = io::Result<DirEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.0.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e)),
            };
            let file_type = match entry.file_type() {
                Ok(t) => t,
                Err(e) => return Some(Err(e)),
            };
            if file_type.is_file() {
                return Some(Ok(DirEntry::File(entry.file_name())));
            }
            if file_type.is_dir() {
                return Some(Ok(DirEntry::Dir(entry.file_name())));
            }
        }
    }
}
