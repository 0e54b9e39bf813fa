//! Kryptr - Huffman compression and XOR encryption for files and directory trees

pub mod cipher;
pub mod codec;
pub mod error;
pub mod ops;
pub mod stats;
pub mod tree;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use codec::{compress, decompress, pack_with_metadata, unpack_metadata};
pub use error::{Error, FormatError, Result};
pub use ops::{FileReport, Job, Operation};
pub use stats::{RunSummary, print_summary, print_summary_json};
pub use tree::{TreeWalker, WalkSummary, WalkerConfig};
