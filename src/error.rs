//! Error types for kryptr
//!
//! Codec failures are split out into [`FormatError`] so that a corrupt input
//! can be told apart from an I/O problem. Neither aborts a directory walk:
//! the walker records the failure against the file and moves on.

use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed packed data (tree, length prefix or bitstream)
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// Tried to build a Huffman tree from zero symbols
    #[error("cannot build a huffman tree from an empty frequency table")]
    EmptyQueue,

    /// The symbol count must fit the 32-bit length prefix
    #[error("input of {len} bytes exceeds the 32-bit symbol count limit")]
    InputTooLarge { len: usize },

    /// The envelope stores the name length in 16 bits
    #[error("file name of {len} bytes does not fit the envelope header")]
    NameTooLong { len: usize },

    /// XOR with an empty key is undefined
    #[error("cipher key must not be empty")]
    EmptyKey,

    /// Invalid runtime configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The file worker pool could not be started
    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    /// File system failure, tagged with the path involved
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Decompression format errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// Stream ended where a node marker was expected
    #[error("unexpected end of data while reading tree marker at index {index}")]
    TruncatedMarker { index: usize },

    /// Stream ended between a leaf marker and its symbol
    #[error("unexpected end of data while reading leaf symbol at index {index}")]
    TruncatedSymbol { index: usize },

    /// Tree nests deeper than any 256-symbol tree can
    #[error("tree deeper than 255 levels at index {index}")]
    TooDeep { index: usize },

    /// Tree holds more leaves than there are byte values
    #[error("tree has more than 256 leaves at index {index}")]
    TooManyLeaves { index: usize },

    /// Nothing follows the serialized tree
    #[error("no data left after the tree ({consumed} of {len} bytes consumed)")]
    MissingPayload { consumed: usize, len: usize },

    /// Fewer than four bytes where the symbol count should be
    #[error("need 4 bytes for the symbol count, got {available}")]
    MissingLength { available: usize },

    /// Bits ran out before the declared number of symbols was decoded
    #[error("bitstream exhausted after {decoded} of {expected} symbols")]
    Truncated { decoded: usize, expected: usize },
}
