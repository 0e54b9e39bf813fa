//! Per-file operations: compress, decompress, encrypt, decrypt
//!
//! Each operation reads its input whole, transforms it in memory and writes
//! the result to a path derived from the input and the optional `-o` target.
//! Parent directories of the output are created as needed.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;

use crate::cipher::{self, DEFAULT_KEY, DEFAULT_ROUNDS};
use crate::codec;
use crate::error::{Error, Result};

/// Suffixes removed from a compressed file name when it carries no
/// embedded name.
const KNOWN_SUFFIXES: [&str; 3] = [".bin", ".kry", ".huff"];

/// Appended when no better decompressed name can be found.
const FALLBACK_SUFFIX: &str = ".dec";

/// A single transformation, in the order they run when combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Compress,
    Decompress,
    Encrypt,
    Decrypt,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Compress => "compress",
            Operation::Decompress => "decompress",
            Operation::Encrypt => "encrypt",
            Operation::Decrypt => "decrypt",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one operation did to one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub operation: Operation,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

impl FileReport {
    fn new(
        operation: Operation,
        input: &Path,
        output: PathBuf,
        bytes_in: usize,
        bytes_out: usize,
    ) -> Self {
        info!("{} {} -> {}", operation, input.display(), output.display());
        Self {
            input: input.to_path_buf(),
            output,
            operation,
            bytes_in: bytes_in as u64,
            bytes_out: bytes_out as u64,
        }
    }
}

/// The operations requested for a run, plus their shared settings.
#[derive(Debug, Clone)]
pub struct Job {
    operations: Vec<Operation>,
    output: Option<PathBuf>,
    key: Vec<u8>,
    rounds: u32,
}

impl Job {
    /// Operations are deduplicated and always run compress, decompress,
    /// encrypt, decrypt regardless of the order given.
    pub fn new(operations: impl IntoIterator<Item = Operation>) -> Result<Self> {
        let mut operations: Vec<Operation> = operations.into_iter().collect();
        operations.sort();
        operations.dedup();
        if operations.is_empty() {
            return Err(Error::InvalidConfig(
                "no operation requested (use -c, -d, -e or -u)".to_string(),
            ));
        }
        Ok(Self {
            operations,
            output: None,
            key: DEFAULT_KEY.as_bytes().to_vec(),
            rounds: DEFAULT_ROUNDS,
        })
    }

    /// Write results to `output`: an existing directory, a directory to
    /// create (trailing separator) or a file.
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<Vec<u8>>) -> Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(Error::EmptyKey);
        }
        self.key = key;
        Ok(self)
    }

    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Apply every requested operation to `input`, stopping at the first
    /// failure.
    pub fn run(&self, input: &Path) -> Result<Vec<FileReport>> {
        self.operations
            .iter()
            .map(|&operation| self.apply(operation, input))
            .collect()
    }

    pub fn apply(&self, operation: Operation, input: &Path) -> Result<FileReport> {
        let output = self.output.as_deref();
        match operation {
            Operation::Compress => compress_file(input, output),
            Operation::Decompress => decompress_file(input, output),
            Operation::Encrypt => encrypt_file(input, output, &self.key, self.rounds),
            Operation::Decrypt => decrypt_file(input, output, &self.key, self.rounds),
        }
    }
}

/// Huffman-compress `input` into a `KRYP` envelope carrying its file name.
pub fn compress_file(input: &Path, output: Option<&Path>) -> Result<FileReport> {
    let data = read(input)?;
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let packed = codec::pack_with_metadata(&data, &name)?;

    let target = compressed_path(input, output)?;
    write(&target, &packed)?;
    Ok(FileReport::new(Operation::Compress, input, target, data.len(), packed.len()))
}

/// Restore a file written by [`compress_file`]. Bare payloads without an
/// envelope are accepted too.
pub fn decompress_file(input: &Path, output: Option<&Path>) -> Result<FileReport> {
    let data = read(input)?;
    let (name, payload) = codec::unpack_metadata(&data);
    let restored = codec::decompress(payload)?;

    let target = decompressed_path(input, output, embedded_name(&name))?;
    write(&target, &restored)?;
    Ok(FileReport::new(Operation::Decompress, input, target, data.len(), restored.len()))
}

pub fn encrypt_file(
    input: &Path,
    output: Option<&Path>,
    key: &[u8],
    rounds: u32,
) -> Result<FileReport> {
    let data = read(input)?;
    let encrypted = cipher::encrypt(&data, key, rounds)?;

    let target = cipher_path(input, output, "kry")?;
    write(&target, &encrypted)?;
    Ok(FileReport::new(Operation::Encrypt, input, target, data.len(), encrypted.len()))
}

pub fn decrypt_file(
    input: &Path,
    output: Option<&Path>,
    key: &[u8],
    rounds: u32,
) -> Result<FileReport> {
    let data = read(input)?;
    let decrypted = cipher::decrypt(&data, key, rounds)?;

    let target = cipher_path(input, output, "dec")?;
    write(&target, &decrypted)?;
    Ok(FileReport::new(Operation::Decrypt, input, target, data.len(), decrypted.len()))
}

/// `<stem>.bin` next to the input or inside the output directory,
/// otherwise the output path itself.
pub fn compressed_path(input: &Path, output: Option<&Path>) -> Result<PathBuf> {
    let name = Path::new(input.file_name().unwrap_or_default()).with_extension("bin");
    match output {
        None => Ok(input.with_file_name(name)),
        Some(out) => Ok(match output_dir(out)? {
            Some(dir) => dir.join(name),
            None => out.to_path_buf(),
        }),
    }
}

/// Where a decompressed file goes: the embedded name if there is one,
/// else the input name minus a known suffix, else the input plus `.dec`.
pub fn decompressed_path(
    input: &Path,
    output: Option<&Path>,
    embedded: Option<&OsStr>,
) -> Result<PathBuf> {
    let input_name = input.file_name().unwrap_or_default();
    match output {
        Some(out) => Ok(match output_dir(out)? {
            Some(dir) => match embedded {
                Some(name) => dir.join(name),
                None => dir.join(
                    strip_known_suffix(input_name).unwrap_or_else(|| input_name.to_owned()),
                ),
            },
            None => out.to_path_buf(),
        }),
        None => Ok(match embedded {
            Some(name) => input.with_file_name(name),
            None => match strip_known_suffix(input_name) {
                Some(stripped) => input.with_file_name(stripped),
                None => {
                    let mut path = input.as_os_str().to_owned();
                    path.push(FALLBACK_SUFFIX);
                    PathBuf::from(path)
                }
            },
        }),
    }
}

/// `<name up to its first '.'>.<extension>` next to the input or inside the
/// output directory.
pub fn cipher_path(input: &Path, output: Option<&Path>, extension: &str) -> Result<PathBuf> {
    let mut name = leading_stem(input);
    name.push(".");
    name.push(extension);

    match output {
        None => Ok(input.with_file_name(name)),
        Some(out) => Ok(match output_dir(out)? {
            Some(dir) => dir.join(name),
            None => out.to_path_buf(),
        }),
    }
}

/// `out` as a directory target: one that exists, or one spelled with a
/// trailing separator, which is created. `None` means `out` names a file.
fn output_dir(out: &Path) -> Result<Option<&Path>> {
    if out.is_dir() {
        return Ok(Some(out));
    }
    if ends_with_separator(out) {
        fs::create_dir_all(out).map_err(|e| Error::io(out, e))?;
        return Ok(Some(out));
    }
    Ok(None)
}

/// Only the last component of an embedded name is trusted, so a crafted
/// header cannot point outside the output directory.
fn embedded_name(name: &str) -> Option<&OsStr> {
    Path::new(name).file_name()
}

fn strip_known_suffix(name: &OsStr) -> Option<OsString> {
    let name = name.to_str()?;
    KNOWN_SUFFIXES
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .filter(|stripped| !stripped.is_empty())
        .map(OsString::from)
}

/// File name up to its first '.'; dotfiles keep their whole name.
fn leading_stem(input: &Path) -> OsString {
    let name = input.file_name().unwrap_or_default();
    let lossy = name.to_string_lossy();
    match lossy.find('.') {
        Some(0) | None => name.to_owned(),
        Some(i) => OsString::from(&lossy[..i]),
    }
}

fn ends_with_separator(path: &Path) -> bool {
    path.as_os_str()
        .to_string_lossy()
        .ends_with(std::path::is_separator)
}

fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| Error::io(path, e))
}

fn write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::write(path, data).map_err(|e| Error::io(path, e))
}
