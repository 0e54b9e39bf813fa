//! Compress and decompress a whole buffer
//!
//! Payload layout: `[tree][u32 BE symbol count][codes, MSB-first, zero padded]`.
//! The count is written through the bit writer as its first 32 bits, which
//! keeps it byte-aligned right after the tree.

use log::trace;

use crate::error::{Error, FormatError, Result};

use super::bits::{BitReader, BitString, BitWriter};
use super::hufftree::HuffmanTree;
use super::serialize::{DecodeDictionary, build_code_table, deserialize, serialize};

/// Length of the symbol count that follows the tree.
const COUNT_LEN: usize = 4;

/// Compress `data` into a self-describing payload.
///
/// Empty input produces an empty payload without building a tree.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    let count = u32::try_from(data.len()).map_err(|_| Error::InputTooLarge { len: data.len() })?;

    let tree = HuffmanTree::from_bytes(data)?;
    let table = build_code_table(&tree);
    let mut out = serialize(&tree);
    let tree_len = out.len();

    let mut writer = BitWriter::with_capacity(COUNT_LEN + data.len() / 2);
    writer.write_u32(count);
    for &byte in data {
        writer.write_bits(table.code(byte));
    }
    out.extend(writer.finish());

    trace!(
        "compressed {} bytes: tree {} bytes, {} distinct symbols, payload {} bytes",
        data.len(),
        tree_len,
        table.len(),
        out.len()
    );
    Ok(out)
}

/// Decompress a payload produced by [`compress`].
pub fn decompress(payload: &[u8]) -> Result<Vec<u8>> {
    if payload.is_empty() {
        return Ok(Vec::new());
    }

    let (dictionary, consumed) = deserialize(payload);
    let dictionary = dictionary?;
    if consumed >= payload.len() {
        return Err(FormatError::MissingPayload {
            consumed,
            len: payload.len(),
        }
        .into());
    }

    let rest = &payload[consumed..];
    let (count, bits) = rest
        .split_first_chunk::<COUNT_LEN>()
        .ok_or(FormatError::MissingLength {
            available: rest.len(),
        })?;
    let expected = u32::from_be_bytes(*count) as usize;

    Ok(decode_symbols(BitReader::new(bits), &dictionary, expected)?)
}

/// Match the running bit string against the dictionary after every bit,
/// stopping as soon as `expected` symbols are out.
fn decode_symbols(
    bits: BitReader<'_>,
    dictionary: &DecodeDictionary,
    expected: usize,
) -> std::result::Result<Vec<u8>, FormatError> {
    // Never trust the header for the allocation size
    let mut out = Vec::with_capacity(expected.min(bits.bits_remaining()));
    if expected == 0 {
        return Ok(out);
    }

    let mut current = BitString::new();
    for bit in bits {
        current.push(bit);
        if let Some(symbol) = dictionary.get(&current) {
            out.push(symbol);
            current.clear();
            if out.len() == expected {
                return Ok(out);
            }
        }
    }

    Err(FormatError::Truncated {
        decoded: out.len(),
        expected,
    })
}
