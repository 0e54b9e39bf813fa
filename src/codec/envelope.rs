//! Metadata envelope carrying the original file name
//!
//! Layout: `"KRYP" | u16 BE name length | name | payload`. Reading is
//! permissive: anything that does not look like a well-formed envelope is
//! handed back untouched as a bare payload.

use crate::error::{Error, Result};

use super::huffman::compress;

pub const MAGIC: &[u8; 4] = b"KRYP";

/// Magic plus the name length field.
const HEADER_LEN: usize = MAGIC.len() + 2;

/// Compress `data` and wrap it with `original_name`.
pub fn pack_with_metadata(data: &[u8], original_name: &str) -> Result<Vec<u8>> {
    let name = original_name.as_bytes();
    let name_len = u16::try_from(name.len()).map_err(|_| Error::NameTooLong { len: name.len() })?;
    let payload = compress(data)?;

    let mut out = Vec::with_capacity(HEADER_LEN + name.len() + payload.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&name_len.to_be_bytes());
    out.extend_from_slice(name);
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Split an envelope into `(name, payload)`.
///
/// Without the magic, or when the declared name runs past the buffer, the
/// name is empty and the whole input is the payload.
pub fn unpack_metadata(packed: &[u8]) -> (String, &[u8]) {
    let Some((header, rest)) = packed.split_first_chunk::<HEADER_LEN>() else {
        return (String::new(), packed);
    };
    if &header[..MAGIC.len()] != MAGIC {
        return (String::new(), packed);
    }

    let name_len = u16::from_be_bytes([header[4], header[5]]) as usize;
    if rest.len() < name_len {
        return (String::new(), packed);
    }
    let (name, payload) = rest.split_at(name_len);
    (String::from_utf8_lossy(name).into_owned(), payload)
}
