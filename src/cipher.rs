//! Multi-round XOR cipher
//!
//! Each round derives its key by adding the round index (mod 256) to every
//! byte of the base key, then XORs the data against that key repeated
//! byte-wise. Not cryptographically meaningful.

use crate::error::{Error, Result};

/// Key used when none is given on the command line.
pub const DEFAULT_KEY: &str = "KEY";

/// Rounds used when none are given on the command line.
pub const DEFAULT_ROUNDS: u32 = 5;

/// Key for round `round`: every base key byte plus the round index.
pub fn round_key(key: &[u8], round: u32) -> Vec<u8> {
    // Truncation is the mod 256
    let offset = round as u8;
    key.iter().map(|b| b.wrapping_add(offset)).collect()
}

pub fn encrypt(data: &[u8], key: &[u8], rounds: u32) -> Result<Vec<u8>> {
    if key.is_empty() {
        return Err(Error::EmptyKey);
    }
    let mut out = data.to_vec();
    for round in 0..rounds {
        xor_in_place(&mut out, &round_key(key, round));
    }
    Ok(out)
}

/// Undo [`encrypt`], applying the rounds last to first.
pub fn decrypt(data: &[u8], key: &[u8], rounds: u32) -> Result<Vec<u8>> {
    if key.is_empty() {
        return Err(Error::EmptyKey);
    }
    let mut out = data.to_vec();
    for round in (0..rounds).rev() {
        xor_in_place(&mut out, &round_key(key, round));
    }
    Ok(out)
}

fn xor_in_place(data: &mut [u8], key: &[u8]) {
    for (byte, k) in data.iter_mut().zip(key.iter().cycle()) {
        *byte ^= k;
    }
}
