//! Bit-level I/O for Huffman codes.
//!
//! Both directions are MSB-first: the first bit written lands in the highest
//! bit of the first byte. The writer pads its final byte with zero low bits;
//! the reader knows nothing about padding, so the decoder must stop on the
//! declared symbol count.

use std::fmt;

/// A sequence of bits, compared by content and length.
///
/// `"0"` and `"00"` are different codes, which a plain integer could not
/// express.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BitString {
    bits: Vec<bool>,
}

impl BitString {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn push(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    pub fn clear(&mut self) {
        self.bits.clear();
    }

    /// Copy of `self` with one more bit appended.
    pub fn with(&self, bit: bool) -> Self {
        let mut next = Vec::with_capacity(self.bits.len() + 1);
        next.extend_from_slice(&self.bits);
        next.push(bit);
        Self { bits: next }
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }

    /// True if `self` is a (non-strict) prefix of `other`.
    pub fn is_prefix_of(&self, other: &BitString) -> bool {
        other.bits.starts_with(&self.bits)
    }
}

/// Parses `'0'` as a zero bit and any other character as a one bit.
impl From<&str> for BitString {
    fn from(s: &str) -> Self {
        Self {
            bits: s.chars().map(|c| c != '0').collect(),
        }
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in &self.bits {
            f.write_str(if *bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Packs bits MSB-first into bytes.
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    /// Bits of the current partial byte, right-aligned
    acc: u8,
    /// Number of bits in `acc` (0..=7)
    filled: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
            ..Self::default()
        }
    }

    pub fn write_bit(&mut self, bit: bool) {
        self.acc = (self.acc << 1) | u8::from(bit);
        self.filled += 1;
        if self.filled == 8 {
            self.bytes.push(self.acc);
            self.acc = 0;
            self.filled = 0;
        }
    }

    pub fn write_bits(&mut self, code: &BitString) {
        for bit in code.iter() {
            self.write_bit(bit);
        }
    }

    /// Write 32 literal bits, most significant first.
    pub fn write_u32(&mut self, value: u32) {
        for shift in (0..32).rev() {
            self.write_bit((value >> shift) & 1 == 1);
        }
    }

    /// Total bits written so far, including the partial byte.
    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 8 + self.filled as usize
    }

    /// Flush the partial byte (zero padded) and return the packed bytes.
    pub fn finish(mut self) -> Vec<u8> {
        if self.filled > 0 {
            self.bytes.push(self.acc << (8 - self.filled));
        }
        self.bytes
    }
}

/// Yields the bits of a byte slice, MSB-first within each byte.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn bits_read(&self) -> usize {
        self.pos
    }

    pub fn bits_remaining(&self) -> usize {
        self.data.len() * 8 - self.pos
    }
}

impl Iterator for BitReader<'_> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        let byte = *self.data.get(self.pos / 8)?;
        let bit = (byte >> (7 - self.pos % 8)) & 1 == 1;
        self.pos += 1;
        Some(bit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.bits_remaining();
        (remaining, Some(remaining))
    }
}
