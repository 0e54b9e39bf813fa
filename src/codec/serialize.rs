//! Tree serialization and code extraction
//!
//! Wire format is a preorder walk: a leaf is `[0x01, symbol]`, an internal
//! node is `[0x00]` followed by its left then right subtree. The stream is
//! self-delimiting, so no node count is stored.
//!
//! Codes follow root-to-leaf paths (left `0`, right `1`). A tree whose root
//! is a leaf gives its only symbol the code `0` on both sides, so
//! single-symbol input still emits one bit per symbol and decodes normally.

use std::collections::HashMap;

use crate::error::FormatError;

use super::bits::BitString;
use super::hufftree::{HuffmanTree, Node, NodeId};

const INTERNAL_MARKER: u8 = 0;
const LEAF_MARKER: u8 = 1;

/// A tree over a byte alphabet has at most this many leaves.
const MAX_LEAVES: usize = 256;

/// Longest possible code: a chain over every symbol.
const MAX_DEPTH: usize = MAX_LEAVES - 1;

/// Symbol to code, used when compressing.
#[derive(Debug, Clone)]
pub struct CodeTable {
    /// Indexed by symbol; absent symbols hold an empty code
    codes: Vec<BitString>,
}

impl CodeTable {
    /// Code for `symbol`, empty if the symbol is not in the tree.
    pub fn code(&self, symbol: u8) -> &BitString {
        &self.codes[symbol as usize]
    }

    pub fn get(&self, symbol: u8) -> Option<&BitString> {
        Some(self.code(symbol)).filter(|c| !c.is_empty())
    }

    /// `(symbol, code)` pairs in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &BitString)> + '_ {
        (0..=u8::MAX).filter_map(|symbol| self.get(symbol).map(|code| (symbol, code)))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Code to symbol, used when decompressing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeDictionary {
    symbols: HashMap<BitString, u8>,
}

impl DecodeDictionary {
    pub fn get(&self, code: &BitString) -> Option<u8> {
        self.symbols.get(code).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BitString, u8)> + '_ {
        self.symbols.iter().map(|(code, &symbol)| (code, symbol))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Serialize `tree` onto the end of `out`.
pub fn serialize_into(tree: &HuffmanTree, out: &mut Vec<u8>) {
    let mut stack: Vec<NodeId> = vec![tree.root()];
    while let Some(id) = stack.pop() {
        match *tree.node(id) {
            Node::Leaf { symbol, .. } => out.extend_from_slice(&[LEAF_MARKER, symbol]),
            Node::Internal { left, right, .. } => {
                out.push(INTERNAL_MARKER);
                stack.push(right);
                stack.push(left);
            }
        }
    }
}

pub fn serialize(tree: &HuffmanTree) -> Vec<u8> {
    // Full tree: 2 bytes per leaf, 1 per internal node
    let mut out = Vec::with_capacity(tree.len() + tree.leaf_count());
    serialize_into(tree, &mut out);
    out
}

/// Rebuild the decode dictionary from a serialized tree prefix.
///
/// The second value is how many bytes were consumed. It is returned on
/// failure too, pointing just past the last byte read.
pub fn deserialize(data: &[u8]) -> (Result<DecodeDictionary, FormatError>, usize) {
    let mut dictionary = DecodeDictionary::default();
    let mut index = 0;
    let mut leaves = 0;
    // Paths still to be read, in preorder. Bounded by MAX_DEPTH + 1 entries.
    let mut pending = vec![BitString::new()];

    while let Some(path) = pending.pop() {
        let Some(&marker) = data.get(index) else {
            return (Err(FormatError::TruncatedMarker { index }), index);
        };
        index += 1;

        if marker == LEAF_MARKER {
            let Some(&symbol) = data.get(index) else {
                return (Err(FormatError::TruncatedSymbol { index }), index);
            };
            index += 1;
            leaves += 1;
            if leaves > MAX_LEAVES {
                return (Err(FormatError::TooManyLeaves { index }), index);
            }
            let code = if path.is_empty() {
                BitString::from("0")
            } else {
                path
            };
            dictionary.symbols.insert(code, symbol);
        } else {
            if path.len() >= MAX_DEPTH {
                return (Err(FormatError::TooDeep { index }), index);
            }
            pending.push(path.with(true));
            pending.push(path.with(false));
        }
    }

    (Ok(dictionary), index)
}

/// Derive every symbol's code straight from the tree.
pub fn build_code_table(tree: &HuffmanTree) -> CodeTable {
    let mut codes = vec![BitString::new(); 256];
    let mut stack = vec![(tree.root(), BitString::new())];

    while let Some((id, path)) = stack.pop() {
        match *tree.node(id) {
            Node::Leaf { symbol, .. } => {
                codes[symbol as usize] = if path.is_empty() {
                    BitString::from("0")
                } else {
                    path
                };
            }
            Node::Internal { left, right, .. } => {
                stack.push((right, path.with(true)));
                stack.push((left, path.with(false)));
            }
        }
    }

    CodeTable { codes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::hufftree::FrequencyTable;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn random_frequencies(rng: &mut ChaCha8Rng) -> FrequencyTable {
        let distinct = rng.gen_range(2..=256usize);
        let mut symbols: Vec<u8> = (0..=u8::MAX).collect();
        for i in 0..distinct {
            let j = rng.gen_range(i..symbols.len());
            symbols.swap(i, j);
        }
        FrequencyTable::from_pairs(
            symbols[..distinct]
                .iter()
                .map(|&s| (s, rng.gen_range(1..10_000u64))),
        )
    }

    #[test]
    fn test_serialize_layout() {
        let tree = HuffmanTree::from_bytes(b"AAAABBBCCD").unwrap();
        assert_eq!(
            serialize(&tree),
            vec![0, 1, b'A', 0, 1, b'B', 0, 1, b'D', 1, b'C']
        );
    }

    #[test]
    fn test_code_table_for_known_input() {
        let tree = HuffmanTree::from_bytes(b"AAAABBBCCD").unwrap();
        let table = build_code_table(&tree);
        assert_eq!(table.len(), 4);
        assert_eq!(table.code(b'A').to_string(), "0");
        assert_eq!(table.code(b'B').to_string(), "10");
        assert_eq!(table.code(b'D').to_string(), "110");
        assert_eq!(table.code(b'C').to_string(), "111");
        assert!(table.get(b'Z').is_none());
    }

    #[test]
    fn test_deserialize_reports_consumed_bytes() {
        let mut data = serialize(&HuffmanTree::from_bytes(b"AAAABBBCCD").unwrap());
        let tree_len = data.len();
        data.extend_from_slice(&[0xDE, 0xAD]);

        let (dictionary, consumed) = deserialize(&data);
        assert_eq!(consumed, tree_len);
        let dictionary = dictionary.unwrap();
        assert_eq!(dictionary.len(), 4);
        assert_eq!(dictionary.get(&BitString::from("110")), Some(b'D'));
    }

    #[test]
    fn test_serialization_round_trip_matches_code_table() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..50 {
            let tree = HuffmanTree::build(&random_frequencies(&mut rng)).unwrap();
            let table = build_code_table(&tree);
            let bytes = serialize(&tree);

            let (dictionary, consumed) = deserialize(&bytes);
            let dictionary = dictionary.unwrap();
            assert_eq!(consumed, bytes.len());
            assert_eq!(dictionary.len(), table.len());
            for (symbol, code) in table.iter() {
                assert_eq!(dictionary.get(code), Some(symbol), "code {}", code);
            }
        }
    }

    #[test]
    fn test_codes_are_prefix_free() {
        let mut rng = ChaCha8Rng::seed_from_u64(1234);
        for _ in 0..20 {
            let tree = HuffmanTree::build(&random_frequencies(&mut rng)).unwrap();
            let table = build_code_table(&tree);
            let codes: Vec<&BitString> = table.iter().map(|(_, c)| c).collect();
            for (i, a) in codes.iter().enumerate() {
                assert!(!a.is_empty());
                for (j, b) in codes.iter().enumerate() {
                    if i != j {
                        assert!(!a.is_prefix_of(b), "{} is a prefix of {}", a, b);
                    }
                }
            }
        }
    }

    #[test]
    fn test_single_leaf_gets_one_bit_code() {
        let tree = HuffmanTree::from_bytes(b"AAAA").unwrap();
        let table = build_code_table(&tree);
        assert_eq!(table.code(b'A').to_string(), "0");

        let bytes = serialize(&tree);
        assert_eq!(bytes, vec![1, b'A']);
        let (dictionary, consumed) = deserialize(&bytes);
        assert_eq!(consumed, 2);
        assert_eq!(dictionary.unwrap().get(&BitString::from("0")), Some(b'A'));
    }

    #[test]
    fn test_truncated_marker_is_error() {
        // Internal node whose right subtree is missing
        let (result, consumed) = deserialize(&[0, 1, b'A']);
        assert_eq!(result, Err(FormatError::TruncatedMarker { index: 3 }));
        assert_eq!(consumed, 3);

        let (result, consumed) = deserialize(&[]);
        assert_eq!(result, Err(FormatError::TruncatedMarker { index: 0 }));
        assert_eq!(consumed, 0);
    }

    #[test]
    fn test_truncated_symbol_is_error() {
        let (result, consumed) = deserialize(&[0, 1, b'A', 1]);
        assert_eq!(result, Err(FormatError::TruncatedSymbol { index: 4 }));
        assert_eq!(consumed, 4);
    }

    #[test]
    fn test_zero_filled_input_fails_fast() {
        // Endless chain of internal markers, as in a zero-filled file
        let data = vec![0u8; 1 << 20];
        let (result, consumed) = deserialize(&data);
        assert_eq!(result, Err(FormatError::TooDeep { index: MAX_DEPTH + 1 }));
        assert_eq!(consumed, MAX_DEPTH + 1);
    }

    #[test]
    fn test_deepest_valid_chain_is_accepted() {
        // Right-leaning chain: 255 internal nodes, 256 leaves
        let mut data = Vec::new();
        for symbol in 0..MAX_DEPTH as u8 {
            data.extend_from_slice(&[0, 1, symbol]);
        }
        data.extend_from_slice(&[1, 255]);

        let (dictionary, consumed) = deserialize(&data);
        let dictionary = dictionary.unwrap();
        assert_eq!(consumed, data.len());
        assert_eq!(dictionary.len(), 256);
        let deepest: BitString = "1".repeat(MAX_DEPTH).as_str().into();
        assert_eq!(dictionary.get(&deepest), Some(255));
    }

    #[test]
    fn test_too_many_leaves_rejected() {
        // Balanced tree of depth 9 has 512 leaves
        let mut data = Vec::new();
        fn subtree(depth: usize, out: &mut Vec<u8>) {
            if depth == 0 {
                out.extend_from_slice(&[1, b'x']);
            } else {
                out.push(0);
                subtree(depth - 1, out);
                subtree(depth - 1, out);
            }
        }
        subtree(9, &mut data);

        let (result, _) = deserialize(&data);
        assert!(matches!(result, Err(FormatError::TooManyLeaves { .. })));
    }
}
