//! Huffman codec
//!
//! Building blocks, leaves first:
//!
//! - `PriorityQueue`: weight-ordered min-heap used to merge nodes
//! - `HuffmanTree`: arena-backed prefix-code tree built from byte counts
//! - `serialize`/`deserialize`: compact preorder tree format and code lookup
//! - `BitWriter`/`BitReader`: MSB-first bit packing
//! - `compress`/`decompress` and the `KRYP` metadata envelope on top

mod bits;
mod envelope;
mod huffman;
mod hufftree;
mod queue;
mod serialize;

pub use bits::{BitReader, BitString, BitWriter};
pub use envelope::{MAGIC, pack_with_metadata, unpack_metadata};
pub use huffman::{compress, decompress};
pub use hufftree::{FrequencyTable, HuffmanTree, Node, NodeId};
pub use queue::PriorityQueue;
pub use serialize::{
    CodeTable, DecodeDictionary, build_code_table, deserialize, serialize, serialize_into,
};
