//! Huffman tree construction
//!
//! Nodes live in an arena owned by the tree and refer to their children by
//! index, so every traversal can be iterative.

use crate::error::{Error, Result};

use super::queue::PriorityQueue;

/// Index of a node inside its tree's arena.
pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Leaf {
        symbol: u8,
        weight: u64,
    },
    Internal {
        weight: u64,
        left: NodeId,
        right: NodeId,
    },
}

impl Node {
    pub fn weight(&self) -> u64 {
        match self {
            Node::Leaf { weight, .. } | Node::Internal { weight, .. } => *weight,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}

/// Byte occurrence counts for one input.
#[derive(Debug, Clone)]
pub struct FrequencyTable {
    counts: [u64; 256],
}

impl FrequencyTable {
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut counts = [0u64; 256];
        for &byte in data {
            counts[byte as usize] += 1;
        }
        Self { counts }
    }

    /// Build from explicit `(symbol, count)` pairs; zero counts are ignored
    /// and repeated symbols accumulate.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (u8, u64)>) -> Self {
        let mut counts = [0u64; 256];
        for (symbol, count) in pairs {
            counts[symbol as usize] += count;
        }
        Self { counts }
    }

    /// Symbols that occur at least once, in byte order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        (0..=u8::MAX)
            .map(|symbol| (symbol, self.counts[symbol as usize]))
            .filter(|&(_, count)| count > 0)
    }

    pub fn count(&self, symbol: u8) -> u64 {
        self.counts[symbol as usize]
    }

    pub fn distinct(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// A binary prefix-code tree.
#[derive(Debug, Clone)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl HuffmanTree {
    /// Build the tree by repeatedly merging the two lightest nodes.
    ///
    /// The first node popped becomes the left child. With a single distinct
    /// symbol the root is that symbol's leaf.
    pub fn build(frequencies: &FrequencyTable) -> Result<Self> {
        let distinct = frequencies.distinct();
        let mut nodes = Vec::with_capacity(distinct.saturating_mul(2));
        let mut queue = PriorityQueue::with_capacity(distinct);

        for (symbol, weight) in frequencies.iter() {
            queue.insert(nodes.len(), weight);
            nodes.push(Node::Leaf { symbol, weight });
        }

        while queue.len() > 1 {
            let (left, left_weight) = queue.pop_min().ok_or(Error::EmptyQueue)?;
            let (right, right_weight) = queue.pop_min().ok_or(Error::EmptyQueue)?;
            let weight = left_weight + right_weight;
            queue.insert(nodes.len(), weight);
            nodes.push(Node::Internal {
                weight,
                left,
                right,
            });
        }

        let (root, _) = queue.pop_min().ok_or(Error::EmptyQueue)?;
        Ok(Self { nodes, root })
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::build(&FrequencyTable::from_bytes(data))
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Total weight, i.e. the number of symbols the tree was built from.
    pub fn weight(&self) -> u64 {
        self.nodes[self.root].weight()
    }

    /// Number of nodes (leaves and internal) in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }
}
