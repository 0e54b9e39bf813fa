//! Binary min-heap keyed by weight
//!
//! Equal weights come out in insertion order. The tie-break only decides
//! the shape of the resulting Huffman tree, never whether it round-trips.

/// Stored entry: the ordering key is `(weight, seq)`.
#[derive(Debug, Clone)]
struct Entry<T> {
    weight: u64,
    seq: u64,
    item: T,
}

impl<T> Entry<T> {
    fn precedes(&self, other: &Self) -> bool {
        (self.weight, self.seq) < (other.weight, other.seq)
    }
}

/// Min-ordered queue of weighted items.
#[derive(Debug, Clone)]
pub struct PriorityQueue<T> {
    entries: Vec<Entry<T>>,
    next_seq: u64,
}

impl<T> PriorityQueue<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add an item, restoring heap order by sifting it up.
    pub fn insert(&mut self, item: T, weight: u64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry { weight, seq, item });
        self.sift_up(self.entries.len() - 1);
    }

    /// Remove and return the lightest item with its weight.
    ///
    /// Returns `None` when the queue is empty.
    pub fn pop_min(&mut self) -> Option<(T, u64)> {
        if self.entries.is_empty() {
            return None;
        }
        // swap_remove moves the last entry into the root slot
        let min = self.entries.swap_remove(0);
        self.sift_down(0);
        Some((min.item, min.weight))
    }

    /// Weight of the item `pop_min` would return next.
    pub fn peek_weight(&self) -> Option<u64> {
        self.entries.first().map(|e| e.weight)
    }

    /// Check the heap-order invariant over every stored entry.
    pub fn is_heap(&self) -> bool {
        (1..self.entries.len()).all(|i| self.entries[parent(i)].weight <= self.entries[i].weight)
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let p = parent(i);
            if !self.entries[i].precedes(&self.entries[p]) {
                break;
            }
            self.entries.swap(i, p);
            i = p;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let n = self.entries.len();
        loop {
            let l = 2 * i + 1;
            let r = l + 1;
            let mut smallest = i;
            if l < n && self.entries[l].precedes(&self.entries[smallest]) {
                smallest = l;
            }
            if r < n && self.entries[r].precedes(&self.entries[smallest]) {
                smallest = r;
            }
            if smallest == i {
                break;
            }
            self.entries.swap(i, smallest);
            i = smallest;
        }
    }
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn parent(i: usize) -> usize {
    (i - 1) / 2
}
