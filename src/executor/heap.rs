//! Ordering heap shared by the row and column order plans.
//!
//! Entries pop smallest-first according to the comparator. Ties pop in
//! insertion order, which makes draining the heap a stable sort.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

pub(crate) type Comparator<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

struct Entry<T> {
    item: T,
    seq: usize,
    compare: Comparator<T>,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap
        (self.compare)(&self.item, &other.item)
            .then(self.seq.cmp(&other.seq))
            .reverse()
    }
}

pub(crate) struct SortHeap<T> {
    heap: BinaryHeap<Entry<T>>,
    compare: Comparator<T>,
    seq: usize,
}

impl<T> SortHeap<T> {
    pub fn new(compare: Comparator<T>) -> Self {
        Self {
            heap: BinaryHeap::new(),
            compare,
            seq: 0,
        }
    }

    pub fn push(&mut self, item: T) {
        self.heap.push(Entry {
            item,
            seq: self.seq,
            compare: Arc::clone(&self.compare),
        });
        self.seq += 1;
    }

    pub fn pop(&mut self) -> Option<T> {
        self.heap.pop().map(|entry| entry.item)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}
