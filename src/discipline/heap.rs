//! Binary min-heap discipline.
//!
//! `std::collections::BinaryHeap` cannot delete an arbitrary element,
//! which cancellation needs, so this is a small array heap with explicit
//! sift operations. Removal locates the key with a linear scan, the same
//! cost as lookup-by-id; cancellation is much rarer than insertion.

use super::{Key, QueueDiscipline};
use crate::event::EventId;

/// Array-backed binary min-heap over `(time, id)`.
#[derive(Debug, Default)]
pub struct HeapQueue {
    heap: Vec<Key>,
}

impl HeapQueue {
    /// An empty heap.
    pub fn new() -> Self {
        HeapQueue { heap: Vec::new() }
    }

    /// An empty heap with room for `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        HeapQueue {
            heap: Vec::with_capacity(capacity),
        }
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.heap[pos] >= self.heap[parent] {
                break;
            }
            self.heap.swap(pos, parent);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * pos + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let child = if right < len && self.heap[right] < self.heap[left] {
                right
            } else {
                left
            };
            if self.heap[pos] <= self.heap[child] {
                break;
            }
            self.heap.swap(pos, child);
            pos = child;
        }
    }

    /// Remove the element at `pos`, restoring the heap property.
    fn remove_at(&mut self, pos: usize) -> Key {
        let removed = self.heap.swap_remove(pos);
        if pos < self.heap.len() {
            // The element moved into `pos` may belong above or below it.
            self.sift_down(pos);
            self.sift_up(pos);
        }
        removed
    }
}

impl QueueDiscipline for HeapQueue {
    fn insert(&mut self, key: Key) {
        self.heap.push(key);
        let last = self.heap.len() - 1;
        self.sift_up(last);
    }

    fn pop_min(&mut self) -> Option<Key> {
        if self.heap.is_empty() {
            return None;
        }
        Some(self.remove_at(0))
    }

    fn peek_min(&self) -> Option<Key> {
        self.heap.first().copied()
    }

    fn remove(&mut self, key: &Key) -> bool {
        match self.heap.iter().position(|k| k.id == key.id) {
            Some(pos) => {
                self.remove_at(pos);
                true
            }
            None => false,
        }
    }

    fn find(&self, id: EventId) -> Option<Key> {
        self.heap.iter().find(|k| k.id == id).copied()
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn clear(&mut self) -> Vec<Key> {
        std::mem::take(&mut self.heap)
    }
}
