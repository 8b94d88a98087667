//! Ordered-list discipline.
//!
//! The simplest discipline: keys are kept sorted in a deque and each
//! insert walks from the front until it finds the first later key.
//! Adequate for small event counts and a useful reference when checking
//! the other disciplines.

use std::collections::VecDeque;

use super::{Key, QueueDiscipline};
use crate::event::EventId;

/// Keys sorted by `(time, id)`, earliest at the front.
#[derive(Debug, Default)]
pub struct ListQueue {
    items: VecDeque<Key>,
}

impl ListQueue {
    /// An empty list.
    pub fn new() -> Self {
        ListQueue {
            items: VecDeque::new(),
        }
    }

    /// Iterate keys in dispatch order.
    pub fn iter(&self) -> impl Iterator<Item = &Key> {
        self.items.iter()
    }
}

impl QueueDiscipline for ListQueue {
    fn insert(&mut self, key: Key) {
        // Linear scan; the new key goes after every key that sorts before it.
        let pos = self
            .items
            .iter()
            .position(|k| key < *k)
            .unwrap_or(self.items.len());
        self.items.insert(pos, key);
    }

    fn pop_min(&mut self) -> Option<Key> {
        self.items.pop_front()
    }

    fn peek_min(&self) -> Option<Key> {
        self.items.front().copied()
    }

    fn remove(&mut self, key: &Key) -> bool {
        match self.items.iter().position(|k| k.id == key.id) {
            Some(pos) => {
                self.items.remove(pos);
                true
            }
            None => false,
        }
    }

    fn find(&self, id: EventId) -> Option<Key> {
        self.items.iter().find(|k| k.id == id).copied()
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn clear(&mut self) -> Vec<Key> {
        self.items.drain(..).collect()
    }
}
