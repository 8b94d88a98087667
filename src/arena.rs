//! Generational slot arena for pending events.
//!
//! Queue disciplines order small `Copy` keys; the heavier per-event data
//! (the shared state cell and the handler reference) lives here, addressed
//! by a [`Slot`]. Each slot carries a generation that is bumped when the
//! slot is freed, so a stale [`Slot`] held by a fired or cancelled event
//! can never reach the entry that later reuses the index.

/// Handle into an [`Arena`]: index plus generation for ABA protection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    index: u32,
    generation: u32,
}

impl Slot {
    /// Position in the arena's backing storage.
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    /// Generation the slot had when this handle was issued.
    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }

    #[cfg(test)]
    pub(crate) fn from_raw(index: u32, generation: u32) -> Self {
        Slot { index, generation }
    }
}

#[derive(Debug)]
enum Entry<T> {
    Occupied { generation: u32, value: T },
    Vacant { generation: u32, next_free: Option<u32> },
}

/// Slab of `T` values with generational handles and an intrusive free list.
#[derive(Debug)]
pub struct Arena<T> {
    entries: Vec<Entry<T>>,
    free_head: Option<u32>,
    len: usize,
}

impl<T> Arena<T> {
    /// An empty arena.
    pub fn new() -> Self {
        Arena {
            entries: Vec::new(),
            free_head: None,
            len: 0,
        }
    }

    /// Number of occupied slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no slot is occupied.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Store `value`, reusing a vacant slot when one exists.
    pub fn insert(&mut self, value: T) -> Slot {
        self.len += 1;
        match self.free_head {
            Some(index) => {
                let entry = &mut self.entries[index as usize];
                let (generation, next_free) = match *entry {
                    Entry::Vacant {
                        generation,
                        next_free,
                    } => (generation, next_free),
                    Entry::Occupied { .. } => unreachable!("free list points at occupied slot"),
                };
                *entry = Entry::Occupied { generation, value };
                self.free_head = next_free;
                Slot { index, generation }
            }
            None => {
                let index = u32::try_from(self.entries.len()).unwrap_or_else(|_| {
                    panic!("event arena exhausted: more than {} pending events", u32::MAX)
                });
                self.entries.push(Entry::Occupied {
                    generation: 0,
                    value,
                });
                Slot {
                    index,
                    generation: 0,
                }
            }
        }
    }

    /// Borrow the value at `slot`, if the handle is still current.
    pub fn get(&self, slot: Slot) -> Option<&T> {
        match self.entries.get(slot.index as usize)? {
            Entry::Occupied { generation, value } if *generation == slot.generation => Some(value),
            _ => None,
        }
    }

    /// Remove and return the value at `slot`, if the handle is still current.
    pub fn remove(&mut self, slot: Slot) -> Option<T> {
        let entry = self.entries.get_mut(slot.index as usize)?;
        match entry {
            Entry::Occupied { generation, .. } if *generation == slot.generation => {}
            _ => return None,
        }
        let vacant = Entry::Vacant {
            generation: slot.generation.wrapping_add(1),
            next_free: self.free_head,
        };
        let Entry::Occupied { value, .. } = std::mem::replace(entry, vacant) else {
            unreachable!("slot checked occupied above")
        };
        self.free_head = Some(slot.index);
        self.len -= 1;
        Some(value)
    }

    /// Remove every value, invalidating all outstanding slots.
    pub fn drain(&mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len);
        for index in 0..self.entries.len() {
            if let Entry::Occupied { generation, .. } = self.entries[index] {
                let slot = Slot {
                    index: index as u32,
                    generation,
                };
                if let Some(value) = self.remove(slot) {
                    out.push(value);
                }
            }
        }
        out
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}
