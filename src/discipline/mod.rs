//! Pluggable queue disciplines.
//!
//! A discipline orders the keys of live events by fire time. The
//! scheduler picks exactly one at construction and talks to it only
//! through [`QueueDiscipline`]; [`Discipline`] is the closed set of
//! implementations, dispatched by `match`.
//!
//! | Discipline | insert | extract-min | remove / find |
//! |---|---|---|---|
//! | [`ListQueue`] | O(n) | O(1) | O(n) |
//! | [`HeapQueue`] | O(log n) | O(log n) | O(n) |
//! | [`CalendarQueue`] | amortized O(1) | amortized O(1) | O(bucket) / O(n) |
//!
//! Every discipline orders by `(time, id)`. Because ids are minted in
//! scheduling order, equal timestamps fire in insertion order whichever
//! discipline is active.

pub mod calendar;
pub mod heap;
pub mod list;


use std::cmp::Ordering;
use std::str::FromStr;

use crate::arena::Slot;
use crate::config::CalendarConfig;
use crate::error::TempusError;
use crate::event::EventId;
use crate::time::SimTime;

pub use calendar::{CalendarQueue, CalendarStats};
pub use heap::HeapQueue;
pub use list::ListQueue;

// ── Key ───────────────────────────────────────────────────────────────

/// What a discipline stores per live event.
///
/// Ordered by `(time, id)`; `slot` locates the event's payload in the
/// scheduler's arena and takes no part in ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key {
    pub time: SimTime,
    pub id: EventId,
    pub slot: Slot,
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .cmp(&other.time)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ── QueueDiscipline trait ─────────────────────────────────────────────

/// The contract every queue discipline satisfies.
///
/// Keys handed to `insert` are never earlier than the last key returned
/// by `pop_min`; the scheduler guarantees this by only scheduling at
/// `clock + delay`.
pub trait QueueDiscipline {
    /// Add a key.
    fn insert(&mut self, key: Key);

    /// Remove and return the smallest key.
    fn pop_min(&mut self) -> Option<Key>;

    /// The smallest key, without removing it.
    fn peek_min(&self) -> Option<Key>;

    /// Remove a specific key. Returns `false` if it is not present.
    fn remove(&mut self, key: &Key) -> bool;

    /// Find the key carrying `id`.
    fn find(&self, id: EventId) -> Option<Key>;

    /// Number of queued keys.
    fn len(&self) -> usize;

    /// Returns `true` if nothing is queued.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every key and return to the freshly-constructed state.
    fn clear(&mut self) -> Vec<Key>;
}

// ── DisciplineKind ────────────────────────────────────────────────────

/// Which discipline to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum DisciplineKind {
    /// Ordered list: simplest, O(n) insert.
    List,
    /// Binary min-heap: O(log n) insert and extract.
    Heap,
    /// Adaptive calendar queue: amortized O(1).
    #[default]
    Calendar,
}

impl FromStr for DisciplineKind {
    type Err = TempusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "list" => Ok(DisciplineKind::List),
            "heap" => Ok(DisciplineKind::Heap),
            "calendar" => Ok(DisciplineKind::Calendar),
            _ => Err(TempusError::UnknownDiscipline(s.to_string())),
        }
    }
}

impl std::fmt::Display for DisciplineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisciplineKind::List => write!(f, "list"),
            DisciplineKind::Heap => write!(f, "heap"),
            DisciplineKind::Calendar => write!(f, "calendar"),
        }
    }
}

// ── Discipline ────────────────────────────────────────────────────────

/// The active discipline of a scheduler.
#[derive(Debug)]
pub enum Discipline {
    List(ListQueue),
    Heap(HeapQueue),
    Calendar(CalendarQueue),
}

impl Discipline {
    /// Build an empty discipline of the given kind.
    pub fn new(kind: DisciplineKind, calendar: &CalendarConfig) -> Self {
        match kind {
            DisciplineKind::List => Discipline::List(ListQueue::new()),
            DisciplineKind::Heap => Discipline::Heap(HeapQueue::new()),
            DisciplineKind::Calendar => Discipline::Calendar(CalendarQueue::new(calendar.clone())),
        }
    }

    /// Which kind this is.
    pub fn kind(&self) -> DisciplineKind {
        match self {
            Discipline::List(_) => DisciplineKind::List,
            Discipline::Heap(_) => DisciplineKind::Heap,
            Discipline::Calendar(_) => DisciplineKind::Calendar,
        }
    }

    /// The calendar queue, when that is the active discipline.
    pub fn as_calendar(&self) -> Option<&CalendarQueue> {
        match self {
            Discipline::Calendar(q) => Some(q),
            _ => None,
        }
    }
}

impl QueueDiscipline for Discipline {
    fn insert(&mut self, key: Key) {
        match self {
            Discipline::List(q) => q.insert(key),
            Discipline::Heap(q) => q.insert(key),
            Discipline::Calendar(q) => q.insert(key),
        }
    }

    fn pop_min(&mut self) -> Option<Key> {
        match self {
            Discipline::List(q) => q.pop_min(),
            Discipline::Heap(q) => q.pop_min(),
            Discipline::Calendar(q) => q.pop_min(),
        }
    }

    fn peek_min(&self) -> Option<Key> {
        match self {
            Discipline::List(q) => q.peek_min(),
            Discipline::Heap(q) => q.peek_min(),
            Discipline::Calendar(q) => q.peek_min(),
        }
    }

    fn remove(&mut self, key: &Key) -> bool {
        match self {
            Discipline::List(q) => q.remove(key),
            Discipline::Heap(q) => q.remove(key),
            Discipline::Calendar(q) => q.remove(key),
        }
    }

    fn find(&self, id: EventId) -> Option<Key> {
        match self {
            Discipline::List(q) => q.find(id),
            Discipline::Heap(q) => q.find(id),
            Discipline::Calendar(q) => q.find(id),
        }
    }

    fn len(&self) -> usize {
        match self {
            Discipline::List(q) => q.len(),
            Discipline::Heap(q) => q.len(),
            Discipline::Calendar(q) => q.len(),
        }
    }

    fn clear(&mut self) -> Vec<Key> {
        match self {
            Discipline::List(q) => q.clear(),
            Discipline::Heap(q) => q.clear(),
            Discipline::Calendar(q) => q.clear(),
        }
    }
}
