//! Event system for the scheduling core.
//!
//! An [`Event`] is a caller-owned handle. Protocol code usually embeds
//! one inside a longer-lived owner (a timer, a link, an agent) and hands
//! it to [`Scheduler::schedule`](crate::Scheduler::schedule) over and
//! over again. The scheduler never takes the handle itself: it keeps a
//! shared reference to the handle's [`EventState`] cell and flips that
//! state as the event is queued, dispatched, or cancelled.

use std::cell::Cell;
use std::rc::Rc;

use crate::arena::Slot;
use crate::time::SimTime;

// ── Event ID ──────────────────────────────────────────────────────────

/// A strictly-increasing event identifier.
///
/// Every call to `schedule` mints a fresh one, so an event that is
/// scheduled, fires, and is scheduled again carries a new id the second
/// time. Ids also break ties between equal timestamps: the smaller id
/// was scheduled first and fires first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct EventId(u64);

impl EventId {
    /// Wrap a raw u64 into an `EventId`.
    #[inline]
    pub fn new(raw: u64) -> Self {
        EventId(raw)
    }

    /// Return the raw value.
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E#{}", self.0)
    }
}

// ── Event ID Generator ───────────────────────────────────────────────

/// Strictly-increasing event-ID generator.
///
/// Each `Scheduler` owns exactly one. Ids start at 1.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct EventIdGen {
    next: u64,
}

impl EventIdGen {
    /// Create a generator starting at 1.
    pub fn new() -> Self {
        EventIdGen { next: 1 }
    }

    /// Mint the next event ID.
    pub fn next_id(&mut self) -> EventId {
        let id = EventId(self.next);
        self.next += 1;
        id
    }

    /// Peek at the next ID without consuming it.
    pub fn peek(&self) -> EventId {
        EventId(self.next)
    }
}

impl Default for EventIdGen {
    fn default() -> Self {
        Self::new()
    }
}

// ── Event State ──────────────────────────────────────────────────────

/// Where an event is in its scheduling lifecycle.
///
/// ```text
///  Unscheduled ──schedule──▶ Queued ──dispatch──▶ Fired
///                              │                    │
///                            cancel              schedule
///                              ▼                    │
///                          Cancelled ──schedule──▶ Queued
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventState {
    /// Never handed to a scheduler.
    Unscheduled,
    /// Live in a scheduler's queue, stored at `slot`.
    Queued {
        id: EventId,
        time: SimTime,
        slot: Slot,
    },
    /// Dispatched at `time`.
    Fired { id: EventId, time: SimTime },
    /// Removed from the queue before it could fire.
    Cancelled { id: EventId, time: SimTime },
}

impl EventState {
    /// The id of the most recent scheduling, if there was one.
    pub fn id(&self) -> Option<EventId> {
        match *self {
            EventState::Unscheduled => None,
            EventState::Queued { id, .. }
            | EventState::Fired { id, .. }
            | EventState::Cancelled { id, .. } => Some(id),
        }
    }

    /// The fire time of the most recent scheduling, if there was one.
    pub fn time(&self) -> Option<SimTime> {
        match *self {
            EventState::Unscheduled => None,
            EventState::Queued { time, .. }
            | EventState::Fired { time, .. }
            | EventState::Cancelled { time, .. } => Some(time),
        }
    }

    /// Returns `true` while the event sits in a scheduler queue.
    pub fn is_queued(&self) -> bool {
        matches!(self, EventState::Queued { .. })
    }
}

impl std::fmt::Display for EventState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventState::Unscheduled => write!(f, "unscheduled"),
            EventState::Queued { id, time, .. } => write!(f, "queued({}, {})", id, time),
            EventState::Fired { id, time } => write!(f, "fired({}, {})", id, time),
            EventState::Cancelled { id, time } => write!(f, "cancelled({}, {})", id, time),
        }
    }
}

/// Shared state cell: one copy lives in the caller's [`Event`], one in
/// the scheduler's arena while the event is queued.
pub(crate) type StateCell = Rc<Cell<EventState>>;

// ── Event ─────────────────────────────────────────────────────────────

/// A caller-owned, reusable scheduling handle.
///
/// `Event` is deliberately not `Clone`: a second handle to the same
/// state would let two owners race to reschedule it. The only aliases
/// are the one the scheduler keeps while the event is queued and the
/// `&Event` it passes to the handler on dispatch.
#[derive(Debug)]
pub struct Event {
    state: StateCell,
}

impl Event {
    /// A fresh, unscheduled event.
    pub fn new() -> Self {
        Event {
            state: Rc::new(Cell::new(EventState::Unscheduled)),
        }
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> EventState {
        self.state.get()
    }

    /// Id of the most recent scheduling.
    #[inline]
    pub fn id(&self) -> Option<EventId> {
        self.state().id()
    }

    /// Fire time of the most recent scheduling.
    #[inline]
    pub fn time(&self) -> Option<SimTime> {
        self.state().time()
    }

    /// Returns `true` while the event is live in a scheduler queue.
    #[inline]
    pub fn is_queued(&self) -> bool {
        self.state().is_queued()
    }

    /// Returns `true` if both handles refer to the same event.
    ///
    /// Handlers that own several events use this to tell which one fired.
    #[inline]
    pub fn same_as(&self, other: &Event) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    pub(crate) fn share(&self) -> StateCell {
        Rc::clone(&self.state)
    }

    pub(crate) fn is_cell(&self, cell: &StateCell) -> bool {
        Rc::ptr_eq(&self.state, cell)
    }

    pub(crate) fn from_cell(state: StateCell) -> Self {
        Event { state }
    }

    pub(crate) fn set_state(&self, state: EventState) {
        self.state.set(state);
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

// ── Event Info ───────────────────────────────────────────────────────

/// A snapshot of one scheduling: which id, and when it fires (or fired).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct EventInfo {
    pub id: EventId,
    pub time: SimTime,
}

impl std::fmt::Display for EventInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} @ {}", self.id, self.time)
    }
}
