//! The virtual-time event scheduler.
//!
//! Owns the clock, the active queue discipline and the arena of pending
//! entries. Handlers are invoked one at a time in `(time, id)` order and
//! receive the scheduler by `&mut`, so everything a handler does to the
//! future of the run goes through the API below. The loop is purely
//! synchronous and single-threaded; two runs that schedule the same
//! events in the same order dispatch them identically.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{info, trace, warn};

use crate::arena::{Arena, Slot};
use crate::config::SchedulerConfig;
use crate::discipline::{CalendarStats, Discipline, DisciplineKind, Key, QueueDiscipline};
use crate::error::{TempusError, TempusResult};
use crate::event::{Event, EventId, EventIdGen, EventInfo, EventState, StateCell};
use crate::handler::{handler_ref, Handler, HandlerRef};
use crate::time::SimTime;

/// Arena payload for one queued event.
#[derive(Debug)]
struct Pending {
    state: StateCell,
    handler: HandlerRef,
}

// ── Stats ─────────────────────────────────────────────────────────────

/// A snapshot of what the scheduler has done so far.
///
/// Counters are cumulative over the scheduler's lifetime; `reset` does
/// not zero them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SchedulerStats {
    pub discipline: DisciplineKind,
    pub clock: SimTime,
    pub pending: usize,
    pub scheduled: u64,
    pub dispatched: u64,
    pub cancelled: u64,
    /// Events that fired after their handler had been dropped.
    pub orphaned: u64,
    /// Present only for the calendar discipline.
    pub calendar: Option<CalendarStats>,
}

impl SchedulerStats {
    /// Serialize the snapshot as pretty-printed JSON.
    #[cfg(feature = "serialize")]
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".into())
    }
}

// ── Scheduler ─────────────────────────────────────────────────────────

/// The core scheduler.
///
/// One per simulation run. Construct it explicitly and pass it around;
/// there is no global instance.
#[derive(Debug)]
pub struct Scheduler {
    clock: SimTime,
    halted: bool,
    running: bool,
    ids: EventIdGen,
    discipline: Discipline,
    pending: Arena<Pending>,
    scheduled: u64,
    dispatched: u64,
    cancelled: u64,
    orphaned: u64,
}

impl Scheduler {
    /// An empty scheduler at time zero using `kind`.
    pub fn new(kind: DisciplineKind) -> Self {
        Self::build(SchedulerConfig::new(kind))
    }

    /// An empty scheduler at time zero built from `config`.
    ///
    /// Returns [`TempusError::InvalidConfig`] if any tuning value is out
    /// of range.
    pub fn with_config(config: SchedulerConfig) -> TempusResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: SchedulerConfig) -> Self {
        Scheduler {
            clock: SimTime::ZERO,
            halted: false,
            running: false,
            ids: EventIdGen::new(),
            discipline: Discipline::new(config.discipline, &config.calendar),
            pending: Arena::new(),
            scheduled: 0,
            dispatched: 0,
            cancelled: 0,
            orphaned: 0,
        }
    }

    // ── Scheduling ────────────────────────────────────────────────────

    /// Schedule `event` to fire `delay` seconds from now, dispatching to
    /// `handler`.
    ///
    /// # Panics
    /// Panics if `delay` is negative or not finite, or if `event` is
    /// already queued.
    pub fn schedule<H: Handler + 'static>(
        &mut self,
        handler: &Rc<RefCell<H>>,
        event: &Event,
        delay: f64,
    ) -> EventId {
        self.schedule_ref(handler_ref(handler), event, delay)
    }

    /// [`schedule`](Self::schedule) for a handler that is already erased,
    /// such as one holding a reference to itself.
    pub fn schedule_ref(&mut self, handler: HandlerRef, event: &Event, delay: f64) -> EventId {
        let time = self.clock.after(delay);
        self.enqueue(handler, event, time)
    }

    /// Schedule `event` at the absolute time `at`.
    ///
    /// A time earlier than the clock is reported as
    /// [`TempusError::ScheduleInPast`] rather than a panic; this is the
    /// entry point for scripted commands.
    ///
    /// # Panics
    /// Panics if `event` is already queued.
    pub fn schedule_at<H: Handler + 'static>(
        &mut self,
        handler: &Rc<RefCell<H>>,
        event: &Event,
        at: SimTime,
    ) -> TempusResult<EventId> {
        self.schedule_at_ref(handler_ref(handler), event, at)
    }

    /// [`schedule_at`](Self::schedule_at) for an erased handler.
    pub fn schedule_at_ref(
        &mut self,
        handler: HandlerRef,
        event: &Event,
        at: SimTime,
    ) -> TempusResult<EventId> {
        if at < self.clock {
            return Err(TempusError::ScheduleInPast {
                requested: at,
                now: self.clock,
            });
        }
        Ok(self.enqueue(handler, event, at))
    }

    fn enqueue(&mut self, handler: HandlerRef, event: &Event, time: SimTime) -> EventId {
        if let EventState::Queued { id, time: at, .. } = event.state() {
            panic!(
                "event {} is already scheduled at {}; cancel it before rescheduling",
                id, at
            );
        }
        let id = self.ids.next_id();
        let slot = self.pending.insert(Pending {
            state: event.share(),
            handler,
        });
        self.discipline.insert(Key { time, id, slot });
        event.set_state(EventState::Queued { id, time, slot });
        self.scheduled += 1;
        trace!(%id, %time, now = %self.clock, "scheduled");
        id
    }

    /// Remove a queued event before it fires.
    ///
    /// # Panics
    /// Panics if `event` is not queued, or is queued in a different
    /// scheduler.
    pub fn cancel(&mut self, event: &Event) {
        let EventState::Queued { id, time, slot } = event.state() else {
            panic!("cannot cancel event in state {}: it is not queued", event.state());
        };
        match self.pending.get(slot) {
            Some(p) if event.is_cell(&p.state) => {}
            _ => panic!("cannot cancel {}: it is queued in a different scheduler", id),
        }
        self.unlink(Key { time, id, slot });
    }

    /// Cancel the queued event carrying `id`.
    pub fn cancel_id(&mut self, id: EventId) -> TempusResult<()> {
        let key = self
            .discipline
            .find(id)
            .ok_or(TempusError::UnknownEvent(id))?;
        self.unlink(key);
        Ok(())
    }

    fn unlink(&mut self, key: Key) {
        assert!(
            self.discipline.remove(&key),
            "queue lost track of {} scheduled at {}",
            key.id,
            key.time
        );
        let pending = self.take(key.slot, key.id);
        pending.state.set(EventState::Cancelled {
            id: key.id,
            time: key.time,
        });
        self.cancelled += 1;
        trace!(id = %key.id, time = %key.time, "cancelled");
    }

    fn take(&mut self, slot: Slot, id: EventId) -> Pending {
        self.pending
            .remove(slot)
            .unwrap_or_else(|| panic!("pending entry for {} missing from arena", id))
    }

    /// The queued event carrying `id`, if any.
    pub fn lookup(&self, id: EventId) -> Option<EventInfo> {
        self.discipline.find(id).map(|k| EventInfo {
            id: k.id,
            time: k.time,
        })
    }

    // ── Running ───────────────────────────────────────────────────────

    /// Dispatch events until the queue is empty or [`halt`](Self::halt)
    /// is called. Returns the number dispatched by this call.
    ///
    /// # Panics
    /// Panics if called from inside a handler.
    pub fn run(&mut self) -> u64 {
        self.drive(u64::MAX, None)
    }

    /// Like [`run`](Self::run), but stop after at most `max_events`.
    pub fn run_for(&mut self, max_events: u64) -> u64 {
        self.drive(max_events, None)
    }

    /// Dispatch every event due at or before `until`, then move the clock
    /// to `until` (unless the run was halted first).
    pub fn run_until(&mut self, until: SimTime) -> u64 {
        let n = self.drive(u64::MAX, Some(until));
        if !self.halted && until > self.clock {
            self.clock = until;
        }
        n
    }

    fn drive(&mut self, max_events: u64, until: Option<SimTime>) -> u64 {
        assert!(
            !self.running,
            "re-entrant run: the scheduler is already dispatching events"
        );
        self.running = true;
        self.halted = false;
        info!(
            discipline = %self.discipline.kind(),
            pending = self.discipline.len(),
            now = %self.clock,
            "run started"
        );

        let mut n = 0;
        while n < max_events && !self.halted {
            if let (Some(limit), Some(next)) = (until, self.next_event_time()) {
                if next > limit {
                    break;
                }
            }
            if self.dispatch_next().is_none() {
                break;
            }
            n += 1;
        }

        self.running = false;
        info!(
            dispatched = n,
            now = %self.clock,
            halted = self.halted,
            "run finished"
        );
        n
    }

    /// Dispatch exactly one event. Returns `None` if nothing is queued.
    ///
    /// # Panics
    /// Panics if called from inside a handler.
    pub fn step(&mut self) -> Option<EventInfo> {
        assert!(
            !self.running,
            "re-entrant step: the scheduler is already dispatching events"
        );
        self.running = true;
        let info = self.dispatch_next();
        self.running = false;
        info
    }

    fn dispatch_next(&mut self) -> Option<EventInfo> {
        let key = self.discipline.pop_min()?;
        let pending = self.take(key.slot, key.id);
        assert!(
            key.time >= self.clock,
            "clock would run backwards: {} dequeued at {}",
            key.id,
            self.clock
        );
        self.clock = key.time;
        pending.state.set(EventState::Fired {
            id: key.id,
            time: key.time,
        });
        self.dispatched += 1;
        let info = EventInfo {
            id: key.id,
            time: key.time,
        };

        let Some(target) = pending.handler.upgrade() else {
            self.orphaned += 1;
            warn!(id = %key.id, time = %key.time, "handler dropped before its event fired");
            return Some(info);
        };
        trace!(id = %key.id, time = %key.time, "dispatch");
        let mut handler = target.try_borrow_mut().unwrap_or_else(|_| {
            panic!("handler for {} is already borrowed during dispatch", key.id)
        });
        handler.handle(self, &Event::from_cell(pending.state));
        Some(info)
    }

    /// Stop the current run once the running handler returns.
    pub fn halt(&mut self) {
        self.halted = true;
    }

    /// Drop every pending event and rewind the clock to zero.
    ///
    /// Each dropped event becomes `Cancelled`. Identifiers keep
    /// increasing across a reset.
    ///
    /// # Panics
    /// Panics if called from inside a handler.
    pub fn reset(&mut self) {
        assert!(!self.running, "cannot reset the scheduler from inside a handler");
        self.discipline.clear();
        for pending in self.pending.drain() {
            if let EventState::Queued { id, time, .. } = pending.state.get() {
                pending.state.set(EventState::Cancelled { id, time });
                self.cancelled += 1;
            }
        }
        self.clock = SimTime::ZERO;
        self.halted = false;
    }

    /// Move the clock forward to `to`, but never past the next pending
    /// event. Used to keep virtual time in step with a wall clock.
    pub(crate) fn advance_clock(&mut self, to: SimTime) {
        let target = match self.next_event_time() {
            Some(next) => to.min(next),
            None => to,
        };
        if target > self.clock {
            self.clock = target;
        }
    }

    pub(crate) fn clear_halt(&mut self) {
        self.halted = false;
    }

    // ── Queries ───────────────────────────────────────────────────────

    /// Current virtual time.
    #[inline]
    pub fn clock(&self) -> SimTime {
        self.clock
    }

    /// Fire time of the earliest queued event.
    pub fn next_event_time(&self) -> Option<SimTime> {
        self.discipline.peek_min().map(|k| k.time)
    }

    /// Number of queued events.
    pub fn pending(&self) -> usize {
        self.discipline.len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.discipline.is_empty()
    }

    /// Returns `true` if `halt` was called and no run has started since.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Returns `true` while a run is dispatching events.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The active queue discipline.
    pub fn kind(&self) -> DisciplineKind {
        self.discipline.kind()
    }

    /// Counters and current state.
    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            discipline: self.discipline.kind(),
            clock: self.clock,
            pending: self.discipline.len(),
            scheduled: self.scheduled,
            dispatched: self.dispatched,
            cancelled: self.cancelled,
            orphaned: self.orphaned,
            calendar: self.discipline.as_calendar().map(|q| q.stats()),
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::build(SchedulerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CalendarConfig;
    use crate::handler::handler_fn;

    type Log = Rc<RefCell<Vec<(u64, f64)>>>;

    /// A handler that records `(tag, clock)` on every dispatch.
    fn recorder(log: &Log, tag: u64) -> Rc<RefCell<impl Handler>> {
        let log = log.clone();
        handler_fn(move |s: &mut Scheduler, _e: &Event| {
            log.borrow_mut().push((tag, s.clock().as_secs()))
        })
    }

    fn kinds() -> [DisciplineKind; 3] {
        [DisciplineKind::List, DisciplineKind::Heap, DisciplineKind::Calendar]
    }

    #[test]
    fn test_dispatch_in_time_order() {
        for kind in kinds() {
            let mut sched = Scheduler::new(kind);
            let log = Log::default();
            let (h1, h3, h5) = (recorder(&log, 1), recorder(&log, 3), recorder(&log, 5));
            let (e1, e3, e5) = (Event::new(), Event::new(), Event::new());

            sched.schedule(&h5, &e5, 5.0);
            sched.schedule(&h1, &e1, 1.0);
            sched.schedule(&h3, &e3, 3.0);

            assert_eq!(sched.run(), 3);
            assert_eq!(*log.borrow(), vec![(1, 1.0), (3, 3.0), (5, 5.0)], "{kind}");
            assert_eq!(sched.clock(), SimTime::new(5.0));
            assert!(matches!(e5.state(), EventState::Fired { .. }));
        }
    }

    #[test]
    fn test_equal_times_fire_in_schedule_order() {
        for kind in kinds() {
            let mut sched = Scheduler::new(kind);
            let log = Log::default();
            let handlers: Vec<_> = (0..5).map(|i| recorder(&log, i)).collect();
            let events: Vec<Event> = (0..5).map(|_| Event::new()).collect();
            for (h, e) in handlers.iter().zip(&events) {
                sched.schedule(h, e, 2.0);
            }
            sched.run();
            let tags: Vec<u64> = log.borrow().iter().map(|(t, _)| *t).collect();
            assert_eq!(tags, vec![0, 1, 2, 3, 4], "{kind}");
        }
    }

    #[test]
    fn test_ids_strictly_increase() {
        let mut sched = Scheduler::default();
        let h = handler_fn(|_s: &mut Scheduler, _e: &Event| {});
        let ev = Event::new();
        let a = sched.schedule(&h, &ev, 1.0);
        sched.run();
        let b = sched.schedule(&h, &ev, 1.0);
        assert!(b > a);
        assert_eq!(ev.id(), Some(b));
    }

    #[test]
    #[should_panic(expected = "already scheduled")]
    fn test_double_schedule_panics() {
        let mut sched = Scheduler::default();
        let h = handler_fn(|_s: &mut Scheduler, _e: &Event| {});
        let ev = Event::new();
        sched.schedule(&h, &ev, 1.0);
        sched.schedule(&h, &ev, 2.0);
    }

    #[test]
    #[should_panic(expected = "negative or non-finite delay")]
    fn test_negative_delay_panics() {
        let mut sched = Scheduler::default();
        let h = handler_fn(|_s: &mut Scheduler, _e: &Event| {});
        sched.schedule(&h, &Event::new(), -1.0);
    }

    #[test]
    #[should_panic(expected = "negative or non-finite delay")]
    fn test_nan_delay_panics() {
        let mut sched = Scheduler::default();
        let h = handler_fn(|_s: &mut Scheduler, _e: &Event| {});
        sched.schedule(&h, &Event::new(), f64::NAN);
    }

    #[test]
    fn test_cancel_prevents_dispatch() {
        let mut sched = Scheduler::default();
        let log = Log::default();
        let h = recorder(&log, 1);
        let ev = Event::new();
        sched.schedule(&h, &ev, 1.0);
        sched.cancel(&ev);

        assert!(matches!(ev.state(), EventState::Cancelled { .. }));
        assert_eq!(sched.run(), 0);
        assert!(log.borrow().is_empty());
        assert_eq!(sched.stats().cancelled, 1);

        // A cancelled event can be scheduled again.
        sched.schedule(&h, &ev, 1.0);
        assert_eq!(sched.run(), 1);
    }

    #[test]
    #[should_panic(expected = "not queued")]
    fn test_cancel_unqueued_panics() {
        let mut sched = Scheduler::default();
        sched.cancel(&Event::new());
    }

    #[test]
    #[should_panic(expected = "different scheduler")]
    fn test_cancel_in_wrong_scheduler_panics() {
        let mut a = Scheduler::default();
        let mut b = Scheduler::default();
        let h = handler_fn(|_s: &mut Scheduler, _e: &Event| {});
        let ev = Event::new();
        a.schedule(&h, &ev, 1.0);
        b.schedule(&h, &Event::new(), 1.0);
        b.cancel(&ev);
    }

    #[test]
    fn test_schedule_at_rejects_past() {
        let mut sched = Scheduler::default();
        let h = handler_fn(|_s: &mut Scheduler, _e: &Event| {});
        sched.run_until(SimTime::new(10.0));

        let ev = Event::new();
        let err = sched.schedule_at(&h, &ev, SimTime::new(3.0)).unwrap_err();
        assert_eq!(
            err,
            TempusError::ScheduleInPast {
                requested: SimTime::new(3.0),
                now: SimTime::new(10.0),
            }
        );
        assert_eq!(ev.state(), EventState::Unscheduled);

        let id = sched.schedule_at(&h, &ev, SimTime::new(12.5)).unwrap();
        assert_eq!(
            sched.lookup(id),
            Some(EventInfo {
                id,
                time: SimTime::new(12.5)
            })
        );
    }

    #[test]
    fn test_lookup_and_cancel_id() {
        let mut sched = Scheduler::new(DisciplineKind::Heap);
        let h = handler_fn(|_s: &mut Scheduler, _e: &Event| {});
        let ev = Event::new();
        let id = sched.schedule(&h, &ev, 4.0);

        assert_eq!(sched.lookup(id).map(|i| i.time), Some(SimTime::new(4.0)));
        assert_eq!(sched.cancel_id(id), Ok(()));
        assert_eq!(sched.lookup(id), None);
        assert_eq!(sched.cancel_id(id), Err(TempusError::UnknownEvent(id)));
        assert_eq!(ev.state(), EventState::Cancelled { id, time: SimTime::new(4.0) });
    }

    /// Re-arms the event it was dispatched with until it has fired
    /// `limit` times.
    struct Repeater {
        me: HandlerRef,
        ev: Event,
        fired: u32,
        limit: u32,
    }

    impl Handler for Repeater {
        fn handle(&mut self, sched: &mut Scheduler, event: &Event) {
            assert!(event.same_as(&self.ev));
            self.fired += 1;
            if self.fired < self.limit {
                sched.schedule_ref(self.me.clone(), event, 0.5);
            }
        }
    }

    #[test]
    fn test_handler_reschedules_its_own_event() {
        let mut sched = Scheduler::default();
        let h = Rc::new_cyclic(|me: &std::rc::Weak<RefCell<Repeater>>| {
            RefCell::new(Repeater {
                me: me.clone(),
                ev: Event::new(),
                fired: 0,
                limit: 4,
            })
        });
        sched.schedule(&h, &h.borrow().ev, 0.5);
        assert_eq!(sched.run(), 4);
        assert_eq!(sched.clock(), SimTime::new(2.0));
        assert_eq!(h.borrow().fired, 4);
    }

    #[test]
    fn test_halt_and_resume() {
        let mut sched = Scheduler::default();
        let log = Log::default();
        let halter = handler_fn(|s: &mut Scheduler, _e: &Event| s.halt());
        let h = recorder(&log, 7);
        let (stop, later) = (Event::new(), Event::new());
        sched.schedule(&halter, &stop, 1.0);
        sched.schedule(&h, &later, 2.0);

        assert_eq!(sched.run(), 1);
        assert!(sched.is_halted());
        assert_eq!(sched.clock(), SimTime::new(1.0));
        assert_eq!(sched.pending(), 1);

        assert_eq!(sched.run(), 1);
        assert!(!sched.is_halted());
        assert_eq!(*log.borrow(), vec![(7, 2.0)]);
    }

    #[test]
    fn test_run_for_and_step() {
        let mut sched = Scheduler::new(DisciplineKind::List);
        let h = handler_fn(|_s: &mut Scheduler, _e: &Event| {});
        let events: Vec<Event> = (0..5).map(|_| Event::new()).collect();
        for (i, e) in events.iter().enumerate() {
            sched.schedule(&h, e, i as f64);
        }

        assert_eq!(sched.run_for(2), 2);
        assert_eq!(sched.clock(), SimTime::new(1.0));
        let info = sched.step().expect("three still queued");
        assert_eq!(info.time, SimTime::new(2.0));
        assert_eq!(sched.next_event_time(), Some(SimTime::new(3.0)));
        assert_eq!(sched.run(), 2);
        assert_eq!(sched.step(), None);
    }

    #[test]
    fn test_run_until_advances_clock() {
        let mut sched = Scheduler::default();
        let log = Log::default();
        let h = recorder(&log, 0);
        let (a, b) = (Event::new(), Event::new());
        sched.schedule(&h, &a, 1.0);
        sched.schedule(&h, &b, 3.0);

        assert_eq!(sched.run_until(SimTime::new(2.0)), 1);
        assert_eq!(sched.clock(), SimTime::new(2.0));
        assert_eq!(sched.run_until(SimTime::new(3.0)), 1);
        assert_eq!(sched.clock(), SimTime::new(3.0));
        assert!(sched.is_empty());
    }

    #[test]
    fn test_orphaned_event_advances_clock() {
        let mut sched = Scheduler::default();
        let h = handler_fn(|_s: &mut Scheduler, _e: &Event| {});
        let ev = Event::new();
        sched.schedule(&h, &ev, 2.5);
        drop(h);

        assert_eq!(sched.run(), 1);
        assert_eq!(sched.clock(), SimTime::new(2.5));
        assert!(matches!(ev.state(), EventState::Fired { .. }));
        assert_eq!(sched.stats().orphaned, 1);
    }

    #[test]
    fn test_dropped_event_handle_still_fires() {
        let mut sched = Scheduler::default();
        let log = Log::default();
        let h = recorder(&log, 9);
        {
            let ev = Event::new();
            sched.schedule(&h, &ev, 1.0);
        }
        sched.run();
        assert_eq!(*log.borrow(), vec![(9, 1.0)]);
    }

    #[test]
    #[should_panic(expected = "re-entrant run")]
    fn test_reentrant_run_panics() {
        let mut sched = Scheduler::default();
        let h = handler_fn(|s: &mut Scheduler, _e: &Event| {
            s.run();
        });
        sched.schedule(&h, &Event::new(), 1.0);
        sched.run();
    }

    #[test]
    fn test_reset_cancels_everything() {
        let mut sched = Scheduler::default();
        let h = handler_fn(|_s: &mut Scheduler, _e: &Event| {});
        let (a, b, c) = (Event::new(), Event::new(), Event::new());
        sched.schedule(&h, &a, 1.0);
        sched.schedule(&h, &b, 2.0);
        sched.schedule(&h, &c, 3.0);
        sched.run_for(1);

        sched.reset();
        assert_eq!(sched.clock(), SimTime::ZERO);
        assert!(sched.is_empty());
        assert!(matches!(a.state(), EventState::Fired { .. }));
        assert!(matches!(b.state(), EventState::Cancelled { .. }));
        assert!(matches!(c.state(), EventState::Cancelled { .. }));

        // Events are reusable after a reset.
        sched.schedule(&h, &b, 1.0);
        assert_eq!(sched.run(), 1);
    }

    #[test]
    fn test_far_future_event_after_same_time_burst() {
        let mut sched = Scheduler::new(DisciplineKind::Calendar);
        let log = Log::default();
        let h = recorder(&log, 0);
        let events: Vec<Event> = (0..7).map(|_| Event::new()).collect();
        for e in &events[..6] {
            sched.schedule(&h, e, 0.0);
        }
        sched.schedule(&h, &events[6], 1.0e13);

        assert_eq!(sched.run(), 7);
        assert_eq!(sched.clock(), SimTime::new(1.0e13));

        let last = Event::new();
        sched.schedule(&h, &last, 1.0e19);
        assert_eq!(sched.run(), 1);
        assert_eq!(log.borrow().len(), 8);
    }

    #[test]
    fn test_with_config_rejects_bad_calendar() {
        let bad = SchedulerConfig::new(DisciplineKind::Calendar)
            .with_calendar(CalendarConfig::default().with_initial_width(0.0));
        assert!(matches!(
            Scheduler::with_config(bad),
            Err(TempusError::InvalidConfig(_))
        ));

        let good = SchedulerConfig::new(DisciplineKind::Calendar)
            .with_calendar(CalendarConfig::default().with_initial_width(0.25));
        let sched = Scheduler::with_config(good).expect("valid config");
        assert_eq!(sched.kind(), DisciplineKind::Calendar);
    }

    #[test]
    fn test_advance_clock_stops_at_next_event() {
        let mut sched = Scheduler::default();
        let h = handler_fn(|_s: &mut Scheduler, _e: &Event| {});
        sched.schedule(&h, &Event::new(), 2.0);
        sched.advance_clock(SimTime::new(5.0));
        assert_eq!(sched.clock(), SimTime::new(2.0));
        sched.advance_clock(SimTime::new(1.0));
        assert_eq!(sched.clock(), SimTime::new(2.0));
    }

    #[test]
    fn test_stats() {
        let mut sched = Scheduler::new(DisciplineKind::Calendar);
        let h = handler_fn(|_s: &mut Scheduler, _e: &Event| {});
        let events: Vec<Event> = (0..3).map(|_| Event::new()).collect();
        for e in &events {
            sched.schedule(&h, e, 1.0);
        }
        sched.cancel(&events[1]);
        sched.run();

        let stats = sched.stats();
        assert_eq!(stats.discipline, DisciplineKind::Calendar);
        assert_eq!(stats.scheduled, 3);
        assert_eq!(stats.dispatched, 2);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.pending, 0);
        assert_eq!(stats.calendar.map(|c| c.dequeues), Some(2));
        assert!(Scheduler::new(DisciplineKind::Heap).stats().calendar.is_none());
    }

    #[cfg(feature = "serialize")]
    #[test]
    fn test_stats_json() {
        let sched = Scheduler::default();
        let json: serde_json::Value = serde_json::from_str(&sched.stats().to_json()).unwrap();
        assert_eq!(json["pending"], 0);
        assert_eq!(json["discipline"], "Calendar");
    }
}
