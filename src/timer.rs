//! Reusable one-shot timers.
//!
//! A [`TimerHandler`] owns exactly one [`Event`] for its whole lifetime
//! and tracks where it is in the cycle:
//!
//! ```text
//!  Idle ──sched/resched──▶ Pending ──fires──▶ Handling ──▶ Idle
//!   ▲                        │                   │
//!   └──────── cancel ────────┘                   └─resched─▶ Pending
//! ```
//!
//! What happens on expiry is supplied by an [`Expire`] implementation.
//! [`Periodic`] is the common "re-arm every interval" case.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::event::Event;
use crate::handler::{Handler, HandlerRef};
use crate::scheduler::Scheduler;
use crate::time::SimTime;

/// Where a timer is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum TimerStatus {
    Idle,
    Pending,
    Handling,
}

impl std::fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimerStatus::Idle => write!(f, "idle"),
            TimerStatus::Pending => write!(f, "pending"),
            TimerStatus::Handling => write!(f, "handling"),
        }
    }
}

/// The timer's own bookkeeping, split from the user payload so an
/// [`Expiry`] can borrow it while the payload runs.
#[derive(Debug)]
struct TimerCore {
    status: TimerStatus,
    event: Event,
    me: HandlerRef,
}

impl TimerCore {
    /// The recorded status, corrected for an event the scheduler dropped
    /// without the timer seeing it (a reset, or a direct cancel).
    fn status(&self) -> TimerStatus {
        match self.status {
            TimerStatus::Pending if !self.event.is_queued() => TimerStatus::Idle,
            status => status,
        }
    }

    fn sched(&mut self, sched: &mut Scheduler, delay: f64) {
        let status = self.status();
        assert!(
            status == TimerStatus::Idle,
            "cannot sched a timer that is {}; use resched",
            status
        );
        self.arm(sched, delay);
    }

    fn resched(&mut self, sched: &mut Scheduler, delay: f64) {
        if self.event.is_queued() {
            sched.cancel(&self.event);
        }
        self.arm(sched, delay);
    }

    fn cancel(&mut self, sched: &mut Scheduler) {
        let status = self.status();
        assert!(
            status == TimerStatus::Pending,
            "cannot cancel a timer that is {}",
            status
        );
        sched.cancel(&self.event);
        self.status = TimerStatus::Idle;
    }

    fn arm(&mut self, sched: &mut Scheduler, delay: f64) {
        sched.schedule_ref(self.me.clone(), &self.event, delay);
        self.status = TimerStatus::Pending;
    }
}

// ── Expire ────────────────────────────────────────────────────────────

/// Behaviour run when a timer fires.
pub trait Expire {
    fn expire(&mut self, ctx: &mut Expiry<'_>);
}

/// What an [`Expire`] implementation can reach while it runs.
pub struct Expiry<'a> {
    sched: &'a mut Scheduler,
    core: &'a mut TimerCore,
}

impl<'a> Expiry<'a> {
    /// Current virtual time.
    #[inline]
    pub fn now(&self) -> SimTime {
        self.sched.clock()
    }

    /// The scheduler, for scheduling or cancelling other work.
    pub fn scheduler(&mut self) -> &mut Scheduler {
        &mut *self.sched
    }

    /// The timer's event.
    pub fn event(&self) -> &Event {
        &self.core.event
    }

    /// Re-arm this timer `delay` seconds from now.
    pub fn resched(&mut self, delay: f64) {
        self.core.resched(&mut *self.sched, delay);
    }
}

// ── TimerHandler ──────────────────────────────────────────────────────

/// A one-shot timer wrapping user state `T`.
#[derive(Debug)]
pub struct TimerHandler<T> {
    core: TimerCore,
    inner: T,
}

impl<T: Expire + 'static> TimerHandler<T> {
    /// A new idle timer. The returned handle is what the scheduler
    /// dispatches to; the timer refers to itself through it.
    pub fn new(inner: T) -> Rc<RefCell<Self>> {
        Rc::new_cyclic(|me: &Weak<RefCell<Self>>| {
            let me: HandlerRef = me.clone();
            RefCell::new(TimerHandler {
                core: TimerCore {
                    status: TimerStatus::Idle,
                    event: Event::new(),
                    me,
                },
                inner,
            })
        })
    }
}

impl<T> TimerHandler<T> {
    /// Arm the timer to fire after `delay`.
    ///
    /// # Panics
    /// Panics unless the timer is idle.
    pub fn sched(&mut self, sched: &mut Scheduler, delay: f64) {
        self.core.sched(sched, delay);
    }

    /// Arm the timer to fire after `delay`, replacing any pending expiry.
    pub fn resched(&mut self, sched: &mut Scheduler, delay: f64) {
        self.core.resched(sched, delay);
    }

    /// Disarm a pending timer.
    ///
    /// # Panics
    /// Panics unless the timer is pending.
    pub fn cancel(&mut self, sched: &mut Scheduler) {
        self.core.cancel(sched);
    }

    pub fn status(&self) -> TimerStatus {
        self.core.status()
    }

    pub fn is_pending(&self) -> bool {
        self.core.status() == TimerStatus::Pending
    }

    /// The timer's event.
    pub fn event(&self) -> &Event {
        &self.core.event
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

impl<T: Expire> Handler for TimerHandler<T> {
    fn handle(&mut self, sched: &mut Scheduler, event: &Event) {
        assert!(
            self.core.status == TimerStatus::Pending,
            "timer fired while {} ({})",
            self.core.status,
            event.state()
        );
        self.core.status = TimerStatus::Handling;
        let mut ctx = Expiry {
            sched,
            core: &mut self.core,
        };
        self.inner.expire(&mut ctx);
        if self.core.status == TimerStatus::Handling {
            self.core.status = TimerStatus::Idle;
        }
    }
}

// ── Periodic ──────────────────────────────────────────────────────────

/// Calls `tick` and re-arms itself every `interval` seconds.
pub struct Periodic<F> {
    interval: f64,
    tick: F,
    fired: u64,
}

impl<F> Periodic<F>
where
    F: FnMut(&mut Expiry<'_>),
{
    pub fn new(interval: f64, tick: F) -> Self {
        assert!(
            interval.is_finite() && interval > 0.0,
            "periodic interval must be positive, got {}",
            interval
        );
        Periodic {
            interval,
            tick,
            fired: 0,
        }
    }
}

impl<F> Periodic<F> {
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Number of expiries so far.
    pub fn fired(&self) -> u64 {
        self.fired
    }
}

impl<F> std::fmt::Debug for Periodic<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Periodic")
            .field("interval", &self.interval)
            .field("fired", &self.fired)
            .finish()
    }
}

impl<F> Expire for Periodic<F>
where
    F: FnMut(&mut Expiry<'_>),
{
    fn expire(&mut self, ctx: &mut Expiry<'_>) {
        self.fired += 1;
        (self.tick)(ctx);
        ctx.resched(self.interval);
    }
}
