//! Wall-clock synchronised scheduling.
//!
//! [`RealTimeScheduler`] drives an ordinary calendar-queue [`Scheduler`]
//! but refuses to let virtual time run ahead of a [`WallClock`]: before
//! each dispatch it waits until the wall clock has caught up with the
//! event. While waiting it polls an [`ExternalSource`], which may inject
//! new events (for instance from a live network tap).
//!
//! If dispatch falls behind the wall clock by more than the configured
//! slop, the run continues but a warning is logged and counted.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::{RealTimeConfig, SchedulerConfig};
use crate::discipline::DisciplineKind;
use crate::error::TempusResult;
use crate::scheduler::Scheduler;
use crate::time::SimTime;

/// Shortest sleep issued while waiting for a deadline.
const MIN_SLEEP: f64 = 1.0e-9;

// ── Wall clocks ───────────────────────────────────────────────────────

/// A source of wall-clock seconds.
pub trait WallClock {
    /// Seconds since an arbitrary fixed origin.
    fn now(&self) -> f64;

    /// Block for `secs` seconds.
    fn sleep(&mut self, secs: f64);
}

/// The host's monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl WallClock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }

    fn sleep(&mut self, secs: f64) {
        if secs > 0.0 {
            std::thread::sleep(Duration::from_secs_f64(secs));
        }
    }
}

/// A clock that only moves when told to. Sleeping advances it instantly.
///
/// Clones share the same time, so a test can keep one handle while the
/// scheduler owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: std::rc::Rc<std::cell::Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `secs`.
    pub fn advance(&self, secs: f64) {
        self.now.set(self.now.get() + secs);
    }
}

impl WallClock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }

    fn sleep(&mut self, secs: f64) {
        self.advance(secs);
    }
}

// ── External sources ──────────────────────────────────────────────────

/// What an [`ExternalSource`] reported when polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    /// Nothing happened.
    Idle,
    /// The source did something, possibly scheduling new events.
    Activity,
    /// The source will never produce anything again.
    Closed,
}

/// Outside input polled while the real-time loop waits.
pub trait ExternalSource {
    fn poll(&mut self, sched: &mut Scheduler) -> SourceStatus;
}

impl<F> ExternalSource for F
where
    F: FnMut(&mut Scheduler) -> SourceStatus,
{
    fn poll(&mut self, sched: &mut Scheduler) -> SourceStatus {
        (self)(sched)
    }
}

/// A source that is closed from the start.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSource;

impl ExternalSource for NoSource {
    fn poll(&mut self, _sched: &mut Scheduler) -> SourceStatus {
        SourceStatus::Closed
    }
}

// ── RealTimeScheduler ─────────────────────────────────────────────────

/// A calendar-queue scheduler paced by a wall clock.
#[derive(Debug)]
pub struct RealTimeScheduler<C: WallClock = SystemClock> {
    sched: Scheduler,
    clock: C,
    config: RealTimeConfig,
    /// Wall time that corresponds to virtual time zero.
    origin: f64,
    drift_warnings: u64,
}

impl RealTimeScheduler<SystemClock> {
    /// A real-time scheduler on the host clock.
    pub fn new(config: RealTimeConfig) -> TempusResult<Self> {
        Self::with_clock(config, SystemClock::new())
    }
}

impl<C: WallClock> RealTimeScheduler<C> {
    /// A real-time scheduler on a caller-supplied clock.
    pub fn with_clock(config: RealTimeConfig, clock: C) -> TempusResult<Self> {
        config.validate()?;
        let sched = Scheduler::with_config(
            SchedulerConfig::new(DisciplineKind::Calendar).with_calendar(config.calendar.clone()),
        )?;
        let origin = clock.now();
        Ok(RealTimeScheduler {
            sched,
            clock,
            config,
            origin,
            drift_warnings: 0,
        })
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.sched
    }

    /// The wrapped scheduler, for seeding events before a run.
    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.sched
    }

    pub fn wall_clock(&self) -> &C {
        &self.clock
    }

    pub fn config(&self) -> &RealTimeConfig {
        &self.config
    }

    /// Number of dispatches that ran later than the allowed slop.
    pub fn drift_warnings(&self) -> u64 {
        self.drift_warnings
    }

    /// Stop the run once the running handler returns.
    pub fn halt(&mut self) {
        self.sched.halt();
    }

    /// Wall time mapped onto the virtual timeline.
    fn wall_time(&self) -> f64 {
        (self.clock.now() - self.origin).max(0.0)
    }

    /// Run with no external input, until the queue drains or a handler
    /// halts. Returns the number of events dispatched.
    pub fn run(&mut self) -> u64 {
        self.run_with(&mut NoSource)
    }

    /// Run until halted, or until `source` is closed and nothing is
    /// queued. Returns the number of events dispatched.
    pub fn run_with<S: ExternalSource + ?Sized>(&mut self, source: &mut S) -> u64 {
        self.sched.clear_halt();
        // Resume where virtual time left off.
        self.origin = self.clock.now() - self.sched.clock().as_secs();
        let poll = self.config.poll_interval.as_secs_f64();
        info!(
            pending = self.sched.pending(),
            now = %self.sched.clock(),
            slop = self.config.slop,
            "real-time run started"
        );

        let mut n = 0;
        'run: loop {
            if self.sched.is_halted() {
                break;
            }
            let now = self.wall_time();
            self.sched.advance_clock(SimTime::new(now));

            while let Some(next) = self.sched.next_event_time() {
                let wall = self.wall_time();
                if next.as_secs() > wall {
                    break;
                }
                let late = wall - next.as_secs();
                if late > self.config.slop {
                    self.drift_warnings += 1;
                    warn!(
                        event_time = %next,
                        wall,
                        late,
                        slop = self.config.slop,
                        "real-time dispatch behind wall clock"
                    );
                }
                if self.sched.step().is_some() {
                    n += 1;
                }
                if self.sched.is_halted() {
                    break 'run;
                }
            }

            let status = source.poll(&mut self.sched);
            if self.sched.is_halted() {
                break;
            }
            match (self.sched.next_event_time(), status) {
                // The source may have queued something earlier than the
                // deadline we were about to wait for.
                (_, SourceStatus::Activity) => continue,
                (Some(next), _) => {
                    let remaining = next.as_secs() - self.wall_time();
                    if remaining > 0.0 {
                        self.clock.sleep(remaining.min(poll).max(MIN_SLEEP));
                    }
                }
                (None, SourceStatus::Closed) => break,
                (None, SourceStatus::Idle) => self.clock.sleep(poll),
            }
        }

        info!(
            dispatched = n,
            now = %self.sched.clock(),
            drift_warnings = self.drift_warnings,
            "real-time run finished"
        );
        n
    }
}
