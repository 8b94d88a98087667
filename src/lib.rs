//! # Tempus — Discrete-Event Scheduling Core
//!
//! The virtual-time engine under a packet-level network simulator. It
//! orders, dispatches and cancels timed callbacks; every protocol
//! behaviour above it (retransmission timeouts, link serialisation,
//! periodic beacons) is a scheduled event against one [`Scheduler`].
//! Single-threaded and cooperative: each handler runs to completion
//! before the clock moves again.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────┐
//! │  Link / TimerHandler / user Handlers   │ ← protocol code
//! │  ┌─────────────────────────────────┐  │
//! │  │ RealTimeScheduler (optional)     │  │ ← wall-clock pacing
//! │  │  ┌───────────────────────────┐  │  │
//! │  │  │ Scheduler                  │  │  │ ← clock, run / halt
//! │  │  │  ┌─────────┐ ┌──────────┐ │  │  │
//! │  │  │  │Discipline│ │  Arena   │ │  │  │ ← list / heap / calendar
//! │  │  │  └─────────┘ └──────────┘ │  │  │   + pending entries
//! │  │  └───────────────────────────┘  │  │
//! │  └─────────────────────────────────┘  │
//! └───────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use tempus::{handler_fn, DisciplineKind, Event, Scheduler};
//!
//! let mut sched = Scheduler::new(DisciplineKind::Calendar);
//! let hello = handler_fn(|s: &mut Scheduler, _e: &Event| {
//!     assert_eq!(s.clock().as_secs(), 1.5);
//! });
//! let ev = Event::new();
//! sched.schedule(&hello, &ev, 1.5);
//! assert_eq!(sched.run(), 1);
//! ```

pub mod arena;
pub mod config;
pub mod discipline;
pub mod error;
pub mod event;
pub mod handler;
pub mod net;
pub mod realtime;
pub mod scheduler;
pub mod time;
pub mod timer;


// Re-exports for convenience.
pub use config::{CalendarConfig, RealTimeConfig, SchedulerConfig, SchedulerKind};
pub use discipline::{CalendarStats, DisciplineKind, QueueDiscipline};
pub use error::{TempusError, TempusResult};
pub use event::{Event, EventId, EventInfo, EventState};
pub use handler::{handler_fn, handler_ref, Handler, HandlerRef};
pub use net::{Link, LinkConfig, LinkStats, Packet, PacketQueue, PacketSink, RecordingSink};
pub use realtime::{
    ExternalSource, ManualClock, NoSource, RealTimeScheduler, SourceStatus, SystemClock,
    WallClock,
};
pub use scheduler::{Scheduler, SchedulerStats};
pub use time::SimTime;
pub use timer::{Expire, Expiry, Periodic, TimerHandler, TimerStatus};
