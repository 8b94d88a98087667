//! Structured error types for tempus.
//!
//! Only *recoverable* failures are reported through `TempusError`: a
//! scripted command naming an unknown event, an absolute time that has
//! already passed, a bad configuration value. Caller-contract violations
//! on the hot path (double scheduling, cancelling an event that is not
//! queued, negative delays) panic instead, because once causality is
//! broken there is nothing a caller could do to repair it.

use crate::event::EventId;
use crate::time::SimTime;

/// The top-level error type for the tempus scheduling core.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TempusError {
    // ── Scheduling errors ─────────────────────────────────

    /// An absolute fire time earlier than the current clock was requested.
    #[error("cannot schedule event at {requested} when current time is {now}")]
    ScheduleInPast {
        /// The requested absolute time.
        requested: SimTime,
        /// The scheduler clock at the time of the request.
        now: SimTime,
    },

    /// No queued event carries this identifier.
    #[error("no queued event with id {0}")]
    UnknownEvent(EventId),

    // ── Configuration errors ──────────────────────────────

    /// A discipline name did not match any known queue discipline.
    #[error("unknown scheduler discipline {0:?} (expected list, heap, calendar or realtime)")]
    UnknownDiscipline(String),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience alias for `Result<T, TempusError>`.
pub type TempusResult<T> = Result<T, TempusError>;
