//! Construction-time configuration.
//!
//! Which queue discipline a scheduler uses is fixed when it is built.
//! Everything here is a plain struct with `Default` plus `with_*`
//! builder methods, so a front-end can start from the defaults and
//! override only what it parses.

use std::str::FromStr;
use std::time::Duration;

use crate::discipline::DisciplineKind;
use crate::error::{TempusError, TempusResult};

// ── Calendar queue tuning ─────────────────────────────────────────────

/// Tuning knobs for the calendar-queue discipline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct CalendarConfig {
    /// Bucket count before the first resize. Rounded up to a power of two.
    pub initial_buckets: usize,
    /// Bucket width (seconds) before the first resize, and the width
    /// used whenever fewer than two events are queued at a resize.
    pub initial_width: f64,
    /// Widths never shrink below `(now + 1) * min_width_factor`.
    pub min_width_factor: f64,
    /// Upper bound on events sampled to estimate a new width.
    pub max_samples: usize,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            initial_buckets: 2,
            initial_width: 1.0,
            min_width_factor: 1.0e-6,
            max_samples: 25,
        }
    }
}

impl CalendarConfig {
    /// Sets the initial bucket count.
    pub fn with_initial_buckets(mut self, buckets: usize) -> Self {
        self.initial_buckets = buckets;
        self
    }

    /// Sets the initial bucket width.
    pub fn with_initial_width(mut self, width: f64) -> Self {
        self.initial_width = width;
        self
    }

    /// Sets the width sample size cap.
    pub fn with_max_samples(mut self, samples: usize) -> Self {
        self.max_samples = samples;
        self
    }

    /// Check every field is in range.
    pub fn validate(&self) -> TempusResult<()> {
        if self.initial_buckets < 2 {
            return Err(TempusError::InvalidConfig(format!(
                "calendar needs at least 2 buckets, got {}",
                self.initial_buckets
            )));
        }
        if !(self.initial_width.is_finite() && self.initial_width > 0.0) {
            return Err(TempusError::InvalidConfig(format!(
                "calendar bucket width must be positive, got {}",
                self.initial_width
            )));
        }
        if !(self.min_width_factor.is_finite() && self.min_width_factor > 0.0) {
            return Err(TempusError::InvalidConfig(format!(
                "calendar minimum width factor must be positive, got {}",
                self.min_width_factor
            )));
        }
        if self.max_samples < 2 {
            return Err(TempusError::InvalidConfig(format!(
                "calendar width estimate needs at least 2 samples, got {}",
                self.max_samples
            )));
        }
        Ok(())
    }
}

// ── Scheduler ─────────────────────────────────────────────────────────

/// Configuration for a virtual-time [`Scheduler`](crate::Scheduler).
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SchedulerConfig {
    /// Queue discipline ordering pending events.
    pub discipline: DisciplineKind,
    /// Used only when `discipline` is `Calendar`.
    pub calendar: CalendarConfig,
}

impl SchedulerConfig {
    /// A configuration using `discipline` with default tuning.
    pub fn new(discipline: DisciplineKind) -> Self {
        Self {
            discipline,
            calendar: CalendarConfig::default(),
        }
    }

    /// Sets the calendar tuning.
    pub fn with_calendar(mut self, calendar: CalendarConfig) -> Self {
        self.calendar = calendar;
        self
    }

    /// Check every field is in range.
    pub fn validate(&self) -> TempusResult<()> {
        self.calendar.validate()
    }
}

// ── Real-time ─────────────────────────────────────────────────────────

/// Configuration for the [`RealTimeScheduler`](crate::RealTimeScheduler).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct RealTimeConfig {
    /// Allowed drift (seconds) between wall and virtual time before a
    /// warning is reported.
    pub slop: f64,
    /// Longest single sleep while waiting for the next deadline. External
    /// sources are polled at least this often.
    pub poll_interval: Duration,
    /// Tuning for the underlying calendar queue.
    pub calendar: CalendarConfig,
}

impl Default for RealTimeConfig {
    fn default() -> Self {
        Self {
            slop: 0.010,
            poll_interval: Duration::from_millis(1),
            calendar: CalendarConfig::default(),
        }
    }
}

impl RealTimeConfig {
    /// Sets the allowed drift.
    pub fn with_slop(mut self, slop: f64) -> Self {
        self.slop = slop;
        self
    }

    /// Sets the poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Check every field is in range.
    pub fn validate(&self) -> TempusResult<()> {
        if !(self.slop.is_finite() && self.slop >= 0.0) {
            return Err(TempusError::InvalidConfig(format!(
                "real-time slop must be non-negative, got {}",
                self.slop
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(TempusError::InvalidConfig(
                "real-time poll interval must be non-zero".into(),
            ));
        }
        self.calendar.validate()
    }
}

// ── Scheduler kind ────────────────────────────────────────────────────

/// The recognized scheduler choices, as a front-end names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum SchedulerKind {
    /// Virtual time over an ordered list.
    List,
    /// Virtual time over a binary heap.
    Heap,
    /// Virtual time over an adaptive calendar queue.
    Calendar,
    /// Calendar queue kept in step with the wall clock.
    RealTime,
}

impl SchedulerKind {
    /// The queue discipline backing this kind.
    pub fn discipline(self) -> DisciplineKind {
        match self {
            SchedulerKind::List => DisciplineKind::List,
            SchedulerKind::Heap => DisciplineKind::Heap,
            SchedulerKind::Calendar | SchedulerKind::RealTime => DisciplineKind::Calendar,
        }
    }

    /// Returns `true` for the wall-clock synchronised variant.
    pub fn is_realtime(self) -> bool {
        matches!(self, SchedulerKind::RealTime)
    }
}

impl FromStr for SchedulerKind {
    type Err = TempusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "list" => Ok(SchedulerKind::List),
            "heap" => Ok(SchedulerKind::Heap),
            "calendar" => Ok(SchedulerKind::Calendar),
            "realtime" | "real-time" => Ok(SchedulerKind::RealTime),
            _ => Err(TempusError::UnknownDiscipline(s.to_string())),
        }
    }
}

impl std::fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerKind::RealTime => write!(f, "realtime"),
            other => write!(f, "{}", other.discipline()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SchedulerConfig::default().validate().is_ok());
        assert!(RealTimeConfig::default().validate().is_ok());
        assert_eq!(SchedulerConfig::default().discipline, DisciplineKind::Calendar);
        assert_eq!(RealTimeConfig::default().slop, 0.010);
    }

    #[test]
    fn test_calendar_validation() {
        let bad = CalendarConfig::default().with_initial_buckets(1);
        assert!(matches!(bad.validate(), Err(TempusError::InvalidConfig(_))));

        let bad = CalendarConfig::default().with_initial_width(0.0);
        assert!(bad.validate().is_err());

        let bad = CalendarConfig::default().with_max_samples(1);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_realtime_validation() {
        assert!(RealTimeConfig::default().with_slop(-1.0).validate().is_err());
        assert!(RealTimeConfig::default()
            .with_poll_interval(Duration::ZERO)
            .validate()
            .is_err());
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("list".parse::<SchedulerKind>(), Ok(SchedulerKind::List));
        assert_eq!(" Heap ".parse::<SchedulerKind>(), Ok(SchedulerKind::Heap));
        assert_eq!("CALENDAR".parse::<SchedulerKind>(), Ok(SchedulerKind::Calendar));
        assert_eq!("realtime".parse::<SchedulerKind>(), Ok(SchedulerKind::RealTime));
        assert_eq!(
            "splay".parse::<SchedulerKind>(),
            Err(TempusError::UnknownDiscipline("splay".into()))
        );
    }

    #[test]
    fn test_kind_maps_to_discipline() {
        assert_eq!(SchedulerKind::RealTime.discipline(), DisciplineKind::Calendar);
        assert!(SchedulerKind::RealTime.is_realtime());
        assert!(!SchedulerKind::Heap.is_realtime());
        assert_eq!(SchedulerKind::RealTime.to_string(), "realtime");
        assert_eq!(SchedulerKind::List.to_string(), "list");
    }
}
