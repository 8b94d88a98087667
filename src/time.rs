//! Virtual time for the event scheduler.
//!
//! Represents a point on the simulation's clock, in seconds. Time
//! advances only when the scheduler dispatches events (or, for the
//! real-time variant, when it syncs to the wall clock).

use std::cmp::Ordering;

/// A point in simulated time, in seconds.
///
/// Wraps an `f64` that is guaranteed finite and non-negative, which makes
/// a total order sound: `SimTime` implements `Ord` and can key heaps and
/// sorted buckets directly.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(f64);

impl SimTime {
    /// The zero-point of simulation time.
    pub const ZERO: SimTime = SimTime(0.0);

    /// Create a `SimTime` from seconds.
    ///
    /// # Panics
    /// Panics if `secs` is NaN, infinite, or negative.
    #[inline]
    pub fn new(secs: f64) -> Self {
        assert!(
            secs.is_finite() && secs >= 0.0,
            "virtual time must be finite and non-negative, got {}",
            secs
        );
        // Normalise -0.0 so `Ord` agrees with `PartialEq`.
        SimTime(secs + 0.0)
    }

    /// Return the raw value in seconds.
    #[inline]
    pub fn as_secs(self) -> f64 {
        self.0
    }

    /// The absolute time that is `delay` seconds after `self`.
    ///
    /// # Panics
    /// Panics if `delay` is negative or not finite. A negative delay
    /// would put an event in the past.
    #[inline]
    pub fn after(self, delay: f64) -> SimTime {
        assert!(
            delay.is_finite() && delay >= 0.0,
            "cannot schedule with negative or non-finite delay {} at {}",
            delay,
            self
        );
        SimTime::new(self.0 + delay)
    }

    /// Seconds between `earlier` and `self`, or `None` if `earlier` is later.
    #[inline]
    pub fn duration_since(self, earlier: SimTime) -> Option<f64> {
        if earlier.0 <= self.0 {
            Some(self.0 - earlier.0)
        } else {
            None
        }
    }

    /// Returns `true` if `self` is strictly before `other`.
    #[inline]
    pub fn is_before(self, other: SimTime) -> bool {
        self.0 < other.0
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl From<SimTime> for f64 {
    fn from(t: SimTime) -> f64 {
        t.0
    }
}

impl std::fmt::Display for SimTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T={}", self.0)
    }
}
