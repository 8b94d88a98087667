//! Where a link delivers packets.

use super::packet::Packet;
use crate::scheduler::Scheduler;
use crate::time::SimTime;

/// The downstream side of a link.
pub trait PacketSink {
    /// Take delivery of `packet` at `sched.clock()`.
    fn receive(&mut self, sched: &mut Scheduler, packet: Packet);
}

/// A sink that keeps every packet it receives along with its arrival time.
#[derive(Debug, Default)]
pub struct RecordingSink {
    arrivals: Vec<(SimTime, Packet)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arrivals(&self) -> &[(SimTime, Packet)] {
        &self.arrivals
    }

    pub fn len(&self) -> usize {
        self.arrivals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrivals.is_empty()
    }

    /// Mean time from creation to arrival.
    pub fn mean_latency(&self) -> Option<f64> {
        if self.arrivals.is_empty() {
            return None;
        }
        let total: f64 = self
            .arrivals
            .iter()
            .map(|(at, p)| at.duration_since(p.created).unwrap_or(0.0))
            .sum();
        Some(total / self.arrivals.len() as f64)
    }
}

impl PacketSink for RecordingSink {
    fn receive(&mut self, sched: &mut Scheduler, packet: Packet) {
        self.arrivals.push((sched.clock(), packet));
    }
}
