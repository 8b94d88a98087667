//! A point-to-point link with finite bandwidth and propagation delay.
//!
//! Two events drive the link. The transmit event fires when the packet
//! at the head of the transmit queue has been fully serialised onto the
//! wire; the arrival event fires when the oldest packet in flight reaches
//! the far end. Each is scheduled only when it is not already pending.
//!
//! Arrived packets reach the downstream sink through a third, zero-delay
//! event owned by a separate handler. The link is therefore not borrowed
//! while the sink runs, and a sink may send straight back into the link
//! that fed it.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use super::packet::Packet;
use super::queue::PacketQueue;
use super::sink::PacketSink;
use crate::error::{TempusError, TempusResult};
use crate::event::Event;
use crate::handler::{Handler, HandlerRef};
use crate::scheduler::Scheduler;
use crate::time::SimTime;

// ── Config ────────────────────────────────────────────────────────────

/// Physical parameters of a link.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkConfig {
    /// Bits per second.
    pub bandwidth_bps: f64,
    /// One-way propagation delay in seconds.
    pub delay: f64,
    /// Most packets held in the transmit queue; later ones are dropped.
    pub queue_limit: usize,
}

impl LinkConfig {
    pub fn new(bandwidth_bps: f64, delay: f64, queue_limit: usize) -> TempusResult<Self> {
        if !(bandwidth_bps.is_finite() && bandwidth_bps > 0.0) {
            return Err(TempusError::InvalidConfig(format!(
                "link bandwidth must be positive, got {}",
                bandwidth_bps
            )));
        }
        if !(delay.is_finite() && delay >= 0.0) {
            return Err(TempusError::InvalidConfig(format!(
                "link delay must be non-negative, got {}",
                delay
            )));
        }
        Ok(LinkConfig {
            bandwidth_bps,
            delay,
            queue_limit,
        })
    }

    /// Seconds to put `packet` on the wire.
    #[inline]
    pub fn transmission_time(&self, packet: &Packet) -> f64 {
        packet.bits() / self.bandwidth_bps
    }
}

/// Per-link packet counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkStats {
    pub enqueued: u64,
    pub transmitted: u64,
    pub delivered: u64,
    pub dropped: u64,
}

// ── Link ──────────────────────────────────────────────────────────────

/// A drop-tail link. Acts as both a [`Handler`] for its own two events
/// and a [`PacketSink`], so links can be chained.
pub struct Link {
    me: HandlerRef,
    config: LinkConfig,
    tx_queue: PacketQueue,
    /// Packets on the wire, with their arrival times, oldest first.
    in_flight: VecDeque<(SimTime, Packet)>,
    tx_event: Event,
    arrival_event: Event,
    downstream: Option<Rc<RefCell<Delivery>>>,
    stats: LinkStats,
}

/// Arrived packets waiting to be handed to the sink.
struct Delivery {
    sink: Rc<RefCell<dyn PacketSink>>,
    ready: VecDeque<Packet>,
    event: Event,
}

impl Handler for Delivery {
    fn handle(&mut self, sched: &mut Scheduler, _event: &Event) {
        while let Some(packet) = self.ready.pop_front() {
            self.sink.borrow_mut().receive(sched, packet);
        }
    }
}

impl Link {
    pub fn new(config: LinkConfig) -> Rc<RefCell<Link>> {
        Rc::new_cyclic(|me: &Weak<RefCell<Link>>| {
            let me: HandlerRef = me.clone();
            RefCell::new(Link {
                me,
                config,
                tx_queue: PacketQueue::new(),
                in_flight: VecDeque::new(),
                tx_event: Event::new(),
                arrival_event: Event::new(),
                downstream: None,
                stats: LinkStats::default(),
            })
        })
    }

    /// Deliver arriving packets to `sink`.
    pub fn connect<S: PacketSink + 'static>(&mut self, sink: Rc<RefCell<S>>) {
        let sink: Rc<RefCell<dyn PacketSink>> = sink;
        self.downstream = Some(Rc::new(RefCell::new(Delivery {
            sink,
            ready: VecDeque::new(),
            event: Event::new(),
        })));
    }

    /// Offer a packet for transmission. Returns `false` if the transmit
    /// queue was full and the packet was dropped.
    pub fn enqueue(&mut self, sched: &mut Scheduler, packet: Packet) -> bool {
        if self.tx_queue.len() >= self.config.queue_limit {
            self.stats.dropped += 1;
            debug!(packet = %packet, now = %sched.clock(), "link queue full, dropping");
            return false;
        }
        self.tx_queue.enqueue(packet);
        self.stats.enqueued += 1;
        if !self.tx_event.is_queued() {
            self.start_transmission(sched);
        }
        true
    }

    fn start_transmission(&mut self, sched: &mut Scheduler) {
        if let Some(head) = self.tx_queue.front() {
            let tx = self.config.transmission_time(head);
            sched.schedule_ref(self.me.clone(), &self.tx_event, tx);
        }
    }

    fn on_transmitted(&mut self, sched: &mut Scheduler) {
        let Some(packet) = self.tx_queue.dequeue() else {
            return;
        };
        self.stats.transmitted += 1;
        let arrival = sched.clock().after(self.config.delay);
        trace!(packet = %packet, arrival = %arrival, "transmitted");
        self.in_flight.push_back((arrival, packet));
        if !self.arrival_event.is_queued() {
            sched.schedule_ref(self.me.clone(), &self.arrival_event, self.config.delay);
        }
        self.start_transmission(sched);
    }

    fn on_arrival(&mut self, sched: &mut Scheduler) {
        let Some((_, packet)) = self.in_flight.pop_front() else {
            return;
        };
        self.stats.delivered += 1;
        if let Some(delivery) = &self.downstream {
            let mut out = delivery.borrow_mut();
            out.ready.push_back(packet);
            if !out.event.is_queued() {
                sched.schedule(delivery, &out.event, 0.0);
            }
        }
        if let Some(&(next, _)) = self.in_flight.front() {
            // Completions are FIFO and the delay is constant, so arrivals
            // are already in time order.
            if let Err(e) = sched.schedule_at_ref(self.me.clone(), &self.arrival_event, next) {
                panic!("link arrivals out of order: {}", e);
            }
        }
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Packets waiting for (or in) transmission.
    pub fn queue(&self) -> &PacketQueue {
        &self.tx_queue
    }

    /// Packets on the wire.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Returns `true` while a packet is being serialised.
    pub fn is_transmitting(&self) -> bool {
        self.tx_event.is_queued()
    }
}

impl Handler for Link {
    fn handle(&mut self, sched: &mut Scheduler, event: &Event) {
        if event.same_as(&self.tx_event) {
            self.on_transmitted(sched);
        } else if event.same_as(&self.arrival_event) {
            self.on_arrival(sched);
        }
    }
}

impl PacketSink for Link {
    fn receive(&mut self, sched: &mut Scheduler, packet: Packet) {
        self.enqueue(sched, packet);
    }
}

impl std::fmt::Debug for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link")
            .field("config", &self.config)
            .field("queued", &self.tx_queue.len())
            .field("in_flight", &self.in_flight.len())
            .field("stats", &self.stats)
            .finish()
    }
}
