//! Queue and link tests.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::error::TempusError;
use crate::net::{Link, LinkConfig, Packet, PacketQueue, PacketSink, RecordingSink};
use crate::scheduler::Scheduler;
use crate::time::SimTime;
use crate::timer::{Expire, Expiry, TimerHandler};

fn pkt(id: u64, size: u32) -> Packet {
    Packet::new(id, size, SimTime::ZERO)
}

fn arrival_times(sink: &Rc<RefCell<RecordingSink>>) -> Vec<f64> {
    sink.borrow()
        .arrivals()
        .iter()
        .map(|(t, _)| t.as_secs())
        .collect()
}

fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-9, "{actual:?} vs {expected:?}");
    }
}

// ── PacketQueue ───────────────────────────────────────────────────────

#[test]
fn test_queue_is_fifo() {
    let mut q = PacketQueue::new();
    assert!(q.is_empty());
    q.enqueue(pkt(1, 100));
    q.enqueue(pkt(2, 200));
    q.enqueue(pkt(3, 300));

    assert_eq!(q.len(), 3);
    assert_eq!(q.byte_length(), 600);
    assert_eq!(q.front().map(|p| p.id), Some(1));
    assert_eq!(q.dequeue().map(|p| p.id), Some(1));
    assert_eq!(q.dequeue().map(|p| p.id), Some(2));
    assert_eq!(q.byte_length(), 300);
    assert_eq!(q.dequeue().map(|p| p.id), Some(3));
    assert_eq!(q.dequeue(), None);
    assert_eq!(q.byte_length(), 0);
}

#[test]
fn test_queue_lookup_and_remove() {
    let mut q = PacketQueue::new();
    for id in 1..=4 {
        q.enqueue(pkt(id, 10 * id as u32));
    }
    assert_eq!(q.lookup(2).map(|p| p.id), Some(3));
    assert_eq!(q.lookup(4), None);

    assert_eq!(q.remove(2).map(|p| p.size_bytes), Some(20));
    assert_eq!(q.remove(2), None);
    assert_eq!(q.byte_length(), 80);
    let ids: Vec<u64> = q.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 3, 4]);
}

// ── Link ──────────────────────────────────────────────────────────────

/// 1000 bytes/s and half a second of propagation: a 100-byte packet
/// takes 0.1 s to send and arrives 0.5 s after that.
fn slow_link(queue_limit: usize) -> Rc<RefCell<Link>> {
    Link::new(LinkConfig::new(8_000.0, 0.5, queue_limit).expect("valid link"))
}

#[test]
fn test_link_config_validation() {
    assert!(matches!(
        LinkConfig::new(0.0, 0.1, 10),
        Err(TempusError::InvalidConfig(_))
    ));
    assert!(LinkConfig::new(1e6, -0.1, 10).is_err());
    assert!(LinkConfig::new(f64::NAN, 0.1, 10).is_err());
    let cfg = LinkConfig::new(1e6, 0.0, 10).expect("valid");
    assert_eq!(cfg.transmission_time(&pkt(1, 125)), 0.001);
}

#[test]
fn test_link_serialises_then_propagates() {
    let mut sched = Scheduler::default();
    let link = slow_link(10);
    let sink = Rc::new(RefCell::new(RecordingSink::new()));
    link.borrow_mut().connect(sink.clone());

    for id in 1..=3 {
        assert!(link.borrow_mut().enqueue(&mut sched, pkt(id, 100)));
    }
    assert!(link.borrow().is_transmitting());
    // One transmit event regardless of queue depth.
    assert_eq!(sched.pending(), 1);

    sched.run();
    assert_close(&arrival_times(&sink), &[0.6, 0.7, 0.8]);
    let ids: Vec<u64> = sink.borrow().arrivals().iter().map(|(_, p)| p.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    let stats = link.borrow().stats();
    assert_eq!((stats.enqueued, stats.transmitted, stats.delivered), (3, 3, 3));
    assert_eq!(link.borrow().in_flight(), 0);
    assert!(link.borrow().queue().is_empty());
}

#[test]
fn test_link_drop_tail() {
    let mut sched = Scheduler::default();
    let link = slow_link(2);
    let sink = Rc::new(RefCell::new(RecordingSink::new()));
    link.borrow_mut().connect(sink.clone());

    let accepted: Vec<bool> = (1..=4)
        .map(|id| link.borrow_mut().enqueue(&mut sched, pkt(id, 100)))
        .collect();
    assert_eq!(accepted, vec![true, true, false, false]);

    sched.run();
    assert_eq!(sink.borrow().len(), 2);
    assert_eq!(link.borrow().stats().dropped, 2);
}

#[test]
fn test_links_chain() {
    let mut sched = Scheduler::new(crate::DisciplineKind::Heap);
    let first = slow_link(10);
    let second = Link::new(LinkConfig::new(80_000.0, 0.25, 10).expect("valid link"));
    let sink = Rc::new(RefCell::new(RecordingSink::new()));
    second.borrow_mut().connect(sink.clone());
    first.borrow_mut().connect(second.clone());

    first.borrow_mut().enqueue(&mut sched, pkt(1, 100));
    sched.run();

    // 0.1 + 0.5 on the first hop, 0.01 + 0.25 on the second.
    assert_close(&arrival_times(&sink), &[0.86]);
    assert_eq!(second.borrow().stats().delivered, 1);
}

/// Sends every packet it receives back into `link`, `bounces` times.
struct Echo {
    link: Weak<RefCell<Link>>,
    arrivals: Vec<f64>,
    bounces: u32,
}

impl PacketSink for Echo {
    fn receive(&mut self, sched: &mut Scheduler, packet: Packet) {
        self.arrivals.push(sched.clock().as_secs());
        if self.bounces == 0 {
            return;
        }
        self.bounces -= 1;
        if let Some(link) = self.link.upgrade() {
            link.borrow_mut().enqueue(sched, packet);
        }
    }
}

#[test]
fn test_sink_can_feed_its_own_link() {
    let mut sched = Scheduler::default();
    let link = slow_link(10);
    let echo = Rc::new(RefCell::new(Echo {
        link: Rc::downgrade(&link),
        arrivals: Vec::new(),
        bounces: 2,
    }));
    link.borrow_mut().connect(echo.clone());

    link.borrow_mut().enqueue(&mut sched, pkt(1, 100));
    sched.run();

    assert_close(&echo.borrow().arrivals, &[0.6, 1.2, 1.8]);
    let stats = link.borrow().stats();
    assert_eq!((stats.enqueued, stats.delivered), (3, 3));
}

/// Offers one packet per expiry until `limit` have been sent.
struct Generator {
    link: Rc<RefCell<Link>>,
    sent: u64,
    limit: u64,
    interval: f64,
}

impl Expire for Generator {
    fn expire(&mut self, ctx: &mut Expiry<'_>) {
        self.sent += 1;
        let packet = Packet::new(self.sent, 100, ctx.now());
        self.link.borrow_mut().enqueue(ctx.scheduler(), packet);
        if self.sent < self.limit {
            ctx.resched(self.interval);
        }
    }
}

#[test]
fn test_link_fed_by_generator() {
    let mut sched = Scheduler::default();
    let link = slow_link(100);
    let sink = Rc::new(RefCell::new(RecordingSink::new()));
    link.borrow_mut().connect(sink.clone());

    // One packet every 0.25 s; the link is idle between them.
    let gen = TimerHandler::new(Generator {
        link: link.clone(),
        sent: 0,
        limit: 4,
        interval: 0.25,
    });
    gen.borrow_mut().sched(&mut sched, 0.0);
    sched.run();

    assert_close(&arrival_times(&sink), &[0.6, 0.85, 1.1, 1.35]);
    let latency = sink.borrow().mean_latency().expect("packets arrived");
    assert!((latency - 0.6).abs() < 1e-9);
    assert_eq!(gen.borrow().inner().sent, 4);
}
