//! The dispatch target of every event.
//!
//! A handler is any object that reacts to an event firing. The scheduler
//! holds handlers weakly: whoever built the handler owns it, usually as an
//! `Rc<RefCell<_>>` shared with the rest of the simulated topology, and the
//! scheduler only upgrades its reference at dispatch time.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::event::Event;
use crate::scheduler::Scheduler;

/// User-defined event handler.
///
/// `handle` receives the scheduler by `&mut`, so it can read the clock,
/// schedule follow-up events (including re-scheduling `event` itself,
/// which is no longer queued), cancel others, or halt the run.
pub trait Handler {
    /// Called once each time an event bound to this handler fires.
    fn handle(&mut self, sched: &mut Scheduler, event: &Event);
}

/// A handler backed by a closure. Useful for tests and one-off scripts.
impl<F> Handler for F
where
    F: FnMut(&mut Scheduler, &Event),
{
    fn handle(&mut self, sched: &mut Scheduler, event: &Event) {
        (self)(sched, event);
    }
}

/// The scheduler's non-owning reference to a handler.
pub type HandlerRef = Weak<RefCell<dyn Handler>>;

/// Erase a concrete handler into a [`HandlerRef`].
pub fn handler_ref<H: Handler + 'static>(handler: &Rc<RefCell<H>>) -> HandlerRef {
    let erased: Rc<RefCell<dyn Handler>> = handler.clone();
    Rc::downgrade(&erased)
}

/// Wrap a closure as a shareable handler.
///
/// Pins down the closure's argument types so callers do not have to
/// annotate them.
pub fn handler_fn<F>(f: F) -> Rc<RefCell<F>>
where
    F: FnMut(&mut Scheduler, &Event) + 'static,
{
    Rc::new(RefCell::new(f))
}
