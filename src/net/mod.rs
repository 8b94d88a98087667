//! Packet queues and delay links.
//!
//! The representative consumer of the scheduler: protocol code pushes
//! packets into a [`Link`], and the link drains them with two scheduled
//! events, one for transmission completion and one for arrival at the far
//! end. Arrivals reach the sink from a zero-delay event of their own.
//! Nothing here needs more from the scheduler than `schedule` and `clock`.
//!
//! # Module structure
//!
//! | Sub-module | Contents |
//! |---|---|
//! | [`packet`] | [`Packet`] |
//! | [`queue`] | [`PacketQueue`] FIFO |
//! | [`sink`] | [`PacketSink`] trait, [`RecordingSink`] |
//! | [`link`] | [`Link`], [`LinkConfig`], [`LinkStats`] |

pub mod link;
pub mod packet;
pub mod queue;
pub mod sink;

#[cfg(test)]
mod tests;

pub use link::{Link, LinkConfig, LinkStats};
pub use packet::Packet;
pub use queue::PacketQueue;
pub use sink::{PacketSink, RecordingSink};
