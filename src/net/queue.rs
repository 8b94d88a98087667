//! FIFO packet queue.

use std::collections::VecDeque;

use super::packet::Packet;

/// Strict FIFO of packets with O(1) enqueue, dequeue and length, plus a
/// running byte count.
#[derive(Debug, Default, Clone)]
pub struct PacketQueue {
    packets: VecDeque<Packet>,
    bytes: u64,
}

impl PacketQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append at the tail.
    pub fn enqueue(&mut self, packet: Packet) {
        self.bytes += u64::from(packet.size_bytes);
        self.packets.push_back(packet);
    }

    /// Take from the head.
    pub fn dequeue(&mut self) -> Option<Packet> {
        let packet = self.packets.pop_front()?;
        self.bytes -= u64::from(packet.size_bytes);
        Some(packet)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.packets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Total bytes queued.
    #[inline]
    pub fn byte_length(&self) -> u64 {
        self.bytes
    }

    pub fn front(&self) -> Option<&Packet> {
        self.packets.front()
    }

    /// The `n`th packet from the head, zero-based.
    pub fn lookup(&self, n: usize) -> Option<&Packet> {
        self.packets.get(n)
    }

    /// Pull the packet with this id out of the middle of the queue.
    pub fn remove(&mut self, id: u64) -> Option<Packet> {
        let pos = self.packets.iter().position(|p| p.id == id)?;
        let packet = self.packets.remove(pos)?;
        self.bytes -= u64::from(packet.size_bytes);
        Some(packet)
    }

    /// Packets from head to tail.
    pub fn iter(&self) -> impl Iterator<Item = &Packet> {
        self.packets.iter()
    }
}
