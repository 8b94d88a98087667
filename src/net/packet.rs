use crate::time::SimTime;

/// A simulated packet: just enough to compute transmission delay and
/// follow it through a queue.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Packet {
    pub id: u64,
    pub size_bytes: u32,
    /// When the packet was generated.
    pub created: SimTime,
}

impl Packet {
    pub fn new(id: u64, size_bytes: u32, created: SimTime) -> Self {
        Packet {
            id,
            size_bytes,
            created,
        }
    }

    /// Size in bits.
    #[inline]
    pub fn bits(&self) -> f64 {
        f64::from(self.size_bytes) * 8.0
    }
}

impl std::fmt::Display for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P#{} ({}B)", self.id, self.size_bytes)
    }
}
