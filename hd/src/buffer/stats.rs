//! Buffer statistics

use serde::Serialize;

/// Counters maintained under the buffer lock
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct BufferStats {
    /// Work items appended
    pub items_put: u64,
    /// Termination tokens appended (emitted and forwarded)
    pub terminations_put: u64,
    /// Work items removed
    pub items_got: u64,
    /// Termination tokens removed
    pub terminations_got: u64,
    /// Highest length observed after an append
    pub peak_len: usize,
    /// Times a put found the buffer full and had to wait
    pub put_waits: u64,
    /// Times a get found the buffer empty and had to wait
    pub get_waits: u64,
    /// Bounded puts that gave up
    pub put_timeouts: u64,
    /// Bounded gets that gave up
    pub get_timeouts: u64,
}

impl BufferStats {
    /// Slots currently held, derived from the put/get counters
    pub fn in_flight(&self) -> u64 {
        (self.items_put + self.terminations_put).saturating_sub(self.items_got + self.terminations_got)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_flight() {
        let stats = BufferStats {
            items_put: 10,
            terminations_put: 2,
            items_got: 9,
            terminations_got: 1,
            ..Default::default()
        };
        assert_eq!(stats.in_flight(), 2);
    }

    #[test]
    fn test_default_is_zeroed() {
        let stats = BufferStats::default();
        assert_eq!(stats.in_flight(), 0);
        assert_eq!(stats.peak_len, 0);
    }
}
