//! Process-wide toolbox state shared by all tasks of one pipeline.

use crate::pipeline::packet::DataPacket;
use crate::sync::SerialLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared state handed to every task: the packet numbering counter and the
/// serialization lock.
///
/// Tasks that should share one packet numbering sequence must be built with
/// the same context.
#[derive(Debug, Default)]
pub struct ToolboxContext {
    packet_counter: AtomicU64,
    serial: SerialLock,
}

impl ToolboxContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for the common `Arc`-shared case.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Next creation number. Monotonically increasing within this context.
    #[inline]
    pub fn next_packet_number(&self) -> u64 {
        self.packet_counter.fetch_add(1, Ordering::Relaxed)
    }

    /// Number of packets created through this context so far.
    pub fn packets_created(&self) -> u64 {
        self.packet_counter.load(Ordering::Relaxed)
    }

    /// Create an empty packet carrying the next creation number.
    pub fn new_packet(&self) -> DataPacket {
        DataPacket::new(self.next_packet_number())
    }

    pub fn serial_lock(&self) -> &SerialLock {
        &self.serial
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn test_packet_numbers_are_sequential() {
        let ctx = ToolboxContext::new();
        let a = ctx.new_packet();
        let b = ctx.new_packet();
        assert_eq!(a.number(), 0);
        assert_eq!(b.number(), 1);
        assert_eq!(ctx.packets_created(), 2);
    }

    #[test]
    fn test_packet_numbers_unique_across_threads() {
        let ctx = ToolboxContext::shared();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ctx = Arc::clone(&ctx);
                thread::spawn(move || {
                    (0..250)
                        .map(|_| ctx.next_packet_number())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for h in handles {
            for n in h.join().unwrap() {
                assert!(seen.insert(n), "duplicate packet number {}", n);
            }
        }
        assert_eq!(seen.len(), 1000);
    }
}
