//! Thread-safe bounded FIFO input port.
//!
//! Producers (usually [`OutPort`](super::OutPort)s on other task threads)
//! call [`InPort::enqueue`]; the owning task's thread calls
//! [`InPort::receive`]. Producers and the consumer share one [`Condition`],
//! so every state change is broadcast.
//!
//! Queue policy:
//! - `max_queue_size == 0` means unbounded.
//! - Lossy (default): a full queue drops the incoming packet and counts it.
//! - Lossless: a full queue blocks the producer until the consumer takes a
//!   packet. Once the consumer side has been cancelled (task stopped) a full
//!   lossless port drops instead, until the owning task starts again. Ports
//!   of a task that is not running (never started, disabled) drop the same
//!   way.

use crate::pipeline::id::PortId;
use crate::pipeline::packet::DataPacket;
use crate::pipeline::port::{PortDirection, PortSettings};
use crate::sync::{Cancelled, Condition, Mutex};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

struct QueueState {
    queue: VecDeque<DataPacket>,
    max_queue_size: usize,
    lossless: bool,
    silent: bool,
    /// False while the owning task's run loop is not consuming.
    receiving: bool,
    dropped_packets: u64,
    drop_streak: u64,
    id: PortId,
}

/// Input port of a stream task.
pub struct InPort {
    state: Mutex<QueueState>,
    condition: Condition,
}

impl InPort {
    /// Unbounded, lossy, unassigned port.
    pub fn new() -> Self {
        Self::with_settings(&PortSettings::unbounded())
    }

    pub fn with_settings(settings: &PortSettings) -> Self {
        Self {
            state: Mutex::new(QueueState {
                queue: VecDeque::new(),
                max_queue_size: settings.buffer_size,
                lossless: settings.lossless,
                silent: settings.silent,
                receiving: true,
                dropped_packets: 0,
                drop_streak: 0,
                id: PortId::unassigned(PortDirection::Input),
            }),
            condition: Condition::new(),
        }
    }

    pub fn id(&self) -> PortId {
        self.state.lock().id.clone()
    }

    pub(crate) fn set_id(&self, id: PortId) {
        self.state.lock().id = id;
    }

    /// Apply queue policy.
    pub fn apply_settings(&self, settings: &PortSettings) {
        let mut state = self.state.lock();
        state.max_queue_size = settings.buffer_size;
        state.lossless = settings.lossless;
        state.silent = settings.silent;
        drop(state);
        // Capacity may have grown; release blocked producers.
        self.condition.broadcast();
    }

    /// Mark whether a consumer is draining this port.
    ///
    /// Arming discards any cancellation left pending from a previous stop.
    /// Disarming releases producers blocked on a full lossless queue; they
    /// drop until the port is armed again.
    pub(crate) fn set_receiving(&self, receiving: bool) {
        let mut state = self.state.lock();
        state.receiving = receiving;
        if receiving {
            self.condition.clear_cancel();
        }
        drop(state);
        self.condition.broadcast();
    }

    pub fn set_max_queue_size(&self, size: usize) {
        self.state.lock().max_queue_size = size;
        self.condition.broadcast();
    }

    pub fn max_queue_size(&self) -> usize {
        self.state.lock().max_queue_size
    }

    pub fn set_lossless(&self, lossless: bool) {
        self.state.lock().lossless = lossless;
        self.condition.broadcast();
    }

    pub fn is_lossless(&self) -> bool {
        self.state.lock().lossless
    }

    pub fn set_silent(&self, silent: bool) {
        self.state.lock().silent = silent;
    }

    pub fn is_silent(&self) -> bool {
        self.state.lock().silent
    }

    /// Packets currently queued.
    pub fn len(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().queue.is_empty()
    }

    pub fn not_empty(&self) -> bool {
        !self.is_empty()
    }

    /// Packets discarded because the queue was full.
    pub fn dropped_packets(&self) -> u64 {
        self.state.lock().dropped_packets
    }

    /// Hand a packet to this port. Ownership transfers to the port.
    ///
    /// On a full lossless queue this blocks until space frees up or the
    /// consumer is cancelled. On a full lossy queue the packet is dropped.
    pub fn enqueue(&self, packet: DataPacket) {
        let mut state = self.state.lock();

        while state.lossless
            && state.receiving
            && state.max_queue_size > 0
            && state.queue.len() >= state.max_queue_size
        {
            self.condition.wait_uncancellable(&mut state);
        }

        if state.max_queue_size == 0 || state.queue.len() < state.max_queue_size {
            state.queue.push_back(packet);
            state.drop_streak = 0;
        } else {
            if !state.silent {
                if state.drop_streak == 0 {
                    tracing::warn!(
                        "{}: maximal queue size ({}) reached, discarding packets",
                        state.id,
                        state.max_queue_size
                    );
                } else if state.drop_streak % state.max_queue_size as u64 == 0 {
                    tracing::warn!(
                        "{}: still full, {} packets discarded in a row",
                        state.id,
                        state.drop_streak
                    );
                }
            }
            state.drop_streak += 1;
            state.dropped_packets += 1;
            drop(packet);
        }

        drop(state);
        self.condition.broadcast();
    }

    /// Take the oldest packet.
    ///
    /// With a zero `timeout` this blocks until a packet arrives. Otherwise it
    /// waits at most once for up to `timeout` and returns `Ok(None)` if the
    /// queue is still empty. Returns `Err(Cancelled)` when
    /// [`cancel_receive`](Self::cancel_receive) aborts the wait.
    pub fn receive(&self, timeout: Duration) -> Result<Option<DataPacket>, Cancelled> {
        let mut state = self.state.lock();

        if timeout.is_zero() {
            while state.queue.is_empty() {
                self.condition.wait(&mut state, None)?;
            }
        } else if state.queue.is_empty() {
            self.condition.wait(&mut state, Some(Instant::now() + timeout))?;
        }

        let packet = state.queue.pop_front();
        drop(state);
        self.condition.broadcast();
        Ok(packet)
    }

    /// Abort the consumer's current (or next) blocking receive.
    ///
    /// Also releases producers blocked on a full lossless queue; until the
    /// task starts again they drop instead of blocking.
    pub fn cancel_receive(&self) {
        let (id, queued, dropped) = {
            let mut state = self.state.lock();
            state.receiving = false;
            self.condition.cancel();
            (state.id.clone(), state.queue.len(), state.dropped_packets)
        };
        tracing::debug!(
            "{}: receive cancelled ({} packets left in queue, {} dropped)",
            id,
            queued,
            dropped
        );
    }
}

impl Default for InPort {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("InPort")
            .field("id", &state.id)
            .field("queued", &state.queue.len())
            .field("max_queue_size", &state.max_queue_size)
            .field("lossless", &state.lossless)
            .field("dropped_packets", &state.dropped_packets)
            .finish()
    }
}
