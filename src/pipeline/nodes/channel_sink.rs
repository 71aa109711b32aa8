//! Channel sink: hands packets from in0 to a crossbeam channel.

use crate::pipeline::error::TaskResult;
use crate::pipeline::node::{TaskContext, TaskLogic};
use crate::pipeline::nodes::receive_next;
use crate::pipeline::packet::DataPacket;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicU64, Ordering};

/// Forwards every packet from in0 into a `crossbeam_channel::Sender`.
///
/// On a bounded channel the send can block; `stop()` interrupts it through
/// [`TaskLogic::cancel_blocking_calls`]. The run loop ends by itself once the
/// receiving side of the channel is dropped.
pub struct ChannelSinkTask {
    tx: Sender<DataPacket>,
    cancel_tx: Sender<()>,
    cancel_rx: Receiver<()>,
    forwarded: AtomicU64,
}

impl ChannelSinkTask {
    pub fn new(tx: Sender<DataPacket>) -> Self {
        let (cancel_tx, cancel_rx) = bounded(1);
        Self {
            tx,
            cancel_tx,
            cancel_rx,
            forwarded: AtomicU64::new(0),
        }
    }

    /// Packets delivered to the channel so far.
    pub fn forwarded(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }
}

impl TaskLogic for ChannelSinkTask {
    fn run(&self, ctx: &TaskContext) -> TaskResult<()> {
        // Drop a cancel token left over from the previous stop.
        while self.cancel_rx.try_recv().is_ok() {}

        let port = ctx.in_port(0)?;
        while ctx.should_run() {
            let Some(packet) = receive_next(port) else {
                break;
            };
            crossbeam_channel::select! {
                send(self.tx, packet) -> res => {
                    if res.is_err() {
                        tracing::debug!("{}: channel receiver dropped, stopping", ctx.id());
                        break;
                    }
                    self.forwarded.fetch_add(1, Ordering::Relaxed);
                }
                recv(self.cancel_rx) -> _ => break,
            }
        }
        Ok(())
    }

    fn cancel_blocking_calls(&self) {
        let _ = self.cancel_tx.try_send(());
    }
}
