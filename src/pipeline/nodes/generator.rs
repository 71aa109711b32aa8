//! Generator task: periodic synthetic packets on out0.

use crate::pipeline::error::TaskResult;
use crate::pipeline::node::{TaskContext, TaskLogic};
use crate::pipeline::value::Value;
use std::time::Duration;

/// Emits one packet per period with two channels, the sequence number (int,
/// wrapping past `i32::MAX`) and a sine wave sample (float), followed by any
/// configured extra channels.
///
/// With a limit, the last packet is flagged `end_of_stream` and the run loop
/// ends on its own.
#[derive(Debug, Clone)]
pub struct GeneratorTask {
    period: Duration,
    limit: Option<u64>,
    stream_id: Option<u32>,
    phase_step: f32,
    extra_channels: Vec<Value>,
}

impl GeneratorTask {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            limit: None,
            stream_id: None,
            phase_step: 0.1,
            extra_channels: Vec::new(),
        }
    }

    /// Stop after `count` packets.
    pub fn with_limit(mut self, count: u64) -> Self {
        self.limit = Some(count);
        self
    }

    pub fn with_stream_id(mut self, id: u32) -> Self {
        self.stream_id = Some(id);
        self
    }

    /// Constant channels appended after the two generated ones.
    pub fn with_extra_channels(mut self, channels: impl IntoIterator<Item = Value>) -> Self {
        self.extra_channels.extend(channels);
        self
    }

    /// Phase advance of the sine channel per packet, in radians.
    pub fn with_phase_step(mut self, step: f32) -> Self {
        self.phase_step = step;
        self
    }
}

impl TaskLogic for GeneratorTask {
    fn run(&self, ctx: &TaskContext) -> TaskResult<()> {
        let mut seq = 0u64;
        while ctx.should_run() {
            if self.limit.is_some_and(|n| seq >= n) {
                break;
            }

            let mut packet = ctx.next_packet();
            packet.seq_nr = seq;
            if let Some(id) = self.stream_id {
                packet.set_stream_id(i64::from(id));
            }
            packet.push_channel(Value::int(counter_value(seq)));
            packet.push_channel(Value::float((seq as f32 * self.phase_step).sin()));
            for v in &self.extra_channels {
                packet.push_channel(*v);
            }
            packet.end_of_stream = self.limit.is_some_and(|n| seq + 1 >= n);
            ctx.send(0, packet);

            seq += 1;
            if ctx.sleep(self.period).is_err() {
                break;
            }
        }
        tracing::debug!("{}: generated {} packets", ctx.id(), seq);
        Ok(())
    }
}

/// Counter channel for sequence number `seq`: the low 32 bits as a
/// two's-complement `i32`, so it wraps from `i32::MAX` to `i32::MIN` like
/// the int cells' own arithmetic.
fn counter_value(seq: u64) -> i32 {
    seq as u32 as i32
}
