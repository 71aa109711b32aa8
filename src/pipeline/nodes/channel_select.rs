//! Channel selection: forwards packets narrowed to a channel subset.

use crate::pipeline::error::TaskResult;
use crate::pipeline::node::{TaskContext, TaskLogic};
use crate::pipeline::nodes::receive_next;

/// Keeps the listed channels (in list order) of every packet from in0 and
/// sends the result on out0.
#[derive(Debug, Clone)]
pub struct ChannelSelectTask {
    channels: Vec<usize>,
}

impl ChannelSelectTask {
    pub fn new(channels: Vec<usize>) -> Self {
        Self { channels }
    }

    pub fn channels(&self) -> &[usize] {
        &self.channels
    }
}

impl TaskLogic for ChannelSelectTask {
    fn run(&self, ctx: &TaskContext) -> TaskResult<()> {
        let port = ctx.in_port(0)?;
        while ctx.should_run() {
            let Some(mut packet) = receive_next(port) else {
                break;
            };
            packet.narrow_data(&self.channels);
            ctx.send(0, packet);
        }
        Ok(())
    }
}
