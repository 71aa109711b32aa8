//! Merge task: joins one packet from each input into a single packet.

use crate::pipeline::error::{TaskError, TaskResult};
use crate::pipeline::node::{TaskContext, TaskLogic};
use crate::pipeline::nodes::receive_next;
use crate::pipeline::port::PortDirection;

/// Waits for one packet on every input port (in port order), appends the
/// contents of in1..inN to the packet from in0, and sends it on out0.
///
/// The merged packet keeps in0's metadata; it is flagged `end_of_stream`
/// if any of the inputs was.
#[derive(Debug, Clone, Default)]
pub struct MergeTask;

impl MergeTask {
    pub fn new() -> Self {
        Self
    }
}

impl TaskLogic for MergeTask {
    fn run(&self, ctx: &TaskContext) -> TaskResult<()> {
        let Some((first, rest)) = ctx.in_ports().split_first() else {
            return Err(TaskError::MissingPort {
                direction: PortDirection::Input,
                index: 0,
            });
        };

        'merge: while ctx.should_run() {
            let Some(mut merged) = receive_next(first) else {
                break;
            };
            for port in rest {
                let Some(mut packet) = receive_next(port) else {
                    break 'merge;
                };
                merged.end_of_stream |= packet.end_of_stream;
                merged.append_content_of(&mut packet);
            }
            ctx.send(0, merged);
        }
        Ok(())
    }
}
