//! Built-in stream tasks.

pub mod channel_select;
pub mod channel_sink;
pub mod encoder_writer;
pub mod generator;
pub mod merge;

pub use channel_select::ChannelSelectTask;
pub use channel_sink::ChannelSinkTask;
pub use encoder_writer::EncoderWriterTask;
pub use generator::GeneratorTask;
pub use merge::MergeTask;

use crate::pipeline::in_port::InPort;
use crate::pipeline::packet::DataPacket;
use std::time::Duration;

/// Block for the next packet on `port`; `None` once the receive is cancelled.
pub(crate) fn receive_next(port: &InPort) -> Option<DataPacket> {
    loop {
        match port.receive(Duration::ZERO) {
            Ok(Some(packet)) => return Some(packet),
            Ok(None) => continue,
            Err(_) => return None,
        }
    }
}
