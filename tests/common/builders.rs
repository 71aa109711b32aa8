//! Test data builders for creating packets

use crn_toolbox::{DataPacket, Value};
use std::time::Duration;

/// Builder for creating test packets
pub struct PacketBuilder {
    number: u64,
    seq_nr: u64,
    timestamp: Duration,
    channels: Vec<Value>,
    end_of_stream: bool,
}

impl PacketBuilder {
    pub fn new(number: u64) -> Self {
        Self {
            number,
            seq_nr: number,
            timestamp: Duration::ZERO,
            channels: Vec::new(),
            end_of_stream: false,
        }
    }

    pub fn seq(mut self, seq_nr: u64) -> Self {
        self.seq_nr = seq_nr;
        self
    }

    pub fn timestamp_ms(mut self, ms: u64) -> Self {
        self.timestamp = Duration::from_millis(ms);
        self
    }

    pub fn ints(mut self, values: &[i32]) -> Self {
        self.channels.extend(values.iter().copied().map(Value::int));
        self
    }

    pub fn floats(mut self, values: &[f32]) -> Self {
        self.channels.extend(values.iter().copied().map(Value::float));
        self
    }

    pub fn end_of_stream(mut self) -> Self {
        self.end_of_stream = true;
        self
    }

    pub fn build(self) -> DataPacket {
        let mut packet = DataPacket::new(self.number).with_channels(self.channels);
        packet.seq_nr = self.seq_nr;
        packet.timestamp = self.timestamp;
        packet.end_of_stream = self.end_of_stream;
        packet
    }
}

/// Packets numbered `0..count`, each carrying its number as an int channel
pub fn numbered_packets(count: u64) -> Vec<DataPacket> {
    (0..count)
        .map(|n| PacketBuilder::new(n).ints(&[n as i32]).build())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_builder() {
        let packet = PacketBuilder::new(4)
            .seq(9)
            .ints(&[1, 2])
            .floats(&[0.5])
            .end_of_stream()
            .build();

        assert_eq!(packet.number(), 4);
        assert_eq!(packet.seq_nr, 9);
        assert_eq!(packet.len(), 3);
        assert!(packet.channels()[2].is_float());
        assert!(packet.end_of_stream);
    }
}
