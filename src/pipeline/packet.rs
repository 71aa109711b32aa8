//! Owning data envelope exchanged between tasks.
//!
//! A `DataPacket` carries a list of channel [`Value`]s plus metadata, and may
//! aggregate child packets (a "super-packet"). Every clone is a deep,
//! independent copy; the creation number is preserved by clones.

use crate::context::ToolboxContext;
use crate::pipeline::value::Value;
use chrono::{DateTime, Utc};
use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Timestamped, numbered packet of channel values.
#[derive(Clone)]
pub struct DataPacket {
    /// Time since the Unix epoch at which the data was acquired.
    pub timestamp: Duration,
    /// Sequence number assigned by the producer.
    pub seq_nr: u64,
    /// Marks the last packet of a stream.
    pub end_of_stream: bool,
    number: u64,
    stream_id: Option<u32>,
    channels: Vec<Value>,
    sub_packets: Vec<DataPacket>,
}

impl DataPacket {
    /// Create an empty packet stamped with the current time.
    ///
    /// `number` is normally drawn from [`ToolboxContext::new_packet`].
    pub fn new(number: u64) -> Self {
        Self {
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default(),
            seq_nr: 0,
            end_of_stream: false,
            number,
            stream_id: None,
            channels: Vec::new(),
            sub_packets: Vec::new(),
        }
    }

    pub fn with_channels(mut self, channels: impl IntoIterator<Item = Value>) -> Self {
        self.channels.extend(channels);
        self
    }

    pub fn with_sub_packets(mut self, sub_packets: impl IntoIterator<Item = DataPacket>) -> Self {
        self.sub_packets.extend(sub_packets);
        self
    }

    /// Creation number, unique per [`ToolboxContext`].
    #[inline]
    pub fn number(&self) -> u64 {
        self.number
    }

    #[inline]
    pub fn stream_id(&self) -> Option<u32> {
        self.stream_id
    }

    /// Assign the stream id. Only the first non-negative assignment sticks.
    pub fn set_stream_id(&mut self, id: i64) {
        if id < 0 {
            tracing::warn!("packet {}: negative stream id {} ignored", self.number, id);
            return;
        }
        if let Some(existing) = self.stream_id {
            tracing::warn!(
                "packet {}: stream id already set to {}, ignoring {}",
                self.number,
                existing,
                id
            );
            return;
        }
        match u32::try_from(id) {
            Ok(id) => self.stream_id = Some(id),
            Err(_) => tracing::warn!("packet {}: stream id {} out of range", self.number, id),
        }
    }

    /// Number of top-level channels.
    #[inline]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    #[inline]
    pub fn channels(&self) -> &[Value] {
        &self.channels
    }

    #[inline]
    pub fn channels_mut(&mut self) -> &mut [Value] {
        &mut self.channels
    }

    pub fn channel(&self, index: usize) -> Option<&Value> {
        let value = self.channels.get(index);
        if value.is_none() {
            tracing::warn!(
                "packet {}: no channel {} (packet has {})",
                self.number,
                index,
                self.channels.len()
            );
        }
        value
    }

    pub fn channel_mut(&mut self, index: usize) -> Option<&mut Value> {
        let len = self.channels.len();
        let value = self.channels.get_mut(index);
        if value.is_none() {
            tracing::warn!(
                "packet {}: no channel {} (packet has {})",
                self.number,
                index,
                len
            );
        }
        value
    }

    /// Replace the value of an existing channel.
    pub fn set_channel(&mut self, index: usize, value: Value) {
        match self.channels.get_mut(index) {
            Some(slot) => *slot = value,
            None => tracing::warn!(
                "packet {}: cannot set channel {} (packet has {})",
                self.number,
                index,
                self.channels.len()
            ),
        }
    }

    pub fn push_channel(&mut self, value: Value) {
        self.channels.push(value);
    }

    #[inline]
    pub fn sub_packets(&self) -> &[DataPacket] {
        &self.sub_packets
    }

    #[inline]
    pub fn sub_packets_mut(&mut self) -> &mut Vec<DataPacket> {
        &mut self.sub_packets
    }

    pub fn push_sub_packet(&mut self, packet: DataPacket) {
        self.sub_packets.push(packet);
    }

    #[inline]
    pub fn is_super_packet(&self) -> bool {
        !self.sub_packets.is_empty()
    }

    /// Clone with only the selected channels, in selection order. Sub-packets
    /// are narrowed the same way.
    pub fn clone_channels(&self, channels: &[usize]) -> DataPacket {
        DataPacket {
            timestamp: self.timestamp,
            seq_nr: self.seq_nr,
            end_of_stream: self.end_of_stream,
            number: self.number,
            stream_id: self.stream_id,
            channels: self.select(channels),
            sub_packets: self
                .sub_packets
                .iter()
                .map(|p| p.clone_channels(channels))
                .collect(),
        }
    }

    /// Keep only the selected channels. On a super-packet the selection is
    /// applied to every sub-packet instead.
    pub fn narrow_data(&mut self, channels: &[usize]) {
        if self.is_super_packet() {
            for p in &mut self.sub_packets {
                p.narrow_data(channels);
            }
        } else {
            self.channels = self.select(channels);
        }
    }

    /// Move the contents of `other` into this packet, leaving `other` empty.
    ///
    /// Super-packets merge pairwise by sub-packet position. When the two
    /// packets are not structurally compatible (different sub-packet counts
    /// at any level) nothing is moved and neither packet changes.
    pub fn append_content_of(&mut self, other: &mut DataPacket) {
        if !self.merge_compatible(other) {
            tracing::warn!(
                "packet {}: cannot append packet {}, sub-packet counts differ ({} vs {})",
                self.number,
                other.number,
                self.sub_packets.len(),
                other.sub_packets.len()
            );
            return;
        }
        self.merge_from(other);
    }

    fn merge_compatible(&self, other: &DataPacket) -> bool {
        self.sub_packets.len() == other.sub_packets.len()
            && self
                .sub_packets
                .iter()
                .zip(&other.sub_packets)
                .all(|(a, b)| a.merge_compatible(b))
    }

    fn merge_from(&mut self, other: &mut DataPacket) {
        for (dst, src) in self.sub_packets.iter_mut().zip(other.sub_packets.iter_mut()) {
            dst.merge_from(src);
        }
        other.sub_packets.clear();
        self.channels.append(&mut other.channels);
    }

    /// Drop all channels and sub-packets, keeping the metadata.
    pub fn empty(&mut self) {
        self.channels.clear();
        self.sub_packets.clear();
    }

    /// Mark every value (including those in sub-packets) invalid.
    pub fn invalidate_values(&mut self) {
        for v in &mut self.channels {
            v.invalidate();
        }
        for p in &mut self.sub_packets {
            p.invalidate_values();
        }
    }

    pub fn timestamp_secs(&self) -> f64 {
        self.timestamp.as_secs_f64()
    }

    pub fn set_timestamp_secs(&mut self, secs: f64) {
        self.timestamp = Duration::try_from_secs_f64(secs).unwrap_or_default();
    }

    /// Write a one-line-per-packet text dump: timestamp, sequence number and
    /// the float view of every channel (sub-packets appended in order).
    pub fn dump(&self, w: &mut impl Write) -> io::Result<()> {
        write!(w, "{:.6}\t{}", self.timestamp_secs(), self.seq_nr)?;
        self.dump_values(w)?;
        writeln!(w)
    }

    fn dump_values(&self, w: &mut impl Write) -> io::Result<()> {
        for v in &self.channels {
            write!(w, "\t{}", v.as_float())?;
        }
        for p in &self.sub_packets {
            p.dump_values(w)?;
        }
        Ok(())
    }

    /// Append [`dump`](Self::dump) output to `path` while holding the
    /// context's serialization lock.
    pub fn dump_to_file(&self, ctx: &ToolboxContext, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();
        ctx.serial_lock().serialize(|| {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            self.dump(&mut file)
        })
    }

    fn select(&self, channels: &[usize]) -> Vec<Value> {
        channels
            .iter()
            .filter_map(|&ch| {
                let value = self.channels.get(ch).copied();
                if value.is_none() {
                    tracing::warn!(
                        "packet {}: selected channel {} does not exist (packet has {})",
                        self.number,
                        ch,
                        self.channels.len()
                    );
                }
                value
            })
            .collect()
    }
}

impl fmt::Debug for DataPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataPacket")
            .field("number", &self.number)
            .field("seq_nr", &self.seq_nr)
            .field("stream_id", &self.stream_id)
            .field("timestamp", &self.timestamp)
            .field("end_of_stream", &self.end_of_stream)
            .field("channels", &self.channels)
            .field("sub_packets", &self.sub_packets.len())
            .finish()
    }
}

impl fmt::Display for DataPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stamp = DateTime::<Utc>::from(UNIX_EPOCH + self.timestamp);
        writeln!(f, "DataPacket #{}", self.number)?;
        writeln!(f, "  seq_nr        : {}", self.seq_nr)?;
        match self.stream_id {
            Some(id) => writeln!(f, "  stream_id     : {}", id)?,
            None => writeln!(f, "  stream_id     : -")?,
        }
        writeln!(f, "  timestamp     : {}", stamp.format("%Y-%m-%d %H:%M:%S%.6f"))?;
        writeln!(f, "  end_of_stream : {}", self.end_of_stream)?;
        write!(f, "  channels      :")?;
        for v in &self.channels {
            write!(f, " {}", v)?;
        }
        writeln!(f)?;
        for (i, p) in self.sub_packets.iter().enumerate() {
            write!(f, "  sub[{}]        :", i)?;
            for v in &p.channels {
                write!(f, " {}", v)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
