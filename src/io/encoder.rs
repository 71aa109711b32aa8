//! Packet encoders for writer tasks.

use crate::pipeline::packet::DataPacket;
use std::fmt::Write as _;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("output buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("encoder used before init()")]
    NotInitialized,
}

/// Turns packets into bytes.
///
/// `init` sees the first packet of a stream so the encoder can size its
/// output. Every other method writes into `buf` and returns the number of
/// bytes produced.
pub trait Encoder: Send {
    fn init(&mut self, sample: &DataPacket);

    fn header(&mut self, buf: &mut [u8]) -> Result<usize, EncodeError>;

    fn encode(&mut self, packet: &DataPacket, buf: &mut [u8]) -> Result<usize, EncodeError>;

    fn footer(&mut self, buf: &mut [u8]) -> Result<usize, EncodeError>;
}

/// Plain-text encoder: one line per packet.
///
/// Line format: `<seq_nr> <timestamp secs> <ch0> <ch1> ...`, channels of
/// sub-packets following the top-level ones.
#[derive(Debug, Clone)]
pub struct LineEncoder {
    separator: char,
    channels: Option<usize>,
    with_header: bool,
    line: String,
}

impl LineEncoder {
    pub fn new() -> Self {
        Self {
            separator: ' ',
            channels: None,
            with_header: true,
            line: String::new(),
        }
    }

    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Emit a `#`-prefixed column header and footer.
    pub fn with_header(mut self, with_header: bool) -> Self {
        self.with_header = with_header;
        self
    }

    fn count_channels(packet: &DataPacket) -> usize {
        packet.len() + packet.sub_packets().iter().map(Self::count_channels).sum::<usize>()
    }

    fn push_values(&mut self, packet: &DataPacket) {
        for v in packet.channels() {
            let _ = write!(self.line, "{}{}", self.separator, v);
        }
        for p in packet.sub_packets() {
            self.push_values(p);
        }
    }

    fn flush_line(&mut self, buf: &mut [u8]) -> Result<usize, EncodeError> {
        let bytes = self.line.as_bytes();
        if bytes.len() > buf.len() {
            return Err(EncodeError::BufferTooSmall {
                needed: bytes.len(),
                available: buf.len(),
            });
        }
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(bytes.len())
    }
}

impl Default for LineEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for LineEncoder {
    fn init(&mut self, sample: &DataPacket) {
        self.channels = Some(Self::count_channels(sample));
    }

    fn header(&mut self, buf: &mut [u8]) -> Result<usize, EncodeError> {
        let channels = self.channels.ok_or(EncodeError::NotInitialized)?;
        if !self.with_header {
            return Ok(0);
        }
        self.line.clear();
        let _ = write!(self.line, "# seq{}timestamp", self.separator);
        for i in 0..channels {
            let _ = write!(self.line, "{}ch{}", self.separator, i);
        }
        self.line.push('\n');
        self.flush_line(buf)
    }

    fn encode(&mut self, packet: &DataPacket, buf: &mut [u8]) -> Result<usize, EncodeError> {
        if self.channels.is_none() {
            return Err(EncodeError::NotInitialized);
        }
        self.line.clear();
        let _ = write!(
            self.line,
            "{}{}{:.6}",
            packet.seq_nr,
            self.separator,
            packet.timestamp_secs()
        );
        self.push_values(packet);
        self.line.push('\n');
        self.flush_line(buf)
    }

    fn footer(&mut self, buf: &mut [u8]) -> Result<usize, EncodeError> {
        if !self.with_header {
            return Ok(0);
        }
        self.line.clear();
        self.line.push_str("# end\n");
        self.flush_line(buf)
    }
}
