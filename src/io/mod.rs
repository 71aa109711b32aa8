//! Transport and encoding seams for tasks that talk to the outside world.

pub mod byte_stream;
pub mod encoder;

pub use byte_stream::{BufferedStream, ByteStream, TransportError};
pub use encoder::{EncodeError, Encoder, LineEncoder};

#[cfg(test)]
pub use byte_stream::MockByteStream;
