//! Byte-oriented transports used by reader and writer tasks.
//!
//! [`ByteStream`] is the seam tasks program against; [`BufferedStream`]
//! implements it over any `Read + Write` source (TCP socket, serial device
//! file, in-memory cursor) with a small read-ahead buffer.

use std::io::{self, Read, Write};
use thiserror::Error;

const READ_BUFFER_SIZE: usize = 512;

/// Failure of a transport operation.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("transport is not open")]
    NotOpen,

    #[error("connection closed by peer")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TransportError {
    /// OS error code, when the failure came from the OS.
    pub fn errno(&self) -> Option<i32> {
        match self {
            TransportError::Io(e) => e.raw_os_error(),
            _ => None,
        }
    }
}

/// Blocking byte transport.
#[cfg_attr(test, mockall::automock)]
pub trait ByteStream: Send {
    fn open(&mut self) -> Result<(), TransportError>;

    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// Read a single byte.
    fn read_char(&mut self) -> Result<u8, TransportError>;

    /// Read up to `buf.len()` bytes. Returns the number read (at least 1).
    fn read_buf(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Read until `separator`, appending to `line`. The separator is kept
    /// only if `keep_separator` is set. Returns the number of bytes consumed.
    fn read_line(
        &mut self,
        line: &mut Vec<u8>,
        separator: u8,
        keep_separator: bool,
    ) -> Result<usize, TransportError>;

    fn write_all(&mut self, buf: &[u8]) -> Result<(), TransportError>;
}

type Connector<S> = Box<dyn FnMut() -> io::Result<S> + Send>;

/// [`ByteStream`] over any `Read + Write` value.
pub struct BufferedStream<S> {
    connector: Option<Connector<S>>,
    stream: Option<S>,
    buffer: Box<[u8; READ_BUFFER_SIZE]>,
    pos: usize,
    filled: usize,
}

impl<S: Read + Write + Send> BufferedStream<S> {
    /// Stream that is (re)opened through `connector`, e.g.
    /// `BufferedStream::connect(move || TcpStream::connect(addr))`.
    pub fn connect(connector: impl FnMut() -> io::Result<S> + Send + 'static) -> Self {
        Self {
            connector: Some(Box::new(connector)),
            stream: None,
            buffer: Box::new([0; READ_BUFFER_SIZE]),
            pos: 0,
            filled: 0,
        }
    }

    /// Wrap an already open stream. It cannot be reopened once closed.
    pub fn from_stream(stream: S) -> Self {
        Self {
            connector: None,
            stream: Some(stream),
            buffer: Box::new([0; READ_BUFFER_SIZE]),
            pos: 0,
            filled: 0,
        }
    }

    pub fn get_ref(&self) -> Option<&S> {
        self.stream.as_ref()
    }

    fn buffered(&self) -> &[u8] {
        &self.buffer[self.pos..self.filled]
    }

    fn fill(&mut self) -> Result<(), TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotOpen)?;
        let n = loop {
            match stream.read(&mut self.buffer[..]) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };
        if n == 0 {
            return Err(TransportError::Closed);
        }
        self.pos = 0;
        self.filled = n;
        Ok(())
    }
}

impl<S: Read + Write + Send> ByteStream for BufferedStream<S> {
    fn open(&mut self) -> Result<(), TransportError> {
        if self.stream.is_some() {
            return Ok(());
        }
        let connector = self.connector.as_mut().ok_or(TransportError::NotOpen)?;
        self.stream = Some(connector()?);
        self.pos = 0;
        self.filled = 0;
        Ok(())
    }

    fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.flush() {
                tracing::warn!("flush on close failed: {}", e);
            }
        }
        self.pos = 0;
        self.filled = 0;
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn read_char(&mut self) -> Result<u8, TransportError> {
        if self.buffered().is_empty() {
            self.fill()?;
        }
        let c = self.buffer[self.pos];
        self.pos += 1;
        Ok(c)
    }

    fn read_buf(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.buffered().is_empty() {
            self.fill()?;
        }
        let n = self.buffered().len().min(buf.len());
        buf[..n].copy_from_slice(&self.buffer[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn read_line(
        &mut self,
        line: &mut Vec<u8>,
        separator: u8,
        keep_separator: bool,
    ) -> Result<usize, TransportError> {
        let mut consumed = 0;
        loop {
            let c = self.read_char()?;
            consumed += 1;
            if c == separator {
                if keep_separator {
                    line.push(c);
                }
                return Ok(consumed);
            }
            line.push(c);
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotOpen)?;
        stream.write_all(buf)?;
        stream.flush()?;
        Ok(())
    }
}
