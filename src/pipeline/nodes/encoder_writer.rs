//! Writer task: encodes packets from in0 onto a byte stream.

use crate::io::{ByteStream, Encoder, TransportError};
use crate::pipeline::error::TaskResult;
use crate::pipeline::in_port::InPort;
use crate::pipeline::node::{TaskContext, TaskLogic};
use crate::pipeline::nodes::receive_next;
use crate::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

const DEFAULT_BUFFER_SIZE: usize = 4096;

struct WriterState<E, S> {
    encoder: E,
    stream: S,
    started: bool,
}

/// Opens the stream, writes the encoder header before the first packet,
/// one encoded record per packet, and the footer when the stream ends.
///
/// Packets the encoder rejects are skipped with a warning. Transport
/// failures end the run loop with an error.
pub struct EncoderWriterTask<E, S> {
    state: Mutex<WriterState<E, S>>,
    buffer_size: usize,
    written: AtomicU64,
}

impl<E: Encoder, S: ByteStream> EncoderWriterTask<E, S> {
    pub fn new(encoder: E, stream: S) -> Self {
        Self {
            state: Mutex::new(WriterState {
                encoder,
                stream,
                started: false,
            }),
            buffer_size: DEFAULT_BUFFER_SIZE,
            written: AtomicU64::new(0),
        }
    }

    /// Size of the scratch buffer handed to the encoder.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    pub fn packets_written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    fn pump(
        &self,
        ctx: &TaskContext,
        port: &InPort,
        state: &mut WriterState<E, S>,
        buf: &mut [u8],
    ) -> TaskResult<()> {
        while ctx.should_run() {
            let Some(packet) = receive_next(port) else {
                break;
            };

            if !state.started {
                state.encoder.init(&packet);
                let n = state.encoder.header(buf)?;
                write_out(&mut state.stream, &buf[..n])?;
                state.started = true;
            }

            match state.encoder.encode(&packet, buf) {
                Ok(n) => {
                    write_out(&mut state.stream, &buf[..n])?;
                    self.written.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    tracing::warn!("{}: skipping packet {}: {}", ctx.id(), packet.number(), e)
                }
            }

            if packet.end_of_stream {
                tracing::debug!("{}: end of stream", ctx.id());
                break;
            }
        }
        Ok(())
    }

    fn finish(&self, ctx: &TaskContext, state: &mut WriterState<E, S>, buf: &mut [u8]) {
        if state.started {
            match state.encoder.footer(buf) {
                Ok(n) => {
                    if let Err(e) = write_out(&mut state.stream, &buf[..n]) {
                        tracing::warn!("{}: footer not written: {}", ctx.id(), e);
                    }
                }
                Err(e) => tracing::warn!("{}: footer not encoded: {}", ctx.id(), e),
            }
            state.started = false;
        }
        state.stream.close();
    }
}

impl<E, S> TaskLogic for EncoderWriterTask<E, S>
where
    E: Encoder + 'static,
    S: ByteStream + 'static,
{
    fn run(&self, ctx: &TaskContext) -> TaskResult<()> {
        let port = ctx.in_port(0)?;
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if !state.stream.is_open() {
            state.stream.open()?;
        }

        let mut buf = vec![0u8; self.buffer_size];
        let result = self.pump(ctx, port, state, &mut buf);
        self.finish(ctx, state, &mut buf);
        result
    }
}

fn write_out(stream: &mut impl ByteStream, bytes: &[u8]) -> Result<(), TransportError> {
    if bytes.is_empty() {
        return Ok(());
    }
    stream.write_all(bytes)
}
