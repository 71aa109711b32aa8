//! Threaded dataflow pipeline.
//!
//! Each [`StreamTask`] runs its logic on a dedicated OS thread. Tasks
//! exchange [`DataPacket`]s through ports: an [`OutPort`] fans a packet out
//! to any number of [`InPort`]s, each of which is a bounded FIFO consumed by
//! its owning task.
//!
//! # Architecture
//!
//! ```text
//! [GeneratorTask] ──► [ChannelSelectTask] ──► [ChannelSinkTask] ──► crossbeam channel
//!                  └─► [EncoderWriterTask] ──► ByteStream
//! ```
//!
//! # Design
//!
//! - **Ownership transfer**: a packet sent to N receivers becomes N
//!   independent packets; the first connected receiver gets the original.
//! - **Queue policy per task**: lossy (drop and count) or lossless (block
//!   the producer), applied to every input port at start.
//! - **Cooperative cancellation**: `stop()` cancels blocking receives and
//!   task-declared blocking calls, then joins the thread.
//! - **Failure boundary**: errors and panics in a run loop are logged and
//!   stop only that task.

pub mod error;
pub mod id;
pub mod in_port;
pub mod node;
pub mod nodes;
pub mod out_port;
pub mod packet;
pub mod port;
pub mod thread;
pub mod timer;
pub mod value;

pub use error::{PipelineError, PipelineResult, TaskError, TaskResult};
pub use id::PortId;
pub use in_port::InPort;
pub use node::{StreamTask, StreamTaskBuilder, TaskContext, TaskLogic, TaskPorts};
pub use nodes::{ChannelSelectTask, ChannelSinkTask, EncoderWriterTask, GeneratorTask, MergeTask};
pub use out_port::OutPort;
pub use packet::DataPacket;
pub use port::{PortDirection, PortSettings, DEFAULT_IN_PORT_BUFFER_SIZE};
pub use thread::TaskThread;
pub use timer::{Timer, TimerHandle};
pub use value::{Fix, Scalar, Value};
