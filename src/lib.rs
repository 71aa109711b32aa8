//! # CRN Toolbox: threaded dataflow runtime
//!
//! Independent stream tasks, each on its own OS thread, exchange timestamped
//! packets of numeric channel values over bounded, optionally lossless
//! ports. Typical uses are sensor acquisition and processing chains: a
//! reader task produces packets, filter/merge tasks transform them, and
//! writer tasks encode them onto a transport.
//!
//! ## Architecture
//!
//! - **Sync**: `Condition` with one-shot cooperative cancellation on top of
//!   `parking_lot` locks
//! - **Pipeline**: `DataPacket`, `InPort`/`OutPort`, `StreamTask` lifecycle,
//!   thread failure boundary, timers and the built-in tasks
//! - **IO**: `ByteStream` transports and `Encoder`s for writer tasks
//! - **Config**: JSON/TOML runtime configuration with per-task overrides
//!
//! ## Example
//!
//! ```ignore
//! use crn_toolbox::pipeline::{ChannelSelectTask, GeneratorTask, StreamTask};
//! use std::time::Duration;
//!
//! let mut source = StreamTask::builder("gen")
//!     .out_ports(1)
//!     .build(GeneratorTask::new(Duration::from_millis(10)));
//! let mut select = StreamTask::builder("select")
//!     .in_ports(1)
//!     .out_ports(1)
//!     .build(ChannelSelectTask::new(vec![1]));
//!
//! source.connect(0, &select, 0)?;
//! select.start();
//! source.start();
//! // ...
//! source.stop();
//! select.stop();
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod sync;

// Re-export commonly used types
pub use config::{TaskConfig, ToolboxConfig};
pub use context::ToolboxContext;
pub use error::{Result, ResultExt, ToolboxError};
pub use pipeline::{DataPacket, InPort, OutPort, PortSettings, StreamTask, TaskLogic, Value};
