//! Pipeline-specific error types.

use crate::io::{EncodeError, TransportError};
use crate::pipeline::port::PortDirection;
use crate::sync::Cancelled;
use thiserror::Error;

/// Errors from wiring and configuring tasks.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Task '{0}' is running; stop it before rewiring")]
    TaskRunning(String),

    #[error("Task '{0}' cannot feed its own input ports")]
    SelfConnection(String),

    #[error("Task '{task}' has no {direction} port {index}")]
    InvalidPort {
        task: String,
        direction: PortDirection,
        index: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Outcome of a task's run loop that did not end normally.
#[derive(Error, Debug)]
pub enum TaskError {
    /// A blocking call was cancelled; this is a normal stop signal.
    #[error("task cancelled")]
    Cancelled,

    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("encoder failure: {0}")]
    Encode(#[from] EncodeError),

    #[error("missing {direction} port {index}")]
    MissingPort {
        direction: PortDirection,
        index: usize,
    },

    #[error("{0}")]
    Failed(String),
}

impl TaskError {
    pub fn failed(message: impl Into<String>) -> Self {
        TaskError::Failed(message.into())
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TaskError::Cancelled)
    }

    /// Short classification used in run-loop log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            TaskError::Cancelled => "cancelled",
            TaskError::Transport(_) => "transport",
            TaskError::Encode(_) => "encode",
            TaskError::MissingPort { .. } => "wiring",
            TaskError::Failed(_) => "failure",
        }
    }
}

impl From<Cancelled> for TaskError {
    fn from(_: Cancelled) -> Self {
        TaskError::Cancelled
    }
}

pub type TaskResult<T> = std::result::Result<T, TaskError>;
