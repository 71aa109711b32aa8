//! Error handling for the CRN toolbox
//!
//! This module defines the crate-level error type and a Result alias.
//! Pipeline wiring and run-loop outcomes have their own enums in
//! [`crate::pipeline::error`] and convert into [`ToolboxError`].

use crate::io::{EncodeError, TransportError};
use crate::pipeline::{PipelineError, TaskError};
use thiserror::Error;

/// Main error type for toolbox operations
#[derive(Error, Debug)]
pub enum ToolboxError {
    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors from wiring or configuring tasks
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// A task run loop ended with an error
    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    /// Errors from byte transports
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Errors from packet encoders
    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ToolboxError>,
    },
}

impl ToolboxError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ToolboxError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for toolbox operations
pub type Result<T> = std::result::Result<T, ToolboxError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<ToolboxError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}
