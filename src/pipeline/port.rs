//! Port direction and per-task input-port settings.
//!
//! The ports themselves live in [`in_port`](super::in_port) and
//! [`out_port`](super::out_port).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default input queue capacity applied by stream tasks.
pub const DEFAULT_IN_PORT_BUFFER_SIZE: usize = 9999;

/// Whether a port is an input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortDirection {
    Input,
    Output,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::Input => write!(f, "in"),
            PortDirection::Output => write!(f, "out"),
        }
    }
}

/// Queue policy applied to every input port of a task when it starts.
///
/// A `buffer_size` of 0 means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortSettings {
    pub buffer_size: usize,
    /// Block producers instead of dropping when the queue is full.
    pub lossless: bool,
    /// Suppress queue-overflow warnings.
    pub silent: bool,
}

impl Default for PortSettings {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_IN_PORT_BUFFER_SIZE,
            lossless: false,
            silent: false,
        }
    }
}

impl PortSettings {
    pub fn unbounded() -> Self {
        Self {
            buffer_size: 0,
            ..Self::default()
        }
    }

    pub fn bounded(buffer_size: usize) -> Self {
        Self {
            buffer_size,
            ..Self::default()
        }
    }

    pub fn with_lossless(mut self, lossless: bool) -> Self {
        self.lossless = lossless;
        self
    }

    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    #[inline]
    pub fn is_bounded(&self) -> bool {
        self.buffer_size > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = PortSettings::default();
        assert_eq!(s.buffer_size, 9999);
        assert!(!s.lossless);
        assert!(!s.silent);
        assert!(!PortSettings::unbounded().is_bounded());
    }

    #[test]
    fn test_partial_deserialize_fills_defaults() {
        let s: PortSettings = serde_json::from_str(r#"{"lossless": true}"#).unwrap();
        assert_eq!(s, PortSettings::default().with_lossless(true));
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(PortDirection::Input.to_string(), "in");
        assert_eq!(PortDirection::Output.to_string(), "out");
    }
}
