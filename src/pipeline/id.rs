//! Port identity for diagnostics.

use crate::pipeline::port::PortDirection;
use std::fmt;
use std::sync::Arc;

/// Identifies a port by owning task, direction and index.
///
/// Rendered as `task:in0` / `task:out1`. Ports that were never attached to a
/// task render as `in?` / `out?`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PortId {
    owner: Arc<str>,
    direction: PortDirection,
    index: usize,
}

impl PortId {
    const UNASSIGNED: usize = usize::MAX;

    pub fn new(owner: impl Into<Arc<str>>, direction: PortDirection, index: usize) -> Self {
        Self {
            owner: owner.into(),
            direction,
            index,
        }
    }

    pub fn unassigned(direction: PortDirection) -> Self {
        Self {
            owner: Arc::from(""),
            direction,
            index: Self::UNASSIGNED,
        }
    }

    #[inline]
    pub fn is_assigned(&self) -> bool {
        self.index != Self::UNASSIGNED
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn direction(&self) -> PortDirection {
        self.direction
    }

    pub fn index(&self) -> Option<usize> {
        self.is_assigned().then_some(self.index)
    }
}

impl fmt::Debug for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PortId({})", self)
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_assigned() {
            write!(f, "{}:{}{}", self.owner, self.direction, self.index)
        } else {
            write!(f, "{}?", self.direction)
        }
    }
}
