//! Synchronization primitives used by ports, tasks and timers.
//!
//! Plain mutual exclusion comes straight from `parking_lot`. On top of it,
//! [`Condition`] adds the one-shot cooperative cancellation every blocking
//! port operation relies on, and [`SerialLock`] is the single process-scoped
//! lock carried by [`ToolboxContext`](crate::context::ToolboxContext).

pub mod condition;
pub mod lock;

pub use condition::{Cancelled, Condition, WaitStatus};
pub use lock::SerialLock;
pub use parking_lot::{Mutex, MutexGuard};
