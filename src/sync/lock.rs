//! Process-scoped serialization lock.

use parking_lot::Mutex;

/// Serializes short sections that must not interleave across threads,
/// such as appending packet dumps to a shared file.
///
/// Only hold it for brief, non-blocking work: every task in the process
/// may contend on the same instance.
#[derive(Debug, Default)]
pub struct SerialLock {
    inner: Mutex<()>,
}

impl SerialLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock.
    pub fn serialize<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.inner.lock();
        f()
    }
}
