//! Condition variable with one-shot cooperative cancellation.
//!
//! `Condition` wraps a `parking_lot::Condvar` and adds a sticky cancel flag.
//! A thread blocked in [`Condition::wait`] (or about to block in it) that
//! observes the flag returns `Err(Cancelled)` instead of a normal wakeup, and
//! the flag is consumed by the first waiter that sees it.
//!
//! The flag is meant to be set while holding the mutex that waiters pass in,
//! so a waiter can never miss a cancellation between checking the flag and
//! going to sleep.

use parking_lot::{Condvar, MutexGuard};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use thiserror::Error;

/// A blocked wait was aborted by [`Condition::cancel`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("condition canceled")]
pub struct Cancelled;

/// How a non-cancelled wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStatus {
    /// Woken by `signal`/`broadcast`.
    Signaled,
    /// The deadline passed without a wakeup.
    TimedOut,
}

impl WaitStatus {
    pub fn timed_out(self) -> bool {
        self == WaitStatus::TimedOut
    }
}

/// Wait/signal primitive with cancellable waits.
#[derive(Debug, Default)]
pub struct Condition {
    condvar: Condvar,
    canceling: AtomicBool,
}

impl Condition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until signaled, cancelled, or (if given) `deadline` passes.
    ///
    /// The guard is released while sleeping and re-acquired before returning.
    pub fn wait<T>(
        &self,
        guard: &mut MutexGuard<'_, T>,
        deadline: Option<Instant>,
    ) -> Result<WaitStatus, Cancelled> {
        self.take_cancel()?;

        let status = match deadline {
            Some(deadline) => {
                if self.condvar.wait_until(guard, deadline).timed_out() {
                    WaitStatus::TimedOut
                } else {
                    WaitStatus::Signaled
                }
            }
            None => {
                self.condvar.wait(guard);
                WaitStatus::Signaled
            }
        };

        self.take_cancel()?;
        Ok(status)
    }

    /// Wait for a wakeup while ignoring the cancel flag.
    ///
    /// The flag is left untouched for the cancellable waiter it was meant for.
    pub fn wait_uncancellable<T>(&self, guard: &mut MutexGuard<'_, T>) {
        self.condvar.wait(guard);
    }

    /// Wake one waiter.
    pub fn signal(&self) {
        self.condvar.notify_one();
    }

    /// Wake every waiter.
    pub fn broadcast(&self) {
        self.condvar.notify_all();
    }

    /// Abort the current (or next) cancellable wait.
    ///
    /// All waiters are woken so that the cancellable one gets to observe the
    /// flag even when uncancellable waiters share this condition.
    pub fn cancel(&self) {
        self.canceling.store(true, Ordering::Release);
        self.condvar.notify_all();
    }

    /// Whether a cancellation is pending and not yet consumed.
    pub fn is_cancel_pending(&self) -> bool {
        self.canceling.load(Ordering::Acquire)
    }

    /// Drop a pending cancellation without consuming it through a wait.
    pub fn clear_cancel(&self) {
        self.canceling.store(false, Ordering::Release);
    }

    fn take_cancel(&self) -> Result<(), Cancelled> {
        if self.canceling.swap(false, Ordering::AcqRel) {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}
