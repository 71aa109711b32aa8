//! OS thread wrapper with a failure boundary.
//!
//! Every run loop executes inside [`TaskThread::init`]'s boundary: a
//! cancellation escaping the loop is logged as a normal stop, while errors
//! and panics are logged and mark the thread as no longer initialized. None
//! of them take down the process.

use crate::pipeline::error::{TaskError, TaskResult};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// One named OS thread running a single run loop at a time.
pub struct TaskThread {
    name: Arc<str>,
    handle: Option<JoinHandle<()>>,
    initialized: Arc<AtomicBool>,
}

impl TaskThread {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            handle: None,
            initialized: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True from a successful `init` until the run loop returns.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Spawn the thread and execute `run` on it.
    ///
    /// Returns `false` (and logs) if a run loop is still active or the OS
    /// refuses to create the thread.
    pub fn init<F>(&mut self, run: F) -> bool
    where
        F: FnOnce() -> TaskResult<()> + Send + 'static,
    {
        if self.is_initialized() {
            tracing::warn!("{}: thread already initialized", self.name);
            return false;
        }

        // Reap a previous run loop that ended on its own.
        self.join();

        // Fresh flag per run so a detached predecessor cannot clear it.
        self.initialized = Arc::new(AtomicBool::new(true));
        let name = Arc::clone(&self.name);
        let initialized = Arc::clone(&self.initialized);

        let spawned = std::thread::Builder::new()
            .name(self.name.to_string())
            .spawn(move || {
                run_boundary(&name, run);
                initialized.store(false, Ordering::Release);
            });

        match spawned {
            Ok(handle) => {
                self.handle = Some(handle);
                true
            }
            Err(e) => {
                self.initialized.store(false, Ordering::Release);
                tracing::error!("{}: thread creation failed: {}", self.name, e);
                false
            }
        }
    }

    /// Wait for the run loop to finish. Returns `true` if a thread was joined.
    ///
    /// Must not be called from the thread itself.
    pub fn join(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                if handle.join().is_err() {
                    tracing::error!("{}: thread terminated abnormally", self.name);
                }
                self.initialized.store(false, Ordering::Release);
                true
            }
            None => false,
        }
    }

    /// Abandon the thread without waiting for it.
    ///
    /// Rust threads cannot be killed; the run loop keeps going until it
    /// observes a stop request on its own.
    pub fn cancel(&mut self) {
        if self.handle.take().is_some() {
            self.initialized.store(false, Ordering::Release);
            tracing::warn!("{}: thread detached, it may still be running", self.name);
        }
    }
}

impl Drop for TaskThread {
    fn drop(&mut self) {
        self.join();
    }
}

impl std::fmt::Debug for TaskThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskThread")
            .field("name", &self.name)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

fn run_boundary<F>(name: &str, run: F)
where
    F: FnOnce() -> TaskResult<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(run)) {
        Ok(Ok(())) => tracing::debug!("{}: run loop finished", name),
        Ok(Err(TaskError::Cancelled)) => {
            tracing::info!("{}: run loop left through a cancelled call", name)
        }
        Ok(Err(err)) => tracing::error!("{}: run loop failed ({}): {}", name, err.kind(), err),
        Err(payload) => {
            tracing::error!("{}: run loop panicked: {}", name, panic_message(&*payload))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
