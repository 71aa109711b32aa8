//! One-shot, re-armable timer running on its own thread.

use crate::pipeline::thread::TaskThread;
use crate::sync::{Cancelled, Condition, Mutex};
use std::sync::Arc;
use std::time::Instant;

struct TimerShared {
    fire_at: Mutex<Option<Instant>>,
    condition: Condition,
}

/// Handle used to re-arm a [`Timer`], including from inside its callback.
#[derive(Clone)]
pub struct TimerHandle {
    shared: Arc<TimerShared>,
}

impl TimerHandle {
    /// Arm (or re-arm) the timer to fire at `fire_at`.
    pub fn set(&self, fire_at: Instant) {
        *self.shared.fire_at.lock() = Some(fire_at);
        self.shared.condition.broadcast();
    }

    /// Disarm without firing.
    pub fn clear(&self) {
        *self.shared.fire_at.lock() = None;
        self.shared.condition.broadcast();
    }

    pub fn is_armed(&self) -> bool {
        self.shared.fire_at.lock().is_some()
    }
}

/// Calls a callback once per arming, on the timer's thread.
///
/// Dropping the timer cancels its thread and waits for it.
pub struct Timer {
    handle: TimerHandle,
    thread: TaskThread,
}

impl Timer {
    /// Start a timer armed for `fire_at`.
    pub fn new<F>(fire_at: Instant, callback: F) -> Self
    where
        F: FnMut(&TimerHandle) + Send + 'static,
    {
        Self::with_name("timer", Some(fire_at), callback)
    }

    /// Start a timer thread with the given name, optionally armed.
    pub fn with_name<F>(name: &str, fire_at: Option<Instant>, mut callback: F) -> Self
    where
        F: FnMut(&TimerHandle) + Send + 'static,
    {
        let handle = TimerHandle {
            shared: Arc::new(TimerShared {
                fire_at: Mutex::new(fire_at),
                condition: Condition::new(),
            }),
        };
        let mut thread = TaskThread::new(name);
        let run_handle = handle.clone();
        thread.init(move || {
            // Cancellation is how the owner shuts us down.
            let _ = fire_loop(&run_handle, &mut callback);
            Ok(())
        });
        Self { handle, thread }
    }

    pub fn set(&self, fire_at: Instant) {
        self.handle.set(fire_at);
    }

    pub fn clear(&self) {
        self.handle.clear();
    }

    pub fn is_armed(&self) -> bool {
        self.handle.is_armed()
    }

    pub fn handle(&self) -> TimerHandle {
        self.handle.clone()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        {
            let _guard = self.handle.shared.fire_at.lock();
            self.handle.shared.condition.cancel();
        }
        self.thread.join();
    }
}

fn fire_loop(
    handle: &TimerHandle,
    callback: &mut impl FnMut(&TimerHandle),
) -> Result<(), Cancelled> {
    let shared = &handle.shared;
    loop {
        {
            let mut fire_at = shared.fire_at.lock();
            loop {
                match *fire_at {
                    None => {
                        shared.condition.wait(&mut fire_at, None)?;
                    }
                    Some(at) if Instant::now() >= at => break,
                    Some(at) => {
                        shared.condition.wait(&mut fire_at, Some(at))?;
                    }
                }
            }
            *fire_at = None;
        }
        callback(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::time::Duration;

    #[test]
    fn test_fires_once_at_deadline() {
        let (tx, rx) = unbounded();
        let start = Instant::now();
        let timer = Timer::new(start + Duration::from_millis(30), move |_| {
            let _ = tx.send(Instant::now());
        });

        let fired = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(fired >= start + Duration::from_millis(30));
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        assert!(!timer.is_armed());
    }

    #[test]
    fn test_rearm_from_callback() {
        let (tx, rx) = unbounded();
        let mut remaining = 3;
        let _timer = Timer::new(Instant::now(), move |handle| {
            let _ = tx.send(());
            remaining -= 1;
            if remaining > 0 {
                handle.set(Instant::now() + Duration::from_millis(5));
            }
        });

        for _ in 0..3 {
            rx.recv_timeout(Duration::from_secs(5)).unwrap();
        }
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn test_rearm_after_firing() {
        let (tx, rx) = unbounded();
        let timer = Timer::new(Instant::now(), move |_| {
            let _ = tx.send(());
        });
        rx.recv_timeout(Duration::from_secs(5)).unwrap();

        timer.set(Instant::now() + Duration::from_millis(5));
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
    }

    #[test]
    fn test_clear_and_drop_without_firing() {
        let (tx, rx) = unbounded::<()>();
        let timer = Timer::new(Instant::now() + Duration::from_secs(60), move |_| {
            let _ = tx.send(());
        });
        timer.clear();
        assert!(!timer.is_armed());
        let start = Instant::now();
        drop(timer);
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(rx.try_recv().is_err());
    }
}
