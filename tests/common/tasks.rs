//! Small task logics used to drive the runtime from tests

use crn_toolbox::pipeline::{TaskContext, TaskError, TaskLogic, TaskResult};
use crn_toolbox::sync::{Cancelled, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Forwards in0 to out0 until cancelled.
#[derive(Default)]
pub struct Relay {
    pub runs: AtomicUsize,
}

impl TaskLogic for Relay {
    fn run(&self, ctx: &TaskContext) -> TaskResult<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        let port = ctx.in_port(0)?;
        while ctx.should_run() {
            match port.receive(Duration::ZERO) {
                Ok(Some(packet)) => ctx.send(0, packet),
                Ok(None) => {}
                Err(Cancelled) => break,
            }
        }
        Ok(())
    }
}

/// Collects the `number()` of every packet it receives.
#[derive(Default)]
pub struct Recorder {
    pub numbers: Mutex<Vec<u64>>,
}

impl TaskLogic for Recorder {
    fn run(&self, ctx: &TaskContext) -> TaskResult<()> {
        let port = ctx.in_port(0)?;
        loop {
            match port.receive(Duration::ZERO) {
                Ok(Some(packet)) => self.numbers.lock().push(packet.number()),
                Ok(None) => {}
                Err(Cancelled) => return Ok(()),
            }
        }
    }
}

/// Sleeps until stopped.
#[derive(Default)]
pub struct Idle;

impl TaskLogic for Idle {
    fn run(&self, ctx: &TaskContext) -> TaskResult<()> {
        while ctx.should_run() {
            ctx.sleep(Duration::from_secs(60))?;
        }
        Ok(())
    }
}

/// Fails immediately, optionally by panicking.
pub struct Faulty {
    pub panic: bool,
    pub runs: AtomicUsize,
}

impl Faulty {
    pub fn new(panic: bool) -> Self {
        Self {
            panic,
            runs: AtomicUsize::new(0),
        }
    }
}

impl TaskLogic for Faulty {
    fn run(&self, _ctx: &TaskContext) -> TaskResult<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if self.panic {
            panic!("faulty task exploded");
        }
        Err(TaskError::failed("faulty task gave up"))
    }
}
