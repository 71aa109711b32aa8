//! Stream tasks: a set of ports plus a run loop on its own thread.
//!
//! A [`StreamTask`] owns its ports and lifecycle. The task-specific behavior
//! is supplied as a [`TaskLogic`] implementation whose `run` method executes
//! on the task's thread and sees the ports through a [`TaskContext`].
//!
//! Lifecycle:
//! - `Stopped` → `start()` → `Running` (skipped when disabled).
//! - `Running` → `stop()` → `Stopped`: the exit flag is raised, every input
//!   port's receive is cancelled, the logic's own blocking calls are
//!   cancelled, and the thread is joined.
//!
//! Input ports only hold back lossless producers while the run loop is
//! consuming; a task that is disabled, not started or whose loop has ended
//! drops surplus packets instead.
//!
//! Rewiring (adding ports, connecting outputs) needs exclusive access to the
//! port set and is therefore only possible while the task is stopped.

use crate::config::TaskConfig;
use crate::context::ToolboxContext;
use crate::pipeline::error::{PipelineError, PipelineResult, TaskError, TaskResult};
use crate::pipeline::id::PortId;
use crate::pipeline::in_port::InPort;
use crate::pipeline::out_port::OutPort;
use crate::pipeline::packet::DataPacket;
use crate::pipeline::port::{PortDirection, PortSettings};
use crate::pipeline::thread::TaskThread;
use crate::sync::{Cancelled, Condition, Mutex, WaitStatus};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Behavior of a stream task.
pub trait TaskLogic: Send + Sync + 'static {
    /// The run loop. Should return once [`TaskContext::should_run`] turns
    /// false or a blocking call reports [`Cancelled`].
    fn run(&self, ctx: &TaskContext) -> TaskResult<()>;

    /// Abort blocking calls the run loop makes outside of its input ports.
    /// Called by `stop()` after the input ports have been cancelled.
    fn cancel_blocking_calls(&self) {}
}

/// The ports of one task.
#[derive(Debug, Default)]
pub struct TaskPorts {
    in_ports: Vec<Arc<InPort>>,
    out_ports: Vec<OutPort>,
}

impl TaskPorts {
    pub fn in_ports(&self) -> &[Arc<InPort>] {
        &self.in_ports
    }

    pub fn out_ports(&self) -> &[OutPort] {
        &self.out_ports
    }
}

/// Stop signalling shared between a task and its run loop.
#[derive(Debug, Default)]
struct TaskControl {
    exit: AtomicBool,
    sleep_lock: Mutex<()>,
    sleeper: Condition,
}

impl TaskControl {
    fn reset(&self) {
        self.exit.store(false, Ordering::Release);
        self.sleeper.clear_cancel();
    }

    fn request_exit(&self) {
        self.exit.store(true, Ordering::Release);
        let _guard = self.sleep_lock.lock();
        self.sleeper.cancel();
    }

    fn exit_requested(&self) -> bool {
        self.exit.load(Ordering::Acquire)
    }

    fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
        let deadline = Instant::now() + duration;
        let mut guard = self.sleep_lock.lock();
        loop {
            if self.exit_requested() {
                return Err(Cancelled);
            }
            if self.sleeper.wait(&mut guard, Some(deadline))? == WaitStatus::TimedOut {
                return Ok(());
            }
        }
    }
}

/// What a run loop sees of its task.
pub struct TaskContext {
    id: Arc<str>,
    ports: Arc<TaskPorts>,
    control: Arc<TaskControl>,
    toolbox: Arc<ToolboxContext>,
}

impl TaskContext {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn in_ports(&self) -> &[Arc<InPort>] {
        &self.ports.in_ports
    }

    pub fn out_ports(&self) -> &[OutPort] {
        &self.ports.out_ports
    }

    pub fn in_port(&self, index: usize) -> TaskResult<&InPort> {
        self.ports
            .in_ports
            .get(index)
            .map(|p| p.as_ref())
            .ok_or(TaskError::MissingPort {
                direction: PortDirection::Input,
                index,
            })
    }

    pub fn out_port(&self, index: usize) -> TaskResult<&OutPort> {
        self.ports.out_ports.get(index).ok_or(TaskError::MissingPort {
            direction: PortDirection::Output,
            index,
        })
    }

    /// Send on output `index`; the packet is dropped if the port does not exist.
    pub fn send(&self, index: usize, packet: DataPacket) {
        match self.ports.out_ports.get(index) {
            Some(port) => port.send(packet),
            None => tracing::warn!(
                "{}: no output port {}, dropping packet {}",
                self.id,
                index,
                packet.number()
            ),
        }
    }

    pub fn exit_requested(&self) -> bool {
        self.control.exit_requested()
    }

    pub fn should_run(&self) -> bool {
        !self.control.exit_requested()
    }

    /// Sleep that `stop()` interrupts with `Err(Cancelled)`.
    pub fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
        self.control.sleep(duration)
    }

    /// Empty packet numbered from the shared toolbox context.
    pub fn next_packet(&self) -> DataPacket {
        self.toolbox.new_packet()
    }

    pub fn toolbox(&self) -> &Arc<ToolboxContext> {
        &self.toolbox
    }
}

/// A processing unit with input/output ports and a dedicated thread.
pub struct StreamTask {
    id: Arc<str>,
    logic: Arc<dyn TaskLogic>,
    ports: Arc<TaskPorts>,
    settings: PortSettings,
    disabled: bool,
    running: bool,
    description_path: Option<PathBuf>,
    control: Arc<TaskControl>,
    thread: TaskThread,
    toolbox: Arc<ToolboxContext>,
}

impl StreamTask {
    pub fn builder(id: impl Into<String>) -> StreamTaskBuilder {
        StreamTaskBuilder::new(id)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Identification line used in logs.
    pub fn identify(&self) -> String {
        format!(
            "{} ({} in, {} out{})",
            self.id,
            self.ports.in_ports.len(),
            self.ports.out_ports.len(),
            if self.disabled { ", disabled" } else { "" }
        )
    }

    /// Apply port settings and spawn the run loop.
    ///
    /// No-op when disabled or already running.
    pub fn start(&mut self) {
        self.init_ports();

        if self.running {
            tracing::info!("{}: already running", self.id);
            return;
        }
        if self.disabled {
            tracing::info!("{}: disabled, not starting", self.id);
            self.set_receiving(false);
            return;
        }

        self.control.reset();
        self.set_receiving(true);
        let ctx = TaskContext {
            id: Arc::clone(&self.id),
            ports: Arc::clone(&self.ports),
            control: Arc::clone(&self.control),
            toolbox: Arc::clone(&self.toolbox),
        };
        let logic = Arc::clone(&self.logic);

        if self.thread.init(move || {
            let _idle = IdleOnExit(ctx.in_ports());
            logic.run(&ctx)
        }) {
            self.running = true;
            tracing::info!("{}: started", self.identify());
        } else {
            self.set_receiving(false);
        }
    }

    /// Request exit, cancel every blocking call and join the thread.
    ///
    /// Does nothing if the task was never started.
    pub fn stop(&mut self) {
        if !self.running {
            tracing::debug!("{}: not running", self.id);
            return;
        }

        self.control.request_exit();
        self.running = false;
        for port in &self.ports.in_ports {
            port.cancel_receive();
        }
        self.logic.cancel_blocking_calls();
        self.thread.join();
        tracing::info!("{}: stopped", self.id);
    }

    /// `start()` was called and `stop()` has not been called since.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The run loop is not executing (never started, stopped, or ended on
    /// its own).
    pub fn is_stopped(&self) -> bool {
        !self.thread.is_initialized()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn port_settings(&self) -> PortSettings {
        self.settings
    }

    /// Change the input-port policy; applied to the ports immediately.
    pub fn set_port_settings(&mut self, settings: PortSettings) {
        self.settings = settings;
        self.apply_port_settings();
    }

    pub fn set_in_port_buffer_size(&mut self, size: usize) {
        self.settings.buffer_size = size;
        self.apply_port_settings();
    }

    pub fn set_in_port_lossless(&mut self, lossless: bool) {
        self.settings.lossless = lossless;
        self.apply_port_settings();
    }

    pub fn set_in_port_silent(&mut self, silent: bool) {
        self.settings.silent = silent;
        self.apply_port_settings();
    }

    pub fn in_ports(&self) -> &[Arc<InPort>] {
        &self.ports.in_ports
    }

    pub fn out_ports(&self) -> &[OutPort] {
        &self.ports.out_ports
    }

    pub fn in_port(&self, index: usize) -> Option<Arc<InPort>> {
        self.ports.in_ports.get(index).cloned()
    }

    /// Mutable access to an output port, only while the task is stopped.
    pub fn out_port_mut(&mut self, index: usize) -> PipelineResult<&mut OutPort> {
        let task = self.id.to_string();
        self.ports_mut()?
            .out_ports
            .get_mut(index)
            .ok_or(PipelineError::InvalidPort {
                task,
                direction: PortDirection::Output,
                index,
            })
    }

    /// Connect output `out` of this task to input `input` of `target`.
    pub fn connect(&mut self, out: usize, target: &StreamTask, input: usize) -> PipelineResult<()> {
        let port = target.in_port(input).ok_or_else(|| PipelineError::InvalidPort {
            task: target.id.to_string(),
            direction: PortDirection::Input,
            index: input,
        })?;
        self.connect_port(out, port)
    }

    /// Connect output `out` to an arbitrary input port.
    pub fn connect_port(&mut self, out: usize, port: Arc<InPort>) -> PipelineResult<()> {
        if self.ports.in_ports.iter().any(|p| Arc::ptr_eq(p, &port)) {
            return Err(PipelineError::SelfConnection(self.id.to_string()));
        }
        self.out_port_mut(out)?.connect(port);
        Ok(())
    }

    /// Append `count` input ports. Returns the new number of input ports.
    pub fn add_in_ports(&mut self, count: usize) -> PipelineResult<usize> {
        let settings = self.settings;
        let ports = self.ports_mut()?;
        ports
            .in_ports
            .extend((0..count).map(|_| idle_in_port(&settings)));
        let total = ports.in_ports.len();
        self.assign_port_ids();
        Ok(total)
    }

    /// Append `count` output ports. Returns the new number of output ports.
    pub fn add_out_ports(&mut self, count: usize) -> PipelineResult<usize> {
        let ports = self.ports_mut()?;
        ports.out_ports.extend((0..count).map(|_| OutPort::new()));
        let total = ports.out_ports.len();
        self.assign_port_ids();
        Ok(total)
    }

    /// Replace all input ports with `count` fresh ones.
    ///
    /// Upstream connections to the old ports are not carried over.
    pub fn set_in_port_num(&mut self, count: usize) -> PipelineResult<()> {
        self.ports_mut()?.in_ports.clear();
        self.add_in_ports(count).map(|_| ())
    }

    /// Replace all output ports with `count` unconnected ones.
    pub fn set_out_port_num(&mut self, count: usize) -> PipelineResult<()> {
        self.ports_mut()?.out_ports.clear();
        self.add_out_ports(count).map(|_| ())
    }

    pub fn description_path(&self) -> Option<&Path> {
        self.description_path.as_deref()
    }

    pub fn set_description_path(&mut self, path: impl Into<PathBuf>) {
        self.description_path = Some(path.into());
    }

    /// Contents of the task's description document, or `{}` when none is set.
    pub fn read_description(&self) -> PipelineResult<String> {
        match &self.description_path {
            Some(path) => Ok(std::fs::read_to_string(path)?),
            None => Ok("{}".to_string()),
        }
    }

    pub fn toolbox(&self) -> &Arc<ToolboxContext> {
        &self.toolbox
    }

    fn ports_mut(&mut self) -> PipelineResult<&mut TaskPorts> {
        Arc::get_mut(&mut self.ports).ok_or_else(|| PipelineError::TaskRunning(self.id.to_string()))
    }

    fn init_ports(&mut self) {
        self.apply_port_settings();
        self.assign_port_ids();
    }

    fn set_receiving(&self, receiving: bool) {
        for port in &self.ports.in_ports {
            port.set_receiving(receiving);
        }
    }

    fn apply_port_settings(&self) {
        for port in &self.ports.in_ports {
            port.apply_settings(&self.settings);
        }
    }

    fn assign_port_ids(&mut self) {
        for (i, port) in self.ports.in_ports.iter().enumerate() {
            port.set_id(PortId::new(Arc::clone(&self.id), PortDirection::Input, i));
        }
        // Output ids only change while the port set is exclusively owned.
        let id = Arc::clone(&self.id);
        if let Some(ports) = Arc::get_mut(&mut self.ports) {
            for (i, port) in ports.out_ports.iter_mut().enumerate() {
                port.set_id(PortId::new(Arc::clone(&id), PortDirection::Output, i));
            }
        }
    }
}

impl Drop for StreamTask {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for StreamTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamTask")
            .field("id", &self.id)
            .field("in_ports", &self.ports.in_ports.len())
            .field("out_ports", &self.ports.out_ports.len())
            .field("settings", &self.settings)
            .field("disabled", &self.disabled)
            .field("running", &self.running)
            .finish()
    }
}

/// Builder for [`StreamTask`].
///
/// ```ignore
/// let task = StreamTask::builder("select")
///     .in_ports(1)
///     .out_ports(1)
///     .port_settings(PortSettings::bounded(64))
///     .build(ChannelSelectTask::new(vec![0]));
/// ```
#[derive(Debug, Clone)]
pub struct StreamTaskBuilder {
    id: String,
    in_ports: usize,
    out_ports: usize,
    settings: PortSettings,
    disabled: bool,
    description_path: Option<PathBuf>,
    toolbox: Option<Arc<ToolboxContext>>,
}

impl StreamTaskBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            in_ports: 0,
            out_ports: 0,
            settings: PortSettings::default(),
            disabled: false,
            description_path: None,
            toolbox: None,
        }
    }

    pub fn in_ports(mut self, count: usize) -> Self {
        self.in_ports = count;
        self
    }

    pub fn out_ports(mut self, count: usize) -> Self {
        self.out_ports = count;
        self
    }

    pub fn port_settings(mut self, settings: PortSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn buffer_size(mut self, size: usize) -> Self {
        self.settings.buffer_size = size;
        self
    }

    pub fn lossless(mut self, lossless: bool) -> Self {
        self.settings.lossless = lossless;
        self
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.settings.silent = silent;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn description_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.description_path = Some(path.into());
        self
    }

    /// Share packet numbering and the serialization lock with other tasks.
    pub fn context(mut self, toolbox: Arc<ToolboxContext>) -> Self {
        self.toolbox = Some(toolbox);
        self
    }

    /// Builder for the task described by `config`.
    pub fn from_config(config: &TaskConfig, defaults: &PortSettings) -> Self {
        Self::new(config.id.clone()).apply_config(Some(config), defaults)
    }

    /// Apply a per-task config entry on top of `defaults`.
    pub fn apply_config(mut self, config: Option<&TaskConfig>, defaults: &PortSettings) -> Self {
        self.settings = *defaults;
        if let Some(config) = config {
            if let Some(settings) = config.port_settings {
                self.settings = settings;
            }
            self.disabled = config.disabled;
            if let Some(path) = &config.description_path {
                self.description_path = Some(path.clone());
            }
        }
        self
    }

    pub fn build(self, logic: impl TaskLogic) -> StreamTask {
        self.build_shared(Arc::new(logic))
    }

    /// Build around logic the caller keeps a handle to.
    pub fn build_shared(self, logic: Arc<dyn TaskLogic>) -> StreamTask {
        let id: Arc<str> = Arc::from(self.id);
        let ports = TaskPorts {
            in_ports: (0..self.in_ports)
                .map(|_| idle_in_port(&self.settings))
                .collect(),
            out_ports: (0..self.out_ports).map(|_| OutPort::new()).collect(),
        };

        let mut task = StreamTask {
            thread: TaskThread::new(Arc::clone(&id)),
            id,
            logic,
            ports: Arc::new(ports),
            settings: self.settings,
            disabled: self.disabled,
            running: false,
            description_path: self.description_path,
            control: Arc::new(TaskControl::default()),
            toolbox: self.toolbox.unwrap_or_else(ToolboxContext::shared),
        };
        task.assign_port_ids();
        task
    }
}

/// Stops lossless producers from waiting on ports whose run loop has
/// returned or unwound.
struct IdleOnExit<'a>(&'a [Arc<InPort>]);

impl Drop for IdleOnExit<'_> {
    fn drop(&mut self) {
        for port in self.0 {
            port.set_receiving(false);
        }
    }
}

/// Input port of a task whose run loop is not consuming yet.
fn idle_in_port(settings: &PortSettings) -> Arc<InPort> {
    let port = InPort::with_settings(settings);
    port.set_receiving(false);
    Arc::new(port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    /// Forwards packets from in0 to out0, counting run-loop entries.
    #[derive(Default)]
    struct Forward {
        runs: AtomicUsize,
    }

    impl TaskLogic for Forward {
        fn run(&self, ctx: &TaskContext) -> TaskResult<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            let port = ctx.in_port(0)?;
            while ctx.should_run() {
                match port.receive(Duration::ZERO) {
                    Ok(Some(p)) => ctx.send(0, p),
                    Ok(None) => {}
                    Err(Cancelled) => break,
                }
            }
            Ok(())
        }
    }

    fn forward_task(id: &str) -> (StreamTask, Arc<Forward>) {
        let logic = Arc::new(Forward::default());
        let task = StreamTask::builder(id)
            .in_ports(1)
            .out_ports(1)
            .build_shared(logic.clone());
        (task, logic)
    }

    #[test]
    fn test_builder_assigns_ids_and_settings() {
        let (task, _) = forward_task("fwd");
        assert_eq!(task.in_ports()[0].id().to_string(), "fwd:in0");
        assert_eq!(task.out_ports()[0].id().to_string(), "fwd:out0");
        assert_eq!(task.in_ports()[0].max_queue_size(), 9999);
        assert!(task.is_stopped());
        assert!(!task.is_running());
    }

    #[test]
    fn test_start_twice_runs_once() {
        let (mut task, logic) = forward_task("twice");
        task.start();
        task.start();
        assert!(task.is_running());
        task.stop();
        assert_eq!(logic.runs.load(Ordering::SeqCst), 1);
        assert!(task.is_stopped());
    }

    #[test]
    fn test_stop_without_start_returns() {
        let (mut task, _) = forward_task("idle");
        task.stop();
        assert!(!task.is_running());
    }

    #[test]
    fn test_restart_after_stop() {
        let (mut task, logic) = forward_task("restart");
        let sink = Arc::new(InPort::new());
        task.connect_port(0, Arc::clone(&sink)).unwrap();

        task.start();
        task.stop();
        task.start();
        task.in_ports()[0].enqueue(DataPacket::new(3));
        let got = sink.receive(Duration::from_secs(5)).unwrap();
        task.stop();

        assert_eq!(got.map(|p| p.number()), Some(3));
        assert_eq!(logic.runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_disabled_task_does_not_start() {
        let logic = Arc::new(Forward::default());
        let mut task = StreamTask::builder("off")
            .in_ports(1)
            .disabled(true)
            .build_shared(logic.clone());
        task.start();
        assert!(!task.is_running());
        assert!(task.is_stopped());
        assert_eq!(logic.runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_rewiring_rejected_while_running() {
        let (mut task, _) = forward_task("busy");
        task.start();
        assert!(matches!(task.add_in_ports(1), Err(PipelineError::TaskRunning(_))));
        assert!(matches!(
            task.connect_port(0, Arc::new(InPort::new())),
            Err(PipelineError::TaskRunning(_))
        ));
        task.stop();
        assert_eq!(task.add_in_ports(1).unwrap(), 2);
        assert_eq!(task.in_ports()[1].id().to_string(), "busy:in1");
    }

    #[test]
    fn test_connect_invalid_ports() {
        let (mut a, _) = forward_task("a");
        let (b, _) = forward_task("b");
        assert!(matches!(
            a.connect(3, &b, 0),
            Err(PipelineError::InvalidPort { direction: PortDirection::Output, index: 3, .. })
        ));
        assert!(matches!(
            a.connect(0, &b, 5),
            Err(PipelineError::InvalidPort { direction: PortDirection::Input, index: 5, .. })
        ));
        a.connect(0, &b, 0).unwrap();
        assert_eq!(a.out_ports()[0].receiver_count(), 1);
    }

    #[test]
    fn test_settings_applied_on_start() {
        let (mut task, _) = forward_task("cfg");
        task.in_ports()[0].set_max_queue_size(1);
        task.start();
        assert_eq!(task.in_ports()[0].max_queue_size(), 9999);
        task.stop();

        task.set_in_port_buffer_size(4);
        task.set_in_port_lossless(true);
        assert_eq!(task.in_ports()[0].max_queue_size(), 4);
        assert!(task.in_ports()[0].is_lossless());
    }

    #[test]
    fn test_self_connection_rejected() {
        let (mut task, _) = forward_task("loop");
        let own = task.in_port(0).unwrap();
        assert!(matches!(
            task.connect_port(0, own),
            Err(PipelineError::SelfConnection(_))
        ));
    }

    #[test]
    fn test_from_config() {
        let mut config = TaskConfig::new("configured");
        config.description_path = Some(PathBuf::from("/tmp/configured.json"));
        let task = StreamTaskBuilder::from_config(&config, &PortSettings::bounded(32))
            .in_ports(1)
            .build(Forward::default());
        assert_eq!(task.id(), "configured");
        assert!(!task.is_disabled());
        assert_eq!(task.in_ports()[0].max_queue_size(), 32);
        assert_eq!(task.description_path(), Some(Path::new("/tmp/configured.json")));
    }

    #[test]
    fn test_set_port_nums() {
        let (mut task, _) = forward_task("resize");
        task.set_in_port_num(3).unwrap();
        task.set_out_port_num(2).unwrap();
        assert_eq!(task.in_ports().len(), 3);
        assert_eq!(task.out_ports().len(), 2);
        assert_eq!(task.out_ports()[1].id().to_string(), "resize:out1");
        assert_eq!(task.identify(), "resize (3 in, 2 out)");
    }

    #[test]
    fn test_missing_port_ends_run_loop() {
        let logic = Arc::new(Forward::default());
        let mut task = StreamTask::builder("noports").build_shared(logic.clone());
        task.start();
        let deadline = Instant::now() + Duration::from_secs(5);
        while !task.is_stopped() {
            assert!(Instant::now() < deadline);
            std::thread::sleep(Duration::from_millis(2));
        }
        // Still considered running until stopped explicitly.
        assert!(task.is_running());
        task.stop();
    }

    #[test]
    fn test_read_description() {
        let (mut task, _) = forward_task("doc");
        assert_eq!(task.read_description().unwrap(), "{}");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, r#"{"name":"doc"}"#).unwrap();
        task.set_description_path(&path);
        assert_eq!(task.read_description().unwrap(), r#"{"name":"doc"}"#);

        task.set_description_path(dir.path().join("missing.json"));
        assert!(matches!(task.read_description(), Err(PipelineError::Io(_))));
    }

    #[test]
    fn test_sleep_interrupted_by_stop() {
        struct Sleeper;
        impl TaskLogic for Sleeper {
            fn run(&self, ctx: &TaskContext) -> TaskResult<()> {
                ctx.sleep(Duration::from_secs(60))?;
                Ok(())
            }
        }

        let mut task = StreamTask::builder("sleepy").build(Sleeper);
        task.start();
        std::thread::sleep(Duration::from_millis(20));
        let start = Instant::now();
        task.stop();
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_apply_config() {
        let config = TaskConfig {
            id: "x".into(),
            disabled: true,
            port_settings: Some(PortSettings::bounded(8)),
            description_path: None,
        };
        let task = StreamTask::builder("x")
            .in_ports(1)
            .apply_config(Some(&config), &PortSettings::default())
            .build(Forward::default());
        assert!(task.is_disabled());
        assert_eq!(task.port_settings().buffer_size, 8);
        assert_eq!(task.in_ports()[0].max_queue_size(), 8);
    }
}
