//! Start/stop behavior, rewiring rules and failure isolation of stream tasks

mod common;

use common::builders::PacketBuilder;
use common::tasks::{Faulty, Idle, Recorder, Relay};
use common::{expect_packet, test_timeout};
use crn_toolbox::config::TaskConfig;
use crn_toolbox::pipeline::{
    ChannelSelectTask, GeneratorTask, InPort, PipelineError, PortSettings, StreamTask,
    StreamTaskBuilder,
};
use crn_toolbox::ToolboxContext;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn relay(id: &str) -> (StreamTask, Arc<Relay>) {
    let logic = Arc::new(Relay::default());
    let task = StreamTask::builder(id)
        .in_ports(1)
        .out_ports(1)
        .build_shared(logic.clone());
    (task, logic)
}

#[test]
fn test_stop_interrupts_blocking_receive() {
    let (mut task, _) = relay("blocked");
    task.start();
    thread::sleep(Duration::from_millis(20));

    let start = Instant::now();
    task.stop();
    assert!(start.elapsed() < test_timeout());
    assert!(!task.is_running());
    assert!(task.is_stopped());
}

#[test]
fn test_stop_interrupts_sleep() {
    let mut task = StreamTask::builder("sleeper").build(Idle);
    task.start();
    thread::sleep(Duration::from_millis(20));

    let start = Instant::now();
    task.stop();
    assert!(start.elapsed() < test_timeout());
}

#[test]
fn test_restart_after_stop() {
    let (mut task, logic) = relay("again");
    let sink = Arc::new(InPort::new());
    task.connect_port(0, Arc::clone(&sink)).unwrap();
    let input = task.in_port(0).unwrap();

    for round in 0..3u64 {
        task.start();
        input.enqueue(PacketBuilder::new(round).build());
        assert_eq!(expect_packet(&sink).number(), round);
        task.stop();
    }
    assert_eq!(logic.runs.load(Ordering::SeqCst), 3);
}

#[test]
fn test_disabled_task_is_not_started() {
    let logic = Arc::new(Relay::default());
    let mut task = StreamTask::builder("off")
        .in_ports(1)
        .disabled(true)
        .build_shared(logic.clone());

    task.start();
    assert!(!task.is_running());
    assert!(task.identify().contains("disabled"));
    task.stop();
    assert_eq!(logic.runs.load(Ordering::SeqCst), 0);

    task.set_disabled(false);
    task.start();
    assert!(task.is_running());
    task.stop();
    assert_eq!(logic.runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_rewiring_requires_stopped_task() {
    let (mut upstream, _) = relay("up");
    let (downstream, _) = relay("down");

    upstream.start();
    assert!(matches!(
        upstream.connect(0, &downstream, 0),
        Err(PipelineError::TaskRunning(_))
    ));
    assert!(matches!(upstream.add_out_ports(1), Err(PipelineError::TaskRunning(_))));
    upstream.stop();

    upstream.connect(0, &downstream, 0).unwrap();
    assert_eq!(upstream.add_out_ports(1).unwrap(), 2);
    assert_eq!(upstream.out_ports()[1].id().to_string(), "up:out1");
}

#[test]
fn test_invalid_port_indices() {
    let (mut upstream, _) = relay("up");
    let (downstream, _) = relay("down");

    assert!(matches!(
        upstream.connect(3, &downstream, 0),
        Err(PipelineError::InvalidPort { index: 3, .. })
    ));
    assert!(matches!(
        upstream.connect(0, &downstream, 7),
        Err(PipelineError::InvalidPort { index: 7, .. })
    ));
}

#[test]
fn test_failing_run_loop_is_contained() {
    for panic in [false, true] {
        let logic = Arc::new(Faulty::new(panic));
        let mut task = StreamTask::builder("faulty").build_shared(logic.clone());
        task.start();

        let deadline = Instant::now() + test_timeout();
        while !task.is_stopped() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(task.is_stopped(), "run loop did not end (panic: {})", panic);

        task.stop();
        assert_eq!(logic.runs.load(Ordering::SeqCst), 1);
    }
}

#[test]
fn test_port_settings_applied_on_start() {
    let (mut task, _) = relay("tuned");
    let input = task.in_port(0).unwrap();
    input.set_max_queue_size(3);

    task.set_port_settings(PortSettings::bounded(8).with_lossless(true));
    task.start();
    assert_eq!(input.max_queue_size(), 8);
    assert!(input.is_lossless());
    task.stop();
}

#[test]
fn test_packets_numbered_from_shared_context() {
    let toolbox = ToolboxContext::shared();
    let recorder = Arc::new(Recorder::default());
    let mut sink = StreamTask::builder("record")
        .in_ports(1)
        .context(Arc::clone(&toolbox))
        .build_shared(recorder.clone());

    let config = TaskConfig::new("record-2");
    let builder = StreamTaskBuilder::from_config(&config, &PortSettings::default());
    let other = builder.context(Arc::clone(&toolbox)).build(Idle);
    assert!(Arc::ptr_eq(sink.toolbox(), other.toolbox()));

    sink.start();
    let input = sink.in_port(0).unwrap();
    for _ in 0..3 {
        input.enqueue(toolbox.new_packet());
    }
    let deadline = Instant::now() + test_timeout();
    while recorder.numbers.lock().len() < 3 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    sink.stop();

    assert_eq!(*recorder.numbers.lock(), vec![0, 1, 2]);
    assert_eq!(toolbox.packets_created(), 3);
}

/// Stop `task` on a helper thread; fails if it does not return in time.
fn stop_within_timeout(mut task: StreamTask) -> StreamTask {
    let (tx, rx) = crossbeam_channel::bounded(1);
    thread::spawn(move || {
        task.stop();
        let _ = tx.send(task);
    });
    rx.recv_timeout(test_timeout())
        .expect("stop() blocked on a lossless port nobody consumes")
}

fn lossless_select(id: &str, disabled: bool) -> StreamTask {
    StreamTask::builder(id)
        .in_ports(1)
        .out_ports(1)
        .port_settings(PortSettings::bounded(2).with_lossless(true).with_silent(true))
        .disabled(disabled)
        .build(ChannelSelectTask::new(vec![0]))
}

#[test]
fn test_producer_stops_when_lossless_consumer_is_disabled() {
    let mut generator = StreamTask::builder("gen")
        .out_ports(1)
        .build(GeneratorTask::new(Duration::ZERO));
    let mut select = lossless_select("select", true);
    generator.connect(0, &select, 0).unwrap();

    select.start();
    generator.start();
    thread::sleep(Duration::from_millis(50));

    let generator = stop_within_timeout(generator);
    assert!(generator.is_stopped());
    let input = select.in_port(0).unwrap();
    assert_eq!(input.len(), 2);
    assert!(input.dropped_packets() > 0);
}

#[test]
fn test_producer_stops_when_lossless_consumer_never_started() {
    let mut generator = StreamTask::builder("gen")
        .out_ports(1)
        .build(GeneratorTask::new(Duration::ZERO));
    let select = lossless_select("select", false);
    generator.connect(0, &select, 0).unwrap();

    generator.start();
    thread::sleep(Duration::from_millis(50));

    stop_within_timeout(generator);
    assert!(select.in_port(0).unwrap().dropped_packets() > 0);
}

#[test]
fn test_producer_stops_when_lossless_consumer_failed() {
    let mut generator = StreamTask::builder("gen")
        .out_ports(1)
        .build(GeneratorTask::new(Duration::ZERO));
    let mut faulty = StreamTask::builder("faulty")
        .in_ports(1)
        .port_settings(PortSettings::bounded(2).with_lossless(true).with_silent(true))
        .build(Faulty::new(true));
    generator.connect(0, &faulty, 0).unwrap();

    faulty.start();
    let deadline = Instant::now() + test_timeout();
    while !faulty.is_stopped() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    generator.start();
    thread::sleep(Duration::from_millis(50));

    stop_within_timeout(generator);
    faulty.stop();
}

#[test]
fn test_lossless_consumer_holds_back_producer_while_running() {
    let recorder = Arc::new(Recorder::default());
    let mut sink = StreamTask::builder("record")
        .in_ports(1)
        .port_settings(PortSettings::bounded(1).with_lossless(true))
        .build_shared(recorder.clone());
    let mut generator = StreamTask::builder("gen")
        .out_ports(1)
        .build(GeneratorTask::new(Duration::ZERO).with_limit(50));
    generator.connect(0, &sink, 0).unwrap();

    sink.start();
    generator.start();
    let deadline = Instant::now() + test_timeout();
    while recorder.numbers.lock().len() < 50 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    generator.stop();
    sink.stop();

    assert_eq!(recorder.numbers.lock().len(), 50);
    assert_eq!(sink.in_ports()[0].dropped_packets(), 0);
}
