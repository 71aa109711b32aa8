//! CRN Toolbox - Main Entry Point
//!
//! Runs the bundled demo pipeline: a generator feeding a channel selector
//! whose output is collected on the main thread for the configured time.
//!
//! Usage: `crn-toolbox [config-path]`

use crn_toolbox::{
    config::{default_config_path, LoggingConfig, ToolboxConfig},
    pipeline::{ChannelSelectTask, ChannelSinkTask, GeneratorTask, StreamTask, Timer},
    ResultExt, ToolboxContext,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(default_config_path);
    let config = match &config_path {
        Some(path) => ToolboxConfig::load_or_default(path),
        None => ToolboxConfig::default(),
    };

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(&config.logging);

    tracing::info!("Starting CRN Toolbox");
    if let Some(path) = &config_path {
        tracing::debug!("Configuration path: {:?}", path);
    }

    let toolbox = ToolboxContext::shared();
    let (packet_tx, packet_rx) = crossbeam_channel::unbounded();

    let mut generator_logic = GeneratorTask::new(Duration::from_millis(config.demo.period_ms));
    if let Some(id) = config.demo.stream_id {
        generator_logic = generator_logic.with_stream_id(id);
    }

    let mut generator = StreamTask::builder("generator")
        .out_ports(1)
        .context(Arc::clone(&toolbox))
        .apply_config(config.task("generator"), &config.defaults)
        .build(generator_logic);
    let mut select = StreamTask::builder("select")
        .in_ports(1)
        .out_ports(1)
        .context(Arc::clone(&toolbox))
        .apply_config(config.task("select"), &config.defaults)
        .build(ChannelSelectTask::new(config.demo.select_channels.clone()));
    let sink_logic = Arc::new(ChannelSinkTask::new(packet_tx));
    let mut sink = StreamTask::builder("sink")
        .in_ports(1)
        .context(Arc::clone(&toolbox))
        .apply_config(config.task("sink"), &config.defaults)
        .build_shared(sink_logic.clone());

    generator
        .connect(0, &select, 0)
        .context("Failed to connect generator to select")?;
    select
        .connect(0, &sink, 0)
        .context("Failed to connect select to sink")?;

    // Downstream first so nothing is produced into a stopped consumer
    for task in [&mut sink, &mut select, &mut generator] {
        tracing::info!("Starting {}", task.identify());
        task.start();
    }

    let (done_tx, done_rx) = crossbeam_channel::bounded(1);
    let run_for = Duration::from_secs(config.run_seconds);
    let _deadline = Timer::new(Instant::now() + run_for, move |_| {
        let _ = done_tx.try_send(());
    });

    let mut received = 0u64;
    loop {
        crossbeam_channel::select! {
            recv(packet_rx) -> msg => match msg {
                Ok(packet) => {
                    received += 1;
                    tracing::trace!("{}", packet);
                }
                Err(_) => break,
            },
            recv(done_rx) -> _ => break,
        }
    }

    for task in [&mut generator, &mut select, &mut sink] {
        task.stop();
    }

    tracing::info!(
        "Received {} packets ({} forwarded by sink, {} created)",
        received,
        sink_logic.forwarded(),
        toolbox.packets_created()
    );
    Ok(())
}

/// Install the tracing subscriber; adds a daily-rotated file layer when a
/// log directory is configured.
fn init_logging(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());

    match &logging.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "crn-toolbox.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}
