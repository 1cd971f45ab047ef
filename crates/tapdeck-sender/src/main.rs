//! TapDeck sender entry point.
//!
//! Reads touch input (a recorded trace file, or a live trace piped on stdin by
//! the platform touch shim), classifies it, and sends the resulting key and
//! trackpad messages to the receiver over UDP.
//!
//! # Usage
//!
//! ```text
//! tapdeck-sender [OPTIONS]
//!
//! Options:
//!   --config <PATH>   Config file [default: platform config dir]
//!   --target <HOST>   Receiver host name or IP
//!   --port   <PORT>   Receiver UDP port [default: 8888]
//!   --mode   <MODE>   relative | absolute
//!   --trace  <PATH>   Touch trace to replay; `-` or absent reads stdin
//!   --width  <PX>     Initial surface width
//!   --height <PX>     Initial surface height
//! ```
//!
//! Every option can also be set through a `TAPDECK_*` environment variable
//! (`TAPDECK_TARGET`, `TAPDECK_PORT`, ...).  Command-line and environment
//! values override the config file.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load config, apply CLI overrides
//!  └─ start services
//!       ├─ TraceInputSource     (reader thread)
//!       ├─ ProcessTouchUseCase  (input thread, owns the classifier)
//!       └─ OutboundWorker       (Tokio task, owns the UDP socket)
//! ```

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tapdeck_core::{Mode, ModeHandle, TouchClassifier};
use tapdeck_sender::application::process_touch::ProcessTouchUseCase;
use tapdeck_sender::infrastructure::input_source::trace::TraceInputSource;
use tapdeck_sender::infrastructure::input_source::InputSource;
use tapdeck_sender::infrastructure::network::{OutboundQueue, UdpTransport};
use tapdeck_sender::infrastructure::storage::config::{load_config, load_config_from, AppConfig};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// TapDeck sender: turns a touchscreen into a remote keyboard and trackpad.
#[derive(Debug, Parser)]
#[command(name = "tapdeck-sender", version)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, env = "TAPDECK_CONFIG")]
    config: Option<PathBuf>,

    /// Host name or IP address of the receiving machine.
    #[arg(long, env = "TAPDECK_TARGET")]
    target: Option<String>,

    /// UDP port of the receiver.
    #[arg(long, env = "TAPDECK_PORT")]
    port: Option<u16>,

    /// Trackpad mode at startup (`relative` or `absolute`).
    #[arg(long, env = "TAPDECK_MODE")]
    mode: Option<Mode>,

    /// Touch trace to replay.  Reads standard input when absent or `-`.
    #[arg(long, env = "TAPDECK_TRACE")]
    trace: Option<PathBuf>,

    /// Surface width used until the input reports a resize.
    #[arg(long, env = "TAPDECK_WIDTH")]
    width: Option<f32>,

    /// Surface height used until the input reports a resize.
    #[arg(long, env = "TAPDECK_HEIGHT")]
    height: Option<f32>,
}

impl Cli {
    /// Loads the config file named on the command line (or the platform
    /// default) and applies every CLI override on top of it.
    ///
    /// Returns the resulting config and the trace path, if any.
    fn into_config(self) -> anyhow::Result<(AppConfig, Option<PathBuf>)> {
        let mut config = match &self.config {
            Some(path) => load_config_from(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => load_config().context("failed to load config")?,
        };

        if let Some(target) = self.target {
            config.network.target_host = target;
        }
        if let Some(port) = self.port {
            config.network.target_port = port;
        }
        if let Some(mode) = self.mode {
            config.sender.mode = mode;
        }
        if let Some(width) = self.width {
            config.sender.surface_width = width;
        }
        if let Some(height) = self.height {
            config.sender.surface_height = height;
        }

        let trace = self.trace.filter(|p| p.as_os_str() != "-");
        Ok((config, trace))
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, trace) = Cli::parse().into_config()?;

    // Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.sender.log_level)),
        )
        .init();

    config.validate().context("invalid configuration")?;
    info!("TapDeck sender starting");

    // ── Outbound path ─────────────────────────────────────────────────────────
    let transport = UdpTransport::connect(
        &config.network.bind_address,
        &config.network.target_host,
        config.network.target_port,
    )
    .await
    .context("failed to open UDP transport")?;
    let (queue, sender_task) =
        OutboundQueue::spawn(config.network.queue_capacity, Arc::new(transport));

    // ── Input source ──────────────────────────────────────────────────────────
    let source = match &trace {
        Some(path) => TraceInputSource::open(path)?,
        None => TraceInputSource::stdin(),
    };
    let events = source.start().context("failed to start input source")?;

    // Shutdown flag shared between the signal handler and the input thread.
    let running = Arc::new(AtomicBool::new(true));

    // ── Input thread ──────────────────────────────────────────────────────────
    let classifier = TouchClassifier::new(
        config.sender.surface_width,
        config.sender.surface_height,
        config.layout.clone(),
        config.touch,
        ModeHandle::new(config.sender.mode),
    );
    let mut use_case = ProcessTouchUseCase::new(classifier, Arc::new(queue.clone()));
    let input_running = Arc::clone(&running);
    let input_thread = std::thread::Builder::new()
        .name("tapdeck-input".to_string())
        .spawn(move || use_case.run(&events, &input_running))
        .context("failed to spawn input thread")?;

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let running_clone = Arc::clone(&running);
    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_clone = Arc::clone(&interrupted);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            interrupted_clone.store(true, Ordering::Relaxed);
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    info!(mode = %config.sender.mode, "TapDeck sender ready.  Press Ctrl-C to exit.");

    // Block until the input ends or the user interrupts.
    while running.load(Ordering::Relaxed) && !input_thread.is_finished() {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    source.stop();
    running.store(false, Ordering::Relaxed);
    let stats = match input_thread.join() {
        Ok(stats) => stats,
        Err(_) => anyhow::bail!("input thread panicked"),
    };

    if interrupted.load(Ordering::Relaxed) {
        queue.disconnect();
    }
    drop(queue);
    let outbound = sender_task.await.context("sender task failed")?;

    if stats.datagrams_dropped > 0 {
        warn!(dropped = stats.datagrams_dropped, "some datagrams were dropped");
    }
    info!(
        events = stats.events_produced,
        sent = outbound.sent,
        failed = outbound.failed,
        "TapDeck sender stopped"
    );
    Ok(())
}
