mod console;
mod metrics;
mod stage;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::signal;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use holosync_core::{
    load_device_config, validate_config, ConfigError, DeviceConfig, ExperienceSession,
    ReadinessError, ReadinessOutcome, SessionPhase,
};

use console::Command;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

type ReadinessTask = JoinHandle<Result<ReadinessOutcome, ReadinessError>>;

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            1
        }
    };
    // The blocking stdin reader would otherwise hold up runtime shutdown.
    std::process::exit(code);
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(version = VERSION, "Starting holosync device");

    let config_path = std::env::var("HOLOSYNC_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("holosync.toml"));
    let config = load_config_or_default(&config_path)?;
    validate_config(&config).context("Configuration validation failed")?;
    info!("Assets root: {:?}", config.assets.root);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            info!("Shutdown signal received");
            cancel.cancel();
        });
    }

    let mut session = ExperienceSession::new(config.clone(), stage::console_stage());
    if let Err(e) = session.initialize(&cancel).await {
        report_halt(&session);
        print_metrics();
        return Err(e).context("Experience failed to initialize");
    }

    let result = drive(&mut session, &config, &cancel).await;

    session.shutdown();
    print_metrics();
    result
}

/// Frame loop: renders frames, reacts to operator commands and collects the
/// readiness task once it finishes.
async fn drive(
    session: &mut ExperienceSession,
    config: &DeviceConfig,
    cancel: &CancellationToken,
) -> Result<()> {
    let (mut commands, _reader) = console::spawn_reader();
    let mut frames = tokio::time::interval(config.playback.frame_interval());
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut readiness: Option<ReadinessTask> = None;
    let mut auto_ready = config.playback.auto_ready;
    let mut prompted = false;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = frames.tick() => {
                if readiness.as_ref().is_some_and(|task| task.is_finished()) {
                    if let Some(task) = readiness.take() {
                        let result = task.await.context("Readiness task failed")?;
                        if let Err(e) = session.finish_readiness(result) {
                            warn!(error = %e, "Readiness handshake did not start playback");
                        }
                    }
                }

                if session.phase() == &SessionPhase::AwaitingOperator && readiness.is_none() {
                    if auto_ready {
                        auto_ready = false;
                        readiness = Some(session.spawn_readiness(cancel.child_token())?);
                    } else if !prompted {
                        prompted = true;
                        info!("Primary media prepared. Type `ready` to announce this device");
                    }
                }

                if let Some(report) = session.tick() {
                    metrics::OVERLAYS_LIVE.set(session.overlays().live_count() as i64);
                    if !report.retired.is_empty() {
                        debug!(main_time = report.main_time, retired = ?report.retired, "Overlays retired");
                    }
                }

                if session.phase().is_halted() {
                    report_halt(session);
                    anyhow::bail!("Experience halted");
                }
            }
            Some(command) = commands.recv() => {
                handle_command(session, command, &mut readiness, cancel)?;
            }
        }
    }

    if let Some(task) = readiness.take() {
        task.abort();
    }
    Ok(())
}

fn handle_command(
    session: &mut ExperienceSession,
    command: Command,
    readiness: &mut Option<ReadinessTask>,
    cancel: &CancellationToken,
) -> Result<()> {
    match command {
        Command::Ready => {
            metrics::COMMANDS_TOTAL.with_label_values(&["ready"]).inc();
            if readiness.is_some() {
                warn!("Already waiting for the start signal");
            } else if session.phase() == &SessionPhase::AwaitingOperator {
                *readiness = Some(session.spawn_readiness(cancel.child_token())?);
            } else {
                warn!(phase = %session.phase(), "Device cannot be marked ready now");
            }
        }
        Command::Marker(event) => {
            metrics::COMMANDS_TOTAL.with_label_values(&["marker"]).inc();
            let matched = session.on_marker_event(&event);
            if matched == 0 {
                warn!(marker_id = %event.marker_id, "No live overlay uses this marker");
            }
        }
        Command::Skip(skip) => {
            metrics::COMMANDS_TOTAL.with_label_values(&["skip"]).inc();
            if session.debug_command(skip) {
                info!(minutes = skip.minutes(), main_time = session.main_time(), "Skipped ahead");
            }
        }
        Command::Status => {
            metrics::COMMANDS_TOTAL.with_label_values(&["status"]).inc();
            let status = serde_json::json!({
                "phase": session.phase(),
                "since": session.phase_changed_at().to_rfc3339(),
                "main_time": session.main_time(),
                "layer": session.layer(),
                "live_overlays": session.overlays().live_count(),
            });
            info!("Status: {}", status);
        }
        Command::Quit => {
            metrics::COMMANDS_TOTAL.with_label_values(&["quit"]).inc();
            cancel.cancel();
        }
    }
    Ok(())
}

fn load_config_or_default(path: &Path) -> Result<DeviceConfig> {
    info!("Loading configuration from {:?}", path);
    match load_device_config(path) {
        Ok(config) => Ok(config),
        Err(ConfigError::ConfigMissing(_)) => {
            info!("No configuration file, using defaults");
            Ok(DeviceConfig::default())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to load config from {:?}", path)),
    }
}

fn report_halt(session: &ExperienceSession) {
    if let SessionPhase::Halted { reason } = session.phase() {
        error!(since = %session.phase_changed_at(), "HALTED: {}", reason);
    }
}

fn print_metrics() {
    debug!("Final metrics:\n{}", metrics::encode_metrics());
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
