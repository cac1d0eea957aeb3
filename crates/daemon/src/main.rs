// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gst-managerd`: the supervisory daemon binary. Wires the Persistence
//! Store, Instance Supervisor, Signal Monitor, Auto-Instance Controller,
//! and Event Manager together behind the `org.gstmanager.Daemon1` bus
//! façade, and drives graceful shutdown on SIGINT/SIGTERM.
//!
//! Only `--foreground`, `--state-dir`, and `--version` are accepted as
//! process arguments; every other knob is environment-variable driven
//! through [`gst_manager_daemon::env`].

use gst_manager_core::SystemClock;
use gst_manager_daemon::{
    env, AutoController, BusService, EventManager, HdmiMonitor, Supervisor,
    UnavailableDiscoveryProvider, UnavailableGenerationAgent, BUS_NAME, OBJECT_PATH,
};
use gst_manager_storage::Store;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

struct Args {
    foreground: bool,
    state_dir: Option<PathBuf>,
    version: bool,
}

fn parse_args() -> Args {
    let mut args = Args { foreground: false, state_dir: None, version: false };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--foreground" => args.foreground = true,
            "--state-dir" => args.state_dir = iter.next().map(PathBuf::from),
            "--version" => args.version = true,
            other => {
                eprintln!("gst-managerd: unrecognized argument: {other}");
            }
        }
    }
    args
}

fn init_tracing(state_dir: &std::path::Path) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_env("GSTMGR_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let log_dir = state_dir.join("logs");
    if std::fs::create_dir_all(&log_dir).is_err() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return None;
    }

    let file_appender = tracing_appender::rolling::daily(&log_dir, "gst-managerd.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr.and(non_blocking))
        .init();

    Some(guard)
}

fn main() -> ExitCode {
    let args = parse_args();

    if args.version {
        println!("gst-managerd {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    if !args.foreground {
        tracing::warn!("background daemonization is not implemented; running in foreground");
    }

    let state_dir = match args.state_dir.or_else(|| env::state_dir().ok()) {
        Some(dir) => dir,
        None => {
            eprintln!("gst-managerd: could not resolve a state directory (set GSTMGR_STATE_DIR or HOME)");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = std::fs::create_dir_all(&state_dir) {
        eprintln!("gst-managerd: failed to create state dir {}: {e}", state_dir.display());
        return ExitCode::FAILURE;
    }

    let _log_guard = init_tracing(&state_dir);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("gst-managerd: failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(state_dir)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "daemon exited with error");
            ExitCode::FAILURE
        }
    }
}

async fn run(state_dir: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(state_dir = %state_dir.display(), "starting gst-managerd");

    let store = Arc::new(Store::new(&state_dir));
    let daemon_settings = store.load_daemon_config()?;

    let supervisor = Arc::new(Supervisor::new(store.clone(), Arc::new(SystemClock)));
    supervisor.load_from_store()?;
    tracing::info!(count = supervisor.list().len(), "loaded instances from store");

    let auto_controller = Arc::new(AutoController::new(supervisor.clone(), store.clone()));
    auto_controller.load()?;

    let hdmi_sysfs_root = daemon_settings.hdmi_sysfs_root.clone().map(PathBuf::from).or_else(env::hdmi_sysfs_root);

    let mut monitor = HdmiMonitor::new(None);
    if let Some(root) = hdmi_sysfs_root.clone() {
        monitor = monitor.with_sysfs_root(root);
    }
    let monitor = Arc::new(monitor);

    let (events_tx, events_rx) = broadcast::channel(256);

    let mut event_manager = EventManager::new(supervisor.clone(), auto_controller.clone(), None, events_tx.clone());
    if let Some(root) = hdmi_sysfs_root {
        event_manager = event_manager.with_tx_sysfs_root(root);
    }
    let event_manager = Arc::new(event_manager);

    // The Supervisor owns its own broadcast channel; forward each of
    // its status transitions onto the shared channel the bus façade fans
    // signals out from.
    let mut supervisor_events = supervisor.subscribe();
    let forward_events_tx = events_tx.clone();
    tokio::spawn(async move {
        while let Ok(event) = supervisor_events.recv().await {
            let _ = forward_events_tx.send(event);
        }
    });

    let event_manager_token = event_manager.clone().spawn(monitor.clone());

    let bus_name = daemon_settings.bus_name.or_else(env::bus_name).unwrap_or_else(|| BUS_NAME.to_string());

    let service = BusService::new(
        supervisor.clone(),
        auto_controller.clone(),
        monitor.clone(),
        event_manager.clone(),
        Arc::new(UnavailableDiscoveryProvider),
        Arc::new(UnavailableGenerationAgent),
        store.clone(),
    );

    let connection = zbus::connection::Builder::system()?
        .name(bus_name.as_str())?
        .serve_at(OBJECT_PATH, service)?
        .build()
        .await?;

    gst_manager_daemon::bus::spawn_signal_fanout(connection.clone(), events_rx).await;

    tracing::info!(bus_name = %bus_name, object_path = OBJECT_PATH, "bus service ready");

    wait_for_shutdown_signal().await;
    tracing::info!("shutdown signal received, draining");

    let drain_timeout = daemon_settings
        .shutdown_drain_ms
        .map(std::time::Duration::from_millis)
        .unwrap_or_else(env::shutdown_drain_timeout);

    event_manager_token.cancel();
    let _ = tokio::time::timeout(drain_timeout, supervisor.stop_all()).await;

    tracing::info!("shutdown complete");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let sigterm = signal(SignalKind::terminate());
    let sigint = signal(SignalKind::interrupt());
    let (mut sigterm, mut sigint) = match (sigterm, sigint) {
        (Ok(term), Ok(int)) => (term, int),
        _ => {
            tracing::error!("failed to install signal handlers, falling back to ctrl_c");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = sigterm.recv() => {}
        _ = sigint.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
