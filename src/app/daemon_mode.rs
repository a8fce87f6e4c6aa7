// Author: Dustin Pilgrim
// License: MIT

use std::sync::Arc;

use eyre::{Result, WrapErr, eyre};
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::{mpsc, watch};

use crate::cli::Args;
use crate::core::{daemon_msg::DaemonMsg, error::ExitCode};
use crate::daemon::Daemon;
use crate::log::{self, LogConfig, LogLevel};
use crate::services::{kodi::KodiHost, process::SystemRunner};
use crate::{sdebug, sinfo, swarn};

pub async fn run(args: Args) -> Result<ExitCode> {
    // single-instance
    let _instance_lock = crate::app::platform::acquire_single_instance_lock().map_err(|e| eyre!(e))?;

    let loaded = crate::config::load(args.config.as_deref())
        .wrap_err("failed to load configuration")?;
    let cfg = loaded.config;

    let level = if args.verbose {
        LogLevel::Debug
    } else {
        LogLevel::from_number(cfg.logging.max_level)
    };
    log::init(LogConfig {
        level,
        console: args.verbose,
        file: Some(log::default_log_path()),
        ..LogConfig::default()
    });

    let id = cfg.addon.id.clone();
    sinfo!(&id, "turnoff starting");
    sdebug!(&id, "debug logging enabled");
    sinfo!(
        &id,
        "config: {}",
        loaded
            .path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<built-in defaults>".to_string())
    );

    let (tx, rx) = mpsc::channel::<DaemonMsg>(64);

    if let Err(e) = crate::ipc::server::spawn_ipc_server(tx.clone(), id.clone()).await {
        swarn!(&id, "ipc: failed to start: {}", e);
    }

    let host = Arc::new(KodiHost::new(&cfg.kodi, &cfg.addon));
    let connection = tokio::spawn(crate::services::kodi::run_connection(host.clone(), tx.clone()));

    let mut sigterm = signal(SignalKind::terminate()).wrap_err("failed to install SIGTERM handler")?;

    // shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut daemon = Daemon::new(host, SystemRunner, cfg.addon, loaded.path);
    let mut daemon_task = tokio::spawn(async move { daemon.run(tx, rx, shutdown_rx).await });

    let result = tokio::select! {
        res = &mut daemon_task => res,

        _ = tokio::signal::ctrl_c() => {
            sinfo!(&id, "received Ctrl+C, shutting down");
            let _ = shutdown_tx.send(true);
            daemon_task.await
        }

        _ = sigterm.recv() => {
            sinfo!(&id, "received SIGTERM, shutting down");
            let _ = shutdown_tx.send(true);
            daemon_task.await
        }
    };

    connection.abort();
    if let Ok(path) = crate::ipc::socket_path() {
        let _ = std::fs::remove_file(path);
    }

    match result {
        Ok(Ok(())) => {
            sinfo!(&id, "turnoff stopped");
            Ok(ExitCode::Success)
        }
        // Already logged where it happened.
        Ok(Err(e)) => Ok(e.exit_code()),
        Err(join_err) => Err(join_err).wrap_err("daemon task failed"),
    }
}
