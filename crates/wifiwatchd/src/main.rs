// # wifiwatchd - Power Restoration Monitor Daemon
//
// This is a THIN integration layer. Subscription, monitoring and polling
// logic all live in wifiwatch-core.
//
// The wifiwatchd daemon is responsible for:
// 1. Reading configuration from the environment (and an optional .env file)
// 2. Installing logging (stdout + rotating log file)
// 3. Initializing the runtime
// 4. Wiring the iwlist scanner and the Telegram transport into the core
// 5. Shutting down on SIGTERM/SIGINT
//
// ## Configuration
//
// Keys are case-insensitive; the process environment wins over the file.
//
// - `WIFI_NAME`: Network whose reappearance means power is back (required)
// - `TELEGRAM_TOKEN`: Bot token (required)
// - `CHAT_IDS`: Allow-list, JSON array or comma separated
// - `ACTIVE_CHECK_INTERVAL`: Seconds between checks while subscribed (60)
// - `MAX_FAILURES` / `FAILURE_PAUSE`: Pause after repeated scan failures (3 / 3600)
// - `WIFI_INTERFACE`: Interface to scan (wlan0)
// - `ENV_FILE`: Path of the env file (.env); read from the process environment only
// - `LOG_LEVEL`: trace, debug, info, warn, error (info)
// - `LOG_FILE`: Path of the rotating log file (wifi_monitor.log)
//
// ## Example
//
// ```bash
// export WIFI_NAME=HomeNet
// export TELEGRAM_TOKEN=123456:your_token
// export CHAT_IDS='["111111111","222222222"]'
// export WIFI_INTERFACE=wlx6c60ebd46348
//
// wifiwatchd
// ```

mod logging;

use anyhow::Result;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use wifiwatch_core::config::load_vars;
use wifiwatch_core::{Daemon, MonitorConfig};
use wifiwatch_scan_iwlist::IwlistScanner;
use wifiwatch_telegram::TelegramTransport;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum WatchExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<WatchExitCode> for ExitCode {
    fn from(code: WatchExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Settings that belong to the process rather than the monitor
#[derive(Debug, PartialEq)]
struct ProcessSettings {
    log_level: String,
    log_file: PathBuf,
}

impl ProcessSettings {
    /// Read from the merged, upper-cased configuration map
    fn from_vars(vars: &HashMap<String, String>) -> Self {
        let value = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        Self {
            log_level: value("LOG_LEVEL").unwrap_or("info").to_string(),
            log_file: PathBuf::from(value("LOG_FILE").unwrap_or("wifi_monitor.log")),
        }
    }
}

/// Location of the env file: `ENV_FILE` (any case) or `.env`
fn env_file_path() -> PathBuf {
    env::vars()
        .find(|(key, _)| key.eq_ignore_ascii_case("ENV_FILE"))
        .map(|(_, value)| PathBuf::from(value))
        .unwrap_or_else(|| PathBuf::from(".env"))
}

fn main() -> ExitCode {
    // Process environment over the env file, shared by both settings sets
    let vars = match load_vars(Some(env_file_path().as_path())) {
        Ok(vars) => vars,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return WatchExitCode::ConfigError.into();
        }
    };
    let settings = ProcessSettings::from_vars(&vars);

    let config = match MonitorConfig::from_vars(vars) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return WatchExitCode::ConfigError.into();
        }
    };

    // Initialize tracing
    if let Err(e) = logging::init(&settings.log_level, &settings.log_file) {
        eprintln!("Failed to initialize logging: {:#}", e);
        return WatchExitCode::ConfigError.into();
    }

    info!("Starting wifiwatchd");
    info!(
        "Watching for \"{}\" on {} (check every {}s while subscribed, {} allowed chat(s))",
        config.wifi_name,
        config.wifi_interface,
        config.active_check_interval_secs,
        config.chat_ids.len()
    );

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return WatchExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {:#}", e);
            WatchExitCode::RuntimeError
        } else {
            WatchExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: MonitorConfig) -> Result<()> {
    let scanner = IwlistScanner::new(config.wifi_interface.clone());
    let transport = TelegramTransport::with_api_base(
        config.telegram_token.clone(),
        config.telegram_api_url.clone(),
    )?;

    let daemon = Daemon::new(Box::new(scanner), Arc::new(transport), &config)?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => info!("Received shutdown signal: {}", signal),
            Err(e) => error!("Signal handling failed, shutting down: {:#}", e),
        }
        let _ = shutdown_tx.send(());
    });

    info!("Ready, waiting for commands");
    daemon.run_with_shutdown(Some(shutdown_rx)).await?;

    info!("Shutting down daemon");
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
