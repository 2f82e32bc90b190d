use crate::error::{Result, SyncError};
use serde_json::json;
use std::path::Path;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initializes the logging system (both console and file).
/// Returns a guard that must be kept alive for file logging to work.
pub fn init_logging(log_dir: &str, file_level: &str, console_level: &str) -> Result<WorkerGuard> {
    // Ensure log directory exists
    let log_path = Path::new(log_dir);
    if !log_path.exists() {
        std::fs::create_dir_all(log_path).map_err(SyncError::Io)?;
    }

    // --- File Logger ---
    let file_appender = rolling::daily(log_dir, "tokensync.log");
    let (non_blocking_appender, guard) = tracing_appender::non_blocking(file_appender);

    let file_filter = EnvFilter::try_new(file_level).map_err(|e| {
        SyncError::ConfigError(format!(
            "Invalid file log level filter '{}': {}",
            file_level, e
        ))
    })?;
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_appender)
        .with_ansi(false) // No ANSI colors in files
        .with_span_events(FmtSpan::CLOSE)
        .json() // Log as JSON for easier parsing
        .with_filter(file_filter);

    // --- Console Logger ---
    let console_filter = EnvFilter::try_new(console_level).map_err(|e| {
        SyncError::ConfigError(format!(
            "Invalid console log level filter '{}': {}",
            console_level, e
        ))
    })?;
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(console_filter);

    // --- Combine Layers and Initialize ---
    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| {
            SyncError::InternalError(format!("Failed to initialize tracing subscriber: {}", e))
        })?;

    Ok(guard)
}

// --- Health Monitoring ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentStatus {
    Ok,
    Warning(String),
    Error(String),
}

#[derive(Debug, Clone)]
pub struct ComponentHealth {
    pub name: String,
    pub status: ComponentStatus,
}

/// Checks that the configured RPC endpoint answers a basic JSON-RPC call.
pub async fn check_rpc_endpoint(rpc_url: &str) -> ComponentHealth {
    let name = "Blockchain RPC".to_string();
    info!(target: "health_check", component = %name, "Running check...");

    let body = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "net_version",
        "params": [],
    });

    match reqwest::Client::new().post(rpc_url).json(&body).send().await {
        Ok(response) if response.status().is_success() => ComponentHealth {
            name,
            status: ComponentStatus::Ok,
        },
        Ok(response) => ComponentHealth {
            name,
            status: ComponentStatus::Warning(format!("Unexpected status: {}", response.status())),
        },
        Err(e) => ComponentHealth {
            name,
            status: ComponentStatus::Error(format!("Failed RPC check: {}", e)),
        },
    }
}
