use super::SyncError;
use tracing::{debug, error, warn};

/// Logs an error with severity matched to its variant.
///
/// Gateway and transport failures are expected in normal operation (the
/// record simply stays pending), so they log at warn; anything else is a
/// programming or environment problem and logs at error.
pub fn log_error(error: &SyncError, context: &str) {
    match error {
        SyncError::HttpError { status, message } => {
            if status.is_server_error() {
                error!("{} - HTTP error {}: {}", context, status, message);
            } else {
                warn!("{} - HTTP error {}: {}", context, status, message);
            }
        }
        SyncError::Gateway { kind, message } => {
            warn!("{} - gateway failure ({}): {}", context, kind, message);
        }
        SyncError::Rpc { code, message } => {
            warn!("{} - RPC error {}: {}", context, code, message);
        }
        SyncError::NetworkError(message) => {
            warn!("{} - network error: {}", context, message);
        }
        SyncError::Abi(message) => {
            debug!("{} - ABI decode failed: {}", context, message);
        }
        other => {
            error!("{} - {}", context, other);
        }
    }
}
