use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;

mod utils;
pub use utils::*;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Gateway error: {kind} - {message}")]
    Gateway {
        kind: GatewayErrorKind,
        message: String,
    },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("ABI decode error: {0}")]
    Abi(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {status} - {message}")]
    HttpError { status: StatusCode, message: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    Timeout,
    MalformedResponse,
    Other,
}

impl fmt::Display for GatewayErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "Request timed out"),
            Self::MalformedResponse => write!(f, "Malformed response"),
            Self::Other => write!(f, "Other gateway error"),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    pub fn gateway(kind: GatewayErrorKind, message: impl Into<String>) -> Self {
        SyncError::Gateway {
            kind,
            message: message.into(),
        }
    }

    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        SyncError::Rpc {
            code,
            message: message.into(),
        }
    }

    pub fn abi(message: impl Into<String>) -> Self {
        SyncError::Abi(message.into())
    }

    /// Whether a caller that does want a retry policy should consider this
    /// failure transient. The core itself never retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Gateway { kind, .. } => matches!(kind, GatewayErrorKind::Timeout),
            SyncError::HttpError { status, .. } => status.is_server_error(),
            SyncError::NetworkError(_) => true,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SyncError::gateway(GatewayErrorKind::Timeout, err.to_string())
        } else if let Some(status) = err.status() {
            SyncError::HttpError {
                status,
                message: err.to_string(),
            }
        } else {
            SyncError::NetworkError(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helper_constructors() {
        let err = SyncError::gateway(GatewayErrorKind::MalformedResponse, "truncated body");
        assert!(matches!(err, SyncError::Gateway { .. }));

        let err = SyncError::rpc(-32000, "execution reverted");
        assert!(matches!(err, SyncError::Rpc { code: -32000, .. }));
    }

    #[test]
    fn test_retryable_errors() {
        let err = SyncError::gateway(GatewayErrorKind::Timeout, "deadline exceeded");
        assert!(err.is_retryable());

        let err = SyncError::NetworkError("connection reset".to_string());
        assert!(err.is_retryable());

        let err = SyncError::HttpError {
            status: StatusCode::BAD_GATEWAY,
            message: "upstream down".to_string(),
        };
        assert!(err.is_retryable());

        let err = SyncError::abi("word out of range");
        assert!(!err.is_retryable());

        let err = SyncError::HttpError {
            status: StatusCode::NOT_FOUND,
            message: "no such route".to_string(),
        };
        assert!(!err.is_retryable());
    }
}
