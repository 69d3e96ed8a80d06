//! Error types for portprobe.
//!
//! Uses `thiserror` for ergonomic error definitions. Probe failures are
//! plain data: they are recorded per port and never abort a scan.

use crate::scanner::ScanPhase;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Classification of a failed probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The connection or response did not complete within the deadline.
    Timeout,
    /// The configured protocol is not one the prober understands.
    InvalidProtocol,
    /// Any other I/O or protocol-library fault.
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::InvalidProtocol => write!(f, "invalid protocol"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Why a single probe did not find the port open.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ProbeError {
    #[error("timed out: {0}")]
    Timeout(String),

    #[error("invalid protocol: {0}")]
    InvalidProtocol(String),

    #[error("{0}")]
    Other(String),
}

impl ProbeError {
    /// The coarse classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::InvalidProtocol(_) => ErrorKind::InvalidProtocol,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Timeouts are the expected outcome for most closed or filtered ports.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<std::io::Error> for ProbeError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::TimedOut {
            Self::Timeout(e.to_string())
        } else {
            Self::Other(e.to_string())
        }
    }
}

/// Errors raised by the work queue.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("work queue is closed")]
    Closed,
}

/// Errors raised by the scan lifecycle itself.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("scan already started")]
    AlreadyStarted,

    #[error("scan results are not readable yet (phase: {0})")]
    NotComplete(ScanPhase),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("work queue error: {0}")]
    Queue(#[from] QueueError),
}

/// Error type for protocol parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unsupported protocol: {0}")]
    Unsupported(String),
}

/// Error type for port-set expansion.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PortError {
    #[error("invalid port number: {0}")]
    InvalidFormat(String),

    #[error("invalid port range: {0}")]
    InvalidRange(String),

    #[error("port list cannot end in a comma: {0}")]
    TrailingComma(String),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {}: {reason}", .path.display())]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid configuration format: {0}")]
    InvalidFormat(String),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_error_kind() {
        assert_eq!(ProbeError::Timeout("x".into()).kind(), ErrorKind::Timeout);
        assert_eq!(
            ProbeError::InvalidProtocol("ftp".into()).kind(),
            ErrorKind::InvalidProtocol
        );
        assert_eq!(ProbeError::Other("boom".into()).kind(), ErrorKind::Other);
    }

    #[test]
    fn test_io_error_classification() {
        let timed_out = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow");
        assert!(ProbeError::from(timed_out).is_timeout());

        let refused = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert_eq!(ProbeError::from(refused).kind(), ErrorKind::Other);
    }

    #[test]
    fn test_probe_error_serialization() {
        let json = serde_json::to_string(&ProbeError::InvalidProtocol("ftp".into())).unwrap();
        assert_eq!(json, r#"{"kind":"invalid_protocol","detail":"ftp"}"#);
    }
}
