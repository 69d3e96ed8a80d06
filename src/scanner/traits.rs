//! Probe abstraction.
//!
//! Defines the unit of work handed to workers and the trait that turns it
//! into an outcome, so the engine can be driven by something other than
//! the network (tests, dry runs).

use crate::error::ProbeError;
use crate::types::Protocol;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// One port to probe. Immutable once enqueued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTask {
    /// Port number to probe.
    pub port: u16,
    /// Hostname or IP literal, shared by every task of a scan.
    pub target: Arc<str>,
    /// How to probe.
    pub protocol: Protocol,
    /// Deadline for the probe.
    pub timeout: Duration,
}

impl ProbeTask {
    pub fn new(port: u16, target: Arc<str>, protocol: Protocol, timeout: Duration) -> Self {
        Self {
            port,
            target,
            protocol,
            timeout,
        }
    }
}

impl fmt::Display for ProbeTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.protocol, self.target, self.port)
    }
}

/// Result of probing a single port.
///
/// A closed or filtered port is not a separate variant: it is a port that
/// never shows up as `Open`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The port answered according to the protocol's criteria.
    Open(u16),
    /// The probe failed; the error says how.
    Failed { port: u16, error: ProbeError },
}

impl ProbeOutcome {
    /// Build an outcome from a probe's `Result`.
    pub fn from_result<T>(port: u16, result: Result<T, ProbeError>) -> Self {
        match result {
            Ok(_) => Self::Open(port),
            Err(error) => Self::Failed { port, error },
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            Self::Open(port) | Self::Failed { port, .. } => *port,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open(_))
    }
}

/// Trait for probe implementations.
///
/// Implementations must classify every failure into the returned outcome;
/// the engine treats a panic as a bug and records it as an `Other` error.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe a single port.
    async fn probe(&self, task: &ProbeTask) -> ProbeOutcome;
}
