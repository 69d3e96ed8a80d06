//! Network-backed [`Prober`].

use crate::error::ScanError;
use crate::scanner::http::HttpProber;
use crate::scanner::tcp::probe_tcp;
use crate::scanner::traits::{ProbeOutcome, ProbeTask, Prober};
use crate::scanner::udp::probe_udp;
use crate::types::Protocol;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Probes ports over the network according to each task's protocol.
pub struct ProbeExecutor {
    http: HttpProber,
}

impl ProbeExecutor {
    /// Create an executor, preparing HTTP clients for the expected task
    /// timeout. Every probe still honours its own task's timeout.
    pub fn new(timeout: Duration) -> Result<Self, ScanError> {
        Ok(Self {
            http: HttpProber::new(timeout)?,
        })
    }
}

#[async_trait]
impl Prober for ProbeExecutor {
    async fn probe(&self, task: &ProbeTask) -> ProbeOutcome {
        debug!(host = %task.target, port = task.port, protocol = %task.protocol, "attempting");

        let result = match task.protocol {
            Protocol::Tcp => probe_tcp(&task.target, task.port, task.timeout).await,
            Protocol::Udp => probe_udp(&task.target, task.port, task.timeout).await,
            Protocol::Http | Protocol::Https => self
                .http
                .probe(task.protocol, &task.target, task.port, task.timeout)
                .await
                .map(drop),
        };

        ProbeOutcome::from_result(task.port, result)
    }
}
