//! Scanner module - runs one scan from configuration to final report.
//!
//! The [`ScanManager`] submits one [`ProbeTask`] per port into a bounded
//! [`WorkQueue`], a [`WorkerPool`] drains it through a [`Prober`], and
//! every outcome lands in a single mutex-guarded [`ScanResult`] that is
//! only handed out once the queue has fully drained.

mod http;
pub mod pool;
pub mod probe;
pub mod queue;
mod tcp;
#[cfg(all(test, target_os = "linux"))]
mod testing;
pub mod traits;
mod udp;

pub use pool::WorkerPool;
pub use probe::ProbeExecutor;
pub use queue::WorkQueue;
pub use traits::{ProbeOutcome, ProbeTask, Prober};
pub use udp::PROBE_PAYLOAD;

use crate::error::{ProbeError, ScanError};
use crate::types::Protocol;
use futures::FutureExt;
use serde::Serialize;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Lifecycle of a scan. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanPhase {
    /// Created, nothing submitted yet.
    Configured,
    /// Tasks are being submitted while workers probe.
    Running,
    /// No new submissions; waiting for in-flight probes.
    Draining,
    /// Results are final and readable.
    Complete,
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configured => write!(f, "configured"),
            Self::Running => write!(f, "running"),
            Self::Draining => write!(f, "draining"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

/// Configuration for a scan.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Hostname or IP literal to probe.
    pub target: String,
    /// Protocol name as supplied by the user; validated when the scan runs.
    pub protocol: String,
    /// Requested worker count, clamped against the port count at run time.
    pub threads: usize,
    /// Per-probe deadline.
    pub timeout: Duration,
}

impl ScanConfig {
    /// Create a configuration with the default TCP settings.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            protocol: Protocol::Tcp.to_string(),
            threads: 10,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A port whose probe failed, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortFailure {
    pub port: u16,
    pub error: ProbeError,
}

/// Accumulated outcome of a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    /// Open ports in discovery order.
    pub open: Vec<u16>,
    /// Failed probes in completion order.
    pub errors: Vec<PortFailure>,
    /// Tasks whose outcome was recorded.
    pub completed: usize,
    /// Ports never probed because the scan was cancelled.
    pub skipped: usize,
}

/// Live notifications while a scan runs. Both hooks are called from
/// worker tasks and must not block.
pub trait ScanObserver: Send + Sync {
    /// A port was just found open.
    fn port_open(&self, _port: u16) {}

    /// A task finished, whatever its outcome.
    fn probe_finished(&self, _port: u16) {}
}

/// Cooperative cancellation flag shared with a running scan.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Stop submitting and skip every probe not yet started.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The unit of work bound into every task: probe, then record.
///
/// Owns the only mutable shared state of a scan.
pub struct ScanHandler {
    prober: Arc<dyn Prober>,
    result: Mutex<ScanResult>,
    observer: OnceLock<Arc<dyn ScanObserver>>,
    cancel: CancelHandle,
}

impl ScanHandler {
    fn lock(&self) -> MutexGuard<'_, ScanResult> {
        self.result.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Probe one task and record its outcome.
    pub async fn handle(&self, task: ProbeTask) {
        let port = task.port;
        if self.cancel.is_cancelled() {
            debug!(port, "scan cancelled, skipping probe");
        } else {
            let outcome = match AssertUnwindSafe(self.prober.probe(&task)).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(panic) => ProbeOutcome::Failed {
                    port,
                    error: ProbeError::Other(format!(
                        "probe panicked: {}",
                        pool::panic_message(&*panic)
                    )),
                },
            };
            self.record(outcome);
        }

        if let Some(observer) = self.observer.get() {
            observer.probe_finished(port);
        }
    }

    /// Record an outcome. Open ports are published as soon as they are known.
    pub fn record(&self, outcome: ProbeOutcome) {
        let mut result = self.lock();
        result.completed += 1;
        match outcome {
            ProbeOutcome::Open(port) => {
                result.open.push(port);
                drop(result);
                info!(port, "open");
                if let Some(observer) = self.observer.get() {
                    observer.port_open(port);
                }
            }
            ProbeOutcome::Failed { port, error } => {
                if error.is_timeout() {
                    debug!(port, error = %error, "probe timed out");
                } else {
                    debug!(port, kind = %error.kind(), error = %error, "interesting error");
                }
                result.errors.push(PortFailure { port, error });
            }
        }
    }

    fn take_result(&self) -> ScanResult {
        std::mem::take(&mut *self.lock())
    }
}

/// Coordinates a single scan and owns its results.
pub struct ScanManager {
    config: ScanConfig,
    handler: Arc<ScanHandler>,
    phase: ScanPhase,
    threads: usize,
    result: Option<ScanResult>,
}

impl ScanManager {
    /// Create a manager that probes over the network.
    pub fn new(config: ScanConfig) -> Result<Self, ScanError> {
        let prober = Arc::new(ProbeExecutor::new(config.timeout)?);
        Ok(Self::with_prober(config, prober))
    }

    /// Create a manager around any [`Prober`].
    pub fn with_prober(config: ScanConfig, prober: Arc<dyn Prober>) -> Self {
        Self {
            config,
            handler: Arc::new(ScanHandler {
                prober,
                result: Mutex::new(ScanResult::default()),
                observer: OnceLock::new(),
                cancel: CancelHandle::default(),
            }),
            phase: ScanPhase::Configured,
            threads: 0,
            result: None,
        }
    }

    /// Attach live progress hooks. Only the first observer is kept.
    pub fn observe(self, observer: Arc<dyn ScanObserver>) -> Self {
        if self.handler.observer.set(observer).is_err() {
            warn!("scan already has an observer, ignoring the new one");
        }
        self
    }

    /// Handle that cancels this scan from another task.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.handler.cancel.clone()
    }

    /// The per-task handler shared with the workers.
    pub fn handler(&self) -> Arc<ScanHandler> {
        Arc::clone(&self.handler)
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    /// Worker count actually used; 0 before the scan starts.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Probe every port and wait for all of them to finish.
    ///
    /// A protocol the prober does not understand is not fatal: every port
    /// is recorded as an invalid-protocol error without touching the network.
    pub async fn run(&mut self, ports: &[u16]) -> Result<&ScanResult, ScanError> {
        if self.phase != ScanPhase::Configured {
            return Err(ScanError::AlreadyStarted);
        }
        self.phase = ScanPhase::Running;
        self.threads = WorkerPool::<ProbeTask>::clamp_threads(self.config.threads, ports.len());

        let protocol = match self.config.protocol.parse::<Protocol>() {
            Ok(protocol) => protocol,
            Err(e) => {
                warn!(error = %e, "rejecting every port");
                self.phase = ScanPhase::Draining;
                for &port in ports {
                    self.handler.record(ProbeOutcome::Failed {
                        port,
                        error: ProbeError::InvalidProtocol(self.config.protocol.clone()),
                    });
                }
                return Ok(self.finish(ports.len()));
            }
        };

        info!(
            target_host = %self.config.target,
            ports = ports.len(),
            %protocol,
            threads = self.threads,
            "scan starting"
        );

        let queue = Arc::new(WorkQueue::new(self.threads));
        let pool = {
            let handler = Arc::clone(&self.handler);
            WorkerPool::spawn(self.threads, Arc::clone(&queue), move |task: ProbeTask| {
                let handler = Arc::clone(&handler);
                async move { handler.handle(task).await }
            })
        };

        let target: Arc<str> = Arc::from(self.config.target.as_str());
        for &port in ports {
            if self.handler.cancel.is_cancelled() {
                info!("scan cancelled, no further submissions");
                break;
            }
            let task = ProbeTask::new(port, Arc::clone(&target), protocol, self.config.timeout);
            if let Err(e) = queue.submit(task).await {
                pool.shutdown().await;
                return Err(e.into());
            }
        }

        self.phase = ScanPhase::Draining;
        queue.drain().await;
        pool.shutdown().await;

        Ok(self.finish(ports.len()))
    }

    fn finish(&mut self, total: usize) -> &ScanResult {
        let mut result = self.handler.take_result();
        // Ports never submitted, or dequeued after cancellation.
        result.skipped = total.saturating_sub(result.completed);
        info!(
            open = result.open.len(),
            errors = result.errors.len(),
            skipped = result.skipped,
            "scan complete"
        );
        self.phase = ScanPhase::Complete;
        self.result.insert(result)
    }

    /// The final result, once the scan is complete.
    pub fn result(&self) -> Result<&ScanResult, ScanError> {
        self.result
            .as_ref()
            .ok_or(ScanError::NotComplete(self.phase))
    }

    /// Open ports in discovery order.
    pub fn open(&self) -> Result<&[u16], ScanError> {
        self.result().map(|r| r.open.as_slice())
    }

    /// Failed probes in completion order.
    pub fn errors(&self) -> Result<&[PortFailure], ScanError> {
        self.result().map(|r| r.errors.as_slice())
    }

    /// Consume the manager and take ownership of the result.
    pub fn into_result(self) -> Result<ScanResult, ScanError> {
        let phase = self.phase;
        self.result.ok_or(ScanError::NotComplete(phase))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::AtomicUsize;

    /// Opens a fixed set of ports and counts every probe.
    struct StubProber {
        open: HashSet<u16>,
        calls: AtomicUsize,
    }

    impl StubProber {
        fn new(open: &[u16]) -> Arc<Self> {
            Arc::new(Self {
                open: open.iter().copied().collect(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Prober for StubProber {
        async fn probe(&self, task: &ProbeTask) -> ProbeOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if self.open.contains(&task.port) {
                ProbeOutcome::Open(task.port)
            } else {
                ProbeOutcome::Failed {
                    port: task.port,
                    error: ProbeError::Timeout("stub".into()),
                }
            }
        }
    }

    struct PanicProber;

    #[async_trait]
    impl Prober for PanicProber {
        async fn probe(&self, task: &ProbeTask) -> ProbeOutcome {
            if task.port % 2 == 0 {
                panic!("even ports are cursed");
            }
            ProbeOutcome::Open(task.port)
        }
    }

    #[derive(Default)]
    struct Recording {
        open: Mutex<Vec<u16>>,
        finished: AtomicUsize,
    }

    impl ScanObserver for Recording {
        fn port_open(&self, port: u16) {
            self.open.lock().unwrap().push(port);
        }

        fn probe_finished(&self, _port: u16) {
            self.finished.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn config() -> ScanConfig {
        ScanConfig::new("127.0.0.1")
            .with_threads(4)
            .with_timeout(Duration::from_millis(100))
    }

    #[tokio::test]
    async fn test_every_port_completes_once() {
        let ports: Vec<u16> = (1..=500).collect();
        let prober = StubProber::new(&[22, 80, 443]);
        let mut manager = ScanManager::with_prober(config(), prober.clone());

        let result = manager.run(&ports).await.unwrap().clone();

        assert_eq!(result.completed, ports.len());
        assert_eq!(prober.calls.load(Ordering::SeqCst), ports.len());
        assert_eq!(result.open.len() + result.errors.len(), ports.len());
        let open: HashSet<u16> = result.open.iter().copied().collect();
        assert_eq!(open, HashSet::from([22, 80, 443]));
        assert_eq!(manager.phase(), ScanPhase::Complete);
        assert_eq!(manager.threads(), 4);
    }

    #[tokio::test]
    async fn test_empty_port_set() {
        let mut manager = ScanManager::with_prober(config(), StubProber::new(&[]));
        let result = manager.run(&[]).await.unwrap();

        assert!(result.open.is_empty());
        assert!(result.errors.is_empty());
        assert_eq!(manager.threads(), 1);
    }

    #[tokio::test]
    async fn test_threads_are_clamped() {
        let mut manager =
            ScanManager::with_prober(config().with_threads(50), StubProber::new(&[]));
        manager.run(&[1, 2, 3]).await.unwrap();
        assert_eq!(manager.threads(), 2);
    }

    #[tokio::test]
    async fn test_unsupported_protocol_rejects_every_port() {
        let prober = StubProber::new(&[21]);
        let mut manager = ScanManager::with_prober(config().with_protocol("ftp"), prober.clone());

        let result = manager.run(&[21, 22, 23]).await.unwrap();

        assert!(result.open.is_empty());
        assert_eq!(result.errors.len(), 3);
        assert!(result
            .errors
            .iter()
            .all(|f| f.error.kind() == ErrorKind::InvalidProtocol));
        assert_eq!(prober.calls.load(Ordering::SeqCst), 0);
        assert_eq!(manager.phase(), ScanPhase::Complete);
    }

    #[tokio::test]
    async fn test_panicking_probe_is_recorded() {
        let mut manager = ScanManager::with_prober(config(), Arc::new(PanicProber));
        let ports: Vec<u16> = (1..=20).collect();

        let result = manager.run(&ports).await.unwrap();

        assert_eq!(result.completed, 20);
        assert_eq!(result.open.len(), 10);
        assert_eq!(result.errors.len(), 10);
        assert!(result.errors.iter().all(|f| f.port % 2 == 0));
    }

    #[tokio::test]
    async fn test_results_unreadable_before_completion() {
        let manager = ScanManager::with_prober(config(), StubProber::new(&[]));
        assert!(matches!(
            manager.open(),
            Err(ScanError::NotComplete(ScanPhase::Configured))
        ));
        assert!(manager.errors().is_err());
    }

    #[tokio::test]
    async fn test_scan_runs_only_once() {
        let mut manager = ScanManager::with_prober(config(), StubProber::new(&[]));
        manager.run(&[1]).await.unwrap();
        assert!(matches!(
            manager.run(&[1]).await,
            Err(ScanError::AlreadyStarted)
        ));
    }

    #[tokio::test]
    async fn test_observer_sees_progress() {
        let observer = Arc::new(Recording::default());
        let mut manager = ScanManager::with_prober(config(), StubProber::new(&[7, 9]))
            .observe(observer.clone());

        manager.run(&[5, 6, 7, 8, 9]).await.unwrap();

        let mut open = observer.open.lock().unwrap().clone();
        open.sort_unstable();
        assert_eq!(open, vec![7, 9]);
        assert_eq!(observer.finished.load(Ordering::SeqCst), 5);
        assert_eq!(manager.open().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_scan_still_completes() {
        let prober = StubProber::new(&[]);
        let mut manager = ScanManager::with_prober(config(), prober.clone());
        manager.cancel_handle().cancel();

        let ports: Vec<u16> = (1..=100).collect();
        let result = manager.run(&ports).await.unwrap();

        assert_eq!(result.completed, 0);
        assert_eq!(result.skipped, 100);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 0);
        assert_eq!(manager.phase(), ScanPhase::Complete);
    }

    #[tokio::test]
    async fn test_into_result() {
        let mut manager = ScanManager::with_prober(config(), StubProber::new(&[1]));
        manager.run(&[1, 2]).await.unwrap();
        let result = manager.into_result().unwrap();
        assert_eq!(result.open, vec![1]);
        assert_eq!(result.errors[0].port, 2);
    }

    #[tokio::test]
    async fn test_observer_attached_after_handler_is_shared() {
        let observer = Arc::new(Recording::default());
        let manager = ScanManager::with_prober(config(), StubProber::new(&[3]));
        let handler = manager.handler();
        let mut manager = manager.observe(observer.clone());

        manager.run(&[1, 2, 3]).await.unwrap();

        assert_eq!(*observer.open.lock().unwrap(), vec![3]);
        assert_eq!(observer.finished.load(Ordering::SeqCst), 3);
        drop(handler);
    }
}
