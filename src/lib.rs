//! # portprobe - a concurrent port prober
//!
//! portprobe checks which ports of a host answer over TCP, UDP, HTTP or
//! HTTPS. A fixed pool of workers drains a bounded work queue, one probe
//! per port, and every outcome is recorded in a single result store.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use portprobe::scanner::{ScanConfig, ScanManager};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), portprobe::ScanError> {
//!     let config = ScanConfig::new("127.0.0.1")
//!         .with_protocol("tcp")
//!         .with_threads(8)
//!         .with_timeout(Duration::from_secs(1));
//!
//!     let mut manager = ScanManager::new(config)?;
//!     let result = manager.run(&[22, 80, 443]).await?;
//!     println!("open: {:?}", result.open);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`scanner`] - work queue, worker pool, probes and the scan manager
//! - [`types`] - protocol and port-set types
//! - [`config`] - settings file handling
//! - [`cli`] - command-line arguments
//! - [`output`] - plain, JSON and CSV rendering
//! - [`error`] - error types

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod scanner;
pub mod types;

// Re-export commonly used types
pub use error::{ErrorKind, ProbeError, ScanError};
pub use scanner::{ScanConfig, ScanManager, ScanPhase, ScanResult};
pub use types::{PortSet, Protocol};
