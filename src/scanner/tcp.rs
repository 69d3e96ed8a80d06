//! TCP connect probe.
//!
//! Performs a standard connect through the operating system's socket API.
//! The port is open if the handshake completes; the stream is closed
//! immediately afterwards.

use crate::error::ProbeError;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Attempt a TCP connection to `target:port` within `limit`.
pub async fn probe_tcp(target: &str, port: u16, limit: Duration) -> Result<(), ProbeError> {
    match timeout(limit, TcpStream::connect((target, port))).await {
        Ok(Ok(stream)) => {
            drop(stream);
            Ok(())
        }
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(ProbeError::Timeout(format!(
            "connect to {target}:{port} exceeded {limit:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_listening_port_is_open() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        assert!(probe_tcp("127.0.0.1", port, Duration::from_secs(1)).await.is_ok());
    }

    #[tokio::test]
    async fn test_closed_port_is_not_open() {
        // Grab a free port, then release it so nothing is listening.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        assert!(probe_tcp("127.0.0.1", port, Duration::from_millis(500)).await.is_err());
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_stalled_handshake_times_out() {
        let backlog = crate::scanner::testing::FullBacklog::new().await;

        let err = probe_tcp("127.0.0.1", backlog.port(), Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Timeout(_)), "got {err:?}");
    }
}
