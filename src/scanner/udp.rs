//! UDP probe.
//!
//! Sends a single fixed payload and waits for any datagram in return.
//! Anything that comes back means the port is open. Silence is reported
//! as a timeout, which makes this a known source of false negatives:
//! most UDP services ignore unexpected payloads and firewalls drop
//! datagrams without telling anyone.

use crate::error::ProbeError;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::{lookup_host, UdpSocket};
use tokio::time::timeout;
use tracing::debug;

/// Payload sent to every UDP port.
pub const PROBE_PAYLOAD: &[u8] = b"HELP";

/// Send [`PROBE_PAYLOAD`] to `target:port` and wait up to `limit` for a reply.
pub async fn probe_udp(target: &str, port: u16, limit: Duration) -> Result<(), ProbeError> {
    let addr = resolve(target, port).await?;

    // Bind to random local port of the same family.
    let local: SocketAddr = if addr.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };
    let socket = UdpSocket::bind(local).await?;

    debug!(port, "sending udp probe");
    socket.send_to(PROBE_PAYLOAD, addr).await?;

    let mut buf = [0u8; 1024];
    match timeout(limit, socket.recv_from(&mut buf)).await {
        Ok(Ok((len, from))) => {
            debug!(port, len, %from, "udp response received");
            Ok(())
        }
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(ProbeError::Timeout(format!(
            "no udp response from {addr} within {limit:?}"
        ))),
    }
}

async fn resolve(target: &str, port: u16) -> Result<SocketAddr, ProbeError> {
    lookup_host((target, port))
        .await?
        .next()
        .ok_or_else(|| ProbeError::Other(format!("no addresses found for '{target}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_responding_port_is_open() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = server.local_addr().unwrap().port();

        let echo = tokio::spawn(async move {
            let mut buf = [0u8; 16];
            let (len, from) = server.recv_from(&mut buf).await.unwrap();
            assert_eq!(&buf[..len], PROBE_PAYLOAD);
            server.send_to(b"ok", from).await.unwrap();
        });

        probe_udp("127.0.0.1", port, Duration::from_secs(2)).await.unwrap();
        echo.await.unwrap();
    }

    #[tokio::test]
    async fn test_silent_port_is_not_open() {
        // Bound but never answers.
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = server.local_addr().unwrap().port();

        let err = probe_udp("127.0.0.1", port, Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }
}
