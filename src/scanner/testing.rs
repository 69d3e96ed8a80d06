//! Shared fixtures for the probe tests.

use std::time::Duration;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::time::timeout;

/// A loopback listener that never accepts and whose accept queue is full.
///
/// Linux drops SYNs aimed at a full accept queue, so a new connect stays in
/// the handshake until the caller gives up.
pub(crate) struct FullBacklog {
    listener: TcpListener,
    _held: Vec<TcpStream>,
}

impl FullBacklog {
    pub(crate) async fn new() -> Self {
        let socket = TcpSocket::new_v4().unwrap();
        socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let listener = socket.listen(1).unwrap();
        let addr = listener.local_addr().unwrap();

        let mut held = Vec::new();
        for _ in 0..16 {
            match timeout(Duration::from_millis(200), TcpStream::connect(addr)).await {
                Ok(Ok(stream)) => held.push(stream),
                _ => break,
            }
        }

        Self {
            listener,
            _held: held,
        }
    }

    pub(crate) fn port(&self) -> u16 {
        self.listener.local_addr().unwrap().port()
    }
}
