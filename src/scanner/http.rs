//! HTTP and HTTPS probes.
//!
//! A port is open if the server sends back any response at all, error
//! statuses and redirects included. HTTPS skips certificate verification:
//! this is a reachability check, not a trust check.

use crate::error::{ProbeError, ScanError};
use crate::types::Protocol;
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::error::Error as _;
use std::net::Ipv6Addr;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

/// The pair of clients used for one probe timeout.
#[derive(Clone)]
struct Clients {
    plain: Client,
    insecure: Client,
}

impl Clients {
    /// Connecting is bounded by `timeout`, the whole exchange by twice that.
    fn build(timeout: Duration) -> Result<Self, reqwest::Error> {
        let builder = || {
            Client::builder()
                .connect_timeout(timeout)
                .timeout(timeout.saturating_mul(2))
                .redirect(Policy::none())
                .user_agent(concat!("portprobe/", env!("CARGO_PKG_VERSION")))
        };
        Ok(Self {
            plain: builder().build()?,
            insecure: builder().danger_accept_invalid_certs(true).build()?,
        })
    }

    fn for_protocol(&self, protocol: Protocol) -> &Client {
        match protocol {
            Protocol::Https => &self.insecure,
            _ => &self.plain,
        }
    }
}

/// Reusable clients for the HTTP family of probes, keyed by timeout.
///
/// reqwest fixes the connect timeout per client, so every distinct task
/// timeout gets its own pair. A scan normally uses a single one.
pub struct HttpProber {
    clients: Mutex<HashMap<Duration, Clients>>,
}

impl HttpProber {
    /// Build the clients for the expected task timeout up front, so a
    /// broken TLS backend is reported before any probe runs.
    pub fn new(timeout: Duration) -> Result<Self, ScanError> {
        let clients = Clients::build(timeout).map_err(|e| ScanError::HttpClient(e.to_string()))?;
        debug!("https probes will not verify certificates");

        Ok(Self {
            clients: Mutex::new(HashMap::from([(timeout, clients)])),
        })
    }

    fn clients(&self, timeout: Duration) -> Result<Clients, ProbeError> {
        let mut cache = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(clients) = cache.get(&timeout) {
            return Ok(clients.clone());
        }
        debug!(?timeout, "building http clients");
        let clients = Clients::build(timeout).map_err(|e| ProbeError::Other(describe(&e)))?;
        cache.insert(timeout, clients.clone());
        Ok(clients)
    }

    /// Issue `GET scheme://target:port/` within `timeout` and report the
    /// status received.
    pub async fn probe(
        &self,
        protocol: Protocol,
        target: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<StatusCode, ProbeError> {
        let scheme = protocol
            .scheme()
            .ok_or_else(|| ProbeError::InvalidProtocol(protocol.to_string()))?;
        let url = probe_url(scheme, target, port);
        let clients = self.clients(timeout)?;

        match clients.for_protocol(protocol).get(&url).send().await {
            Ok(response) => {
                debug!(port, status = %response.status(), "http response received");
                Ok(response.status())
            }
            Err(e) if e.is_connect() && e.is_timeout() => {
                Err(ProbeError::Timeout(format!("connect to {url}: {}", describe(&e))))
            }
            Err(e) => Err(ProbeError::Other(describe(&e))),
        }
    }
}

/// IPv6 literals need brackets inside a URL.
fn probe_url(scheme: &str, target: &str, port: u16) -> String {
    if target.parse::<Ipv6Addr>().is_ok() {
        format!("{scheme}://[{target}]:{port}/")
    } else {
        format!("{scheme}://{target}:{port}/")
    }
}

/// reqwest's top-level message hides the interesting part in the source chain.
fn describe(e: &reqwest::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
