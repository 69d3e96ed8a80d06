//! Probe protocols.
//!
//! `Protocol` is a closed set; anything else is rejected when parsed
//! rather than discovered halfway through a scan.

use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a port is probed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Plain TCP connect.
    Tcp,
    /// Single UDP datagram, open if anything comes back.
    Udp,
    /// HTTP GET, open on any response.
    Http,
    /// HTTPS GET without certificate verification, open on any response.
    Https,
}

impl Protocol {
    /// URL scheme for the HTTP family.
    pub const fn scheme(self) -> Option<&'static str> {
        match self {
            Self::Http => Some("http"),
            Self::Https => Some("https"),
            Self::Tcp | Self::Udp => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl Default for Protocol {
    fn default() -> Self {
        Self::Tcp
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            _ => Err(ProtocolError::Unsupported(s.to_string())),
        }
    }
}
