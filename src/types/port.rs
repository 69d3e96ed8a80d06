//! Port-set expansion.
//!
//! Turns the user's port tokens into the flat, ordered list of ports the
//! scanner consumes. Accepted token forms:
//! - Single port: "80"
//! - Inclusive range: "1-1000"
//! - Comma-separated list: "80,443,8080"
//!
//! A token is classified by its first matching form in that order of
//! precedence: anything containing `-` is a range.

use crate::error::PortError;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// An ordered sequence of ports to probe. Duplicates are preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortSet {
    ports: Vec<u16>,
}

impl PortSet {
    /// Every port from `min` to `max` inclusive. Empty when `min > max`.
    pub fn range(min: u16, max: u16) -> Self {
        Self {
            ports: (min..=max).collect(),
        }
    }

    /// Expand user tokens, concatenating the results in order.
    pub fn parse_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Self, PortError> {
        let mut ports = Vec::new();
        for token in tokens {
            ports.extend(expand_token(token.as_ref().trim())?);
        }
        Ok(Self { ports })
    }

    /// Randomise probe order.
    pub fn shuffle(&mut self) {
        self.ports.shuffle(&mut rand::thread_rng());
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.ports
    }

    pub fn into_vec(self) -> Vec<u16> {
        self.ports
    }
}

fn expand_token(token: &str) -> Result<Vec<u16>, PortError> {
    if token.contains('-') {
        let bounds: Vec<&str> = token.split('-').collect();
        if bounds.len() != 2 {
            return Err(PortError::InvalidRange(token.to_string()));
        }
        let start = parse_port(bounds[0])?;
        let end = parse_port(bounds[1])?;
        if start > end {
            return Err(PortError::InvalidRange(token.to_string()));
        }
        Ok((start..=end).collect())
    } else if token.contains(',') {
        if token.ends_with(',') {
            return Err(PortError::TrailingComma(token.to_string()));
        }
        token.split(',').map(parse_port).collect()
    } else {
        Ok(vec![parse_port(token)?])
    }
}

fn parse_port(s: &str) -> Result<u16, PortError> {
    s.trim()
        .parse()
        .map_err(|_| PortError::InvalidFormat(s.to_string()))
}
