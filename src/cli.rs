//! Command-line interface definitions for portprobe.
//!
//! Uses `clap` derive macros for declarative argument parsing. Flags left
//! unset fall back to [`Settings`].

use crate::config::Settings;
use crate::error::PortError;
use crate::scanner::ScanConfig;
use crate::types::{PortSet, Protocol};
use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Probe a range of ports on a host over TCP, UDP, HTTP or HTTPS.
#[derive(Parser, Debug)]
#[command(name = "portprobe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A concurrent port prober", long_about = None)]
pub struct Args {
    /// Target host (IP address or hostname)
    #[arg(short = 't', long, value_name = "HOST")]
    pub target: String,

    /// Lowest port of the default range (ignored with --port)
    #[arg(short = 'm', long = "min-port", value_name = "PORT")]
    pub min_port: Option<u16>,

    /// Highest port of the default range (ignored with --port)
    #[arg(short = 'M', long = "max-port", value_name = "PORT")]
    pub max_port: Option<u16>,

    /// Number of concurrent workers
    #[arg(short = 'T', long, value_parser = clap::value_parser!(u64).range(1..))]
    pub threads: Option<u64>,

    /// Per-probe timeout in seconds
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Verbosity (-v, -vv, -vvv, -vvvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Probe ports in the order given instead of shuffling them
    #[arg(long)]
    pub no_random: bool,

    /// Protocol used to probe each port
    #[arg(short = 'P', long = "proto", value_enum)]
    pub protocol: Option<Protocol>,

    /// Ports to probe ("-p 1 2 3", "-p 1-5" or "-p 1,2,3")
    #[arg(short = 'p', long = "port", num_args = 1.., value_name = "PORTS")]
    pub ports: Vec<String>,

    /// Output format for results
    #[arg(short, long, value_enum, default_value = "plain")]
    pub output: OutputFormat,

    /// Path to a settings file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Expand the requested ports, shuffled unless `--no-random` is given.
    pub fn port_set(&self, settings: &Settings) -> Result<PortSet, PortError> {
        let mut ports = if self.ports.is_empty() {
            PortSet::range(
                self.min_port.unwrap_or(settings.min_port),
                self.max_port.unwrap_or(settings.max_port),
            )
        } else {
            PortSet::parse_tokens(&self.ports)?
        };

        if settings.randomize && !self.no_random {
            ports.shuffle();
        }
        Ok(ports)
    }

    /// Scan configuration with flags taking precedence over settings.
    pub fn scan_config(&self, settings: &Settings) -> ScanConfig {
        let protocol = self
            .protocol
            .map(|p| p.to_string())
            .unwrap_or_else(|| settings.protocol.clone());
        let timeout = self
            .timeout
            .map(Duration::from_secs)
            .unwrap_or_else(|| settings.timeout());
        let threads = self
            .threads
            .map(|t| usize::try_from(t).unwrap_or(usize::MAX))
            .unwrap_or(settings.threads);

        ScanConfig::new(&self.target)
            .with_protocol(protocol)
            .with_threads(threads)
            .with_timeout(timeout)
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable plain text
    Plain,
    /// JSON structured output
    Json,
    /// CSV format for data analysis
    Csv,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Plain
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("portprobe").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_come_from_settings() {
        let args = parse(&["-t", "127.0.0.1"]);
        let settings = Settings::default();
        let config = args.scan_config(&settings);

        assert_eq!(config.target, "127.0.0.1");
        assert_eq!(config.protocol, "tcp");
        assert_eq!(config.threads, 10);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(args.port_set(&settings).unwrap().len(), 65535);
        assert_eq!(args.output, OutputFormat::Plain);
    }

    #[test]
    fn test_flags_override_settings() {
        let args = parse(&["-t", "host", "-P", "https", "-T", "3", "--timeout", "2"]);
        let config = args.scan_config(&Settings::default());

        assert_eq!(config.protocol, "https");
        assert_eq!(config.threads, 3);
        assert_eq!(config.timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_port_tokens_without_shuffle() {
        let args = parse(&["-t", "host", "--no-random", "-p", "22", "80-82", "443,8443"]);
        let ports = args.port_set(&Settings::default()).unwrap();
        assert_eq!(ports.as_slice(), &[22, 80, 81, 82, 443, 8443]);
    }

    #[test]
    fn test_min_max_range() {
        let args = parse(&["-t", "host", "--no-random", "-m", "20", "-M", "25"]);
        let ports = args.port_set(&Settings::default()).unwrap();
        assert_eq!(ports.as_slice(), &[20, 21, 22, 23, 24, 25]);
    }

    #[test]
    fn test_verbosity_counts() {
        assert_eq!(parse(&["-t", "host", "-vvv"]).verbose, 3);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(Args::try_parse_from(["portprobe", "-t", "h", "-P", "ftp"]).is_err());
        assert!(Args::try_parse_from(["portprobe", "-t", "h", "-T", "0"]).is_err());
        assert!(Args::try_parse_from(["portprobe", "-p", "80"]).is_err());

        let args = parse(&["-t", "host", "-p", "80,"]);
        assert!(args.port_set(&Settings::default()).is_err());
    }
}
