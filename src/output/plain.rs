//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use crate::scanner::ScanResult;
use console::style;
use std::io::{self, Write};
use std::time::Duration;

/// What a scan is about to do, shown before it starts.
#[derive(Debug, Clone)]
pub struct ScanHeader<'a> {
    pub target: &'a str,
    pub ports: &'a [u16],
    pub protocol: &'a str,
    pub threads: usize,
    pub timeout: Duration,
    pub verbosity: u8,
}

/// Print the scan header before scanning begins.
pub fn print_scan_header(header: &ScanHeader<'_>) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    // Nothing useful to do if stdout is gone.
    let _ = write_header(&mut out, header);
}

pub(crate) fn write_header<W: Write>(out: &mut W, header: &ScanHeader<'_>) -> io::Result<()> {
    let tag = style("[*]").cyan();
    writeln!(
        out,
        "{} {} starting",
        tag,
        style(concat!("portprobe v", env!("CARGO_PKG_VERSION"))).bold()
    )?;
    writeln!(out, "{} target {}", tag, style(header.target).bold())?;
    if header.ports.len() < 11 {
        writeln!(out, "{} ports {:?}", tag, header.ports)?;
    } else {
        writeln!(out, "{} ports {} total", tag, header.ports.len())?;
    }
    writeln!(out, "{} protocol {}", tag, style(header.protocol).yellow())?;
    writeln!(out, "{} threads {}", tag, header.threads)?;
    writeln!(out, "{} timeout {:?}", tag, header.timeout)?;
    writeln!(out, "{} verbosity {}", tag, header.verbosity)?;
    Ok(())
}

/// Line announcing an open port as soon as it is found.
pub fn open_line(port: u16) -> String {
    format!("{} open: {}", style("[!!!]").green().bold(), style(port).green())
}

pub(crate) fn write_plain<W: Write>(
    out: &mut W,
    result: &ScanResult,
    show_errors: bool,
) -> io::Result<()> {
    if show_errors {
        writeln!(
            out,
            "{} errors: {} total",
            style("[=>]").yellow(),
            result.errors.len()
        )?;
        for failure in &result.errors {
            writeln!(
                out,
                "{} {} ({}): {}",
                style("[==>]").dim(),
                failure.port,
                failure.error.kind(),
                failure.error
            )?;
        }
    }

    if result.skipped > 0 {
        writeln!(
            out,
            "{} skipped: {} ports (cancelled)",
            style("[=>]").yellow(),
            result.skipped
        )?;
    }

    writeln!(
        out,
        "{} open ports: {} total",
        style("[=>]").green(),
        style(result.open.len()).green().bold()
    )?;
    for port in &result.open {
        writeln!(out, "{} {}", style("[==>]").dim(), port)?;
    }

    Ok(())
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}
