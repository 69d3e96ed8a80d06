//! Output formatting module.
//!
//! Renders a finished scan as plain text, JSON, or CSV.

mod csv_format;
mod json_format;
mod plain;

pub use plain::{open_line, print_error, print_scan_header, print_warning, ScanHeader};

use crate::cli::OutputFormat;
use crate::scanner::ScanResult;
use serde::Serialize;
use std::io;

/// A finished scan together with what was asked for.
#[derive(Debug, Serialize)]
pub struct ScanReport<'a> {
    pub target: &'a str,
    pub protocol: &'a str,
    pub ports_scanned: usize,
    #[serde(flatten)]
    pub result: &'a ScanResult,
}

/// Format and print scan results according to the specified format.
///
/// Plain output lists error details only above verbosity 2.
pub fn print_results(report: &ScanReport<'_>, format: OutputFormat, verbosity: u8) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_results(&mut out, report, format, verbosity)
}

/// Write scan results to any writer.
pub fn write_results<W: io::Write>(
    out: &mut W,
    report: &ScanReport<'_>,
    format: OutputFormat,
    verbosity: u8,
) -> io::Result<()> {
    match format {
        OutputFormat::Plain => plain::write_plain(out, report.result, verbosity > 2),
        OutputFormat::Json => json_format::write_json(out, report),
        OutputFormat::Csv => csv_format::write_csv(out, report.result),
    }
}
