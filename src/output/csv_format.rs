//! CSV output formatting.

use crate::scanner::ScanResult;
use std::io::{self, Write};

pub(crate) fn write_csv<W: Write>(out: &mut W, result: &ScanResult) -> io::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);

    wtr.write_record(["port", "status", "kind", "detail"])?;

    for port in &result.open {
        wtr.write_record([port.to_string().as_str(), "open", "", ""])?;
    }

    for failure in &result.errors {
        wtr.write_record([
            failure.port.to_string().as_str(),
            "error",
            failure.error.kind().to_string().as_str(),
            failure.error.to_string().as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
