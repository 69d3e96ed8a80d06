//! JSON output formatting.

use super::ScanReport;
use std::io::{self, Write};

pub(crate) fn write_json<W: Write>(out: &mut W, report: &ScanReport<'_>) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use crate::scanner::{PortFailure, ScanResult};

    #[test]
    fn test_json_shape() {
        let result = ScanResult {
            open: vec![80],
            errors: vec![PortFailure {
                port: 21,
                error: ProbeError::InvalidProtocol("ftp".into()),
            }],
            completed: 2,
            skipped: 0,
        };
        let report = ScanReport {
            target: "127.0.0.1",
            protocol: "ftp",
            ports_scanned: 2,
            result: &result,
        };

        let mut buf = Vec::new();
        write_json(&mut buf, &report).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value["target"], "127.0.0.1");
        assert_eq!(value["open"], serde_json::json!([80]));
        assert_eq!(value["errors"][0]["port"], 21);
        assert_eq!(value["errors"][0]["error"]["kind"], "invalid_protocol");
        assert_eq!(value["completed"], 2);
    }
}
