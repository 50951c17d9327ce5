//! Payload output: stdout or file.
//!
//! Payloads pass through byte-for-byte, except JSON which is re-indented
//! for readability before writing.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::config::schema::OutputFormat;
use crate::Result;

/// Write `payload` to stdout, or to `out` when an output file is configured.
pub fn write_payload(payload: &[u8], format: OutputFormat, out: Option<&Path>) -> Result<()> {
    let rendered = match format {
        OutputFormat::Json => pretty_json(payload),
        _ => None,
    };
    let bytes = rendered.as_deref().unwrap_or(payload);

    match out {
        Some(path) => fs::write(path, bytes)?,
        None => io::stdout().lock().write_all(bytes)?,
    }
    Ok(())
}

/// Tab-indent a JSON payload. Payloads that fail to parse pass through
/// unchanged.
fn pretty_json(payload: &[u8]) -> Option<Vec<u8>> {
    let value: serde_json::Value = serde_json::from_slice(payload).ok()?;

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser).ok()?;
    buf.push(b'\n');
    Some(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_json_payload_is_tab_indented() {
        let rendered = pretty_json(br#"{"docs":[1,2],"total_count":9}"#).unwrap();
        let text = String::from_utf8(rendered).unwrap();

        assert_eq!(text, "{\n\t\"docs\": [\n\t\t1,\n\t\t2\n\t],\n\t\"total_count\": 9\n}\n");
    }

    #[test]
    fn test_invalid_json_passes_through() {
        assert!(pretty_json(b"Date,Close\n2014-01-03,21.98\n").is_none());
    }

    #[test]
    fn test_csv_written_to_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let payload = b"Date,Close\n2014-01-03,21.98\n";

        write_payload(payload, OutputFormat::Csv, Some(&path)).unwrap();

        assert_eq!(fs::read(&path).unwrap(), payload);
    }

    #[test]
    fn test_json_written_to_file_is_indented() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");

        write_payload(br#"{"a":1}"#, OutputFormat::Json, Some(&path)).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"{\n\t\"a\": 1\n}\n");
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no-such-dir").join("out.csv");

        let result = write_payload(b"x", OutputFormat::Csv, Some(&path));

        assert!(result.is_err());
    }
}
