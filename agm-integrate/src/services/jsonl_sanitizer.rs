//! JSONL repair for raw classifier dumps
//!
//! Keeps only lines that decode as JSON, re-encoded compactly as unescaped
//! UTF-8 with key order preserved, and counts the rest. Blank lines are
//! dropped without being counted.

use agm_common::Result;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Line counts from one sanitize pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SanitizeReport {
    pub valid: usize,
    pub invalid: usize,
}

impl SanitizeReport {
    pub fn display_string(&self) -> String {
        format!("Valid lines: {}, invalid lines: {}", self.valid, self.invalid)
    }
}

/// Copy valid JSON lines from `reader` to `writer`
pub fn sanitize_jsonl<R: BufRead, W: Write>(reader: R, mut writer: W) -> Result<SanitizeReport> {
    let mut report = SanitizeReport::default();

    for (index, bytes) in reader.split(b'\n').enumerate() {
        let bytes = bytes?;
        let Ok(text) = std::str::from_utf8(&bytes) else {
            tracing::debug!(line = index + 1, "Non UTF-8 line dropped");
            report.invalid += 1;
            continue;
        };
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(value) => {
                serde_json::to_writer(&mut writer, &value)?;
                writer.write_all(b"\n")?;
                report.valid += 1;
            }
            Err(e) => {
                tracing::debug!(line = index + 1, error = %e, "Invalid JSON line dropped");
                report.invalid += 1;
            }
        }
    }

    writer.flush()?;
    Ok(report)
}

/// File-to-file variant of [`sanitize_jsonl`]
pub fn sanitize_file(input: &Path, output: &Path) -> Result<SanitizeReport> {
    let reader = BufReader::new(File::open(input)?);
    let writer = BufWriter::new(File::create(output)?);
    let report = sanitize_jsonl(reader, writer)?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        valid = report.valid,
        invalid = report.invalid,
        "JSONL sanitized"
    );
    Ok(report)
}
