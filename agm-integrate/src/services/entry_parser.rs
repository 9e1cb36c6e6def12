//! Line-delimited entry parsing
//!
//! Reads one `RawEntry` per line. Lines that fail to decode, or that decode
//! without a `source`, are skipped and counted; the run never aborts on bad
//! input.

use agm_common::Result;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::models::RawEntry;

/// Entries read from one input plus skip counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedEntries {
    pub entries: Vec<RawEntry>,
    /// Lines that did not decode as a `RawEntry`
    pub malformed_lines: usize,
    /// Lines that decoded but carried an empty `source`
    pub missing_source: usize,
}

impl ParsedEntries {
    /// Total lines skipped for any reason
    pub fn skipped(&self) -> usize {
        self.malformed_lines + self.missing_source
    }
}

/// Entry Parser
pub struct EntryParser;

impl EntryParser {
    /// Parse entries from a file path
    pub fn parse_file(path: &Path) -> Result<ParsedEntries> {
        tracing::debug!(path = %path.display(), "Reading classification entries");
        let file = File::open(path)?;
        Self::parse_reader(BufReader::new(file))
    }

    /// Parse entries from any buffered reader
    ///
    /// Blank lines are ignored without being counted. Invalid UTF-8 counts as
    /// a malformed line.
    pub fn parse_reader<R: BufRead>(reader: R) -> Result<ParsedEntries> {
        let mut parsed = ParsedEntries::default();

        for (index, bytes) in reader.split(b'\n').enumerate() {
            let line_no = index + 1;
            let Ok(line) = String::from_utf8(bytes?) else {
                tracing::warn!(line = line_no, "Entry is not valid UTF-8, skipping");
                parsed.malformed_lines += 1;
                continue;
            };
            let text = line.trim();
            if text.is_empty() {
                continue;
            }

            match serde_json::from_str::<RawEntry>(text) {
                Ok(entry) if entry.source.trim().is_empty() => {
                    tracing::warn!(line = line_no, "Entry has no source, skipping");
                    parsed.missing_source += 1;
                }
                Ok(entry) => parsed.entries.push(entry),
                Err(e) => {
                    tracing::warn!(line = line_no, error = %e, "Malformed entry, skipping");
                    parsed.malformed_lines += 1;
                }
            }
        }

        tracing::debug!(
            entries = parsed.entries.len(),
            malformed = parsed.malformed_lines,
            missing_source = parsed.missing_source,
            "Entries parsed"
        );

        Ok(parsed)
    }
}
