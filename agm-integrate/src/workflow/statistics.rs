//! Run summary
//!
//! Counts an operator needs to judge data quality of a run that completed.

use serde::Serialize;

/// Counters reported at the end of every run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Entries accepted by the parser
    pub entries_read: usize,
    /// Lines that did not decode as an entry
    pub malformed_lines: usize,
    /// Lines that decoded without a source filename
    pub missing_source: usize,
    /// Merged records written
    pub records: usize,
    /// Whether the remote catalog was used this run
    pub remote_catalog: bool,
    pub remote_resolutions: usize,
    pub remote_failures: usize,
    pub fallback_resolutions: usize,
    pub unmapped_keys: usize,
    pub records_with_instance_id: usize,
    pub records_with_existing_metadata: usize,
    /// Columns in the tabular output
    pub columns: usize,
}

impl RunSummary {
    /// Lines skipped for any reason
    pub fn skipped_lines(&self) -> usize {
        self.malformed_lines + self.missing_source
    }

    pub fn display_string(&self) -> String {
        format!(
            "{} entries → {} records ({} skipped lines), {} fallback resolutions, {} unmapped keys, \
             {} with instanceID, {} with existing metadata",
            self.entries_read,
            self.records,
            self.skipped_lines(),
            self.fallback_resolutions,
            self.unmapped_keys,
            self.records_with_instance_id,
            self.records_with_existing_metadata,
        )
    }

    /// Emit the summary as one structured log event
    pub fn log(&self) {
        tracing::info!(
            entries_read = self.entries_read,
            skipped_lines = self.skipped_lines(),
            malformed_lines = self.malformed_lines,
            missing_source = self.missing_source,
            records = self.records,
            remote_catalog = self.remote_catalog,
            remote_resolutions = self.remote_resolutions,
            remote_failures = self.remote_failures,
            fallback_resolutions = self.fallback_resolutions,
            unmapped_keys = self.unmapped_keys,
            records_with_instance_id = self.records_with_instance_id,
            records_with_existing_metadata = self.records_with_existing_metadata,
            columns = self.columns,
            "Integration complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_string() {
        let summary = RunSummary {
            entries_read: 5,
            malformed_lines: 1,
            missing_source: 1,
            records: 2,
            fallback_resolutions: 1,
            unmapped_keys: 1,
            records_with_instance_id: 1,
            ..Default::default()
        };
        assert_eq!(
            summary.display_string(),
            "5 entries → 2 records (2 skipped lines), 1 fallback resolutions, 1 unmapped keys, \
             1 with instanceID, 0 with existing metadata"
        );
    }
}
