//! Integration workflow
//!
//! Drives one batch run: parse → merge → resolve → decide → project.
//!
//! **Ordering:** records are resolved one key at a time in first-seen order,
//! and both outputs are written only after the whole merged set is buffered,
//! so the tabular header is known before the first row. Re-running on the same
//! inputs and catalog state yields byte-identical files.

pub mod statistics;

pub use statistics::RunSummary;

use agm_common::config::PathsConfig;
use std::fs::File;
use std::io::BufWriter;
use std::time::Duration;

use crate::config::IntegrationSettings;
use crate::error::IntegrationResult;
use crate::models::{IntegratedRecord, RawEntry};
use crate::services::{
    CatalogResolver, EntryParser, FallbackTable, RecordMerger, RemoteCatalog, StatusDecider,
    TableSchema, TabularProjector,
};

/// Integration Workflow
pub struct IntegrationWorkflow {
    resolver: CatalogResolver,
    decider: StatusDecider,
    projector: TabularProjector,
}

impl IntegrationWorkflow {
    pub fn new(resolver: CatalogResolver, decider: StatusDecider, projector: TabularProjector) -> Self {
        Self {
            resolver,
            decider,
            projector,
        }
    }

    /// Build the workflow from resolved settings
    ///
    /// Loads the fallback table (an unusable file leaves it empty), then probes
    /// the catalog service (if one is configured) to pick the resolution
    /// strategy for the whole run.
    pub async fn from_settings(settings: &IntegrationSettings) -> IntegrationResult<Self> {
        let fallback = FallbackTable::load(&settings.paths.fallback_mapping).unwrap_or_else(|e| {
            tracing::warn!(
                path = %settings.paths.fallback_mapping.display(),
                error = %e,
                "Fallback mapping unusable, continuing with empty table"
            );
            FallbackTable::default()
        });
        let threshold = settings.policy.existing_metadata_threshold;
        let catalog = &settings.catalog;

        let resolver = match catalog.base_url.as_deref() {
            Some(base_url) => match RemoteCatalog::new(
                base_url,
                catalog.identifier_property.clone(),
                Duration::from_secs(catalog.timeout_secs),
            ) {
                Ok(remote) => {
                    let remote = match (&catalog.key_identity, &catalog.key_credential) {
                        (Some(identity), Some(credential)) => {
                            remote.with_credentials(identity.clone(), credential.clone())
                        }
                        _ => remote,
                    };
                    CatalogResolver::select(Box::new(remote), fallback, threshold).await
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Catalog client setup failed, using fallback table only");
                    CatalogResolver::fallback_only(fallback, threshold)
                }
            },
            None => {
                tracing::info!("No catalog service configured, using fallback table only");
                CatalogResolver::fallback_only(fallback, threshold)
            }
        };

        Ok(Self::new(
            resolver,
            StatusDecider::new(settings.policy.review_status.clone()),
            TabularProjector::new(settings.columns.clone(), settings.policy.clone()),
        ))
    }

    /// Merge, resolve and decide every record
    ///
    /// Returns the complete buffered set in first-seen key order.
    pub async fn integrate(&mut self, entries: Vec<RawEntry>) -> Vec<IntegratedRecord> {
        let merged = RecordMerger::merge(entries);
        let mut integrated = Vec::with_capacity(merged.len());

        for mut record in merged {
            let resolution = self.resolver.resolve(&record.id).await;
            record.instance_id = resolution.instance_id;
            record.has_existing_metadata = resolution.has_existing_metadata;
            integrated.push(self.decider.decide(record));
        }

        integrated
    }

    /// Write the structured and tabular outputs
    pub fn write_outputs(
        &self,
        records: &[IntegratedRecord],
        paths: &PathsConfig,
    ) -> IntegrationResult<TableSchema> {
        let jsonl = BufWriter::new(File::create(&paths.output_jsonl)?);
        TabularProjector::write_jsonl(records, jsonl)?;

        let csv = BufWriter::new(File::create(&paths.output_csv)?);
        self.projector.write_csv(records, csv)
    }

    /// Run the whole stage against the configured files
    pub async fn run(&mut self, paths: &PathsConfig) -> IntegrationResult<RunSummary> {
        tracing::info!(input = %paths.input.display(), "Starting record integration");

        let parsed = EntryParser::parse_file(&paths.input)?;
        let mut summary = RunSummary {
            entries_read: parsed.entries.len(),
            malformed_lines: parsed.malformed_lines,
            missing_source: parsed.missing_source,
            remote_catalog: self.resolver.uses_remote(),
            ..Default::default()
        };

        let records = self.integrate(parsed.entries).await;
        let schema = self.write_outputs(&records, paths)?;

        let stats = self.resolver.stats();
        summary.records = records.len();
        summary.remote_resolutions = stats.remote_resolutions;
        summary.remote_failures = stats.remote_failures;
        summary.fallback_resolutions = stats.fallback_resolutions;
        summary.unmapped_keys = stats.unmapped_keys;
        summary.records_with_instance_id = records
            .iter()
            .filter(|r| r.record.instance_id.is_some())
            .count();
        summary.records_with_existing_metadata = records
            .iter()
            .filter(|r| r.record.has_existing_metadata)
            .count();
        summary.columns = schema.headers.len();

        tracing::info!(
            output_jsonl = %paths.output_jsonl.display(),
            output_csv = %paths.output_csv.display(),
            "Outputs written"
        );
        summary.log();

        Ok(summary)
    }
}
