//! Local fallback mapping table
//!
//! CSV with a header row containing `id` and `instanceID` columns. Extra
//! columns are ignored; stray quotes and whitespace around values are removed.
//! Rows may be ragged; rows that cannot be read are skipped and counted.

use agm_common::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

use super::{CatalogError, CatalogMapping, CatalogSource, Lookup};

const KEY_COLUMN: &str = "id";
const INSTANCE_COLUMN: &str = "instanceID";

/// Key → instanceID table loaded once at startup
#[derive(Debug, Clone, Default)]
pub struct FallbackTable {
    mapping: HashMap<String, String>,
    skipped_rows: usize,
}

impl FallbackTable {
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            mapping: pairs.into_iter().collect(),
            skipped_rows: 0,
        }
    }

    /// Load the table, tolerating a missing file
    ///
    /// A missing file yields an empty table. Unreadable rows are skipped; a
    /// file without the key columns is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Fallback mapping file not found, continuing with empty table"
            );
            return Ok(Self::default());
        }

        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path)?;
        let table = Self::from_csv_reader(reader)?;

        tracing::info!(
            path = %path.display(),
            entries = table.len(),
            skipped_rows = table.skipped_rows,
            "Loaded fallback mapping"
        );
        Ok(table)
    }

    fn from_csv_reader<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Self> {
        let headers = reader.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| clean(h) == name)
                .ok_or_else(|| Error::InvalidInput(format!("Fallback mapping has no '{}' column", name)))
        };
        let key_idx = column(KEY_COLUMN)?;
        let instance_idx = column(INSTANCE_COLUMN)?;

        let mut mapping = HashMap::new();
        let mut skipped_rows = 0;
        for record in reader.records() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    skipped_rows += 1;
                    tracing::warn!(error = %e, "Skipping unreadable fallback mapping row");
                    continue;
                }
            };
            let key = record.get(key_idx).map(clean).unwrap_or_default();
            let instance_id = record.get(instance_idx).map(clean).unwrap_or_default();
            if key.is_empty() || instance_id.is_empty() {
                continue;
            }
            mapping.insert(key.to_string(), instance_id.to_string());
        }

        Ok(Self {
            mapping,
            skipped_rows,
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.mapping.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Rows dropped because they could not be read
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }
}

fn clean(value: &str) -> &str {
    value.trim().trim_matches('"').trim()
}

#[async_trait]
impl CatalogSource for FallbackTable {
    fn source_id(&self) -> &'static str {
        "fallback-table"
    }

    async fn lookup(&self, key: &str) -> std::result::Result<Lookup, CatalogError> {
        Ok(match self.get(key) {
            Some(instance_id) => Lookup::Found(CatalogMapping {
                id: key.to_string(),
                instance_id: instance_id.to_string(),
                existing_entity_count: 0,
            }),
            None => Lookup::NotFound,
        })
    }
}
