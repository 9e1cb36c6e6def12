//! Tabular and structured projection
//!
//! **Two passes over the buffered record set:**
//! 1. Discover the column set: fixed columns, then every entity type seen in
//!    any record (section types excluded, sorted by raw type name), then the
//!    status column
//! 2. Emit one row per record against that header
//!
//! Rows are never streamed during merging; the header depends on the whole
//! corpus.
//!
//! An entity column whose header collides with an earlier header is suffixed
//! ` (2)`, ` (3)`, ... Fixed columns sharing a header is a configuration error.
//!
//! **Encoding:** every field quoted, comma separated, one record per line.
//! Multiple values in one cell (and `sources`) are joined with `||`.

use agm_common::config::{ColumnsConfig, PolicyConfig};
use std::collections::{BTreeSet, HashSet};
use std::io::Write;

use crate::error::{IntegrationError, IntegrationResult};
use crate::models::IntegratedRecord;

/// Delimiter between values sharing one cell
pub const MULTI_VALUE_DELIMITER: &str = "||";

const ID_FIELD: &str = "id";
const INSTANCE_FIELD: &str = "instanceID";
const TEXT_FIELD: &str = "cleaned_text";
const SOURCES_FIELD: &str = "sources";
const STATUS_FIELD: &str = "status";

/// Column set fixed for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    /// External headers in output order
    pub headers: Vec<String>,
    /// Raw entity types backing the dynamic columns, in output order
    pub entity_types: Vec<String>,
}

/// Tabular Projector
#[derive(Debug, Clone)]
pub struct TabularProjector {
    columns: ColumnsConfig,
    policy: PolicyConfig,
}

impl TabularProjector {
    pub fn new(columns: ColumnsConfig, policy: PolicyConfig) -> Self {
        Self { columns, policy }
    }

    /// Pass 1: discover the column set from every record
    pub fn schema(&self, records: &[IntegratedRecord]) -> TableSchema {
        let entity_types: BTreeSet<&str> = records
            .iter()
            .flat_map(|r| r.record.entities.keys())
            .map(String::as_str)
            .filter(|t| !self.policy.is_section_type(t))
            .collect();
        let entity_types: Vec<String> = entity_types.into_iter().map(str::to_string).collect();

        let mut headers = vec![
            self.columns.header_for(ID_FIELD),
            self.columns.header_for(INSTANCE_FIELD),
            self.columns.header_for(TEXT_FIELD),
            self.columns.header_for(SOURCES_FIELD),
        ];
        let status = self.columns.header_for(STATUS_FIELD);

        let mut taken: HashSet<String> = headers.iter().cloned().collect();
        taken.insert(status.clone());
        for entity_type in &entity_types {
            let base = self.columns.header_for(entity_type);
            let mut header = base.clone();
            let mut n = 2;
            while taken.contains(&header) {
                header = format!("{} ({})", base, n);
                n += 1;
            }
            if header != base {
                tracing::warn!(
                    entity_type = %entity_type,
                    header = %header,
                    "Entity column header collides with another column, renamed"
                );
            }
            taken.insert(header.clone());
            headers.push(header);
        }
        headers.push(status);

        TableSchema {
            headers,
            entity_types,
        }
    }

    /// First header that appears more than once
    pub fn duplicate_header(schema: &TableSchema) -> Option<&str> {
        let mut seen = HashSet::new();
        schema
            .headers
            .iter()
            .find(|h| !seen.insert(h.as_str()))
            .map(String::as_str)
    }

    /// Pass 2 for one record: cells in header order
    pub fn row(&self, schema: &TableSchema, record: &IntegratedRecord) -> Vec<String> {
        let merged = &record.record;
        let mut row = vec![
            merged.id.clone(),
            merged.instance_id.clone().unwrap_or_default(),
            merged.cleaned_text.clone(),
            merged.sources.join(MULTI_VALUE_DELIMITER),
        ];
        row.extend(schema.entity_types.iter().map(|entity_type| {
            merged
                .values_for(entity_type)
                .collect::<Vec<_>>()
                .join(MULTI_VALUE_DELIMITER)
        }));
        row.push(record.status.clone());
        row
    }

    /// Write the fully quoted table, header first
    ///
    /// Returns the schema that was written. A repeated header is a
    /// `DuplicateColumn`; a row whose width differs from the header is a
    /// `SchemaInconsistency`.
    pub fn write_csv<W: Write>(
        &self,
        records: &[IntegratedRecord],
        writer: W,
    ) -> IntegrationResult<TableSchema> {
        let schema = self.schema(records);
        if let Some(header) = Self::duplicate_header(&schema) {
            return Err(IntegrationError::DuplicateColumn {
                header: header.to_string(),
            });
        }
        let mut csv_writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(writer);

        csv_writer.write_record(&schema.headers)?;
        for record in records {
            let row = self.row(&schema, record);
            if row.len() != schema.headers.len() {
                return Err(IntegrationError::SchemaInconsistency {
                    record_id: record.record.id.clone(),
                    expected: schema.headers.len(),
                    found: row.len(),
                });
            }
            csv_writer.write_record(&row)?;
        }
        csv_writer.flush()?;

        tracing::debug!(
            columns = schema.headers.len(),
            entity_columns = schema.entity_types.len(),
            rows = records.len(),
            "Table written"
        );
        Ok(schema)
    }

    /// Write one structured JSON object per record
    pub fn write_jsonl<W: Write>(records: &[IntegratedRecord], mut writer: W) -> IntegrationResult<()> {
        for record in records {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntityMap, MergedRecord};

    fn record(id: &str, entities: &[(&str, &[&str])], status: &str) -> IntegratedRecord {
        let mut map = EntityMap::new();
        for (entity_type, values) in entities {
            map.insert(
                entity_type.to_string(),
                values.iter().map(|v| v.to_string()).collect(),
            );
        }
        IntegratedRecord {
            record: MergedRecord {
                id: id.to_string(),
                instance_id: None,
                cleaned_text: format!("{} text", id),
                entities: map,
                sources: vec![format!("{}-001.jpeg", id), format!("{}-002.jpeg", id)],
                has_existing_metadata: false,
            },
            status: status.to_string(),
        }
    }

    fn projector() -> TabularProjector {
        TabularProjector::new(ColumnsConfig::default(), PolicyConfig::default())
    }

    fn render(records: &[IntegratedRecord]) -> String {
        let mut out = Vec::new();
        projector().write_csv(records, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_schema_orders_fixed_dynamic_status() {
        let records = vec![
            record("A1", &[("Publisher", &["HJ"]), ("Designer", &["Jane"])], "r"),
            record("A2", &[("Artist", &["Kei"]), ("safety_warning", &["Small parts"])], "r"),
        ];

        let schema = projector().schema(&records);
        assert_eq!(
            schema.headers,
            vec![
                "id",
                "o:id",
                "dcterms:description",
                "sources",
                "Artist",
                "Designer",
                "Publisher",
                "review_status"
            ]
        );
        assert_eq!(schema.entity_types, vec!["Artist", "Designer", "Publisher"]);
    }

    #[test]
    fn test_section_types_excluded_case_insensitively() {
        let records = vec![record("A1", &[("Credit", &["x"]), ("RULES", &["y"])], "r")];
        let schema = projector().schema(&records);
        assert_eq!(schema.entity_types, vec!["RULES"]);
    }

    #[test]
    fn test_every_row_has_every_column() {
        let records = vec![
            record("A1", &[("Designer", &["Jane", "Amir"])], "review"),
            record("A2", &[("Publisher", &["HJ"])], ""),
        ];

        let csv = render(&records);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            r#""id","o:id","dcterms:description","sources","Designer","Publisher","review_status""#
        );
        assert_eq!(
            lines[1],
            r#""A1","","A1 text","A1-001.jpeg||A1-002.jpeg","Jane||Amir","","review""#
        );
        assert_eq!(
            lines[2],
            r#""A2","","A2 text","A2-001.jpeg||A2-002.jpeg","","HJ","""#
        );
    }

    #[test]
    fn test_embedded_delimiters_stay_inside_quotes() {
        let mut rec = record("A1", &[("Title", &["Go, \"Fast\""])], "r");
        rec.record.cleaned_text = "line one\nline two".to_string();

        let mut out = Vec::new();
        projector().write_csv(&[rec], &mut out).unwrap();

        let mut reader = csv::ReaderBuilder::new().from_reader(out.as_slice());
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[2], "line one\nline two");
        assert_eq!(&row[4], "Go, \"Fast\"");
    }

    #[test]
    fn test_empty_corpus_writes_header_only() {
        let csv = render(&[]);
        assert_eq!(
            csv,
            "\"id\",\"o:id\",\"dcterms:description\",\"sources\",\"review_status\"\n"
        );
    }

    #[test]
    fn test_jsonl_keeps_entity_mapping_and_unicode() {
        let records = vec![record("A1", &[("Designer", &["ジェーン"])], "要確認")];
        let mut out = Vec::new();
        TabularProjector::write_jsonl(&records, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with('\n'));
        assert!(text.contains("ジェーン"));
        let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value["entities"]["Designer"], serde_json::json!(["ジェーン"]));
        assert_eq!(value["status"], "要確認");
    }

    #[test]
    fn test_entity_types_named_like_fixed_columns_get_distinct_headers() {
        let records = vec![record(
            "A1",
            &[("id", &["X-1"]), ("sources", &["box"]), ("status", &["sealed"])],
            "review",
        )];

        let schema = projector().schema(&records);
        assert_eq!(
            schema.headers,
            vec![
                "id",
                "o:id",
                "dcterms:description",
                "sources",
                "id (2)",
                "sources (2)",
                "review_status (2)",
                "review_status",
            ]
        );
        assert_eq!(TabularProjector::duplicate_header(&schema), None);

        let text = render(&records);
        assert!(text.contains(r#""X-1","box","sealed","review""#));
    }

    #[test]
    fn test_fixed_columns_sharing_a_header_is_rejected() {
        let mut columns = ColumnsConfig::default();
        columns.overrides.insert("id".to_string(), "o:id".to_string());
        let projector = TabularProjector::new(columns, PolicyConfig::default());

        let mut out = Vec::new();
        let err = projector
            .write_csv(&[record("A1", &[], "review")], &mut out)
            .unwrap_err();
        assert!(matches!(err, IntegrationError::DuplicateColumn { header } if header == "o:id"));
    }
}
