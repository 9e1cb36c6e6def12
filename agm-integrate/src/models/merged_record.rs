//! Per-item records built by merging all photographs of one item

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

/// Entity type → distinct values, both in first-seen order
pub type EntityMap = IndexMap<String, IndexSet<String>>;

/// All photographs of one physical item merged into one record
///
/// `sources` is never empty; `id` is unique within one run's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedRecord {
    pub id: String,
    #[serde(rename = "instanceID", skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    pub cleaned_text: String,
    pub entities: EntityMap,
    pub sources: Vec<String>,
    #[serde(rename = "hasExistingMetadata")]
    pub has_existing_metadata: bool,
}

impl MergedRecord {
    /// Values recorded for `entity_type`, empty if the type is absent
    pub fn values_for(&self, entity_type: &str) -> impl Iterator<Item = &str> {
        self.entities
            .get(entity_type)
            .into_iter()
            .flat_map(|values| values.iter().map(String::as_str))
    }

    /// Number of distinct values across all entity types
    pub fn entity_value_count(&self) -> usize {
        self.entities.values().map(IndexSet::len).sum()
    }
}

/// A merged record after the existing-metadata decision
///
/// This is the shape written to the structured output and projected into the
/// table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegratedRecord {
    #[serde(flatten)]
    pub record: MergedRecord,
    /// Empty when the catalog already describes the item
    pub status: String,
}
