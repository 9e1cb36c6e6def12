//! Per-image entries produced by the upstream classification stage

use serde::{Deserialize, Serialize};

/// One classified photograph
///
/// Immutable once read. `cleaned_text` and `entities` default to empty when
/// the classifier omitted them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawEntry {
    /// Source image filename, e.g. `A737-002.jpeg`
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub cleaned_text: String,
    #[serde(default)]
    pub entities: Vec<Entity>,
}

/// A typed value extracted from the photographed text
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Entity {
    #[serde(rename = "type", default)]
    pub entity_type: String,
    /// The classifier writes this under `text`; `value` is also accepted
    #[serde(alias = "text", default)]
    pub value: String,
}

impl Entity {
    pub fn new(entity_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            value: value.into(),
        }
    }
}

impl RawEntry {
    pub fn new(source: impl Into<String>, cleaned_text: impl Into<String>, entities: Vec<Entity>) -> Self {
        Self {
            source: source.into(),
            cleaned_text: cleaned_text.into(),
            entities,
        }
    }
}
