//! Record merging
//!
//! Groups entries by item key and merges each group into one `MergedRecord`.
//!
//! **Merge Strategy:**
//! - Keys appear in first-seen order
//! - Text fragments: kept as written, joined with a blank line in source
//!   order; a fragment equal to an earlier one after trimming is dropped, as is
//!   one that is blank
//! - Entities: type names and values are trimmed before grouping; exact
//!   duplicates within a type dropped, first-seen order kept (no cross-type
//!   dedup)
//! - Sources: every contributing filename in order
//!
//! Near-duplicates (differing whitespace inside a fragment, different case)
//! are kept as distinct values.

use indexmap::IndexMap;

use super::group_key::group_key;
use crate::models::{EntityMap, MergedRecord, RawEntry};

const TEXT_SEPARATOR: &str = "\n\n";

/// Accumulates one group's entries
#[derive(Debug, Default)]
struct RecordBuilder {
    /// Trimmed form → fragment as written
    fragments: IndexMap<String, String>,
    entities: EntityMap,
    sources: Vec<String>,
}

impl RecordBuilder {
    fn add(&mut self, entry: RawEntry) {
        let trimmed = entry.cleaned_text.trim();
        if !trimmed.is_empty() && !self.fragments.contains_key(trimmed) {
            self.fragments
                .insert(trimmed.to_string(), entry.cleaned_text.clone());
        }

        for entity in entry.entities {
            let entity_type = entity.entity_type.trim();
            let value = entity.value.trim();
            if entity_type.is_empty() || value.is_empty() {
                continue;
            }

            let values = self.entities.entry(entity_type.to_string()).or_default();
            if !values.contains(value) {
                values.insert(value.to_string());
            }
        }

        self.sources.push(entry.source);
    }

    fn finish(self, id: String) -> MergedRecord {
        MergedRecord {
            id,
            instance_id: None,
            cleaned_text: self
                .fragments
                .into_values()
                .collect::<Vec<_>>()
                .join(TEXT_SEPARATOR),
            entities: self.entities,
            sources: self.sources,
            has_existing_metadata: false,
        }
    }
}

/// Record Merger
pub struct RecordMerger;

impl RecordMerger {
    /// Merge entries into one record per group key
    ///
    /// Every returned record has at least one source. Catalog fields are left
    /// unresolved.
    pub fn merge<I>(entries: I) -> Vec<MergedRecord>
    where
        I: IntoIterator<Item = RawEntry>,
    {
        let mut groups: IndexMap<String, RecordBuilder> = IndexMap::new();

        for entry in entries {
            let key = group_key(&entry.source);
            groups.entry(key).or_default().add(entry);
        }

        tracing::debug!(groups = groups.len(), "Entries grouped");

        groups
            .into_iter()
            .map(|(key, builder)| builder.finish(key))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Entity;

    fn entry(source: &str, text: &str, entities: &[(&str, &str)]) -> RawEntry {
        RawEntry::new(
            source,
            text,
            entities.iter().map(|(t, v)| Entity::new(*t, *v)).collect(),
        )
    }

    fn values(record: &MergedRecord, entity_type: &str) -> Vec<String> {
        record.values_for(entity_type).map(str::to_string).collect()
    }

    #[test]
    fn test_groups_keep_first_seen_order() {
        let records = RecordMerger::merge(vec![
            entry("B2-001.jpeg", "b", &[]),
            entry("A737-001.jpeg", "a", &[]),
            entry("B2-002.jpeg", "b2", &[]),
        ]);

        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["B2", "A737"]);
        assert_eq!(records[0].sources, vec!["B2-001.jpeg", "B2-002.jpeg"]);
    }

    #[test]
    fn test_entity_aggregation_dedups_in_first_seen_order() {
        let records = RecordMerger::merge(vec![entry(
            "A737-001.jpeg",
            "",
            &[("Designer", "Jane"), ("Designer", "Jane"), ("Designer", "Amir")],
        )]);

        assert_eq!(values(&records[0], "Designer"), vec!["Jane", "Amir"]);
    }

    #[test]
    fn test_same_value_under_different_types_is_kept() {
        let records = RecordMerger::merge(vec![entry(
            "A1-001.jpeg",
            "",
            &[("Designer", "Jane"), ("Artist", "Jane")],
        )]);

        assert_eq!(values(&records[0], "Designer"), vec!["Jane"]);
        assert_eq!(values(&records[0], "Artist"), vec!["Jane"]);
    }

    #[test]
    fn test_duplicate_entry_is_idempotent() {
        let original = entry(
            "A737-001.jpeg",
            "Space Trek\nA game for 2-4 players",
            &[("Designer", "Jane"), ("Publisher", "Hobby Japan")],
        );

        let once = RecordMerger::merge(vec![original.clone()]);
        let twice = RecordMerger::merge(vec![original.clone(), original]);

        assert_eq!(once[0].cleaned_text, twice[0].cleaned_text);
        assert_eq!(once[0].entities, twice[0].entities);
        assert_eq!(twice[0].sources.len(), 2);
    }

    #[test]
    fn test_text_dedup_compares_trimmed_fragments() {
        let records = RecordMerger::merge(vec![
            entry("A1-001.jpeg", "  front  ", &[]),
            entry("A1-002.jpeg", "front", &[]),
            entry("A1-003.jpeg", "   ", &[]),
            entry("A1-004.jpeg", "back", &[]),
        ]);

        assert_eq!(records[0].cleaned_text, "  front  \n\nback");
        assert_eq!(records[0].sources.len(), 4);
    }

    #[test]
    fn test_fragments_keep_inner_layout() {
        let records = RecordMerger::merge(vec![
            entry("A1-001.jpeg", "Space Trek\n  2-4 players\n", &[]),
            entry("A1-002.jpeg", "Space Trek\n  2-4 players", &[]),
        ]);

        assert_eq!(records[0].cleaned_text, "Space Trek\n  2-4 players\n");
    }

    #[test]
    fn test_entity_types_are_trimmed_before_grouping() {
        let records = RecordMerger::merge(vec![entry(
            "A1-001.jpeg",
            "",
            &[("Designer", "Jane"), (" Designer ", "Amir")],
        )]);

        assert_eq!(records[0].entities.len(), 1);
        assert_eq!(values(&records[0], "Designer"), vec!["Jane", "Amir"]);
    }

    #[test]
    fn test_near_duplicates_are_not_merged() {
        let records = RecordMerger::merge(vec![entry(
            "A1-001.jpeg",
            "",
            &[("Publisher", "Hobby Japan"), ("Publisher", "hobby japan")],
        )]);

        assert_eq!(values(&records[0], "Publisher").len(), 2);
    }

    #[test]
    fn test_blank_entity_values_are_dropped() {
        let records = RecordMerger::merge(vec![entry(
            "A1-001.jpeg",
            "",
            &[("Designer", "  "), ("", "orphan"), ("Designer", " Jane ")],
        )]);

        assert_eq!(records[0].entities.len(), 1);
        assert_eq!(values(&records[0], "Designer"), vec!["Jane"]);
    }
}
