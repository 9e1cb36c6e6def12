//! Integration stage services, leaf-first:
//! entry parsing → group keys → merging → catalog resolution → status
//! decision → tabular projection.

pub mod catalog;
pub mod entry_parser;
pub mod group_key;
pub mod jsonl_sanitizer;
pub mod record_merger;
pub mod status_decider;
pub mod tabular_projector;

pub use catalog::{CatalogResolver, CatalogSource, FallbackTable, RemoteCatalog, Resolution, ResolutionOrigin};
pub use entry_parser::{EntryParser, ParsedEntries};
pub use group_key::group_key;
pub use jsonl_sanitizer::{sanitize_jsonl, SanitizeReport};
pub use record_merger::RecordMerger;
pub use status_decider::StatusDecider;
pub use tabular_projector::{TableSchema, TabularProjector};
