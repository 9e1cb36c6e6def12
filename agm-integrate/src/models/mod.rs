//! Record types flowing through the integration stage

pub mod merged_record;
pub mod raw_entry;

pub use merged_record::{EntityMap, IntegratedRecord, MergedRecord};
pub use raw_entry::{Entity, RawEntry};
