//! Existing-metadata decision
//!
//! Items the catalog already describes well contribute only their OCR text:
//! their entities are cleared and the status is left empty. Every other item
//! keeps its entities and is flagged for review.

use crate::models::{IntegratedRecord, MergedRecord};

/// Status Decider
#[derive(Debug, Clone)]
pub struct StatusDecider {
    review_status: String,
}

impl StatusDecider {
    pub fn new(review_status: impl Into<String>) -> Self {
        Self {
            review_status: review_status.into(),
        }
    }

    /// Apply the decision to one resolved record
    pub fn decide(&self, mut record: MergedRecord) -> IntegratedRecord {
        let status = if record.has_existing_metadata {
            record.entities.clear();
            String::new()
        } else {
            self.review_status.clone()
        };

        IntegratedRecord { record, status }
    }
}
