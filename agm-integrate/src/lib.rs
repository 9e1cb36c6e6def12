//! agm-integrate library interface
//!
//! Merges per-image classification entries into per-item records, resolves
//! catalog identifiers, and writes structured and tabular import files.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod workflow;

pub use crate::error::{IntegrationError, IntegrationResult};
pub use crate::workflow::{IntegrationWorkflow, RunSummary};
