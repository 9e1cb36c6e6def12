//! # AGM Common Library
//!
//! Shared code for the AGM metadata tools:
//! - Error and result types
//! - TOML configuration model and loading
//! - Policy defaults for record integration

pub mod config;
pub mod error;

pub use config::TomlConfig;
pub use error::{Error, Result};
