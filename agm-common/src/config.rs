//! Configuration loading and config file resolution
//!
//! Config file resolution follows a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. Per-user config directory (`<config_dir>/agm/<file_name>`)
//! 4. Compiled defaults (no file)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Statement count at which a catalog item counts as already described
pub const DEFAULT_EXISTING_METADATA_THRESHOLD: usize = 15;

/// Status written for records that still need a human review
pub const DEFAULT_REVIEW_STATUS: &str = "要確認（新規登録）";

/// Entity types holding narrative text rather than structured facts
pub const DEFAULT_SECTION_TYPES: &[&str] = &[
    "catchphrase",
    "instruction",
    "meta",
    "rights",
    "safety_warning",
    "components",
    "credit",
    "immersion",
];

/// Built-in header mapping (internal field name → external column header)
pub const DEFAULT_COLUMN_HEADERS: &[(&str, &str)] = &[
    ("instanceID", "o:id"),
    ("cleaned_text", "dcterms:description"),
    ("status", "review_status"),
];

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    pub paths: PathsConfig,
    pub catalog: CatalogConfig,
    pub policy: PolicyConfig,
    pub columns: ColumnsConfig,
    pub logging: LoggingConfig,
}

/// Input and output locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    /// Line-delimited classification output (one entry per image)
    pub input: PathBuf,
    /// Structured output, one merged record per line
    pub output_jsonl: PathBuf,
    /// Fully quoted tabular output for the collection import
    pub output_csv: PathBuf,
    /// Local `id,instanceID` table used when the catalog cannot answer
    pub fallback_mapping: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("output_cleaned_valid.jsonl"),
            output_jsonl: PathBuf::from("integrated.jsonl"),
            output_csv: PathBuf::from("integrated.csv"),
            fallback_mapping: PathBuf::from("oid_and_itemID.csv"),
        }
    }
}

/// Remote catalog service settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    /// Base URL of the collection site; `None` disables remote lookups
    pub base_url: Option<String>,
    /// Property term holding the item identifier (e.g. `dcterms:identifier`)
    pub identifier_property: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    pub key_identity: Option<String>,
    pub key_credential: Option<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            identifier_property: "dcterms:identifier".to_string(),
            timeout_secs: 10,
            key_identity: None,
            key_credential: None,
        }
    }
}

/// Integration policy constants
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PolicyConfig {
    pub existing_metadata_threshold: usize,
    pub review_status: String,
    /// Compared case-insensitively
    pub section_types: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            existing_metadata_threshold: DEFAULT_EXISTING_METADATA_THRESHOLD,
            review_status: DEFAULT_REVIEW_STATUS.to_string(),
            section_types: DEFAULT_SECTION_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PolicyConfig {
    /// True when `entity_type` is one of the narrative section types
    pub fn is_section_type(&self, entity_type: &str) -> bool {
        self.section_types
            .iter()
            .any(|s| s.eq_ignore_ascii_case(entity_type))
    }
}

/// Column header overrides
///
/// Keys are internal field names (`instanceID`, `cleaned_text`, `status`, or an
/// entity type); values are the headers written to the tabular output.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ColumnsConfig {
    #[serde(flatten)]
    pub overrides: HashMap<String, String>,
}

impl ColumnsConfig {
    /// Header for an internal field name
    ///
    /// Configured overrides win, then the built-in mapping, then the raw name.
    pub fn header_for(&self, field: &str) -> String {
        if let Some(header) = self.overrides.get(field) {
            return header.clone();
        }
        DEFAULT_COLUMN_HEADERS
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, header)| header.to_string())
            .unwrap_or_else(|| field.to_string())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Resolve which config file to read, if any
///
/// Returns `None` when no argument, no environment override, and no per-user
/// file exist; callers then run on compiled defaults.
pub fn resolve_config_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    file_name: &str,
) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Per-user config directory
    let user_config = dirs::config_dir().map(|d| d.join("agm").join(file_name));
    match user_config {
        Some(path) if path.exists() => Some(path),
        _ => None,
    }
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Read config {} failed: {}", path.display(), e))
    })?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse config {} failed: {}", path.display(), e)))
}

/// Configuration plus the file it came from
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: TomlConfig,
    /// `None` when compiled defaults are in use
    pub path: Option<PathBuf>,
}

/// Resolve and load configuration, falling back to defaults when no file exists
///
/// Does not log: callers load config before the subscriber exists and report
/// `path` once logging is up.
pub fn load_config(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    file_name: &str,
) -> Result<LoadedConfig> {
    let path = resolve_config_path(cli_arg, env_var_name, file_name);
    let config = match &path {
        Some(path) => load_toml_config(path)?,
        None => TomlConfig::default(),
    };
    Ok(LoadedConfig { config, path })
}
