//! Settings resolution for agm-integrate
//!
//! Resolves run settings with CLI/ENV → TOML → default priority. Command-line
//! flags carry their environment variables through clap, so both arrive here
//! as `RunOverrides`.

use agm_common::config::{CatalogConfig, ColumnsConfig, PathsConfig, PolicyConfig};
use agm_common::{Error, Result, TomlConfig};
use std::path::PathBuf;
use tracing::{info, warn};

/// Environment variable for the catalog API key identity
pub const KEY_IDENTITY_ENV: &str = "AGM_CATALOG_KEY_IDENTITY";
/// Environment variable for the catalog API key credential
pub const KEY_CREDENTIAL_ENV: &str = "AGM_CATALOG_KEY_CREDENTIAL";

/// Values supplied on the command line (or their environment variables)
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub input: Option<PathBuf>,
    pub output_jsonl: Option<PathBuf>,
    pub output_csv: Option<PathBuf>,
    pub fallback_mapping: Option<PathBuf>,
    pub catalog_url: Option<String>,
    /// Skip the remote catalog entirely
    pub offline: bool,
}

/// Fully resolved settings for one run
#[derive(Debug, Clone)]
pub struct IntegrationSettings {
    pub paths: PathsConfig,
    pub catalog: CatalogConfig,
    pub policy: PolicyConfig,
    pub columns: ColumnsConfig,
}

/// Merge overrides into the loaded TOML config and validate the result
pub fn resolve_settings(config: TomlConfig, overrides: RunOverrides) -> Result<IntegrationSettings> {
    let TomlConfig {
        mut paths,
        mut catalog,
        policy,
        columns,
        ..
    } = config;

    if let Some(input) = overrides.input {
        paths.input = input;
    }
    if let Some(output_jsonl) = overrides.output_jsonl {
        paths.output_jsonl = output_jsonl;
    }
    if let Some(output_csv) = overrides.output_csv {
        paths.output_csv = output_csv;
    }
    if let Some(fallback_mapping) = overrides.fallback_mapping {
        paths.fallback_mapping = fallback_mapping;
    }

    catalog.base_url = if overrides.offline {
        info!("Offline mode: catalog service disabled");
        None
    } else {
        overrides
            .catalog_url
            .filter(|url| is_configured(url))
            .or(catalog.base_url)
            .filter(|url| is_configured(url))
    };

    catalog.key_identity = resolve_secret(KEY_IDENTITY_ENV, catalog.key_identity);
    catalog.key_credential = resolve_secret(KEY_CREDENTIAL_ENV, catalog.key_credential);
    if catalog.key_identity.is_some() != catalog.key_credential.is_some() {
        warn!("Only one of key_identity/key_credential configured, sending no credentials");
        catalog.key_identity = None;
        catalog.key_credential = None;
    }

    if catalog.base_url.is_some() && catalog.timeout_secs == 0 {
        return Err(Error::Config("catalog.timeout_secs must be greater than 0".to_string()));
    }
    if catalog.base_url.is_some() && !is_configured(&catalog.identifier_property) {
        return Err(Error::Config("catalog.identifier_property must not be empty".to_string()));
    }

    Ok(IntegrationSettings {
        paths,
        catalog,
        policy,
        columns,
    })
}

/// Environment beats TOML; blank values count as unset
fn resolve_secret(env_name: &str, toml_value: Option<String>) -> Option<String> {
    let env_value = std::env::var(env_name).ok().filter(|v| is_configured(v));
    let toml_value = toml_value.filter(|v| is_configured(v));

    if env_value.is_some() && toml_value.is_some() {
        warn!("{} set in both environment and TOML, using environment", env_name);
    }
    env_value.or(toml_value)
}

/// Non-empty, non-whitespace
pub fn is_configured(value: &str) -> bool {
    !value.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn remote_config() -> TomlConfig {
        let mut config = TomlConfig::default();
        config.catalog.base_url = Some("https://collection.example.org".to_string());
        config
    }

    #[test]
    #[serial]
    fn test_overrides_beat_toml() {
        let overrides = RunOverrides {
            input: Some(PathBuf::from("cli.jsonl")),
            catalog_url: Some("https://cli.example.org".to_string()),
            ..Default::default()
        };

        let settings = resolve_settings(remote_config(), overrides).unwrap();
        assert_eq!(settings.paths.input, PathBuf::from("cli.jsonl"));
        assert_eq!(settings.paths.output_csv, PathBuf::from("integrated.csv"));
        assert_eq!(settings.catalog.base_url.as_deref(), Some("https://cli.example.org"));
    }

    #[test]
    #[serial]
    fn test_offline_disables_catalog() {
        let overrides = RunOverrides {
            offline: true,
            ..Default::default()
        };
        let settings = resolve_settings(remote_config(), overrides).unwrap();
        assert!(settings.catalog.base_url.is_none());
    }

    #[test]
    #[serial]
    fn test_blank_url_is_unset() {
        let mut config = TomlConfig::default();
        config.catalog.base_url = Some("   ".to_string());
        let settings = resolve_settings(config, RunOverrides::default()).unwrap();
        assert!(settings.catalog.base_url.is_none());
    }

    #[test]
    #[serial]
    fn test_zero_timeout_rejected_with_remote() {
        let mut config = remote_config();
        config.catalog.timeout_secs = 0;
        let err = resolve_settings(config, RunOverrides::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    #[serial]
    fn test_environment_credentials_beat_toml() {
        std::env::set_var(KEY_IDENTITY_ENV, "env-identity");
        std::env::set_var(KEY_CREDENTIAL_ENV, "env-credential");

        let mut config = remote_config();
        config.catalog.key_identity = Some("toml-identity".to_string());
        config.catalog.key_credential = Some("toml-credential".to_string());

        let settings = resolve_settings(config, RunOverrides::default()).unwrap();
        assert_eq!(settings.catalog.key_identity.as_deref(), Some("env-identity"));
        assert_eq!(settings.catalog.key_credential.as_deref(), Some("env-credential"));

        std::env::remove_var(KEY_IDENTITY_ENV);
        std::env::remove_var(KEY_CREDENTIAL_ENV);
    }

    #[test]
    #[serial]
    fn test_half_configured_credentials_dropped() {
        let mut config = remote_config();
        config.catalog.key_identity = Some("identity".to_string());

        let settings = resolve_settings(config, RunOverrides::default()).unwrap();
        assert!(settings.catalog.key_identity.is_none());
        assert!(settings.catalog.key_credential.is_none());
    }
}
