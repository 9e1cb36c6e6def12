//! agm-integrate - Record integration for game-package photographs
//!
//! Merges per-image OCR/classification entries into one record per item,
//! resolves catalog instance IDs (remote service, local fallback table), and
//! writes a structured JSONL file plus a fully quoted CSV for import.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agm_integrate::config::{resolve_settings, RunOverrides};
use agm_integrate::services::jsonl_sanitizer::sanitize_file;
use agm_integrate::IntegrationWorkflow;

const CONFIG_FILE_NAME: &str = "agm-integrate.toml";

/// Command-line arguments for agm-integrate
#[derive(Parser, Debug)]
#[command(name = "agm-integrate")]
#[command(about = "Merge classified photo entries into catalog import records")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "AGM_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (ignored when RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run record integration
    Run {
        /// Classified entries, one JSON object per line
        #[arg(short, long, env = "AGM_INPUT")]
        input: Option<PathBuf>,

        /// Structured output (JSONL)
        #[arg(long, env = "AGM_OUTPUT_JSONL")]
        output_jsonl: Option<PathBuf>,

        /// Tabular output (CSV)
        #[arg(long, env = "AGM_OUTPUT_CSV")]
        output_csv: Option<PathBuf>,

        /// Local id,instanceID mapping
        #[arg(long, env = "AGM_FALLBACK_MAPPING")]
        fallback_mapping: Option<PathBuf>,

        /// Catalog site base URL
        #[arg(long, env = "AGM_CATALOG_URL")]
        catalog_url: Option<String>,

        /// Resolve from the fallback table only
        #[arg(long)]
        offline: bool,
    },

    /// Keep only the lines of a JSONL file that decode as JSON
    FixJsonl {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let loaded = agm_common::config::load_config(args.config.as_deref(), "AGM_CONFIG", CONFIG_FILE_NAME)
        .context("Failed to load configuration")?;
    let config = loaded.config;

    // Initialize tracing
    let default_filter = if args.verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("agm-integrate {}", env!("CARGO_PKG_VERSION"));
    match &loaded.path {
        Some(path) => info!(path = %path.display(), "Loaded configuration"),
        None => info!("No config file found, using defaults"),
    }

    match args.command {
        Command::Run {
            input,
            output_jsonl,
            output_csv,
            fallback_mapping,
            catalog_url,
            offline,
        } => {
            let overrides = RunOverrides {
                input,
                output_jsonl,
                output_csv,
                fallback_mapping,
                catalog_url,
                offline,
            };
            let settings = resolve_settings(config, overrides).context("Invalid configuration")?;

            let mut workflow = IntegrationWorkflow::from_settings(&settings)
                .await
                .context("Failed to prepare integration")?;
            let summary = workflow
                .run(&settings.paths)
                .await
                .context("Integration run failed")?;

            println!("{}", summary.display_string());
        }
        Command::FixJsonl { input, output } => {
            let report = sanitize_file(&input, &output)
                .with_context(|| format!("Failed to sanitize {}", input.display()))?;
            println!("{}", report.display_string());
        }
    }

    Ok(())
}
