//! Module Registry Tool
//!
//! Validates module descriptor files and syncs them into the remote D1 registry

// registrytool/src/main.rs
mod config;
mod descriptor;
mod errors;
mod export;
mod sync;
mod validate;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{AppConfig, DEFAULT_EXPORT_FILE, DEFAULT_MODULES_DIR, ExportConfig, OperationConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Validate module descriptors and upsert them into the registry database.
#[derive(Parser, Debug)]
#[command(name = "registrytool", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory holding the `<uuid>.json` module descriptors.
    #[arg(long, global = true, default_value = DEFAULT_MODULES_DIR)]
    modules_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check every descriptor against the field rules and for duplicate UUIDs.
    Validate,

    /// Upsert every descriptor into the D1 `modules` table.
    Sync {
        /// Build statements but send nothing; no credentials required.
        #[arg(long)]
        dry_run: bool,
    },

    /// Write the upsert statements, parameters inlined, to a SQL file.
    ExportSql {
        #[arg(long, default_value = DEFAULT_EXPORT_FILE)]
        output: PathBuf,
    },
}

/// Main entry point for the registry tool
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run_app(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_app(cli: Cli) -> Result<ExitCode> {
    // A missing .env is fine; real environment variables still apply.
    if let Err(e) = dotenv::dotenv() {
        tracing::debug!("no .env loaded: {}", e);
    }

    let mut app_config = AppConfig::new(cli.modules_dir);
    tracing::debug!(modules_dir = %app_config.modules_dir.display(), "resolved modules directory");

    match cli.command {
        Commands::Validate => {
            app_config.operation = Some(OperationConfig::Validate);
            validate::run_validate_flow(&app_config)
        }
        Commands::Sync { dry_run } => {
            let sync_config = config::load_sync_config(dry_run, |name| std::env::var(name).ok())
                .context("Failed to load sync configuration from environment")?;
            app_config.operation = Some(OperationConfig::Sync(sync_config));
            sync::run_sync_flow(&app_config).await
        }
        Commands::ExportSql { output } => {
            app_config.operation = Some(OperationConfig::Export(ExportConfig {
                output_path: output,
            }));
            export::run_export_flow(&app_config)
        }
    }
}
