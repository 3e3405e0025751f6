// registrytool/src/sync/mod.rs
pub(crate) mod d1_client;
pub(crate) mod logic;
pub(crate) mod statement;

use anyhow::{Context, Result};
use std::process::ExitCode;

use crate::config::{AppConfig, OperationConfig};
use crate::descriptor::load_descriptors;
use d1_client::D1Client;
use logic::{SyncTarget, sync_descriptors};

/// Public entry point for the sync process.
/// Loads every descriptor and upserts it into D1 (or pretends to, in dry-run mode).
pub async fn run_sync_flow(app_config: &AppConfig) -> Result<ExitCode> {
    let sync_config = match &app_config.operation {
        Some(OperationConfig::Sync(cfg)) => cfg,
        _ => anyhow::bail!("Sync operation selected but no sync configuration found."),
    };

    let target = match (&sync_config.d1, sync_config.dry_run) {
        (_, true) => SyncTarget::DryRun,
        (Some(d1), false) => {
            SyncTarget::Remote(D1Client::new(d1).context("Failed to build D1 client")?)
        }
        (None, false) => anyhow::bail!("Sync requires D1 credentials unless --dry-run is set."),
    };

    let entries = load_descriptors(&app_config.modules_dir)
        .context("Failed to load module descriptors")?;
    if entries.is_empty() {
        println!("No modules found to sync");
        return Ok(ExitCode::SUCCESS);
    }

    println!("Found {} modules to sync", entries.len());
    let tally = sync_descriptors(entries, &target).await;
    println!(
        "\nSync complete: {} succeeded, {} failed",
        tally.succeeded, tally.failed
    );

    if tally.failed > 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::descriptor::tests::{weather_module, write_module};
    use tempfile::TempDir;

    fn sync_app(modules_dir: &std::path::Path, dry_run: bool) -> AppConfig {
        let mut app_config = AppConfig::new(modules_dir.to_path_buf());
        app_config.operation = Some(OperationConfig::Sync(SyncConfig { dry_run, d1: None }));
        app_config
    }

    #[tokio::test]
    async fn test_empty_directory_exits_zero() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let code = run_sync_flow(&sync_app(dir.path(), true)).await?;
        assert_eq!(code, ExitCode::SUCCESS);
        Ok(())
    }

    #[tokio::test]
    async fn test_dry_run_over_directory_exits_zero() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        for uuid in ["a@x", "b@x", "c@x"] {
            let mut module = weather_module();
            module["uuid"] = serde_json::json!(uuid);
            write_module(dir.path(), &format!("{uuid}.json"), &module);
        }
        let code = run_sync_flow(&sync_app(dir.path(), true)).await?;
        assert_eq!(code, ExitCode::SUCCESS);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_directory_is_fatal() {
        let dir = TempDir::new().expect("tempdir");
        let result = run_sync_flow(&sync_app(&dir.path().join("missing"), true)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_live_run_without_credentials_is_fatal() {
        let dir = TempDir::new().expect("tempdir");
        let result = run_sync_flow(&sync_app(dir.path(), false)).await;
        assert!(result.is_err());
    }
}
