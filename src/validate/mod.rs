// registrytool/src/validate/mod.rs
pub(crate) mod logic;
pub(crate) mod rules;

use anyhow::{Context, Result};
use std::process::ExitCode;

use crate::config::{AppConfig, OperationConfig};

/// Public entry point for the validation process.
/// Prints every collected error and maps the outcome to an exit code.
pub fn run_validate_flow(app_config: &AppConfig) -> Result<ExitCode> {
    if !matches!(app_config.operation, Some(OperationConfig::Validate)) {
        anyhow::bail!("Validate operation selected but no validate configuration found.");
    }

    let report = logic::validate_directory(&app_config.modules_dir)
        .context("Failed to validate module descriptors")?;

    if report.checked() == 0 {
        println!("No module files found");
        return Ok(ExitCode::SUCCESS);
    }

    if !report.is_clean() {
        println!("Validation errors:");
        for line in report.error_lines() {
            println!("  - {}", line);
        }
        tracing::warn!(errors = report.error_count(), "descriptor validation failed");
        return Ok(ExitCode::FAILURE);
    }

    println!("Validated {} modules successfully", report.checked());
    Ok(ExitCode::SUCCESS)
}
