// registrytool/src/export/mod.rs
//! Offline SQL export: the same upserts the syncer sends, with parameters
//! inlined as SQL literals so the file can be applied with
//! `wrangler d1 execute --file`.

use anyhow::{Context, Result};
use chrono::Local;
use regex::{Captures, Regex};
use serde_json::Value;
use std::fs;
use std::process::ExitCode;
use std::sync::LazyLock;

use crate::config::{AppConfig, OperationConfig};
use crate::descriptor::{ModuleDescriptor, list_descriptor_files, load_descriptor};
use crate::sync::statement::{UpsertStatement, build_upsert_statement};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?([0-9]+)").expect("placeholder pattern compiles"));

/// Renders a JSON parameter as a SQL literal.
pub fn escape_sql(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => u8::from(*b).to_string(),
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}

/// Substitutes every `?N` placeholder with the N-th parameter as a literal.
pub fn inline_params(statement: &UpsertStatement) -> String {
    PLACEHOLDER
        .replace_all(&statement.sql, |caps: &Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|index| statement.params.get(index))
                .map(escape_sql)
                .unwrap_or_else(|| "NULL".to_string())
        })
        .into_owned()
}

/// Builds the full export script for a set of descriptors.
pub fn generate_upsert_sql(modules: &[ModuleDescriptor]) -> String {
    modules
        .iter()
        .map(|module| format!("{};", inline_params(&build_upsert_statement(module))))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Public entry point for the export process.
pub fn run_export_flow(app_config: &AppConfig) -> Result<ExitCode> {
    let export_config = match &app_config.operation {
        Some(OperationConfig::Export(cfg)) => cfg,
        _ => anyhow::bail!("Export operation selected but no export configuration found."),
    };

    let files = list_descriptor_files(&app_config.modules_dir)
        .context("Failed to list module descriptors")?;
    if files.is_empty() {
        println!("No modules found");
        return Ok(ExitCode::SUCCESS);
    }

    let modules = files
        .iter()
        .map(|path| {
            load_descriptor(path)
                .with_context(|| format!("Failed to load descriptor {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let script = format!(
        "-- Module registry upserts\n-- Generated: {}\n\n{}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        generate_upsert_sql(&modules)
    );
    fs::write(&export_config.output_path, script).with_context(|| {
        format!(
            "Failed to write SQL export to {}",
            export_config.output_path.display()
        )
    })?;

    println!(
        "Generated {} with {} modules",
        export_config.output_path.display(),
        modules.len()
    );
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExportConfig;
    use crate::descriptor::tests::{weather_module, write_module};
    use serde_json::json;
    use tempfile::TempDir;

    fn weather() -> ModuleDescriptor {
        serde_json::from_value(weather_module()).expect("descriptor")
    }

    #[test]
    fn test_escape_sql() {
        assert_eq!(escape_sql(&json!("O'Brien")), "'O''Brien'");
        assert_eq!(escape_sql(&Value::Null), "NULL");
        assert_eq!(escape_sql(&json!(42)), "42");
        assert_eq!(escape_sql(&json!("")), "''");
        assert_eq!(escape_sql(&json!("hello")), "'hello'");
    }

    #[test]
    fn test_inline_params_handles_two_digit_placeholders() {
        let mut module = weather();
        module.tags = Some(vec!["it's".into()]);
        let sql = inline_params(&build_upsert_statement(&module));

        assert!(!sql.contains('?'));
        assert!(sql.contains(
            "VALUES ('weather-wttr@community', 'Weather', 'Shows current weather', \
             'community', 'weather', '1.0.0', 'https://github.com/x/wttr', NULL, NULL, \
             NULL, 0, '[\"it''s\"]', CURRENT_TIMESTAMP)"
        ));
    }

    #[test]
    fn test_generate_joins_statements() {
        let mut second = weather();
        second.uuid = "other@x".into();
        let sql = generate_upsert_sql(&[weather(), second]);

        assert_eq!(sql.matches("INSERT INTO modules").count(), 2);
        assert!(sql.contains("CURRENT_TIMESTAMP;\n\nINSERT INTO modules"));
        assert!(!sql.contains("downloads = excluded.downloads"));
    }

    #[test]
    fn test_run_export_writes_file() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let modules_dir = dir.path().join("modules");
        fs::create_dir(&modules_dir)?;
        write_module(&modules_dir, "weather-wttr@community.json", &weather_module());
        let output_path = dir.path().join("sync.sql");

        let mut app_config = AppConfig::new(modules_dir);
        app_config.operation = Some(OperationConfig::Export(ExportConfig {
            output_path: output_path.clone(),
        }));

        assert_eq!(run_export_flow(&app_config)?, ExitCode::SUCCESS);
        let written = fs::read_to_string(&output_path)?;
        assert!(written.starts_with("-- Module registry upserts\n-- Generated: "));
        assert!(written.contains("'weather-wttr@community'"));
        Ok(())
    }

    #[test]
    fn test_run_export_empty_directory_writes_nothing() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let output_path = dir.path().join("sync.sql");
        let mut app_config = AppConfig::new(dir.path().to_path_buf());
        app_config.operation = Some(OperationConfig::Export(ExportConfig {
            output_path: output_path.clone(),
        }));

        assert_eq!(run_export_flow(&app_config)?, ExitCode::SUCCESS);
        assert!(!output_path.exists());
        Ok(())
    }
}
