// registrytool/src/sync/statement.rs
//! Idempotent upsert statement for the remote `modules` table.

use serde::Serialize;
use serde_json::Value;
use std::sync::LazyLock;

use crate::descriptor::ModuleDescriptor;

pub const TABLE_NAME: &str = "modules";
pub const KEY_COLUMN: &str = "uuid";

/// Columns bound to positional parameters, in parameter order.
pub const PARAM_COLUMNS: [&str; 12] = [
    "uuid",
    "name",
    "description",
    "author",
    "category",
    "version",
    "repo_url",
    "icon",
    "screenshot",
    "license",
    "downloads",
    "tags",
];

/// Set by the store itself at write time.
pub const TIMESTAMP_COLUMN: &str = "updated_at";

/// Never overwritten on conflict; the remote counter is accumulated elsewhere.
pub const PRESERVED_ON_CONFLICT: [&str; 1] = ["downloads"];

static UPSERT_SQL: LazyLock<String> = LazyLock::new(|| {
    let columns = PARAM_COLUMNS
        .iter()
        .chain(std::iter::once(&TIMESTAMP_COLUMN))
        .copied()
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=PARAM_COLUMNS.len())
        .map(|i| format!("?{i}"))
        .chain(std::iter::once("CURRENT_TIMESTAMP".to_string()))
        .collect::<Vec<_>>()
        .join(", ");
    let assignments = PARAM_COLUMNS
        .iter()
        .filter(|col| **col != KEY_COLUMN && !PRESERVED_ON_CONFLICT.contains(*col))
        .map(|col| format!("    {col} = excluded.{col}"))
        .chain(std::iter::once(format!(
            "    {TIMESTAMP_COLUMN} = CURRENT_TIMESTAMP"
        )))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "INSERT INTO {TABLE_NAME} ({columns})\n\
         VALUES ({placeholders})\n\
         ON CONFLICT({KEY_COLUMN}) DO UPDATE SET\n{assignments}"
    )
});

/// A parameterized statement plus its ordered positional parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpsertStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Builds the insert-or-update statement for one descriptor. Pure: no I/O
/// and no clock reads; `updated_at` is left to the store.
pub fn build_upsert_statement(module: &ModuleDescriptor) -> UpsertStatement {
    let tags = module.tags.as_deref().unwrap_or_default();
    let tags_json = Value::from(tags).to_string();

    let params = vec![
        Value::from(module.uuid.as_str()),
        Value::from(module.name.as_str()),
        Value::from(module.description.as_str()),
        Value::from(module.author.as_str()),
        Value::from(module.category.as_str()),
        Value::from(module.version.as_str()),
        Value::from(module.repo_url.as_str()),
        Value::from(module.icon.as_deref()),
        Value::from(module.screenshot.as_deref()),
        Value::from(module.license.as_deref()),
        Value::from(module.downloads.unwrap_or(0)),
        Value::from(tags_json),
    ];

    UpsertStatement {
        sql: UPSERT_SQL.clone(),
        params,
    }
}
