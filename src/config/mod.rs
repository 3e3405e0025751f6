// registrytool/src/config/mod.rs
use std::fmt;
use std::path::PathBuf;

use url::Url;

use crate::errors::{RegistryError, Result};

pub const ACCOUNT_ID_VAR: &str = "CLOUDFLARE_ACCOUNT_ID";
pub const DATABASE_ID_VAR: &str = "D1_DATABASE_ID";
pub const API_TOKEN_VAR: &str = "CLOUDFLARE_API_TOKEN";
pub const API_BASE_VAR: &str = "CLOUDFLARE_API_BASE";

pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";
pub const DEFAULT_MODULES_DIR: &str = "modules";
pub const DEFAULT_EXPORT_FILE: &str = "sync.sql";

/// Credentials and addressing for the remote D1 query endpoint.
#[derive(Clone)]
pub struct D1Config {
    pub account_id: String,
    pub database_id: String,
    pub api_token: String,
    pub api_base: String,
}

impl fmt::Debug for D1Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("D1Config")
            .field("account_id", &self.account_id)
            .field("database_id", &self.database_id)
            .field("api_token", &"<redacted>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl D1Config {
    /// Builds the settings from a variable lookup (the process environment in
    /// `main`). Empty values count as missing; the first missing variable is
    /// reported.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(RegistryError::MissingEnv(name))
        };

        let account_id = required(ACCOUNT_ID_VAR)?;
        let database_id = required(DATABASE_ID_VAR)?;
        let api_token = required(API_TOKEN_VAR)?;
        let api_base = lookup(API_BASE_VAR)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Ok(D1Config {
            account_id,
            database_id,
            api_token,
            api_base,
        })
    }

    /// `{api_base}/accounts/{account}/d1/database/{database}/query`
    pub fn query_endpoint(&self) -> Result<Url> {
        let mut url = Url::parse(&self.api_base).map_err(|e| {
            RegistryError::Config(format!("Invalid API base URL {}: {}", self.api_base, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                RegistryError::Config(format!(
                    "API base URL cannot carry a path: {}",
                    self.api_base
                ))
            })?
            .pop_if_empty()
            .extend([
                "accounts",
                self.account_id.as_str(),
                "d1",
                "database",
                self.database_id.as_str(),
                "query",
            ]);
        Ok(url)
    }
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub dry_run: bool,
    /// Absent in dry-run mode, where no request is ever sent.
    pub d1: Option<D1Config>,
}

#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub output_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub modules_dir: PathBuf,
    pub operation: Option<OperationConfig>,
}

#[derive(Debug, Clone)]
pub enum OperationConfig {
    Validate,
    Sync(SyncConfig),
    Export(ExportConfig),
}

impl AppConfig {
    pub fn new(modules_dir: PathBuf) -> Self {
        AppConfig {
            modules_dir,
            operation: None, // To be filled by main after parsing CLI args
        }
    }
}

/// Resolves the sync configuration. Credentials are only required when the
/// run will actually talk to D1.
pub fn load_sync_config<F>(dry_run: bool, lookup: F) -> Result<SyncConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let d1 = if dry_run {
        None
    } else {
        Some(D1Config::from_lookup(lookup)?)
    };
    Ok(SyncConfig { dry_run, d1 })
}
