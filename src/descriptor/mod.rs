// registrytool/src/descriptor/mod.rs
//! Shared loading of module descriptor files.
//!
//! Both the validator and the syncer read the same directory of `<uuid>.json`
//! files. Listing is non-recursive and sorted by file name so every run visits
//! descriptors in the same order.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::errors::{RegistryError, Result};

pub const DESCRIPTOR_EXTENSION: &str = "json";

/// One registry module as authored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub uuid: String,
    pub name: String,
    pub description: String,
    pub author: String,
    pub category: String,
    pub version: String,
    pub repo_url: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub screenshot: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub downloads: Option<u64>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// A descriptor file paired with its typed load result.
#[derive(Debug)]
pub struct LoadedDescriptor {
    pub file_name: String,
    pub descriptor: Result<ModuleDescriptor>,
}

/// Fails with a configuration error when `dir` is missing or not a directory.
pub fn ensure_modules_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(RegistryError::Config(format!(
            "Modules directory not found: {}",
            dir.display()
        )));
    }
    Ok(())
}

/// Lists the `*.json` files directly inside `dir`, sorted by file name.
pub fn list_descriptor_files(dir: &Path) -> Result<Vec<PathBuf>> {
    ensure_modules_dir(dir)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| RegistryError::Io {
            file: dir.display().to_string(),
            source: e.into(),
        })?;
        // Symlinked descriptors count; dangling links do not.
        if !entry.path().is_file() {
            continue;
        }
        let path = entry.into_path();
        if path.extension().and_then(|ext| ext.to_str()) == Some(DESCRIPTOR_EXTENSION) {
            files.push(path);
        }
    }
    tracing::debug!(dir = %dir.display(), count = files.len(), "listed descriptor files");
    Ok(files)
}

/// Base name of a descriptor path, as used in every report line.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Reads a descriptor file as an untyped JSON document.
pub fn read_document(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|source| RegistryError::Io {
        file: file_name(path),
        source,
    })?;
    serde_json::from_str(&content).map_err(RegistryError::Parse)
}

/// Reads a descriptor file into a typed [`ModuleDescriptor`].
pub fn load_descriptor(path: &Path) -> Result<ModuleDescriptor> {
    let document = read_document(path)?;
    serde_json::from_value(document).map_err(RegistryError::InvalidDescriptor)
}

/// Loads every descriptor in `dir`, keeping per-file failures instead of aborting.
pub fn load_descriptors(dir: &Path) -> Result<Vec<LoadedDescriptor>> {
    Ok(list_descriptor_files(dir)?
        .iter()
        .map(|path| LoadedDescriptor {
            file_name: file_name(path),
            descriptor: load_descriptor(path),
        })
        .collect())
}
