// registrytool/src/validate/logic.rs
use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

use super::rules::validate_module;
use crate::descriptor::{file_name, list_descriptor_files, read_document};
use crate::errors::{RegistryError, Result};

/// Outcome of validating a single descriptor file.
#[derive(Debug)]
pub struct FileReport {
    pub file_name: String,
    /// The `uuid` the file claims, when it parsed and `uuid` is a string.
    pub uuid: Option<String>,
    pub errors: Vec<RegistryError>,
}

/// Outcome of validating a whole descriptor directory.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub files: Vec<FileReport>,
    pub duplicates: Vec<RegistryError>,
}

impl ValidationReport {
    pub fn checked(&self) -> usize {
        self.files.len()
    }

    pub fn error_count(&self) -> usize {
        self.files.iter().map(|f| f.errors.len()).sum::<usize>() + self.duplicates.len()
    }

    pub fn is_clean(&self) -> bool {
        self.error_count() == 0
    }

    /// Every error as a report line: per-file errors prefixed by file name,
    /// then duplicate errors.
    pub fn error_lines(&self) -> Vec<String> {
        self.files
            .iter()
            .flat_map(|report| {
                report
                    .errors
                    .iter()
                    .map(move |e| format!("{}: {}", report.file_name, e))
            })
            .chain(self.duplicates.iter().map(ToString::to_string))
            .collect()
    }
}

/// Applies the field rules and the filename identity check to one parsed document.
pub fn validate_document(file_name: &str, document: &Value) -> FileReport {
    let mut errors: Vec<RegistryError> = validate_module(document)
        .into_iter()
        .map(RegistryError::from)
        .collect();

    let uuid = document
        .get("uuid")
        .and_then(Value::as_str)
        .map(str::to_owned);
    if let Some(uuid) = &uuid {
        let expected = format!("{uuid}.json");
        if file_name != expected {
            errors.push(RegistryError::FilenameMismatch {
                expected,
                actual: file_name.to_string(),
            });
        }
    }

    FileReport {
        file_name: file_name.to_string(),
        uuid,
        errors,
    }
}

/// Reads and validates one descriptor file. Read and parse failures become
/// the file's only error.
pub fn validate_file(path: &Path) -> FileReport {
    let name = file_name(path);
    match read_document(path) {
        Ok(document) => validate_document(&name, &document),
        Err(e) => FileReport {
            file_name: name,
            uuid: None,
            errors: vec![e],
        },
    }
}

/// Reports every file whose `uuid` was already claimed by an earlier file.
///
/// Files without a usable `uuid` are skipped; their problem is already part
/// of their own report.
pub fn find_duplicate_uuids(files: &[FileReport]) -> Vec<RegistryError> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    let mut duplicates = Vec::new();
    for report in files {
        let Some(uuid) = report.uuid.as_deref() else {
            continue;
        };
        match seen.get(uuid) {
            Some(first_file) => duplicates.push(RegistryError::DuplicateUuid {
                uuid: uuid.to_string(),
                file: report.file_name.clone(),
                first_file: first_file.to_string(),
            }),
            None => {
                seen.insert(uuid, &report.file_name);
            }
        }
    }
    duplicates
}

/// Validates every descriptor in `dir` in file-name order.
pub fn validate_directory(dir: &Path) -> Result<ValidationReport> {
    let files: Vec<FileReport> = list_descriptor_files(dir)?
        .iter()
        .map(|path| validate_file(path))
        .collect();
    let duplicates = find_duplicate_uuids(&files);

    tracing::debug!(
        files = files.len(),
        duplicates = duplicates.len(),
        "validated descriptor directory"
    );
    Ok(ValidationReport { files, duplicates })
}
