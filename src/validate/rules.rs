// registrytool/src/validate/rules.rs
//! Field-level rules for module descriptors.
//!
//! Rules operate on the raw JSON document so a missing key can be told apart
//! from a key holding the wrong type. Every field is checked and all failures
//! are returned; within a single field the first failing rule wins.

use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::errors::ValidationError;

pub const VALID_CATEGORIES: [&str; 13] = [
    "system",
    "hardware",
    "network",
    "audio",
    "power",
    "time",
    "workspace",
    "window",
    "tray",
    "weather",
    "productivity",
    "media",
    "custom",
];

pub const REQUIRED_FIELDS: [&str; 7] = [
    "uuid",
    "name",
    "description",
    "author",
    "category",
    "version",
    "repo_url",
];

const OPTIONAL_STRING_FIELDS: [&str; 3] = ["icon", "screenshot", "license"];

pub const MAX_TAGS: usize = 10;
const TAG_LENGTH: (usize, usize) = (1, 30);
const UUID_LENGTH: (usize, usize) = (3, 100);
const NAME_LENGTH: (usize, usize) = (3, 50);
const DESCRIPTION_LENGTH: (usize, usize) = (10, 500);

static UUID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9-]*@[a-z0-9][a-z0-9-]*$").expect("uuid pattern compiles")
});

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+\.[0-9]+\.[0-9]+(-[a-zA-Z0-9.]+)?$").expect("version pattern compiles")
});

static REPO_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://github\.com/[^/]+/[^/]+$").expect("repo_url pattern compiles")
});

fn char_len_within(value: &str, (min, max): (usize, usize)) -> bool {
    let len = value.chars().count();
    (min..=max).contains(&len)
}

pub fn validate_uuid(uuid: &str) -> Result<(), ValidationError> {
    if !char_len_within(uuid, UUID_LENGTH) {
        return Err(ValidationError::UuidLength(uuid.to_string()));
    }
    if !UUID_PATTERN.is_match(uuid) {
        return Err(ValidationError::UuidFormat(uuid.to_string()));
    }
    Ok(())
}

pub fn validate_version(version: &str) -> Result<(), ValidationError> {
    if !VERSION_PATTERN.is_match(version) {
        return Err(ValidationError::Version(version.to_string()));
    }
    Ok(())
}

pub fn validate_repo_url(url: &str) -> Result<(), ValidationError> {
    if !REPO_URL_PATTERN.is_match(url) {
        return Err(ValidationError::RepoUrl(url.to_string()));
    }
    Ok(())
}

/// Exact, case-sensitive membership in [`VALID_CATEGORIES`].
pub fn validate_category(category: &str) -> Result<(), ValidationError> {
    if !VALID_CATEGORIES.contains(&category) {
        return Err(ValidationError::Category(category.to_string()));
    }
    Ok(())
}

/// `None` and JSON `null` both mean "no tags".
pub fn validate_tags(tags: Option<&Value>) -> Result<(), ValidationError> {
    let items = match tags {
        None | Some(Value::Null) => return Ok(()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ValidationError::TagsNotArray),
    };
    if items.len() > MAX_TAGS {
        return Err(ValidationError::TooManyTags(items.len()));
    }

    let mut seen = HashSet::new();
    for item in items {
        let tag = match item.as_str() {
            Some(tag) if char_len_within(tag, TAG_LENGTH) => tag,
            Some(tag) => return Err(ValidationError::InvalidTag(tag.to_string())),
            None => return Err(ValidationError::InvalidTag(item.to_string())),
        };
        if !seen.insert(tag) {
            return Err(ValidationError::DuplicateTag(tag.to_string()));
        }
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if !char_len_within(name, NAME_LENGTH) {
        return Err(ValidationError::NameLength);
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<(), ValidationError> {
    if !char_len_within(description, DESCRIPTION_LENGTH) {
        return Err(ValidationError::DescriptionLength);
    }
    Ok(())
}

pub fn validate_author(author: &str) -> Result<(), ValidationError> {
    if author.trim().is_empty() {
        return Err(ValidationError::EmptyAuthor);
    }
    Ok(())
}

fn validate_downloads(downloads: Option<&Value>) -> Result<(), ValidationError> {
    match downloads {
        None | Some(Value::Null) => Ok(()),
        Some(value) if value.as_u64().is_some() => Ok(()),
        Some(_) => Err(ValidationError::Downloads),
    }
}

fn string_field<'a>(
    data: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    data.get(field)
        .and_then(Value::as_str)
        .ok_or(ValidationError::NotAString(field))
}

/// Checks a whole descriptor document and returns every rule it breaks.
pub fn validate_module(data: &Value) -> Vec<ValidationError> {
    let Some(data) = data.as_object() else {
        return vec![ValidationError::NotAnObject];
    };

    let missing: Vec<ValidationError> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| !data.contains_key(*field))
        .map(ValidationError::MissingField)
        .collect();
    if !missing.is_empty() {
        return missing;
    }

    let checks: [(&'static str, fn(&str) -> Result<(), ValidationError>); 7] = [
        ("uuid", validate_uuid),
        ("version", validate_version),
        ("repo_url", validate_repo_url),
        ("category", validate_category),
        ("name", validate_name),
        ("description", validate_description),
        ("author", validate_author),
    ];

    let mut errors = Vec::new();
    for (field, rule) in checks {
        if let Err(e) = string_field(data, field).and_then(rule) {
            errors.push(e);
        }
    }
    if let Err(e) = validate_tags(data.get("tags")) {
        errors.push(e);
    }
    for field in OPTIONAL_STRING_FIELDS {
        if matches!(data.get(field), Some(value) if !value.is_null() && !value.is_string()) {
            errors.push(ValidationError::OptionalNotString(field));
        }
    }
    if let Err(e) = validate_downloads(data.get("downloads")) {
        errors.push(e);
    }
    errors
}
