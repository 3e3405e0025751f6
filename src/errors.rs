// registrytool/src/errors.rs
use thiserror::Error;

use crate::validate::rules::VALID_CATEGORIES;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("I/O error reading {file}: {source}")]
    Io {
        file: String,
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(#[source] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Filename mismatch: expected {expected}, got {actual}")]
    FilenameMismatch { expected: String, actual: String },

    #[error("Duplicate UUID '{uuid}' in {file} and {first_file}")]
    DuplicateUuid {
        uuid: String,
        file: String,
        first_file: String,
    },

    #[error("HTTP request error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP Error {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Malformed response body: {0}")]
    Decode(String),

    #[error("{0}")]
    Application(String),
}

/// A single field-rule violation inside one descriptor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("descriptor must be a JSON object")]
    NotAnObject,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("{0} must be a string")]
    NotAString(&'static str),

    #[error("UUID must be 3-100 characters: {0}")]
    UuidLength(String),

    #[error("Invalid UUID format: {0}")]
    UuidFormat(String),

    #[error("Invalid version format: {0}")]
    Version(String),

    #[error("Invalid repo_url (must be https://github.com/owner/repo): {0}")]
    RepoUrl(String),

    #[error("Invalid category '{0}'. Valid: {categories}", categories = VALID_CATEGORIES.join(", "))]
    Category(String),

    #[error("tags must be an array")]
    TagsNotArray,

    #[error("Maximum 10 tags allowed (got {0})")]
    TooManyTags(usize),

    #[error("Invalid tag: {0}")]
    InvalidTag(String),

    #[error("Duplicate tag: {0}")]
    DuplicateTag(String),

    #[error("name must be 3-50 characters")]
    NameLength,

    #[error("description must be 10-500 characters")]
    DescriptionLength,

    #[error("author must not be empty")]
    EmptyAuthor,

    #[error("{0} must be a string or null")]
    OptionalNotString(&'static str),

    #[error("downloads must be a non-negative integer")]
    Downloads,
}

pub type Result<T> = std::result::Result<T, RegistryError>;
