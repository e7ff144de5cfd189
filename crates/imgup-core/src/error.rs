//! Core error types for imgup
//!
//! Configuration errors are fatal at construction time; everything that
//! happens while processing a record is either a field-level validation
//! error on the record or an I/O failure returned to the caller.

use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for the upload pipeline
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl UploadError {
    /// Wrap an I/O error together with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            UploadError::Config(_) => "configuration_error",
            UploadError::Io { .. } => "io_error",
        }
    }
}

/// Standard Result type for upload operations
pub type UploadResult<T> = Result<T, UploadError>;

/// Configuration errors, detected once when the behavior is built
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting record_field for attribute {attribute}")]
    MissingRecordField { attribute: String },

    #[error("Record has no filename field {field} (attribute {attribute})")]
    UnknownRecordField { attribute: String, field: String },

    #[error("Record has no upload slot for attribute {0}")]
    UnknownUploadSlot(String),

    #[error("No storage_dir configured for attribute {0}")]
    MissingStorageDir(String),

    #[error("Attribute {0} is configured more than once")]
    DuplicateAttribute(String),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Config file error: {0}")]
    FileError(String),
}

/// Field-level errors on a record, keyed by attribute
///
/// Attributes iterate in name order, so [`full_messages`](Self::full_messages)
/// is stable across runs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, attribute: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(attribute.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of messages
    pub fn len(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    pub fn has_error(&self, attribute: &str) -> bool {
        self.errors.contains_key(attribute)
    }

    /// Messages recorded for an attribute, oldest first
    pub fn messages(&self, attribute: &str) -> &[String] {
        self.errors.get(attribute).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every message prefixed with its attribute, e.g. `logo is too large`
    pub fn full_messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .flat_map(|(attribute, messages)| {
                messages
                    .iter()
                    .map(move |message| format!("{} {}", attribute, message))
            })
            .collect()
    }
}
