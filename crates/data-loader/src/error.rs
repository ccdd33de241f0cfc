//! Error types for the data-loader crate.
//!
//! Every failure while reading the catalog and rating files maps onto one
//! variant here so callers can tell a missing file from a malformed row.

use thiserror::Error;

/// Errors that can occur while loading and validating the stores
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The CSV reader rejected a record (bad quoting, wrong column type, ...)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Line in data file couldn't be interpreted
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: u64,
        reason: String,
    },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Referenced entity doesn't exist (e.g., rating for an unknown item)
    #[error("Missing reference: {entity} with id {id}")]
    MissingReference { entity: String, id: u32 },

    /// Data validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Convenience alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
