//! Error handling module
//!
//! Defines custom error types for the area registry.
//!
//! Player-facing conflicts (name taken, area too large, overlap) are not
//! errors; they are reported through [`crate::area::CreateOutcome`].

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the area registry
#[derive(Error, Debug)]
pub enum AreaRegistryError {
    /// Persistence-related errors
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Errors raised by an area store backend
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Failed to read area list {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write area list {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A single persisted line that could not be turned into a region record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("Too few fields: expected {expected}, got {actual}")]
    TooFewFields { expected: usize, actual: usize },

    #[error("Invalid number in field {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Invalid flag in field {field}: {value:?}")]
    InvalidFlag { field: &'static str, value: String },

    #[error("Empty region name")]
    EmptyName,

    #[error("Line is not valid UTF-8")]
    InvalidEncoding,
}

/// Result type alias for area registry operations
pub type Result<T> = std::result::Result<T, AreaRegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_error_display() {
        let err = RecordError::TooFewFields {
            expected: 9,
            actual: 2,
        };
        assert_eq!(err.to_string(), "Too few fields: expected 9, got 2");

        let err = RecordError::InvalidNumber {
            field: "x-low",
            value: "a".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid number in field x-low: \"a\"");

        assert_eq!(
            RecordError::InvalidEncoding.to_string(),
            "Line is not valid UTF-8"
        );
    }

    #[test]
    fn test_persistence_error_converts() {
        let err: AreaRegistryError = PersistenceError::Write {
            path: PathBuf::from("data/area-list.txt"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        }
        .into();
        assert!(err
            .to_string()
            .starts_with("Persistence error: Failed to write area list data/area-list.txt"));
    }
}
