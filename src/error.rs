//! The [`AnnoJoinError`] `enum` definition and error messages.
//!
use crate::Position;
use std::path::PathBuf;
use thiserror::Error;

/// The [`AnnoJoinError`] defines the standard set of errors that should
/// be passed to the user.
#[derive(Debug, Error)]
pub enum AnnoJoinError {
    // IO related errors
    #[error("File reading error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Could not access file '{path}': {source}")]
    FileError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Invalid UTF-8 in input: {0}")]
    FromUtf8Error(#[from] std::string::FromUtf8Error),
    #[error("XML error: {0}")]
    XmlError(#[from] quick_xml::Error),

    // Record shape errors (recoverable)
    #[error("Line {line} has {found} columns, but at least {needed} are required")]
    MalformedRecord {
        line: u64,
        needed: usize,
        found: usize,
    },
    #[error("Line {line}, column {column}: could not parse '{value}'")]
    InvalidColumnType {
        line: u64,
        column: usize,
        value: String,
    },
    #[error("<{element}> attribute {attribute}: could not parse '{value}'")]
    InvalidAttribute {
        element: String,
        attribute: String,
        value: String,
    },
    #[error("Key '{value}' does not contain the separator '{separator}'")]
    UnparsableKey { value: String, separator: String },

    // Lookup errors (recoverable)
    #[error("Key '{key}' is not present in index '{index}'")]
    MissingKey { key: String, index: String },

    // Genomic interval errors
    #[error("Invalid BED strand '{0}': must be either '+', '-', or '.'")]
    InvalidStrand(String),
    #[error("Range invalid: start ({0}) must not be greater than end ({1})")]
    InvalidGenomicRange(Position, Position),

    // Command line tool related errors
    #[error("Command line argument error: {0}")]
    ArgumentError(String),
}

impl AnnoJoinError {
    /// Wrap an [`std::io::Error`] with the path that caused it.
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnnoJoinError::FileError {
            path: path.into(),
            source,
        }
    }

    /// Whether this error concerns the shape of a single row or a missing key,
    /// and can therefore be skipped and counted instead of aborting the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AnnoJoinError::MalformedRecord { .. }
                | AnnoJoinError::InvalidColumnType { .. }
                | AnnoJoinError::InvalidAttribute { .. }
                | AnnoJoinError::UnparsableKey { .. }
                | AnnoJoinError::MissingKey { .. }
                | AnnoJoinError::InvalidStrand(_)
                | AnnoJoinError::InvalidGenomicRange(_, _)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::AnnoJoinError;

    #[test]
    fn test_recoverable_classification() {
        let shape = AnnoJoinError::MalformedRecord {
            line: 3,
            needed: 4,
            found: 2,
        };
        assert!(shape.is_recoverable());

        let io = AnnoJoinError::file(
            "missing.bed",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert!(!io.is_recoverable());
        assert!(io.to_string().contains("missing.bed"));

        assert!(!AnnoJoinError::ArgumentError("bad".to_string()).is_recoverable());
    }
}
