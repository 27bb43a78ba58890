//! Pattern Store Error Types

use std::path::PathBuf;
use thiserror::Error;

/// Result type for pattern operations
pub type Result<T> = std::result::Result<T, PatternError>;

/// Pattern loading and lookup errors
#[derive(Error, Debug)]
pub enum PatternError {
    /// No pattern stored under this name
    #[error("Pattern not found: {0}")]
    NotFound(String),

    /// Pattern file could not be read or written
    #[error("Pattern file I/O error at {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Pattern file is not a valid record
    #[error("Invalid pattern file {path}: {source}")]
    Parse {
        /// Offending file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// Pattern record could not be encoded
    #[error("Failed to encode pattern {name}: {source}")]
    Encode {
        /// Pattern name
        name: String,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },
}

impl PatternError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is a lookup miss rather than a storage failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PatternError::NotFound("ak47".to_string());
        assert!(err.to_string().contains("ak47"));
        assert!(err.is_not_found());

        let err = PatternError::io(
            "/tmp/x.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("/tmp/x.json"));
    }
}
