//! Error taxonomy for the catalog, filter and bulk operation layers

use std::io;
use std::path::PathBuf;

/// Fatal error for an in-flight scan. The previous catalog stays in place.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("Invalid regex: {0}")]
    InvalidRegex(#[from] regex::Error),
}

/// Plan-level failures. None of these touch the filesystem.
#[derive(Debug, thiserror::Error)]
pub enum BulkError {
    #[error("Please select items to {0}.")]
    NoSelection(&'static str),
    #[error("Please enter a rename pattern.")]
    NoPattern,
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

impl BulkError {
    /// Short title used when this error is surfaced as a notice
    pub fn title(&self) -> &'static str {
        match self {
            BulkError::NoSelection(_) => "No Selection",
            BulkError::NoPattern => "No Pattern",
            BulkError::InvalidPattern(_) => "Regex Error",
        }
    }
}

/// Per-item failure recorded during execution; never aborts the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemError {
    pub name: String,
    pub message: String,
}

impl ItemError {
    pub fn new(name: impl Into<String>, message: impl ToString) -> Self {
        Self {
            name: name.into(),
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for ItemError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}
