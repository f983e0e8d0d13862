//! Error types for exposure_tree
//!
//! This module provides structured error handling using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for tree operations
pub type Result<T> = std::result::Result<T, TreeError>;

/// Errors raised while building or presenting an exposure tree
#[derive(Error, Debug)]
pub enum TreeError {
    /// No records were supplied to the builder
    #[error("no exposure records to group")]
    EmptyInput,

    /// The metadata collaborator failed for one file
    #[error("failed to read metadata from {}", path.display())]
    RecordExtraction {
        path: PathBuf,
        #[source]
        source: ExtractionError,
    },

    /// The path argument is neither a file nor a directory
    #[error("{} is not a valid directory or file", path.display())]
    InvalidPath { path: PathBuf },

    /// The glob pattern matched nothing
    #[error("no files matching '{pattern}' found in {}", path.display())]
    NoMatch { pattern: String, path: PathBuf },

    /// The glob pattern could not be compiled
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Terminal setup or teardown failed
    #[error("terminal error: {message}")]
    Terminal { message: String },

    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<TreeError>,
    },
}

impl TreeError {
    /// Wrap an error with additional context
    pub fn with_context(self, context: impl Into<String>) -> Self {
        TreeError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        TreeError::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a terminal error
    pub fn terminal(message: impl Into<String>) -> Self {
        TreeError::Terminal {
            message: message.into(),
        }
    }
}

/// Errors raised by a metadata extractor for a single file
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file does not start with a FITS primary header
    #[error("not a FITS file: {reason}")]
    NotFits { reason: String },

    /// A required header keyword is absent
    #[error("missing header keyword {keyword}")]
    MissingKeyword { keyword: String },

    /// A header keyword holds a value of the wrong kind
    #[error("invalid value for {keyword}: {value}")]
    InvalidValue { keyword: String, value: String },
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(ctx))
    }
}
