//! Error types for aspect analysis
//!
//! Fatal conditions abort the task for one file. A requested aspect that is
//! not registered is not an error: it yields [`crate::AspectValue::NotFound`].

use crate::context::ContextKey;
use std::path::PathBuf;
use thiserror::Error;

/// Analysis error type
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Input file does not exist
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Malformed or unsupported audio
    #[error("Audio decoding error: {0}")]
    Decode(String),

    /// External probe exited non-zero or produced unparsable output
    #[error("Probe failed: {0}")]
    Probe(String),

    /// A registered aspect asked for a context value it cannot be given
    #[error("Aspect '{aspect}' requires context value {key:?}, which is not available")]
    ContractViolation { aspect: String, key: ContextKey },

    /// Concurrency policy outside the supported mapping
    #[error("Invalid concurrency policy: {0}")]
    InvalidPolicy(String),

    /// Worker task panicked or was cancelled
    #[error("Worker task failed: {0}")]
    Task(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// aspects-common error
    #[error("Common error: {0}")]
    Common(#[from] aspects_common::Error),
}

impl AnalysisError {
    /// True for the missing-input condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, AnalysisError::NotFound(_))
    }
}

/// Result type for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;
