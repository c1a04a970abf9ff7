//! Error types for the benchmark drivers

use std::io;
use std::path::PathBuf;

use crate::solver::{Diagnostics, Job};

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, BenchError>;

/// Everything that can stop a benchmark run
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Unsupported Matrix Market {what} '{value}'")]
    UnsupportedHeader { what: &'static str, value: String },

    #[error("Expected {expected} entries but found {found}")]
    EntryCount { expected: usize, found: usize },

    #[error("Line {line}: entry ({row}, {col}) outside a {nrows}x{ncols} matrix")]
    IndexOutOfRange {
        line: usize,
        row: usize,
        col: usize,
        nrows: usize,
        ncols: usize,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The solver reported a negative INFOG(1) after `job`
    #[error("{job} failed: {diagnostics}")]
    Solver { job: Job, diagnostics: Diagnostics },

    #[error("Solver backend error: {0}")]
    Backend(String),
}

impl BenchError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        BenchError::Parse {
            line,
            message: message.into(),
        }
    }

    /// Diagnostics of a failed solver call, if this error came from one
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            BenchError::Solver { diagnostics, .. } => Some(diagnostics),
            _ => None,
        }
    }
}
