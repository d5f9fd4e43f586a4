//! Output error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while writing or reading back generator output
#[derive(Error, Debug)]
pub enum OutputError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest could not be serialized or parsed
    #[error("Manifest XML error: {0}")]
    Xml(String),

    /// A record line does not follow the stream format
    #[error("Malformed record in {path:?} at line {line}: {reason}")]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// A write arrived before any output file was opened
    #[error("No output file is open")]
    NotOpen,
}

/// Result type alias for output operations
pub type OutputResult<T> = Result<T, OutputError>;
