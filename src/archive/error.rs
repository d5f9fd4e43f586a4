//! Distribution archive error types

use thiserror::Error;

/// Errors raised while opening or reading the distribution archive
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The zip container could not be read
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A required entry is absent from the archive
    #[error("Missing archive entry: {0}")]
    MissingEntry(String),

    /// An entry exists but its content does not follow the archive layout
    #[error("Malformed archive entry {entry}: {reason}")]
    Malformed { entry: String, reason: String },
}

/// Result type alias for archive operations
pub type ArchiveResult<T> = Result<T, ArchiveError>;
