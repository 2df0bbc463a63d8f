//! Error types for package inspection.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for inspection operations.
pub type InspectResult<T> = Result<T, InspectError>;

/// Errors that can occur while reading a package file.
#[derive(Debug, Error)]
pub enum InspectError {
    /// The package file could not be opened.
    #[error("failed to open {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    /// The package is not a readable zip archive.
    #[error("invalid package archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A required entry is absent from the archive.
    #[error("entry not found in package: {0}")]
    MissingEntry(String),

    /// An archive entry could not be read.
    #[error("failed to read entry {name}: {source}")]
    ReadEntry { name: String, source: io::Error },

    /// A binary resource chunk is truncated or inconsistent.
    #[error("malformed {what}: {reason}")]
    Malformed { what: &'static str, reason: String },

    /// A resource reference could not be resolved.
    #[error("unresolved resource reference 0x{0:08x}")]
    UnresolvedReference(u32),
}
