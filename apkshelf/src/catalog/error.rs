//! Error types for the catalog module.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors that abort a catalog build.
///
/// Problems with individual package files are never reported here. They are
/// recorded in the [`CategoryReport`](super::CategoryReport) instead.
#[derive(Debug)]
pub enum CatalogError {
    /// Failed to create the output or icon directory.
    CreateDirectoryFailed { path: PathBuf, source: io::Error },

    /// Failed to list a category directory.
    ReadDirFailed { path: PathBuf, source: io::Error },

    /// Failed to write a manifest file.
    WriteFailed { path: PathBuf, source: io::Error },

    /// Failed to serialize manifest entries.
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::CreateDirectoryFailed { path, source } => {
                write!(
                    f,
                    "failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            CatalogError::ReadDirFailed { path, source } => {
                write!(f, "failed to list {}: {}", path.display(), source)
            }
            CatalogError::WriteFailed { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            CatalogError::Serialize { path, source } => {
                write!(
                    f,
                    "failed to serialize manifest {}: {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::CreateDirectoryFailed { source, .. } => Some(source),
            CatalogError::ReadDirFailed { source, .. } => Some(source),
            CatalogError::WriteFailed { source, .. } => Some(source),
            CatalogError::Serialize { source, .. } => Some(source),
        }
    }
}
