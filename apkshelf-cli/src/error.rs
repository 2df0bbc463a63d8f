//! CLI error type.

use std::fmt;

use apkshelf::apk::InspectError;
use apkshelf::catalog::CatalogError;
use apkshelf::config::ConfigError;

/// Errors reported by CLI commands. Printed to stderr, exit code 1.
#[derive(Debug)]
pub enum CliError {
    /// Invalid or conflicting command-line settings.
    Config(String),

    /// Configuration file could not be loaded, saved or validated.
    ConfigFile(ConfigError),

    /// A catalog build was aborted.
    Catalog(CatalogError),

    /// A package could not be inspected.
    Inspect(InspectError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "{}", msg),
            CliError::ConfigFile(e) => write!(f, "configuration error: {}", e),
            CliError::Catalog(e) => write!(f, "build failed: {}", e),
            CliError::Inspect(e) => write!(f, "inspection failed: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(_) => None,
            CliError::ConfigFile(e) => Some(e),
            CliError::Catalog(e) => Some(e),
            CliError::Inspect(e) => Some(e),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<CatalogError> for CliError {
    fn from(e: CatalogError) -> Self {
        CliError::Catalog(e)
    }
}

impl From<InspectError> for CliError {
    fn from(e: InspectError) -> Self {
        CliError::Inspect(e)
    }
}
