//! Manifest file naming and serialization.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use super::{CatalogEntry, CatalogError, CatalogResult};

/// How manifest files are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManifestNaming {
    /// `<category>_manifest.json`
    #[default]
    Suffixed,
    /// `<category>.json`
    Bare,
}

impl ManifestNaming {
    pub fn file_name(&self, category: &str) -> String {
        match self {
            ManifestNaming::Suffixed => format!("{}_manifest.json", category),
            ManifestNaming::Bare => format!("{}.json", category),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ManifestNaming::Suffixed => "suffixed",
            ManifestNaming::Bare => "bare",
        }
    }
}

impl fmt::Display for ManifestNaming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ManifestNaming {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "suffixed" => Ok(ManifestNaming::Suffixed),
            "bare" => Ok(ManifestNaming::Bare),
            other => Err(format!(
                "unknown manifest naming '{}' (expected 'suffixed' or 'bare')",
                other
            )),
        }
    }
}

/// Write entries as a pretty-printed JSON array.
///
/// The file is replaced in place, not atomically.
pub fn write_manifest(path: &Path, entries: &[CatalogEntry]) -> CatalogResult<()> {
    let json = serde_json::to_vec_pretty(entries).map_err(|source| CatalogError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| CatalogError::WriteFailed {
        path: path.to_path_buf(),
        source,
    })
}
