//! Icon directory shared by all categories.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use tracing::info;

use super::{CatalogError, CatalogResult};

/// Name of the icon directory, both on disk and in URLs.
pub const ICONS_DIR: &str = "icons";

/// File name of the icon for `package_name`.
pub fn icon_file_name(package_name: &str) -> String {
    format!("{}.png", package_name)
}

/// Whether `name` can be used as a file stem inside the icon directory.
pub fn is_safe_file_stem(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && !name.contains("..")
        && !name.contains(['/', '\\', '\0'])
}

/// Detect the image format of icon bytes, if recognizable.
pub fn sniff_format(bytes: &[u8]) -> Option<ImageFormat> {
    image::guess_format(bytes).ok()
}

/// Writes icons to `<root>/icons/<package>.png`.
///
/// Icons are never deleted. Writing the same package twice replaces the
/// earlier file.
#[derive(Debug, Clone)]
pub struct IconStore {
    dir: PathBuf,
}

impl IconStore {
    pub fn new(root_dir: &Path) -> Self {
        Self {
            dir: root_dir.join(ICONS_DIR),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the icon directory if needed. Returns `true` if it was created.
    pub fn ensure(&self) -> CatalogResult<bool> {
        if self.dir.is_dir() {
            return Ok(false);
        }
        fs::create_dir_all(&self.dir).map_err(|source| CatalogError::CreateDirectoryFailed {
            path: self.dir.clone(),
            source,
        })?;
        info!(path = %self.dir.display(), "Created icon directory");
        Ok(true)
    }

    pub fn path_for(&self, package_name: &str) -> PathBuf {
        self.dir.join(icon_file_name(package_name))
    }

    /// Write icon bytes for a package, replacing any existing icon.
    pub fn write(&self, package_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.path_for(package_name);
        fs::write(&path, bytes)?;
        Ok(path)
    }
}
