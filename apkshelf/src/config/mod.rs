//! Catalog build configuration.
//!
//! [`CatalogConfig`] holds everything a build needs: where the category
//! directories live, where manifests go, and the remote host the URLs point
//! at. It can be built in code with `with_*` setters or loaded from an INI
//! file (see [`file`]).

pub mod file;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::icons::{is_safe_file_stem, ICONS_DIR};
use crate::catalog::urls::validate_url;
use crate::catalog::ManifestNaming;

pub use file::{default_config_path, CONFIG_FILENAME};

/// Raw file host used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str =
    "https://raw.githubusercontent.com/ASDFG0537701349/770kosher-app-apks/main";

/// Default manifest output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "manifests";

/// Categories built when nothing else is configured.
pub const DEFAULT_CATEGORIES: &[&str] = &["apps", "games"];

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors loading, saving or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write config {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid value for [{section}] {key}: {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("no categories configured")]
    NoCategories,

    #[error("invalid category '{name}': {message}")]
    InvalidCategory { name: String, message: String },
}

/// A named package directory with its own manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Manifest name, e.g. `apps`.
    pub name: String,

    /// Directory holding the package files, relative to the root directory.
    /// Also the URL path of the package files.
    pub directory: String,
}

impl Category {
    /// A category whose directory has the same name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            directory: name.clone(),
            name,
        }
    }

    pub fn with_directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = directory.into();
        self
    }
}

/// Configuration for a catalog build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Directory the category directories and `icons/` are resolved against.
    pub root_dir: PathBuf,

    /// Categories to build, in order.
    pub categories: Vec<Category>,

    /// Prefix of every generated URL.
    pub remote_base_url: String,

    /// Directory manifests are written to. Relative paths are resolved
    /// against `root_dir`.
    pub output_dir: PathBuf,

    /// Manifest file naming scheme.
    pub naming: ManifestNaming,

    /// Whether to require and emit `versionName` / `versionCode`.
    pub collect_versions: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            categories: DEFAULT_CATEGORIES.iter().map(|c| Category::new(*c)).collect(),
            remote_base_url: DEFAULT_BASE_URL.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            naming: ManifestNaming::Suffixed,
            collect_versions: true,
        }
    }
}

impl CatalogConfig {
    /// Create a default configuration rooted at `root_dir`.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_root_dir(mut self, root_dir: impl Into<PathBuf>) -> Self {
        self.root_dir = root_dir.into();
        self
    }

    /// Replace the configured categories.
    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = categories;
        self
    }

    /// Add a category, replacing one with the same name.
    pub fn with_category(mut self, category: Category) -> Self {
        match self.categories.iter_mut().find(|c| c.name == category.name) {
            Some(existing) => *existing = category,
            None => self.categories.push(category),
        }
        self
    }

    pub fn with_remote_base_url(mut self, url: impl Into<String>) -> Self {
        self.remote_base_url = url.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_naming(mut self, naming: ManifestNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_collect_versions(mut self, collect: bool) -> Self {
        self.collect_versions = collect;
        self
    }

    /// Check the configuration before a build.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.categories.is_empty() {
            return Err(ConfigError::NoCategories);
        }

        for category in &self.categories {
            if !is_safe_file_stem(&category.name) {
                return Err(ConfigError::InvalidCategory {
                    name: category.name.clone(),
                    message: "name must be usable as a file name".to_string(),
                });
            }
            if category.directory.trim().is_empty() {
                return Err(ConfigError::InvalidCategory {
                    name: category.name.clone(),
                    message: "directory cannot be empty".to_string(),
                });
            }
            if self.categories.iter().filter(|c| c.name == category.name).count() > 1 {
                return Err(ConfigError::InvalidCategory {
                    name: category.name.clone(),
                    message: "listed more than once".to_string(),
                });
            }
        }

        validate_url(self.base_url())
    }

    /// The remote base URL with one trailing `/` removed.
    pub fn base_url(&self) -> &str {
        self.remote_base_url
            .strip_suffix('/')
            .unwrap_or(&self.remote_base_url)
    }

    pub fn category_dir(&self, category: &Category) -> PathBuf {
        self.root_dir.join(&category.directory)
    }

    /// Output directory resolved against the root directory.
    pub fn manifest_dir(&self) -> PathBuf {
        self.root_dir.join(&self.output_dir)
    }

    pub fn manifest_path(&self, category: &Category) -> PathBuf {
        self.manifest_dir().join(self.naming.file_name(&category.name))
    }

    pub fn icons_dir(&self) -> PathBuf {
        self.root_dir.join(ICONS_DIR)
    }
}
