//! Common types and utilities shared across CLI commands.

use std::path::{Path, PathBuf};

use apkshelf::catalog::ManifestNaming;
use apkshelf::config::{default_config_path, CatalogConfig, Category};
use clap::ValueEnum;

use crate::error::CliError;

/// Manifest naming selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum NamingArg {
    /// `<category>_manifest.json`
    Suffixed,
    /// `<category>.json`
    Bare,
}

impl From<NamingArg> for ManifestNaming {
    fn from(naming: NamingArg) -> Self {
        match naming {
            NamingArg::Suffixed => ManifestNaming::Suffixed,
            NamingArg::Bare => ManifestNaming::Bare,
        }
    }
}

/// The config file path: `--config` if given, else `./apkshelf.ini`.
pub fn config_path(cli_path: Option<&Path>) -> PathBuf {
    cli_path
        .map(Path::to_path_buf)
        .unwrap_or_else(default_config_path)
}

/// Load the config file. A file named explicitly with `--config` must exist.
pub fn load_config(cli_path: Option<&Path>) -> Result<CatalogConfig, CliError> {
    let path = config_path(cli_path);
    if cli_path.is_some() && !path.exists() {
        return Err(CliError::Config(format!(
            "Config file {} does not exist. Run 'apkshelf init' to create one.",
            path.display()
        )));
    }
    tracing::debug!(path = %path.display(), exists = path.exists(), "Loading configuration");
    Ok(CatalogConfig::load(&path)?)
}

/// Parse a `NAME` or `NAME=DIR` category argument.
pub fn parse_category(value: &str) -> Result<Category, String> {
    let (name, dir) = match value.split_once('=') {
        Some((name, dir)) => (name.trim(), Some(dir.trim())),
        None => (value.trim(), None),
    };
    if name.is_empty() {
        return Err("category name cannot be empty".to_string());
    }
    Ok(match dir {
        Some(dir) if !dir.is_empty() => Category::new(name).with_directory(dir),
        _ => Category::new(name),
    })
}
