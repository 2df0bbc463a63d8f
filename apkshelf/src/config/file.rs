//! INI file form of [`CatalogConfig`].
//!
//! ```ini
//! [remote]
//! base_url = https://raw.githubusercontent.com/user/repo/main
//!
//! [output]
//! directory = manifests
//! naming = suffixed
//! collect_versions = true
//!
//! [categories]
//! apps = apps
//! games = games
//! ```
//!
//! Instead of `base_url`, `[remote]` may name a GitHub repository with
//! `github_user`, `github_repository` and an optional `branch` (default
//! `main`).

use std::fs;
use std::path::{Path, PathBuf};

use ini::{Ini, Properties};
use tracing::debug;

use super::{CatalogConfig, Category, ConfigError, ConfigResult};
use crate::catalog::urls::github_raw_base_url;

/// Config file name looked up in the working directory.
pub const CONFIG_FILENAME: &str = "apkshelf.ini";

const SECTION_REMOTE: &str = "remote";
const SECTION_OUTPUT: &str = "output";
const SECTION_CATEGORIES: &str = "categories";

const DEFAULT_BRANCH: &str = "main";

pub fn default_config_path() -> PathBuf {
    PathBuf::from(CONFIG_FILENAME)
}

impl CatalogConfig {
    /// Load configuration from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        parse(&text, path)
    }

    /// Parse configuration from INI text. Unset values keep their defaults.
    pub fn from_ini_str(text: &str) -> ConfigResult<Self> {
        parse(text, Path::new("<string>"))
    }

    /// Write the configuration to `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, self.to_ini_string()).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Render the configuration as INI text.
    pub fn to_ini_string(&self) -> String {
        let mut ini = Ini::new();
        ini.with_section(Some(SECTION_REMOTE))
            .set("base_url", self.remote_base_url.as_str());
        ini.with_section(Some(SECTION_OUTPUT))
            .set("directory", self.output_dir.to_string_lossy())
            .set("naming", self.naming.as_str())
            .set("collect_versions", self.collect_versions.to_string());
        for category in &self.categories {
            ini.with_section(Some(SECTION_CATEGORIES))
                .set(category.name.as_str(), category.directory.as_str());
        }

        let mut out = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = ini.write_to(&mut out);
        String::from_utf8_lossy(&out).into_owned()
    }
}

fn parse(text: &str, path: &Path) -> ConfigResult<CatalogConfig> {
    let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut config = CatalogConfig::default();

    if let Some(remote) = ini.section(Some(SECTION_REMOTE)) {
        if let Some(url) = remote_base_url(remote)? {
            config.remote_base_url = url;
        }
    }

    if let Some(output) = ini.section(Some(SECTION_OUTPUT)) {
        if let Some(dir) = non_empty(output, "directory") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(naming) = non_empty(output, "naming") {
            config.naming = naming
                .parse()
                .map_err(|message| invalid(SECTION_OUTPUT, "naming", message))?;
        }
        if let Some(flag) = non_empty(output, "collect_versions") {
            config.collect_versions = parse_bool(flag).ok_or_else(|| {
                invalid(
                    SECTION_OUTPUT,
                    "collect_versions",
                    format!("'{}' is not a boolean", flag),
                )
            })?;
        }
    }

    if let Some(section) = ini.section(Some(SECTION_CATEGORIES)) {
        let categories: Vec<Category> = section
            .iter()
            .map(|(name, dir)| {
                let dir = dir.trim();
                let category = Category::new(name.trim());
                if dir.is_empty() {
                    category
                } else {
                    category.with_directory(dir)
                }
            })
            .collect();
        if !categories.is_empty() {
            config.categories = categories;
        }
    }

    Ok(config)
}

fn remote_base_url(remote: &Properties) -> ConfigResult<Option<String>> {
    if let Some(url) = non_empty(remote, "base_url") {
        return Ok(Some(url.to_string()));
    }

    match (
        non_empty(remote, "github_user"),
        non_empty(remote, "github_repository"),
    ) {
        (Some(user), Some(repository)) => {
            let branch = non_empty(remote, "branch").unwrap_or(DEFAULT_BRANCH);
            Ok(Some(github_raw_base_url(user, repository, branch)))
        }
        (None, None) => Ok(None),
        (Some(_), None) => Err(invalid(
            SECTION_REMOTE,
            "github_repository",
            "required when github_user is set",
        )),
        (None, Some(_)) => Err(invalid(
            SECTION_REMOTE,
            "github_user",
            "required when github_repository is set",
        )),
    }
}

fn non_empty<'a>(props: &'a Properties, key: &str) -> Option<&'a str> {
    props.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn invalid(section: &str, key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        message: message.into(),
    }
}
