//! Download URL construction for catalog entries.
//!
//! Every path segment is percent-encoded on its own, keeping only RFC 3986
//! unreserved characters, so a file name can never introduce a `/`.

use std::borrow::Cow;

use crate::config::{ConfigError, ConfigResult};

/// Host serving raw files from GitHub repositories.
pub const GITHUB_RAW_HOST: &str = "https://raw.githubusercontent.com";

/// Percent-encode a single path segment.
pub fn encode_segment(segment: &str) -> Cow<'_, str> {
    urlencoding::encode(segment)
}

/// Percent-encode a relative `/`-separated path, segment by segment.
///
/// Empty and `.` segments are dropped.
pub fn encode_path(path: &str) -> String {
    path.split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != ".")
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join("/")
}

/// URL of a package file: `{base}/{category path}/{file name}`.
pub fn package_url(base_url: &str, category_path: &str, file_name: &str) -> String {
    let category = encode_path(category_path);
    if category.is_empty() {
        format!("{}/{}", base_url, encode_segment(file_name))
    } else {
        format!("{}/{}/{}", base_url, category, encode_segment(file_name))
    }
}

/// URL of an extracted icon: `{base}/icons/{package}.png`.
pub fn icon_url(base_url: &str, package_name: &str) -> String {
    format!(
        "{}/{}/{}",
        base_url,
        super::icons::ICONS_DIR,
        encode_segment(&super::icons::icon_file_name(package_name))
    )
}

/// Base URL for raw files on a GitHub branch.
pub fn github_raw_base_url(user: &str, repository: &str, branch: &str) -> String {
    format!("{}/{}/{}/{}", GITHUB_RAW_HOST, user, repository, branch)
}

/// Validate a URL format.
pub fn validate_url(url: &str) -> ConfigResult<()> {
    if url.is_empty() {
        return Err(ConfigError::InvalidUrl("URL cannot be empty".to_string()));
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::InvalidUrl(
            "URL must start with http:// or https://".to_string(),
        ));
    }

    if url.contains(char::is_whitespace) {
        return Err(ConfigError::InvalidUrl(
            "URL cannot contain spaces".to_string(),
        ));
    }

    Ok(())
}
