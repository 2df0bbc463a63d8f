//! The JSON record written for each package.

use serde::{Deserialize, Serialize};

/// One package in a category manifest.
///
/// Field order is the key order of the serialized object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Human-readable display name.
    pub app_name: String,

    /// Package identifier. Also the icon file stem.
    pub package_name: String,

    /// Size of the package file in bytes.
    pub size: u64,

    /// Download URL of the extracted icon.
    pub icon_url: String,

    /// Download URL of the package file.
    pub apk_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_code: Option<i64>,
}
