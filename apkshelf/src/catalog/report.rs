//! Per-category build results.

use std::fmt;
use std::path::PathBuf;

use super::CatalogEntry;

/// A metadata field a package must declare to be listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    PackageName,
    AppName,
    VersionName,
    VersionCode,
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequiredField::PackageName => "packageName",
            RequiredField::AppName => "appName",
            RequiredField::VersionName => "versionName",
            RequiredField::VersionCode => "versionCode",
        };
        f.write_str(name)
    }
}

/// Why a package file produced no entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The package does not declare a required field.
    MissingField(RequiredField),

    /// The version code is not an integer.
    InvalidVersionCode(String),

    /// The package name cannot be used as a file name.
    InvalidPackageName(String),

    /// The file could not be read or decoded.
    Failed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingField(field) => write!(f, "missing {}", field),
            SkipReason::InvalidVersionCode(code) => {
                write!(f, "version code {:?} is not an integer", code)
            }
            SkipReason::InvalidPackageName(name) => {
                write!(f, "package name {:?} is not a valid file name", name)
            }
            SkipReason::Failed(msg) => f.write_str(msg),
        }
    }
}

/// What happened to a listed package's icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconOutcome {
    /// Icon written to the given path.
    Written(PathBuf),

    /// The package declares no usable icon.
    NotFound,

    /// The icon could not be extracted or written.
    Failed(String),
}

impl IconOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, IconOutcome::Written(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Added {
        package_name: String,
        icon: IconOutcome,
    },
    Skipped(SkipReason),
}

/// Outcome for one package file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub file_name: String,
    pub outcome: FileOutcome,
}

/// Result of building one category.
#[derive(Debug, Clone, Default)]
pub struct CategoryReport {
    /// Category name.
    pub category: String,

    /// Path of the written manifest, or `None` if the category directory was
    /// missing and nothing was written.
    pub manifest_path: Option<PathBuf>,

    /// Entries in manifest order.
    pub entries: Vec<CatalogEntry>,

    /// One report per package file, in scan order.
    pub files: Vec<FileReport>,
}

impl CategoryReport {
    /// A report for a category whose directory does not exist.
    pub fn missing(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            ..Default::default()
        }
    }

    pub fn is_written(&self) -> bool {
        self.manifest_path.is_some()
    }

    pub fn added_count(&self) -> usize {
        self.entries.len()
    }

    /// Files that produced no entry, with their reasons.
    pub fn skipped(&self) -> impl Iterator<Item = (&str, &SkipReason)> {
        self.files.iter().filter_map(|f| match &f.outcome {
            FileOutcome::Skipped(reason) => Some((f.file_name.as_str(), reason)),
            FileOutcome::Added { .. } => None,
        })
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped().count()
    }

    /// Listed packages whose icon was not written.
    pub fn missing_icons(&self) -> impl Iterator<Item = (&str, &IconOutcome)> {
        self.files.iter().filter_map(|f| match &f.outcome {
            FileOutcome::Added { package_name, icon } if !icon.is_written() => {
                Some((package_name.as_str(), icon))
            }
            _ => None,
        })
    }

    /// Combined size of all listed packages.
    pub fn total_bytes(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }
}

/// Format a size in bytes as a human-readable string.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
