//! Builds category manifests from directories of package files.

use std::fs;
use std::path::Path;

use image::ImageFormat;
use tracing::{debug, error, info, warn};

use super::icons::{is_safe_file_stem, sniff_format, IconStore};
use super::report::{FileOutcome, FileReport, IconOutcome, RequiredField, SkipReason};
use super::urls::{icon_url, package_url};
use super::{CatalogEntry, CatalogError, CatalogResult, CategoryReport};
use crate::apk::{InspectedPackage, PackageInspector};
use crate::config::{CatalogConfig, Category};

/// File extension of package files, matched case-insensitively.
pub const PACKAGE_EXTENSION: &str = "apk";

/// Whether `file_name` looks like a package file.
pub fn is_package_file(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(PACKAGE_EXTENSION))
}

/// Scans category directories and writes one manifest per category.
///
/// Each package file is opened through the [`PackageInspector`]. Files that
/// yield no entry are logged and recorded in the returned [`CategoryReport`].
/// Only directory and manifest write failures abort a build.
pub struct ManifestBuilder<'a> {
    config: &'a CatalogConfig,
    inspector: &'a dyn PackageInspector,
    icons: IconStore,
}

impl<'a> ManifestBuilder<'a> {
    pub fn new(config: &'a CatalogConfig, inspector: &'a dyn PackageInspector) -> Self {
        Self {
            icons: IconStore::new(&config.root_dir),
            config,
            inspector,
        }
    }

    /// Build every configured category, in order.
    pub fn build_all(&self) -> CatalogResult<Vec<CategoryReport>> {
        self.config
            .categories
            .iter()
            .map(|category| self.build_category(category))
            .collect()
    }

    /// Build one category and write its manifest.
    ///
    /// A missing category directory is not an error: nothing is written and
    /// the report has no manifest path.
    pub fn build_category(&self, category: &Category) -> CatalogResult<CategoryReport> {
        let dir = self.config.category_dir(category);
        if !dir.is_dir() {
            warn!(
                category = %category.name,
                path = %dir.display(),
                "Category directory not found, skipping"
            );
            return Ok(CategoryReport::missing(&category.name));
        }

        self.icons.ensure()?;
        info!(category = %category.name, path = %dir.display(), "Processing category");

        let mut report = CategoryReport::missing(&category.name);
        for file_name in list_package_files(&dir)? {
            let path = dir.join(&file_name);
            let outcome = match self.process_file(&category.directory, &path, &file_name) {
                Ok((entry, icon)) => {
                    info!(
                        category = %category.name,
                        file = %file_name,
                        package = %entry.package_name,
                        "Added package"
                    );
                    let outcome = FileOutcome::Added {
                        package_name: entry.package_name.clone(),
                        icon,
                    };
                    report.entries.push(entry);
                    outcome
                }
                Err(reason) => {
                    match &reason {
                        SkipReason::Failed(msg) => error!(
                            category = %category.name,
                            file = %file_name,
                            error = %msg,
                            "Failed to process package"
                        ),
                        other => warn!(
                            category = %category.name,
                            file = %file_name,
                            reason = %other,
                            "Skipping package"
                        ),
                    }
                    FileOutcome::Skipped(reason)
                }
            };
            report.files.push(FileReport { file_name, outcome });
        }

        let out_dir = self.config.manifest_dir();
        fs::create_dir_all(&out_dir).map_err(|source| CatalogError::CreateDirectoryFailed {
            path: out_dir.clone(),
            source,
        })?;

        let manifest_path = self.config.manifest_path(category);
        super::write_manifest(&manifest_path, &report.entries)?;
        info!(
            category = %category.name,
            entries = report.entries.len(),
            path = %manifest_path.display(),
            "Wrote manifest"
        );

        report.manifest_path = Some(manifest_path);
        Ok(report)
    }

    /// Turn one package file into an entry, or explain why it has none.
    fn process_file(
        &self,
        category_path: &str,
        path: &Path,
        file_name: &str,
    ) -> Result<(CatalogEntry, IconOutcome), SkipReason> {
        let mut package = self
            .inspector
            .open(path)
            .map_err(|e| SkipReason::Failed(e.to_string()))?;

        let package_name = required(package.package_name(), RequiredField::PackageName)?;
        let app_name = required(package.app_name(), RequiredField::AppName)?;

        let (version_name, version_code) = if self.config.collect_versions {
            let name = required(package.version_name(), RequiredField::VersionName)?;
            let code = required(package.version_code(), RequiredField::VersionCode)?;
            let code = code
                .trim()
                .parse::<i64>()
                .map_err(|_| SkipReason::InvalidVersionCode(code.clone()))?;
            (Some(name), Some(code))
        } else {
            (None, None)
        };

        if !is_safe_file_stem(&package_name) {
            return Err(SkipReason::InvalidPackageName(package_name));
        }

        let size = fs::metadata(path)
            .map_err(|e| SkipReason::Failed(format!("failed to stat {}: {}", file_name, e)))?
            .len();

        let icon = self.extract_icon(package.as_mut(), &package_name);

        let base = self.config.base_url();
        let entry = CatalogEntry {
            icon_url: icon_url(base, &package_name),
            apk_url: package_url(base, category_path, file_name),
            app_name,
            package_name,
            size,
            version_name,
            version_code,
        };
        Ok((entry, icon))
    }

    /// Copy the launcher icon into the icon directory.
    ///
    /// Icon problems never drop the entry.
    fn extract_icon(&self, package: &mut dyn InspectedPackage, package_name: &str) -> IconOutcome {
        let icon_path = match package.icon_path() {
            Ok(Some(path)) => path,
            Ok(None) => {
                warn!(package = %package_name, "Package declares no icon");
                return IconOutcome::NotFound;
            }
            Err(e) => {
                warn!(package = %package_name, error = %e, "Could not resolve icon");
                return IconOutcome::Failed(e.to_string());
            }
        };

        let bytes = match package.read_file(&icon_path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(
                    package = %package_name,
                    icon = %icon_path,
                    error = %e,
                    "Could not read icon"
                );
                return IconOutcome::Failed(e.to_string());
            }
        };

        match sniff_format(&bytes) {
            Some(ImageFormat::Png) => {}
            Some(format) => warn!(
                package = %package_name,
                icon = %icon_path,
                format = ?format,
                "Icon is not a PNG, writing it unchanged"
            ),
            None => warn!(
                package = %package_name,
                icon = %icon_path,
                "Icon format not recognized, writing it unchanged"
            ),
        }

        match self.icons.write(package_name, &bytes) {
            Ok(path) => {
                debug!(package = %package_name, path = %path.display(), "Wrote icon");
                IconOutcome::Written(path)
            }
            Err(e) => {
                warn!(package = %package_name, error = %e, "Could not write icon");
                IconOutcome::Failed(e.to_string())
            }
        }
    }
}

/// Package file names in `dir`, sorted by byte order.
fn list_package_files(dir: &Path) -> CatalogResult<Vec<String>> {
    let read_dir = fs::read_dir(dir).map_err(|source| CatalogError::ReadDirFailed {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut names = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|source| CatalogError::ReadDirFailed {
            path: dir.to_path_buf(),
            source,
        })?;
        match entry.file_name().into_string() {
            Ok(name) if is_package_file(&name) => names.push(name),
            Ok(_) => {}
            Err(name) => {
                warn!(path = %dir.join(&name).display(), "Skipping file with non-UTF-8 name");
            }
        }
    }
    names.sort();
    Ok(names)
}

/// A required field, kept as declared. Whitespace alone counts as missing.
fn required(value: Option<&str>, field: RequiredField) -> Result<String, SkipReason> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
        .ok_or(SkipReason::MissingField(field))
}
