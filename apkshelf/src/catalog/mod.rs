//! Category manifest generation.
//!
//! For every configured category the [`ManifestBuilder`] lists the package
//! files in its directory, reads their metadata through a
//! [`PackageInspector`](crate::apk::PackageInspector), copies launcher icons
//! into `icons/` and writes a JSON array of [`CatalogEntry`] values:
//!
//! ```text
//! <root>/apps/*.apk  ──►  icons/<package>.png
//!                    └─►  manifests/apps_manifest.json
//! ```
//!
//! Entries are ordered by file name. Per-file problems skip the file (or
//! just its icon) and are reported in the returned [`CategoryReport`].

mod builder;
mod entry;
mod error;
pub mod icons;
mod manifest;
mod report;
pub mod urls;

pub use builder::{is_package_file, ManifestBuilder, PACKAGE_EXTENSION};
pub use entry::CatalogEntry;
pub use error::{CatalogError, CatalogResult};
pub use manifest::{write_manifest, ManifestNaming};
pub use report::{
    format_size, CategoryReport, FileOutcome, FileReport, IconOutcome, RequiredField, SkipReason,
};
