//! apkshelf - JSON app catalogs from directories of Android packages
//!
//! This library scans category directories of `.apk` files, reads each
//! package's name, label, version and launcher icon, and writes one JSON
//! manifest per category with download URLs for a static file host.
//!
//! # Modules
//!
//! - [`apk`]: package inspection (zip container, binary manifest, resources)
//! - [`catalog`]: manifest builder, entries, URLs and icon store
//! - [`config`]: build configuration and its INI file form
//! - [`logging`]: tracing subscriber setup
//!
//! # Example
//!
//! ```no_run
//! use apkshelf::apk::ApkInspector;
//! use apkshelf::catalog::ManifestBuilder;
//! use apkshelf::config::CatalogConfig;
//!
//! let config = CatalogConfig::new("/srv/store");
//! config.validate()?;
//! let inspector = ApkInspector::new();
//! for report in ManifestBuilder::new(&config, &inspector).build_all()? {
//!     println!("{}: {} packages", report.category, report.added_count());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod apk;
pub mod catalog;
pub mod config;
pub mod logging;

pub use apk::{ApkInspector, InspectedPackage, PackageInspector};
pub use catalog::{CatalogEntry, CategoryReport, ManifestBuilder};
pub use config::CatalogConfig;
