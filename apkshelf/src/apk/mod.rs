//! Android package inspection.
//!
//! Reads the metadata a catalog needs from an `.apk` file: package name,
//! application label, version and the launcher icon. The APK is a zip
//! archive; the manifest and resource table inside it are decoded from
//! Android's binary resource format.
//!
//! # Example
//!
//! ```ignore
//! use apkshelf::apk::{ApkInspector, PackageInspector};
//!
//! let package = ApkInspector::new().open("app.apk".as_ref())?;
//! println!("{:?}", package.package_name());
//! ```

mod arsc;
mod axml;
mod chunk;
mod error;
mod inspector;
mod strings;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{InspectError, InspectResult};
pub use inspector::{
    ApkInspector, ApkPackage, InspectedPackage, PackageInspector, MANIFEST_ENTRY, RESOURCES_ENTRY,
};
