//! Package inspection traits and the zip-backed APK implementation.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::{debug, warn};
use zip::result::ZipError;
use zip::ZipArchive;

use super::arsc::ResourceTable;
use super::axml::{
    AttrValue, XmlDocument, XmlElement, ATTR_ICON, ATTR_LABEL, ATTR_VERSION_CODE,
    ATTR_VERSION_NAME,
};
use super::{InspectError, InspectResult};

/// Name of the compiled manifest inside an APK.
pub const MANIFEST_ENTRY: &str = "AndroidManifest.xml";

/// Name of the compiled resource table inside an APK.
pub const RESOURCES_ENTRY: &str = "resources.arsc";

/// Largest decompressed entry read from a package.
const MAX_ENTRY_BYTES: u64 = 128 * 1024 * 1024;

/// Upper bound on the buffer reserved from an entry's declared size.
const INITIAL_ENTRY_CAPACITY: u64 = 1024 * 1024;

/// Resource types searched for `ic_launcher` when no icon is declared.
const LAUNCHER_ICON_TYPES: [&str; 2] = ["mipmap", "drawable"];
const LAUNCHER_ICON_KEY: &str = "ic_launcher";

/// Opens package files and exposes their metadata.
///
/// The catalog builder only talks to packages through this trait, which keeps
/// it independent of the binary format and lets tests substitute fakes.
pub trait PackageInspector {
    /// Open and decode the package at `path`.
    fn open(&self, path: &Path) -> InspectResult<Box<dyn InspectedPackage>>;
}

/// Metadata of one opened package.
///
/// Field accessors return `None` when the package does not declare the value.
pub trait InspectedPackage {
    /// Unique package identifier, e.g. `com.example.app`.
    fn package_name(&self) -> Option<&str>;

    /// Human-readable application name.
    fn app_name(&self) -> Option<&str>;

    /// Display version string.
    fn version_name(&self) -> Option<&str>;

    /// Version ordinal, as declared (decimal text).
    fn version_code(&self) -> Option<&str>;

    /// Path of the launcher icon inside the package, if one is declared.
    fn icon_path(&self) -> InspectResult<Option<String>>;

    /// Read a file stored inside the package.
    fn read_file(&mut self, name: &str) -> InspectResult<Vec<u8>>;
}

/// [`PackageInspector`] for Android `.apk` files.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApkInspector;

impl ApkInspector {
    pub fn new() -> Self {
        Self
    }
}

impl PackageInspector for ApkInspector {
    fn open(&self, path: &Path) -> InspectResult<Box<dyn InspectedPackage>> {
        Ok(Box::new(ApkPackage::open(path)?))
    }
}

/// An opened APK with its manifest already decoded.
pub struct ApkPackage {
    archive: ZipArchive<BufReader<File>>,
    table: Option<ResourceTable>,
    package_name: Option<String>,
    app_name: Option<String>,
    version_name: Option<String>,
    version_code: Option<String>,
    icon: Option<AttrValue>,
}

impl ApkPackage {
    /// Open an APK and decode its manifest and resource table.
    pub fn open(path: &Path) -> InspectResult<Self> {
        let file = File::open(path).map_err(|source| InspectError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;

        let manifest = XmlDocument::parse(&read_entry(&mut archive, MANIFEST_ENTRY)?)?;
        let table = load_table(&mut archive, path)?;

        let root = manifest
            .root()
            .filter(|e| e.name == "manifest")
            .ok_or_else(|| InspectError::Malformed {
                what: "manifest",
                reason: "missing <manifest> root element".to_string(),
            })?;
        let application = manifest.find("application", 1);
        let main_activity = manifest.main_activity();

        let package_name = match root.attr("package", None) {
            Some(AttrValue::String(s)) => Some(s.clone()),
            _ => None,
        };
        let version_code = root
            .attr("versionCode", Some(ATTR_VERSION_CODE))
            .and_then(|v| text_value(v, table.as_ref()));
        let version_name = root
            .attr("versionName", Some(ATTR_VERSION_NAME))
            .and_then(|v| text_value(v, table.as_ref()));
        // The application label wins; the launcher activity's icon wins.
        let label_of = |element: Option<&XmlElement>| {
            element_attr(element, "label", ATTR_LABEL).and_then(|v| text_value(v, table.as_ref()))
        };
        let app_name = label_of(application).or_else(|| label_of(main_activity));
        let icon = element_attr(main_activity, "icon", ATTR_ICON)
            .or_else(|| element_attr(application, "icon", ATTR_ICON))
            .cloned()
            .or_else(|| table.as_ref().and_then(launcher_icon));

        debug!(
            path = %path.display(),
            package = package_name.as_deref().unwrap_or("?"),
            "Decoded manifest"
        );

        Ok(Self {
            archive,
            table,
            package_name,
            app_name,
            version_name,
            version_code,
            icon,
        })
    }
}

impl InspectedPackage for ApkPackage {
    fn package_name(&self) -> Option<&str> {
        self.package_name.as_deref()
    }

    fn app_name(&self) -> Option<&str> {
        self.app_name.as_deref()
    }

    fn version_name(&self) -> Option<&str> {
        self.version_name.as_deref()
    }

    fn version_code(&self) -> Option<&str> {
        self.version_code.as_deref()
    }

    fn icon_path(&self) -> InspectResult<Option<String>> {
        match &self.icon {
            None => Ok(None),
            Some(AttrValue::String(path)) => Ok(Some(path.clone())),
            Some(AttrValue::Reference(id)) => match &self.table {
                Some(table) => table.resolve_file(*id),
                None => Err(InspectError::UnresolvedReference(*id)),
            },
            Some(_) => Ok(None),
        }
    }

    fn read_file(&mut self, name: &str) -> InspectResult<Vec<u8>> {
        read_entry(&mut self.archive, name)
    }
}

/// Render an attribute as text, resolving string references.
fn text_value(value: &AttrValue, table: Option<&ResourceTable>) -> Option<String> {
    match value {
        AttrValue::String(s) => Some(s.clone()),
        AttrValue::Int(n) => Some(n.to_string()),
        AttrValue::Reference(id) => {
            let table = table?;
            match table.resolve_string(*id) {
                Ok(s) => Some(s),
                Err(e) => {
                    debug!(error = %e, "Could not resolve manifest reference");
                    None
                }
            }
        }
        AttrValue::Bool(_) | AttrValue::Other { .. } => None,
    }
}

fn element_attr<'a>(
    element: Option<&'a XmlElement>,
    name: &str,
    resource_id: u32,
) -> Option<&'a AttrValue> {
    element.and_then(|e| e.attr(name, Some(resource_id)))
}

/// Conventional launcher icon resource, for manifests that declare none.
fn launcher_icon(table: &ResourceTable) -> Option<AttrValue> {
    LAUNCHER_ICON_TYPES
        .iter()
        .find_map(|kind| table.find(kind, LAUNCHER_ICON_KEY))
        .map(AttrValue::Reference)
}

fn read_entry<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> InspectResult<Vec<u8>> {
    let entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Err(InspectError::MissingEntry(name.to_string())),
        Err(e) => return Err(e.into()),
    };

    // The declared size comes from the archive and may be arbitrary.
    let capacity = entry.size().min(INITIAL_ENTRY_CAPACITY) as usize;
    read_limited(entry, name, capacity, MAX_ENTRY_BYTES)
}

/// Read at most `limit` bytes, failing if the source holds more.
fn read_limited<R: Read>(
    reader: R,
    name: &str,
    capacity: usize,
    limit: u64,
) -> InspectResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(capacity);
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut buf)
        .map_err(|source| InspectError::ReadEntry {
            name: name.to_string(),
            source,
        })?;

    if buf.len() as u64 > limit {
        return Err(InspectError::Malformed {
            what: "archive entry",
            reason: format!("{} is larger than {} bytes", name, limit),
        });
    }
    Ok(buf)
}

/// Load `resources.arsc`. A missing or undecodable table is not fatal: the
/// manifest may still carry literal values.
fn load_table<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    path: &Path,
) -> InspectResult<Option<ResourceTable>> {
    let data = match read_entry(archive, RESOURCES_ENTRY) {
        Ok(data) => data,
        Err(InspectError::MissingEntry(_)) => return Ok(None),
        Err(e) => return Err(e),
    };

    match ResourceTable::parse(&data) {
        Ok(table) => {
            debug!(resources = table.len(), "Loaded resource table");
            Ok(Some(table))
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable resource table");
            Ok(None)
        }
    }
}
