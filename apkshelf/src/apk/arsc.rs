//! Decoder for the compiled resource table (`resources.arsc`).
//!
//! The table maps resource ids (`0xPPTTEEEE`: package, type, entry) to one
//! value per configuration. Only simple values are kept. Bag (complex)
//! entries such as styles are skipped since labels and icons never use them.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::axml::{TYPE_DYNAMIC_REFERENCE, TYPE_REFERENCE, TYPE_STRING};
use super::chunk::{
    ChunkReader, RES_STRING_POOL_TYPE, RES_TABLE_PACKAGE_TYPE, RES_TABLE_TYPE,
    RES_TABLE_TYPE_TYPE,
};
use super::strings::StringPool;
use super::{InspectError, InspectResult};

/// Maximum number of reference hops followed before giving up.
pub(crate) const MAX_REFERENCE_DEPTH: usize = 8;

const NO_ENTRY: u32 = u32::MAX;
const NO_ENTRY16: u16 = u16::MAX;

// ResTable_type flags.
const FLAG_SPARSE: u8 = 0x01;
const FLAG_OFFSET16: u8 = 0x02;

// ResTable_entry flags.
const ENTRY_FLAG_COMPLEX: u16 = 0x0001;
const ENTRY_FLAG_COMPACT: u16 = 0x0008;

/// Density of a configuration without a density qualifier.
const DENSITY_DEFAULT: u16 = 0;
/// `anydpi`
const DENSITY_ANY: u16 = 0xfffe;
/// `nodpi`
const DENSITY_NONE: u16 = 0xffff;
/// Android treats an unqualified density as mdpi.
const DENSITY_MEDIUM: u32 = 160;

/// The configuration qualifiers this crate cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct ResConfig {
    pub language: [u8; 2],
    pub density: u16,
}

impl ResConfig {
    fn is_default_locale(&self) -> bool {
        self.language == [0, 0]
    }

    /// Ordering key used to pick the sharpest raster icon.
    fn density_rank(&self) -> u32 {
        match self.density {
            DENSITY_NONE => 0,
            DENSITY_ANY => 1,
            DENSITY_DEFAULT => DENSITY_MEDIUM,
            dpi => dpi as u32,
        }
    }
}

/// A simple resource value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ResValue {
    pub data_type: u8,
    pub data: u32,
}

/// Type and key names of one package, used to look resources up by name.
#[derive(Debug, Default)]
struct PackageNames {
    types: StringPool,
    keys: StringPool,
}

impl PackageNames {
    /// Read the type and key pools of the package chunk at `offset`.
    ///
    /// Names only serve lookups by name, so unreadable pools leave them empty.
    fn read(reader: &ChunkReader<'_>, offset: usize) -> Self {
        let pool_at = |field: usize| -> Option<StringPool> {
            let start = reader.u32(offset + field).ok()? as usize;
            if start == 0 {
                return None;
            }
            match StringPool::parse(reader, offset + start) {
                Ok(pool) => Some(pool),
                Err(e) => {
                    debug!(error = %e, "Ignoring unreadable package name pool");
                    None
                }
            }
        };
        Self {
            types: pool_at(268).unwrap_or_default(),
            keys: pool_at(276).unwrap_or_default(),
        }
    }
}

/// A decoded resource table.
#[derive(Debug, Default)]
pub(crate) struct ResourceTable {
    strings: StringPool,
    entries: HashMap<u32, Vec<(ResConfig, ResValue)>>,
    names: HashMap<(String, String), u32>,
}

impl ResourceTable {
    pub fn parse(data: &[u8]) -> InspectResult<Self> {
        let reader = ChunkReader::new(data, "resource table");
        let root = reader.header(0)?;
        if root.kind != RES_TABLE_TYPE {
            return Err(reader.malformed(format!(
                "expected table chunk, found 0x{:04x}",
                root.kind
            )));
        }

        let mut table = ResourceTable::default();
        let mut have_strings = false;

        for (offset, header) in reader.chunks(root.body(0), root.end(0))? {
            match header.kind {
                RES_STRING_POOL_TYPE if !have_strings => {
                    table.strings = StringPool::parse(&reader, offset)?;
                    have_strings = true;
                    debug!(strings = table.strings.len(), "Read global string pool");
                }
                RES_TABLE_PACKAGE_TYPE => {
                    let package_id = reader.u32(offset + 8)?;
                    if package_id > 0xff {
                        return Err(reader.malformed(format!("package id {}", package_id)));
                    }
                    let names = PackageNames::read(&reader, offset);
                    for (chunk_offset, chunk) in
                        reader.chunks(header.body(offset), header.end(offset))?
                    {
                        if chunk.kind == RES_TABLE_TYPE_TYPE {
                            table.parse_type(
                                &reader,
                                chunk_offset,
                                chunk.header_size as usize,
                                chunk.end(chunk_offset),
                                package_id,
                                &names,
                            )?;
                        }
                    }
                }
                other => {
                    debug!(chunk = other, offset, "Skipping table chunk");
                }
            }
        }

        Ok(table)
    }

    fn parse_type(
        &mut self,
        reader: &ChunkReader<'_>,
        offset: usize,
        header_size: usize,
        end: usize,
        package_id: u32,
        names: &PackageNames,
    ) -> InspectResult<()> {
        let type_id = reader.u8(offset + 8)? as u32;
        let flags = reader.u8(offset + 9)?;
        let entry_count = reader.u32(offset + 12)? as usize;
        let entries_start = offset + reader.u32(offset + 16)? as usize;
        let config = read_config(reader, offset + 20)?;
        let index = offset + header_size;

        let stride = if flags & (FLAG_SPARSE | FLAG_OFFSET16) == FLAG_OFFSET16 {
            2
        } else {
            4
        };
        let index_fits = entry_count
            .checked_mul(stride)
            .is_some_and(|len| index + len <= end);
        if type_id == 0 || !index_fits {
            return Err(reader.malformed(format!(
                "type chunk at {} declares {} entries",
                offset, entry_count
            )));
        }

        for i in 0..entry_count {
            let (entry_index, entry_offset) = if flags & FLAG_SPARSE != 0 {
                let entry_index = reader.u16(index + i * 4)? as u32;
                let offset = reader.u16(index + i * 4 + 2)? as usize * 4;
                (entry_index, offset)
            } else if flags & FLAG_OFFSET16 != 0 {
                match reader.u16(index + i * 2)? {
                    NO_ENTRY16 => continue,
                    offset => (i as u32, offset as usize * 4),
                }
            } else {
                match reader.u32(index + i * 4)? {
                    NO_ENTRY => continue,
                    offset => (i as u32, offset as usize),
                }
            };

            let Some((key, value)) = read_entry(reader, entries_start + entry_offset)? else {
                continue;
            };
            let id = (package_id << 24) | (type_id << 16) | (entry_index & 0xffff);
            self.entries.entry(id).or_default().push((config, value));

            if let (Some(type_name), Some(key_name)) =
                (names.types.get(type_id - 1), names.keys.get(key))
            {
                self.names
                    .entry((type_name.to_string(), key_name.to_string()))
                    .or_insert(id);
            }
        }

        Ok(())
    }

    /// Resolve a string resource, preferring the default locale.
    pub fn resolve_string(&self, id: u32) -> InspectResult<String> {
        self.resolve_string_at(id, 0)
    }

    fn resolve_string_at(&self, id: u32, depth: usize) -> InspectResult<String> {
        if depth >= MAX_REFERENCE_DEPTH {
            return Err(InspectError::UnresolvedReference(id));
        }
        let candidates = self
            .entries
            .get(&id)
            .ok_or(InspectError::UnresolvedReference(id))?;
        let (_, value) = candidates
            .iter()
            .find(|(config, _)| config.is_default_locale())
            .or_else(|| candidates.first())
            .ok_or(InspectError::UnresolvedReference(id))?;

        match value.data_type {
            TYPE_STRING => self
                .strings
                .get(value.data)
                .map(str::to_string)
                .ok_or(InspectError::UnresolvedReference(id)),
            TYPE_REFERENCE | TYPE_DYNAMIC_REFERENCE => self.resolve_string_at(value.data, depth + 1),
            _ => Err(InspectError::UnresolvedReference(id)),
        }
    }

    /// Resolve a file resource (drawable, mipmap) to the best archive path.
    ///
    /// Raster files beat XML drawables; among those the highest density wins.
    /// Returns `None` when the id exists but holds no file path.
    pub fn resolve_file(&self, id: u32) -> InspectResult<Option<String>> {
        if !self.entries.contains_key(&id) {
            return Err(InspectError::UnresolvedReference(id));
        }

        let mut candidates = Vec::new();
        self.collect_files(id, 0, &mut HashSet::new(), &mut candidates);

        let has_raster = candidates.iter().any(|(_, path)| !is_xml(path));
        let best = candidates
            .into_iter()
            .filter(|(_, path)| !has_raster || !is_xml(path))
            .fold(None::<(ResConfig, String)>, |best, candidate| match best {
                Some(current) if current.0.density_rank() >= candidate.0.density_rank() => {
                    Some(current)
                }
                _ => Some(candidate),
            });

        Ok(best.map(|(_, path)| path))
    }

    fn collect_files(
        &self,
        id: u32,
        depth: usize,
        visited: &mut HashSet<u32>,
        out: &mut Vec<(ResConfig, String)>,
    ) {
        // Each id contributes its candidates once, however many paths reach it.
        if depth >= MAX_REFERENCE_DEPTH || !visited.insert(id) {
            return;
        }
        let Some(candidates) = self.entries.get(&id) else {
            return;
        };
        for (config, value) in candidates {
            match value.data_type {
                TYPE_STRING => {
                    if let Some(path) = self.strings.get(value.data) {
                        out.push((*config, path.to_string()));
                    }
                }
                TYPE_REFERENCE | TYPE_DYNAMIC_REFERENCE => {
                    self.collect_files(value.data, depth + 1, visited, out);
                }
                _ => {}
            }
        }
    }

    /// Id of the resource `@type_name/key`, e.g. `@mipmap/ic_launcher`.
    pub fn find(&self, type_name: &str, key: &str) -> Option<u32> {
        self.names
            .get(&(type_name.to_string(), key.to_string()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

fn is_xml(path: &str) -> bool {
    path.to_ascii_lowercase().ends_with(".xml")
}

fn read_config(reader: &ChunkReader<'_>, offset: usize) -> InspectResult<ResConfig> {
    let size = reader.u32(offset)? as usize;
    let mut config = ResConfig::default();
    if size >= 12 {
        let language = reader.slice(offset + 8, 2)?;
        config.language = [language[0], language[1]];
    }
    if size >= 16 {
        config.density = reader.u16(offset + 14)?;
    }
    Ok(config)
}

/// Read one entry as its key-pool index and simple value.
fn read_entry(reader: &ChunkReader<'_>, offset: usize) -> InspectResult<Option<(u32, ResValue)>> {
    let size = reader.u16(offset)?;
    let flags = reader.u16(offset + 2)?;

    if flags & ENTRY_FLAG_COMPACT != 0 {
        // Compact entries store the key where the size would be and pack the
        // value type into the high byte of flags.
        let value = ResValue {
            data_type: (flags >> 8) as u8,
            data: reader.u32(offset + 4)?,
        };
        return Ok(Some((size as u32, value)));
    }
    if flags & ENTRY_FLAG_COMPLEX != 0 {
        return Ok(None);
    }

    let key = reader.u32(offset + 4)?;
    let value = offset + size as usize;
    Ok(Some((
        key,
        ResValue {
            data_type: reader.u8(value + 3)?,
            data: reader.u32(value + 4)?,
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apk::testing::{arsc, sample_table, TestResource, TestValue, ICON_REF, LABEL_REF};

    #[test]
    fn test_resolve_default_locale_string() {
        let table = ResourceTable::parse(&sample_table("Foo")).unwrap();
        assert_eq!(table.resolve_string(LABEL_REF).unwrap(), "Foo");
    }

    #[test]
    fn test_resolve_string_falls_back_to_first_locale() {
        let data = arsc(
            0x7f,
            &["string"],
            &[TestResource::new(1, 0, TestValue::str("Hallo")).with_language("de")],
            false,
        );
        let table = ResourceTable::parse(&data).unwrap();
        assert_eq!(table.resolve_string(0x7f01_0000).unwrap(), "Hallo");
    }

    #[test]
    fn test_resolve_string_follows_references() {
        let data = arsc(
            0x7f,
            &["string"],
            &[
                TestResource::new(1, 0, TestValue::Ref(0x7f01_0001)),
                TestResource::new(1, 1, TestValue::str("Target")),
            ],
            false,
        );
        let table = ResourceTable::parse(&data).unwrap();
        assert_eq!(table.resolve_string(0x7f01_0000).unwrap(), "Target");
    }

    #[test]
    fn test_reference_cycle_is_unresolved() {
        let data = arsc(
            0x7f,
            &["string"],
            &[
                TestResource::new(1, 0, TestValue::Ref(0x7f01_0001)),
                TestResource::new(1, 1, TestValue::Ref(0x7f01_0000)),
            ],
            false,
        );
        let table = ResourceTable::parse(&data).unwrap();
        assert!(matches!(
            table.resolve_string(0x7f01_0000),
            Err(InspectError::UnresolvedReference(_))
        ));
    }

    #[test]
    fn test_unknown_id_is_unresolved() {
        let table = ResourceTable::parse(&sample_table("Foo")).unwrap();
        assert!(matches!(
            table.resolve_string(0x7f09_0009),
            Err(InspectError::UnresolvedReference(0x7f09_0009))
        ));
        assert!(table.resolve_file(0x7f09_0009).is_err());
    }

    #[test]
    fn test_resolve_icon_prefers_highest_density_raster() {
        let table = ResourceTable::parse(&sample_table("Foo")).unwrap();
        assert_eq!(
            table.resolve_file(ICON_REF).unwrap().as_deref(),
            Some("res/mipmap-xxxhdpi-v4/ic_launcher.png")
        );
    }

    #[test]
    fn test_resolve_icon_uses_xml_when_nothing_else() {
        let data = arsc(
            0x7f,
            &["drawable"],
            &[TestResource::new(1, 3, TestValue::str("res/drawable/icon.xml")).with_density(0xfffe)],
            false,
        );
        let table = ResourceTable::parse(&data).unwrap();
        assert_eq!(
            table.resolve_file(0x7f01_0003).unwrap().as_deref(),
            Some("res/drawable/icon.xml")
        );
    }

    #[test]
    fn test_unqualified_density_ranks_as_mdpi() {
        let data = arsc(
            0x7f,
            &["drawable"],
            &[
                TestResource::new(1, 0, TestValue::str("res/drawable-ldpi/icon.png"))
                    .with_density(120),
                TestResource::new(1, 0, TestValue::str("res/drawable/icon.png")),
            ],
            false,
        );
        let table = ResourceTable::parse(&data).unwrap();
        assert_eq!(
            table.resolve_file(0x7f01_0000).unwrap().as_deref(),
            Some("res/drawable/icon.png")
        );
    }

    #[test]
    fn test_sparse_type_chunks() {
        let data = arsc(
            0x7f,
            &["string"],
            &[
                TestResource::new(1, 2, TestValue::str("two")),
                TestResource::new(1, 7, TestValue::str("seven")),
            ],
            true,
        );
        let table = ResourceTable::parse(&data).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.resolve_string(0x7f01_0002).unwrap(), "two");
        assert_eq!(table.resolve_string(0x7f01_0007).unwrap(), "seven");
    }

    #[test]
    fn test_dense_table_skips_missing_entries() {
        let data = arsc(
            0x7f,
            &["string"],
            &[TestResource::new(1, 4, TestValue::str("four"))],
            false,
        );
        let table = ResourceTable::parse(&data).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.resolve_string(0x7f01_0000).is_err());
    }

    #[test]
    fn test_non_string_value_is_unresolved() {
        let data = arsc(0x7f, &["integer"], &[TestResource::new(1, 0, TestValue::Int(3))], false);
        let table = ResourceTable::parse(&data).unwrap();
        assert!(table.resolve_string(0x7f01_0000).is_err());
        assert_eq!(table.resolve_file(0x7f01_0000).unwrap(), None);
    }

    #[test]
    fn test_find_by_type_and_key() {
        let data = arsc(
            0x7f,
            &["string", "mipmap", "drawable"],
            &[
                TestResource::new(1, 0, TestValue::str("Foo")).with_key("app_name"),
                TestResource::new(2, 0, TestValue::str("res/mipmap/ic_launcher.png"))
                    .with_key("ic_launcher"),
                TestResource::new(3, 4, TestValue::str("res/drawable/ic_launcher.png"))
                    .with_key("ic_launcher")
                    .with_density(240),
            ],
            false,
        );
        let table = ResourceTable::parse(&data).unwrap();

        assert_eq!(table.find("string", "app_name"), Some(0x7f01_0000));
        assert_eq!(table.find("mipmap", "ic_launcher"), Some(0x7f02_0000));
        assert_eq!(table.find("drawable", "ic_launcher"), Some(0x7f03_0004));
        assert_eq!(table.find("mipmap", "app_name"), None);
        assert_eq!(table.find("layout", "ic_launcher"), None);
    }

    #[test]
    fn test_shared_references_expand_once() {
        // Every hop fans out over many configurations that all point at the
        // next entry. Expanding each id once keeps this linear.
        let mut resources = Vec::new();
        for entry in 0..7u16 {
            for density in 1..=60u16 {
                resources.push(
                    TestResource::new(1, entry, TestValue::Ref(0x7f01_0000 + entry as u32 + 1))
                        .with_density(density),
                );
            }
        }
        resources.push(
            TestResource::new(1, 7, TestValue::str("res/drawable-xhdpi/deep.png"))
                .with_density(320),
        );
        let table = ResourceTable::parse(&arsc(0x7f, &["drawable"], &resources, false)).unwrap();

        assert_eq!(
            table.resolve_file(0x7f01_0000).unwrap().as_deref(),
            Some("res/drawable-xhdpi/deep.png")
        );
    }

    #[test]
    fn test_rejects_wrong_root() {
        let mut data = sample_table("Foo");
        data[0] = 0x03;
        assert!(ResourceTable::parse(&data).is_err());
    }

    #[test]
    fn test_truncated_table_is_error() {
        let data = sample_table("Foo");
        assert!(ResourceTable::parse(&data[..data.len() - 10]).is_err());
    }
}
