//! Decoder for Android binary XML (the compiled `AndroidManifest.xml`).
//!
//! Only the parts needed to read manifest attributes are decoded: the string
//! pool, the attribute resource map and start/end element nodes. Namespace
//! and CDATA nodes are skipped.

use tracing::debug;

use super::chunk::{
    ChunkReader, RES_STRING_POOL_TYPE, RES_XML_END_ELEMENT_TYPE, RES_XML_RESOURCE_MAP_TYPE,
    RES_XML_START_ELEMENT_TYPE, RES_XML_TYPE,
};
use super::strings::{StringPool, NO_STRING};
use super::InspectResult;

/// `android:label`
pub(crate) const ATTR_LABEL: u32 = 0x0101_0001;
/// `android:icon`
pub(crate) const ATTR_ICON: u32 = 0x0101_0002;
/// `android:name`
pub(crate) const ATTR_NAME: u32 = 0x0101_0003;
/// `android:versionCode`
pub(crate) const ATTR_VERSION_CODE: u32 = 0x0101_021b;
/// `android:versionName`
pub(crate) const ATTR_VERSION_NAME: u32 = 0x0101_021c;

const ACTION_MAIN: &str = "android.intent.action.MAIN";
const CATEGORY_LAUNCHER: &str = "android.intent.category.LAUNCHER";

// Res_value data types.
pub(crate) const TYPE_REFERENCE: u8 = 0x01;
pub(crate) const TYPE_STRING: u8 = 0x03;
pub(crate) const TYPE_DYNAMIC_REFERENCE: u8 = 0x07;
pub(crate) const TYPE_INT_DEC: u8 = 0x10;
pub(crate) const TYPE_INT_HEX: u8 = 0x11;
pub(crate) const TYPE_INT_BOOLEAN: u8 = 0x12;

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AttrValue {
    String(String),
    Reference(u32),
    Int(u32),
    Bool(bool),
    Other { data_type: u8, data: u32 },
}

impl AttrValue {
    /// Build a value from a `Res_value`, resolving inline strings through
    /// `pool`. Falls back to the raw string when the typed value is unusable.
    pub fn from_typed(data_type: u8, data: u32, raw: Option<&str>, pool: &StringPool) -> Self {
        match data_type {
            TYPE_STRING => match pool.get(data).or(raw) {
                Some(s) => AttrValue::String(s.to_string()),
                None => AttrValue::Other { data_type, data },
            },
            TYPE_REFERENCE | TYPE_DYNAMIC_REFERENCE => AttrValue::Reference(data),
            TYPE_INT_DEC | TYPE_INT_HEX => AttrValue::Int(data),
            TYPE_INT_BOOLEAN => AttrValue::Bool(data != 0),
            _ => match raw {
                Some(s) => AttrValue::String(s.to_string()),
                None => AttrValue::Other { data_type, data },
            },
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct XmlAttribute {
    pub name: String,
    pub resource_id: Option<u32>,
    pub value: AttrValue,
}

#[derive(Debug, Clone)]
pub(crate) struct XmlElement {
    pub name: String,
    pub depth: usize,
    pub attributes: Vec<XmlAttribute>,
}

impl XmlElement {
    /// Find an attribute by framework resource id, falling back to its name.
    ///
    /// Obfuscated manifests often blank attribute names, so the resource id
    /// is the reliable key whenever one is known.
    pub fn attr(&self, name: &str, resource_id: Option<u32>) -> Option<&AttrValue> {
        if let Some(id) = resource_id {
            if let Some(attr) = self
                .attributes
                .iter()
                .find(|a| a.resource_id == Some(id))
            {
                return Some(&attr.value);
            }
        }
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.value)
    }
}

/// Flattened element list of a binary XML document, in document order.
#[derive(Debug, Clone, Default)]
pub(crate) struct XmlDocument {
    elements: Vec<XmlElement>,
}

impl XmlDocument {
    pub fn parse(data: &[u8]) -> InspectResult<Self> {
        let reader = ChunkReader::new(data, "binary XML");
        let root = reader.header(0)?;
        if root.kind != RES_XML_TYPE {
            return Err(reader.malformed(format!(
                "expected XML chunk, found 0x{:04x}",
                root.kind
            )));
        }

        let mut pool: Option<StringPool> = None;
        let mut resource_map: Vec<u32> = Vec::new();
        let mut elements = Vec::new();
        let mut depth = 0usize;

        for (offset, header) in reader.chunks(root.body(0), root.end(0))? {
            match header.kind {
                RES_STRING_POOL_TYPE if pool.is_none() => {
                    pool = Some(StringPool::parse(&reader, offset)?);
                }
                RES_XML_RESOURCE_MAP_TYPE => {
                    let body = header.body(offset);
                    let count = (header.end(offset) - body) / 4;
                    resource_map = (0..count)
                        .map(|i| reader.u32(body + i * 4))
                        .collect::<InspectResult<_>>()?;
                }
                RES_XML_START_ELEMENT_TYPE => {
                    let pool = pool
                        .as_ref()
                        .ok_or_else(|| reader.malformed("element before string pool"))?;
                    let element = parse_element(
                        &reader,
                        offset,
                        header.body(offset),
                        pool,
                        &resource_map,
                        depth,
                    )?;
                    elements.push(element);
                    depth += 1;
                }
                RES_XML_END_ELEMENT_TYPE => {
                    depth = depth.saturating_sub(1);
                }
                other => {
                    debug!(chunk = other, offset, "Skipping XML chunk");
                }
            }
        }

        Ok(Self { elements })
    }

    /// The document element.
    pub fn root(&self) -> Option<&XmlElement> {
        self.elements.iter().find(|e| e.depth == 0)
    }

    /// First element named `name` at the given depth.
    pub fn find(&self, name: &str, depth: usize) -> Option<&XmlElement> {
        self.elements
            .iter()
            .find(|e| e.depth == depth && e.name == name)
    }

    /// The first `activity` or `activity-alias` with a MAIN/LAUNCHER intent
    /// filter, in document order.
    pub fn main_activity(&self) -> Option<&XmlElement> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.name == "activity" || e.name == "activity-alias")
            .find(|(index, _)| {
                let nested = subtree(&self.elements, *index);
                nested
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| e.name == "intent-filter")
                    .any(|(filter, _)| is_launcher_filter(subtree(nested, filter)))
            })
            .map(|(_, e)| e)
    }
}

/// Elements nested inside `elements[index]`.
fn subtree(elements: &[XmlElement], index: usize) -> &[XmlElement] {
    let Some(parent) = elements.get(index) else {
        return &[];
    };
    let rest = &elements[index + 1..];
    let len = rest.iter().take_while(|e| e.depth > parent.depth).count();
    &rest[..len]
}

fn is_launcher_filter(filter: &[XmlElement]) -> bool {
    let declares = |tag: &str, value: &str| {
        filter.iter().any(|e| {
            e.name == tag
                && matches!(e.attr("name", Some(ATTR_NAME)), Some(AttrValue::String(s)) if s == value)
        })
    };
    declares("action", ACTION_MAIN) && declares("category", CATEGORY_LAUNCHER)
}

fn parse_element(
    reader: &ChunkReader<'_>,
    offset: usize,
    ext: usize,
    pool: &StringPool,
    resource_map: &[u32],
    depth: usize,
) -> InspectResult<XmlElement> {
    let name_index = reader.u32(ext + 4)?;
    let attribute_start = reader.u16(ext + 8)? as usize;
    let attribute_size = reader.u16(ext + 10)? as usize;
    let attribute_count = reader.u16(ext + 12)? as usize;

    if attribute_count > 0 && attribute_size < 20 {
        return Err(reader.malformed(format!(
            "element at {} has attribute size {}",
            offset, attribute_size
        )));
    }

    let name = pool.get(name_index).unwrap_or_default().to_string();
    let mut attributes = Vec::with_capacity(attribute_count);

    for i in 0..attribute_count {
        let at = ext + attribute_start + i * attribute_size;
        let name_index = reader.u32(at + 4)?;
        let raw_index = reader.u32(at + 8)?;
        let data_type = reader.u8(at + 15)?;
        let data = reader.u32(at + 16)?;

        let resource_id = if name_index != NO_STRING {
            resource_map
                .get(name_index as usize)
                .copied()
                .filter(|id| *id != 0)
        } else {
            None
        };

        attributes.push(XmlAttribute {
            name: pool.get(name_index).unwrap_or_default().to_string(),
            resource_id,
            value: AttrValue::from_typed(data_type, data, pool.get(raw_index), pool),
        });
    }

    Ok(XmlElement {
        name,
        depth,
        attributes,
    })
}
