//! Encoders for synthetic binary manifests, resource tables and APKs.
//!
//! Only compiled for tests. The layouts mirror what `aapt2` emits closely
//! enough for the decoders in this module to be exercised end to end.

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use super::axml::{ATTR_ICON, ATTR_LABEL, ATTR_NAME, ATTR_VERSION_CODE, ATTR_VERSION_NAME};

pub(crate) const ANDROID_NS: &str = "http://schemas.android.com/apk/res/android";

/// `@string/app_name` in the sample table.
pub(crate) const LABEL_REF: u32 = 0x7f01_0000;

/// `@mipmap/ic_launcher` in the sample table.
pub(crate) const ICON_REF: u32 = 0x7f02_0000;

const NONE: u32 = u32::MAX;

/// A typed attribute or resource value.
#[derive(Debug, Clone)]
pub(crate) enum TestValue {
    Str(String),
    Ref(u32),
    Int(u32),
    Bool(bool),
}

impl TestValue {
    pub fn str(value: &str) -> Self {
        TestValue::Str(value.to_string())
    }
}

/// An attribute on a synthetic element.
#[derive(Debug, Clone)]
pub(crate) struct TestAttr {
    name: String,
    resource_id: Option<u32>,
    value: TestValue,
}

impl TestAttr {
    /// An `android:` attribute carrying its framework resource id.
    pub fn android(name: &str, resource_id: u32, value: TestValue) -> Self {
        Self {
            name: name.to_string(),
            resource_id: Some(resource_id),
            value,
        }
    }

    /// An attribute without a namespace, like `package`.
    pub fn plain(name: &str, value: TestValue) -> Self {
        Self {
            name: name.to_string(),
            resource_id: None,
            value,
        }
    }
}

/// One step of a synthetic XML document.
#[derive(Debug, Clone)]
pub(crate) enum XmlEvent {
    Start(String, Vec<TestAttr>),
    End(String),
}

/// A resource table entry.
#[derive(Debug, Clone)]
pub(crate) struct TestResource {
    type_id: u8,
    entry: u16,
    language: [u8; 2],
    density: u16,
    value: TestValue,
    key: Option<String>,
    key_index: u32,
}

impl TestResource {
    pub fn new(type_id: u8, entry: u16, value: TestValue) -> Self {
        Self {
            type_id,
            entry,
            language: [0, 0],
            density: 0,
            value,
            key: None,
            key_index: 0,
        }
    }

    /// Entry name in the key pool (default `key<entry>`).
    pub fn with_key(mut self, key: &str) -> Self {
        self.key = Some(key.to_string());
        self
    }

    pub fn with_density(mut self, density: u16) -> Self {
        self.density = density;
        self
    }

    pub fn with_language(mut self, language: &str) -> Self {
        let bytes = language.as_bytes();
        self.language = [bytes[0], bytes[1]];
        self
    }
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn chunk(kind: u16, extra_header: &[u8], body: &[u8]) -> Vec<u8> {
    let header_size = 8 + extra_header.len();
    let mut out = Vec::with_capacity(header_size + body.len());
    push_u16(&mut out, kind);
    push_u16(&mut out, header_size as u16);
    push_u32(&mut out, (header_size + body.len()) as u32);
    out.extend_from_slice(extra_header);
    out.extend_from_slice(body);
    out
}

fn push_len8(out: &mut Vec<u8>, len: usize) {
    if len > 0x7f {
        out.push(0x80 | (len >> 8) as u8);
        out.push((len & 0xff) as u8);
    } else {
        out.push(len as u8);
    }
}

fn push_len16(out: &mut Vec<u8>, len: usize) {
    if len > 0x7fff {
        push_u16(out, 0x8000 | (len >> 16) as u16);
        push_u16(out, (len & 0xffff) as u16);
    } else {
        push_u16(out, len as u16);
    }
}

/// Encode a string pool chunk.
pub(crate) fn string_pool(strings: &[&str], utf8: bool) -> Vec<u8> {
    let mut offsets = Vec::new();
    let mut data = Vec::new();
    for s in strings {
        push_u32(&mut offsets, data.len() as u32);
        if utf8 {
            push_len8(&mut data, s.chars().count());
            push_len8(&mut data, s.len());
            data.extend_from_slice(s.as_bytes());
            data.push(0);
        } else {
            let units: Vec<u16> = s.encode_utf16().collect();
            push_len16(&mut data, units.len());
            for unit in units {
                push_u16(&mut data, unit);
            }
            push_u16(&mut data, 0);
        }
    }
    while data.len() % 4 != 0 {
        data.push(0);
    }

    let mut header = Vec::new();
    push_u32(&mut header, strings.len() as u32);
    push_u32(&mut header, 0);
    push_u32(&mut header, if utf8 { 1 << 8 } else { 0 });
    push_u32(&mut header, (28 + 4 * strings.len()) as u32);
    push_u32(&mut header, 0);

    let mut body = offsets;
    body.extend(data);
    chunk(0x0001, &header, &body)
}

fn intern(strings: &mut Vec<String>, value: &str) -> u32 {
    match strings.iter().position(|s| s == value) {
        Some(index) => index as u32,
        None => {
            strings.push(value.to_string());
            (strings.len() - 1) as u32
        }
    }
}

fn push_value(out: &mut Vec<u8>, strings: &mut Vec<String>, value: &TestValue) {
    let (data_type, data) = match value {
        TestValue::Str(s) => (0x03, intern(strings, s)),
        TestValue::Ref(id) => (0x01, *id),
        TestValue::Int(v) => (0x10, *v),
        TestValue::Bool(b) => (0x12, if *b { NONE } else { 0 }),
    };
    push_u16(out, 8);
    out.push(0);
    out.push(data_type);
    push_u32(out, data);
}

fn node_header() -> Vec<u8> {
    let mut header = Vec::new();
    push_u32(&mut header, 1);
    push_u32(&mut header, NONE);
    header
}

/// Encode a binary XML document.
pub(crate) fn axml(events: &[XmlEvent]) -> Vec<u8> {
    // Attribute names with resource ids come first so the resource map
    // lines up with the string pool.
    let mut strings: Vec<String> = Vec::new();
    let mut ids: Vec<u32> = Vec::new();
    for event in events {
        if let XmlEvent::Start(_, attrs) = event {
            for attr in attrs {
                if let Some(id) = attr.resource_id {
                    if !strings.contains(&attr.name) {
                        strings.push(attr.name.clone());
                        ids.push(id);
                    }
                }
            }
        }
    }

    let prefix = intern(&mut strings, "android");
    let uri = intern(&mut strings, ANDROID_NS);

    let mut nodes = Vec::new();
    let mut ns_body = Vec::new();
    push_u32(&mut ns_body, prefix);
    push_u32(&mut ns_body, uri);
    nodes.extend(chunk(0x0100, &node_header(), &ns_body));

    for event in events {
        match event {
            XmlEvent::Start(name, attrs) => {
                let mut body = Vec::new();
                push_u32(&mut body, NONE);
                let name_index = intern(&mut strings, name);
                push_u32(&mut body, name_index);
                push_u16(&mut body, 20);
                push_u16(&mut body, 20);
                push_u16(&mut body, attrs.len() as u16);
                push_u16(&mut body, 0);
                push_u16(&mut body, 0);
                push_u16(&mut body, 0);
                for attr in attrs {
                    let ns = if attr.resource_id.is_some() { uri } else { NONE };
                    push_u32(&mut body, ns);
                    let attr_name = intern(&mut strings, &attr.name);
                    push_u32(&mut body, attr_name);
                    let raw = match &attr.value {
                        TestValue::Str(s) => intern(&mut strings, s),
                        _ => NONE,
                    };
                    push_u32(&mut body, raw);
                    push_value(&mut body, &mut strings, &attr.value);
                }
                nodes.extend(chunk(0x0102, &node_header(), &body));
            }
            XmlEvent::End(name) => {
                let mut body = Vec::new();
                push_u32(&mut body, NONE);
                let name_index = intern(&mut strings, name);
                push_u32(&mut body, name_index);
                nodes.extend(chunk(0x0103, &node_header(), &body));
            }
        }
    }
    nodes.extend(chunk(0x0101, &node_header(), &ns_body));

    let refs: Vec<&str> = strings.iter().map(String::as_str).collect();
    let mut body = string_pool(&refs, false);
    let mut map = Vec::new();
    for id in ids {
        push_u32(&mut map, id);
    }
    body.extend(chunk(0x0180, &[], &map));
    body.extend(nodes);
    chunk(0x0003, &[], &body)
}

fn type_chunk(
    type_id: u8,
    language: [u8; 2],
    density: u16,
    members: &[&TestResource],
    sparse: bool,
    global: &mut Vec<String>,
) -> Vec<u8> {
    let mut sorted: Vec<&TestResource> = members.to_vec();
    sorted.sort_by_key(|r| r.entry);

    let mut entries = Vec::new();
    let mut index = Vec::new();
    let dense_count = sorted.last().map_or(0, |r| r.entry as usize + 1);
    let mut offsets = vec![NONE; dense_count];

    for resource in &sorted {
        let offset = entries.len();
        if sparse {
            push_u16(&mut index, resource.entry);
            push_u16(&mut index, (offset / 4) as u16);
        } else {
            offsets[resource.entry as usize] = offset as u32;
        }
        push_u16(&mut entries, 8);
        push_u16(&mut entries, 0);
        push_u32(&mut entries, resource.key_index);
        push_value(&mut entries, global, &resource.value);
    }
    if !sparse {
        for offset in offsets {
            push_u32(&mut index, offset);
        }
    }

    let mut config = Vec::new();
    push_u32(&mut config, 28);
    push_u16(&mut config, 0);
    push_u16(&mut config, 0);
    config.extend_from_slice(&language);
    config.extend_from_slice(&[0, 0]);
    config.push(0);
    config.push(0);
    push_u16(&mut config, density);
    config.extend_from_slice(&[0; 12]);

    let entry_count = if sparse { sorted.len() } else { dense_count };
    let mut header = Vec::new();
    header.push(type_id);
    header.push(if sparse { 0x01 } else { 0x00 });
    push_u16(&mut header, 0);
    push_u32(&mut header, entry_count as u32);
    push_u32(&mut header, (48 + index.len()) as u32);
    header.extend(config);

    let mut body = index;
    body.extend(entries);
    chunk(0x0201, &header, &body)
}

/// Encode a resource table with a single package.
pub(crate) fn arsc(
    package_id: u8,
    type_names: &[&str],
    resources: &[TestResource],
    sparse: bool,
) -> Vec<u8> {
    let mut global: Vec<String> = Vec::new();

    let mut keys: Vec<String> = Vec::new();
    let resources: Vec<TestResource> = resources
        .iter()
        .cloned()
        .map(|mut resource| {
            let key = resource
                .key
                .clone()
                .unwrap_or_else(|| format!("key{}", resource.entry));
            resource.key_index = intern(&mut keys, &key);
            resource
        })
        .collect();

    let mut groups: Vec<((u8, [u8; 2], u16), Vec<&TestResource>)> = Vec::new();
    for resource in &resources {
        let key = (resource.type_id, resource.language, resource.density);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(resource),
            None => groups.push((key, vec![resource])),
        }
    }

    let mut type_chunks = Vec::new();
    for ((type_id, language, density), members) in &groups {
        type_chunks.extend(type_chunk(
            *type_id,
            *language,
            *density,
            members,
            sparse,
            &mut global,
        ));
    }

    let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
    let type_pool = string_pool(type_names, false);
    let key_pool = string_pool(&key_refs, true);

    let mut package_header = Vec::new();
    push_u32(&mut package_header, package_id as u32);
    let mut name = [0u8; 256];
    for (i, unit) in "com.example".encode_utf16().enumerate() {
        name[i * 2..i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
    }
    package_header.extend_from_slice(&name);
    push_u32(&mut package_header, 288);
    push_u32(&mut package_header, 0);
    push_u32(&mut package_header, (288 + type_pool.len()) as u32);
    push_u32(&mut package_header, 0);
    push_u32(&mut package_header, 0);

    let mut package_body = type_pool;
    package_body.extend(key_pool);
    package_body.extend(type_chunks);
    let package = chunk(0x0200, &package_header, &package_body);

    let global_refs: Vec<&str> = global.iter().map(String::as_str).collect();
    let mut table_body = string_pool(&global_refs, true);
    table_body.extend(package);

    let mut table_header = Vec::new();
    push_u32(&mut table_header, 1);
    chunk(0x0002, &table_header, &table_body)
}

/// Zip the given entries into an in-memory APK.
pub(crate) fn apk_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// PNG-signed bytes tagged so tests can tell icons apart.
pub(crate) fn png_bytes(tag: u8) -> Vec<u8> {
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.extend_from_slice(&[0, 0, 0, 13]);
    bytes.extend_from_slice(b"IHDR");
    bytes.push(tag);
    bytes
}

/// A manifest with the usual `manifest` / `application` pair.
pub(crate) fn manifest_xml(
    package: &str,
    version_code: u32,
    version_name: &str,
    label: TestValue,
    icon: Option<TestValue>,
) -> Vec<u8> {
    let mut app_attrs = vec![TestAttr::android("label", ATTR_LABEL, label)];
    if let Some(icon) = icon {
        app_attrs.push(TestAttr::android("icon", ATTR_ICON, icon));
    }
    app_attrs.push(TestAttr::android(
        "allowBackup",
        0x0101_0280,
        TestValue::Bool(true),
    ));

    axml(&[
        XmlEvent::Start(
            "manifest".to_string(),
            vec![
                TestAttr::android(
                    "versionCode",
                    ATTR_VERSION_CODE,
                    TestValue::Int(version_code),
                ),
                TestAttr::android(
                    "versionName",
                    ATTR_VERSION_NAME,
                    TestValue::str(version_name),
                ),
                TestAttr::plain("package", TestValue::str(package)),
            ],
        ),
        XmlEvent::Start(
            "uses-sdk".to_string(),
            vec![TestAttr::android("minSdkVersion", 0x0101_020c, TestValue::Int(21))],
        ),
        XmlEvent::End("uses-sdk".to_string()),
        XmlEvent::Start("application".to_string(), app_attrs),
        XmlEvent::End("application".to_string()),
        XmlEvent::End("manifest".to_string()),
    ])
}

/// `android:label`
pub(crate) fn label(value: TestValue) -> TestAttr {
    TestAttr::android("label", ATTR_LABEL, value)
}

/// `android:icon`
pub(crate) fn icon(value: TestValue) -> TestAttr {
    TestAttr::android("icon", ATTR_ICON, value)
}

fn named(tag: &str, name: &str) -> Vec<XmlEvent> {
    vec![
        XmlEvent::Start(
            tag.to_string(),
            vec![TestAttr::android("name", ATTR_NAME, TestValue::str(name))],
        ),
        XmlEvent::End(tag.to_string()),
    ]
}

/// An activity element (`activity` or `activity-alias`), optionally with a
/// MAIN/LAUNCHER intent filter.
pub(crate) fn activity(
    tag: &str,
    name: &str,
    mut attrs: Vec<TestAttr>,
    launcher: bool,
) -> Vec<XmlEvent> {
    attrs.insert(
        0,
        TestAttr::android("name", ATTR_NAME, TestValue::str(name)),
    );
    let mut events = vec![XmlEvent::Start(tag.to_string(), attrs)];
    events.push(XmlEvent::Start("intent-filter".to_string(), Vec::new()));
    if launcher {
        events.extend(named("action", "android.intent.action.MAIN"));
        events.extend(named("category", "android.intent.category.LAUNCHER"));
    } else {
        events.extend(named("action", "android.intent.action.VIEW"));
        events.extend(named("category", "android.intent.category.DEFAULT"));
    }
    events.push(XmlEvent::End("intent-filter".to_string()));
    events.push(XmlEvent::End(tag.to_string()));
    events
}

/// A manifest whose `<application>` has the given attributes and children.
pub(crate) fn manifest_with(
    package: &str,
    app_attrs: Vec<TestAttr>,
    children: Vec<XmlEvent>,
) -> Vec<u8> {
    let mut events = vec![
        XmlEvent::Start(
            "manifest".to_string(),
            vec![
                TestAttr::android("versionCode", ATTR_VERSION_CODE, TestValue::Int(1)),
                TestAttr::plain("package", TestValue::str(package)),
            ],
        ),
        XmlEvent::Start("application".to_string(), app_attrs),
    ];
    events.extend(children);
    events.push(XmlEvent::End("application".to_string()));
    events.push(XmlEvent::End("manifest".to_string()));
    axml(&events)
}

/// Resource table with `@string/app_name` and a multi-density launcher icon.
pub(crate) fn sample_table(app_name: &str) -> Vec<u8> {
    arsc(
        0x7f,
        &["string", "mipmap"],
        &[
            TestResource::new(1, 0, TestValue::str(app_name)),
            TestResource::new(1, 0, TestValue::str("Übersetzt")).with_language("de"),
            TestResource::new(2, 0, TestValue::str("res/mipmap-mdpi-v4/ic_launcher.png"))
                .with_density(160),
            TestResource::new(
                2,
                0,
                TestValue::str("res/mipmap-xxxhdpi-v4/ic_launcher.png"),
            )
            .with_density(640),
            TestResource::new(
                2,
                0,
                TestValue::str("res/mipmap-anydpi-v26/ic_launcher.xml"),
            )
            .with_density(0xfffe),
        ],
        false,
    )
}

/// A complete APK: manifest, resource table and two icon densities.
///
/// The xxxhdpi icon is `png_bytes(tag)`; the mdpi one is `png_bytes(0)`.
pub(crate) fn sample_apk(package: &str, app_name: &str, tag: u8) -> Vec<u8> {
    let manifest = manifest_xml(
        package,
        5,
        "1.2",
        TestValue::Ref(LABEL_REF),
        Some(TestValue::Ref(ICON_REF)),
    );
    let table = sample_table(app_name);
    let big_icon = png_bytes(tag);
    let small_icon = png_bytes(0);
    apk_bytes(&[
        ("AndroidManifest.xml", manifest.as_slice()),
        ("resources.arsc", table.as_slice()),
        ("res/mipmap-mdpi-v4/ic_launcher.png", small_icon.as_slice()),
        ("res/mipmap-xxxhdpi-v4/ic_launcher.png", big_icon.as_slice()),
        ("classes.dex", &b"dex\n035\0"[..]),
    ])
}

/// Write [`sample_apk`] to `path`.
pub(crate) fn write_sample_apk(path: &Path, package: &str, app_name: &str, tag: u8) {
    fs::write(path, sample_apk(package, app_name, tag)).unwrap();
}
