//! SharePoint ↔ CMIS property translation.
//!
//! Responses use the OData verbose envelope: the resource sits under `d`,
//! collections under `d.results`, and links to related resources are
//! `{"__deferred": {"uri": ...}}` members.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde_json::{json, Map, Value};

use cmis_core::json::{properties_from_json, properties_to_json};
use cmis_core::{BaseType, Property, PropertyMap};

pub type JsonObject = Map<String, Value>;

pub const FOLDER_TYPE: &str = "SP.Folder";
pub const FILE_TYPE: &str = "SP.File";

/// `CheckOutType` of a file nobody holds.
const CHECK_OUT_NONE: i64 = 2;

const KEYS: [(&str, &str); 7] = [
    ("Name", "cmis:contentStreamFileName"),
    ("TimeCreated", "cmis:creationDate"),
    ("TimeLastModified", "cmis:lastModificationDate"),
    ("Length", "cmis:contentStreamLength"),
    ("ServerRelativeUrl", "cmis:path"),
    ("CheckInComment", "cmis:checkinComment"),
    ("UIVersionLabel", "cmis:versionLabel"),
];

/// Characters escaped inside a quoted server-relative path. Slashes stay.
const PATH_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

pub fn to_cmis_key(key: &str) -> String {
    KEYS.iter()
        .find(|(sharepoint, _)| *sharepoint == key)
        .map(|(_, cmis)| cmis.to_string())
        .unwrap_or_else(|| key.to_string())
}

pub fn to_sharepoint_key(key: &str) -> String {
    KEYS.iter()
        .find(|(_, cmis)| *cmis == key)
        .map(|(sharepoint, _)| sharepoint.to_string())
        .unwrap_or_else(|| key.to_string())
}

/// Quote a value for an OData function argument: `'it''s%20here'`.
pub fn quote(value: &str) -> String {
    let escaped = value.replace('\'', "''");
    format!("'{}'", utf8_percent_encode(&escaped, PATH_SET))
}

/// The resource of a `{"d": {...}}` response, or the value itself.
pub fn unwrap_envelope(value: Value) -> Option<JsonObject> {
    match value {
        Value::Object(mut object) => match object.remove("d") {
            Some(Value::Object(inner)) => Some(inner),
            Some(_) => None,
            None => Some(object),
        },
        _ => None,
    }
}

/// Entries of a `{"d": {"results": [...]}}` collection.
pub fn results(value: Value) -> Vec<JsonObject> {
    let items = match unwrap_envelope(value).and_then(|mut d| d.remove("results")) {
        Some(Value::Array(items)) => items,
        _ => return Vec::new(),
    };
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(item) => Some(item),
            _ => None,
        })
        .collect()
}

fn metadata_member(json: &JsonObject, key: &str) -> Option<String> {
    json.get("__metadata")
        .and_then(|m| m.get(key))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Object id: the canonical resource URI.
pub fn metadata_uri(json: &JsonObject) -> Option<String> {
    metadata_member(json, "uri")
}

pub fn metadata_type(json: &JsonObject) -> Option<String> {
    metadata_member(json, "type")
}

pub fn is_folder(json: &JsonObject) -> bool {
    metadata_type(json).as_deref() == Some(FOLDER_TYPE)
}

/// URI of a deferred link member such as `ParentFolder`.
pub fn deferred_uri(value: &Value) -> Option<String> {
    value
        .get("__deferred")
        .and_then(|d| d.get("uri"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// CMIS properties of a SharePoint folder, file or file version.
///
/// Deferred links are kept as string properties under their SharePoint
/// name so that related resources can be reached later.
pub fn to_cmis_properties(json: &JsonObject) -> PropertyMap {
    let flat: JsonObject = json
        .iter()
        .filter(|(key, _)| key.as_str() != "__metadata")
        .map(|(key, value)| match deferred_uri(value) {
            Some(uri) => (key.clone(), Value::String(uri)),
            None => (key.clone(), value.clone()),
        })
        .collect();
    let mut properties = properties_from_json(&flat, to_cmis_key);

    if let Some(uri) = metadata_uri(json) {
        properties.insert("cmis:objectId".into(), Property::id("cmis:objectId", uri));
    }
    if let Some(name) = json.get("Name").and_then(Value::as_str) {
        properties.insert("cmis:name".into(), Property::string("cmis:name", name));
    }

    let folder = is_folder(json);
    let base = if folder {
        BaseType::Folder
    } else {
        BaseType::Document
    };
    properties.insert(
        "cmis:baseTypeId".into(),
        Property::id("cmis:baseTypeId", base.id()),
    );
    properties.insert(
        "cmis:objectTypeId".into(),
        Property::id("cmis:objectTypeId", base.id()),
    );
    if folder {
        return properties;
    }

    if let Some(name) = json.get("Name").and_then(Value::as_str) {
        let mime = mime_guess::from_path(name)
            .first_raw()
            .unwrap_or("application/octet-stream");
        properties.insert(
            "cmis:contentStreamMimeType".into(),
            Property::string("cmis:contentStreamMimeType", mime),
        );
    }
    if let Some(check_out) = json.get("CheckOutType").and_then(Value::as_i64) {
        properties.insert(
            "cmis:isVersionSeriesCheckedOut".into(),
            Property::boolean("cmis:isVersionSeriesCheckedOut", check_out != CHECK_OUT_NONE),
        );
    }
    if let Some(minor) = json.get("MinorVersion").and_then(Value::as_i64) {
        properties.insert(
            "cmis:isMajorVersion".into(),
            Property::boolean("cmis:isMajorVersion", minor == 0),
        );
    }
    let latest = json
        .get("IsCurrentVersion")
        .and_then(Value::as_bool)
        .unwrap_or(metadata_type(json).as_deref() == Some(FILE_TYPE));
    properties.insert(
        "cmis:isLatestVersion".into(),
        Property::boolean("cmis:isLatestVersion", latest),
    );
    properties
}

/// MERGE body for the given CMIS properties of a `type_name` resource.
pub fn to_sharepoint_json(properties: &PropertyMap, type_name: &str) -> Value {
    let mut body = properties_to_json(
        properties,
        to_sharepoint_key,
        &[
            "cmis:name",
            "cmis:objectId",
            "cmis:baseTypeId",
            "cmis:objectTypeId",
            "cmis:path",
        ],
    );
    if let Some(object) = body.as_object_mut() {
        if !object.contains_key("Name") {
            if let Some(name) = properties.get("cmis:name").and_then(Property::first_string) {
                object.insert("Name".into(), Value::String(name));
            }
        }
        object.insert("__metadata".into(), json!({ "type": type_name }));
    }
    body
}

/// Parent directory of a server-relative path, `None` at the top.
pub fn parent_path(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) if trimmed.len() > 1 => Some("/"),
        Some(0) | None => None,
        Some(at) => Some(&trimmed[..at]),
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
