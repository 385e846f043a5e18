//! Drive ↔ CMIS property translation.

use serde_json::{json, Map, Value};

use cmis_core::json::{properties_from_json, properties_to_json};
use cmis_core::{BaseType, Property, PropertyMap};

pub type JsonObject = Map<String, Value>;

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

const GOOGLE_APPS_PREFIX: &str = "application/vnd.google-apps.";

/// Drive key → CMIS id pairs.
const KEYS: [(&str, &str); 10] = [
    ("id", "cmis:objectId"),
    ("ownerNames", "cmis:createdBy"),
    ("createdDate", "cmis:creationDate"),
    ("lastModifyingUserName", "cmis:lastModifiedBy"),
    ("modifiedDate", "cmis:lastModificationDate"),
    ("title", "cmis:contentStreamFileName"),
    ("mimeType", "cmis:contentStreamMimeType"),
    ("fileSize", "cmis:contentStreamLength"),
    ("editable", "cmis:isImmutable"),
    ("parents", "cmis:parentId"),
];

pub fn to_cmis_key(key: &str) -> String {
    KEYS.iter()
        .find(|(drive, _)| *drive == key)
        .map(|(_, cmis)| cmis.to_string())
        .unwrap_or_else(|| key.to_string())
}

pub fn to_gdrive_key(key: &str) -> String {
    KEYS.iter()
        .find(|(_, cmis)| *cmis == key)
        .map(|(drive, _)| drive.to_string())
        .unwrap_or_else(|| key.to_string())
}

/// Native Google Docs formats, which Drive stores without a binary body.
pub fn is_google_doc(mime_type: &str) -> bool {
    mime_type.starts_with(GOOGLE_APPS_PREFIX) && mime_type != FOLDER_MIME_TYPE
}

pub fn is_folder(json: &JsonObject) -> bool {
    json.get("mimeType").and_then(Value::as_str) == Some(FOLDER_MIME_TYPE)
}

/// `editable` unless Drive says otherwise.
pub fn is_editable(json: &JsonObject) -> bool {
    json.get("editable").and_then(Value::as_bool).unwrap_or(true)
}

/// CMIS properties of a Drive file resource.
pub fn to_cmis_properties(json: &JsonObject) -> PropertyMap {
    let mut properties = properties_from_json(json, to_cmis_key);

    if let Some(editable) = json.get("editable").and_then(Value::as_bool) {
        properties.insert(
            "cmis:isImmutable".into(),
            Property::boolean("cmis:isImmutable", !editable),
        );
    }
    if let Some(title) = json.get("title").and_then(Value::as_str) {
        properties.insert("cmis:name".into(), Property::string("cmis:name", title));
    }

    let base = if is_folder(json) {
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
    properties
}

/// Drive metadata body for the given CMIS properties.
pub fn to_gdrive_json(properties: &PropertyMap) -> Value {
    let mut body = properties_to_json(
        properties,
        to_gdrive_key,
        &["cmis:name", "cmis:baseTypeId", "cmis:objectTypeId"],
    );
    let Some(object) = body.as_object_mut() else {
        return body;
    };

    if !object.contains_key("title") {
        if let Some(name) = properties.get("cmis:name").and_then(Property::first_string) {
            object.insert("title".into(), Value::String(name));
        }
    }
    if let Some(immutable) = object.get("editable").and_then(Value::as_bool) {
        object.insert("editable".into(), Value::Bool(!immutable));
    }
    if let Some(parents) = properties.get("cmis:parentId") {
        let refs: Vec<Value> = parents.strings().into_iter().map(|id| json!({ "id": id })).collect();
        object.insert("parents".into(), Value::Array(refs));
    }
    body
}

/// Ids of the `items` of a Drive list resource.
pub fn item_ids(list: &Value) -> Vec<String> {
    list.get("items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("id").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
