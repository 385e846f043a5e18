//! OneDrive ↔ CMIS property translation.

use serde_json::{Map, Value};

use cmis_core::json::{properties_from_json, properties_to_json};
use cmis_core::{BaseType, Property, PropertyMap};

pub type JsonObject = Map<String, Value>;

const KEYS: [(&str, &str); 8] = [
    ("id", "cmis:objectId"),
    ("from", "cmis:createdBy"),
    ("created_time", "cmis:creationDate"),
    ("updated_time", "cmis:lastModificationDate"),
    ("name", "cmis:contentStreamFileName"),
    ("description", "cmis:description"),
    ("size", "cmis:contentStreamLength"),
    ("parent_id", "cmis:parentId"),
];

/// Item kinds holding other items.
const CONTAINER_TYPES: [&str; 2] = ["folder", "album"];

pub fn to_cmis_key(key: &str) -> String {
    KEYS.iter()
        .find(|(onedrive, _)| *onedrive == key)
        .map(|(_, cmis)| cmis.to_string())
        .unwrap_or_else(|| key.to_string())
}

pub fn to_onedrive_key(key: &str) -> String {
    KEYS.iter()
        .find(|(_, cmis)| *cmis == key)
        .map(|(onedrive, _)| onedrive.to_string())
        .unwrap_or_else(|| key.to_string())
}

pub fn is_folder(json: &JsonObject) -> bool {
    json.get("type")
        .and_then(Value::as_str)
        .map(|kind| CONTAINER_TYPES.contains(&kind))
        .unwrap_or(false)
}

/// CMIS properties of a OneDrive item.
pub fn to_cmis_properties(json: &JsonObject) -> PropertyMap {
    let mut properties = properties_from_json(json, to_cmis_key);

    if let Some(name) = json.get("name").and_then(Value::as_str) {
        properties.insert("cmis:name".into(), Property::string("cmis:name", name));
    }
    if let Some(updated_by) = json.get("updated_by").and_then(|v| v.get("name")).and_then(Value::as_str) {
        properties.insert(
            "cmis:lastModifiedBy".into(),
            Property::string("cmis:lastModifiedBy", updated_by),
        );
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

/// Request body for the given CMIS properties.
pub fn to_onedrive_json(properties: &PropertyMap) -> Value {
    let mut body = properties_to_json(
        properties,
        to_onedrive_key,
        &["cmis:name", "cmis:baseTypeId", "cmis:objectTypeId", "cmis:objectId"],
    );
    if let Some(object) = body.as_object_mut() {
        if !object.contains_key("name") {
            if let Some(name) = properties.get("cmis:name").and_then(Property::first_string) {
                object.insert("name".into(), Value::String(name));
            }
        }
    }
    body
}

/// Items of a `{"data": [...]}` listing.
pub fn listed_items(list: Value) -> Vec<JsonObject> {
    match list {
        Value::Object(mut object) => match object.remove("data") {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(item) => Some(item),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
