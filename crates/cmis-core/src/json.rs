//! JSON ↔ property conversion for the REST bindings.
//!
//! Vendor payloads carry few type hints, so the property kind comes from the
//! well-known CMIS property ids first and from the JSON value otherwise.

use serde_json::{Map, Number, Value};

use crate::property::{format_date_time, Property, PropertyKind, PropertyMap, PropertyType, PropertyValues};

/// Kind of the standard CMIS properties vendors report as plain strings.
pub fn known_kind(id: &str) -> Option<PropertyKind> {
    let kind = match id {
        "cmis:creationDate" | "cmis:lastModificationDate" => PropertyKind::DateTime,
        "cmis:contentStreamLength" => PropertyKind::Integer,
        "cmis:isImmutable"
        | "cmis:isLatestVersion"
        | "cmis:isMajorVersion"
        | "cmis:isLatestMajorVersion"
        | "cmis:isVersionSeriesCheckedOut" => PropertyKind::Bool,
        "cmis:objectId"
        | "cmis:parentId"
        | "cmis:baseTypeId"
        | "cmis:objectTypeId"
        | "cmis:versionSeriesId"
        | "cmis:versionSeriesCheckedOutId" => PropertyKind::Id,
        _ => return None,
    };
    Some(kind)
}

/// String form of a scalar, or of a nested object through its
/// `name`, `displayName` or `id` member.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => ["name", "displayName", "id"]
            .iter()
            .find_map(|k| map.get(*k).and_then(scalar_string)),
        Value::Null | Value::Array(_) => None,
    }
}

/// Build a property from a JSON value stored under the CMIS id `id`.
///
/// Arrays become multi-valued properties. Values that cannot be parsed as
/// the expected kind are kept as strings. `null` and deferred links yield
/// `None`.
pub fn property_from_json(id: &str, value: &Value) -> Option<Property> {
    let (values, multi) = match value {
        Value::Array(items) => (items.iter().filter_map(scalar_string).collect(), true),
        other => (vec![scalar_string(other)?], false),
    };

    let inferred = match value {
        Value::Bool(_) => PropertyKind::Bool,
        Value::Number(n) if n.is_i64() || n.is_u64() => PropertyKind::Integer,
        Value::Number(_) => PropertyKind::Decimal,
        _ => PropertyKind::String,
    };
    let kind = known_kind(id).unwrap_or(inferred);

    let build = |kind: PropertyKind| {
        let mut property_type = PropertyType::new(id, kind);
        if multi {
            property_type = property_type.multi();
        }
        Property::new(property_type, values.clone()).ok()
    };
    build(kind).or_else(|| build(PropertyKind::String))
}

/// JSON form of a property: a scalar when single-valued, else an array.
pub fn property_to_json(property: &Property) -> Value {
    let values: Vec<Value> = match property.values() {
        PropertyValues::Strings(v) => v.iter().cloned().map(Value::String).collect(),
        PropertyValues::Integers(v) => v.iter().map(|i| Value::Number((*i).into())).collect(),
        PropertyValues::Decimals(v) => v
            .iter()
            .map(|d| Number::from_f64(*d).map(Value::Number).unwrap_or(Value::Null))
            .collect(),
        PropertyValues::DateTimes(v) => v
            .iter()
            .map(|d| Value::String(format_date_time(d)))
            .collect(),
        PropertyValues::Bools(v) => v.iter().map(|b| Value::Bool(*b)).collect(),
    };
    if property.property_type().multi_valued {
        Value::Array(values)
    } else {
        values.into_iter().next().unwrap_or(Value::Null)
    }
}

/// Convert every member of a JSON object, renaming keys with `to_cmis_key`.
pub fn properties_from_json(object: &Map<String, Value>, to_cmis_key: impl Fn(&str) -> String) -> PropertyMap {
    let mut properties = PropertyMap::new();
    for (key, value) in object {
        let id = to_cmis_key(key);
        if let Some(property) = property_from_json(&id, value) {
            properties.insert(id, property);
        }
    }
    properties
}

/// JSON object of `properties` with vendor keys, skipping the ids in `skip`.
pub fn properties_to_json(
    properties: &PropertyMap,
    to_vendor_key: impl Fn(&str) -> String,
    skip: &[&str],
) -> Value {
    let mut object = Map::new();
    for (id, property) in properties {
        if skip.contains(&id.as_str()) {
            continue;
        }
        object.insert(to_vendor_key(id), property_to_json(property));
    }
    Value::Object(object)
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
