//! Typed, multi-valued CMIS properties.
//!
//! Every binding marshals properties as text, so each value kind has a
//! canonical string form and a parser for it. `Property::new` parses the wire
//! strings once; `Property::strings` formats them back.

use std::collections::BTreeMap;
use std::fmt;
use std::num::IntErrorKind;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use quick_xml::escape::escape;
use serde::{Deserialize, Serialize};

use crate::error::{CmisError, CmisResult};
use crate::xml::{ns, XmlElement};

/// Properties of an object keyed by property definition id.
pub type PropertyMap = BTreeMap<String, Property>;

/// Value kind of a property definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKind {
    String,
    Integer,
    Decimal,
    DateTime,
    Bool,
    Id,
    Html,
    Uri,
}

impl PropertyKind {
    /// Suffix used in `cmis:propertyXxx` and `cmis:propertyXxxDefinition` element names.
    pub fn xml_name(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Integer => "Integer",
            Self::Decimal => "Decimal",
            Self::DateTime => "DateTime",
            Self::Bool => "Boolean",
            Self::Id => "Id",
            Self::Html => "Html",
            Self::Uri => "Uri",
        }
    }

    pub fn from_xml_name(name: &str) -> Option<Self> {
        Some(match name {
            "String" => Self::String,
            "Integer" => Self::Integer,
            "Decimal" => Self::Decimal,
            "DateTime" => Self::DateTime,
            "Boolean" => Self::Bool,
            "Id" => Self::Id,
            "Html" => Self::Html,
            "Uri" => Self::Uri,
            _ => return None,
        })
    }

    /// Kinds whose values are stored as plain strings.
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::String | Self::Id | Self::Html | Self::Uri)
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.xml_name())
    }
}

/// Definition of a property: identity, value kind and cardinality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyType {
    pub id: String,
    pub local_name: String,
    pub local_namespace: String,
    pub display_name: String,
    pub query_name: String,
    pub description: String,
    pub kind: PropertyKind,
    pub multi_valued: bool,
    pub updatable: bool,
    pub inherited: bool,
    pub required: bool,
    pub queryable: bool,
    pub orderable: bool,
}

impl PropertyType {
    /// A single-valued definition whose names all equal the id.
    pub fn new(id: impl Into<String>, kind: PropertyKind) -> Self {
        let id = id.into();
        Self {
            local_name: id.clone(),
            local_namespace: String::new(),
            display_name: id.clone(),
            query_name: id.clone(),
            description: String::new(),
            id,
            kind,
            multi_valued: false,
            updatable: true,
            inherited: false,
            required: false,
            queryable: false,
            orderable: false,
        }
    }

    pub fn multi(mut self) -> Self {
        self.multi_valued = true;
        self
    }

    /// Parse a `cmis:propertyXxxDefinition` element from a type definition.
    pub fn from_definition_xml(element: &XmlElement) -> Option<Self> {
        let kind_name = element
            .name
            .strip_prefix("property")?
            .strip_suffix("Definition")?;
        let kind = PropertyKind::from_xml_name(kind_name)?;
        let text = |name: &str| element.child_text(ns::CMIS, name).unwrap_or_default();
        let flag = |name: &str| parse_bool(&text(name)).unwrap_or(false);

        Some(Self {
            id: text("id"),
            local_name: text("localName"),
            local_namespace: text("localNamespace"),
            display_name: text("displayName"),
            query_name: text("queryName"),
            description: text("description"),
            kind,
            multi_valued: text("cardinality") == "multi",
            updatable: text("updatability") == "readwrite",
            inherited: flag("inherited"),
            required: flag("required"),
            queryable: flag("queryable"),
            orderable: flag("orderable"),
        })
    }
}

/// Typed values held by a property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValues {
    Strings(Vec<String>),
    Integers(Vec<i64>),
    Decimals(Vec<f64>),
    DateTimes(Vec<DateTime<Utc>>),
    Bools(Vec<bool>),
}

impl PropertyValues {
    fn len(&self) -> usize {
        match self {
            Self::Strings(v) => v.len(),
            Self::Integers(v) => v.len(),
            Self::Decimals(v) => v.len(),
            Self::DateTimes(v) => v.len(),
            Self::Bools(v) => v.len(),
        }
    }
}

/// A property value set bound to its definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    property_type: PropertyType,
    values: PropertyValues,
}

impl Property {
    /// Build a property by parsing the canonical string forms of its values.
    ///
    /// Single-valued definitions keep at most the first value.
    pub fn new(property_type: PropertyType, values: Vec<String>) -> CmisResult<Self> {
        let mut values = values;
        if !property_type.multi_valued {
            values.truncate(1);
        }
        let values = match property_type.kind {
            PropertyKind::Integer => PropertyValues::Integers(
                values.iter().map(|v| parse_integer(v)).collect::<CmisResult<_>>()?,
            ),
            PropertyKind::Decimal => PropertyValues::Decimals(
                values.iter().map(|v| parse_double(v)).collect::<CmisResult<_>>()?,
            ),
            PropertyKind::DateTime => PropertyValues::DateTimes(
                values.iter().map(|v| parse_date_time(v)).collect::<CmisResult<_>>()?,
            ),
            PropertyKind::Bool => PropertyValues::Bools(
                values.iter().map(|v| parse_bool(v)).collect::<CmisResult<_>>()?,
            ),
            _ => PropertyValues::Strings(values),
        };
        Ok(Self {
            property_type,
            values,
        })
    }

    /// Build a property from already typed values.
    pub fn with_values(property_type: PropertyType, values: PropertyValues) -> CmisResult<Self> {
        let matches = match (&values, property_type.kind) {
            (PropertyValues::Strings(_), kind) => kind.is_textual(),
            (PropertyValues::Integers(_), PropertyKind::Integer)
            | (PropertyValues::Decimals(_), PropertyKind::Decimal)
            | (PropertyValues::DateTimes(_), PropertyKind::DateTime)
            | (PropertyValues::Bools(_), PropertyKind::Bool) => true,
            _ => false,
        };
        if !matches {
            return Err(CmisError::invalid(format!(
                "Values don't match the {} kind of property {}",
                property_type.kind, property_type.id
            )));
        }
        if !property_type.multi_valued && values.len() > 1 {
            return Err(CmisError::invalid(format!(
                "Property {} is single-valued",
                property_type.id
            )));
        }
        Ok(Self {
            property_type,
            values,
        })
    }

    pub fn string(id: &str, value: impl Into<String>) -> Self {
        Self {
            property_type: PropertyType::new(id, PropertyKind::String),
            values: PropertyValues::Strings(vec![value.into()]),
        }
    }

    pub fn id(id: &str, value: impl Into<String>) -> Self {
        Self {
            property_type: PropertyType::new(id, PropertyKind::Id),
            values: PropertyValues::Strings(vec![value.into()]),
        }
    }

    pub fn integer(id: &str, value: i64) -> Self {
        Self {
            property_type: PropertyType::new(id, PropertyKind::Integer),
            values: PropertyValues::Integers(vec![value]),
        }
    }

    pub fn boolean(id: &str, value: bool) -> Self {
        Self {
            property_type: PropertyType::new(id, PropertyKind::Bool),
            values: PropertyValues::Bools(vec![value]),
        }
    }

    pub fn date_time(id: &str, value: DateTime<Utc>) -> Self {
        Self {
            property_type: PropertyType::new(id, PropertyKind::DateTime),
            values: PropertyValues::DateTimes(vec![value]),
        }
    }

    pub fn property_type(&self) -> &PropertyType {
        &self.property_type
    }

    pub fn values(&self) -> &PropertyValues {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.len() == 0
    }

    /// Canonical string form of every value.
    pub fn strings(&self) -> Vec<String> {
        match &self.values {
            PropertyValues::Strings(v) => v.clone(),
            PropertyValues::Integers(v) => v.iter().map(i64::to_string).collect(),
            PropertyValues::Decimals(v) => v.iter().map(f64::to_string).collect(),
            PropertyValues::DateTimes(v) => v.iter().map(format_date_time).collect(),
            PropertyValues::Bools(v) => v.iter().map(bool::to_string).collect(),
        }
    }

    pub fn first_string(&self) -> Option<String> {
        self.strings().into_iter().next()
    }

    pub fn longs(&self) -> &[i64] {
        match &self.values {
            PropertyValues::Integers(v) => v,
            _ => &[],
        }
    }

    pub fn doubles(&self) -> &[f64] {
        match &self.values {
            PropertyValues::Decimals(v) => v,
            _ => &[],
        }
    }

    pub fn date_times(&self) -> &[DateTime<Utc>] {
        match &self.values {
            PropertyValues::DateTimes(v) => v,
            _ => &[],
        }
    }

    pub fn bools(&self) -> &[bool] {
        match &self.values {
            PropertyValues::Bools(v) => v,
            _ => &[],
        }
    }

    /// Parse a `cmis:propertyXxx` element with its `cmis:value` children.
    pub fn from_xml(element: &XmlElement) -> CmisResult<Option<Self>> {
        let Some(kind) = element
            .name
            .strip_prefix("property")
            .and_then(PropertyKind::from_xml_name)
        else {
            return Ok(None);
        };
        let Some(id) = element.attr("propertyDefinitionId") else {
            return Ok(None);
        };

        let values: Vec<String> = element
            .children_named(ns::CMIS, "value")
            .map(|v| v.text.clone())
            .collect();
        let mut property_type = PropertyType::new(id, kind);
        property_type.multi_valued = values.len() > 1;
        if let Some(local) = element.attr("localName") {
            property_type.local_name = local.to_string();
        }
        if let Some(display) = element.attr("displayName") {
            property_type.display_name = display.to_string();
        }
        if let Some(query) = element.attr("queryName") {
            property_type.query_name = query.to_string();
        }
        Self::new(property_type, values).map(Some)
    }

    /// Append the `cmis:propertyXxx` element for this property.
    pub fn write_xml(&self, out: &mut String) {
        let pt = &self.property_type;
        out.push_str(&format!(
            "<cmis:property{} propertyDefinitionId=\"{}\" localName=\"{}\" displayName=\"{}\" queryName=\"{}\">",
            pt.kind.xml_name(),
            escape(pt.id.as_str()),
            escape(pt.local_name.as_str()),
            escape(pt.display_name.as_str()),
            escape(pt.query_name.as_str()),
        ));
        for value in self.strings() {
            out.push_str("<cmis:value>");
            out.push_str(&escape(value.as_str()));
            out.push_str("</cmis:value>");
        }
        out.push_str(&format!("</cmis:property{}>", pt.kind.xml_name()));
    }
}

/// Parse every `cmis:propertyXxx` child of a `cmis:properties` element.
pub fn properties_from_xml(properties: &XmlElement) -> CmisResult<PropertyMap> {
    let mut map = PropertyMap::new();
    for child in properties.children.iter().filter(|c| c.is_in(ns::CMIS)) {
        if let Some(property) = Property::from_xml(child)? {
            map.insert(property.property_type().id.clone(), property);
        }
    }
    Ok(map)
}

/// Serialize a property map as a sequence of `cmis:propertyXxx` elements.
pub fn properties_to_xml(properties: &PropertyMap) -> String {
    let mut out = String::new();
    for property in properties.values() {
        property.write_xml(&mut out);
    }
    out
}

// ── xsd value parsers ───────────────────────────────────────────────

pub fn parse_bool(value: &str) -> CmisResult<bool> {
    match value.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(CmisError::invalid(format!("Invalid xsd:boolean input: {value}"))),
    }
}

pub fn parse_integer(value: &str) -> CmisResult<i64> {
    value.trim().parse::<i64>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            CmisError::invalid(format!("xsd:integer input can't fit to long: {value}"))
        }
        _ => CmisError::invalid(format!("Invalid xsd:integer input: {value}")),
    })
}

pub fn parse_double(value: &str) -> CmisResult<f64> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| CmisError::invalid(format!("Invalid xsd:decimal input: {value}")))
}

/// Parse an `xsd:dateTime`. A value without a zone is taken as UTC.
pub fn parse_date_time(value: &str) -> CmisResult<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    // Offsets without a colon, e.g. `+0000`.
    if let Ok(dt) = DateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| CmisError::invalid(format!("Invalid xsd:dateTime input: {value}")))
}

pub fn format_date_time(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
