//! Canned AtomPub documents served by the mock transport in tests.

use std::sync::Arc;

use cmis_core::testing::MockTransport;
use cmis_core::xml::ns;
use cmis_core::HttpSession;

use crate::session::AtomSession;

pub const SERVICE_URL: &str = "http://mockup/mock/atom";

fn namespaces() -> String {
    format!(
        r#"xmlns:app="{}" xmlns:atom="{}" xmlns:cmis="{}" xmlns:cmisra="{}""#,
        ns::APP,
        ns::ATOM,
        ns::CMIS,
        ns::CMISRA
    )
}

pub fn service_document() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<app:service {ns}>
  <app:workspace>
    <atom:title>mock</atom:title>
    <cmisra:repositoryInfo>
      <cmis:repositoryId>mock</cmis:repositoryId>
      <cmis:repositoryName>Mock repository</cmis:repositoryName>
      <cmis:rootFolderId>root-folder</cmis:rootFolderId>
      <cmis:cmisVersionSupported>1.0</cmis:cmisVersionSupported>
      <cmis:capabilities>
        <cmis:capabilityQuery>bothcombined</cmis:capabilityQuery>
      </cmis:capabilities>
    </cmisra:repositoryInfo>
    <app:collection href="http://mockup/mock/children/root-folder">
      <cmisra:collectionType>root</cmisra:collectionType>
    </app:collection>
    <app:collection href="http://mockup/mock/types">
      <cmisra:collectionType>types</cmisra:collectionType>
    </app:collection>
    <app:collection href="http://mockup/mock/query">
      <cmisra:collectionType>query</cmisra:collectionType>
    </app:collection>
    <app:collection href="http://mockup/mock/checkedout">
      <cmisra:collectionType>checkedout</cmisra:collectionType>
    </app:collection>
    <app:collection href="http://mockup/mock/unfiled">
      <cmisra:collectionType>unfiled</cmisra:collectionType>
    </app:collection>
    <cmisra:uritemplate>
      <cmisra:template>http://mockup/mock/id?id={{id}}</cmisra:template>
      <cmisra:type>objectbyid</cmisra:type>
      <cmisra:mediatype>application/atom+xml;type=entry</cmisra:mediatype>
    </cmisra:uritemplate>
    <cmisra:uritemplate>
      <cmisra:template>http://mockup/mock/path?path={{path}}</cmisra:template>
      <cmisra:type>objectbypath</cmisra:type>
      <cmisra:mediatype>application/atom+xml;type=entry</cmisra:mediatype>
    </cmisra:uritemplate>
    <cmisra:uritemplate>
      <cmisra:template>http://mockup/mock/type?id={{id}}</cmisra:template>
      <cmisra:type>typebyid</cmisra:type>
      <cmisra:mediatype>application/atom+xml;type=entry</cmisra:mediatype>
    </cmisra:uritemplate>
    <cmisra:uritemplate>
      <cmisra:template>http://mockup/mock/query?q={{q}}</cmisra:template>
      <cmisra:type>Query</cmisra:type>
      <cmisra:mediatype>application/atom+xml;type=feed</cmisra:mediatype>
    </cmisra:uritemplate>
  </app:workspace>
  <app:workspace>
    <atom:title>other</atom:title>
    <cmisra:repositoryInfo>
      <cmis:repositoryId>other</cmis:repositoryId>
      <cmis:rootFolderId>other-root</cmis:rootFolderId>
    </cmisra:repositoryInfo>
    <app:collection href="http://mockup/other/children">
      <cmisra:collectionType>root</cmisra:collectionType>
    </app:collection>
    <app:collection href="http://mockup/other/types">
      <cmisra:collectionType>types</cmisra:collectionType>
    </app:collection>
    <app:collection href="http://mockup/other/query">
      <cmisra:collectionType>query</cmisra:collectionType>
    </app:collection>
    <cmisra:uritemplate>
      <cmisra:template>http://mockup/other/id?id={{id}}</cmisra:template>
      <cmisra:type>objectbyid</cmisra:type>
    </cmisra:uritemplate>
  </app:workspace>
</app:service>"#,
        ns = namespaces()
    )
}

fn property(kind: &str, id: &str, value: &str) -> String {
    format!(
        r#"<cmis:property{kind} propertyDefinitionId="{id}"><cmis:value>{value}</cmis:value></cmis:property{kind}>"#
    )
}

fn common_properties(id: &str, name: &str, base: &str) -> String {
    [
        property("Id", "cmis:objectId", id),
        property("String", "cmis:name", name),
        property("Id", "cmis:baseTypeId", base),
        property("Id", "cmis:objectTypeId", base),
        property("String", "cmis:createdBy", "admin"),
        property("DateTime", "cmis:creationDate", "2012-01-10T12:00:00.000Z"),
        property("String", "cmis:lastModifiedBy", "admin"),
        property("DateTime", "cmis:lastModificationDate", "2012-01-11T08:30:00.000+01:00"),
        property("String", "cmis:changeToken", "token-1"),
    ]
    .concat()
}

fn link(rel: &str, href: &str, media_type: Option<&str>) -> String {
    match media_type {
        Some(t) => format!(r#"<atom:link rel="{rel}" type="{t}" href="{href}"/>"#),
        None => format!(r#"<atom:link rel="{rel}" href="{href}"/>"#),
    }
}

fn entry(body: &str, links: &[String], properties: &str, actions: &str) -> String {
    format!(
        r#"<atom:entry {ns}>
  <atom:id>urn:uuid:mock</atom:id>
  {body}
  {links}
  <cmisra:object>
    <cmis:properties>{properties}</cmis:properties>
    {actions}
  </cmisra:object>
</atom:entry>"#,
        ns = namespaces(),
        links = links.concat()
    )
}

fn object_links(id: &str) -> Vec<String> {
    vec![
        link("self", &format!("http://mockup/mock/objects/{id}"), None),
        link("edit", &format!("http://mockup/mock/objects/{id}"), None),
        link("up", &format!("http://mockup/mock/parents/{id}"), Some("application/atom+xml;type=feed")),
        link(
            "http://docs.oasis-open.org/ns/cmis/link/200908/allowableactions",
            &format!("http://mockup/mock/actions/{id}"),
            None,
        ),
    ]
}

pub fn folder_entry(id: &str, name: &str, parent_id: &str, path: &str) -> String {
    let mut links = object_links(id);
    links.push(link(
        "down",
        &format!("http://mockup/mock/children/{id}"),
        Some("application/atom+xml;type=feed"),
    ));
    links.push(link(
        "http://docs.oasis-open.org/ns/cmis/link/200908/foldertree",
        &format!("http://mockup/mock/tree/{id}"),
        Some("application/atom+xml;type=feed"),
    ));
    let mut properties = common_properties(id, name, "cmis:folder");
    properties.push_str(&property("String", "cmis:path", path));
    if !parent_id.is_empty() {
        properties.push_str(&property("Id", "cmis:parentId", parent_id));
    }
    entry("", &links, &properties, "")
}

pub fn document_entry(id: &str, name: &str) -> String {
    versioned_entry(id, name, false, true, "1.0")
}

pub fn versioned_entry(id: &str, name: &str, checked_out: bool, latest: bool, label: &str) -> String {
    let mut links = object_links(id);
    links.push(link("edit-media", &format!("http://mockup/mock/content/{id}"), None));
    links.push(link(
        "version-history",
        &format!("http://mockup/mock/versions/{id}"),
        Some("application/atom+xml;type=feed"),
    ));
    let mut properties = common_properties(id, name, "cmis:document");
    properties.push_str(&property("String", "cmis:contentStreamMimeType", "text/plain"));
    properties.push_str(&property("String", "cmis:contentStreamFileName", name));
    properties.push_str(&property("Integer", "cmis:contentStreamLength", "12"));
    properties.push_str(&property("Boolean", "cmis:isLatestVersion", &latest.to_string()));
    properties.push_str(&property("Boolean", "cmis:isMajorVersion", &latest.to_string()));
    properties.push_str(&property("String", "cmis:versionLabel", label));
    properties.push_str(&property("Id", "cmis:versionSeriesId", "series-1"));
    properties.push_str(&property(
        "Boolean",
        "cmis:isVersionSeriesCheckedOut",
        &checked_out.to_string(),
    ));
    let body = format!(r#"<atom:content type="text/plain" src="http://mockup/mock/content/{id}"/>"#);
    let actions = format!(
        "<cmis:allowableActions>\
           <cmis:canGetContentStream>true</cmis:canGetContentStream>\
           <cmis:canCheckOut>{}</cmis:canCheckOut>\
         </cmis:allowableActions>",
        !checked_out
    );
    entry(&body, &links, &properties, &actions)
}

/// Wrap serialized entries into a feed.
pub fn feed(entries: &[String], next: Option<&str>) -> String {
    let inner: Vec<String> = entries
        .iter()
        .map(|e| e.replace(&format!("<atom:entry {}>", namespaces()), "<atom:entry>"))
        .collect();
    let next = next
        .map(|href| link("next", href, Some("application/atom+xml;type=feed")))
        .unwrap_or_default();
    format!(
        r#"<atom:feed {ns}><atom:title>feed</atom:title>{next}{entries}</atom:feed>"#,
        ns = namespaces(),
        entries = inner.concat()
    )
}

pub fn allowable_actions(delete: bool) -> String {
    format!(
        r#"<cmis:allowableActions {ns}>
  <cmis:canDeleteObject>{delete}</cmis:canDeleteObject>
  <cmis:canGetChildren>true</cmis:canGetChildren>
</cmis:allowableActions>"#,
        ns = namespaces()
    )
}

pub fn type_entry(id: &str, parent: Option<&str>, base: &str) -> String {
    let parent = parent
        .map(|p| format!("<cmis:parentId>{p}</cmis:parentId>"))
        .unwrap_or_default();
    format!(
        r#"<atom:entry {ns}>
  <atom:id>urn:type:{id}</atom:id>
  <atom:link rel="down" type="application/atom+xml;type=feed" href="http://mockup/mock/typechildren/{id}"/>
  <cmisra:type>
    <cmis:id>{id}</cmis:id>
    <cmis:localName>{id}</cmis:localName>
    <cmis:displayName>{id}</cmis:displayName>
    <cmis:baseId>{base}</cmis:baseId>
    {parent}
    <cmis:creatable>true</cmis:creatable>
    <cmis:fileable>true</cmis:fileable>
    <cmis:versionable>false</cmis:versionable>
    <cmis:propertyIdDefinition>
      <cmis:id>cmis:objectId</cmis:id>
      <cmis:propertyType>id</cmis:propertyType>
      <cmis:cardinality>single</cmis:cardinality>
    </cmis:propertyIdDefinition>
  </cmisra:type>
</atom:entry>"#,
        ns = namespaces()
    )
}

/// A mock transport serving the service document and the root folder,
/// plus a session connected through it.
pub fn session() -> (MockTransport, AtomSession) {
    let mock = MockTransport::new();
    mock.expect("GET", SERVICE_URL).respond(200, service_document());
    mock.expect("GET", "http://mockup/mock/id?id=root-folder")
        .respond(200, folder_entry("root-folder", "Root", "", "/"));
    let http = HttpSession::new(Arc::new(mock.clone()), "mock-user", "mock-password");
    let session = AtomSession::new(http, SERVICE_URL, "mock").expect("mock session");
    (mock, session)
}
