//! Canned WSDL and SOAP answers shared by the unit tests.

use std::sync::Arc;

use cmis_core::testing::MockTransport;
use cmis_core::xml::{ns, XmlElement};
use cmis_core::HttpSession;

use crate::session::WsSession;

pub const WSDL_URL: &str = "http://mockup/ws";
pub const REPOSITORY_URL: &str = "http://mockup/ws/services/RepositoryService";
pub const OBJECT_URL: &str = "http://mockup/ws/services/ObjectService";
pub const NAVIGATION_URL: &str = "http://mockup/ws/services/NavigationService";
pub const VERSIONING_URL: &str = "http://mockup/ws/services/VersioningService";

pub fn wsdl() -> String {
    let service = |name: &str| {
        format!(
            r#"<wsdl:service name="{name}">
                 <wsdl:port name="{name}Port" binding="cmisw:{name}PortBinding">
                   <soap:address location="http://mockup/ws/services/{name}"/>
                 </wsdl:port>
               </wsdl:service>"#
        )
    };
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<wsdl:definitions xmlns:wsdl="{}" xmlns:soap="{}" xmlns:cmisw="{}" targetNamespace="{}">
  {}{}{}{}
</wsdl:definitions>"#,
        ns::WSDL,
        ns::WSDL_SOAP,
        ns::CMISW,
        ns::CMISW,
        service("RepositoryService"),
        service("ObjectService"),
        service("NavigationService"),
        service("VersioningService"),
    )
}

pub fn envelope(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soap:Envelope xmlns:soap="{}" xmlns:cmis="{}" xmlns:cmism="{}"><soap:Body>{body}</soap:Body></soap:Envelope>"#,
        ns::SOAP_ENV,
        ns::CMIS,
        ns::CMISM,
    )
}

pub fn fault(kind: &str, message: &str) -> String {
    envelope(&format!(
        "<soap:Fault><faultcode>soap:Server</faultcode><faultstring>{message}</faultstring>\
         <detail><cmism:cmisFault><cmism:type>{kind}</cmism:type><cmism:code>0</cmism:code>\
         <cmism:message>{message}</cmism:message></cmism:cmisFault></detail></soap:Fault>"
    ))
}

pub fn repository_info(id: &str, root: &str) -> String {
    envelope(&format!(
        "<cmism:getRepositoryInfoResponse><cmism:repositoryInfo>\
         <cmis:repositoryId>{id}</cmis:repositoryId>\
         <cmis:repositoryName>Mock repository</cmis:repositoryName>\
         <cmis:vendorName>Mock vendor</cmis:vendorName>\
         <cmis:rootFolderId>{root}</cmis:rootFolderId>\
         <cmis:capabilities><cmis:capabilityQuery>bothcombined</cmis:capabilityQuery></cmis:capabilities>\
         <cmis:cmisVersionSupported>1.0</cmis:cmisVersionSupported>\
         </cmism:repositoryInfo></cmism:getRepositoryInfoResponse>"
    ))
}

pub fn repositories(entries: &[(&str, &str)]) -> String {
    let body: String = entries
        .iter()
        .map(|(id, name)| {
            format!(
                "<cmism:repositories><cmis:repositoryId>{id}</cmis:repositoryId>\
                 <cmis:repositoryName>{name}</cmis:repositoryName></cmism:repositories>"
            )
        })
        .collect();
    envelope(&format!(
        "<cmism:getRepositoriesResponse>{body}</cmism:getRepositoriesResponse>"
    ))
}

fn property(kind: &str, id: &str, value: &str) -> String {
    format!(
        "<cmis:property{kind} propertyDefinitionId=\"{id}\"><cmis:value>{value}</cmis:value></cmis:property{kind}>"
    )
}

fn actions(names: &[(&str, bool)]) -> String {
    let inner: String = names
        .iter()
        .map(|(name, allowed)| format!("<cmis:can{name}>{allowed}</cmis:can{name}>"))
        .collect();
    format!("<cmis:allowableActions>{inner}</cmis:allowableActions>")
}

fn object(properties: &[String], actions: &str) -> String {
    format!(
        "<cmism:object><cmis:properties>{}</cmis:properties>{actions}</cmism:object>",
        properties.concat()
    )
}

pub fn folder_object(id: &str, name: &str, parent_id: &str, path: &str) -> String {
    let mut properties = vec![
        property("Id", "cmis:objectId", id),
        property("String", "cmis:name", name),
        property("Id", "cmis:baseTypeId", "cmis:folder"),
        property("Id", "cmis:objectTypeId", "cmis:folder"),
        property("String", "cmis:path", path),
        property("String", "cmis:changeToken", &format!("token-{id}")),
    ];
    if !parent_id.is_empty() {
        properties.push(property("Id", "cmis:parentId", parent_id));
    }
    object(
        &properties,
        &actions(&[("GetChildren", true), ("DeleteObject", true), ("CreateDocument", true)]),
    )
}

pub fn document_object(id: &str, name: &str) -> String {
    object(
        &[
            property("Id", "cmis:objectId", id),
            property("String", "cmis:name", name),
            property("Id", "cmis:baseTypeId", "cmis:document"),
            property("Id", "cmis:objectTypeId", "cmis:document"),
            property("String", "cmis:contentStreamMimeType", "text/plain"),
            property("Integer", "cmis:contentStreamLength", "11"),
            property("String", "cmis:changeToken", &format!("token-{id}")),
        ],
        &actions(&[("GetContentStream", true), ("CheckOut", true)]),
    )
}

pub fn versioned_object(
    id: &str,
    name: &str,
    checked_out: bool,
    latest: bool,
    comment: Option<&str>,
) -> String {
    let mut properties = vec![
        property("Id", "cmis:objectId", id),
        property("String", "cmis:name", name),
        property("Id", "cmis:baseTypeId", "cmis:document"),
        property("Id", "cmis:objectTypeId", "cmis:document"),
        property("Boolean", "cmis:isVersionSeriesCheckedOut", &checked_out.to_string()),
        property("Boolean", "cmis:isLatestVersion", &latest.to_string()),
        property("Boolean", "cmis:isMajorVersion", &latest.to_string()),
    ];
    if let Some(comment) = comment {
        properties.push(property("String", "cmis:checkinComment", comment));
    }
    object(&properties, &actions(&[("CheckIn", checked_out)]))
}

pub fn children(objects: &[String], has_more: bool) -> String {
    let entries: String = objects
        .iter()
        .map(|o| format!("<cmism:objects>{o}</cmism:objects>"))
        .collect();
    envelope(&format!(
        "<cmism:getChildrenResponse><cmism:objects>{entries}\
         <cmism:hasMoreItems>{has_more}</cmism:hasMoreItems>\
         </cmism:objects></cmism:getChildrenResponse>"
    ))
}

fn type_definition(element: &str, id: &str, parent: Option<&str>) -> String {
    let base = parent.unwrap_or(id);
    let parent = parent
        .map(|p| format!("<cmis:parentId>{p}</cmis:parentId>"))
        .unwrap_or_default();
    format!(
        "<{element}><cmis:id>{id}</cmis:id><cmis:localName>{id}</cmis:localName>\
         <cmis:displayName>{id}</cmis:displayName><cmis:baseId>{base}</cmis:baseId>{parent}\
         <cmis:creatable>true</cmis:creatable><cmis:fileable>true</cmis:fileable>\
         </{element}>"
    )
}

pub fn mock_type(mock: &MockTransport, id: &str, parent: Option<&str>) {
    mock.expect("POST", REPOSITORY_URL)
        .with_body_containing("<cmism:getTypeDefinition>")
        .with_body_containing(format!("<cmism:typeId>{id}</cmism:typeId>"))
        .respond(
            200,
            envelope(&format!(
                "<cmism:getTypeDefinitionResponse>{}</cmism:getTypeDefinitionResponse>",
                type_definition("cmism:type", id, parent)
            )),
        );
}

pub fn type_children(types: &[(&str, Option<&str>)]) -> String {
    let entries: String = types
        .iter()
        .map(|(id, parent)| type_definition("cmis:types", id, *parent))
        .collect();
    envelope(&format!(
        "<cmism:getTypeChildrenResponse><cmism:types>{entries}\
         <cmis:hasMoreItems>false</cmis:hasMoreItems></cmism:types></cmism:getTypeChildrenResponse>"
    ))
}

/// Serve an object from `getObject`, keyed by its `cmis:objectId`.
pub fn mock_object(mock: &MockTransport, object: &str) {
    let parsed = XmlElement::parse(&envelope(object)).expect("fixture object");
    let id = parsed
        .descendants(ns::CMIS, "propertyId")
        .into_iter()
        .find(|p| p.attr("propertyDefinitionId") == Some("cmis:objectId"))
        .and_then(|p| p.child_text(ns::CMIS, "value"))
        .expect("fixture object id");
    mock.expect("POST", OBJECT_URL)
        .with_body_containing("<cmism:getObject>")
        .with_body_containing(format!("<cmism:objectId>{id}</cmism:objectId>"))
        .respond(
            200,
            envelope(&format!("<cmism:getObjectResponse>{object}</cmism:getObjectResponse>")),
        );
}

/// WSDL at the binding URL and repository info of `A1`.
pub fn mock_discovery(mock: &MockTransport) {
    mock.expect("GET", WSDL_URL).respond(200, wsdl());
    mock.expect("POST", REPOSITORY_URL)
        .with_body_containing("<cmism:getRepositoryInfo>")
        .with_body_containing("<cmism:repositoryId>A1</cmism:repositoryId>")
        .respond(200, repository_info("A1", "100"));
}

pub fn session() -> (MockTransport, WsSession) {
    let mock = MockTransport::new();
    mock_discovery(&mock);
    let http = HttpSession::new(Arc::new(mock.clone()), "tester", "test");
    let session = WsSession::new(http, WSDL_URL, "A1").expect("mock WS session");
    (mock, session)
}
