//! Canned endpoint answers for the integration tests.

#![allow(dead_code)]

use serde_json::json;

use cmis::core::xml::ns;

pub const ATOM_URL: &str = "http://mockup/mock/atom";
/// An endpoint whose URL names no binding.
pub const GENERIC_URL: &str = "http://mockup/cmis";
pub const WSDL_URL: &str = "http://mockup/ws";
pub const REPOSITORY_SERVICE: &str = "http://mockup/ws/services/RepositoryService";
pub const DRIVE_URL: &str = "https://www.googleapis.com/drive/v2";
pub const TOKEN_URL: &str = "https://token/url";
pub const SHAREPOINT_URL: &str = "http://base/_api/Web";

fn atom_namespaces() -> String {
    format!(
        r#"xmlns:app="{}" xmlns:atom="{}" xmlns:cmis="{}" xmlns:cmisra="{}""#,
        ns::APP,
        ns::ATOM,
        ns::CMIS,
        ns::CMISRA
    )
}

fn workspace(id: &str, root: &str) -> String {
    let base = format!("http://mockup/{id}");
    format!(
        r#"<app:workspace>
    <atom:title>{id}</atom:title>
    <cmisra:repositoryInfo>
      <cmis:repositoryId>{id}</cmis:repositoryId>
      <cmis:repositoryName>Repository {id}</cmis:repositoryName>
      <cmis:rootFolderId>{root}</cmis:rootFolderId>
    </cmisra:repositoryInfo>
    <app:collection href="{base}/children/{root}"><cmisra:collectionType>root</cmisra:collectionType></app:collection>
    <app:collection href="{base}/types"><cmisra:collectionType>types</cmisra:collectionType></app:collection>
    <app:collection href="{base}/query"><cmisra:collectionType>query</cmisra:collectionType></app:collection>
    <cmisra:uritemplate><cmisra:template>{base}/id?id={{id}}</cmisra:template><cmisra:type>objectbyid</cmisra:type></cmisra:uritemplate>
    <cmisra:uritemplate><cmisra:template>{base}/path?path={{path}}</cmisra:template><cmisra:type>objectbypath</cmisra:type></cmisra:uritemplate>
    <cmisra:uritemplate><cmisra:template>{base}/type?id={{id}}</cmisra:template><cmisra:type>typebyid</cmisra:type></cmisra:uritemplate>
  </app:workspace>"#
    )
}

/// Service document with the `mock` and `other` repositories.
pub fn service_document() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<app:service {}>
  {}
  {}
</app:service>"#,
        atom_namespaces(),
        workspace("mock", "root-folder"),
        workspace("other", "other-root"),
    )
}

fn property(kind: &str, id: &str, value: &str) -> String {
    format!(
        r#"<cmis:property{kind} propertyDefinitionId="{id}"><cmis:value>{value}</cmis:value></cmis:property{kind}>"#
    )
}

fn atom_entry(id: &str, name: &str, base: &str, extra: &str, links: &str, content: &str) -> String {
    format!(
        r#"<atom:entry {ns}>
  <atom:id>urn:uuid:{id}</atom:id>
  {content}
  <atom:link rel="self" href="http://mockup/mock/objects/{id}"/>
  <atom:link rel="edit" href="http://mockup/mock/objects/{id}"/>
  {links}
  <cmisra:object>
    <cmis:properties>{id_prop}{name_prop}{base_prop}{type_prop}{extra}</cmis:properties>
  </cmisra:object>
</atom:entry>"#,
        ns = atom_namespaces(),
        id_prop = property("Id", "cmis:objectId", id),
        name_prop = property("String", "cmis:name", name),
        base_prop = property("Id", "cmis:baseTypeId", base),
        type_prop = property("Id", "cmis:objectTypeId", base),
    )
}

pub fn atom_folder(id: &str, name: &str, path: &str) -> String {
    let links = format!(
        r#"<atom:link rel="down" type="application/atom+xml;type=feed" href="http://mockup/mock/children/{id}"/>"#
    );
    atom_entry(id, name, "cmis:folder", &property("String", "cmis:path", path), &links, "")
}

pub fn atom_document(id: &str, name: &str) -> String {
    let links = format!(r#"<atom:link rel="edit-media" href="http://mockup/mock/content/{id}"/>"#);
    let content = format!(r#"<atom:content type="text/plain" src="http://mockup/mock/content/{id}"/>"#);
    let extra = [
        property("String", "cmis:contentStreamMimeType", "text/plain"),
        property("String", "cmis:contentStreamFileName", name),
    ]
    .concat();
    atom_entry(id, name, "cmis:document", &extra, &links, &content)
}

pub fn atom_feed(entries: &[String]) -> String {
    let inner: String = entries
        .iter()
        .map(|e| e.replace(&format!("<atom:entry {}>", atom_namespaces()), "<atom:entry>"))
        .collect();
    format!(
        r#"<atom:feed {}><atom:title>children</atom:title>{inner}</atom:feed>"#,
        atom_namespaces()
    )
}

pub fn wsdl() -> String {
    let service = |name: &str| {
        format!(
            r#"<wsdl:service name="{name}"><wsdl:port name="{name}Port" binding="cmisw:{name}PortBinding">
                 <soap:address location="http://mockup/ws/services/{name}"/></wsdl:port></wsdl:service>"#
        )
    };
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<wsdl:definitions xmlns:wsdl="{}" xmlns:soap="{}" xmlns:cmisw="{}" targetNamespace="{}">{}{}{}{}</wsdl:definitions>"#,
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

fn envelope(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soap:Envelope xmlns:soap="{}" xmlns:cmis="{}" xmlns:cmism="{}"><soap:Body>{body}</soap:Body></soap:Envelope>"#,
        ns::SOAP_ENV,
        ns::CMIS,
        ns::CMISM,
    )
}

pub fn ws_repository_info(id: &str, root: &str) -> String {
    envelope(&format!(
        "<cmism:getRepositoryInfoResponse><cmism:repositoryInfo>\
         <cmis:repositoryId>{id}</cmis:repositoryId>\
         <cmis:repositoryName>WS repository</cmis:repositoryName>\
         <cmis:rootFolderId>{root}</cmis:rootFolderId>\
         <cmis:cmisVersionSupported>1.0</cmis:cmisVersionSupported>\
         </cmism:repositoryInfo></cmism:getRepositoryInfoResponse>"
    ))
}

pub fn ws_repositories(entries: &[(&str, &str)]) -> String {
    let body: String = entries
        .iter()
        .map(|(id, name)| {
            format!(
                "<cmism:repositories><cmis:repositoryId>{id}</cmis:repositoryId>\
                 <cmis:repositoryName>{name}</cmis:repositoryName></cmism:repositories>"
            )
        })
        .collect();
    envelope(&format!("<cmism:getRepositoriesResponse>{body}</cmism:getRepositoriesResponse>"))
}

pub fn oauth2_data() -> cmis::OAuth2Data {
    cmis::OAuth2Data {
        auth_url: "https://auth/url".into(),
        token_url: TOKEN_URL.into(),
        scope: "https://scope/url".into(),
        redirect_uri: "redirect:uri".into(),
        client_id: "mock-id".into(),
        client_secret: "mock-secret".into(),
    }
}

pub fn token_response(access_token: &str) -> String {
    json!({
        "access_token": access_token,
        "refresh_token": "mock-refresh-token",
        "token_type": "Bearer",
        "expires_in": 3600
    })
    .to_string()
}

pub fn drive_folder(id: &str, title: &str, parent: &str) -> String {
    json!({
        "kind": "drive#file",
        "id": id,
        "title": title,
        "mimeType": "application/vnd.google-apps.folder",
        "createdDate": "2013-06-03T12:29:40.346Z",
        "modifiedDate": "2013-06-03T12:29:40.346Z",
        "parents": [{"kind": "drive#parentReference", "id": parent, "isRoot": parent == "root"}]
    })
    .to_string()
}

pub fn drive_document(id: &str, title: &str, parent: &str) -> String {
    json!({
        "kind": "drive#file",
        "id": id,
        "title": title,
        "mimeType": "text/plain",
        "fileSize": "11",
        "downloadUrl": format!("https://download/{id}"),
        "createdDate": "2013-06-03T12:29:40.346Z",
        "modifiedDate": "2013-06-04T08:10:00.000Z",
        "parents": [{"kind": "drive#parentReference", "id": parent, "isRoot": parent == "root"}]
    })
    .to_string()
}

pub fn sharepoint_folder_uri(path: &str) -> String {
    format!("{SHAREPOINT_URL}/getFolderByServerRelativeUrl('{path}')")
}

pub fn sharepoint_folder(path: &str) -> String {
    let uri = sharepoint_folder_uri(path);
    let name = path.rsplit('/').next().unwrap_or_default();
    json!({
        "d": {
            "__metadata": {"id": uri, "uri": uri, "type": "SP.Folder"},
            "Files": {"__deferred": {"uri": format!("{uri}/Files")}},
            "Folders": {"__deferred": {"uri": format!("{uri}/Folders")}},
            "Name": name,
            "ServerRelativeUrl": path
        }
    })
    .to_string()
}

pub fn sharepoint_file(path: &str) -> String {
    let uri = format!("{SHAREPOINT_URL}/getFileByServerRelativeUrl('{path}')");
    let name = path.rsplit('/').next().unwrap_or_default();
    json!({
        "d": {
            "__metadata": {"id": uri, "uri": uri, "type": "SP.File"},
            "CheckOutType": 2,
            "Length": "5",
            "MinorVersion": 0,
            "Name": name,
            "ServerRelativeUrl": path,
            "TimeCreated": "2014-07-08T09:29:29Z",
            "TimeLastModified": "2014-07-08T09:30:00Z",
            "UIVersionLabel": "1.0"
        }
    })
    .to_string()
}

/// `d.results` collection of single-resource answers.
pub fn sharepoint_results(items: &[String]) -> String {
    let results: Vec<serde_json::Value> = items
        .iter()
        .filter_map(|item| serde_json::from_str::<serde_json::Value>(item).ok())
        .map(|mut item| item["d"].take())
        .collect();
    json!({ "d": { "results": results } }).to_string()
}

pub fn sharepoint_context_info(digest: &str) -> String {
    json!({
        "d": {
            "GetContextWebInformation": {
                "FormDigestTimeoutSeconds": 1800,
                "FormDigestValue": digest
            }
        }
    })
    .to_string()
}
