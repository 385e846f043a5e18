//! Canned SharePoint resources shared by the unit tests.

use std::sync::Arc;

use serde_json::{json, Value};

use cmis_core::testing::MockTransport;
use cmis_core::HttpSession;

use crate::session::SharePointSession;
use crate::utils::quote;

pub const BASE_URL: &str = "http://base/_api/Web";
pub const CONTEXT_INFO_URL: &str = "http://base/_api/contextinfo";

fn name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or_default()
}

pub fn folder_uri(path: &str) -> String {
    format!("{BASE_URL}/getFolderByServerRelativeUrl({})", quote(path))
}

pub fn file_uri(path: &str) -> String {
    format!("{BASE_URL}/getFileByServerRelativeUrl({})", quote(path))
}

fn deferred(uri: String) -> Value {
    json!({ "__deferred": { "uri": uri } })
}

pub fn folder_json(path: &str) -> String {
    let uri = folder_uri(path);
    json!({
        "d": {
            "__metadata": {"id": uri, "uri": uri, "type": "SP.Folder"},
            "Files": deferred(format!("{uri}/Files")),
            "Folders": deferred(format!("{uri}/Folders")),
            "ParentFolder": deferred(format!("{uri}/ParentFolder")),
            "ItemCount": 2,
            "Name": name_of(path),
            "ServerRelativeUrl": path,
            "WelcomePage": ""
        }
    })
    .to_string()
}

fn file_object(path: &str, check_out_type: i64) -> Value {
    let uri = file_uri(path);
    json!({
        "__metadata": {"id": uri, "uri": uri, "type": "SP.File"},
        "Author": deferred(format!("{uri}/Author")),
        "Versions": deferred(format!("{uri}/Versions")),
        "CheckInComment": "",
        "CheckOutType": check_out_type,
        "ContentTag": "{1},2,3",
        "ETag": "\"{1},2\"",
        "Exists": true,
        "Length": "123",
        "Level": 1,
        "MajorVersion": 1,
        "MinorVersion": 0,
        "Name": name_of(path),
        "ServerRelativeUrl": path,
        "TimeCreated": "2014-07-08T09:29:29Z",
        "TimeLastModified": "2014-07-08T09:30:00Z",
        "Title": null,
        "UIVersion": 512,
        "UIVersionLabel": "1.0"
    })
}

pub fn file_json(path: &str) -> String {
    json!({ "d": file_object(path, 2) }).to_string()
}

/// The same file, checked out online by the current user.
pub fn checked_out_file_json(path: &str) -> String {
    json!({ "d": file_object(path, 0) }).to_string()
}

/// `d.results` collection of the given single-resource responses.
pub fn results(items: &[String]) -> String {
    let results: Vec<Value> = items
        .iter()
        .filter_map(|item| serde_json::from_str::<Value>(item).ok())
        .map(|mut item| item["d"].take())
        .collect();
    json!({ "d": { "results": results } }).to_string()
}

/// Earlier versions of the file `uri`, oldest first.
pub fn versions(uri: &str, labels: &[&str]) -> String {
    let results: Vec<Value> = labels
        .iter()
        .enumerate()
        .map(|(index, label)| {
            let version_uri = format!("{uri}/Versions({})", index + 1);
            json!({
                "__metadata": {"id": version_uri, "uri": version_uri, "type": "SP.FileVersion"},
                "CheckInComment": format!("version {label}"),
                "Created": "2014-07-01T10:00:00Z",
                "ID": index + 1,
                "IsCurrentVersion": false,
                "Size": 42,
                "Url": format!("_vti_history/{}/Docs/report.txt", index + 1),
                "VersionLabel": label
            })
        })
        .collect();
    json!({ "d": { "results": results } }).to_string()
}

pub fn context_info(digest: &str) -> String {
    json!({
        "d": {
            "GetContextWebInformation": {
                "__metadata": {"type": "SP.ContextWebInformation"},
                "FormDigestTimeoutSeconds": 1800,
                "FormDigestValue": digest,
                "LibraryVersion": "15.0.4420.1017",
                "SiteFullUrl": "http://base",
                "WebFullUrl": "http://base"
            }
        }
    })
    .to_string()
}

/// Session authenticating with Basic credentials, with no request sent yet.
pub fn session() -> (MockTransport, SharePointSession) {
    let mock = MockTransport::new();
    let http = HttpSession::new(Arc::new(mock.clone()), "mock-user", "mock-password");
    let session = SharePointSession::new(http, BASE_URL).expect("mock SharePoint session");
    (mock, session)
}
