//! Canned Drive resources shared by the unit tests.

use std::sync::Arc;

use serde_json::json;

use cmis_core::testing::MockTransport;
use cmis_core::{HttpSession, OAuth2Data, OAuth2Handler};

use crate::session::GDriveSession;
use crate::utils::FOLDER_MIME_TYPE;

pub const BASE_URL: &str = "https://base/url";
pub const TOKEN_URL: &str = "https://token/url";
pub const UPLOAD_BASE: &str = crate::session::UPLOAD_URL;

pub fn oauth2_data() -> OAuth2Data {
    OAuth2Data {
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

fn parent_refs(parents: &[&str]) -> serde_json::Value {
    parents
        .iter()
        .map(|id| json!({"kind": "drive#parentReference", "id": id, "isRoot": *id == "root"}))
        .collect()
}

pub fn folder_json(id: &str, title: &str, parents: &[&str]) -> String {
    json!({
        "kind": "drive#file",
        "id": id,
        "title": title,
        "mimeType": FOLDER_MIME_TYPE,
        "editable": true,
        "createdDate": "2013-06-03T12:29:40.346Z",
        "modifiedDate": "2013-06-03T12:29:40.346Z",
        "ownerNames": ["Mock User"],
        "lastModifyingUserName": "Mock User",
        "parents": parent_refs(parents)
    })
    .to_string()
}

pub fn document_json(id: &str, title: &str, mime_type: &str, parents: &[&str]) -> String {
    json!({
        "kind": "drive#file",
        "id": id,
        "title": title,
        "mimeType": mime_type,
        "editable": true,
        "fileSize": "123",
        "downloadUrl": "https://downloadLink",
        "createdDate": "2013-06-03T12:29:40.346Z",
        "modifiedDate": "2013-06-04T08:10:00.000Z",
        "ownerNames": ["Mock User"],
        "lastModifyingUserName": "Mock User",
        "parents": parent_refs(parents)
    })
    .to_string()
}

/// A Google Docs file: no download link, export links only.
pub fn gdoc_json(id: &str, title: &str, mime_type: &str) -> String {
    json!({
        "kind": "drive#file",
        "id": id,
        "title": title,
        "mimeType": mime_type,
        "editable": true,
        "fileSize": "123",
        "exportLinks": {
            "application/pdf": "https://exportLink/pdf",
            "application/vnd.oasis.opendocument.text": "https://exportLink/odt"
        },
        "createdDate": "2013-06-03T12:29:40.346Z",
        "modifiedDate": "2013-06-04T08:10:00.000Z",
        "ownerNames": ["Mock User"],
        "lastModifyingUserName": "Mock User",
        "parents": parent_refs(&["aFolderId"])
    })
    .to_string()
}

/// Session holding a valid token pair, with no request sent yet.
pub fn session() -> (MockTransport, GDriveSession) {
    let mock = MockTransport::new();
    let handler = OAuth2Handler::new(oauth2_data()).with_tokens("mock-access-token", "mock-refresh-token");
    let http = HttpSession::new(Arc::new(mock.clone()), "mock-user", "mock-password").with_oauth2(handler);
    let session = GDriveSession::new(http, BASE_URL).expect("mock Drive session");
    (mock, session)
}
