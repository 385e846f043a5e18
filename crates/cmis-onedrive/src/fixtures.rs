//! Canned OneDrive items shared by the unit tests.

use std::sync::Arc;

use serde_json::{json, Value};

use cmis_core::testing::MockTransport;
use cmis_core::{HttpSession, OAuth2Data, OAuth2Handler};

use crate::session::OneDriveSession;

pub const BASE_URL: &str = "https://base/url";
pub const TOKEN_URL: &str = "https://token/url";

pub fn oauth2_data() -> OAuth2Data {
    OAuth2Data {
        auth_url: "https://auth/url".into(),
        token_url: TOKEN_URL.into(),
        scope: "wl.skydrive_update".into(),
        redirect_uri: "redirect:uri".into(),
        client_id: "mock-id".into(),
        client_secret: "mock-secret".into(),
    }
}

pub fn token_response(access_token: &str) -> String {
    json!({
        "access_token": access_token,
        "refresh_token": "mock-refresh-token",
        "token_type": "bearer",
        "expires_in": 3600
    })
    .to_string()
}

pub fn file_json(id: &str, name: &str, parent_id: &str) -> String {
    json!({
        "id": id,
        "from": {"name": "onedriveUser", "id": "12345"},
        "name": name,
        "description": null,
        "parent_id": parent_id,
        "size": 123,
        "source": format!("https://source/{id}"),
        "type": "file",
        "created_time": "2014-06-09T08:41:45+0000",
        "updated_time": "2014-06-10T10:12:01+0000",
        "updated_by": {"name": "onedriveUser", "id": "12345"}
    })
    .to_string()
}

pub fn folder_json(id: &str, name: &str, parent_id: Option<&str>) -> String {
    json!({
        "id": id,
        "from": {"name": "onedriveUser", "id": "12345"},
        "name": name,
        "description": "",
        "parent_id": parent_id,
        "count": 2,
        "type": "folder",
        "created_time": "2014-06-09T08:41:45+0000",
        "updated_time": "2014-06-09T08:41:45+0000"
    })
    .to_string()
}

/// A `{"data": [...]}` listing of the given item documents.
pub fn listing(items: &[String]) -> String {
    let data: Vec<Value> = items
        .iter()
        .filter_map(|item| serde_json::from_str(item).ok())
        .collect();
    json!({ "data": data }).to_string()
}

/// Session holding a valid token pair, with no request sent yet.
pub fn session() -> (MockTransport, OneDriveSession) {
    let mock = MockTransport::new();
    let handler = OAuth2Handler::new(oauth2_data()).with_tokens("mock-access-token", "mock-refresh-token");
    let http = HttpSession::new(Arc::new(mock.clone()), "mock-user", "mock-password").with_oauth2(handler);
    let session = OneDriveSession::new(http, BASE_URL).expect("mock OneDrive session");
    (mock, session)
}
