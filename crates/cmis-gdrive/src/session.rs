//! Drive session: a fixed repository over the Files API.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use reqwest::Method;
use serde_json::Value;

use cmis_core::object_type::resolve_type;
use cmis_core::{
    encode_component, CmisError, CmisResult, HttpRequest, HttpSession, LocalTypes, OAuth2Data,
    OAuth2Handler, ObjectPtr, ObjectType, ReqwestTransport, Repository, Session, TypeResolver,
};

use crate::object::object_from_json;
use crate::utils::{item_ids, JsonObject};

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/drive/v2";
/// Media uploads go to a separate host path, not under the API base.
pub const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v2/files/";

pub const REPOSITORY_ID: &str = "GoogleDrive";
pub const ROOT_ID: &str = "root";

/// Upload endpoint matching an API base, the public one otherwise.
fn upload_url_for(base_url: &str) -> String {
    match base_url.find("/drive/v2") {
        Some(at) => format!("{}/upload{}/files/", &base_url[..at], &base_url[at..]),
        None => UPLOAD_URL.to_string(),
    }
}

fn as_object(value: Value, url: &str) -> CmisResult<JsonObject> {
    match value {
        Value::Object(object) => Ok(object),
        _ => Err(CmisError::runtime(format!("Expected a JSON object from {url}"))),
    }
}

/// Everything Drive objects need to reach the API.
pub struct GDriveContext {
    pub http: HttpSession,
    pub base_url: String,
    pub upload_url: String,
}

impl GDriveContext {
    pub fn file_url(&self, id: &str) -> String {
        format!("{}/files/{}", self.base_url, encode_component(id))
    }

    pub fn files_url(&self) -> String {
        format!("{}/files", self.base_url)
    }

    pub fn get_json(&self, url: &str) -> CmisResult<Value> {
        self.http.get(url)?.json()
    }

    /// File resource of `id`.
    pub fn fetch(&self, id: &str) -> CmisResult<JsonObject> {
        let url = self.file_url(id);
        as_object(self.get_json(&url)?, &url)
    }

    /// Send a JSON body and return the file resource the API answers with.
    pub fn send_json(&self, method: Method, url: &str, body: &Value) -> CmisResult<JsonObject> {
        let request = HttpRequest::new(method, url)
            .header("Content-Type", "application/json")
            .body(serde_json::to_vec(body)?);
        as_object(self.http.send(&request)?.json()?, url)
    }

    /// Fetch the file resource of every id listed by a `children` or
    /// `parents` collection.
    pub fn fetch_listed(&self, list_url: &str) -> CmisResult<Vec<JsonObject>> {
        let list = self.get_json(list_url)?;
        item_ids(&list).iter().map(|id| self.fetch(id)).collect()
    }

    /// Child of `parent_id` titled `title`, ignoring trashed files.
    pub fn find_child(&self, parent_id: &str, title: &str) -> CmisResult<Option<JsonObject>> {
        let query = format!(
            "'{}' in parents and title = '{}' and trashed = false",
            parent_id.replace('\'', "\\'"),
            title.replace('\'', "\\'")
        );
        let url = url::Url::parse_with_params(&self.files_url(), &[("q", query.as_str())])?;
        let list = self.get_json(url.as_str())?;
        let first = list
            .get("items")
            .and_then(Value::as_array)
            .and_then(|items| items.first())
            .cloned();
        first.map(|item| as_object(item, url.as_str())).transpose()
    }

    /// Replace the binary content of `id`. Google Docs formats are uploaded
    /// with conversion so Drive keeps them editable.
    pub fn upload(&self, id: &str, data: &[u8], content_type: &str, convert: bool) -> CmisResult<()> {
        let mut url = format!("{}{}?uploadType=media", self.upload_url, encode_component(id));
        if convert {
            url.push_str("&convert=true");
        }
        debug!("Uploading {} bytes to Drive file {id}", data.len());
        let request = HttpRequest::new(Method::PUT, url)
            .header("Content-Type", content_type)
            .body(data.to_vec());
        self.http.send(&request)?;
        Ok(())
    }
}

impl TypeResolver for GDriveContext {
    fn get_type(&self, id: &str) -> CmisResult<ObjectType> {
        LocalTypes.get_type(id)
    }

    fn get_type_children(&self, id: &str) -> CmisResult<Vec<ObjectType>> {
        LocalTypes.get_type_children(id)
    }
}

pub struct GDriveSession {
    ctx: Arc<GDriveContext>,
    repository: Repository,
}

impl GDriveSession {
    /// Authenticate `http` and bind it to the API at `base_url`.
    pub fn new(http: HttpSession, base_url: &str) -> CmisResult<Self> {
        if http.oauth2().is_none() {
            return Err(CmisError::invalid("Google Drive requires OAuth2 settings"));
        }
        http.authenticate()?;

        let base_url = base_url.trim_end_matches('/').to_string();
        info!("Connected to Google Drive at {base_url}");
        let repository = Repository {
            vendor_name: "Google".into(),
            product_name: "Google Drive".into(),
            description: "Google Drive repository".into(),
            ..Repository::fixed(REPOSITORY_ID, "Google Drive", ROOT_ID)
        };
        Ok(Self {
            ctx: Arc::new(GDriveContext {
                http,
                upload_url: upload_url_for(&base_url),
                base_url,
            }),
            repository,
        })
    }

    /// Connect over HTTP, running the OAuth2 authorization with the given
    /// credentials.
    pub fn connect(
        base_url: &str,
        username: &str,
        password: &str,
        oauth2: OAuth2Data,
        no_ssl_check: bool,
    ) -> CmisResult<Self> {
        let transport = ReqwestTransport::new(no_ssl_check, Some(Duration::from_secs(60)))?;
        let http = HttpSession::new(Arc::new(transport), username, password)
            .with_oauth2(OAuth2Handler::new(oauth2));
        Self::new(http, base_url)
    }

    pub fn context(&self) -> &Arc<GDriveContext> {
        &self.ctx
    }

    pub fn base_url(&self) -> &str {
        &self.ctx.base_url
    }

    fn resolver(&self) -> Arc<dyn TypeResolver> {
        self.ctx.clone()
    }
}

impl Session for GDriveSession {
    fn get_repository(&self) -> Repository {
        self.repository.clone()
    }

    fn get_repositories(&self) -> Vec<Repository> {
        vec![self.repository.clone()]
    }

    fn get_object(&self, id: &str) -> CmisResult<ObjectPtr> {
        Ok(object_from_json(&self.ctx, self.ctx.fetch(id)?))
    }

    /// Drive has no paths: walk down from the root matching titles.
    fn get_object_by_path(&self, path: &str) -> CmisResult<ObjectPtr> {
        let mut current = self.ctx.fetch(ROOT_ID)?;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let parent_id = current
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or(ROOT_ID)
                .to_string();
            current = self
                .ctx
                .find_child(&parent_id, segment)?
                .ok_or_else(|| CmisError::not_found(format!("No object at path {path}")))?;
        }
        Ok(object_from_json(&self.ctx, current))
    }

    fn get_type(&self, id: &str) -> CmisResult<ObjectType> {
        resolve_type(&self.resolver(), id)
    }

    fn get_base_types(&self) -> CmisResult<Vec<ObjectType>> {
        let resolver = self.resolver();
        LocalTypes::BASES
            .iter()
            .map(|base| resolve_type(&resolver, base.id()))
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
