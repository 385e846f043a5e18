//! OneDrive session: one implicit repository rooted at `me/skydrive`.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use reqwest::Method;
use serde_json::Value;

use cmis_core::object_type::resolve_type;
use cmis_core::{
    encode_component, CmisError, CmisResult, HttpRequest, HttpSession, LocalTypes, OAuth2Data,
    OAuth2Handler, ObjectPtr, ObjectType, ReqwestTransport, Repository, Session, TokenPlacement,
    TypeResolver,
};

use crate::object::{json_id, object_from_json};
use crate::utils::{listed_items, JsonObject};

pub const DEFAULT_BASE_URL: &str = "https://apis.live.net/v5.0";
pub const REPOSITORY_ID: &str = "OneDrive";
pub const ROOT_ID: &str = "me/skydrive";

fn as_object(value: Value, url: &str) -> CmisResult<JsonObject> {
    match value {
        Value::Object(object) => Ok(object),
        _ => Err(CmisError::runtime(format!("Expected a JSON object from {url}"))),
    }
}

pub struct OneDriveContext {
    pub http: HttpSession,
    pub base_url: String,
}

impl OneDriveContext {
    /// Item ids may be paths such as `me/skydrive`; they are used verbatim.
    pub fn object_url(&self, id: &str) -> String {
        format!("{}/{}", self.base_url, id)
    }

    pub fn fetch(&self, id: &str) -> CmisResult<JsonObject> {
        let url = self.object_url(id);
        as_object(self.http.get(&url)?.json()?, &url)
    }

    pub fn send_json(&self, method: Method, url: &str, body: &Value) -> CmisResult<JsonObject> {
        let request = HttpRequest::new(method, url)
            .header("Content-Type", "application/json")
            .body(serde_json::to_vec(body)?);
        as_object(self.http.send(&request)?.json()?, url)
    }

    /// Items directly inside the folder `id`.
    pub fn list_children(&self, id: &str) -> CmisResult<Vec<JsonObject>> {
        let url = format!("{}/files", self.object_url(id));
        Ok(listed_items(self.http.get(&url)?.json()?))
    }

    /// Store `data` as `name` inside `folder_id`, replacing any item of the
    /// same name. Returns the id of the stored file.
    pub fn upload(&self, folder_id: &str, name: &str, data: &[u8]) -> CmisResult<String> {
        let url = format!("{}/files/{}", self.object_url(folder_id), encode_component(name));
        debug!("Uploading {} bytes to {url}", data.len());
        let request = HttpRequest::new(Method::PUT, url.as_str()).body(data.to_vec());
        let stored = as_object(self.http.send(&request)?.json()?, &url)?;
        let id = json_id(&stored);
        if id.is_empty() {
            return Err(CmisError::runtime(format!("Upload to {url} returned no id")));
        }
        Ok(id)
    }
}

impl TypeResolver for OneDriveContext {
    fn get_type(&self, id: &str) -> CmisResult<ObjectType> {
        LocalTypes.get_type(id)
    }

    fn get_type_children(&self, id: &str) -> CmisResult<Vec<ObjectType>> {
        LocalTypes.get_type_children(id)
    }
}

pub struct OneDriveSession {
    ctx: Arc<OneDriveContext>,
    repository: Repository,
}

impl OneDriveSession {
    /// Authenticate `http` and bind it to the API at `base_url`. The token
    /// is always sent as the `access_token` query parameter.
    pub fn new(http: HttpSession, base_url: &str) -> CmisResult<Self> {
        if http.oauth2().is_none() {
            return Err(CmisError::invalid("OneDrive requires OAuth2 settings"));
        }
        let http = http.with_token_placement(TokenPlacement::QueryParameter("access_token".into()));
        http.authenticate()?;

        let base_url = base_url.trim_end_matches('/').to_string();
        info!("Connected to OneDrive at {base_url}");
        let repository = Repository {
            vendor_name: "Microsoft".into(),
            product_name: "OneDrive".into(),
            description: "OneDrive repository".into(),
            ..Repository::fixed(REPOSITORY_ID, "OneDrive", ROOT_ID)
        };
        Ok(Self {
            ctx: Arc::new(OneDriveContext { http, base_url }),
            repository,
        })
    }

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

    pub fn context(&self) -> &Arc<OneDriveContext> {
        &self.ctx
    }

    fn resolver(&self) -> Arc<dyn TypeResolver> {
        self.ctx.clone()
    }
}

impl Session for OneDriveSession {
    fn get_repository(&self) -> Repository {
        self.repository.clone()
    }

    fn get_repositories(&self) -> Vec<Repository> {
        vec![self.repository.clone()]
    }

    fn get_object(&self, id: &str) -> CmisResult<ObjectPtr> {
        Ok(object_from_json(&self.ctx, self.ctx.fetch(id)?))
    }

    /// Walk down from the root, matching item names.
    fn get_object_by_path(&self, path: &str) -> CmisResult<ObjectPtr> {
        let mut current = self.ctx.fetch(ROOT_ID)?;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = self
                .ctx
                .list_children(&json_id(&current))?
                .into_iter()
                .find(|item| item.get("name").and_then(Value::as_str) == Some(segment))
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
