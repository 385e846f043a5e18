//! SharePoint session: the web behind `{site}/_api/Web` as one repository.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use log::{debug, info};
use reqwest::Method;
use serde_json::Value;

use cmis_core::object_type::resolve_type;
use cmis_core::{
    CmisError, CmisErrorKind, CmisResult, HttpRequest, HttpResponse, HttpSession, LocalTypes,
    OAuth2Data, OAuth2Handler, ObjectPtr, ObjectType, ReqwestTransport, Repository, Session,
    TypeResolver,
};

use crate::object::object_from_json;
use crate::utils::{quote, results, unwrap_envelope, JsonObject};

pub const REPOSITORY_ID: &str = "SharePoint";
pub const VERBOSE_JSON: &str = "application/json;odata=verbose";

/// Everything SharePoint objects need to reach the API.
pub struct SharePointContext {
    pub http: HttpSession,
    /// The `…/_api/Web` endpoint.
    pub base_url: String,
    digest: RwLock<Option<String>>,
}

impl SharePointContext {
    pub fn new(http: HttpSession, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            digest: RwLock::new(None),
        }
    }

    /// `…/_api`, home of `contextinfo`.
    pub fn api_root(&self) -> String {
        let lower = self.base_url.to_ascii_lowercase();
        match lower.rfind("/_api") {
            Some(at) => format!("{}/_api", &self.base_url[..at]),
            None => format!("{}/_api", self.base_url),
        }
    }

    /// Object ids are resource URIs; relative ones hang off the web.
    pub fn resolve(&self, id: &str) -> String {
        if id.starts_with("http://") || id.starts_with("https://") {
            id.to_string()
        } else {
            format!("{}/{}", self.base_url, id.trim_start_matches('/'))
        }
    }

    pub fn folder_url(&self, path: &str) -> String {
        format!("{}/getFolderByServerRelativeUrl({})", self.base_url, quote(path))
    }

    pub fn file_url(&self, path: &str) -> String {
        format!("{}/getFileByServerRelativeUrl({})", self.base_url, quote(path))
    }

    pub fn root_id(&self) -> String {
        self.folder_url("/")
    }

    pub fn fetch(&self, url: &str) -> CmisResult<JsonObject> {
        unwrap_envelope(self.http.get(url)?.json()?)
            .ok_or_else(|| CmisError::runtime(format!("Unexpected response from {url}")))
    }

    pub fn fetch_results(&self, url: &str) -> CmisResult<Vec<JsonObject>> {
        Ok(results(self.http.get(url)?.json()?))
    }

    /// Form digest required on every modifying request. Fetched once from
    /// `contextinfo` and reused.
    pub fn form_digest(&self) -> CmisResult<String> {
        if let Some(digest) = self
            .digest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return Ok(digest);
        }
        let url = format!("{}/contextinfo", self.api_root());
        let info = unwrap_envelope(self.http.post(&url, Vec::new(), VERBOSE_JSON)?.json()?)
            .unwrap_or_default();
        let digest = info
            .get("GetContextWebInformation")
            .and_then(|i| i.get("FormDigestValue"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| CmisError::runtime(format!("No form digest in the answer of {url}")))?;
        debug!("Got a new form digest from {url}");
        *self.digest.write().unwrap_or_else(PoisonError::into_inner) = Some(digest.clone());
        Ok(digest)
    }

    /// Send a modifying request carrying the form digest.
    pub fn mutate(&self, request: HttpRequest) -> CmisResult<HttpResponse> {
        let request = request.header("X-RequestDigest", self.form_digest()?);
        self.http.send(&request)
    }

    /// POST `body` and return the resource in the answer.
    pub fn post_for_object(&self, url: &str, body: Vec<u8>, content_type: &str) -> CmisResult<JsonObject> {
        let request = HttpRequest::new(Method::POST, url)
            .header("Content-Type", content_type)
            .body(body);
        unwrap_envelope(self.mutate(request)?.json()?)
            .ok_or_else(|| CmisError::runtime(format!("Unexpected response from {url}")))
    }

    /// POST with no body, for the OData service operations.
    pub fn invoke(&self, url: &str) -> CmisResult<()> {
        self.mutate(HttpRequest::new(Method::POST, url))?;
        Ok(())
    }
}

impl TypeResolver for SharePointContext {
    fn get_type(&self, id: &str) -> CmisResult<ObjectType> {
        LocalTypes.get_type(id)
    }

    fn get_type_children(&self, id: &str) -> CmisResult<Vec<ObjectType>> {
        LocalTypes.get_type_children(id)
    }
}

pub struct SharePointSession {
    ctx: Arc<SharePointContext>,
    repository: Repository,
}

impl SharePointSession {
    /// Bind `http` to the web at `base_url` (`https://host/site/_api/Web`).
    ///
    /// OAuth2 settings are optional: without them requests carry the
    /// session credentials.
    pub fn new(http: HttpSession, base_url: &str) -> CmisResult<Self> {
        let http = http.with_header("Accept", VERBOSE_JSON);
        http.authenticate()?;

        let ctx = SharePointContext::new(http, base_url);
        info!("Connected to SharePoint at {}", ctx.base_url);
        let repository = Repository {
            vendor_name: "Microsoft".into(),
            product_name: "SharePoint".into(),
            description: "SharePoint repository".into(),
            ..Repository::fixed(REPOSITORY_ID, "SharePoint", &ctx.root_id())
        };
        Ok(Self {
            ctx: Arc::new(ctx),
            repository,
        })
    }

    pub fn connect(
        base_url: &str,
        username: &str,
        password: &str,
        oauth2: Option<OAuth2Data>,
        no_ssl_check: bool,
    ) -> CmisResult<Self> {
        let transport = ReqwestTransport::new(no_ssl_check, Some(Duration::from_secs(60)))?;
        let mut http = HttpSession::new(Arc::new(transport), username, password);
        if let Some(oauth2) = oauth2 {
            http = http.with_oauth2(OAuth2Handler::new(oauth2));
        }
        Self::new(http, base_url)
    }

    pub fn context(&self) -> &Arc<SharePointContext> {
        &self.ctx
    }

    fn resolver(&self) -> Arc<dyn TypeResolver> {
        self.ctx.clone()
    }
}

impl Session for SharePointSession {
    fn get_repository(&self) -> Repository {
        self.repository.clone()
    }

    fn get_repositories(&self) -> Vec<Repository> {
        vec![self.repository.clone()]
    }

    fn get_object(&self, id: &str) -> CmisResult<ObjectPtr> {
        Ok(object_from_json(&self.ctx, self.ctx.fetch(&self.ctx.resolve(id))?))
    }

    /// Try the path as a folder first, then as a file.
    fn get_object_by_path(&self, path: &str) -> CmisResult<ObjectPtr> {
        match self.ctx.fetch(&self.ctx.folder_url(path)) {
            Ok(json) if json.get("Exists").and_then(Value::as_bool) != Some(false) => {
                return Ok(object_from_json(&self.ctx, json));
            }
            Ok(_) => {}
            Err(e) if e.kind == CmisErrorKind::PermissionDenied => return Err(e),
            Err(e) => debug!("No folder at {path}: {e}"),
        }
        match self.ctx.fetch(&self.ctx.file_url(path)) {
            Ok(json) => Ok(object_from_json(&self.ctx, json)),
            Err(e) if e.kind == CmisErrorKind::PermissionDenied => Err(e),
            Err(e) => Err(CmisError::not_found(format!("No object at path {path}: {}", e.message))),
        }
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
