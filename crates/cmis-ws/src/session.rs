//! WS session: WSDL discovery and repository binding.

use std::sync::Arc;
use std::time::Duration;

use log::info;

use cmis_core::object_type::resolve_type;
use cmis_core::{
    CmisError, CmisResult, HttpSession, ObjectPtr, ObjectType, ReqwestTransport, Repository,
    Session, TypeResolver,
};

use crate::object::object_from_data;
use crate::services::WsContext;
use crate::soap::SoapClient;
use crate::wsdl::{fetch_wsdl, ServiceMap};

pub struct WsSession {
    ctx: Arc<WsContext>,
    binding_url: String,
    repositories: Vec<Repository>,
}

fn discover(http: HttpSession, binding_url: &str) -> CmisResult<(SoapClient, ServiceMap)> {
    http.authenticate()?;
    let wsdl = fetch_wsdl(&http, binding_url)?;
    let services = ServiceMap::from_wsdl(&wsdl);
    if services.is_empty() {
        return Err(CmisError::runtime(format!(
            "The WSDL at {binding_url} declares no service"
        )));
    }
    Ok((SoapClient::new(http), services))
}

impl WsSession {
    /// Bind to `repository_id` behind the WSDL at `binding_url`. An empty id
    /// selects the first repository the server lists.
    pub fn new(http: HttpSession, binding_url: &str, repository_id: &str) -> CmisResult<Self> {
        let (soap, services) = discover(http, binding_url)?;

        let (listed, id) = if repository_id.is_empty() {
            let listed = WsContext::get_repositories(&soap, &services)?;
            let first = listed
                .first()
                .map(|r| r.id.clone())
                .ok_or_else(|| CmisError::invalid(format!("No repository at {binding_url}")))?;
            (listed, first)
        } else {
            (Vec::new(), repository_id.to_string())
        };

        let repository = WsContext::get_repository_info(&soap, &services, &id)?;
        info!("Connected to WS repository {}", repository.id);

        let repositories = if listed.is_empty() {
            vec![repository.clone()]
        } else {
            listed
                .into_iter()
                .map(|r| if r.id == repository.id { repository.clone() } else { r })
                .collect()
        };

        Ok(Self {
            ctx: Arc::new(WsContext {
                soap,
                services,
                repository,
            }),
            binding_url: binding_url.to_string(),
            repositories,
        })
    }

    /// Connect over HTTP; credentials go both in the WS-Security header and
    /// as Basic authentication.
    pub fn connect(
        binding_url: &str,
        repository_id: &str,
        username: &str,
        password: &str,
        no_ssl_check: bool,
    ) -> CmisResult<Self> {
        let transport = ReqwestTransport::new(no_ssl_check, Some(Duration::from_secs(60)))?;
        let http = HttpSession::new(Arc::new(transport), username, password);
        Self::new(http, binding_url, repository_id)
    }

    /// Every repository listed by the RepositoryService, ids and names only.
    pub fn get_repositories(http: HttpSession, binding_url: &str) -> CmisResult<Vec<Repository>> {
        let (soap, services) = discover(http, binding_url)?;
        WsContext::get_repositories(&soap, &services)
    }

    pub fn binding_url(&self) -> &str {
        &self.binding_url
    }

    pub fn context(&self) -> &Arc<WsContext> {
        &self.ctx
    }

    pub fn service_url(&self, name: &str) -> Option<&str> {
        self.ctx.services.get(name)
    }

    fn resolver(&self) -> Arc<dyn TypeResolver> {
        self.ctx.clone()
    }
}

impl Session for WsSession {
    fn get_repository(&self) -> Repository {
        self.ctx.repository.clone()
    }

    fn get_repositories(&self) -> Vec<Repository> {
        self.repositories.clone()
    }

    fn get_object(&self, id: &str) -> CmisResult<ObjectPtr> {
        let data = self.ctx.get_object(id)?;
        Ok(object_from_data(&self.ctx, data))
    }

    fn get_object_by_path(&self, path: &str) -> CmisResult<ObjectPtr> {
        let data = self.ctx.get_object_by_path(path)?;
        Ok(object_from_data(&self.ctx, data))
    }

    fn get_type(&self, id: &str) -> CmisResult<ObjectType> {
        resolve_type(&self.resolver(), id)
    }

    fn get_base_types(&self) -> CmisResult<Vec<ObjectType>> {
        let resolver = self.resolver();
        Ok(self
            .ctx
            .type_children(None)?
            .into_iter()
            .map(|t| t.with_resolver(resolver.clone()))
            .collect())
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
