//! AtomPub session: service document discovery and id/path lookups.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};

use cmis_core::object_type::resolve_type;
use cmis_core::xml::ns;
use cmis_core::{
    CmisError, CmisResult, HttpSession, ObjectPtr, ObjectType, ReqwestTransport, Repository,
    Session, TypeResolver,
};

use crate::object::{object_from_entry, type_from_entry, AtomContext};
use crate::uri_template::UriTemplate;
use crate::workspace::{parse_service_document, AtomWorkspace, Collection, UriTemplateKind};

pub struct AtomSession {
    ctx: Arc<AtomContext>,
    binding_url: String,
    repositories: Vec<Repository>,
}

fn fetch_workspaces(http: &HttpSession, binding_url: &str) -> CmisResult<Vec<AtomWorkspace>> {
    http.authenticate()?;
    debug!("Fetching AtomPub service document {binding_url}");
    let document = http.get(binding_url)?.xml()?;
    parse_service_document(&document)
}

impl AtomSession {
    /// Discover the repository `repository_id` at `binding_url`. An empty id
    /// selects the first workspace.
    pub fn new(http: HttpSession, binding_url: &str, repository_id: &str) -> CmisResult<Self> {
        let workspaces = Self::discover(&http, binding_url)?;
        Self::with_workspaces(http, binding_url, workspaces, repository_id)
    }

    /// Read the service document at `binding_url`. Fails unless the
    /// endpoint answers with an AtomPub service document.
    pub fn discover(http: &HttpSession, binding_url: &str) -> CmisResult<Vec<AtomWorkspace>> {
        fetch_workspaces(http, binding_url)
    }

    /// Bind to `repository_id` among already discovered `workspaces`.
    pub fn with_workspaces(
        http: HttpSession,
        binding_url: &str,
        workspaces: Vec<AtomWorkspace>,
        repository_id: &str,
    ) -> CmisResult<Self> {
        let repositories: Vec<Repository> =
            workspaces.iter().map(|w| w.repository.clone()).collect();

        let workspace = if repository_id.is_empty() {
            workspaces.into_iter().next()
        } else {
            workspaces.into_iter().find(|w| w.id() == repository_id)
        }
        .ok_or_else(|| {
            CmisError::not_found(format!("No repository '{repository_id}' at {binding_url}"))
        })?;
        workspace.validate()?;
        info!("Connected to AtomPub repository {}", workspace.id());

        Ok(Self {
            ctx: Arc::new(AtomContext { http, workspace }),
            binding_url: binding_url.to_string(),
            repositories,
        })
    }

    /// Connect over HTTP with Basic credentials.
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

    /// Every repository advertised by the service document.
    pub fn get_repositories(http: &HttpSession, binding_url: &str) -> CmisResult<Vec<Repository>> {
        Ok(fetch_workspaces(http, binding_url)?
            .into_iter()
            .map(|w| w.repository)
            .collect())
    }

    pub fn binding_url(&self) -> &str {
        &self.binding_url
    }

    pub fn workspace(&self) -> &AtomWorkspace {
        &self.ctx.workspace
    }

    pub fn collection_url(&self, collection: Collection) -> Option<&str> {
        self.ctx.workspace.collection_url(collection)
    }

    pub fn uri_template(&self, kind: UriTemplateKind) -> Option<&UriTemplate> {
        self.ctx.workspace.uri_template(kind)
    }

    pub fn root_id(&self) -> &str {
        self.ctx.workspace.root_id()
    }

    fn resolver(&self) -> Arc<dyn TypeResolver> {
        self.ctx.clone()
    }
}

impl Session for AtomSession {
    fn get_repository(&self) -> Repository {
        self.ctx.workspace.repository.clone()
    }

    fn get_repositories(&self) -> Vec<Repository> {
        self.repositories.clone()
    }

    fn get_object(&self, id: &str) -> CmisResult<ObjectPtr> {
        let entry = self.ctx.fetch_entry(&self.ctx.object_url(id)?)?;
        Ok(object_from_entry(&self.ctx, entry))
    }

    fn get_object_by_path(&self, path: &str) -> CmisResult<ObjectPtr> {
        let url = self
            .ctx
            .workspace
            .require_template(UriTemplateKind::ObjectByPath)?
            .create_url(&[("path", path)]);
        let entry = self.ctx.fetch_entry(&url)?;
        Ok(object_from_entry(&self.ctx, entry))
    }

    fn get_type(&self, id: &str) -> CmisResult<ObjectType> {
        resolve_type(&self.resolver(), id)
    }

    fn get_base_types(&self) -> CmisResult<Vec<ObjectType>> {
        let url = self.ctx.workspace.require_collection(Collection::Types)?;
        let feed = self.ctx.http.get(url)?.xml()?;
        let resolver = self.resolver();
        feed.children_named(ns::ATOM, "entry")
            .map(|entry| Ok(type_from_entry(entry)?.with_resolver(resolver.clone())))
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, SERVICE_URL};
    use cmis_core::testing::MockTransport;
    use cmis_core::{BaseType, CmisErrorKind, OAuth2Data, OAuth2Handler, StaticCodeFlow};

    fn http(mock: &MockTransport, user: &str, password: &str) -> HttpSession {
        HttpSession::new(Arc::new(mock.clone()), user, password)
    }

    #[test]
    fn discovery_reads_collections_templates_and_root() {
        let (mock, session) = fixtures::session();
        for collection in [
            Collection::Root,
            Collection::Types,
            Collection::Query,
            Collection::CheckedOut,
            Collection::Unfiled,
        ] {
            assert!(session.collection_url(collection).is_some(), "{collection:?}");
        }
        for kind in [
            UriTemplateKind::ObjectById,
            UriTemplateKind::ObjectByPath,
            UriTemplateKind::TypeById,
            UriTemplateKind::Query,
        ] {
            assert!(session.uri_template(kind).is_some(), "{kind:?}");
        }
        assert_eq!(session.root_id(), "root-folder");
        assert_eq!(session.get_repository().name, "Mock repository");
        assert!(session.get_repository().is_queryable());
        assert_eq!(session.get_repositories().len(), 2);
        // Discovery is a single round trip.
        assert_eq!(mock.requests().len(), 1);
    }

    #[test]
    fn repositories_lists_every_workspace() {
        let mock = MockTransport::new();
        mock.expect("GET", SERVICE_URL).respond(200, fixtures::service_document());
        let repos = AtomSession::get_repositories(&http(&mock, "u", "p"), SERVICE_URL).unwrap();
        let ids: Vec<&str> = repos.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["mock", "other"]);
    }

    #[test]
    fn empty_repository_id_picks_first_workspace() {
        let mock = MockTransport::new();
        mock.expect("GET", SERVICE_URL).respond(200, fixtures::service_document());
        let session = AtomSession::new(http(&mock, "u", "p"), SERVICE_URL, "").unwrap();
        assert_eq!(session.get_repository().id, "mock");
    }

    #[test]
    fn unknown_repository_is_not_found() {
        let mock = MockTransport::new();
        mock.expect("GET", SERVICE_URL).respond(200, fixtures::service_document());
        let err = AtomSession::new(http(&mock, "u", "p"), SERVICE_URL, "nope")
            .err()
            .unwrap();
        assert_eq!(err.kind, CmisErrorKind::ObjectNotFound);
        assert!(err.message.contains("'nope'"));
    }

    #[test]
    fn oauth2_code_is_exchanged_before_discovery() {
        let mock = MockTransport::new();
        mock.expect("POST", "https://auth/token").respond(
            200,
            r#"{"access_token":"atom-token","refresh_token":"r","token_type":"Bearer","expires_in":3600}"#,
        );
        mock.expect("GET", SERVICE_URL).respond(200, fixtures::service_document());
        let handler = OAuth2Handler::new(OAuth2Data {
            auth_url: "https://auth/authorize".into(),
            token_url: "https://auth/token".into(),
            scope: "Scope".into(),
            redirect_uri: "redirect".into(),
            client_id: "mock-id".into(),
            client_secret: "mock-secret".into(),
        })
        .with_flow(Box::new(StaticCodeFlow::new("atom-code")));
        let http = http(&mock, "u", "p").with_oauth2(handler);

        AtomSession::new(http, SERVICE_URL, "mock").unwrap();
        let sent = mock.requests();
        assert!(sent[0].body_text().contains("code=atom-code"));
        assert_eq!(sent[1].header_value("Authorization"), Some("Bearer atom-token"));
    }

    #[test]
    fn bad_credentials_are_permission_denied() {
        let mock = MockTransport::new();
        mock.expect("GET", SERVICE_URL).respond(401, "Unauthorized");
        let err = AtomSession::new(http(&mock, "bad", "bad"), SERVICE_URL, "mock")
            .err()
            .unwrap();
        assert_eq!(err.kind, CmisErrorKind::PermissionDenied);
    }

    #[test]
    fn invalid_service_document_is_runtime_error() {
        let mock = MockTransport::new();
        mock.expect("GET", SERVICE_URL).respond(200, "<html><body>Login</body></html>");
        let err = AtomSession::new(http(&mock, "u", "p"), SERVICE_URL, "mock")
            .err()
            .unwrap();
        assert_eq!(err.kind, CmisErrorKind::Runtime);
    }

    #[test]
    fn object_by_path_uses_template() {
        let (mock, session) = fixtures::session();
        mock.expect("GET", "http://mockup/mock/path?path=%2FChild")
            .respond(200, fixtures::folder_entry("child-folder", "Child", "root-folder", "/Child"));
        let object = session.get_object_by_path("/Child").unwrap();
        assert_eq!(object.id(), "child-folder");
        assert!(object.as_folder().is_some());
    }

    #[test]
    fn types_resolve_parents_lazily() {
        let (mock, session) = fixtures::session();
        mock.expect("GET", "http://mockup/mock/type?id=cmis%3Afolder")
            .respond(200, fixtures::type_entry("cmis:folder", None, "cmis:folder"));
        mock.expect("GET", "http://mockup/mock/type?id=custom%3Afolder")
            .respond(200, fixtures::type_entry("custom:folder", Some("cmis:folder"), "cmis:folder"));
        mock.expect("GET", "http://mockup/mock/typechildren/cmis:folder").respond(
            200,
            fixtures::feed(
                &[fixtures::type_entry("custom:folder", Some("cmis:folder"), "cmis:folder")],
                None,
            ),
        );

        let custom = session.get_type("custom:folder").unwrap();
        assert_eq!(custom.base(), Some(BaseType::Folder));
        let before = mock.requests().len();
        let parent = custom.parent_type().unwrap().unwrap();
        assert_eq!(parent.id, "cmis:folder");
        assert_eq!(mock.requests().len(), before + 1);
        assert!(parent.parent_type().unwrap().is_none());

        let children = parent.children().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, "custom:folder");
    }

    #[test]
    fn base_types_from_types_collection() {
        let (mock, session) = fixtures::session();
        mock.expect("GET", "http://mockup/mock/types").respond(
            200,
            fixtures::feed(
                &[
                    fixtures::type_entry("cmis:document", None, "cmis:document"),
                    fixtures::type_entry("cmis:folder", None, "cmis:folder"),
                ],
                None,
            ),
        );
        let types = session.get_base_types().unwrap();
        assert_eq!(types.len(), 2);
        assert_eq!(types[0].base_type().unwrap().id, "cmis:document");
    }

    #[test]
    fn object_type_description_is_cached() {
        let (mock, session) = fixtures::session();
        mock.expect("GET", "http://mockup/mock/type?id=cmis%3Afolder")
            .respond(200, fixtures::type_entry("cmis:folder", None, "cmis:folder"));
        let root = session.get_root_folder().unwrap();
        root.get_type_description().unwrap();
        root.get_type_description().unwrap();
        assert_eq!(
            mock.requests_to("GET", "http://mockup/mock/type?id=cmis%3Afolder").len(),
            1
        );
    }

    #[test]
    fn refresh_and_remove_update_timestamp() {
        let (mock, session) = fixtures::session();
        mock.expect("GET", "http://mockup/mock/objects/root-folder")
            .respond(200, fixtures::folder_entry("root-folder", "Root", "", "/"));
        mock.expect("DELETE", "http://mockup/mock/objects/root-folder").respond(204, "");
        mock.expect("GET", "http://mockup/mock/actions/root-folder")
            .respond(200, fixtures::allowable_actions(true));

        let root = session.get_root_folder().unwrap();
        assert_eq!(root.refresh_timestamp(), 0);
        root.refresh().unwrap();
        let first = root.refresh_timestamp();
        assert!(first > 0);

        let actions = root.get_allowable_actions().unwrap();
        assert!(actions.is_allowed(cmis_core::ObjectAction::DeleteObject));
        assert!(!actions.is_defined(cmis_core::ObjectAction::CheckIn));

        root.remove(true).unwrap();
        assert!(root.refresh_timestamp() > first);
        let deleted = mock.requests_to("DELETE", "http://mockup/mock/objects/root-folder");
        assert!(deleted[0].url.ends_with("allVersions=true"));
    }

    #[test]
    fn update_properties_puts_entry() {
        let (mock, session) = fixtures::session();
        mock.expect("PUT", "http://mockup/mock/objects/root-folder")
            .respond(200, fixtures::folder_entry("root-folder", "Renamed", "", "/"));
        let root = session.get_root_folder().unwrap();
        let mut props = cmis_core::PropertyMap::new();
        props.insert("cmis:name".into(), cmis_core::Property::string("cmis:name", "Renamed"));
        root.update_properties(&props).unwrap();
        assert_eq!(root.name(), "Renamed");
        assert!(root.refresh_timestamp() > 0);
        let put = mock.requests_to("PUT", "http://mockup/mock/objects/root-folder");
        assert!(put[0].body_text().contains("<atom:title>Renamed</atom:title>"));
    }
}
