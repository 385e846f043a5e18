//! Session creation across the bindings.

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use cmis_atom::AtomSession;
use cmis_core::{
    AuthorizationFlow, CmisError, CmisErrorKind, CmisResult, HttpSession, HttpTransport,
    OAuth2Handler, ReqwestTransport, Repository, Session,
};
use cmis_gdrive::GDriveSession;
use cmis_onedrive::OneDriveSession;
use cmis_sharepoint::SharePointSession;
use cmis_ws::WsSession;

use crate::params::{BindingKind, SessionParams};

const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

fn http_session(
    params: &SessionParams,
    transport: Arc<dyn HttpTransport>,
    flow: Option<Box<dyn AuthorizationFlow>>,
) -> HttpSession {
    let mut http = HttpSession::new(transport, params.username.as_str(), params.password.as_str())
        .with_verbose(params.verbose);
    if let Some(oauth2) = &params.oauth2 {
        let mut handler = OAuth2Handler::new(oauth2.clone());
        if let Some(flow) = flow {
            handler = handler.with_flow(flow);
        }
        if let Some(access_token) = params.access_token.as_deref() {
            handler = handler.with_tokens(access_token, params.refresh_token.as_deref().unwrap_or_default());
        }
        http = http.with_oauth2(handler);
    }
    http
}

fn open(
    binding: BindingKind,
    params: &SessionParams,
    transport: Arc<dyn HttpTransport>,
    flow: Option<Box<dyn AuthorizationFlow>>,
) -> CmisResult<Box<dyn Session>> {
    if binding.requires_oauth2() && params.oauth2.is_none() {
        return Err(CmisError::invalid(format!("{binding} requires OAuth2 settings")));
    }
    let http = http_session(params, transport, flow);
    let url = params.binding_url.as_str();
    let repository = params.repository_id.as_str();
    let session: Box<dyn Session> = match binding {
        BindingKind::AtomPub => Box::new(AtomSession::new(http, url, repository)?),
        BindingKind::WebServices => Box::new(WsSession::new(http, url, repository)?),
        BindingKind::GoogleDrive => Box::new(GDriveSession::new(http, url)?),
        BindingKind::OneDrive => Box::new(OneDriveSession::new(http, url)?),
        BindingKind::SharePoint => Box::new(SharePointSession::new(http, url)?),
    };
    info!("Opened {binding} session on {url}");
    Ok(session)
}

/// Errors that rule out trying another binding on the same endpoint.
fn is_final(error: &CmisError) -> bool {
    matches!(
        error.kind,
        CmisErrorKind::PermissionDenied | CmisErrorKind::InvalidArgument
    )
}

/// Open a session as described by `params`, over HTTPS.
pub fn create_session(params: &SessionParams) -> CmisResult<Box<dyn Session>> {
    let transport = ReqwestTransport::new(params.no_ssl_check, Some(HTTP_TIMEOUT))?;
    create_session_with(params, Arc::new(transport), None)
}

/// Open a session over `transport`, optionally replacing the default OAuth2
/// authorization flow.
///
/// When the binding is neither set nor recognizable from the URL, AtomPub
/// is tried first and Web Services second. Both attempts share one HTTP
/// session, so the authorization flow runs at most once.
pub fn create_session_with(
    params: &SessionParams,
    transport: Arc<dyn HttpTransport>,
    flow: Option<Box<dyn AuthorizationFlow>>,
) -> CmisResult<Box<dyn Session>> {
    if params.binding_url.is_empty() {
        return Err(CmisError::invalid("Missing binding URL"));
    }
    if let Some(binding) = params.binding() {
        return open(binding, params, transport, flow);
    }

    let http = http_session(params, transport, flow);
    let url = params.binding_url.as_str();
    let repository = params.repository_id.as_str();
    let session: Box<dyn Session> = match AtomSession::discover(&http, url) {
        // The endpoint speaks AtomPub: any later failure is the answer.
        Ok(workspaces) => {
            let session = AtomSession::with_workspaces(http, url, workspaces, repository)?;
            info!("Opened {} session on {url}", BindingKind::AtomPub);
            Box::new(session)
        }
        Err(e) if is_final(&e) => return Err(e),
        Err(e) => {
            warn!("{url} is not an AtomPub endpoint ({e}), trying Web Services");
            let session = WsSession::new(http, url, repository)?;
            info!("Opened {} session on {url}", BindingKind::WebServices);
            Box::new(session)
        }
    };
    Ok(session)
}

/// Repositories advertised at the endpoint of `params`.
pub fn get_repositories(params: &SessionParams) -> CmisResult<Vec<Repository>> {
    let transport = ReqwestTransport::new(params.no_ssl_check, Some(HTTP_TIMEOUT))?;
    get_repositories_with(params, Arc::new(transport))
}

/// Same as [`get_repositories`] over `transport`. The discovery-based
/// bindings only read the endpoint description; the vendor APIs expose a
/// single fixed repository.
pub fn get_repositories_with(
    params: &SessionParams,
    transport: Arc<dyn HttpTransport>,
) -> CmisResult<Vec<Repository>> {
    let url = params.binding_url.as_str();
    match params.binding().unwrap_or(BindingKind::AtomPub) {
        BindingKind::AtomPub => {
            AtomSession::get_repositories(&http_session(params, transport, None), url)
        }
        BindingKind::WebServices => {
            WsSession::get_repositories(http_session(params, transport, None), url)
        }
        binding => Ok(open(binding, params, transport, None)?.get_repositories()),
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use cmis_core::testing::MockTransport;
    use cmis_core::OAuth2Data;

    #[test]
    fn empty_url_is_rejected() {
        let mock = MockTransport::new();
        let err = create_session_with(&SessionParams::default(), Arc::new(mock.clone()), None)
            .err()
            .unwrap();
        assert_eq!(err.kind, CmisErrorKind::InvalidArgument);
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn cloud_apis_need_oauth2() {
        let mock = MockTransport::new();
        let params = SessionParams::new("https://www.googleapis.com/drive/v2");
        let err = create_session_with(&params, Arc::new(mock.clone()), None).err().unwrap();
        assert_eq!(err.kind, CmisErrorKind::InvalidArgument);
        assert!(err.message.contains("Google Drive"));
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn saved_tokens_skip_authorization() {
        let mock = MockTransport::new();
        let params = SessionParams::new("https://apis.live.net/v5.0")
            .with_oauth2(OAuth2Data {
                token_url: "https://token".into(),
                ..OAuth2Data::default()
            })
            .with_tokens("saved-access", "saved-refresh");
        let session = create_session_with(&params, Arc::new(mock.clone()), None).unwrap();
        assert_eq!(session.get_repository().id, "OneDrive");
        assert!(mock.requests().is_empty());
    }
}
