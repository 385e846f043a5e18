//! Just enough HTML form scraping for provider login and consent pages.

use lazy_static::lazy_static;
use quick_xml::escape::unescape;
use regex::Regex;

use crate::error::{CmisError, CmisResult};

lazy_static! {
    static ref FORM_RE: Regex = Regex::new(r"(?is)<form\b([^>]*)>(.*?)</form>").unwrap();
    static ref INPUT_RE: Regex = Regex::new(r"(?is)<input\b([^>]*)>").unwrap();
    static ref ATTR_RE: Regex =
        Regex::new(r#"(?is)([a-z_:][-a-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>/]+))"#)
            .unwrap();
    static ref TITLE_CODE_RE: Regex =
        Regex::new(r"(?is)<title>[^<]*?code=([^<&\s]+)[^<]*</title>").unwrap();
}

/// A form found on a page: absolute action URL plus its hidden fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlForm {
    pub id: Option<String>,
    pub action: String,
    pub fields: Vec<(String, String)>,
}

impl HtmlForm {
    /// Set a field, replacing an existing one with the same name.
    pub fn set(&mut self, name: &str, value: &str) {
        match self.fields.iter_mut().find(|(k, _)| k == name) {
            Some(field) => field.1 = value.to_string(),
            None => self.fields.push((name.to_string(), value.to_string())),
        }
    }

    /// `application/x-www-form-urlencoded` body, fields in page order.
    pub fn encode(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.fields)
            .finish()
    }
}

fn attributes(tag: &str) -> Vec<(String, String)> {
    ATTR_RE
        .captures_iter(tag)
        .map(|c| {
            let name = c[1].to_ascii_lowercase();
            let raw = c
                .get(2)
                .or_else(|| c.get(3))
                .or_else(|| c.get(4))
                .map(|m| m.as_str())
                .unwrap_or_default();
            let value = unescape(raw)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| raw.to_string());
            (name, value)
        })
        .collect()
}

fn attr<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

/// Find a form on `html`, by id when given, else the first one.
///
/// Only hidden inputs are collected; visible fields are the caller's to set.
pub fn find_form(html: &str, page_url: &str, form_id: Option<&str>) -> CmisResult<HtmlForm> {
    let base = url::Url::parse(page_url)?;
    for form in FORM_RE.captures_iter(html) {
        let attrs = attributes(&form[1]);
        let id = attr(&attrs, "id").map(str::to_string);
        if let Some(wanted) = form_id {
            if id.as_deref() != Some(wanted) {
                continue;
            }
        }

        let action = match attr(&attrs, "action") {
            Some(action) if !action.is_empty() => base
                .join(action)
                .map_err(|e| {
                    CmisError::permission_denied(format!(
                        "Unusable form action '{action}' on {page_url}: {e}"
                    ))
                })?
                .to_string(),
            _ => page_url.to_string(),
        };

        let mut fields = Vec::new();
        for input in INPUT_RE.captures_iter(&form[2]) {
            let attrs = attributes(&input[1]);
            let hidden = attr(&attrs, "type")
                .map(|t| t.eq_ignore_ascii_case("hidden"))
                .unwrap_or(false);
            if let (true, Some(name)) = (hidden, attr(&attrs, "name")) {
                let value = attr(&attrs, "value").unwrap_or_default();
                fields.push((name.to_string(), value.to_string()));
            }
        }
        return Ok(HtmlForm { id, action, fields });
    }

    Err(CmisError::permission_denied(match form_id {
        Some(id) => format!("No form '{id}' on {page_url}"),
        None => format!("No form on {page_url}"),
    }))
}

/// Extract the authorization code from a provider's final page.
pub fn find_auth_code(html: &str) -> Option<String> {
    for input in INPUT_RE.captures_iter(html) {
        let attrs = attributes(&input[1]);
        if attr(&attrs, "id") == Some("code") {
            if let Some(value) = attr(&attrs, "value").filter(|v| !v.is_empty()) {
                return Some(value.to_string());
            }
        }
    }
    TITLE_CODE_RE
        .captures(html)
        .map(|c| c[1].to_string())
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN: &str = r#"<html><body>
      <form novalidate id="gaia_loginform" action="/ServiceLoginAuth" method="post">
        <input type="hidden" name="continue" value="redirectLink">
        <input type="hidden" name="scope" value="Scope">
        <input type="hidden" name="service" value="lso">
        <input type="hidden" name="GALX" value="cookie">
        <input type="email" name="Email" id="Email" value="">
        <input type="password" name="Passwd" id="Passwd">
        <input type="submit" name="signIn" value="Sign in">
      </form></body></html>"#;

    #[test]
    fn login_form_hidden_fields() {
        let mut form = find_form(LOGIN, "https://login/ServiceLogin?x=1", None).unwrap();
        assert_eq!(form.id.as_deref(), Some("gaia_loginform"));
        assert_eq!(form.action, "https://login/ServiceLoginAuth");
        form.set("Email", "mock-user");
        form.set("Passwd", "mock-password");
        assert_eq!(
            form.encode(),
            "continue=redirectLink&scope=Scope&service=lso&GALX=cookie\
             &Email=mock-user&Passwd=mock-password"
        );
    }

    #[test]
    fn form_by_id_and_missing_form() {
        assert!(find_form(LOGIN, "https://login/", Some("other")).is_err());
        assert!(find_form("<p>nothing</p>", "https://login/", None).is_err());
    }

    #[test]
    fn form_without_action_posts_back() {
        let html = "<form><input type='hidden' name='state_wrapper' value='stateWrapper'/></form>";
        let form = find_form(html, "https://approve/page", None).unwrap();
        assert_eq!(form.action, "https://approve/page");
        assert_eq!(form.encode(), "state_wrapper=stateWrapper");
    }

    #[test]
    fn unresolvable_action_is_permission_denied() {
        let html = r#"<form action="http://[login"><input type="hidden" name="n" value="v"></form>"#;
        let err = find_form(html, "https://login/", None).unwrap_err();
        assert_eq!(err.kind, crate::error::CmisErrorKind::PermissionDenied);
        assert!(err.message.contains("http://[login"));
    }

    #[test]
    fn auth_code_from_input_or_title() {
        assert_eq!(
            find_auth_code(r#"<input id="code" type="text" value="AuthCode">"#).as_deref(),
            Some("AuthCode")
        );
        assert_eq!(
            find_auth_code("<html><title>Success code=AuthCode</title></html>").as_deref(),
            Some("AuthCode")
        );
        assert_eq!(find_auth_code("<title>Denied</title>"), None);
    }

    #[test]
    fn entity_values_are_unescaped() {
        let html = r#"<form action="a?x=1&amp;y=2"><input type="hidden" name="n" value="a&amp;b"></form>"#;
        let form = find_form(html, "https://h/", None).unwrap();
        assert_eq!(form.action, "https://h/a?x=1&y=2");
        assert_eq!(form.fields[0].1, "a&b");
    }
}
