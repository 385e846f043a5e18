//! URI templates advertised by the service document.

use cmis_core::{encode_component, CmisResult};

/// One `cmisra:uritemplate` of a workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    pub template: String,
    pub media_type: String,
}

impl UriTemplate {
    pub fn new(template: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            media_type: media_type.into(),
        }
    }

    pub fn create_url(&self, params: &[(&str, &str)]) -> String {
        create_url(&self.template, params)
    }
}

/// Expand `{name}` placeholders with percent-encoded values. Placeholders
/// without a value are removed; an unterminated `{` is kept verbatim.
pub fn create_url(template: &str, params: &[(&str, &str)]) -> String {
    let mut url = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        url.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            url.push_str(&rest[open..]);
            return url;
        };
        let name = &after[..close];
        if let Some((_, value)) = params.iter().find(|(k, _)| *k == name) {
            url.push_str(&encode_component(value));
        }
        rest = &after[close + 1..];
    }
    url.push_str(rest);
    url
}

/// Append query parameters to a link taken from a server response.
pub fn append_query(url: &str, params: &[(&str, &str)]) -> CmisResult<String> {
    let mut parsed = url::Url::parse(url)?;
    {
        let mut query = parsed.query_pairs_mut();
        for (name, value) in params {
            query.append_pair(name, value);
        }
    }
    Ok(parsed.to_string())
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
