//! MTOM/XOP answers.
//!
//! Content streams usually come back as `multipart/related`: the first (or
//! `start`) part is the SOAP envelope and `xop:Include` elements in it point
//! to the other parts through `cid:` references.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use percent_encoding::percent_decode_str;

use cmis_core::{CmisError, CmisResult};

/// A `Content-Type` parameter value, unquoted.
pub fn content_type_param(content_type: &str, name: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case(name) {
            return None;
        }
        Some(value.trim().trim_matches('"').to_string())
    })
}

pub fn is_multipart(content_type: &str) -> bool {
    content_type
        .trim_start()
        .to_ascii_lowercase()
        .starts_with("multipart/related")
}

fn strip_angles(id: &str) -> &str {
    id.trim().trim_start_matches('<').trim_end_matches('>')
}

/// A decoded `multipart/related` body.
#[derive(Debug, Default)]
pub struct MultipartBody {
    pub root: Vec<u8>,
    attachments: HashMap<String, Vec<u8>>,
}

impl MultipartBody {
    fn key(&self, href: &str) -> Option<String> {
        let id = href.strip_prefix("cid:").unwrap_or(href);
        let decoded = percent_decode_str(id).decode_utf8_lossy();
        let key = [decoded.as_ref(), id]
            .into_iter()
            .find(|k| self.attachments.contains_key(*k))
            .map(str::to_string);
        key
    }

    /// The part an `xop:Include@href` points to.
    pub fn attachment(&self, href: &str) -> Option<&[u8]> {
        let key = self.key(href)?;
        self.attachments.get(&key).map(Vec::as_slice)
    }

    /// Move the part an `xop:Include@href` points to out of the body.
    pub fn take_attachment(&mut self, href: &str) -> Option<Vec<u8>> {
        let key = self.key(href)?;
        self.attachments.remove(&key)
    }

    pub fn attachment_count(&self) -> usize {
        self.attachments.len()
    }
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

fn skip_line_end(body: &[u8], mut at: usize) -> usize {
    if body.get(at) == Some(&b'\r') {
        at += 1;
    }
    if body.get(at) == Some(&b'\n') {
        at += 1;
    }
    at
}

fn trim_line_end(mut part: &[u8]) -> &[u8] {
    if part.ends_with(b"\n") {
        part = &part[..part.len() - 1];
    }
    if part.ends_with(b"\r") {
        part = &part[..part.len() - 1];
    }
    part
}

struct Part {
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Part {
    fn parse(raw: &[u8]) -> CmisResult<Self> {
        let (head, body) = match find(raw, b"\r\n\r\n", 0) {
            Some(split) => (&raw[..split], &raw[split + 4..]),
            None => match find(raw, b"\n\n", 0) {
                Some(split) => (&raw[..split], &raw[split + 2..]),
                None => (&raw[..0], raw),
            },
        };
        let headers = String::from_utf8_lossy(head)
            .lines()
            .filter_map(|line| {
                let (name, value) = line.split_once(':')?;
                Some((name.trim().to_string(), value.trim().to_string()))
            })
            .collect();

        let mut part = Self {
            headers,
            body: body.to_vec(),
        };
        let base64 = part
            .header("Content-Transfer-Encoding")
            .map(|e| e.eq_ignore_ascii_case("base64"))
            .unwrap_or(false);
        if base64 {
            let compact: Vec<u8> = part
                .body
                .iter()
                .copied()
                .filter(|b| !b.is_ascii_whitespace())
                .collect();
            part.body = STANDARD
                .decode(compact)
                .map_err(|e| CmisError::runtime(format!("Invalid base64 MIME part: {e}")))?;
        }
        Ok(part)
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn content_id(&self) -> Option<String> {
        self.header("Content-ID").map(|id| strip_angles(id).to_string())
    }
}

/// Split a `multipart/related` body into its root part and attachments.
pub fn parse_multipart(content_type: &str, body: &[u8]) -> CmisResult<MultipartBody> {
    let boundary = content_type_param(content_type, "boundary")
        .filter(|b| !b.is_empty())
        .ok_or_else(|| CmisError::runtime("multipart answer without a boundary"))?;
    let delimiter = format!("--{boundary}").into_bytes();

    let mut parts = Vec::new();
    let mut cursor = find(body, &delimiter, 0)
        .ok_or_else(|| CmisError::runtime("multipart answer without any part"))?;
    loop {
        let start = cursor + delimiter.len();
        if body[start..].starts_with(b"--") {
            break;
        }
        let content_start = skip_line_end(body, start);
        let Some(next) = find(body, &delimiter, content_start) else {
            // Unterminated last part: keep what arrived.
            parts.push(Part::parse(&body[content_start..])?);
            break;
        };
        parts.push(Part::parse(trim_line_end(&body[content_start..next]))?);
        cursor = next;
    }

    if parts.is_empty() {
        return Err(CmisError::runtime("multipart answer without any part"));
    }
    let start = content_type_param(content_type, "start").map(|s| strip_angles(&s).to_string());
    let root_index = start
        .and_then(|id| {
            parts
                .iter()
                .position(|p| p.content_id().as_deref() == Some(id.as_str()))
        })
        .unwrap_or(0);

    let mut result = MultipartBody::default();
    for (index, part) in parts.into_iter().enumerate() {
        if index == root_index {
            result.root = part.body;
        } else if let Some(id) = part.content_id() {
            result.attachments.insert(id, part.body);
        }
    }
    Ok(result)
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
