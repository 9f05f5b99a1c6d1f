//! Response handling and transformation.
//!
//! # Responsibilities
//! - Restore the origin hostname in upstream response headers
//! - Rewrite textual bodies, stream everything else untouched
//! - Apply the registry `www-authenticate` fixup and debug-mode CSP removal
//! - Assemble the final client response
//!
//! # Design Decisions
//! - Body mode is chosen once, from `content-type`, right after headers arrive
//! - Streaming responses avoid buffering entire body
//! - Hop-by-hop headers stripped automatically
//! - A mid-stream upstream error aborts the client connection

use std::borrow::Cow;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use futures_util::TryStreamExt;
use regex::Regex;

use crate::error::ProxyError;
use crate::http::headers::{is_hop_by_hop, rewrite_value};
use crate::http::upstream::UpstreamResponse;
use crate::observability::metrics;
use crate::rewrite;
use crate::routing::AUTH_SERVICE_HOST;

/// Response body after the buffering decision.
pub enum ResponsePayload {
    /// Fully read textual body, eligible for rewriting.
    Text(String),
    /// Opaque byte stream forwarded as-is.
    Stream(Body),
}

impl ResponsePayload {
    pub fn mode(&self) -> &'static str {
        match self {
            ResponsePayload::Text(_) => "text",
            ResponsePayload::Stream(_) => "stream",
        }
    }
}

/// True when the content type marks a body we rewrite.
pub fn is_textual(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("text/"))
}

impl UpstreamResponse {
    /// Decide the body representation. Textual bodies are read fully here.
    pub async fn into_payload(self) -> Result<(StatusCode, HeaderMap, ResponsePayload), ProxyError> {
        let UpstreamResponse {
            status,
            headers,
            body,
        } = self;

        let payload = if is_textual(&headers) {
            let bytes = body.bytes().await.map_err(ProxyError::UpstreamBody)?;
            ResponsePayload::Text(String::from_utf8_lossy(&bytes).into_owned())
        } else {
            let stream = body.bytes_stream().inspect_err(|e| {
                tracing::warn!(error = %e, "Upstream body stream failed, aborting response");
            });
            ResponsePayload::Stream(Body::from_stream(stream))
        };

        metrics::record_body_mode(payload.mode());
        Ok((status, headers, payload))
    }
}

/// Rewrite upstream response headers for the client.
pub fn rewrite_headers(
    headers: &HeaderMap,
    upstream_hostname: &str,
    origin_hostname: &str,
    debug: bool,
) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());

    for (name, value) in headers {
        if is_hop_by_hop(name) {
            continue;
        }
        if debug && name == header::CONTENT_SECURITY_POLICY {
            continue;
        }
        out.append(name.clone(), rewrite_value(value, upstream_hostname, origin_hostname));
    }

    fix_www_authenticate(&mut out, origin_hostname);
    out
}

/// Point the registry's token realm at the proxy. Without a known origin the
/// realm is left alone.
fn fix_www_authenticate(headers: &mut HeaderMap, origin_hostname: &str) {
    if origin_hostname.is_empty() {
        return;
    }
    let realm = format!("{AUTH_SERVICE_HOST}/token");
    let replacement = format!("{origin_hostname}/token");

    let header::Entry::Occupied(mut entry) = headers.entry(header::WWW_AUTHENTICATE) else {
        return;
    };
    for value in entry.iter_mut() {
        let Ok(text) = value.to_str() else { continue };
        if !text.contains(&realm) {
            continue;
        }
        if let Ok(fixed) = HeaderValue::from_str(&text.replacen(&realm, &replacement, 1)) {
            *value = fixed;
        }
    }
}

/// Rewrite a textual body. With a path suffix, only hostnames directly
/// followed by a matching path are rewritten.
pub fn rewrite_body<'a>(
    body: &'a str,
    upstream_hostname: &str,
    path_suffix: Option<&Regex>,
    origin_hostname: &str,
) -> Cow<'a, str> {
    match path_suffix {
        Some(suffix) => {
            rewrite::rewrite_with_path_suffix(body, upstream_hostname, suffix, origin_hostname)
        }
        None => rewrite::rewrite(body, upstream_hostname, origin_hostname),
    }
}

/// Build the client response. Status and headers are fixed before any body byte.
pub fn build_response(status: StatusCode, mut headers: HeaderMap, payload: ResponsePayload) -> Response {
    let body = match payload {
        ResponsePayload::Text(text) => {
            // Length changed with the rewrite; the server recomputes it.
            headers.remove(header::CONTENT_LENGTH);
            Body::from(text)
        }
        ResponsePayload::Stream(body) => body,
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
