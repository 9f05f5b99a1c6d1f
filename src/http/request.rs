//! Request handling and transformation.
//!
//! # Responsibilities
//! - Rewrite origin hostname references in outbound header values
//! - Drop headers the transport recomputes for the new destination
//! - Hand the inbound body to the upstream as a stream (never buffered)
//!
//! # Design Decisions
//! - Non-UTF-8 header values pass through untouched
//! - GET and HEAD never carry a body upstream
//! - Original request preserved for logging; modified copy forwarded

use axum::body::Body;
use axum::http::{header, HeaderMap, Method};

use crate::http::headers::{is_transport_header, rewrite_value};

/// Request ID header set by the middleware stack.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Build the header set for the upstream request.
///
/// Every value mentioning `origin_hostname` has its standalone occurrences
/// rewritten to `upstream_hostname`. `host`, hop-by-hop headers and
/// `accept-encoding` are left for the outbound client to set.
pub fn build_outbound_headers(
    inbound: &HeaderMap,
    origin_hostname: &str,
    upstream_hostname: &str,
) -> HeaderMap {
    let mut outbound = HeaderMap::with_capacity(inbound.len());

    for (name, value) in inbound {
        if is_transport_header(name) || name == header::ACCEPT_ENCODING {
            continue;
        }
        outbound.append(name.clone(), rewrite_value(value, origin_hostname, upstream_hostname));
    }

    outbound
}

/// Body to send upstream: nothing for GET/HEAD, otherwise the inbound stream.
pub fn outbound_body(method: &Method, body: Body) -> Option<reqwest::Body> {
    if *method == Method::GET || *method == Method::HEAD {
        return None;
    }
    Some(reqwest::Body::wrap_stream(body.into_data_stream()))
}

/// Hostname the client used to reach the proxy, without port.
///
/// Taken from the `Host` header, falling back to the request URI authority.
pub fn origin_hostname(headers: &HeaderMap, uri: &axum::http::Uri) -> String {
    let authority = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.parse::<axum::http::uri::Authority>().ok())
        .or_else(|| uri.authority().cloned());

    authority
        .map(|a| a.host().to_string())
        .unwrap_or_default()
}

/// Request ID assigned by the middleware, if any.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}
