//! Header helpers shared by both directions.

use std::borrow::Cow;

use axum::http::{header, HeaderName, HeaderValue};

use crate::rewrite;

/// Headers owned by the transport of each hop.
const TRANSPORT_HEADERS: [&str; 10] = [
    "host",
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// `host` plus the hop-by-hop headers.
pub fn is_transport_header(name: &HeaderName) -> bool {
    TRANSPORT_HEADERS.contains(&name.as_str())
}

/// True for hop-by-hop headers that must not be forwarded in either direction.
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    name != header::HOST && is_transport_header(name)
}

/// Rewrite standalone `from` hostnames in one header value.
///
/// The value is returned unchanged when it is not UTF-8, does not mention
/// `from`, or the rewritten text would not be a legal header value.
pub fn rewrite_value(value: &HeaderValue, from: &str, to: &str) -> HeaderValue {
    let Ok(text) = value.to_str() else {
        return value.clone();
    };
    if from.is_empty() || !text.contains(from) {
        return value.clone();
    }
    match rewrite::rewrite(text, from, to) {
        Cow::Borrowed(_) => value.clone(),
        Cow::Owned(rewritten) => HeaderValue::from_str(&rewritten).unwrap_or_else(|_| value.clone()),
    }
}
