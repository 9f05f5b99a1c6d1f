//! Upstream dispatch.
//!
//! # Responsibilities
//! - Send exactly one request per inbound request
//! - Hand back status, headers and the unread body
//!
//! # Design Decisions
//! - One shared client; pooling, timeouts and redirects are the client's defaults
//! - No retries: a failure is reported to the caller as-is
//! - Content decoding (gzip, br, deflate) happens in the client

use axum::http::{HeaderMap, Method, StatusCode};
use url::Url;

use crate::error::ProxyError;

/// Issues outbound requests to the resolved upstream.
#[derive(Clone)]
pub struct UpstreamDispatcher {
    client: reqwest::Client,
}

/// Raw upstream response. The body has not been read yet.
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub(crate) body: reqwest::Response,
}

impl UpstreamDispatcher {
    pub fn new() -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(ProxyError::Client)?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Send one request. Any transport failure is `UpstreamUnreachable`.
    pub async fn dispatch(
        &self,
        url: Url,
        method: Method,
        headers: HeaderMap,
        body: Option<reqwest::Body>,
    ) -> Result<UpstreamResponse, ProxyError> {
        let mut request = self.client.request(method, url).headers(headers);
        if let Some(body) = body {
            request = request.body(body);
        }

        let mut response = request
            .send()
            .await
            .map_err(ProxyError::UpstreamUnreachable)?;

        let status = response.status();
        let headers = std::mem::take(response.headers_mut());

        tracing::debug!(status = %status, url = %response.url(), "Upstream responded");

        Ok(UpstreamResponse {
            status,
            headers,
            body: response,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connection_refused_is_unreachable() {
        // Bind then drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let dispatcher = UpstreamDispatcher::new().unwrap();
        let url = Url::parse(&format!("http://{addr}/v2/")).unwrap();
        let result = dispatcher
            .dispatch(url, Method::GET, HeaderMap::new(), None)
            .await;

        assert!(matches!(result, Err(ProxyError::UpstreamUnreachable(_))));
    }
}
