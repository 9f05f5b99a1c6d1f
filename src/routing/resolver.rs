//! Upstream resolution.
//!
//! # Responsibilities
//! - Pick the upstream hostname for a request path
//! - Carry the configured protocol
//! - Preserve path and query verbatim
//!
//! # Design Decisions
//! - Overrides are substring checks on the path, first match wins
//! - The proxy's own listening port never leaks into the upstream URL

use url::Url;

use crate::config::UpstreamConfig;
use crate::error::ProxyError;

/// Docker Hub token service.
pub const AUTH_SERVICE_HOST: &str = "auth.docker.io";

/// Docker Hub search/index service.
pub const INDEX_SERVICE_HOST: &str = "index.docker.io";

/// A path-triggered upstream override.
#[derive(Debug, Clone, Copy)]
pub struct PathOverride {
    pub segment: &'static str,
    pub hostname: &'static str,
}

impl PathOverride {
    pub fn matches(&self, path: &str) -> bool {
        path.contains(self.segment)
    }
}

/// Overrides in evaluation order.
pub const PATH_OVERRIDES: [PathOverride; 2] = [
    PathOverride {
        segment: "/token",
        hostname: AUTH_SERVICE_HOST,
    },
    PathOverride {
        segment: "/search",
        hostname: INDEX_SERVICE_HOST,
    },
];

/// Where a request will be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    /// Upstream hostname, possibly with `:port`. May be empty when unconfigured.
    pub hostname: String,
    pub protocol: String,
    /// Path plus `?query` exactly as received.
    pub path_and_query: String,
}

impl UpstreamTarget {
    /// Full upstream URL.
    pub fn url(&self) -> Result<Url, ProxyError> {
        let raw = format!("{}://{}{}", self.protocol, self.hostname, self.path_and_query);
        Url::parse(&raw).map_err(|source| ProxyError::InvalidUpstreamUrl { url: raw, source })
    }
}

/// Resolve the upstream for `path` (and optional `query`).
pub fn resolve(path: &str, query: Option<&str>, upstream: &UpstreamConfig) -> UpstreamTarget {
    let hostname = PATH_OVERRIDES
        .iter()
        .find(|o| o.matches(path))
        .map_or_else(|| upstream.hostname.clone(), |o| o.hostname.to_string());

    let path_and_query = match query {
        Some(q) => format!("{path}?{q}"),
        None => path.to_string(),
    };

    UpstreamTarget {
        hostname,
        protocol: upstream.protocol.clone(),
        path_and_query,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream(hostname: &str) -> UpstreamConfig {
        UpstreamConfig {
            hostname: hostname.into(),
            protocol: "https".into(),
        }
    }

    #[test]
    fn test_default_upstream() {
        let target = resolve("/v2/library/alpine/manifests/latest", None, &upstream("ghcr.io"));
        assert_eq!(target.hostname, "ghcr.io");
        assert_eq!(
            target.url().unwrap().as_str(),
            "https://ghcr.io/v2/library/alpine/manifests/latest"
        );
    }

    #[test]
    fn test_token_path_goes_to_auth_service() {
        let target = resolve(
            "/token",
            Some("service=registry.docker.io&scope=repository:library/alpine:pull"),
            &upstream("ghcr.io"),
        );
        assert_eq!(target.hostname, AUTH_SERVICE_HOST);
        assert_eq!(
            target.url().unwrap().as_str(),
            "https://auth.docker.io/token?service=registry.docker.io&scope=repository:library/alpine:pull"
        );
    }

    #[test]
    fn test_search_path_goes_to_index_service() {
        let target = resolve("/v1/search", Some("q=alpine"), &upstream("registry-1.docker.io"));
        assert_eq!(target.hostname, INDEX_SERVICE_HOST);
        assert_eq!(target.path_and_query, "/v1/search?q=alpine");
    }

    #[test]
    fn test_token_wins_over_search() {
        let target = resolve("/search/token", None, &upstream("registry-1.docker.io"));
        assert_eq!(target.hostname, AUTH_SERVICE_HOST);
    }

    #[test]
    fn test_override_applies_with_empty_default() {
        assert_eq!(resolve("/token", None, &upstream("")).hostname, AUTH_SERVICE_HOST);
        assert_eq!(resolve("/v2/", None, &upstream("")).hostname, "");
    }

    #[test]
    fn test_explicit_upstream_port_is_kept() {
        let mut config = upstream("127.0.0.1:5000");
        config.protocol = "http".into();
        let target = resolve("/v2/", None, &config);
        assert_eq!(target.url().unwrap().as_str(), "http://127.0.0.1:5000/v2/");
    }

    #[test]
    fn test_empty_hostname_has_no_url() {
        let target = resolve("/v2/", None, &upstream(""));
        assert!(matches!(target.url(), Err(ProxyError::InvalidUpstreamUrl { .. })));
    }
}
