//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the registry proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Where requests are forwarded to.
    pub upstream: UpstreamConfig,

    /// Allow/deny policy and denial behaviour.
    pub policy: PolicyConfig,

    /// Debug mode strips `content-security-policy` from responses.
    pub debug: bool,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream registry settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Default upstream hostname, optionally with `:port`.
    pub hostname: String,

    /// Scheme used for upstream requests ("http" or "https").
    pub protocol: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            hostname: "registry-1.docker.io".to_string(),
            protocol: "https".to_string(),
        }
    }
}

/// Access policy. Empty patterns are not enforced.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct PolicyConfig {
    /// Request paths must match this pattern.
    pub pathname_regex: String,

    /// Lower-cased user agents must match this pattern.
    pub ua_whitelist_regex: String,

    /// Lower-cased user agents matching this pattern are denied.
    pub ua_blacklist_regex: String,

    /// Client IPs must match this pattern.
    pub ip_whitelist_regex: String,

    /// Client IPs matching this pattern are denied.
    pub ip_blacklist_regex: String,

    /// Denied requests are redirected here instead of seeing the decoy page.
    pub redirect_url: String,
}

impl PolicyConfig {
    /// Configured (non-empty) patterns, paired with their field names.
    pub fn patterns(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("pathname_regex", self.pathname_regex.as_str()),
            ("ua_whitelist_regex", self.ua_whitelist_regex.as_str()),
            ("ua_blacklist_regex", self.ua_blacklist_regex.as_str()),
            ("ip_whitelist_regex", self.ip_whitelist_regex.as_str()),
            ("ip_blacklist_regex", self.ip_blacklist_regex.as_str()),
        ]
        .into_iter()
        .filter(|(_, pattern)| !pattern.is_empty())
    }

    /// Anchored pattern used to match the path that follows a hostname in
    /// response bodies. `None` when no pathname pattern is configured.
    pub fn path_suffix_pattern(&self) -> Option<String> {
        if self.pathname_regex.is_empty() {
            return None;
        }
        let unanchored = self
            .pathname_regex
            .strip_prefix('^')
            .unwrap_or(&self.pathname_regex);
        Some(format!("^(?:{unanchored})"))
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format {other:?}")),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
