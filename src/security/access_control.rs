//! Access gate.
//! Decides whether a request may reach the upstream at all.

use std::fmt;
use std::net::IpAddr;

use crate::config::PolicyConfig;
use crate::error::ProxyError;
use crate::routing::UpstreamTarget;
use crate::security::patterns::PatternCache;

/// The request facts the gate looks at.
#[derive(Debug, Clone)]
pub struct GateRequest<'a> {
    pub path: &'a str,
    /// Raw user agent; lower-cased before matching.
    pub user_agent: &'a str,
    pub client_ip: &'a str,
}

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NoUpstream,
    PathNotAllowed,
    UserAgentNotAllowed,
    UserAgentBlocked,
    ClientIpNotAllowed,
    ClientIpBlocked,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::NoUpstream => "no_upstream",
            DenyReason::PathNotAllowed => "path_not_allowed",
            DenyReason::UserAgentNotAllowed => "user_agent_not_allowed",
            DenyReason::UserAgentBlocked => "user_agent_blocked",
            DenyReason::ClientIpNotAllowed => "client_ip_not_allowed",
            DenyReason::ClientIpBlocked => "client_ip_blocked",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

/// Policy evaluator bound to one configuration snapshot.
pub struct AccessGate<'a> {
    policy: &'a PolicyConfig,
    patterns: &'a PatternCache,
}

impl<'a> AccessGate<'a> {
    pub fn new(policy: &'a PolicyConfig, patterns: &'a PatternCache) -> Self {
        Self { policy, patterns }
    }

    /// Evaluate `request` against the policy. Checks short-circuit in a fixed
    /// order; an unset pattern never triggers its check.
    pub fn evaluate(
        &self,
        request: &GateRequest<'_>,
        target: &UpstreamTarget,
    ) -> Result<Decision, ProxyError> {
        if target.hostname.is_empty() {
            return Ok(Decision::Deny(DenyReason::NoUpstream));
        }

        let policy = self.policy;
        let user_agent = request.user_agent.to_lowercase();

        let denied = if self.fails(&policy.pathname_regex, request.path)? {
            Some(DenyReason::PathNotAllowed)
        } else if self.fails(&policy.ua_whitelist_regex, &user_agent)? {
            Some(DenyReason::UserAgentNotAllowed)
        } else if self.hits(&policy.ua_blacklist_regex, &user_agent)? {
            Some(DenyReason::UserAgentBlocked)
        } else if self.fails(&policy.ip_whitelist_regex, request.client_ip)? {
            Some(DenyReason::ClientIpNotAllowed)
        } else if self.hits(&policy.ip_blacklist_regex, request.client_ip)? {
            Some(DenyReason::ClientIpBlocked)
        } else {
            None
        };

        Ok(denied.map_or(Decision::Allow, Decision::Deny))
    }

    /// Whitelist check: configured and not matching.
    fn fails(&self, pattern: &str, haystack: &str) -> Result<bool, ProxyError> {
        if pattern.is_empty() {
            return Ok(false);
        }
        Ok(!self.patterns.is_match(pattern, haystack)?)
    }

    /// Blacklist check: configured and matching.
    fn hits(&self, pattern: &str, haystack: &str) -> Result<bool, ProxyError> {
        if pattern.is_empty() {
            return Ok(false);
        }
        self.patterns.is_match(pattern, haystack)
    }
}

/// Client IP as the policy sees it. IPv4-mapped IPv6 peers show up as plain IPv4.
pub fn client_ip_string(ip: IpAddr) -> String {
    ip.to_canonical().to_string()
}
