//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Compile every policy pattern once to reject malformed regexes
//! - Validate value ranges (protocol, bind address, redirect target)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderValue;
use regex::Regex;
use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with a configuration.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("upstream protocol must be \"http\" or \"https\", got {0:?}")]
    InvalidProtocol(String),

    #[error("{field} is not a valid regex: {source}")]
    InvalidPattern {
        field: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("{field}: look-around is not supported ((?=, (?!, (?<=, (?<! need rewriting)")]
    UnsupportedLookAround { field: &'static str },

    #[error("redirect_url {0:?} is not a valid Location header value")]
    InvalidRedirectUrl(String),

    #[error("bind_address {0:?} is not a socket address")]
    InvalidBindAddress(String),

    #[error("metrics_address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Classify a regex compile failure for `field`.
pub fn pattern_error(field: &'static str, source: regex::Error) -> ValidationError {
    // The regex crate names look-around in its parse error.
    if source.to_string().contains("look-around") {
        ValidationError::UnsupportedLookAround { field }
    } else {
        ValidationError::InvalidPattern { field, source }
    }
}

/// Check a configuration, collecting every error found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !matches!(config.upstream.protocol.as_str(), "http" | "https") {
        errors.push(ValidationError::InvalidProtocol(config.upstream.protocol.clone()));
    }

    let mut pathname_ok = true;
    for (field, pattern) in config.policy.patterns() {
        if let Err(source) = Regex::new(pattern) {
            pathname_ok &= field != "pathname_regex";
            errors.push(pattern_error(field, source));
        }
    }
    // The body suffix is derived from pathname_regex; report it only when
    // the pattern itself compiled.
    if let Some(suffix) = config.policy.path_suffix_pattern().filter(|_| pathname_ok) {
        if let Err(source) = Regex::new(&suffix) {
            errors.push(pattern_error("pathname_regex", source));
        }
    }

    let redirect = &config.policy.redirect_url;
    if !redirect.is_empty() && HeaderValue::from_str(redirect).is_err() {
        errors.push(ValidationError::InvalidRedirectUrl(redirect.clone()));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
