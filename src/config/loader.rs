//! Configuration loading from disk and the process environment.
//!
//! Precedence, lowest first: built-in defaults, TOML file, environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{LogFormat, ProxyConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value {value:?} for {var}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build a configuration from an optional file plus environment overrides.
///
/// `env` looks up a variable by name; pass `|k| std::env::var(k).ok()` for the
/// process environment.
pub fn load<F>(path: Option<&Path>, env: F) -> Result<ProxyConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ProxyConfig::default(),
    };

    apply_env_overrides(&mut config, env)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay the supported environment variables onto `config`.
///
/// A variable that is present wins even when empty, so `PROXY_HOSTNAME=""`
/// really clears the upstream.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let strings: [(&str, &mut String); 9] = [
        ("PROXY_HOSTNAME", &mut config.upstream.hostname),
        ("PROXY_PROTOCOL", &mut config.upstream.protocol),
        ("PATHNAME_REGEX", &mut config.policy.pathname_regex),
        ("UA_WHITELIST_REGEX", &mut config.policy.ua_whitelist_regex),
        ("UA_BLACKLIST_REGEX", &mut config.policy.ua_blacklist_regex),
        ("IP_WHITELIST_REGEX", &mut config.policy.ip_whitelist_regex),
        ("IP_BLACKLIST_REGEX", &mut config.policy.ip_blacklist_regex),
        ("URL302", &mut config.policy.redirect_url),
        ("LOG_LEVEL", &mut config.observability.log_level),
    ];
    for (var, slot) in strings {
        if let Some(value) = env(var) {
            *slot = value;
        }
    }

    if let Some(value) = env("DEBUG") {
        config.debug = value == "true";
    }

    if let Some(value) = env("PORT") {
        let port: u16 = value
            .parse()
            .map_err(|_| ConfigError::Env { var: "PORT", value: value.clone() })?;
        config.listener.bind_address = format!("0.0.0.0:{port}");
    }

    if let Some(value) = env("LOG_FORMAT") {
        config.observability.log_format = value
            .parse::<LogFormat>()
            .map_err(|_| ConfigError::Env { var: "LOG_FORMAT", value: value.clone() })?;
    }

    if let Some(value) = env("METRICS_ADDRESS") {
        config.observability.metrics_enabled = !value.is_empty();
        if !value.is_empty() {
            config.observability.metrics_address = value;
        }
    }

    Ok(())
}
