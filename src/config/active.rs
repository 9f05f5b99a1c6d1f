//! The configuration snapshot requests run against.

use std::sync::Arc;

use arc_swap::ArcSwap;
use regex::Regex;

use crate::config::loader::ConfigError;
use crate::config::schema::ProxyConfig;
use crate::config::validation::{pattern_error, validate_config};
use crate::security::patterns::PatternCache;

/// A validated configuration together with its compiled patterns.
#[derive(Debug)]
pub struct ActiveConfig {
    pub config: ProxyConfig,
    pub patterns: PatternCache,
    path_suffix: Option<String>,
}

/// Handle shared between the server and the config watcher.
pub type SharedConfig = Arc<ArcSwap<ActiveConfig>>;

impl ActiveConfig {
    /// Validate `config` and compile its patterns.
    pub fn compile(config: ProxyConfig) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let path_suffix = config.policy.path_suffix_pattern();
        let sources = config
            .policy
            .patterns()
            .map(|(_, pattern)| pattern.to_string())
            .chain(path_suffix.clone());
        let patterns = PatternCache::compile(sources).map_err(|source| {
            ConfigError::Validation(vec![pattern_error("pathname_regex", source)])
        })?;

        Ok(Self {
            config,
            patterns,
            path_suffix,
        })
    }

    /// Anchored suffix used when rewriting response bodies, if configured.
    pub fn path_suffix(&self) -> Option<&Regex> {
        self.path_suffix
            .as_deref()
            .and_then(|source| self.patterns.get(source).ok())
    }

    /// Wrap into a swappable shared handle.
    pub fn into_shared(self) -> SharedConfig {
        Arc::new(ArcSwap::from_pointee(self))
    }
}
