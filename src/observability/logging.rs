//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Carry the per-request fields every denial and failure entry logs
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level
//! - JSON format for production, pretty format for development

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};
use crate::error::ProxyError;
use crate::security::DenyReason;

/// Install the global subscriber. Fails if one is already set.
pub fn init_logging(
    config: &ObservabilityConfig,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(fmt::layer().with_ansi(false).json()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer()).try_init(),
    }
}

/// Identity of one inbound request for log entries.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub client_ip: String,
    pub user_agent: String,
    pub url: String,
}

impl RequestContext {
    pub fn log_denied(&self, reason: DenyReason) {
        tracing::warn!(
            request_id = %self.request_id,
            client_ip = %self.client_ip,
            user_agent = %self.user_agent,
            url = %self.url,
            reason = %reason,
            "Invalid"
        );
    }

    pub fn log_failure(&self, error: &ProxyError) {
        tracing::error!(
            request_id = %self.request_id,
            client_ip = %self.client_ip,
            user_agent = %self.user_agent,
            url = %self.url,
            error = %error,
            "Fetch error"
        );
    }

    pub fn log_policy_error(&self, error: &ProxyError) {
        tracing::error!(
            request_id = %self.request_id,
            client_ip = %self.client_ip,
            user_agent = %self.user_agent,
            url = %self.url,
            error = %error,
            "Policy evaluation failed"
        );
    }
}
