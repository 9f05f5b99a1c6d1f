//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → optional config file (TOML)
//!     → environment overrides (PROXY_HOSTNAME, PATHNAME_REGEX, ...)
//!     → validation.rs (semantic checks, regex compilation)
//!     → ActiveConfig (validated, immutable, patterns compiled)
//!     → shared via ArcSwap; each request loads one snapshot
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of Arc<ActiveConfig>
//!     → requests already in flight keep their old snapshot
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Only the loader reads the process environment

pub mod active;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use active::{ActiveConfig, SharedConfig};
pub use loader::ConfigError;
pub use schema::{
    ListenerConfig, LogFormat, ObservabilityConfig, PolicyConfig, ProxyConfig, UpstreamConfig,
};
