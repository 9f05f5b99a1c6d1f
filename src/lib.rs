//! Registry Proxy Library
//!
//! A transparent reverse proxy for container registries. Requests addressed to
//! the proxy's own hostname are forwarded to a fixed upstream, and upstream
//! hostname references in headers and textual bodies are rewritten back to the
//! proxy so clients keep talking to it.
//!
//! ```text
//! client → http::server → routing (resolve upstream)
//!                       → security (access gate) ──deny──▶ http::denial
//!                       → http::request → http::upstream → http::response
//!                                                          (rewrite::hostname)
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod rewrite;
pub mod routing;
pub mod security;

pub use config::{ActiveConfig, ProxyConfig, SharedConfig};
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
