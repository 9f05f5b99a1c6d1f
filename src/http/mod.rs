//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, pipeline)
//!     → [routing resolves the upstream, security gates the request]
//!     → denial.rs (redirect or decoy page) on deny
//!     → request.rs (rewrite origin → upstream in headers, stream body)
//!     → upstream.rs (one outbound exchange)
//!     → response.rs (rewrite upstream → origin in headers and textual bodies)
//!     → Send to client
//! ```

pub mod denial;
pub mod headers;
pub mod request;
pub mod response;
pub mod server;
pub mod upstream;

pub use request::X_REQUEST_ID;
pub use server::HttpServer;
pub use upstream::UpstreamDispatcher;
