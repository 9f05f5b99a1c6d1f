//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, query)
//!     → resolver.rs (path overrides, else configured upstream)
//!     → Return: UpstreamTarget (hostname may be empty)
//! ```
//!
//! # Design Decisions
//! - No route table: every request is forwarded somewhere or denied
//! - No regex in the resolver (substring checks only)
//! - Deterministic: same path and config always resolve the same way

pub mod resolver;

pub use resolver::{resolve, UpstreamTarget, AUTH_SERVICE_HOST, INDEX_SERVICE_HOST};
