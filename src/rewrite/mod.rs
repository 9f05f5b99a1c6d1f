//! Hostname substitution subsystem.
//!
//! # Data Flow
//! ```text
//! Request path:   header value (origin host)   → hostname.rs → header value (upstream host)
//! Response path:  header value / text body     → hostname.rs → origin host restored
//! ```
//!
//! # Design Decisions
//! - Hostnames are matched literally, never compiled into a regex
//! - Word boundaries follow ASCII `\b` semantics
//! - A dot directly before the hostname protects it (`cdn.example.com` stays intact)
//! - Unchanged input is returned borrowed

pub mod hostname;

pub use hostname::{rewrite, rewrite_with_path_suffix};
