//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → routing resolves the upstream
//!     → access_control.rs (path, user-agent and client IP policy)
//!         uses patterns.rs (regexes compiled once per configuration)
//!     → Allow: forward | Deny: http::denial renders redirect or decoy page
//! ```
//!
//! # Design Decisions
//! - Fail closed: any matching deny rule rejects
//! - Denials never reveal that a policy exists (decoy page, not 403)
//! - Policy evaluation is read-only

pub mod access_control;
pub mod patterns;

pub use access_control::{AccessGate, Decision, DenyReason, GateRequest};
pub use patterns::PatternCache;
