//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → host_header.rs (reject unrecognized Host headers, HTTPS only)
//!     → rate_limit.rs (per-IP token buckets, allow-list bypass)
//!     → dispatch to the mounted application
//!     → filter.rs (injected security filter, component/viewer UIs only)
//! ```
//!
//! # Design Decisions
//! - The security filter itself is an opaque external collaborator; the
//!   host only injects and invokes it
//! - Fail closed: reject on any security check failure

pub mod context;
pub mod filter;
pub mod host_header;
pub mod rate_limit;

pub use context::{AppAttributes, ConfigurationContext, ContentAccess, DiagnosticsProvider};
pub use filter::SecurityFilter;
pub use host_header::AllowedHosts;
pub use rate_limit::RateLimiterState;
