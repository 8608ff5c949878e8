//! HTTP serving subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection (net)
//!     → server.rs (outer router: request id, trace, timeout, host guard,
//!                  rate limits, body limit, compression)
//!     → dispatch.rs (mount table, longest context-path match)
//!     → webapp.rs (security filter, attributes, static assets)
//! ```
//!
//! # Design Decisions
//! - The mount table is copy-on-write: request handlers read lock-free
//!   while a single writer publishes a load wave
//! - Hosted applications are opaque asset trees; the host never routes
//!   inside them

pub mod dispatch;
pub mod server;
pub mod webapp;

pub use dispatch::{DispatchState, MountTable};
pub use server::build_router;
pub use webapp::{HostedApp, MountError};
