//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (host.rs):
//!     Created → init (connectors, handler chain)
//!             → start (discovery, mounts, listeners, verification,
//!                      injection, flow engine, auto-loader)
//!             → Running
//!
//! Running (host.rs):
//!     load_extensions(new bundles) — additive, never disturbs live mounts
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger → host.stop → Stopped
//! ```
//!
//! # Design Decisions
//! - Fail fast: any error before Running is fatal, no partial serving
//! - Shutdown is best-effort and does not drain in-flight requests

pub mod flow;
pub mod host;
pub mod shutdown;
pub mod signals;

pub use flow::FlowEngine;
pub use host::{HostCollaborators, HostState, StartupError, WebHost};
pub use shutdown::Shutdown;
