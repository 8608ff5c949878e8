//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! HostConfig
//!     → connector.rs (validate, resolve interfaces, build ConnectorSpecs, bind)
//!     → tls.rs (rustls ServerConfig from PEM material, when Secure)
//!     → reload.rs (periodic material scan, atomic context swap)
//!     → Listeners handed to the lifecycle orchestrator for serving
//! ```
//!
//! # Design Decisions
//! - Exactly one connector family (Plain or Secure) per process
//! - Interface names multiply one connector into several bound listeners
//! - TLS material lives behind a swap-by-reference handle; in-flight
//!   handshakes finish against the material they captured

pub mod connector;
pub mod reload;
pub mod tls;

pub use connector::{
    bind_listeners, build_connector_specs, BindTarget, BoundConnector, ConnectorError,
    ConnectorSpec, Protocol,
};
pub use reload::TlsMaterialScanner;
pub use tls::{build_server_config, TlsError};
