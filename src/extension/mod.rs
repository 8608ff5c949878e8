//! UI extension registry subsystem.
//!
//! # Data Flow
//! ```text
//! archive descriptors (archive::descriptor)
//!     → registry.rs merge (initial load + later dynamic waves)
//!     → coordinate → UI extension lookups by the hosted API
//!     → content type → viewer context path lookups by the content viewer
//! ```
//!
//! # Design Decisions
//! - Merges are additive-only; a load wave never removes or mutates
//!   previously registered entries
//! - Reads are lock-free for request handlers; writers serialize through
//!   the orchestrator's load lock

pub mod registry;

pub use registry::{ConflictError, UiExtension, UiExtensionRegistry, UiExtensionType};
