//! Web archive discovery and classification.
//!
//! # Data Flow
//! ```text
//! Bundle working directories
//!     → discovery.rs (find .webar files, tag each with a Role)
//!     → descriptor.rs (read META-INF descriptor entries from "other" archives)
//!     → extension registry merge (extension::registry)
//! ```
//!
//! # Design Decisions
//! - Role is derived once from the filename at discovery and never
//!   re-derived downstream
//! - An unreadable dependencies directory is fatal (broken bundle unpack);
//!   an absent one just means the bundle ships no archives

pub mod descriptor;
pub mod discovery;

pub use descriptor::identify_ui_extensions;
pub use discovery::{
    classify_core_roles, find_archives, ClassificationError, ClassifiedArchives,
    DiscoveredArchive, DiscoveryError, Role,
};
