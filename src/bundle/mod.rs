//! Plugin bundle model and discovery.
//!
//! # Data Flow
//! ```text
//! extensions root directory
//!     → discover_bundles (one Bundle per subdirectory)
//!     → archive::discovery (web archives inside each bundle)
//!     → autoload.rs (watch for bundles arriving after startup)
//! ```

pub mod autoload;

use std::io;
use std::path::{Path, PathBuf};

pub use autoload::BundleAutoLoader;

/// An opaque plugin package with an unpacked working directory. Owned
/// externally; the host only reads from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bundle {
    name: String,
    working_directory: PathBuf,
}

impl Bundle {
    pub fn new(name: impl Into<String>, working_directory: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            working_directory: working_directory.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }
}

/// Enumerate bundles under the extensions root. Each subdirectory is one
/// bundle working directory; a missing root yields no bundles.
pub fn discover_bundles(root: &Path) -> io::Result<Vec<Bundle>> {
    if !root.is_dir() {
        tracing::debug!(root = %root.display(), "Extensions root does not exist; no bundles");
        return Ok(Vec::new());
    }

    let mut bundles = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        bundles.push(Bundle::new(name, entry.path()));
    }
    bundles.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(bundles)
}
