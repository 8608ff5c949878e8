//! Web archive discovery and core-role classification.

use std::path::PathBuf;

use thiserror::Error;

use crate::bundle::Bundle;

/// Sub-path inside every bundle working directory that may hold archives.
pub const BUNDLED_DEPENDENCIES_PATH: &str = "BUNDLE-INF/bundled-dependencies";

/// File extension of deployable web archives.
pub const ARCHIVE_EXTENSION: &str = "webar";

const MARKER_API: &str = "flowhost-web-api";
const MARKER_ERROR: &str = "flowhost-web-error";
const MARKER_DOCS: &str = "flowhost-web-docs";
const MARKER_CONTENT_VIEWER: &str = "flowhost-web-content-viewer";
const MARKER_UI: &str = "flowhost-web";

/// The function an archive plays in the assembled host. Assigned once at
/// discovery from the filename; downstream code switches on the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    CoreUi,
    CoreApi,
    CoreDocs,
    CoreContentViewer,
    CoreError,
    Extension,
}

impl Role {
    /// Derive the role from an archive filename, case-insensitively.
    ///
    /// The more specific markers are checked before the catch-all UI
    /// marker, which is a prefix of all of them.
    pub fn from_file_name(file_name: &str) -> Role {
        let name = file_name.to_lowercase();
        if name.starts_with(MARKER_API) {
            Role::CoreApi
        } else if name.starts_with(MARKER_ERROR) {
            Role::CoreError
        } else if name.starts_with(MARKER_DOCS) {
            Role::CoreDocs
        } else if name.starts_with(MARKER_CONTENT_VIEWER) {
            Role::CoreContentViewer
        } else if name.starts_with(MARKER_UI) {
            Role::CoreUi
        } else {
            Role::Extension
        }
    }

    /// Context path a core archive mounts at. Extensions derive theirs from
    /// the archive filename instead.
    pub fn context_path(&self) -> Option<&'static str> {
        match self {
            Role::CoreUi => Some("/flowhost"),
            Role::CoreApi => Some("/flowhost-api"),
            Role::CoreDocs => Some("/flowhost-docs"),
            Role::CoreContentViewer => Some("/flowhost-content-viewer"),
            Role::CoreError => Some("/"),
            Role::Extension => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::CoreUi => "core-ui",
            Role::CoreApi => "core-api",
            Role::CoreDocs => "core-docs",
            Role::CoreContentViewer => "core-content-viewer",
            Role::CoreError => "core-error",
            Role::Extension => "extension",
        };
        f.write_str(name)
    }
}

/// An archive found inside a bundle, tagged with its role.
#[derive(Debug, Clone)]
pub struct DiscoveredArchive {
    pub path: PathBuf,
    pub bundle: Bundle,
    pub role: Role,
}

impl DiscoveredArchive {
    /// Archive filename without the extension; extension archives mount at
    /// `/<stem>`.
    pub fn file_stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Error type for archive discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Unable to access bundled dependencies in {path}: {source}")]
    DependencyListing {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Error type for core-role classification.
#[derive(Debug, Clone, Error)]
#[error("Unable to load the {0} web application archive")]
pub struct ClassificationError(pub Role);

/// Archives partitioned into the five required core roles and the
/// extension candidates.
#[derive(Debug)]
pub struct ClassifiedArchives {
    pub ui: DiscoveredArchive,
    pub api: DiscoveredArchive,
    pub docs: DiscoveredArchive,
    pub content_viewer: DiscoveredArchive,
    pub error: DiscoveredArchive,
    pub others: Vec<DiscoveredArchive>,
}

/// Find every deployable web archive shipped in the given bundles.
///
/// A bundle without the dependencies sub-path ships no archives; a
/// dependencies directory that cannot be enumerated signals a broken
/// bundle unpack and is fatal.
pub fn find_archives(bundles: &[Bundle]) -> Result<Vec<DiscoveredArchive>, DiscoveryError> {
    let mut archives = Vec::new();

    for bundle in bundles {
        let dependencies = bundle.working_directory().join(BUNDLED_DEPENDENCIES_PATH);
        if !dependencies.is_dir() {
            tracing::debug!(
                bundle = %bundle.name(),
                path = %dependencies.display(),
                "Bundle ships no web archives"
            );
            continue;
        }

        let entries =
            std::fs::read_dir(&dependencies).map_err(|e| DiscoveryError::DependencyListing {
                path: dependencies.clone(),
                source: e,
            })?;

        for entry in entries {
            let entry = entry.map_err(|e| DiscoveryError::DependencyListing {
                path: dependencies.clone(),
                source: e,
            })?;
            let path = entry.path();
            let is_archive = path.is_file()
                && path
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION))
                    .unwrap_or(false);
            if !is_archive {
                continue;
            }

            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let role = Role::from_file_name(&file_name);
            tracing::debug!(
                bundle = %bundle.name(),
                archive = %file_name,
                role = %role,
                "Discovered web archive"
            );
            archives.push(DiscoveredArchive {
                path,
                bundle: bundle.clone(),
                role,
            });
        }
    }

    Ok(archives)
}

/// Partition discovered archives by role, requiring each core role exactly
/// once. A duplicate core role keeps the first archive and logs the rest.
pub fn classify_core_roles(
    archives: Vec<DiscoveredArchive>,
) -> Result<ClassifiedArchives, ClassificationError> {
    let mut ui: Option<DiscoveredArchive> = None;
    let mut api = None;
    let mut docs = None;
    let mut content_viewer = None;
    let mut error = None;
    let mut others = Vec::new();

    for archive in archives {
        let slot = match archive.role {
            Role::CoreUi => &mut ui,
            Role::CoreApi => &mut api,
            Role::CoreDocs => &mut docs,
            Role::CoreContentViewer => &mut content_viewer,
            Role::CoreError => &mut error,
            Role::Extension => {
                others.push(archive);
                continue;
            }
        };
        if let Some(existing) = slot.as_ref() {
            tracing::warn!(
                role = %archive.role,
                kept = %existing.path.display(),
                ignored = %archive.path.display(),
                "Duplicate core archive; keeping the first"
            );
            continue;
        }
        *slot = Some(archive);
    }

    Ok(ClassifiedArchives {
        ui: ui.ok_or(ClassificationError(Role::CoreUi))?,
        api: api.ok_or(ClassificationError(Role::CoreApi))?,
        docs: docs.ok_or(ClassificationError(Role::CoreDocs))?,
        content_viewer: content_viewer.ok_or(ClassificationError(Role::CoreContentViewer))?,
        error: error.ok_or(ClassificationError(Role::CoreError))?,
        others,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archive(name: &str) -> DiscoveredArchive {
        let path = PathBuf::from(format!("/bundles/b/BUNDLE-INF/bundled-dependencies/{name}"));
        DiscoveredArchive {
            role: Role::from_file_name(name),
            path,
            bundle: Bundle::new("b", "/bundles/b"),
        }
    }

    #[test]
    fn role_markers_are_checked_most_specific_first() {
        assert_eq!(
            Role::from_file_name("flowhost-web-api-1.2.webar"),
            Role::CoreApi
        );
        assert_eq!(
            Role::from_file_name("flowhost-web-content-viewer-1.2.webar"),
            Role::CoreContentViewer
        );
        assert_eq!(Role::from_file_name("flowhost-web-1.2.webar"), Role::CoreUi);
        assert_eq!(
            Role::from_file_name("custom-processor-ui.webar"),
            Role::Extension
        );
    }

    #[test]
    fn role_matching_is_case_insensitive() {
        assert_eq!(
            Role::from_file_name("FLOWHOST-WEB-DOCS-2.0.WEBAR"),
            Role::CoreDocs
        );
    }

    #[test]
    fn missing_core_role_is_identified() {
        let archives = vec![
            archive("flowhost-web-1.0.webar"),
            archive("flowhost-web-api-1.0.webar"),
            archive("flowhost-web-content-viewer-1.0.webar"),
            archive("flowhost-web-error-1.0.webar"),
        ];

        let err = classify_core_roles(archives).unwrap_err();
        assert_eq!(err.0, Role::CoreDocs);
        assert!(err.to_string().contains("core-docs"));
    }

    #[test]
    fn complete_set_classifies_with_extensions_in_others() {
        let archives = vec![
            archive("flowhost-web-1.0.webar"),
            archive("flowhost-web-api-1.0.webar"),
            archive("flowhost-web-docs-1.0.webar"),
            archive("flowhost-web-content-viewer-1.0.webar"),
            archive("flowhost-web-error-1.0.webar"),
            archive("custom-ui-1.0.webar"),
        ];

        let classified = classify_core_roles(archives).unwrap();
        assert_eq!(classified.ui.role, Role::CoreUi);
        assert_eq!(classified.others.len(), 1);
        assert_eq!(classified.others[0].file_stem(), "custom-ui-1.0");
    }

    #[test]
    fn discovery_skips_bundles_without_dependencies() {
        let root = tempfile::tempdir().unwrap();
        let bundle_dir = root.path().join("empty-bundle");
        std::fs::create_dir(&bundle_dir).unwrap();

        let archives = find_archives(&[Bundle::new("empty-bundle", bundle_dir)]).unwrap();
        assert!(archives.is_empty());
    }

    #[test]
    fn discovery_lists_only_webar_files() {
        let root = tempfile::tempdir().unwrap();
        let deps = root.path().join("b").join(BUNDLED_DEPENDENCIES_PATH);
        std::fs::create_dir_all(&deps).unwrap();
        std::fs::write(deps.join("flowhost-web-1.0.webar"), b"zip").unwrap();
        std::fs::write(deps.join("library.jar"), b"nope").unwrap();
        std::fs::write(deps.join("UPPER.WEBAR"), b"zip").unwrap();

        let archives = find_archives(&[Bundle::new("b", root.path().join("b"))]).unwrap();
        assert_eq!(archives.len(), 2);
    }
}
