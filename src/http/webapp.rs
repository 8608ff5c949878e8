//! Hosted web applications.
//!
//! A hosted application is a mounted web archive: the archive is unpacked
//! into the working directory and its assets served at a context path.
//! Component and content-viewer UIs additionally carry an injectable
//! security filter and context attributes.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use axum::body::Body;
use axum::extract::Request;
use axum::http::Uri;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tower::ServiceExt;
use tower_http::services::ServeDir;
use zip::ZipArchive;

use crate::archive::{DiscoveredArchive, Role};
use crate::security::{AppAttributes, SecurityFilter};

/// Error type for mounting an archive.
#[derive(Debug, Error)]
pub enum MountError {
    #[error("{path} is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("Failed to prepare working directory {path}: {source}")]
    WorkingDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path} does not have read/write privilege: {source}")]
    Privileges {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to unpack {path}: {source}")]
    Unpack {
        path: PathBuf,
        source: zip::result::ZipError,
    },
}

/// A running mount of a web archive at a context path.
pub struct HostedApp {
    context_path: String,
    archive_path: PathBuf,
    role: Role,
    serves_component_ui: bool,
    serves_content_viewer: bool,
    init_params: HashMap<String, String>,
    content_root: PathBuf,
    assets: ServeDir,
    extra_mounts: Vec<(String, ServeDir)>,
    security_filter: RwLock<Option<Arc<dyn SecurityFilter>>>,
    attributes: RwLock<Option<AppAttributes>>,
}

impl std::fmt::Debug for HostedApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedApp")
            .field("context_path", &self.context_path)
            .field("archive_path", &self.archive_path)
            .field("role", &self.role)
            .field("serves_component_ui", &self.serves_component_ui)
            .field("serves_content_viewer", &self.serves_content_viewer)
            .finish()
    }
}

impl HostedApp {
    /// Unpack an archive under the working directory and prepare it for
    /// serving at the given context path.
    pub fn mount(
        archive: &DiscoveredArchive,
        context_path: &str,
        working_directory: &Path,
    ) -> Result<HostedApp, MountError> {
        let file_name = archive
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content_root = working_directory.join(&file_name);

        if content_root.exists() && !content_root.is_dir() {
            return Err(MountError::NotADirectory { path: content_root });
        }
        std::fs::create_dir_all(&content_root).map_err(|e| MountError::WorkingDirectory {
            path: content_root.clone(),
            source: e,
        })?;
        verify_read_write(&content_root)?;

        let file = File::open(&archive.path).map_err(|e| MountError::Open {
            path: archive.path.clone(),
            source: e,
        })?;
        let mut zip = ZipArchive::new(BufReader::new(file)).map_err(|e| MountError::Unpack {
            path: archive.path.clone(),
            source: e,
        })?;
        zip.extract(&content_root).map_err(|e| MountError::Unpack {
            path: archive.path.clone(),
            source: e,
        })?;

        tracing::info!(
            archive = %archive.path.display(),
            context_path = %context_path,
            "Loading web application archive"
        );

        Ok(HostedApp {
            context_path: context_path.to_string(),
            archive_path: archive.path.clone(),
            role: archive.role,
            serves_component_ui: false,
            serves_content_viewer: false,
            init_params: HashMap::new(),
            assets: ServeDir::new(&content_root),
            content_root,
            extra_mounts: Vec::new(),
            security_filter: RwLock::new(None),
            attributes: RwLock::new(None),
        })
    }

    pub fn context_path(&self) -> &str {
        &self.context_path
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    pub fn serves_component_ui(&self) -> bool {
        self.serves_component_ui
    }

    pub fn serves_content_viewer(&self) -> bool {
        self.serves_content_viewer
    }

    pub fn mark_component_ui(&mut self) {
        self.serves_component_ui = true;
    }

    pub fn mark_content_viewer(&mut self) {
        self.serves_content_viewer = true;
    }

    pub fn set_init_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.init_params.insert(name.into(), value.into());
    }

    pub fn init_param(&self, name: &str) -> Option<&str> {
        self.init_params.get(name).map(String::as_str)
    }

    /// Serve an additional directory under a path prefix inside this app,
    /// ahead of the unpacked archive assets.
    pub fn add_static_mount(&mut self, prefix: impl Into<String>, directory: impl AsRef<Path>) {
        self.extra_mounts
            .push((prefix.into(), ServeDir::new(directory.as_ref())));
    }

    /// Attach the security filter. Takes effect for the next request.
    pub fn attach_security_filter(&self, filter: Arc<dyn SecurityFilter>) {
        tracing::debug!(
            context_path = %self.context_path,
            filter = filter.name(),
            "Attached security filter"
        );
        *self
            .security_filter
            .write()
            .expect("security filter lock poisoned") = Some(filter);
    }

    /// Publish context attributes to this application's requests.
    pub fn publish_attributes(&self, attributes: AppAttributes) {
        *self.attributes.write().expect("attributes lock poisoned") = Some(attributes);
    }

    pub fn has_security_filter(&self) -> bool {
        self.security_filter
            .read()
            .expect("security filter lock poisoned")
            .is_some()
    }

    /// Whether this app handles the given request path.
    pub fn matches_path(&self, path: &str) -> bool {
        if self.context_path == "/" {
            return true;
        }
        path == self.context_path || path.starts_with(&format!("{}/", self.context_path))
    }

    /// Serve a request routed to this application.
    pub async fn serve(&self, mut request: Request) -> Response {
        if self.serves_component_ui || self.serves_content_viewer {
            let filter = self
                .security_filter
                .read()
                .expect("security filter lock poisoned")
                .clone();
            if let Some(filter) = filter {
                if let Err(status) =
                    filter.check(request.method(), request.uri(), request.headers())
                {
                    tracing::debug!(
                        context_path = %self.context_path,
                        filter = filter.name(),
                        status = %status,
                        "Security filter rejected request"
                    );
                    return status.into_response();
                }
            }
        }

        let attributes = self
            .attributes
            .read()
            .expect("attributes lock poisoned")
            .clone();
        if let Some(attributes) = attributes {
            request.extensions_mut().insert(attributes);
        }

        let relative = self.relative_path(request.uri().path());
        let (service, service_path) = self.resolve_service(&relative);
        *request.uri_mut() = rewrite_uri(request.uri(), &service_path);

        match service.oneshot(request).await {
            Ok(response) => response.map(Body::new).into_response(),
            Err(infallible) => match infallible {},
        }
    }

    /// Request path relative to this app's context.
    fn relative_path(&self, path: &str) -> String {
        if self.context_path == "/" {
            return path.to_string();
        }
        let rest = &path[self.context_path.len()..];
        if rest.is_empty() {
            "/".to_string()
        } else {
            rest.to_string()
        }
    }

    fn resolve_service(&self, relative: &str) -> (ServeDir, String) {
        for (prefix, service) in &self.extra_mounts {
            if relative == prefix || relative.starts_with(&format!("{prefix}/")) {
                let rest = &relative[prefix.len()..];
                let rest = if rest.is_empty() { "/" } else { rest };
                return (service.clone(), rest.to_string());
            }
        }
        (self.assets.clone(), relative.to_string())
    }

    /// Construct an app over an existing directory without an archive.
    #[cfg(test)]
    pub(crate) fn for_tests(context_path: &str, content_root: &Path) -> HostedApp {
        HostedApp {
            context_path: context_path.to_string(),
            archive_path: PathBuf::new(),
            role: Role::Extension,
            serves_component_ui: false,
            serves_content_viewer: false,
            init_params: HashMap::new(),
            assets: ServeDir::new(content_root),
            content_root: content_root.to_path_buf(),
            extra_mounts: Vec::new(),
            security_filter: RwLock::new(None),
            attributes: RwLock::new(None),
        }
    }
}

fn verify_read_write(directory: &Path) -> Result<(), MountError> {
    let probe = directory.join(".rw-probe");
    std::fs::write(&probe, b"probe").map_err(|e| MountError::Privileges {
        path: directory.to_path_buf(),
        source: e,
    })?;
    std::fs::read(&probe).map_err(|e| MountError::Privileges {
        path: directory.to_path_buf(),
        source: e,
    })?;
    let _ = std::fs::remove_file(&probe);
    Ok(())
}

fn rewrite_uri(original: &Uri, path: &str) -> Uri {
    let path_and_query = match original.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };
    Uri::try_from(path_and_query).unwrap_or_else(|_| Uri::from_static("/"))
}
