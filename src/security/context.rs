//! Context attributes injected into hosted applications.
//!
//! Mirrors the attribute handles the orchestrator publishes at injection
//! time: a configuration-context handle, a content-access handle, the UI
//! extension registry, the archive → coordinate mapping, and a diagnostics
//! handle. Hosted applications read them from request extensions.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::time::Instant;

use crate::extension::UiExtensionRegistry;

/// Read-only settings handle published to component UIs.
pub trait ConfigurationContext: Send + Sync {
    fn setting(&self, key: &str) -> Option<String>;
}

/// Repository content retrieval handle published to the content viewer.
pub trait ContentAccess: Send + Sync {
    fn open(&self, content_id: &str) -> io::Result<Vec<u8>>;
}

/// Diagnostics handle published to the core API application.
pub trait DiagnosticsProvider: Send + Sync {
    fn write_dump(&self, out: &mut dyn io::Write) -> io::Result<()>;
}

/// Attributes attached to a hosted application's requests once the host
/// has completed startup.
#[derive(Clone, Default)]
pub struct AppAttributes {
    pub configuration_context: Option<Arc<dyn ConfigurationContext>>,
    pub content_access: Option<Arc<dyn ContentAccess>>,
    pub ui_extensions: Option<Arc<UiExtensionRegistry>>,
    pub extension_mapping: Option<Arc<HashMap<String, Vec<String>>>>,
    pub diagnostics: Option<Arc<dyn DiagnosticsProvider>>,
}

impl std::fmt::Debug for AppAttributes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppAttributes")
            .field("configuration_context", &self.configuration_context.is_some())
            .field("content_access", &self.content_access.is_some())
            .field("ui_extensions", &self.ui_extensions.is_some())
            .field("extension_mapping", &self.extension_mapping.is_some())
            .field("diagnostics", &self.diagnostics.is_some())
            .finish()
    }
}

impl AppAttributes {
    pub fn is_empty(&self) -> bool {
        self.configuration_context.is_none()
            && self.content_access.is_none()
            && self.ui_extensions.is_none()
            && self.extension_mapping.is_none()
            && self.diagnostics.is_none()
    }
}

/// Configuration context backed by a fixed key/value map.
#[derive(Debug, Default)]
pub struct StaticConfigurationContext {
    settings: HashMap<String, String>,
}

impl StaticConfigurationContext {
    pub fn new(settings: HashMap<String, String>) -> Self {
        Self { settings }
    }
}

impl ConfigurationContext for StaticConfigurationContext {
    fn setting(&self, key: &str) -> Option<String> {
        self.settings.get(key).cloned()
    }
}

/// Content access that resolves content ids as paths under a root
/// directory, rejecting traversal outside it.
#[derive(Debug)]
pub struct FileContentAccess {
    root: std::path::PathBuf,
}

impl FileContentAccess {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ContentAccess for FileContentAccess {
    fn open(&self, content_id: &str) -> io::Result<Vec<u8>> {
        let candidate = self.root.join(content_id.trim_start_matches('/'));
        let resolved = candidate.canonicalize()?;
        let root = self.root.canonicalize()?;
        if !resolved.starts_with(&root) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "content id resolves outside the content root",
            ));
        }
        std::fs::read(resolved)
    }
}

/// Diagnostics that report process uptime and version.
pub struct UptimeDiagnostics {
    started: Instant,
}

impl UptimeDiagnostics {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for UptimeDiagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticsProvider for UptimeDiagnostics {
    fn write_dump(&self, out: &mut dyn io::Write) -> io::Result<()> {
        writeln!(out, "flowhost {}", env!("CARGO_PKG_VERSION"))?;
        writeln!(out, "uptime_secs: {}", self.started.elapsed().as_secs())
    }
}
