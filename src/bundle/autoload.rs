//! Background plugin auto-loader.
//!
//! Watches the extensions root for bundles arriving after startup and
//! feeds them into the running host as a dynamic extension load.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Weak;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::bundle::discover_bundles;
use crate::lifecycle::host::WebHost;

/// Watches for newly arriving plugin bundles.
pub struct BundleAutoLoader {
    // Held to keep the notify backend alive.
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl BundleAutoLoader {
    /// Start watching the extensions root. Newly created bundle
    /// directories are loaded into the host; bundles named in `known`
    /// were already loaded at startup and are skipped.
    pub fn start(
        directory: &Path,
        host: Weak<WebHost>,
        known: HashSet<String>,
    ) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |result: notify::Result<Event>| match result {
                Ok(event) => {
                    if event.kind.is_create() || event.kind.is_modify() {
                        for path in event.paths {
                            let _ = tx.send(path);
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(directory, RecursiveMode::NonRecursive)?;
        tracing::info!(path = %directory.display(), "Plugin auto-loader started");

        let task = tokio::spawn(run_loader(directory.to_path_buf(), host, known, rx));
        Ok(Self {
            _watcher: watcher,
            task,
        })
    }

    /// Stop watching. Best-effort; a load in progress is abandoned.
    pub fn stop(self) {
        self.task.abort();
        tracing::info!("Plugin auto-loader stopped");
    }
}

async fn run_loader(
    directory: std::path::PathBuf,
    host: Weak<WebHost>,
    mut known: HashSet<String>,
    mut rx: mpsc::UnboundedReceiver<std::path::PathBuf>,
) {
    while rx.recv().await.is_some() {
        // Give the bundle unpacker a moment to finish, then drain the
        // burst of events it produced.
        tokio::time::sleep(Duration::from_millis(500)).await;
        while rx.try_recv().is_ok() {}

        let Some(host) = host.upgrade() else {
            break;
        };

        let bundles = match discover_bundles(&directory) {
            Ok(bundles) => bundles,
            Err(e) => {
                tracing::error!(error = %e, "Unable to enumerate plugin bundles");
                continue;
            }
        };

        let new_bundles: Vec<_> = bundles
            .into_iter()
            .filter(|b| !known.contains(b.name()))
            .collect();
        if new_bundles.is_empty() {
            continue;
        }

        for bundle in &new_bundles {
            known.insert(bundle.name().to_string());
        }
        tracing::info!(count = new_bundles.len(), "Discovered new plugin bundles");
        host.load_extensions(new_bundles);
    }
}
