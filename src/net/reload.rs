//! Periodic certificate-material reloading.
//!
//! # Responsibilities
//! - Fingerprint the key, certificate, and trust files on a schedule
//! - Rebuild the rustls context when material changes on disk
//! - Swap the shared TLS config atomically; never disturb open connections
//!
//! # Design Decisions
//! - A failed rebuild keeps the previously loaded material active and the
//!   scanner keeps its schedule; reload failures are never fatal
//! - In-flight handshakes complete against the config they captured at
//!   handshake start (swap-by-reference)

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use axum_server::tls_rustls::RustlsConfig;
use tokio::task::JoinHandle;
use tokio::time;

use crate::config::SecurityConfig;
use crate::net::tls::build_server_config;
use crate::observability::metrics;

type Fingerprint = Vec<Option<(SystemTime, u64)>>;

/// Scans TLS material files and swaps the live context when they change.
pub struct TlsMaterialScanner {
    security: SecurityConfig,
    tls_config: RustlsConfig,
    tracked: Vec<PathBuf>,
    last_seen: Fingerprint,
}

impl TlsMaterialScanner {
    /// Create a scanner over the configured material paths. The current
    /// on-disk state is taken as the baseline fingerprint.
    pub fn new(security: SecurityConfig, tls_config: RustlsConfig) -> Self {
        let tracked: Vec<PathBuf> = [
            security.certificate_path.clone(),
            security.private_key_path.clone(),
            security.trust_bundle_path.clone(),
        ]
        .into_iter()
        .flatten()
        .collect();

        let last_seen = fingerprint(&tracked);
        Self {
            security,
            tls_config,
            tracked,
            last_seen,
        }
    }

    /// Run one scan cycle: reload and swap if the material changed.
    pub fn scan_once(&mut self) {
        let current = fingerprint(&self.tracked);
        if current == self.last_seen {
            return;
        }

        match build_server_config(&self.security) {
            Ok(server_config) => {
                self.tls_config.reload_from_config(Arc::new(server_config));
                self.last_seen = current;
                metrics::record_tls_reload(true);
                tracing::info!("Reloaded TLS material");
            }
            Err(e) => {
                // Fingerprint is deliberately not advanced: the scanner
                // retries until the material on disk becomes loadable.
                metrics::record_tls_reload(false);
                tracing::warn!(
                    error = %e,
                    "Failed to reload TLS material; keeping previously loaded material"
                );
            }
        }
    }

    /// Spawn the scanner on its own periodic timer.
    pub fn spawn(mut self, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(
                interval_secs = interval.as_secs(),
                "TLS material scanner starting"
            );
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
            // The first tick fires immediately; material was just loaded.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.scan_once();
            }
        })
    }
}

fn fingerprint(paths: &[PathBuf]) -> Fingerprint {
    paths
        .iter()
        .map(|path| {
            std::fs::metadata(path)
                .ok()
                .and_then(|m| m.modified().ok().map(|t| (t, m.len())))
        })
        .collect()
}
