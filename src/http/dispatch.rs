//! Mount table and request dispatch.
//!
//! # Design Decisions
//! - Copy-on-write mount set: request handlers resolve against an immutable
//!   snapshot while a single writer publishes additions atomically, so a
//!   dynamic load never disturbs in-flight requests to other mounts
//! - Longest context path wins; the error application at `/` catches the
//!   rest

use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::http::webapp::HostedApp;
use crate::observability::metrics;

/// The set of mounted applications, ordered most-specific first.
#[derive(Debug, Default)]
pub struct MountTable {
    apps: ArcSwap<Vec<Arc<HostedApp>>>,
}

impl MountTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically add applications to the live mount set.
    pub fn publish(&self, new_apps: Vec<Arc<HostedApp>>) {
        self.apps.rcu(|current| {
            let mut apps: Vec<Arc<HostedApp>> = (**current).clone();
            apps.extend(new_apps.iter().cloned());
            apps.sort_by(|a, b| {
                b.context_path()
                    .len()
                    .cmp(&a.context_path().len())
                    .then_with(|| a.context_path().cmp(b.context_path()))
            });
            apps
        });
    }

    /// The mounted application handling the given request path.
    pub fn resolve(&self, path: &str) -> Option<Arc<HostedApp>> {
        self.apps
            .load()
            .iter()
            .find(|app| app.matches_path(path))
            .cloned()
    }

    pub fn contains_context(&self, context_path: &str) -> bool {
        self.apps
            .load()
            .iter()
            .any(|app| app.context_path() == context_path)
    }

    /// Snapshot of every mounted application.
    pub fn apps(&self) -> Vec<Arc<HostedApp>> {
        self.apps.load().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.apps.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.load().is_empty()
    }
}

/// State injected into the dispatcher.
#[derive(Clone)]
pub struct DispatchState {
    pub mounts: Arc<MountTable>,
}

/// Fallback handler routing every request through the mount table.
pub async fn dispatch(State(state): State<DispatchState>, request: Request) -> Response {
    let start = Instant::now();
    let path = request.uri().path().to_string();

    match state.mounts.resolve(&path) {
        Some(app) => {
            let response = app.serve(request).await;
            metrics::record_request(app.context_path(), response.status(), start);
            response
        }
        None => {
            tracing::debug!(path = %path, "No mounted application for request");
            metrics::record_request("none", StatusCode::NOT_FOUND, start);
            (StatusCode::NOT_FOUND, "No web application mounted at this path").into_response()
        }
    }
}
