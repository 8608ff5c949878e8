//! Outer router construction.
//!
//! # Responsibilities
//! - Wire the handler chain skeleton around the mount-table dispatcher:
//!   request id, tracing, timeout, host-header guard (HTTPS only), rate
//!   limiting, body size limit, compression, server identification

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue};
use axum::{middleware, Router};
use tower_http::compression::CompressionLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::HostConfig;
use crate::http::dispatch::{dispatch, DispatchState, MountTable};
use crate::security::host_header::host_header_guard;
use crate::security::rate_limit::rate_limit_middleware;
use crate::security::{AllowedHosts, RateLimiterState};

/// Value of the `Server` header when identification is enabled.
pub const SERVER_IDENTIFICATION: &str = concat!("flowhost/", env!("CARGO_PKG_VERSION"));

/// Build the outer router around the mount table. Nothing is mounted here;
/// the dispatcher resolves against the live table on every request.
pub fn build_router(
    config: &HostConfig,
    mounts: Arc<MountTable>,
    limiter: Arc<RateLimiterState>,
    allowed_hosts: Option<Arc<AllowedHosts>>,
) -> Router {
    let mut router = Router::new()
        .fallback(dispatch)
        .with_state(DispatchState { mounts });

    // Layers added later wrap the earlier ones, so this reads inside-out.
    router = router.layer(CompressionLayer::new());
    if config.web.max_request_size_bytes > 0 {
        router = router.layer(RequestBodyLimitLayer::new(config.web.max_request_size_bytes));
    }
    router = router.layer(middleware::from_fn_with_state(
        limiter,
        rate_limit_middleware,
    ));
    if let Some(hosts) = allowed_hosts {
        router = router.layer(middleware::from_fn_with_state(hosts, host_header_guard));
    }
    router = router.layer(TimeoutLayer::new(Duration::from_secs(
        config.web.request_timeout_secs,
    )));
    if config.web.send_server_version {
        router = router.layer(SetResponseHeaderLayer::if_not_present(
            header::SERVER,
            HeaderValue::from_static(SERVER_IDENTIFICATION),
        ));
    }
    router
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
