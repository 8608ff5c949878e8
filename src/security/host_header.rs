//! Host-header validation for encrypted deployments.
//!
//! Active only when the Secure connector family is configured: requests
//! whose Host header does not name this host are rejected before dispatch,
//! closing off DNS-rebinding style access through a browser.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};

/// The set of hostnames and addresses this host answers to.
#[derive(Debug, Default)]
pub struct AllowedHosts {
    hosts: HashSet<String>,
}

impl AllowedHosts {
    /// Build the allowed set from configured hostnames and bound addresses,
    /// always admitting the localhost forms.
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set: HashSet<String> = hosts
            .into_iter()
            .map(|h| h.into().to_lowercase())
            .filter(|h| !h.is_empty())
            .collect();
        for local in ["localhost", "127.0.0.1", "::1"] {
            set.insert(local.to_string());
        }
        Self { hosts: set }
    }

    /// Whether a raw Host header names this host. The port is ignored.
    pub fn permits(&self, host_header: &str) -> bool {
        let host = strip_port(host_header.trim()).to_lowercase();
        !host.is_empty() && self.hosts.contains(&host)
    }
}

/// Strip an optional port, handling bracketed IPv6 literals.
fn strip_port(value: &str) -> &str {
    if let Some(rest) = value.strip_prefix('[') {
        return rest.split(']').next().unwrap_or("");
    }
    match value.rsplit_once(':') {
        // More than one colon without brackets means a bare IPv6 literal.
        Some((host, _)) if !host.contains(':') => host,
        _ => value,
    }
}

/// Middleware rejecting requests whose Host header is not recognized.
pub async fn host_header_guard(
    State(allowed): State<Arc<AllowedHosts>>,
    request: Request,
    next: Next,
) -> Response {
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok());

    match host {
        Some(value) if allowed.permits(value) => next.run(request).await,
        other => {
            tracing::warn!(host = ?other, "Rejecting request with unrecognized Host header");
            let mut response = Response::new(Body::from("Invalid Host header"));
            *response.status_mut() = StatusCode::BAD_REQUEST;
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localhost_forms_are_always_permitted() {
        let allowed = AllowedHosts::new(Vec::<String>::new());
        assert!(allowed.permits("localhost"));
        assert!(allowed.permits("localhost:8443"));
        assert!(allowed.permits("127.0.0.1:8443"));
        assert!(allowed.permits("[::1]:8443"));
    }

    #[test]
    fn configured_hosts_are_permitted_case_insensitively() {
        let allowed = AllowedHosts::new(["Flow.Example.ORG"]);
        assert!(allowed.permits("flow.example.org"));
        assert!(allowed.permits("FLOW.EXAMPLE.ORG:8443"));
    }

    #[test]
    fn unknown_hosts_are_rejected() {
        let allowed = AllowedHosts::new(["flow.example.org"]);
        assert!(!allowed.permits("evil.example.com"));
        assert!(!allowed.permits(""));
    }

    #[test]
    fn bare_ipv6_literals_are_handled() {
        let allowed = AllowedHosts::new(["fe80::1"]);
        assert!(allowed.permits("fe80::1"));
        assert!(allowed.permits("[fe80::1]:8443"));
    }
}
