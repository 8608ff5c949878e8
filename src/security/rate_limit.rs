//! Request rate limiting middleware.
//!
//! Every hosted application shares one global per-IP limit; access-token
//! requests on the API application get a stricter dedicated bucket so
//! credential guessing cannot hide inside the general budget.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use crate::observability::metrics;

/// Relative path of the access-token endpoint on the API application.
const ACCESS_TOKEN_PATH: &str = "/access/token";

/// A simple token bucket.
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    fn try_acquire(&mut self, capacity: f64, refill_rate: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum LimitClass {
    General,
    AccessToken,
}

/// Shared state for the rate limiter.
pub struct RateLimiterState {
    buckets: Mutex<HashMap<(IpAddr, LimitClass), TokenBucket>>,
    general_rps: f64,
    access_token_rps: f64,
    allowlist: Vec<IpAddr>,
}

impl RateLimiterState {
    pub fn new(general_rps: u32, access_token_rps: u32, allowlist: Vec<IpAddr>) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            general_rps: general_rps as f64,
            access_token_rps: access_token_rps as f64,
            allowlist,
        }
    }

    /// Build from the configured allow-list strings; unparseable entries
    /// are logged and skipped.
    pub fn from_settings(general_rps: u32, access_token_rps: u32, allowlist: &[String]) -> Self {
        let parsed = allowlist
            .iter()
            .filter_map(|entry| match entry.parse::<IpAddr>() {
                Ok(ip) => Some(ip),
                Err(_) => {
                    tracing::warn!(entry = %entry, "Ignoring unparseable rate-limit allow-list entry");
                    None
                }
            })
            .collect();
        Self::new(general_rps, access_token_rps, parsed)
    }

    pub fn is_allowlisted(&self, ip: &IpAddr) -> bool {
        self.allowlist.contains(ip)
    }

    fn check(&self, ip: IpAddr, class: LimitClass) -> bool {
        let rps = match class {
            LimitClass::General => self.general_rps,
            LimitClass::AccessToken => self.access_token_rps,
        };
        // Burst capacity of twice the sustained rate.
        let burst = rps * 2.0;

        let mut buckets = self.buckets.lock().expect("rate limiter mutex poisoned");
        let bucket = buckets
            .entry((ip, class))
            .or_insert_with(|| TokenBucket::new(burst));
        bucket.try_acquire(burst, rps)
    }
}

/// Middleware enforcing the global and access-token rate limits.
pub async fn rate_limit_middleware(
    State(state): State<Arc<RateLimiterState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let ip = addr.ip();
    if state.is_allowlisted(&ip) {
        return next.run(request).await;
    }

    let class = if request.uri().path().ends_with(ACCESS_TOKEN_PATH) {
        LimitClass::AccessToken
    } else {
        LimitClass::General
    };

    if state.check(ip, class) {
        next.run(request).await
    } else {
        tracing::warn!(client = %ip, class = ?class, "Rate limit exceeded");
        metrics::record_rate_limited(match class {
            LimitClass::General => "general",
            LimitClass::AccessToken => "access_token",
        });
        let mut response = Response::new(Body::from("Rate limit exceeded"));
        *response.status_mut() = StatusCode::TOO_MANY_REQUESTS;
        response
    }
}
