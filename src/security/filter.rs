//! Injectable security filter.
//!
//! The host does not implement authentication itself; it carries an opaque
//! filter handle supplied by the embedding application and attaches it to
//! every hosted application that serves component or content-viewer UI.

use axum::http::{HeaderMap, Method, StatusCode, Uri};

/// An opaque request filter attached to hosted applications.
///
/// Implementations decide whether a request may proceed; a rejection
/// short-circuits the mounted application with the returned status.
pub trait SecurityFilter: Send + Sync {
    /// Filter name used in logs.
    fn name(&self) -> &str;

    /// Check a request before it reaches the hosted application.
    fn check(&self, method: &Method, uri: &Uri, headers: &HeaderMap) -> Result<(), StatusCode>;
}

/// Filter that admits every request. Useful for plaintext deployments and
/// tests.
#[derive(Debug, Default)]
pub struct AllowAll;

impl SecurityFilter for AllowAll {
    fn name(&self) -> &str {
        "allow-all"
    }

    fn check(&self, _: &Method, _: &Uri, _: &HeaderMap) -> Result<(), StatusCode> {
        Ok(())
    }
}

/// Filter that requires a fixed bearer token in the Authorization header.
#[derive(Debug)]
pub struct BearerTokenFilter {
    expected: String,
}

impl BearerTokenFilter {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            expected: format!("Bearer {}", token.into()),
        }
    }
}

impl SecurityFilter for BearerTokenFilter {
    fn name(&self) -> &str {
        "bearer-token"
    }

    fn check(&self, _: &Method, _: &Uri, headers: &HeaderMap) -> Result<(), StatusCode> {
        let authorization = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        match authorization {
            Some(value) if value == self.expected => Ok(()),
            Some(_) => Err(StatusCode::FORBIDDEN),
            None => Err(StatusCode::UNAUTHORIZED),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_parts(authorization: Option<&str>) -> (Method, Uri, HeaderMap) {
        let mut headers = HeaderMap::new();
        if let Some(value) = authorization {
            headers.insert(
                axum::http::header::AUTHORIZATION,
                value.parse().unwrap(),
            );
        }
        (Method::GET, Uri::from_static("/custom-ui/index.html"), headers)
    }

    #[test]
    fn allow_all_admits_everything() {
        let (method, uri, headers) = request_parts(None);
        assert!(AllowAll.check(&method, &uri, &headers).is_ok());
    }

    #[test]
    fn bearer_filter_requires_the_token() {
        let filter = BearerTokenFilter::new("secret");

        let (method, uri, headers) = request_parts(Some("Bearer secret"));
        assert!(filter.check(&method, &uri, &headers).is_ok());

        let (method, uri, headers) = request_parts(Some("Bearer wrong"));
        assert_eq!(
            filter.check(&method, &uri, &headers),
            Err(StatusCode::FORBIDDEN)
        );

        let (method, uri, headers) = request_parts(None);
        assert_eq!(
            filter.check(&method, &uri, &headers),
            Err(StatusCode::UNAUTHORIZED)
        );
    }
}
