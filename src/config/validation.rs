//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check cross-field integrity (TLS material present when HTTPS selected)
//! - Validate value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: HostConfig → Result<(), Vec<ValidationError>>
//! - Connector-specific rules (protocol exclusivity, port range) live in
//!   net::connector where the connectors are built

use thiserror::Error;

use crate::config::schema::HostConfig;

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("security.certificate_path is required when web.https_port is set")]
    MissingCertificatePath,

    #[error("security.private_key_path is required when web.https_port is set")]
    MissingPrivateKeyPath,

    #[error("security.trust_bundle_path is required when security.client_auth_required is set")]
    MissingTrustBundlePath,

    #[error("web.max_requests_per_second must be greater than zero")]
    ZeroRequestRate,

    #[error("web.max_access_token_requests_per_second must be greater than zero")]
    ZeroAccessTokenRate,

    #[error("web.request_timeout_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("web.max_header_size_bytes must be greater than zero")]
    ZeroHeaderSize,

    #[error("security.auto_reload_interval_secs must be greater than zero when auto_reload is enabled")]
    ZeroReloadInterval,
}

/// Validate a parsed configuration, collecting every failure.
pub fn validate_config(config: &HostConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.is_https_configured() {
        if config.security.certificate_path.is_none() {
            errors.push(ValidationError::MissingCertificatePath);
        }
        if config.security.private_key_path.is_none() {
            errors.push(ValidationError::MissingPrivateKeyPath);
        }
    }

    if config.security.client_auth_required && config.security.trust_bundle_path.is_none() {
        errors.push(ValidationError::MissingTrustBundlePath);
    }

    if config.web.max_requests_per_second == 0 {
        errors.push(ValidationError::ZeroRequestRate);
    }
    if config.web.max_access_token_requests_per_second == 0 {
        errors.push(ValidationError::ZeroAccessTokenRate);
    }
    if config.web.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }
    if config.web.max_header_size_bytes == 0 {
        errors.push(ValidationError::ZeroHeaderSize);
    }
    if config.security.auto_reload && config.security.auto_reload_interval_secs == 0 {
        errors.push(ValidationError::ZeroReloadInterval);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&HostConfig::default()).is_ok());
    }

    #[test]
    fn https_without_material_collects_both_errors() {
        let mut config = HostConfig::default();
        config.web.https_port = Some(8443);

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::MissingCertificatePath));
        assert!(errors.contains(&ValidationError::MissingPrivateKeyPath));
    }

    #[test]
    fn client_auth_requires_trust_bundle() {
        let mut config = HostConfig::default();
        config.web.https_port = Some(8443);
        config.security.certificate_path = Some(PathBuf::from("cert.pem"));
        config.security.private_key_path = Some(PathBuf::from("key.pem"));
        config.security.client_auth_required = true;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::MissingTrustBundlePath]);
    }

    #[test]
    fn all_range_errors_are_reported_together() {
        let mut config = HostConfig::default();
        config.web.max_requests_per_second = 0;
        config.web.request_timeout_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
