//! TLS context construction from PEM material.
//!
//! # Responsibilities
//! - Load certificate chain, private key, and optional trust bundle
//! - Apply protocol include/exclude lists (legacy versions always excluded)
//! - Apply cipher-suite include/exclude lists (include wins when both given)
//! - Select the client-authentication policy (Required vs Wanted)

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig, SupportedProtocolVersion};
use thiserror::Error;

use crate::config::SecurityConfig;

/// Protocol names that are never enabled regardless of the include list.
const LEGACY_PROTOCOLS: &[&str] = &[
    "TLS", "TLSv1", "TLSv1.1", "SSL", "SSLv2", "SSLv2Hello", "SSLv3",
];

/// Default include list when none is configured.
const DEFAULT_PROTOCOLS: &[&str] = &["TLSv1.3", "TLSv1.2"];

/// Error type for TLS context construction.
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("security.{kind} is required for the HTTPS connector")]
    MissingMaterial { kind: &'static str },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No certificates found in {path}")]
    NoCertificates { path: PathBuf },

    #[error("No private key found in {path}")]
    NoPrivateKey { path: PathBuf },

    #[error("Invalid TLS material: {0}")]
    BadMaterial(String),

    #[error("No TLS protocol versions remain after applying include/exclude lists")]
    NoProtocols,

    #[error("No cipher suites remain after applying include/exclude lists")]
    NoCipherSuites,

    #[error("Client certificate verifier could not be built: {0}")]
    Verifier(String),
}

/// Build a rustls server configuration from the security settings.
pub fn build_server_config(security: &SecurityConfig) -> Result<ServerConfig, TlsError> {
    let cert_path = security
        .certificate_path
        .as_deref()
        .ok_or(TlsError::MissingMaterial {
            kind: "certificate_path",
        })?;
    let key_path = security
        .private_key_path
        .as_deref()
        .ok_or(TlsError::MissingMaterial {
            kind: "private_key_path",
        })?;

    let certs = load_certificates(cert_path)?;
    let key = load_private_key(key_path)?;

    let provider = Arc::new(filtered_provider(security)?);
    let versions = selected_protocol_versions(security)?;

    let builder = ServerConfig::builder_with_provider(provider.clone())
        .with_protocol_versions(&versions)
        .map_err(|e| TlsError::BadMaterial(e.to_string()))?;

    let builder = match security.trust_bundle_path.as_deref() {
        Some(trust_path) => {
            let roots = load_root_store(trust_path)?;
            let verifier_builder =
                WebPkiClientVerifier::builder_with_provider(Arc::new(roots), provider);
            // Require client auth when the host offers no alternate login
            // path; otherwise request but do not insist.
            let verifier_builder = if security.client_auth_required {
                verifier_builder
            } else {
                verifier_builder.allow_unauthenticated()
            };
            let verifier = verifier_builder
                .build()
                .map_err(|e| TlsError::Verifier(e.to_string()))?;
            builder.with_client_cert_verifier(verifier)
        }
        None if security.client_auth_required => {
            return Err(TlsError::MissingMaterial {
                kind: "trust_bundle_path",
            });
        }
        None => builder.with_no_client_auth(),
    };

    builder
        .with_single_cert(certs, key)
        .map_err(|e| TlsError::BadMaterial(e.to_string()))
}

fn selected_protocol_versions(
    security: &SecurityConfig,
) -> Result<Vec<&'static SupportedProtocolVersion>, TlsError> {
    let included: Vec<&str> = if security.include_protocols.is_empty() {
        DEFAULT_PROTOCOLS.to_vec()
    } else {
        security
            .include_protocols
            .iter()
            .map(String::as_str)
            .collect()
    };

    let mut versions = Vec::new();
    for name in included {
        if LEGACY_PROTOCOLS.contains(&name) {
            tracing::warn!(protocol = %name, "Legacy TLS protocol version is always excluded");
            continue;
        }
        if security.exclude_protocols.iter().any(|p| p == name) {
            continue;
        }
        match name {
            "TLSv1.3" => versions.push(&rustls::version::TLS13),
            "TLSv1.2" => versions.push(&rustls::version::TLS12),
            other => {
                tracing::warn!(protocol = %other, "Unsupported TLS protocol version; skipping");
            }
        }
    }

    if versions.is_empty() {
        return Err(TlsError::NoProtocols);
    }
    Ok(versions)
}

fn filtered_provider(security: &SecurityConfig) -> Result<CryptoProvider, TlsError> {
    let mut provider = rustls::crypto::ring::default_provider();

    if !security.include_cipher_suites.is_empty() {
        // Include wins when both lists are given.
        provider
            .cipher_suites
            .retain(|suite| security.include_cipher_suites.contains(&suite_name(suite)));
    } else if !security.exclude_cipher_suites.is_empty() {
        provider
            .cipher_suites
            .retain(|suite| !security.exclude_cipher_suites.contains(&suite_name(suite)));
    }

    if provider.cipher_suites.is_empty() {
        return Err(TlsError::NoCipherSuites);
    }
    Ok(provider)
}

fn suite_name(suite: &rustls::SupportedCipherSuite) -> String {
    format!("{:?}", suite.suite())
}

fn load_certificates(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let file = File::open(path).map_err(|e| TlsError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<Result<_, _>>()
        .map_err(|e| TlsError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

    if certs.is_empty() {
        return Err(TlsError::NoCertificates {
            path: path.to_path_buf(),
        });
    }
    Ok(certs)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    let file = File::open(path).map_err(|e| TlsError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    rustls_pemfile::private_key(&mut BufReader::new(file))
        .map_err(|e| TlsError::Io {
            path: path.to_path_buf(),
            source: e,
        })?
        .ok_or_else(|| TlsError::NoPrivateKey {
            path: path.to_path_buf(),
        })
}

fn load_root_store(path: &Path) -> Result<RootCertStore, TlsError> {
    let certs = load_certificates(path)?;
    let mut roots = RootCertStore::empty();
    for cert in certs {
        roots
            .add(cert)
            .map_err(|e| TlsError::BadMaterial(e.to_string()))?;
    }
    Ok(roots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn self_signed_material() -> (tempfile::NamedTempFile, tempfile::NamedTempFile) {
        let key = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        (
            write_temp(&key.cert.pem()),
            write_temp(&key.key_pair.serialize_pem()),
        )
    }

    fn security_with(
        cert: &tempfile::NamedTempFile,
        key: &tempfile::NamedTempFile,
    ) -> SecurityConfig {
        SecurityConfig {
            certificate_path: Some(cert.path().to_path_buf()),
            private_key_path: Some(key.path().to_path_buf()),
            ..SecurityConfig::default()
        }
    }

    #[test]
    fn valid_material_builds_a_config() {
        let (cert, key) = self_signed_material();
        let config = build_server_config(&security_with(&cert, &key));
        assert!(config.is_ok());
    }

    #[test]
    fn missing_paths_are_configuration_errors() {
        let result = build_server_config(&SecurityConfig::default());
        assert!(matches!(result, Err(TlsError::MissingMaterial { .. })));
    }

    #[test]
    fn garbage_pem_is_rejected() {
        let cert = write_temp("not a certificate");
        let key = write_temp("not a key");
        let result = build_server_config(&security_with(&cert, &key));
        assert!(matches!(
            result,
            Err(TlsError::NoCertificates { .. }) | Err(TlsError::BadMaterial(_))
        ));
    }

    #[test]
    fn client_auth_without_trust_bundle_is_rejected() {
        let (cert, key) = self_signed_material();
        let mut security = security_with(&cert, &key);
        security.client_auth_required = true;

        let result = build_server_config(&security);
        assert!(matches!(
            result,
            Err(TlsError::MissingMaterial {
                kind: "trust_bundle_path"
            })
        ));
    }

    #[test]
    fn client_auth_with_trust_bundle_builds() {
        let (cert, key) = self_signed_material();
        let mut security = security_with(&cert, &key);
        security.trust_bundle_path = Some(cert.path().to_path_buf());
        security.client_auth_required = true;

        assert!(build_server_config(&security).is_ok());
    }

    #[test]
    fn legacy_protocols_are_always_excluded() {
        let security = SecurityConfig {
            include_protocols: vec!["SSLv3".to_string(), "TLSv1.2".to_string()],
            ..SecurityConfig::default()
        };
        let versions = selected_protocol_versions(&security).unwrap();
        assert_eq!(versions.len(), 1);
    }

    #[test]
    fn excluding_everything_is_an_error() {
        let security = SecurityConfig {
            exclude_protocols: vec!["TLSv1.3".to_string(), "TLSv1.2".to_string()],
            ..SecurityConfig::default()
        };
        assert!(matches!(
            selected_protocol_versions(&security),
            Err(TlsError::NoProtocols)
        ));
    }

    #[test]
    fn cipher_include_list_wins_over_exclude() {
        let name = "TLS13_AES_256_GCM_SHA384".to_string();
        let security = SecurityConfig {
            include_cipher_suites: vec![name.clone()],
            exclude_cipher_suites: vec![name],
            ..SecurityConfig::default()
        };
        let provider = filtered_provider(&security).unwrap();
        assert_eq!(provider.cipher_suites.len(), 1);
    }

    #[test]
    fn filtering_out_every_cipher_suite_is_an_error() {
        let security = SecurityConfig {
            include_cipher_suites: vec!["NO_SUCH_SUITE".to_string()],
            ..SecurityConfig::default()
        };
        assert!(matches!(
            filtered_provider(&security),
            Err(TlsError::NoCipherSuites)
        ));
    }
}
