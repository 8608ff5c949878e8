//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the host.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the web application host.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HostConfig {
    /// Connector and request-handling settings.
    pub web: WebConfig,

    /// TLS material and policy.
    pub security: SecurityConfig,

    /// Cluster participation.
    pub cluster: ClusterConfig,

    /// Plugin bundle locations.
    pub extensions: ExtensionsConfig,

    /// Documentation directories served by the docs application.
    pub docs: DocsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl HostConfig {
    /// Whether the secure connector family is selected.
    pub fn is_https_configured(&self) -> bool {
        self.web.https_port.is_some()
    }

    /// Effective auto-refresh interval used by browser clients, in milliseconds.
    pub fn auto_refresh_millis(&self) -> u64 {
        self.web.auto_refresh_interval_ms.unwrap_or(30_000)
    }
}

/// Connector and request-handling configuration.
///
/// Ports are carried as raw integers so that out-of-range values from the
/// config file reach connector validation instead of failing opaquely at
/// deserialization.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebConfig {
    /// Plaintext listener port. Mutually exclusive with `https_port`.
    pub http_port: Option<i64>,

    /// Encrypted listener port. Mutually exclusive with `http_port`.
    pub https_port: Option<i64>,

    /// Bind hostname for the plaintext connector (wildcard when unset).
    pub http_host: Option<String>,

    /// Bind hostname for the encrypted connector (wildcard when unset).
    pub https_host: Option<String>,

    /// Named network interfaces (label → interface name) for the plaintext
    /// connector. When any are set, one listener is bound per resolved
    /// interface address instead of the single hostname listener.
    pub http_network_interfaces: BTreeMap<String, String>,

    /// Named network interfaces (label → interface name) for the encrypted
    /// connector.
    pub https_network_interfaces: BTreeMap<String, String>,

    /// Maximum request/response header size in bytes.
    pub max_header_size_bytes: usize,

    /// Whether responses carry a `Server` header identifying the host.
    pub send_server_version: bool,

    /// Maximum requests per second per client IP.
    pub max_requests_per_second: u32,

    /// Stricter limit applied to access-token requests on the API app.
    pub max_access_token_requests_per_second: u32,

    /// Client IPs exempt from rate limiting.
    pub request_ip_allowlist: Vec<String>,

    /// Maximum request body size in bytes. Zero disables the limit.
    pub max_request_size_bytes: usize,

    /// Maximum accepted form-encoded payload size in bytes.
    pub max_form_size_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Browser auto-refresh interval in milliseconds. Listener idle timeout
    /// is derived as twice this value so periodic polling keeps connections
    /// alive.
    pub auto_refresh_interval_ms: Option<u64>,

    /// Root directory for unpacked web archives.
    pub working_directory: PathBuf,

    /// Context paths the UI and error applications accept in proxied links.
    pub allowed_context_paths: Vec<String>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            http_port: None,
            https_port: None,
            http_host: None,
            https_host: None,
            http_network_interfaces: BTreeMap::new(),
            https_network_interfaces: BTreeMap::new(),
            max_header_size_bytes: 16 * 1024,
            send_server_version: true,
            max_requests_per_second: 30_000,
            max_access_token_requests_per_second: 25,
            request_ip_allowlist: Vec::new(),
            max_request_size_bytes: 0,
            max_form_size_bytes: 600_000,
            request_timeout_secs: 60,
            auto_refresh_interval_ms: None,
            working_directory: PathBuf::from("./work/web"),
            allowed_context_paths: Vec::new(),
        }
    }
}

/// TLS material and policy for the encrypted connector.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Path to the server certificate chain (PEM).
    pub certificate_path: Option<PathBuf>,

    /// Path to the server private key (PEM).
    pub private_key_path: Option<PathBuf>,

    /// Path to the trusted CA bundle (PEM) used for client authentication.
    pub trust_bundle_path: Option<PathBuf>,

    /// Require client certificates rather than merely requesting them.
    pub client_auth_required: bool,

    /// TLS protocol versions to enable. Empty selects the built-in default
    /// (TLSv1.3 and TLSv1.2). Legacy SSL/TLS versions are always excluded.
    pub include_protocols: Vec<String>,

    /// TLS protocol versions to disable on top of the include list.
    pub exclude_protocols: Vec<String>,

    /// Cipher suites to enable. When set, wins over the exclude list.
    pub include_cipher_suites: Vec<String>,

    /// Cipher suites to disable.
    pub exclude_cipher_suites: Vec<String>,

    /// Re-read certificate material on a schedule and swap it in live.
    pub auto_reload: bool,

    /// Scan interval for certificate material reloads, in seconds.
    pub auto_reload_interval_secs: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            certificate_path: None,
            private_key_path: None,
            trust_bundle_path: None,
            client_auth_required: false,
            include_protocols: Vec::new(),
            exclude_protocols: Vec::new(),
            include_cipher_suites: Vec::new(),
            exclude_cipher_suites: Vec::new(),
            auto_reload: false,
            auto_reload_interval_secs: 10,
        }
    }
}

/// Cluster participation configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClusterConfig {
    /// Whether this host is a node in a cluster. When true, the flow engine
    /// is started once the web layer is confirmed healthy.
    pub node: bool,
}

/// Plugin bundle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtensionsConfig {
    /// Root directory scanned for plugin bundles. Each subdirectory is one
    /// bundle working directory.
    pub directory: PathBuf,
}

impl Default for ExtensionsConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./extensions"),
        }
    }
}

/// Documentation directories served by the docs application.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DocsConfig {
    /// General documentation directory.
    pub directory: PathBuf,

    /// Working directory holding generated component documentation.
    pub component_working_directory: PathBuf,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./docs"),
            component_working_directory: PathBuf::from("./work/docs/components"),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
