//! Connector construction and binding.
//!
//! # Responsibilities
//! - Enforce mutual exclusivity of the plaintext and encrypted connectors
//! - Validate ports and resolve named network interfaces to addresses
//! - Compute the per-listener idle timeout from the auto-refresh interval
//! - Bind every resolved listener before the host accepts traffic
//!
//! # Design Decisions
//! - An interface name that resolves to nothing is skipped with a warning;
//!   zero bound listeners overall is fatal
//! - Idle timeout is twice the auto-refresh interval so periodic client
//!   polling does not trip idle disconnects

use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr, TcpListener};
use std::time::Duration;

use thiserror::Error;

use crate::config::HostConfig;
use crate::net::tls::TlsError;

/// Connector protocol family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Plain,
    Secure,
}

impl Protocol {
    pub fn scheme(&self) -> &'static str {
        match self {
            Protocol::Plain => "http",
            Protocol::Secure => "https",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Protocol::Plain => "HTTP",
            Protocol::Secure => "HTTPS",
        }
    }
}

/// Where a connector binds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindTarget {
    /// Configured hostname, or the wildcard address when unset.
    Host(Option<String>),
    /// A concrete address resolved from a named network interface.
    Address(IpAddr),
}

/// A single listener to be bound, fully resolved from configuration.
#[derive(Debug, Clone)]
pub struct ConnectorSpec {
    pub protocol: Protocol,
    /// Display label, e.g. "HTTPS" or "HTTPS eth0".
    pub label: String,
    pub target: BindTarget,
    pub port: u16,
    /// Applied to HTTP/1 header reads on the bound listener.
    pub idle_timeout: Duration,
}

impl ConnectorSpec {
    /// The address string this spec binds to.
    pub fn bind_address(&self) -> String {
        match &self.target {
            BindTarget::Host(Some(host)) => format!("{}:{}", host, self.port),
            BindTarget::Host(None) => format!("0.0.0.0:{}", self.port),
            BindTarget::Address(ip) => SocketAddr::new(*ip, self.port).to_string(),
        }
    }
}

/// A spec together with its bound socket.
pub struct BoundConnector {
    pub spec: ConnectorSpec,
    pub listener: TcpListener,
    pub local_addr: SocketAddr,
}

/// Error type for connector configuration and binding.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Only one of the HTTP and HTTPS connectors can be configured at one time")]
    BothConnectorsConfigured,

    #[error("Must configure HTTP or HTTPS connector")]
    NoConnectorConfigured,

    #[error("Invalid {label} port: {port}")]
    InvalidPort { label: &'static str, port: i64 },

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("No listeners could be bound from the configured connectors")]
    NoListeners,
}

/// Build the set of connector specs for the host, enforcing protocol
/// exclusivity and port validity.
pub fn build_connector_specs(config: &HostConfig) -> Result<Vec<ConnectorSpec>, ConnectorError> {
    let idle_timeout = Duration::from_millis(config.auto_refresh_millis() * 2);

    let (protocol, raw_port, host, interfaces) = match (config.web.http_port, config.web.https_port)
    {
        (Some(_), Some(_)) => {
            tracing::error!(
                "Both the HTTP and HTTPS connectors are configured. \
                 Only one of these connectors should be configured."
            );
            return Err(ConnectorError::BothConnectorsConfigured);
        }
        (None, Some(port)) => (
            Protocol::Secure,
            port,
            config.web.https_host.clone(),
            &config.web.https_network_interfaces,
        ),
        (Some(port), None) => (
            Protocol::Plain,
            port,
            config.web.http_host.clone(),
            &config.web.http_network_interfaces,
        ),
        (None, None) => {
            tracing::error!("Neither the HTTP nor HTTPS connector was configured");
            return Err(ConnectorError::NoConnectorConfigured);
        }
    };

    let port = validated_port(raw_port, protocol.label())?;
    tracing::info!(
        connector = protocol.label(),
        port,
        idle_timeout_ms = idle_timeout.as_millis() as u64,
        "Configuring connector"
    );

    Ok(resolve_specs(
        protocol,
        host,
        interfaces,
        port,
        idle_timeout,
    ))
}

fn validated_port(port: i64, label: &'static str) -> Result<u16, ConnectorError> {
    if !(0..=65_535).contains(&port) {
        return Err(ConnectorError::InvalidPort { label, port });
    }
    Ok(port as u16)
}

fn resolve_specs(
    protocol: Protocol,
    host: Option<String>,
    interfaces: &BTreeMap<String, String>,
    port: u16,
    idle_timeout: Duration,
) -> Vec<ConnectorSpec> {
    let named: Vec<&String> = interfaces
        .values()
        .filter(|name| !name.trim().is_empty())
        .collect();

    if named.is_empty() {
        let host = host.filter(|h| !h.trim().is_empty());
        return vec![ConnectorSpec {
            protocol,
            label: protocol.label().to_string(),
            target: BindTarget::Host(host),
            port,
            idle_timeout,
        }];
    }

    let mut specs = Vec::new();
    for name in named {
        let addresses = resolve_interface_addresses(name);
        if addresses.is_empty() {
            tracing::warn!(interface = %name, "Unable to find network interface; skipping");
            continue;
        }
        for address in addresses {
            specs.push(ConnectorSpec {
                protocol,
                label: format!("{} {}", protocol.label(), name),
                target: BindTarget::Address(address),
                port,
                idle_timeout,
            });
        }
    }
    specs
}

/// Addresses bound to a named local network interface. Empty when the
/// interface does not exist or enumeration fails.
fn resolve_interface_addresses(name: &str) -> Vec<IpAddr> {
    match if_addrs::get_if_addrs() {
        Ok(all) => all
            .into_iter()
            .filter(|iface| iface.name == name)
            .map(|iface| iface.ip())
            .collect(),
        Err(e) => {
            tracing::error!(interface = %name, error = %e, "Unable to enumerate network interfaces");
            Vec::new()
        }
    }
}

/// Bind every spec. Any individual bind failure is fatal, as is an empty
/// spec set (all configured interfaces failed to resolve).
pub fn bind_listeners(specs: Vec<ConnectorSpec>) -> Result<Vec<BoundConnector>, ConnectorError> {
    if specs.is_empty() {
        return Err(ConnectorError::NoListeners);
    }

    let mut bound = Vec::with_capacity(specs.len());
    for spec in specs {
        let address = spec.bind_address();
        let listener = TcpListener::bind(&address).map_err(|e| ConnectorError::Bind {
            address: address.clone(),
            source: e,
        })?;
        listener
            .set_nonblocking(true)
            .map_err(|e| ConnectorError::Bind {
                address: address.clone(),
                source: e,
            })?;
        let local_addr = listener.local_addr().map_err(|e| ConnectorError::Bind {
            address: address.clone(),
            source: e,
        })?;

        tracing::info!(
            connector = %spec.label,
            address = %local_addr,
            "Listener bound"
        );
        bound.push(BoundConnector {
            spec,
            listener,
            local_addr,
        });
    }
    Ok(bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HostConfig;

    fn http_config(port: i64) -> HostConfig {
        let mut config = HostConfig::default();
        config.web.http_port = Some(port);
        config
    }

    #[test]
    fn both_connectors_is_configuration_error() {
        let mut config = http_config(8080);
        config.web.https_port = Some(8443);

        let result = build_connector_specs(&config);
        assert!(matches!(
            result,
            Err(ConnectorError::BothConnectorsConfigured)
        ));
    }

    #[test]
    fn neither_connector_is_configuration_error() {
        let config = HostConfig::default();
        let result = build_connector_specs(&config);
        assert!(matches!(result, Err(ConnectorError::NoConnectorConfigured)));
    }

    #[test]
    fn out_of_range_ports_are_rejected_with_the_offending_value() {
        for port in [-1, 65_536, 700_000] {
            let result = build_connector_specs(&http_config(port));
            match result {
                Err(ConnectorError::InvalidPort { label, port: p }) => {
                    assert_eq!(label, "HTTP");
                    assert_eq!(p, port);
                }
                other => panic!("expected InvalidPort, got {other:?}"),
            }
        }
    }

    #[test]
    fn no_interfaces_yields_single_hostname_listener() {
        let mut config = http_config(8080);
        config.web.http_host = Some("127.0.0.1".to_string());

        let specs = build_connector_specs(&config).unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(
            specs[0].target,
            BindTarget::Host(Some("127.0.0.1".to_string()))
        );
        assert_eq!(specs[0].port, 8080);
    }

    #[test]
    fn blank_interface_names_fall_back_to_hostname_listener() {
        let mut config = http_config(8080);
        config
            .web
            .http_network_interfaces
            .insert("intf0".to_string(), "  ".to_string());

        let specs = build_connector_specs(&config).unwrap();
        assert_eq!(specs.len(), 1);
        assert!(matches!(specs[0].target, BindTarget::Host(None)));
    }

    #[test]
    fn unresolvable_interface_is_skipped() {
        let mut config = http_config(8080);
        config
            .web
            .http_network_interfaces
            .insert("intf0".to_string(), "no-such-interface-0".to_string());

        let specs = build_connector_specs(&config).unwrap();
        assert!(specs.is_empty());
        assert!(matches!(
            bind_listeners(specs),
            Err(ConnectorError::NoListeners)
        ));
    }

    #[test]
    fn idle_timeout_is_twice_the_refresh_interval() {
        let mut config = http_config(8080);
        config.web.auto_refresh_interval_ms = Some(5_000);
        let specs = build_connector_specs(&config).unwrap();
        assert_eq!(specs[0].idle_timeout, Duration::from_millis(10_000));

        // Unset falls back to the 30s base.
        let specs = build_connector_specs(&http_config(8080)).unwrap();
        assert_eq!(specs[0].idle_timeout, Duration::from_millis(60_000));
    }

    #[test]
    fn binding_ephemeral_port_succeeds() {
        let mut config = http_config(0);
        config.web.http_host = Some("127.0.0.1".to_string());

        let specs = build_connector_specs(&config).unwrap();
        let bound = bind_listeners(specs).unwrap();
        assert_eq!(bound.len(), 1);
        assert_ne!(bound[0].local_addr.port(), 0);
    }
}
