//! Host and registry server configuration

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use thiserror::Error;

use crate::protocol::address::{AddressError, ServiceAddress};
use crate::protocol::constants::DEFAULT_REGISTRY_PORT;

/// Registry server options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the registry listener binds to (the port comes from `publish`)
    pub bind_ip: IpAddr,

    /// Maximum concurrent connections (0 = unlimited)
    pub max_connections: usize,

    /// Close a connection when no request arrives within this time
    pub idle_timeout: Duration,

    /// Timeout for the liveness probe run before creating a registry
    pub probe_timeout: Duration,

    /// Enable TCP_NODELAY on accepted sockets
    pub tcp_nodelay: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            max_connections: 0, // Unlimited
            idle_timeout: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(1),
            tcp_nodelay: true,
        }
    }
}

impl ServerConfig {
    /// Create a config bound to a specific interface
    pub fn with_ip(ip: IpAddr) -> Self {
        Self {
            bind_ip: ip,
            ..Default::default()
        }
    }

    /// Config bound to the loopback interface only
    pub fn loopback() -> Self {
        Self::with_ip(IpAddr::V4(Ipv4Addr::LOCALHOST))
    }

    /// Set the bind interface
    pub fn bind_ip(mut self, ip: IpAddr) -> Self {
        self.bind_ip = ip;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set idle timeout
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set liveness probe timeout
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Socket address of a registry on `port`
    pub fn socket_addr(&self, port: u16) -> SocketAddr {
        SocketAddr::new(self.bind_ip, port)
    }

    /// Address used to probe a registry on `port` from this machine
    pub fn probe_addr(&self, port: u16) -> SocketAddr {
        let ip = if self.bind_ip.is_unspecified() {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        } else {
            self.bind_ip
        };
        SocketAddr::new(ip, port)
    }
}

/// Invalid host settings
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostConfigError {
    #[error("host name must not be empty")]
    EmptyName,
    #[error("no media selected")]
    NoMedia,
    #[error(transparent)]
    Address(#[from] AddressError),
}

/// Settings of one playback host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// Display name of the host
    pub name: String,
    /// Hostname announced to controllers
    pub hostname: String,
    /// Name the playback service is bound under
    pub service_name: String,
    /// Registry port
    pub port: u16,
    /// Media loaded into the player
    pub media: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            name: String::from("host"),
            hostname: String::from("localhost"),
            service_name: String::from("theatre"),
            port: DEFAULT_REGISTRY_PORT,
            media: String::new(),
        }
    }
}

impl HostConfig {
    pub fn new(name: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hostname: hostname.into(),
            ..Default::default()
        }
    }

    /// Set the service name
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Set the registry port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the media to load
    pub fn media(mut self, media: impl Into<String>) -> Self {
        self.media = media.into();
        self
    }

    /// Check that every field is filled in
    pub fn validate(&self) -> Result<(), HostConfigError> {
        if self.name.trim().is_empty() {
            return Err(HostConfigError::EmptyName);
        }
        self.address()?;
        if self.media.trim().is_empty() {
            return Err(HostConfigError::NoMedia);
        }
        Ok(())
    }

    /// Address controllers use to reach this host's service
    pub fn address(&self) -> Result<ServiceAddress, AddressError> {
        ServiceAddress::new(&self.hostname, self.port, &self.service_name)
    }
}
