//! Service addresses
//!
//! A service is located by `hostname:port/serviceName`. The same text form is
//! used as the session identifier on the controller side and in log output.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Reasons an address triple is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("hostname must not be empty")]
    EmptyHostname,
    #[error("service name must not be empty")]
    EmptyServiceName,
    #[error("port must be greater than zero")]
    InvalidPort,
    #[error("malformed address `{0}`, expected host:port/service")]
    Malformed(String),
}

/// Location of a named playback service
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceAddress {
    hostname: String,
    port: u16,
    service_name: String,
}

impl ServiceAddress {
    /// Create a validated, canonical address
    ///
    /// Surrounding whitespace is trimmed from both names and the hostname is
    /// lowercased, so equal triples always produce equal addresses.
    pub fn new(hostname: &str, port: u16, service_name: &str) -> Result<Self, AddressError> {
        let hostname = hostname.trim();
        let service_name = service_name.trim();

        if hostname.is_empty() {
            return Err(AddressError::EmptyHostname);
        }
        if service_name.is_empty() {
            return Err(AddressError::EmptyServiceName);
        }
        if port == 0 {
            return Err(AddressError::InvalidPort);
        }

        Ok(Self {
            hostname: hostname.to_ascii_lowercase(),
            port,
            service_name: service_name.to_string(),
        })
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// `host:port` part, suitable for `TcpStream::connect`
    pub fn registry_addr(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }

    /// URL form used when announcing a published service
    pub fn url(&self) -> String {
        format!("rpc://{}", self)
    }
}

impl fmt::Display for ServiceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.hostname, self.port, self.service_name)
    }
}

impl FromStr for ServiceAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix("rpc://").unwrap_or(s);

        let (authority, service) = s
            .split_once('/')
            .ok_or_else(|| AddressError::Malformed(s.to_string()))?;
        let (host, port) = authority
            .rsplit_once(':')
            .ok_or_else(|| AddressError::Malformed(s.to_string()))?;
        let port: u16 = port
            .parse()
            .map_err(|_| AddressError::Malformed(s.to_string()))?;

        Self::new(host, port, service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_format() {
        let addr = ServiceAddress::new("localhost", 1099, "theatre").unwrap();
        assert_eq!(addr.to_string(), "localhost:1099/theatre");
        assert_eq!(addr.registry_addr(), "localhost:1099");
        assert_eq!(addr.url(), "rpc://localhost:1099/theatre");
    }

    #[test]
    fn test_canonical_form() {
        let a = ServiceAddress::new("  LocalHost ", 1099, " theatre ").unwrap();
        let b = ServiceAddress::new("localhost", 1099, "theatre").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_service_name_keeps_case() {
        let addr = ServiceAddress::new("host", 1, "Theatre").unwrap();
        assert_eq!(addr.service_name(), "Theatre");
    }

    #[test]
    fn test_validation() {
        assert_eq!(
            ServiceAddress::new("", 1099, "x"),
            Err(AddressError::EmptyHostname)
        );
        assert_eq!(
            ServiceAddress::new("host", 1099, "   "),
            Err(AddressError::EmptyServiceName)
        );
        assert_eq!(
            ServiceAddress::new("host", 0, "x"),
            Err(AddressError::InvalidPort)
        );
    }

    #[test]
    fn test_parse() {
        let addr: ServiceAddress = "127.0.0.1:2000/lobby".parse().unwrap();
        assert_eq!(addr.hostname(), "127.0.0.1");
        assert_eq!(addr.port(), 2000);
        assert_eq!(addr.service_name(), "lobby");

        let addr: ServiceAddress = "rpc://host:1099/theatre".parse().unwrap();
        assert_eq!(addr.to_string(), "host:1099/theatre");
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            "host/theatre".parse::<ServiceAddress>(),
            Err(AddressError::Malformed(_))
        ));
        assert!(matches!(
            "host:abc/theatre".parse::<ServiceAddress>(),
            Err(AddressError::Malformed(_))
        ));
        assert!(matches!(
            "host:1099".parse::<ServiceAddress>(),
            Err(AddressError::Malformed(_))
        ));
    }
}
