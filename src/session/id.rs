//! Session identifiers

use std::fmt;
use std::str::FromStr;

use crate::protocol::address::{AddressError, ServiceAddress};

/// Canonical `host:port/serviceName` key of a controller session
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&ServiceAddress> for SessionId {
    fn from(address: &ServiceAddress) -> Self {
        SessionId(address.to_string())
    }
}

impl FromStr for SessionId {
    type Err = AddressError;

    /// Parse and canonicalize, so `LocalHost:1099/x` and `localhost:1099/x` agree
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let address: ServiceAddress = s.parse()?;
        Ok(SessionId::from(&address))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for SessionId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for SessionId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
