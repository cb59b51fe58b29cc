//! Client configuration

use std::time::Duration;

/// Controller-side transport options
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// TCP connect timeout (host unreachable detection)
    pub connect_timeout: Duration,

    /// Time allowed for a request to be answered once connected
    pub call_timeout: Duration,

    /// Enable TCP_NODELAY
    pub tcp_nodelay: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            call_timeout: Duration::from_secs(10),
            tcp_nodelay: true,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set call timeout
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Disable TCP_NODELAY
    pub fn disable_nodelay(mut self) -> Self {
        self.tcp_nodelay = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.call_timeout, Duration::from_secs(10));
        assert!(config.tcp_nodelay);
    }

    #[test]
    fn test_builder_chaining() {
        let config = ClientConfig::new()
            .connect_timeout(Duration::from_millis(250))
            .call_timeout(Duration::from_secs(2))
            .disable_nodelay();

        assert_eq!(config.connect_timeout, Duration::from_millis(250));
        assert_eq!(config.call_timeout, Duration::from_secs(2));
        assert!(!config.tcp_nodelay);
    }
}
