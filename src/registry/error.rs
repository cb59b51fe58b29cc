//! Registry error types

use thiserror::Error;

/// Error type for publish operations
#[derive(Debug, Error)]
pub enum PublishError {
    /// Port 0 cannot host a registry
    #[error("port must be greater than zero")]
    InvalidPort,
    /// Service names must be non-empty
    #[error("service name must not be empty")]
    EmptyServiceName,
    /// A live registry on this port belongs to another process
    #[error("port {port} is served by a registry owned by another process")]
    ForeignRegistry { port: u16 },
    /// The registry listener could not be bound
    #[error("cannot bind registry on port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
}
