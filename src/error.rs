//! Error types
//!
//! Each layer has its own error enum; [`Error`] gathers the ones a host
//! binary runs into while setting up and serving.

use thiserror::Error;

pub use crate::client::{CallError, ResolveError};
pub use crate::playback::{ContextError, ServiceError};
pub use crate::protocol::{AddressError, CodecError};
pub use crate::registry::PublishError;
pub use crate::server::HostConfigError;
pub use crate::session::{ConnectError, DispatchError};

/// Top-level error type
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Address(#[from] AddressError),
    #[error(transparent)]
    HostConfig(#[from] HostConfigError),
    #[error(transparent)]
    Publish(#[from] PublishError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn publish_on_port_zero() -> Result<()> {
        let outcome: std::result::Result<(), PublishError> = Err(PublishError::InvalidPort);
        outcome?;
        Ok(())
    }

    #[test]
    fn test_layer_errors_convert() {
        let err = publish_on_port_zero().unwrap_err();
        assert!(matches!(err, Error::Publish(PublishError::InvalidPort)));
        assert_eq!(err.to_string(), "port must be greater than zero");

        let err: Error = HostConfigError::NoMedia.into();
        assert_eq!(err.to_string(), "no media selected");

        let err: Error = ServiceError::ContextClosed.into();
        assert!(matches!(err, Error::Service(_)));
    }
}
