//! Client error types
//!
//! Call failures are split into communication-layer failures, after which the
//! endpoint must be considered dead, and everything else.

use std::time::Duration;

use thiserror::Error;

use crate::protocol::CodecError;

/// Failure of a single remote call
#[derive(Debug, Error)]
pub enum CallError {
    /// Connection refused, reset, broken pipe or closed mid-exchange
    #[error("transport failure: {0}")]
    Transport(#[source] std::io::Error),
    /// No answer within the configured timeout
    #[error("no reply within {0:?}")]
    Timeout(Duration),
    /// The registry no longer binds the target service
    #[error("service `{0}` is no longer bound")]
    NotBound(String),
    /// The service itself reported an error
    #[error("remote fault: {0}")]
    Remote(String),
    /// The reply could not be understood
    #[error("protocol error: {0}")]
    Protocol(#[source] CodecError),
}

impl CallError {
    /// Whether this failure means the endpoint can no longer be reached
    pub fn is_communication_failure(&self) -> bool {
        matches!(
            self,
            CallError::Transport(_) | CallError::Timeout(_) | CallError::NotBound(_)
        )
    }
}

impl From<CodecError> for CallError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::Io(io) => CallError::Transport(io),
            other => CallError::Protocol(other),
        }
    }
}

/// Failure to resolve a service address into an endpoint
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("cannot reach registry: {0}")]
    Transport(#[source] std::io::Error),
    #[error("registry did not answer within {0:?}")]
    Timeout(Duration),
    #[error("service `{0}` is not bound")]
    NotBound(String),
    #[error("registry rejected the request: {0}")]
    Rejected(String),
    #[error("protocol error: {0}")]
    Protocol(#[source] CodecError),
}

impl From<CallError> for ResolveError {
    fn from(e: CallError) -> Self {
        match e {
            CallError::Transport(io) => ResolveError::Transport(io),
            CallError::Timeout(d) => ResolveError::Timeout(d),
            CallError::NotBound(name) => ResolveError::NotBound(name),
            CallError::Remote(message) => ResolveError::Rejected(message),
            CallError::Protocol(codec) => ResolveError::Protocol(codec),
        }
    }
}
