//! Session error types

use thiserror::Error;

use super::id::SessionId;
use crate::client::{CallError, ResolveError};
use crate::protocol::AddressError;

/// Outcome of a connect attempt that did not add a session
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressError),
    /// Informational: the session already exists and was left untouched
    #[error("already connected to {0}")]
    AlreadyConnected(SessionId),
    #[error("cannot resolve {id}: {cause}")]
    ResolutionFailed {
        id: SessionId,
        #[source]
        cause: ResolveError,
    },
}

impl ConnectError {
    /// Whether this outcome is informational rather than a failure
    pub fn is_already_connected(&self) -> bool {
        matches!(self, ConnectError::AlreadyConnected(_))
    }
}

/// Outcome of a command that did not complete
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unknown session {0}")]
    UnknownSession(SessionId),
    /// The session has been evicted
    #[error("connection to {id} lost, please reconnect ({cause})")]
    CommunicationLost {
        id: SessionId,
        #[source]
        cause: CallError,
    },
    /// The session is kept
    #[error("command to {id} failed: {cause}")]
    UnexpectedFailure {
        id: SessionId,
        #[source]
        cause: CallError,
    },
}

impl DispatchError {
    pub fn session(&self) -> &SessionId {
        match self {
            DispatchError::UnknownSession(id)
            | DispatchError::CommunicationLost { id, .. }
            | DispatchError::UnexpectedFailure { id, .. } => id,
        }
    }
}
