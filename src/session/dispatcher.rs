//! Command dispatch
//!
//! Sends one playback command to a selected session. A communication-layer
//! failure evicts the session before the error is returned; any other failure
//! leaves it in place.

use std::sync::Arc;

use super::error::DispatchError;
use super::id::SessionId;
use super::registry::SessionRegistry;
use crate::client::{RemoteEndpoint, Transport};
use crate::protocol::PlaybackCommand;

/// Sends playback commands to sessions of a [`SessionRegistry`]
pub struct CommandDispatcher<T: Transport> {
    sessions: Arc<SessionRegistry<T>>,
}

impl<T: Transport> Clone for CommandDispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
        }
    }
}

impl<T: Transport> CommandDispatcher<T> {
    pub fn new(sessions: Arc<SessionRegistry<T>>) -> Self {
        Self { sessions }
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry<T>> {
        &self.sessions
    }

    /// Send `command` to the session `id` and wait for the outcome
    pub async fn send(&self, id: &SessionId, command: PlaybackCommand) -> Result<(), DispatchError> {
        let Some(endpoint) = self.sessions.get(id).await else {
            return Err(DispatchError::UnknownSession(id.clone()));
        };

        match endpoint.invoke(command).await {
            Ok(()) => {
                tracing::debug!(session = %id, operation = command.operation(), "Command delivered");
                Ok(())
            }
            Err(cause) if cause.is_communication_failure() => {
                if self.sessions.evict_if(id, &endpoint).await {
                    tracing::warn!(
                        session = %id,
                        operation = command.operation(),
                        error = %cause,
                        "Connection lost, session evicted"
                    );
                } else {
                    tracing::debug!(
                        session = %id,
                        operation = command.operation(),
                        error = %cause,
                        "Connection lost on a replaced endpoint, session kept"
                    );
                }
                Err(DispatchError::CommunicationLost {
                    id: id.clone(),
                    cause,
                })
            }
            Err(cause) => {
                tracing::warn!(
                    session = %id,
                    operation = command.operation(),
                    error = %cause,
                    "Command failed, session kept"
                );
                Err(DispatchError::UnexpectedFailure {
                    id: id.clone(),
                    cause,
                })
            }
        }
    }

    pub async fn play(&self, id: &SessionId) -> Result<(), DispatchError> {
        self.send(id, PlaybackCommand::Play).await
    }

    pub async fn pause(&self, id: &SessionId) -> Result<(), DispatchError> {
        self.send(id, PlaybackCommand::Pause).await
    }

    pub async fn restart(&self, id: &SessionId) -> Result<(), DispatchError> {
        self.send(id, PlaybackCommand::Restart).await
    }
}
