//! Session registry
//!
//! Tracks the controller's live sessions, keyed by their canonical
//! `host:port/serviceName` identifier and kept in insertion order so a menu can
//! number them.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use super::error::ConnectError;
use super::id::SessionId;
use crate::client::{ResolveError, Transport};
use crate::protocol::ServiceAddress;

struct SessionEntry<E> {
    id: SessionId,
    endpoint: Arc<E>,
    connected_at: Instant,
}

/// Summary of one session for display
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub id: SessionId,
    /// Time since the session was connected
    pub age: Duration,
}

/// Registry of connected remote playback services
///
/// Mutations take the write lock only for the final insert or remove; address
/// resolution runs without holding it.
pub struct SessionRegistry<T: Transport> {
    transport: T,
    sessions: RwLock<Vec<SessionEntry<T::Endpoint>>>,
}

impl<T: Transport> SessionRegistry<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            sessions: RwLock::new(Vec::new()),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Connect to `serviceName` on the registry at `hostname:port`
    ///
    /// An existing session with the same identifier is reported as
    /// `AlreadyConnected` without touching the network. A failed resolution
    /// stores nothing and is not retried.
    pub async fn connect(
        &self,
        hostname: &str,
        port: u16,
        service_name: &str,
    ) -> Result<SessionId, ConnectError> {
        let address = ServiceAddress::new(hostname, port, service_name)?;
        self.connect_address(&address).await
    }

    /// Connect to an already validated address
    pub async fn connect_address(&self, address: &ServiceAddress) -> Result<SessionId, ConnectError> {
        let id = SessionId::from(address);

        if self.contains(&id).await {
            tracing::info!(session = %id, "Already connected");
            return Err(ConnectError::AlreadyConnected(id));
        }

        let endpoint = match self.transport.resolve(address).await {
            Ok(endpoint) => endpoint,
            Err(cause) => {
                tracing::warn!(session = %id, error = %cause, "Service resolution failed");
                return Err(ConnectError::ResolutionFailed { id, cause });
            }
        };

        let mut sessions = self.sessions.write().await;

        // Another connect may have stored the same id while we were resolving
        if sessions.iter().any(|entry| entry.id == id) {
            tracing::info!(session = %id, "Already connected");
            return Err(ConnectError::AlreadyConnected(id));
        }

        sessions.push(SessionEntry {
            id: id.clone(),
            endpoint: Arc::new(endpoint),
            connected_at: Instant::now(),
        });

        tracing::info!(session = %id, sessions = sessions.len(), "Session connected");
        Ok(id)
    }

    /// Session identifiers in connection order
    pub async fn list(&self) -> Vec<SessionId> {
        self.sessions
            .read()
            .await
            .iter()
            .map(|entry| entry.id.clone())
            .collect()
    }

    /// Sessions with their age, in connection order
    pub async fn sessions(&self) -> Vec<SessionInfo> {
        self.sessions
            .read()
            .await
            .iter()
            .map(|entry| SessionInfo {
                id: entry.id.clone(),
                age: entry.connected_at.elapsed(),
            })
            .collect()
    }

    /// Identifier at zero-based position `index` of [`list`](Self::list)
    pub async fn nth(&self, index: usize) -> Option<SessionId> {
        self.sessions
            .read()
            .await
            .get(index)
            .map(|entry| entry.id.clone())
    }

    /// Endpoint of a session
    pub async fn get(&self, id: &SessionId) -> Option<Arc<T::Endpoint>> {
        self.sessions
            .read()
            .await
            .iter()
            .find(|entry| &entry.id == id)
            .map(|entry| Arc::clone(&entry.endpoint))
    }

    pub async fn contains(&self, id: &SessionId) -> bool {
        self.sessions.read().await.iter().any(|entry| &entry.id == id)
    }

    /// Remove a session
    ///
    /// Returns false when no such session existed.
    pub async fn evict(&self, id: &SessionId) -> bool {
        let mut sessions = self.sessions.write().await;

        match sessions.iter().position(|entry| &entry.id == id) {
            Some(index) => {
                sessions.remove(index);
                tracing::info!(session = %id, sessions = sessions.len(), "Session evicted");
                true
            }
            None => false,
        }
    }

    /// Remove a session only if it still holds `endpoint`
    ///
    /// A call that fails after the session was disconnected and reconnected
    /// must not remove the new connection. Returns false when the session is
    /// missing or was replaced.
    pub async fn evict_if(&self, id: &SessionId, endpoint: &Arc<T::Endpoint>) -> bool {
        let mut sessions = self.sessions.write().await;

        let position = sessions
            .iter()
            .position(|entry| &entry.id == id && Arc::ptr_eq(&entry.endpoint, endpoint));

        match position {
            Some(index) => {
                sessions.remove(index);
                tracing::info!(session = %id, sessions = sessions.len(), "Session evicted");
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Service names bound on the registry at `hostname:port`
    pub async fn browse(&self, hostname: &str, port: u16) -> Result<Vec<String>, ResolveError> {
        self.transport.list(hostname, port).await
    }
}
