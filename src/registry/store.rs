//! Binding table
//!
//! Maps service names to the playback services bound under them. One table
//! backs each registry server.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::playback::RemotePlayback;

/// Name to service bindings of one registry
///
/// Thread-safe via `RwLock`. Invocations only take the read lock for the time
/// it takes to clone the service handle.
#[derive(Default)]
pub struct BindingTable {
    bindings: RwLock<HashMap<String, Arc<dyn RemotePlayback>>>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `service`, replacing any previous binding
    ///
    /// The swap happens under a single write lock, so concurrent lookups see
    /// either the old or the new service, never a missing name. Returns true
    /// when an existing binding was replaced.
    pub async fn rebind(&self, name: &str, service: Arc<dyn RemotePlayback>) -> bool {
        let replaced = self
            .bindings
            .write()
            .await
            .insert(name.to_string(), service)
            .is_some();

        tracing::info!(service = %name, replaced = replaced, "Service bound");
        replaced
    }

    /// Remove a binding
    pub async fn unbind(&self, name: &str) -> Option<Arc<dyn RemotePlayback>> {
        let removed = self.bindings.write().await.remove(name);
        if removed.is_some() {
            tracing::info!(service = %name, "Service unbound");
        }
        removed
    }

    /// Get the service currently bound under `name`
    pub async fn lookup(&self, name: &str) -> Option<Arc<dyn RemotePlayback>> {
        self.bindings.read().await.get(name).cloned()
    }

    pub async fn is_bound(&self, name: &str) -> bool {
        self.bindings.read().await.contains_key(name)
    }

    /// Bound names in sorted order
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.bindings.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn len(&self) -> usize {
        self.bindings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.bindings.read().await.is_empty()
    }

    /// Remove every binding, returning the names that were bound
    pub async fn clear(&self) -> Vec<String> {
        let mut bindings = self.bindings.write().await;
        let mut names: Vec<String> = bindings.drain().map(|(name, _)| name).collect();
        names.sort();
        names
    }
}
