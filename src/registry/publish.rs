//! Service publishing
//!
//! A host publishes playback services under `port/serviceName`. The first
//! publish on a port creates a registry server there; later publishes reuse
//! it while a liveness probe (a `List` request) still succeeds.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;

use super::error::PublishError;
use super::store::BindingTable;
use crate::client::{ClientConfig, ResolveError, TcpTransport};
use crate::playback::RemotePlayback;
use crate::server::{RegistryServer, ServerConfig};

/// A registry server this process runs
struct RunningRegistry {
    bindings: Arc<BindingTable>,
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl RunningRegistry {
    async fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            tracing::debug!(error = %e, "Registry task ended abnormally");
        }
    }
}

/// Host-side publisher of playback services
///
/// Dropping the registry stops every server it started.
pub struct ServiceRegistry {
    config: ServerConfig,
    prober: TcpTransport,
    registries: Mutex<HashMap<u16, RunningRegistry>>,
}

impl ServiceRegistry {
    /// Create a service registry with default configuration
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    /// Create a service registry with custom configuration
    pub fn with_config(config: ServerConfig) -> Self {
        let prober = TcpTransport::new(
            ClientConfig::new()
                .connect_timeout(config.probe_timeout)
                .call_timeout(config.probe_timeout),
        );

        Self {
            config,
            prober,
            registries: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind `service` under `service_name` on the registry at `port`
    ///
    /// Creates the registry if none is running there. Publishing a name that
    /// is already bound replaces the previous service.
    pub async fn publish<S>(
        &self,
        port: u16,
        service_name: &str,
        service: S,
    ) -> Result<(), PublishError>
    where
        S: RemotePlayback,
    {
        if port == 0 {
            return Err(PublishError::InvalidPort);
        }
        let name = service_name.trim();
        if name.is_empty() {
            return Err(PublishError::EmptyServiceName);
        }

        // Held across the probe and bind so publishers in this process
        // cannot race each other on the same port
        let mut registries = self.registries.lock().await;
        let bindings = self.ensure_registry(&mut registries, port).await?;

        let replaced = bindings.rebind(name, Arc::new(service)).await;

        tracing::info!(
            port = port,
            service = %name,
            replaced = replaced,
            "Service published"
        );
        Ok(())
    }

    async fn ensure_registry(
        &self,
        registries: &mut HashMap<u16, RunningRegistry>,
        port: u16,
    ) -> Result<Arc<BindingTable>, PublishError> {
        let mut bindings = None;

        if let Some(running) = registries.get(&port) {
            if !running.task.is_finished() && self.probe(port).await {
                tracing::debug!(port = port, addr = %running.local_addr, "Reusing registry");
                return Ok(Arc::clone(&running.bindings));
            }

            tracing::warn!(port = port, "Registry stopped responding, recreating");
            if let Some(dead) = registries.remove(&port) {
                // Keep the bindings so services published earlier survive
                bindings = Some(Arc::clone(&dead.bindings));
                dead.stop().await;
            }
        } else if self.probe(port).await {
            return Err(PublishError::ForeignRegistry { port });
        }

        let bindings = bindings.unwrap_or_default();
        let running = self.start_registry(port, Arc::clone(&bindings)).await?;
        registries.insert(port, running);
        Ok(bindings)
    }

    async fn start_registry(
        &self,
        port: u16,
        bindings: Arc<BindingTable>,
    ) -> Result<RunningRegistry, PublishError> {
        let server = RegistryServer::bind(self.config.clone(), port, Arc::clone(&bindings))
            .await
            .map_err(|source| PublishError::Bind { port, source })?;
        let local_addr = server
            .local_addr()
            .map_err(|source| PublishError::Bind { port, source })?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = server.run_until(shutdown).await {
                tracing::error!(port = port, error = %e, "Registry server failed");
            }
        });

        tracing::info!(port = port, addr = %local_addr, "Registry created");

        Ok(RunningRegistry {
            bindings,
            local_addr,
            shutdown_tx: Some(shutdown_tx),
            task,
        })
    }

    /// Whether a registry answers on `port` of this machine
    ///
    /// A fault reply still comes from a live registry (e.g. a listing too
    /// large for one frame).
    async fn probe(&self, port: u16) -> bool {
        let addr = self.config.probe_addr(port).to_string();
        match self.prober.list_at(&addr).await {
            Ok(names) => {
                tracing::debug!(port = port, bound = names.len(), "Registry probe succeeded");
                true
            }
            Err(ResolveError::Rejected(message)) => {
                tracing::debug!(port = port, fault = %message, "Registry probe answered with a fault");
                true
            }
            Err(e) => {
                tracing::debug!(port = port, error = %e, "Registry probe failed");
                false
            }
        }
    }

    /// Remove `service_name` from the registry at `port`
    ///
    /// Best effort: a missing registry or name is logged and ignored. Returns
    /// true when a binding was removed.
    pub async fn unpublish(&self, port: u16, service_name: &str) -> bool {
        let name = service_name.trim();
        let registries = self.registries.lock().await;

        let Some(running) = registries.get(&port) else {
            tracing::warn!(port = port, service = %name, "Unpublish: no registry on port");
            return false;
        };

        if running.bindings.unbind(name).await.is_some() {
            tracing::info!(port = port, service = %name, "Service unpublished");
            true
        } else {
            tracing::warn!(port = port, service = %name, "Unpublish: service was not bound");
            false
        }
    }

    /// Names bound on the registry this process runs at `port`
    pub async fn list(&self, port: u16) -> Vec<String> {
        let registries = self.registries.lock().await;
        match registries.get(&port) {
            Some(running) => running.bindings.names().await,
            None => Vec::new(),
        }
    }

    pub async fn is_bound(&self, port: u16, service_name: &str) -> bool {
        let registries = self.registries.lock().await;
        match registries.get(&port) {
            Some(running) => running.bindings.is_bound(service_name.trim()).await,
            None => false,
        }
    }

    /// Ports with a running registry
    pub async fn ports(&self) -> Vec<u16> {
        let mut ports: Vec<u16> = self.registries.lock().await.keys().copied().collect();
        ports.sort_unstable();
        ports
    }

    /// Unbind every service and stop every registry server
    pub async fn shutdown(&self) {
        let mut registries = self.registries.lock().await;

        for (port, running) in registries.drain() {
            let unbound = running.bindings.clear().await;
            tracing::info!(port = port, services = ?unbound, "Registry shutting down");
            running.stop().await;
        }
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
