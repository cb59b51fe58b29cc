//! Registry server listener
//!
//! Handles the TCP accept loop and serves registry requests against a shared
//! binding table. Each connection runs on its own task.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::error::Result;
use crate::protocol::codec::{read_frame, write_frame, CodecError};
use crate::protocol::constants::MAX_FRAME_SIZE;
use crate::protocol::message::{Request, Response};
use crate::registry::BindingTable;
use crate::server::config::ServerConfig;

/// Registry server
pub struct RegistryServer {
    config: ServerConfig,
    listener: TcpListener,
    bindings: Arc<BindingTable>,
    next_connection_id: AtomicU64,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl RegistryServer {
    /// Bind a registry listener on `port`
    ///
    /// Binding happens here rather than in `run` so that a port conflict is
    /// reported to the caller instead of the background task.
    pub async fn bind(
        config: ServerConfig,
        port: u16,
        bindings: Arc<BindingTable>,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(config.socket_addr(port)).await?;

        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        Ok(Self {
            config,
            listener,
            bindings,
            next_connection_id: AtomicU64::new(1),
            connection_semaphore,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Binding table served by this registry
    pub fn bindings(&self) -> &Arc<BindingTable> {
        &self.bindings
    }

    /// Run the server until the task is dropped
    pub async fn run(&self) -> Result<()> {
        self.log_listening();
        self.accept_loop().await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        self.log_listening();

        tokio::select! {
            _ = shutdown => {
                tracing::info!(addr = ?self.local_addr().ok(), "Registry shutdown signal received");
                Ok(())
            }
            result = self.accept_loop() => result,
        }
    }

    fn log_listening(&self) {
        match self.local_addr() {
            Ok(addr) => tracing::info!(addr = %addr, "Registry listening"),
            Err(e) => tracing::warn!(error = %e, "Registry listening on unknown address"),
        }
    }

    async fn accept_loop(&self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check connection limit
        let permit = if let Some(ref sem) = self.connection_semaphore {
            match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                    return;
                }
            }
        } else {
            None
        };

        let connection_id = self.next_connection_id.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            connection_id = connection_id,
            peer = %peer_addr,
            "New connection"
        );

        if self.config.tcp_nodelay {
            if let Err(e) = socket.set_nodelay(true) {
                tracing::error!(error = %e, "Failed to configure socket");
                return;
            }
        }

        let bindings = Arc::clone(&self.bindings);
        let idle_timeout = self.config.idle_timeout;

        tokio::spawn(async move {
            let _permit = permit;

            if let Err(e) = serve_connection(socket, &bindings, idle_timeout).await {
                tracing::debug!(
                    connection_id = connection_id,
                    error = %e,
                    "Connection error"
                );
            }

            tracing::debug!(connection_id = connection_id, "Connection closed");
        });
    }
}

/// Serve request/response exchanges until the peer closes or goes idle
async fn serve_connection(
    mut socket: TcpStream,
    bindings: &BindingTable,
    idle_timeout: std::time::Duration,
) -> std::result::Result<(), CodecError> {
    loop {
        let body = match tokio::time::timeout(idle_timeout, read_frame(&mut socket)).await {
            Ok(Ok(Some(body))) => body,
            Ok(Ok(None)) => return Ok(()),
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                tracing::debug!("Closing idle connection");
                return Ok(());
            }
        };

        let response = match Request::decode(body) {
            Ok(request) => handle_request(bindings, request).await,
            Err(e) => {
                // Reply once so the caller sees a fault, then drop the connection
                let fault = Response::Fault(format!("malformed request: {}", e));
                write_frame(&mut socket, &fault.encode()?).await?;
                return Err(e);
            }
        };

        write_frame(&mut socket, &encode_reply(&response)?).await?;
    }
}

/// Encode a reply, turning one that does not fit in a frame into a fault
fn encode_reply(response: &Response) -> std::result::Result<Bytes, CodecError> {
    let oversized = match response.encode() {
        Ok(body) if body.len() <= MAX_FRAME_SIZE => return Ok(body),
        Ok(body) => CodecError::FrameTooLarge(body.len()),
        Err(e @ (CodecError::FrameTooLarge(_) | CodecError::StringTooLong(_))) => e,
        Err(e) => return Err(e),
    };

    tracing::warn!(error = %oversized, "Reply does not fit in a frame, sending fault");
    Response::Fault(format!("reply too large: {}", oversized)).encode()
}

async fn handle_request(bindings: &BindingTable, request: Request) -> Response {
    match request {
        Request::List => Response::Names(bindings.names().await),
        Request::Lookup { name } => {
            if bindings.is_bound(&name).await {
                Response::Ok
            } else {
                Response::NotBound(name)
            }
        }
        Request::Invoke { name, command } => {
            let Some(service) = bindings.lookup(&name).await else {
                tracing::debug!(service = %name, command = %command, "Invoke on unbound service");
                return Response::NotBound(name);
            };

            match service.invoke(command) {
                Ok(()) => {
                    tracing::debug!(service = %name, operation = command.operation(), "Invoked");
                    Response::Ok
                }
                Err(e) => {
                    tracing::warn!(service = %name, error = %e, "Invocation failed");
                    Response::Fault(e.to_string())
                }
            }
        }
    }
}
