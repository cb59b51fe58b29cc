//! TCP transport
//!
//! Every call opens a fresh connection to the registry, sends one request and
//! waits for one reply. A host that went away therefore shows up as a
//! connect failure on the next call.

use tokio::net::TcpStream;

use super::config::ClientConfig;
use super::error::{CallError, ResolveError};
use super::transport::{RemoteEndpoint, Transport};
use crate::protocol::codec::{read_frame, write_frame, CodecError};
use crate::protocol::{PlaybackCommand, Request, Response, ServiceAddress};

/// Transport over the registry wire protocol
#[derive(Debug, Clone, Default)]
pub struct TcpTransport {
    config: ClientConfig,
}

impl TcpTransport {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Names bound on the registry at `addr` (`host:port`)
    ///
    /// Also serves as the liveness probe for a registry.
    pub async fn list_at(&self, addr: &str) -> Result<Vec<String>, ResolveError> {
        match exchange(&self.config, addr, &Request::List).await? {
            Response::Names(names) => Ok(names),
            Response::Fault(message) => Err(ResolveError::Rejected(message)),
            _ => Err(ResolveError::Protocol(CodecError::UnexpectedResponse(
                "list",
            ))),
        }
    }
}

impl Transport for TcpTransport {
    type Endpoint = TcpEndpoint;

    async fn resolve(&self, address: &ServiceAddress) -> Result<TcpEndpoint, ResolveError> {
        let request = Request::Lookup {
            name: address.service_name().to_string(),
        };

        match exchange(&self.config, &address.registry_addr(), &request).await? {
            Response::Ok => {
                tracing::debug!(address = %address, "Service resolved");
                Ok(TcpEndpoint {
                    address: address.clone(),
                    config: self.config.clone(),
                })
            }
            Response::NotBound(name) => Err(ResolveError::NotBound(name)),
            Response::Fault(message) => Err(ResolveError::Rejected(message)),
            Response::Names(_) => Err(ResolveError::Protocol(CodecError::UnexpectedResponse(
                "names",
            ))),
        }
    }

    async fn list(&self, hostname: &str, port: u16) -> Result<Vec<String>, ResolveError> {
        self.list_at(&format!("{}:{}", hostname, port)).await
    }
}

/// Endpoint of a service resolved through [`TcpTransport`]
#[derive(Debug, Clone)]
pub struct TcpEndpoint {
    address: ServiceAddress,
    config: ClientConfig,
}

impl RemoteEndpoint for TcpEndpoint {
    fn address(&self) -> &ServiceAddress {
        &self.address
    }

    async fn invoke(&self, command: PlaybackCommand) -> Result<(), CallError> {
        let request = Request::Invoke {
            name: self.address.service_name().to_string(),
            command,
        };

        match exchange(&self.config, &self.address.registry_addr(), &request).await? {
            Response::Ok => Ok(()),
            Response::NotBound(name) => Err(CallError::NotBound(name)),
            Response::Fault(message) => Err(CallError::Remote(message)),
            Response::Names(_) => Err(CallError::Protocol(CodecError::UnexpectedResponse(
                "names",
            ))),
        }
    }
}

/// One request/reply exchange on a fresh connection
async fn exchange(
    config: &ClientConfig,
    addr: &str,
    request: &Request,
) -> Result<Response, CallError> {
    let mut socket =
        match tokio::time::timeout(config.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(socket)) => socket,
            Ok(Err(e)) => return Err(CallError::Transport(e)),
            Err(_) => return Err(CallError::Timeout(config.connect_timeout)),
        };

    if config.tcp_nodelay {
        if let Err(e) = socket.set_nodelay(true) {
            tracing::debug!(error = %e, "Failed to set TCP_NODELAY");
        }
    }

    let body = request.encode().map_err(CallError::Protocol)?;

    let reply = async {
        write_frame(&mut socket, &body).await?;
        read_frame(&mut socket).await
    };

    match tokio::time::timeout(config.call_timeout, reply).await {
        Err(_) => Err(CallError::Timeout(config.call_timeout)),
        Ok(Err(e)) => Err(e.into()),
        Ok(Ok(None)) => Err(CallError::Transport(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed before reply",
        ))),
        Ok(Ok(Some(body))) => Response::decode(body).map_err(CallError::Protocol),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::net::TcpListener;

    use super::*;

    /// Registry stand-in that answers every request with `response`
    async fn fake_registry(response: Response) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let response = response.clone();
                tokio::spawn(async move {
                    while let Ok(Some(_)) = read_frame(&mut socket).await {
                        let body = response.encode().unwrap();
                        if write_frame(&mut socket, &body).await.is_err() {
                            break;
                        }
                    }
                });
            }
        });

        addr
    }

    /// Port with nothing listening on it
    async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    fn addr_of(registry: &str, service: &str) -> ServiceAddress {
        let (host, port) = registry.rsplit_once(':').unwrap();
        ServiceAddress::new(host, port.parse().unwrap(), service).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_and_invoke() {
        let registry = fake_registry(Response::Ok).await;
        let transport = TcpTransport::default();

        let endpoint = transport
            .resolve(&addr_of(&registry, "theatre"))
            .await
            .unwrap();
        assert_eq!(endpoint.address().service_name(), "theatre");
        tokio_test::assert_ok!(endpoint.play_video().await);
    }

    #[tokio::test]
    async fn test_resolve_not_bound() {
        let registry = fake_registry(Response::NotBound("theatre".into())).await;
        let transport = TcpTransport::default();

        let result = transport.resolve(&addr_of(&registry, "theatre")).await;
        assert!(matches!(result, Err(ResolveError::NotBound(name)) if name == "theatre"));
    }

    #[tokio::test]
    async fn test_resolve_refused() {
        let port = closed_port().await;
        let transport = TcpTransport::default();
        let address = ServiceAddress::new("127.0.0.1", port, "theatre").unwrap();

        let result = transport.resolve(&address).await;
        assert!(matches!(result, Err(ResolveError::Transport(_))));
    }

    #[tokio::test]
    async fn test_invoke_fault_is_remote_error() {
        let registry = fake_registry(Response::Fault("context closed".into())).await;
        let endpoint = TcpEndpoint {
            address: addr_of(&registry, "theatre"),
            config: ClientConfig::default(),
        };

        let err = endpoint.pause_video().await.unwrap_err();
        assert!(matches!(err, CallError::Remote(_)));
        assert!(!err.is_communication_failure());
    }

    #[tokio::test]
    async fn test_invoke_unexpected_reply_is_protocol_error() {
        let registry = fake_registry(Response::Names(vec![])).await;
        let endpoint = TcpEndpoint {
            address: addr_of(&registry, "theatre"),
            config: ClientConfig::default(),
        };

        let err = endpoint.restart_video().await.unwrap_err();
        assert!(matches!(err, CallError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_invoke_refused_is_communication_failure() {
        let port = closed_port().await;
        let endpoint = TcpEndpoint {
            address: ServiceAddress::new("127.0.0.1", port, "theatre").unwrap(),
            config: ClientConfig::default(),
        };

        let err = endpoint.play_video().await.unwrap_err();
        assert!(err.is_communication_failure());
    }

    #[tokio::test]
    async fn test_silent_peer_times_out() {
        // Accepts connections but never replies
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let endpoint = TcpEndpoint {
            address: ServiceAddress::new("127.0.0.1", port, "theatre").unwrap(),
            config: ClientConfig::default().call_timeout(Duration::from_millis(100)),
        };

        let err = endpoint.play_video().await.unwrap_err();
        assert!(matches!(err, CallError::Timeout(_)));
        assert!(err.is_communication_failure());
    }

    #[tokio::test]
    async fn test_list() {
        let registry = fake_registry(Response::Names(vec!["a".into(), "b".into()])).await;
        let (host, port) = registry.rsplit_once(':').unwrap();

        let names = TcpTransport::default()
            .list(host, port.parse().unwrap())
            .await
            .unwrap();
        assert_eq!(names, vec!["a", "b"]);
    }
}
