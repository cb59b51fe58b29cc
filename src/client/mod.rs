//! Controller-side transport
//!
//! Provides the [`Transport`] / [`RemoteEndpoint`] seam used by the session
//! core, and its TCP implementation speaking the registry wire protocol.

pub mod config;
pub mod error;
pub mod tcp;
pub mod transport;

pub use config::ClientConfig;
pub use error::{CallError, ResolveError};
pub use tcp::{TcpEndpoint, TcpTransport};
pub use transport::{RemoteEndpoint, Transport};
