//! Transport seam
//!
//! The session core talks to remote hosts only through these two traits. A
//! transport turns a [`ServiceAddress`] into an endpoint; an endpoint performs
//! calls that either succeed or fail with a [`CallError`].

use std::future::Future;

use super::error::{CallError, ResolveError};
use crate::protocol::{PlaybackCommand, ServiceAddress};

/// Resolved, reusable handle to one remote playback service
pub trait RemoteEndpoint: Send + Sync + 'static {
    /// Address this endpoint was resolved from
    fn address(&self) -> &ServiceAddress;

    /// Perform one remote call, waiting for the reply or a transport failure
    fn invoke(&self, command: PlaybackCommand)
        -> impl Future<Output = Result<(), CallError>> + Send;

    fn play_video(&self) -> impl Future<Output = Result<(), CallError>> + Send {
        self.invoke(PlaybackCommand::Play)
    }

    fn pause_video(&self) -> impl Future<Output = Result<(), CallError>> + Send {
        self.invoke(PlaybackCommand::Pause)
    }

    fn restart_video(&self) -> impl Future<Output = Result<(), CallError>> + Send {
        self.invoke(PlaybackCommand::Restart)
    }
}

/// Locates named services on remote registries
pub trait Transport: Send + Sync + 'static {
    type Endpoint: RemoteEndpoint;

    /// Look up `address` and return an endpoint for it
    fn resolve(
        &self,
        address: &ServiceAddress,
    ) -> impl Future<Output = Result<Self::Endpoint, ResolveError>> + Send;

    /// Names bound on the registry at `hostname:port`
    fn list(
        &self,
        hostname: &str,
        port: u16,
    ) -> impl Future<Output = Result<Vec<String>, ResolveError>> + Send;
}
