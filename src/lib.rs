//! Remote playback control
//!
//! A controller drives play, pause and restart on media-playback hosts across
//! the network. Hosts publish a playback service under a name on a registry
//! port; controllers connect to `host:port/serviceName` and send commands.
//!
//! # Host
//!
//! ```ignore
//! use remote_playback::playback::{HeadlessPlayer, PlaybackService};
//! use remote_playback::registry::ServiceRegistry;
//!
//! let service = PlaybackService::new("stage")?;
//! let (player, _status) = HeadlessPlayer::new("intro.mp4");
//! service.set_player(player)?;
//!
//! let registry = ServiceRegistry::new();
//! registry.publish(1099, "theatre", service.clone()).await?;
//! ```
//!
//! # Controller
//!
//! ```ignore
//! use std::sync::Arc;
//! use remote_playback::client::TcpTransport;
//! use remote_playback::session::{CommandDispatcher, SessionRegistry};
//!
//! let sessions = Arc::new(SessionRegistry::new(TcpTransport::default()));
//! let id = sessions.connect("localhost", 1099, "theatre").await?;
//!
//! let dispatcher = CommandDispatcher::new(Arc::clone(&sessions));
//! dispatcher.play(&id).await?;
//! ```
//!
//! A command that fails because the host can no longer be reached evicts the
//! session; the user has to connect again.

pub mod client;
pub mod error;
pub mod playback;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;

pub use client::{ClientConfig, TcpTransport};
pub use error::{Error, Result};
pub use playback::{HeadlessPlayer, PlaybackService, Player, RemotePlayback};
pub use protocol::{PlaybackCommand, ServiceAddress};
pub use registry::ServiceRegistry;
pub use server::{HostConfig, ServerConfig};
pub use session::{CommandDispatcher, SessionId, SessionRegistry};
