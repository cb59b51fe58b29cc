//! Host-side playback
//!
//! [`PlaybackService`] is what a host publishes. It owns an
//! [`ExecutionContext`] whose worker thread is the only place the
//! [`Player`] is ever touched; inbound calls are enqueued there and return
//! immediately (fire-and-forget).

pub mod context;
pub mod player;
pub mod service;

pub use context::{ContextError, ExecutionContext, DEFAULT_QUEUE_CAPACITY};
pub use player::{HeadlessPlayer, PlaybackState, Player, PlayerHandle, PlayerStatus};
pub use service::{PlaybackService, PlayerSlot, RemotePlayback, ServiceError};
