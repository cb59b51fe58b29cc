//! Playback service
//!
//! The remotely invokable side of a host. Every operation is marshaled onto
//! the player execution context; the calling thread (usually a connection
//! task of the registry server) only enqueues and returns.

use thiserror::Error;

use super::context::{ContextError, ExecutionContext, DEFAULT_QUEUE_CAPACITY};
use super::player::{Player, PlayerHandle};
use crate::protocol::PlaybackCommand;

/// Errors a playback service can report to its caller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("playback context is closed")]
    ContextClosed,
    /// Too many operations are waiting for the player
    #[error("playback queue is full, try again")]
    Busy,
}

impl From<ContextError> for ServiceError {
    fn from(e: ContextError) -> Self {
        match e {
            ContextError::Full => ServiceError::Busy,
            ContextError::Closed | ContextError::Dropped => ServiceError::ContextClosed,
        }
    }
}

/// The remote interface surface of a playback host
///
/// Operations take no arguments and report only success or failure.
pub trait RemotePlayback: Send + Sync + 'static {
    fn play_video(&self) -> Result<(), ServiceError>;

    fn pause_video(&self) -> Result<(), ServiceError>;

    fn restart_video(&self) -> Result<(), ServiceError>;

    fn invoke(&self, command: PlaybackCommand) -> Result<(), ServiceError> {
        match command {
            PlaybackCommand::Play => self.play_video(),
            PlaybackCommand::Pause => self.pause_video(),
            PlaybackCommand::Restart => self.restart_video(),
        }
    }
}

/// Player slot owned by the execution context
#[derive(Default)]
pub struct PlayerSlot {
    player: Option<PlayerHandle>,
}

impl PlayerSlot {
    pub fn is_set(&self) -> bool {
        self.player.is_some()
    }

    fn replace(&mut self, player: Option<PlayerHandle>) {
        if let Some(mut old) = std::mem::replace(&mut self.player, player) {
            tracing::debug!(player = %old.describe(), "Stopping replaced player");
            old.stop();
        }
    }

    fn apply(&mut self, label: &str, command: PlaybackCommand) {
        let Some(player) = self.player.as_mut() else {
            tracing::warn!(
                service = %label,
                operation = command.operation(),
                "Cannot {} video: player is not set",
                command
            );
            return;
        };

        match command {
            PlaybackCommand::Play => player.play(),
            PlaybackCommand::Pause => player.pause(),
            PlaybackCommand::Restart => {
                let start = player.start_time();
                player.seek(start);
                player.play();
            }
        }

        tracing::info!(
            service = %label,
            player = %player.describe(),
            operation = command.operation(),
            "Playback command applied"
        );
    }
}

/// Playback service bound into a registry
///
/// Cloning yields another handle to the same service and player.
#[derive(Clone)]
pub struct PlaybackService {
    label: String,
    context: ExecutionContext<PlayerSlot>,
}

impl PlaybackService {
    /// Create a service with its own player execution context
    ///
    /// The worker thread is named after `label`.
    pub fn new(label: impl Into<String>) -> std::io::Result<Self> {
        Self::with_capacity(label, DEFAULT_QUEUE_CAPACITY)
    }

    /// Create a service that queues at most `capacity` pending operations
    ///
    /// Operations beyond that fail with [`ServiceError::Busy`].
    pub fn with_capacity(label: impl Into<String>, capacity: usize) -> std::io::Result<Self> {
        let label = label.into();
        let context = ExecutionContext::with_capacity(
            format!("player-{}", label),
            PlayerSlot::default(),
            capacity,
        )?;
        Ok(Self { label, context })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Replace the current player
    ///
    /// Operations enqueued after this call observe the new player.
    pub fn set_player<P: Player>(&self, player: P) -> Result<(), ServiceError> {
        let label = self.label.clone();
        self.context.run_later(move |slot| {
            tracing::info!(service = %label, player = %player.describe(), "Player set");
            slot.replace(Some(Box::new(player)));
        })?;
        Ok(())
    }

    /// Remove the current player, stopping it
    pub fn clear_player(&self) -> Result<(), ServiceError> {
        let label = self.label.clone();
        self.context.run_later(move |slot| {
            if slot.is_set() {
                tracing::info!(service = %label, "Player cleared");
            }
            slot.replace(None);
        })?;
        Ok(())
    }

    /// Enqueue a playback command
    pub fn execute(&self, command: PlaybackCommand) -> Result<(), ServiceError> {
        let label = self.label.clone();
        self.context
            .run_later(move |slot| slot.apply(&label, command))?;
        tracing::debug!(service = %self.label, command = %command, "Playback command queued");
        Ok(())
    }

    pub fn play(&self) -> Result<(), ServiceError> {
        self.execute(PlaybackCommand::Play)
    }

    pub fn pause(&self) -> Result<(), ServiceError> {
        self.execute(PlaybackCommand::Pause)
    }

    pub fn restart(&self) -> Result<(), ServiceError> {
        self.execute(PlaybackCommand::Restart)
    }

    /// Wait until every operation queued so far has been applied
    pub async fn flush(&self) -> Result<(), ServiceError> {
        self.context.call(|_| ()).await?;
        Ok(())
    }

    /// Whether a player is currently set
    pub async fn has_player(&self) -> Result<bool, ServiceError> {
        Ok(self.context.call(|slot| slot.is_set()).await?)
    }

    /// Stop the current player and shut the execution context down
    pub fn shutdown(&self) {
        let _ = self.clear_player();
        self.context.shutdown();
    }

    /// Block until the execution context thread has exited
    pub fn join(&self) {
        self.context.join();
    }
}

impl RemotePlayback for PlaybackService {
    fn play_video(&self) -> Result<(), ServiceError> {
        self.play()
    }

    fn pause_video(&self) -> Result<(), ServiceError> {
        self.pause()
    }

    fn restart_video(&self) -> Result<(), ServiceError> {
        self.restart()
    }
}

impl std::fmt::Debug for PlaybackService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackService")
            .field("label", &self.label)
            .field("context", &self.context.name())
            .finish()
    }
}
