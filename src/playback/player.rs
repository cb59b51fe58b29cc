//! Player collaborator
//!
//! The host wires a local media player into the playback service through the
//! [`Player`] trait. Rendering is outside this crate; [`HeadlessPlayer`] tracks
//! playback state only and publishes it on a watch channel.

use std::fmt;
use std::time::Duration;

use tokio::sync::watch;

/// A local media player driven by the playback service
///
/// Implementations are moved onto the player execution context and only ever
/// called from that thread.
pub trait Player: Send + 'static {
    fn play(&mut self);

    fn pause(&mut self);

    fn seek(&mut self, position: Duration);

    /// Position that `restart` seeks back to
    fn start_time(&self) -> Duration {
        Duration::ZERO
    }

    /// Called when the player is replaced or removed
    fn stop(&mut self) {}

    /// Short description for log output (usually the media name)
    fn describe(&self) -> String {
        String::from("player")
    }
}

/// Boxed player as held by the execution context
pub type PlayerHandle = Box<dyn Player>;

/// Playback state reported by [`HeadlessPlayer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlaybackState::Stopped => "stopped",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
        };
        f.write_str(s)
    }
}

/// Snapshot of a headless player
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlayerStatus {
    pub state: PlaybackState,
    /// Last seek target
    pub position: Duration,
    /// Media name
    pub media: String,
    /// Number of times playback was (re)started from the start time
    pub restarts: u32,
}

/// Player without a rendering surface
///
/// Every state change is pushed to the watch channel returned by
/// [`HeadlessPlayer::new`].
pub struct HeadlessPlayer {
    status: PlayerStatus,
    start_time: Duration,
    tx: watch::Sender<PlayerStatus>,
}

impl HeadlessPlayer {
    /// Create a player for the given media.
    ///
    /// Returns the player and a receiver for its status.
    pub fn new(media: impl Into<String>) -> (Self, watch::Receiver<PlayerStatus>) {
        let status = PlayerStatus {
            media: media.into(),
            ..Default::default()
        };
        let (tx, rx) = watch::channel(status.clone());

        let player = Self {
            status,
            start_time: Duration::ZERO,
            tx,
        };

        (player, rx)
    }

    /// Set the position that restarts seek to
    pub fn with_start_time(mut self, start_time: Duration) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn status(&self) -> &PlayerStatus {
        &self.status
    }

    fn publish(&self) {
        self.tx.send_replace(self.status.clone());
    }
}

impl Player for HeadlessPlayer {
    fn play(&mut self) {
        self.status.state = PlaybackState::Playing;
        self.publish();
    }

    fn pause(&mut self) {
        // Pausing a stopped player keeps it stopped
        if self.status.state == PlaybackState::Playing {
            self.status.state = PlaybackState::Paused;
            self.publish();
        }
    }

    fn seek(&mut self, position: Duration) {
        self.status.position = position;
        if position == self.start_time {
            self.status.restarts += 1;
        }
        self.publish();
    }

    fn start_time(&self) -> Duration {
        self.start_time
    }

    fn stop(&mut self) {
        self.status.state = PlaybackState::Stopped;
        self.status.position = self.start_time;
        self.publish();
    }

    fn describe(&self) -> String {
        self.status.media.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_transitions() {
        let (mut player, rx) = HeadlessPlayer::new("intro.mp4");
        assert_eq!(rx.borrow().state, PlaybackState::Stopped);
        assert_eq!(rx.borrow().media, "intro.mp4");

        player.play();
        assert_eq!(rx.borrow().state, PlaybackState::Playing);

        player.pause();
        assert_eq!(rx.borrow().state, PlaybackState::Paused);

        player.stop();
        assert_eq!(rx.borrow().state, PlaybackState::Stopped);
    }

    #[test]
    fn test_pause_when_stopped_is_ignored() {
        let (mut player, rx) = HeadlessPlayer::new("a");
        player.pause();
        assert_eq!(rx.borrow().state, PlaybackState::Stopped);
    }

    #[test]
    fn test_seek_to_start_counts_restart() {
        let (player, rx) = HeadlessPlayer::new("a");
        let mut player = player.with_start_time(Duration::from_secs(2));

        player.seek(Duration::from_secs(10));
        assert_eq!(rx.borrow().restarts, 0);

        let start = player.start_time();
        player.seek(start);
        assert_eq!(rx.borrow().restarts, 1);
        assert_eq!(rx.borrow().position, Duration::from_secs(2));
    }

    #[test]
    fn test_status_survives_dropped_receiver() {
        let (mut player, rx) = HeadlessPlayer::new("a");
        drop(rx);
        player.play();
        assert_eq!(player.status().state, PlaybackState::Playing);
        assert_eq!(player.describe(), "a");
    }
}
