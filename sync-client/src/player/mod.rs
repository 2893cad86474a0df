//! Player abstraction for playsync.
//!
//! This module provides the seam between the sync session and whatever
//! actually decodes and renders media (a browser video element, mpv, a mock).
//!
//! # Design
//!
//! Property access is synchronous, mirroring how media elements expose
//! `currentTime` and `playbackRate`. Starting playback is async because
//! engines may refuse it (autoplay policy) after some delay.
//!
//! Setters fire the same [`PlayerEvent`] a user action would. The session
//! relies on that to publish user actions, and on its echo guard to tell
//! its own corrections apart.

mod mock;

pub use mock::MockPlayer;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

/// Player errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlayerError {
    /// The engine refused to start playback.
    #[error("playback rejected: {0}")]
    PlaybackRejected(String),

    /// The player has been destroyed.
    #[error("player destroyed")]
    Destroyed,
}

/// Events a player emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The player finished loading and accepts commands.
    Ready,
    /// Transport started.
    Play,
    /// Transport paused.
    Pause,
    /// Position jumped.
    Seek,
    /// Playback rate changed.
    RateChange,
    /// A registered control was clicked.
    ControlClicked(String),
    /// A registered setting entry was selected.
    SettingSelected(String),
    /// The player is going away.
    Destroy,
}

/// Where a control sits in the control bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPosition {
    /// Left-hand group.
    Left,
    /// Right-hand group.
    Right,
}

/// A clickable control-bar button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    /// Unique name, reported back in [`PlayerEvent::ControlClicked`].
    pub name: String,
    /// Label shown to the user.
    pub label: String,
    /// Placement in the control bar.
    pub position: ControlPosition,
}

/// An entry in the player's settings menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    /// Unique name, reported back in [`PlayerEvent::SettingSelected`].
    pub name: String,
    /// Menu label.
    pub label: String,
    /// Label of the selectable option.
    pub option: String,
}

/// The local media player a session keeps in sync.
#[async_trait]
pub trait Player: Send + Sync {
    /// Current position in seconds.
    fn current_time(&self) -> f64;

    /// Jump to a position. Fires [`PlayerEvent::Seek`].
    fn set_current_time(&self, seconds: f64);

    /// Current playback rate.
    fn playback_rate(&self) -> f64;

    /// Change the playback rate. Fires [`PlayerEvent::RateChange`] when it changes.
    fn set_playback_rate(&self, rate: f64);

    /// Media duration in seconds (NaN if unknown).
    fn duration(&self) -> f64;

    /// Whether the transport is running.
    fn is_playing(&self) -> bool;

    /// Whether the media is a live stream.
    fn is_live(&self) -> bool;

    /// Whether the player already fired [`PlayerEvent::Ready`].
    fn is_ready(&self) -> bool;

    /// Whether audio is muted.
    fn is_muted(&self) -> bool;

    /// Mute or unmute audio.
    fn set_muted(&self, muted: bool);

    /// Start playback. Fires [`PlayerEvent::Play`] on success.
    async fn play(&self) -> Result<(), PlayerError>;

    /// Pause playback. Fires [`PlayerEvent::Pause`] if it was playing.
    fn pause(&self);

    /// Subscribe to events fired from now on.
    fn subscribe(&self) -> broadcast::Receiver<PlayerEvent>;

    /// Add a control-bar button.
    fn add_control(&self, control: Control);

    /// Remove a control-bar button by name. No-op if absent.
    fn remove_control(&self, name: &str);

    /// Whether a control with this name is registered.
    fn has_control(&self, name: &str) -> bool;

    /// Add a settings menu entry.
    fn add_setting(&self, setting: Setting);
}
