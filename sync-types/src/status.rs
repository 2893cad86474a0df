//! Playback state types.
//!
//! [`MovieStatus`] is the shared target state owned by the room. Peers never
//! mutate it directly; they publish messages and reconcile toward whatever
//! snapshot the room pushes back.

use serde::{Deserialize, Serialize};

/// Authoritative transport state of the shared movie.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovieStatus {
    /// Canonical playback position in seconds.
    pub seek: f64,
    /// Canonical playback speed multiplier.
    pub rate: f64,
    /// Canonical transport state.
    pub playing: bool,
}

impl MovieStatus {
    /// Create a status snapshot.
    pub fn new(seek: f64, rate: f64, playing: bool) -> Self {
        Self {
            seek,
            rate,
            playing,
        }
    }
}

impl Default for MovieStatus {
    fn default() -> Self {
        Self {
            seek: 0.0,
            rate: 1.0,
            playing: false,
        }
    }
}

/// A peer's local playback view, as carried in outbound messages.
///
/// `playing` is absent on seek messages: a seek says nothing about whether
/// the transport should be running.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Local transport state, if the message asserts one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playing: Option<bool>,
    /// Local playback position in seconds.
    pub seek: f64,
    /// Local playback rate.
    pub rate: f64,
}

impl StatusSnapshot {
    /// Snapshot that asserts a transport state.
    pub fn with_playing(playing: bool, seek: f64, rate: f64) -> Self {
        Self {
            playing: Some(playing),
            seek,
            rate,
        }
    }

    /// Snapshot for a seek, which leaves the transport state unspecified.
    pub fn position_only(seek: f64, rate: f64) -> Self {
        Self {
            playing: None,
            seek,
            rate,
        }
    }
}

impl From<MovieStatus> for StatusSnapshot {
    fn from(status: MovieStatus) -> Self {
        Self::with_playing(status.playing, status.seek, status.rate)
    }
}
