//! Status messages for playsync.
//!
//! Every message is a fresh value: built, handed to the publish callback,
//! then dropped. Nothing here has identity beyond its fields.

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::{StatusSnapshot, SyncError};

/// Message kind, serialized with its stable wire identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    /// Local transport started
    Play,
    /// Local transport paused
    Pause,
    /// Local position jumped
    ChangeSeek,
    /// Local playback rate changed
    ChangeRate,
    /// User asked the room to resend its status
    SyncMovieStatus,
    /// Periodic drift check
    Check,
}

impl MessageType {
    /// All message kinds, in wire order.
    pub const ALL: [MessageType; 6] = [
        MessageType::Play,
        MessageType::Pause,
        MessageType::ChangeSeek,
        MessageType::ChangeRate,
        MessageType::SyncMovieStatus,
        MessageType::Check,
    ];

    /// Stable wire identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Play => "PLAY",
            MessageType::Pause => "PAUSE",
            MessageType::ChangeSeek => "CHANGE_SEEK",
            MessageType::ChangeRate => "CHANGE_RATE",
            MessageType::SyncMovieStatus => "SYNC_MOVIE_STATUS",
            MessageType::Check => "CHECK",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MessageType::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| SyncError::InvalidMessageType(s.to_string()))
    }
}

/// Payload of a CHECK message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    /// The sender's full local status.
    pub status: StatusSnapshot,
    /// Epoch token; the room discards checks carrying a stale one.
    pub expire_id: u64,
}

/// Milliseconds since the Unix epoch on the local wall clock.
///
/// The value every message's `time` field carries. A clock set before the
/// epoch yields 0.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// An outbound status message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusMessage {
    /// Message kind
    #[serde(rename = "type")]
    pub kind: MessageType,
    /// Emission time, milliseconds since the Unix epoch in the sender's clock.
    /// Zero for SYNC_MOVIE_STATUS.
    #[serde(default)]
    pub time: i64,
    /// Status carried by PLAY, PAUSE, CHANGE_SEEK and CHANGE_RATE.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_movie_status_req: Option<StatusSnapshot>,
    /// Payload carried by CHECK.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_req: Option<CheckRequest>,
}

impl StatusMessage {
    fn with_status(kind: MessageType, time: i64, status: StatusSnapshot) -> Self {
        Self {
            kind,
            time,
            change_movie_status_req: Some(status),
            check_req: None,
        }
    }

    /// PLAY message.
    pub fn play(time: i64, seek: f64, rate: f64) -> Self {
        Self::with_status(
            MessageType::Play,
            time,
            StatusSnapshot::with_playing(true, seek, rate),
        )
    }

    /// PAUSE message.
    pub fn pause(time: i64, seek: f64, rate: f64) -> Self {
        Self::with_status(
            MessageType::Pause,
            time,
            StatusSnapshot::with_playing(false, seek, rate),
        )
    }

    /// CHANGE_SEEK message. Never carries `playing`.
    pub fn change_seek(time: i64, seek: f64, rate: f64) -> Self {
        Self::with_status(
            MessageType::ChangeSeek,
            time,
            StatusSnapshot::position_only(seek, rate),
        )
    }

    /// CHANGE_RATE message.
    pub fn change_rate(time: i64, playing: bool, seek: f64, rate: f64) -> Self {
        Self::with_status(
            MessageType::ChangeRate,
            time,
            StatusSnapshot::with_playing(playing, seek, rate),
        )
    }

    /// SYNC_MOVIE_STATUS message (no payload).
    pub fn sync_movie_status() -> Self {
        Self {
            kind: MessageType::SyncMovieStatus,
            time: 0,
            change_movie_status_req: None,
            check_req: None,
        }
    }

    /// CHECK message.
    pub fn check(time: i64, status: StatusSnapshot, expire_id: u64) -> Self {
        Self {
            kind: MessageType::Check,
            time,
            change_movie_status_req: None,
            check_req: Some(CheckRequest { status, expire_id }),
        }
    }

    /// The status snapshot this message asserts, whatever its kind.
    pub fn snapshot(&self) -> Option<StatusSnapshot> {
        self.change_movie_status_req
            .or_else(|| self.check_req.map(|check| check.status))
    }

    /// Check that the payload matches the message kind.
    pub fn validate(&self) -> Result<(), SyncError> {
        let ok = match self.kind {
            MessageType::SyncMovieStatus => {
                self.change_movie_status_req.is_none() && self.check_req.is_none()
            }
            MessageType::Check => self.check_req.is_some() && self.change_movie_status_req.is_none(),
            MessageType::ChangeSeek => matches!(
                self.change_movie_status_req,
                Some(StatusSnapshot { playing: None, .. })
            ),
            MessageType::Play | MessageType::Pause | MessageType::ChangeRate => matches!(
                self.change_movie_status_req,
                Some(StatusSnapshot {
                    playing: Some(_),
                    ..
                })
            ),
        };

        if ok {
            Ok(())
        } else {
            Err(SyncError::InvalidData(format!(
                "payload does not match message type {}",
                self.kind
            )))
        }
    }

    /// Serialize to MessagePack bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SyncError> {
        rmp_serde::to_vec_named(self).map_err(SyncError::Serialization)
    }

    /// Deserialize from MessagePack bytes, rejecting mismatched payloads.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SyncError> {
        let message: Self = rmp_serde::from_slice(bytes).map_err(SyncError::Deserialization)?;
        message.validate()?;
        Ok(message)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, SyncError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON, rejecting mismatched payloads.
    pub fn from_json(json: &str) -> Result<Self, SyncError> {
        let message: Self = serde_json::from_str(json)?;
        message.validate()?;
        Ok(message)
    }
}
