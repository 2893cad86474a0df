//! Build and print a single status message.

use anyhow::Result;
use playsync_types::{now_millis, MessageType, StatusMessage, StatusSnapshot};

/// Build a message of `kind` from command-line values.
///
/// Fields the kind does not carry are ignored.
pub fn build(
    kind: MessageType,
    seek: f64,
    rate: f64,
    playing: bool,
    expire_id: u64,
    time: Option<i64>,
) -> StatusMessage {
    let time = time.unwrap_or_else(now_millis);
    match kind {
        MessageType::Play => StatusMessage::play(time, seek, rate),
        MessageType::Pause => StatusMessage::pause(time, seek, rate),
        MessageType::ChangeSeek => StatusMessage::change_seek(time, seek, rate),
        MessageType::ChangeRate => StatusMessage::change_rate(time, playing, seek, rate),
        MessageType::SyncMovieStatus => StatusMessage::sync_movie_status(),
        MessageType::Check => StatusMessage::check(
            time,
            StatusSnapshot::with_playing(playing, seek, rate),
            expire_id,
        ),
    }
}

/// Render a message as JSON, or as hex-encoded MessagePack.
pub fn render(message: &StatusMessage, msgpack: bool) -> Result<String> {
    if msgpack {
        Ok(hex::encode(message.to_bytes()?))
    } else {
        Ok(message.to_json()?)
    }
}
