//! In-process room authority for the simulator.
//!
//! Stands in for the server a real deployment talks to: it owns the
//! authoritative [`MovieStatus`], bumps the expire epoch on every accepted
//! change, and decides which messages are re-broadcast to the peers.

use std::time::Instant;

use playsync_types::{MessageType, MovieStatus, StatusMessage, SyncError};

/// What the room did with a message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// The authoritative status changed; broadcast it.
    Updated(MovieStatus),
    /// Status unchanged, but the sender asked for (or needs) it again.
    Resent(MovieStatus),
    /// CHECK agreed with the room.
    InSync,
    /// CHECK carried an old expire epoch.
    Stale,
}

impl Outcome {
    /// Status to broadcast, if any.
    pub fn broadcast(&self) -> Option<MovieStatus> {
        match self {
            Outcome::Updated(status) | Outcome::Resent(status) => Some(*status),
            Outcome::InSync | Outcome::Stale => None,
        }
    }
}

/// Authoritative playback state for one room.
#[derive(Debug, Clone)]
pub struct Room {
    status: MovieStatus,
    updated_at: Instant,
    expire_id: u64,
    tolerance: f64,
}

impl Room {
    /// Create a room holding `initial` as of `now`.
    pub fn new(initial: MovieStatus, tolerance: f64, now: Instant) -> Self {
        Self {
            status: initial,
            updated_at: now,
            expire_id: 1,
            tolerance,
        }
    }

    /// Current expire epoch.
    pub fn expire_id(&self) -> u64 {
        self.expire_id
    }

    /// Authoritative status projected to `now`.
    pub fn status_at(&self, now: Instant) -> MovieStatus {
        let mut status = self.status;
        if status.playing {
            let elapsed = now.saturating_duration_since(self.updated_at).as_secs_f64();
            status.seek += elapsed * status.rate;
        }
        status
    }

    /// Process one message from a peer.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidData`] if the payload does not match the kind.
    pub fn handle(&mut self, message: &StatusMessage, now: Instant) -> Result<Outcome, SyncError> {
        message.validate()?;

        match message.kind {
            MessageType::SyncMovieStatus => Ok(Outcome::Resent(self.status_at(now))),
            MessageType::Check => {
                let Some(check) = message.check_req else {
                    return Err(SyncError::InvalidData("CHECK without payload".into()));
                };
                if check.expire_id != self.expire_id {
                    tracing::debug!(
                        got = check.expire_id,
                        current = self.expire_id,
                        "discarding stale check"
                    );
                    return Ok(Outcome::Stale);
                }

                let current = self.status_at(now);
                let reported = check.status;
                let drifted = (current.seek - reported.seek).abs() > self.tolerance
                    || current.rate != reported.rate
                    || reported.playing.is_some_and(|p| p != current.playing);
                if drifted {
                    tracing::info!(?current, ?reported, "peer drifted, resending status");
                    Ok(Outcome::Resent(current))
                } else {
                    Ok(Outcome::InSync)
                }
            }
            _ => {
                let Some(snapshot) = message.snapshot() else {
                    return Err(SyncError::InvalidData(format!(
                        "{} without payload",
                        message.kind
                    )));
                };
                let mut next = self.status_at(now);
                next.seek = snapshot.seek;
                next.rate = snapshot.rate;
                if let Some(playing) = snapshot.playing {
                    next.playing = playing;
                }

                self.status = next;
                self.updated_at = now;
                self.expire_id += 1;
                tracing::info!(kind = %message.kind, expire_id = self.expire_id, "room status updated");
                Ok(Outcome::Updated(next))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playsync_types::StatusSnapshot;
    use std::time::Duration;

    fn room(now: Instant) -> Room {
        Room::new(MovieStatus::default(), 2.0, now)
    }

    #[test]
    fn play_updates_status_and_bumps_epoch() {
        let t0 = Instant::now();
        let mut room = room(t0);

        let outcome = room.handle(&StatusMessage::play(1, 30.0, 1.0), t0).unwrap();

        assert_eq!(outcome, Outcome::Updated(MovieStatus::new(30.0, 1.0, true)));
        assert_eq!(room.expire_id(), 2);
    }

    #[test]
    fn playing_status_advances_with_time() {
        let t0 = Instant::now();
        let mut room = room(t0);
        room.handle(&StatusMessage::play(1, 10.0, 2.0), t0).unwrap();

        let later = room.status_at(t0 + Duration::from_secs(3));
        assert_eq!(later.seek, 16.0);
    }

    #[test]
    fn seek_keeps_transport_state() {
        let t0 = Instant::now();
        let mut room = room(t0);
        room.handle(&StatusMessage::play(1, 0.0, 1.0), t0).unwrap();

        let outcome = room
            .handle(&StatusMessage::change_seek(2, 90.0, 1.0), t0)
            .unwrap();

        assert_eq!(outcome.broadcast(), Some(MovieStatus::new(90.0, 1.0, true)));
    }

    #[test]
    fn sync_request_resends_without_new_epoch() {
        let t0 = Instant::now();
        let mut room = room(t0);

        let outcome = room.handle(&StatusMessage::sync_movie_status(), t0).unwrap();

        assert_eq!(outcome, Outcome::Resent(MovieStatus::default()));
        assert_eq!(room.expire_id(), 1);
    }

    #[test]
    fn check_in_sync_is_quiet() {
        let t0 = Instant::now();
        let mut room = room(t0);
        let check = StatusMessage::check(1, StatusSnapshot::with_playing(false, 1.5, 1.0), 1);

        assert_eq!(room.handle(&check, t0).unwrap(), Outcome::InSync);
    }

    #[test]
    fn drifting_check_gets_status_back() {
        let t0 = Instant::now();
        let mut room = room(t0);
        let check = StatusMessage::check(1, StatusSnapshot::with_playing(false, 12.0, 1.0), 1);

        let outcome = room.handle(&check, t0).unwrap();
        assert_eq!(outcome.broadcast(), Some(MovieStatus::default()));
    }

    #[test]
    fn stale_check_is_discarded() {
        let t0 = Instant::now();
        let mut room = room(t0);
        room.handle(&StatusMessage::pause(1, 50.0, 1.0), t0).unwrap();

        let check = StatusMessage::check(2, StatusSnapshot::with_playing(false, 0.0, 1.0), 1);
        let outcome = room.handle(&check, t0).unwrap();

        assert_eq!(outcome, Outcome::Stale);
        assert_eq!(outcome.broadcast(), None);
    }

    #[test]
    fn malformed_message_is_rejected() {
        let t0 = Instant::now();
        let mut room = room(t0);
        let mut message = StatusMessage::play(1, 0.0, 1.0);
        message.change_movie_status_req = None;

        assert!(room.handle(&message, t0).is_err());
        assert_eq!(room.expire_id(), 1);
    }
}
