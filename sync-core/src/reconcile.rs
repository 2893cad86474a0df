//! Inbound reconciliation planning.
//!
//! Given the room's latest [`MovieStatus`] and the local player's state,
//! [`plan`] computes the minimal set of corrections to apply. The caller
//! applies them in field order: rate, then seek, then transport.

use playsync_types::MovieStatus;

/// Position drift (seconds) tolerated before a seek correction is issued.
pub const DRIFT_TOLERANCE_SECS: f64 = 2.0;

/// The local player's transport state, as read just before planning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalPlayback {
    /// Current position in seconds.
    pub current_time: f64,
    /// Current playback rate.
    pub playback_rate: f64,
    /// Whether the transport is running.
    pub playing: bool,
    /// Live streams have no position or rate to reconcile.
    pub is_live: bool,
}

/// Transport change required to match the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCorrection {
    /// Start playback (through the resilient autoplay path).
    Play,
    /// Pause playback.
    Pause,
}

/// Corrections to apply, in field order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Corrections {
    /// New playback rate, if it differs.
    pub rate: Option<f64>,
    /// New position, if drift exceeds the tolerance.
    pub seek: Option<f64>,
    /// Transport change, if it differs.
    pub transport: Option<TransportCorrection>,
    /// Whether the local seek clock should be refreshed.
    ///
    /// Always true: comparing positions proves the player is tracking the
    /// room, even when the drift is within tolerance.
    pub refresh_seek_clock: bool,
}

impl Corrections {
    /// True when nothing needs to change on the player.
    pub fn is_empty(&self) -> bool {
        self.rate.is_none() && self.seek.is_none() && self.transport.is_none()
    }
}

/// Plan the corrections that bring `local` in line with `target`.
///
/// Pure function - the caller is responsible for applying the result.
pub fn plan(target: &MovieStatus, local: &LocalPlayback, tolerance: f64) -> Corrections {
    let mut corrections = Corrections {
        refresh_seek_clock: true,
        ..Corrections::default()
    };

    if local.is_live {
        return corrections;
    }

    if target.rate != local.playback_rate {
        corrections.rate = Some(target.rate);
    }

    if (target.seek - local.current_time).abs() > tolerance {
        corrections.seek = Some(target.seek);
    }

    corrections.transport = match (target.playing, local.playing) {
        (true, false) => Some(TransportCorrection::Play),
        (false, true) => Some(TransportCorrection::Pause),
        _ => None,
    };

    corrections
}
