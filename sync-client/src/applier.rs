//! Inbound correction executor.
//!
//! Applies the plan from [`playsync_core::plan`] to the player. Every
//! mutation arms the echo guard first, so the event the player fires in
//! response is recognised as ours and never republished.

use std::sync::{Arc, Mutex};

use playsync_core::{plan, Corrections, EchoGuard, EchoKind, LocalPlayback, TransportCorrection};
use playsync_types::MovieStatus;

use crate::autoplay::{attempt_play, AutoplayOutcome};
use crate::player::Player;
use crate::publisher::SeekClock;
use crate::sink::Notifier;
use crate::{lock, now};

/// Applies room status to the player without echo.
pub struct Applier {
    player: Arc<dyn Player>,
    notifier: Arc<dyn Notifier>,
    echo: Arc<Mutex<EchoGuard>>,
    seek_clock: Arc<SeekClock>,
    drift_tolerance: f64,
}

impl Applier {
    /// Create an applier.
    pub fn new(
        player: Arc<dyn Player>,
        notifier: Arc<dyn Notifier>,
        echo: Arc<Mutex<EchoGuard>>,
        seek_clock: Arc<SeekClock>,
        drift_tolerance: f64,
    ) -> Self {
        Self {
            player,
            notifier,
            echo,
            seek_clock,
            drift_tolerance,
        }
    }

    fn local(&self) -> LocalPlayback {
        LocalPlayback {
            current_time: self.player.current_time(),
            playback_rate: self.player.playback_rate(),
            playing: self.player.is_playing(),
            is_live: self.player.is_live(),
        }
    }

    /// Bring the player in line with `target`: rate, then seek, then transport.
    ///
    /// Returns the corrections that were planned.
    pub async fn apply(&self, target: &MovieStatus) -> Corrections {
        let corrections = plan(target, &self.local(), self.drift_tolerance);
        tracing::debug!(?target, ?corrections, "reconciling");

        if corrections.refresh_seek_clock {
            self.seek_clock.touch();
        }
        if let Some(rate) = corrections.rate {
            self.guarded_rate(rate);
        }
        if let Some(seek) = corrections.seek {
            self.guarded_seek(seek);
        }
        match corrections.transport {
            Some(TransportCorrection::Play) => {
                self.guarded_play().await;
            }
            Some(TransportCorrection::Pause) => self.guarded_pause(),
            None => {}
        }

        corrections
    }

    /// Seek without publishing, unless drift is within tolerance.
    ///
    /// Refreshes the seek clock either way. Returns true if the player moved.
    pub fn set_seek_silently(&self, seek: f64) -> bool {
        self.seek_clock.touch();
        if self.player.is_live()
            || (self.player.current_time() - seek).abs() <= self.drift_tolerance
        {
            return false;
        }
        self.guarded_seek(seek);
        true
    }

    /// Change rate without publishing. Returns true if the rate changed.
    pub fn set_rate_silently(&self, rate: f64) -> bool {
        if self.player.is_live() || self.player.playback_rate() == rate {
            return false;
        }
        self.guarded_rate(rate);
        true
    }

    /// Start playback without publishing. `None` if nothing needed doing.
    pub async fn play_silently(&self) -> Option<AutoplayOutcome> {
        if self.player.is_live() || self.player.is_playing() {
            return None;
        }
        Some(self.guarded_play().await)
    }

    /// Pause without publishing. Returns true if the player was playing.
    pub fn pause_silently(&self) -> bool {
        if self.player.is_live() || !self.player.is_playing() {
            return false;
        }
        self.guarded_pause();
        true
    }

    fn guarded_seek(&self, seek: f64) {
        lock(&self.echo).arm(EchoKind::Seek, Some(seek), now());
        self.player.set_current_time(seek);
    }

    fn guarded_rate(&self, rate: f64) {
        lock(&self.echo).arm(EchoKind::Rate, Some(rate), now());
        self.player.set_playback_rate(rate);
    }

    /// The token stays live for as long as the engine takes to settle,
    /// including a muted retry.
    async fn guarded_play(&self) -> AutoplayOutcome {
        let token = lock(&self.echo).hold(EchoKind::Play, None);
        let outcome = attempt_play(self.player.as_ref(), self.notifier.as_ref()).await;
        let mut echo = lock(&self.echo);
        if outcome.is_playing() {
            echo.release(token, now());
        } else {
            echo.disarm(token);
        }
        outcome
    }

    fn guarded_pause(&self) {
        lock(&self.echo).arm(EchoKind::Pause, None, now());
        self.player.pause();
    }
}
