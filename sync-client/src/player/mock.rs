//! Mock player for testing.
//!
//! Behaves like a media element: setters fire their natural events, playback
//! can be refused, and controls can be "clicked". Records every mutation for
//! verification.

use super::{Control, Player, PlayerError, PlayerEvent, Setting};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

use crate::lock;

const EVENT_CAPACITY: usize = 64;

/// Mock player for testing.
///
/// Clones share state, so a test can keep one handle while the session
/// owns another.
#[derive(Debug)]
pub struct MockPlayer {
    inner: Arc<Mutex<MockPlayerInner>>,
    events: broadcast::Sender<PlayerEvent>,
}

#[derive(Debug)]
struct MockPlayerInner {
    current_time: f64,
    playback_rate: f64,
    duration: f64,
    playing: bool,
    live: bool,
    ready: bool,
    muted: bool,
    destroyed: bool,
    controls: Vec<Control>,
    settings: Vec<Setting>,
    play_failures: VecDeque<(String, Duration)>,
    event_delay: Duration,
    events_enabled: bool,
    play_attempts: usize,
    seeks: Vec<f64>,
}

impl MockPlayer {
    /// Create a paused on-demand player at position 0 with the given duration.
    pub fn new(duration: f64) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(MockPlayerInner {
                current_time: 0.0,
                playback_rate: 1.0,
                duration,
                playing: false,
                live: false,
                ready: false,
                muted: false,
                destroyed: false,
                controls: Vec::new(),
                settings: Vec::new(),
                play_failures: VecDeque::new(),
                event_delay: Duration::ZERO,
                events_enabled: true,
                play_attempts: 0,
                seeks: Vec::new(),
            })),
            events,
        }
    }

    /// Create a live-stream player.
    pub fn live() -> Self {
        let player = Self::new(f64::NAN);
        lock(&player.inner).live = true;
        player
    }

    fn emit(&self, event: PlayerEvent) {
        let (enabled, delay) = {
            let inner = lock(&self.inner);
            (inner.events_enabled, inner.event_delay)
        };
        if !enabled {
            return;
        }
        if delay.is_zero() {
            // No subscribers is fine.
            let _ = self.events.send(event);
            return;
        }
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(event);
        });
    }

    /// Deliver every later event `delay` after the action that caused it.
    ///
    /// Needs a tokio runtime once non-zero.
    pub fn set_event_delay(&self, delay: Duration) {
        lock(&self.inner).event_delay = delay;
    }

    /// Stop (or resume) firing events, as an engine that swallows them.
    pub fn set_events_enabled(&self, enabled: bool) {
        lock(&self.inner).events_enabled = enabled;
    }

    /// Signal that the player is ready.
    pub fn fire_ready(&self) {
        lock(&self.inner).ready = true;
        self.emit(PlayerEvent::Ready);
    }

    /// Signal that the player is being destroyed.
    pub fn destroy(&self) {
        lock(&self.inner).destroyed = true;
        self.emit(PlayerEvent::Destroy);
    }

    /// Simulate a user clicking a control. Ignored if not registered.
    pub fn click_control(&self, name: &str) -> bool {
        if !self.has_control(name) {
            return false;
        }
        self.emit(PlayerEvent::ControlClicked(name.to_string()));
        true
    }

    /// Simulate a user picking a settings entry. Ignored if not registered.
    pub fn select_setting(&self, name: &str) -> bool {
        let known = lock(&self.inner).settings.iter().any(|s| s.name == name);
        if known {
            self.emit(PlayerEvent::SettingSelected(name.to_string()));
        }
        known
    }

    /// Advance the position as if `seconds` of wall time played.
    pub fn advance(&self, seconds: f64) {
        let mut inner = lock(&self.inner);
        if inner.playing {
            let next = inner.current_time + seconds * inner.playback_rate;
            inner.current_time = if inner.duration.is_finite() {
                next.min(inner.duration)
            } else {
                next
            };
        }
    }

    /// Cause the next `play()` to fail with the given reason.
    pub fn fail_next_play(&self, reason: &str) {
        self.fail_next_play_after(reason, Duration::ZERO);
    }

    /// Cause the next `play()` to fail, but only after `delay`.
    pub fn fail_next_play_after(&self, reason: &str, delay: Duration) {
        lock(&self.inner)
            .play_failures
            .push_back((reason.to_string(), delay));
    }

    /// Number of `play()` calls so far.
    pub fn play_attempts(&self) -> usize {
        lock(&self.inner).play_attempts
    }

    /// Every position passed to `set_current_time`, in order.
    pub fn seeks(&self) -> Vec<f64> {
        lock(&self.inner).seeks.clone()
    }

    /// Registered controls.
    pub fn controls(&self) -> Vec<Control> {
        lock(&self.inner).controls.clone()
    }

    /// Registered settings entries.
    pub fn settings(&self) -> Vec<Setting> {
        lock(&self.inner).settings.clone()
    }
}

impl Clone for MockPlayer {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            events: self.events.clone(),
        }
    }
}

#[async_trait]
impl Player for MockPlayer {
    fn current_time(&self) -> f64 {
        lock(&self.inner).current_time
    }

    fn set_current_time(&self, seconds: f64) {
        {
            let mut inner = lock(&self.inner);
            inner.current_time = seconds;
            inner.seeks.push(seconds);
        }
        // Media elements fire a seek even when the target equals the position.
        self.emit(PlayerEvent::Seek);
    }

    fn playback_rate(&self) -> f64 {
        lock(&self.inner).playback_rate
    }

    fn set_playback_rate(&self, rate: f64) {
        let changed = {
            let mut inner = lock(&self.inner);
            let changed = inner.playback_rate != rate;
            inner.playback_rate = rate;
            changed
        };
        if changed {
            self.emit(PlayerEvent::RateChange);
        }
    }

    fn duration(&self) -> f64 {
        lock(&self.inner).duration
    }

    fn is_playing(&self) -> bool {
        lock(&self.inner).playing
    }

    fn is_live(&self) -> bool {
        lock(&self.inner).live
    }

    fn is_ready(&self) -> bool {
        lock(&self.inner).ready
    }

    fn is_muted(&self) -> bool {
        lock(&self.inner).muted
    }

    fn set_muted(&self, muted: bool) {
        lock(&self.inner).muted = muted;
    }

    async fn play(&self) -> Result<(), PlayerError> {
        let failure = {
            let mut inner = lock(&self.inner);
            inner.play_attempts += 1;

            if inner.destroyed {
                return Err(PlayerError::Destroyed);
            }
            inner.play_failures.pop_front()
        };

        // Check for forced failure
        if let Some((reason, delay)) = failure {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            return Err(PlayerError::PlaybackRejected(reason));
        }

        let started = {
            let mut inner = lock(&self.inner);
            let started = !inner.playing;
            inner.playing = true;
            started
        };
        if started {
            self.emit(PlayerEvent::Play);
        }
        Ok(())
    }

    fn pause(&self) {
        let stopped = {
            let mut inner = lock(&self.inner);
            std::mem::replace(&mut inner.playing, false)
        };
        if stopped {
            self.emit(PlayerEvent::Pause);
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    fn add_control(&self, control: Control) {
        lock(&self.inner).controls.push(control);
    }

    fn remove_control(&self, name: &str) {
        lock(&self.inner).controls.retain(|c| c.name != name);
    }

    fn has_control(&self, name: &str) -> bool {
        lock(&self.inner).controls.iter().any(|c| c.name == name)
    }

    fn add_setting(&self, setting: Setting) {
        lock(&self.inner).settings.push(setting);
    }
}
