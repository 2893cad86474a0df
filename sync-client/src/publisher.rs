//! Outbound status publishing.
//!
//! Turns local player activity into [`StatusMessage`]s. Play and pause share
//! one debounce window ("playing status"); seeks have their own; rate changes
//! and manual sync requests go out immediately.
//!
//! Debounced messages read the player when the window closes, not when the
//! event fired, so a scrub publishes where it landed.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use playsync_types::{now_millis, StatusMessage, StatusSnapshot};
use tokio::time::Instant;

use crate::debounce::DebouncePool;
use crate::lock;
use crate::player::Player;
use crate::sink::{ExpireIdSource, StatusSink};

/// When the player last seeked because of us or the user.
///
/// Read by the periodic check: a recent seek means the room already has a
/// fresh position from this peer.
#[derive(Debug)]
pub struct SeekClock {
    last: Mutex<Instant>,
}

impl SeekClock {
    /// Start the clock at the current instant.
    pub fn new() -> Self {
        Self {
            last: Mutex::new(Instant::now()),
        }
    }

    /// Record a seek now.
    pub fn touch(&self) {
        *lock(&self.last) = Instant::now();
    }

    /// Time since the last recorded seek.
    pub fn elapsed(&self) -> Duration {
        lock(&self.last).elapsed()
    }
}

impl Default for SeekClock {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum DebounceKey {
    PlayingStatus,
    Seek,
}

/// Builds and emits outbound status messages for one player.
pub struct Publisher {
    player: Arc<dyn Player>,
    sink: Arc<dyn StatusSink>,
    expire_ids: Arc<dyn ExpireIdSource>,
    seek_clock: Arc<SeekClock>,
    debounces: DebouncePool<DebounceKey>,
}

impl Publisher {
    /// Create a publisher.
    pub fn new(
        player: Arc<dyn Player>,
        sink: Arc<dyn StatusSink>,
        expire_ids: Arc<dyn ExpireIdSource>,
        seek_clock: Arc<SeekClock>,
        debounce_window: Duration,
    ) -> Self {
        Self {
            player,
            sink,
            expire_ids,
            seek_clock,
            debounces: DebouncePool::new(debounce_window),
        }
    }

    /// Publish PLAY once the playing-status window settles.
    pub fn publish_play(&self) {
        let player = Arc::clone(&self.player);
        let sink = Arc::clone(&self.sink);
        self.debounces.get(DebounceKey::PlayingStatus).call(move || {
            tracing::info!(seek = player.current_time(), "local play");
            send(
                sink.as_ref(),
                StatusMessage::play(now_millis(), player.current_time(), player.playback_rate()),
            );
        });
    }

    /// Publish PAUSE once the playing-status window settles.
    pub fn publish_pause(&self) {
        let player = Arc::clone(&self.player);
        let sink = Arc::clone(&self.sink);
        self.debounces.get(DebounceKey::PlayingStatus).call(move || {
            tracing::info!(seek = player.current_time(), "local pause");
            send(
                sink.as_ref(),
                StatusMessage::pause(now_millis(), player.current_time(), player.playback_rate()),
            );
        });
    }

    /// Record a local seek now and publish CHANGE_SEEK once scrubbing settles.
    pub fn publish_seek_debounced(&self) {
        self.seek_clock.touch();
        let player = Arc::clone(&self.player);
        let sink = Arc::clone(&self.sink);
        self.debounces.get(DebounceKey::Seek).call(move || {
            tracing::info!(seek = player.current_time(), "local seek");
            send(
                sink.as_ref(),
                StatusMessage::change_seek(
                    now_millis(),
                    player.current_time(),
                    player.playback_rate(),
                ),
            );
        });
    }

    /// Publish CHANGE_RATE immediately.
    pub fn publish_rate(&self) -> bool {
        tracing::info!(
            rate = self.player.playback_rate(),
            seek = self.player.current_time(),
            "local rate change"
        );
        send(
            self.sink.as_ref(),
            StatusMessage::change_rate(
                now_millis(),
                self.player.is_playing(),
                self.player.current_time(),
                self.player.playback_rate(),
            ),
        )
    }

    /// Ask the room to resend its status.
    pub fn publish_sync_request(&self) -> bool {
        tracing::info!("manual sync requested");
        send(self.sink.as_ref(), StatusMessage::sync_movie_status())
    }

    /// Publish CHECK with the current local status and expire epoch.
    pub fn publish_check(&self) -> bool {
        let status = StatusSnapshot::with_playing(
            self.player.is_playing(),
            self.player.current_time(),
            self.player.playback_rate(),
        );
        let expire_id = self.expire_ids.current();
        tracing::debug!(seek = status.seek, expire_id, "consistency check");
        send(
            self.sink.as_ref(),
            StatusMessage::check(now_millis(), status, expire_id),
        )
    }

    /// Drop every pending debounced publish. Returns how many were dropped.
    pub fn cancel_pending(&self) -> usize {
        self.debounces.cancel_all()
    }
}

fn send(sink: &dyn StatusSink, message: StatusMessage) -> bool {
    let queued = sink.publish(message);
    if !queued {
        tracing::warn!(kind = %message.kind, "status message not queued");
    }
    queued
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::MockPlayer;
    use crate::sink::RecordingSink;
    use playsync_types::MessageType;

    async fn settle(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    fn publisher(player: &MockPlayer, sink: &Arc<RecordingSink>) -> (Publisher, Arc<SeekClock>) {
        let clock = Arc::new(SeekClock::new());
        let publisher = Publisher::new(
            Arc::new(player.clone()),
            Arc::clone(sink) as Arc<dyn StatusSink>,
            Arc::new(|| 9u64),
            Arc::clone(&clock),
            Duration::from_millis(500),
        );
        (publisher, clock)
    }

    #[tokio::test(start_paused = true)]
    async fn play_pause_play_collapses_to_one_play() {
        let player = MockPlayer::new(600.0);
        let sink = Arc::new(RecordingSink::new());
        let (publisher, _) = publisher(&player, &sink);

        publisher.publish_play();
        settle(100).await;
        publisher.publish_pause();
        settle(100).await;
        publisher.publish_play();
        settle(600).await;

        assert_eq!(sink.kinds(), vec![MessageType::Play]);
        let snapshot = sink.messages()[0].change_movie_status_req.unwrap();
        assert_eq!(snapshot.playing, Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn seek_and_play_windows_are_independent() {
        let player = MockPlayer::new(600.0);
        let sink = Arc::new(RecordingSink::new());
        let (publisher, _) = publisher(&player, &sink);

        publisher.publish_pause();
        publisher.publish_seek_debounced();
        settle(600).await;

        let kinds = sink.kinds();
        assert_eq!(kinds.len(), 2);
        assert!(kinds.contains(&MessageType::Pause));
        assert!(kinds.contains(&MessageType::ChangeSeek));
    }

    #[tokio::test(start_paused = true)]
    async fn seek_reads_position_when_window_closes() {
        let player = MockPlayer::new(600.0);
        let sink = Arc::new(RecordingSink::new());
        let (publisher, _) = publisher(&player, &sink);

        player.set_current_time(10.0);
        publisher.publish_seek_debounced();
        settle(100).await;
        player.set_current_time(42.0);
        publisher.publish_seek_debounced();
        settle(600).await;

        let seeks = sink.of_kind(MessageType::ChangeSeek);
        assert_eq!(seeks.len(), 1);
        let snapshot = seeks[0].change_movie_status_req.unwrap();
        assert_eq!(snapshot.seek, 42.0);
        assert_eq!(snapshot.playing, None);
    }

    #[tokio::test(start_paused = true)]
    async fn seek_touches_clock_before_publishing() {
        let player = MockPlayer::new(600.0);
        let sink = Arc::new(RecordingSink::new());
        let (publisher, clock) = publisher(&player, &sink);

        settle(5_000).await;
        assert!(clock.elapsed() >= Duration::from_secs(5));

        publisher.publish_seek_debounced();
        assert!(clock.elapsed() < Duration::from_millis(1));
        assert!(sink.messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn rate_publishes_immediately() {
        let player = MockPlayer::new(600.0);
        let sink = Arc::new(RecordingSink::new());
        let (publisher, _) = publisher(&player, &sink);

        player.set_playback_rate(1.5);
        assert!(publisher.publish_rate());

        let msgs = sink.of_kind(MessageType::ChangeRate);
        assert_eq!(msgs.len(), 1);
        let snapshot = msgs[0].change_movie_status_req.unwrap();
        assert_eq!(snapshot.rate, 1.5);
        assert_eq!(snapshot.playing, Some(false));
        assert!(msgs[0].time > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn check_carries_expire_id() {
        let player = MockPlayer::new(600.0);
        let sink = Arc::new(RecordingSink::new());
        let (publisher, _) = publisher(&player, &sink);

        player.set_current_time(33.0);
        publisher.publish_check();

        let check = sink.messages()[0].check_req.unwrap();
        assert_eq!(check.expire_id, 9);
        assert_eq!(check.status.seek, 33.0);
        assert_eq!(check.status.playing, Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_pending_drops_debounced_messages() {
        let player = MockPlayer::new(600.0);
        let sink = Arc::new(RecordingSink::new());
        let (publisher, _) = publisher(&player, &sink);

        publisher.publish_play();
        publisher.publish_seek_debounced();
        assert_eq!(publisher.cancel_pending(), 2);

        settle(1_000).await;
        assert!(sink.messages().is_empty());
    }
}
