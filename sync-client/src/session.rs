//! SyncSession - binds one player to the room's authoritative status.
//!
//! # Architecture
//!
//! The session drives the pure [`Lifecycle`] state machine from sync-core
//! and interprets its actions:
//!
//! ```text
//! player events ──► echo guard ──► Publisher (debounced) ──► StatusSink
//! room status (watch) ──► Applier ──► echo-guarded player mutation
//! interval ──► should_check ──► Publisher::publish_check
//! ```
//!
//! Every spawned task is tracked in one resource set and released exactly
//! once on teardown, whether the player fired `Destroy`, [`SyncSession::destroy`]
//! was called, or the session was dropped.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use playsync_core::{should_check, EchoGuard, EchoKind, Lifecycle, LifecycleAction, LifecycleEvent};
use playsync_types::MovieStatus;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::applier::Applier;
use crate::autoplay::{attempt_play, AutoplayOutcome};
use crate::config::SyncConfig;
use crate::player::{Control, ControlPosition, Player, PlayerEvent, Setting};
use crate::publisher::{Publisher, SeekClock};
use crate::sink::{ExpireIdSource, Notifier, StatusSink};
use crate::{lock, now};

/// Name of the control-bar button that requests a manual sync.
pub const SYNC_CONTROL: &str = "syncControl";

/// Name of the settings entry that requests a manual sync.
pub const SYNC_SETTING: &str = "syncSetting";

/// Handles owned by one session, released together.
#[derive(Debug, Default)]
struct Resources {
    tasks: Vec<(&'static str, JoinHandle<()>)>,
    released: bool,
}

impl Resources {
    fn track(&mut self, name: &'static str, handle: JoinHandle<()>) {
        if self.released {
            // Spawned after teardown raced ahead of us.
            handle.abort();
            return;
        }
        self.tasks.push((name, handle));
    }

    fn release(&mut self) -> usize {
        self.released = true;
        let count = self.tasks.len();
        for (name, handle) in self.tasks.drain(..) {
            tracing::debug!(task = name, "aborting");
            handle.abort();
        }
        count
    }

    fn running(&self) -> usize {
        self.tasks.iter().filter(|(_, h)| !h.is_finished()).count()
    }
}

struct Shared {
    player: Arc<dyn Player>,
    notifier: Arc<dyn Notifier>,
    config: SyncConfig,
    publisher: Publisher,
    applier: Applier,
    echo: Arc<Mutex<EchoGuard>>,
    seek_clock: Arc<SeekClock>,
    status: Mutex<Option<watch::Receiver<MovieStatus>>>,
    lifecycle: watch::Sender<Lifecycle>,
    resources: Mutex<Resources>,
}

impl Shared {
    fn transition(&self, event: LifecycleEvent) -> Vec<LifecycleAction> {
        let mut actions = Vec::new();
        self.lifecycle.send_modify(|state| {
            let (next, planned) = state.on_event(event);
            *state = next;
            actions = planned;
        });
        actions
    }

    async fn execute(self: &Arc<Self>, actions: Vec<LifecycleAction>) {
        for action in actions {
            match action {
                LifecycleAction::AlignInitial => self.align_initial().await,
                LifecycleAction::Autoplay => {
                    attempt_play(self.player.as_ref(), self.notifier.as_ref()).await;
                }
                LifecycleAction::RegisterControls => self.register_controls(),
                LifecycleAction::AttachListeners => self.attach_listeners(),
                LifecycleAction::Teardown => self.teardown(),
            }
        }
    }

    async fn on_ready(self: &Arc<Self>) {
        let live = self.player.is_live();
        let actions = self.transition(LifecycleEvent::PlayerReady { live });
        if actions.is_empty() {
            return;
        }
        tracing::info!(live, "player ready, syncing");
        self.execute(actions).await;

        let actions = self.transition(LifecycleEvent::Activated);
        self.execute(actions).await;
    }

    fn shutdown(&self) {
        let actions = self.transition(LifecycleEvent::Destroyed);
        if actions.contains(&LifecycleAction::Teardown) {
            self.teardown();
        }
    }

    /// Apply the room's status before any listener exists, so nothing is published.
    async fn align_initial(&self) {
        let target = match lock(&self.status).as_mut() {
            Some(rx) => *rx.borrow_and_update(),
            None => return,
        };
        tracing::info!(?target, "initial alignment");

        self.player.set_current_time(target.seek);
        self.player.set_playback_rate(target.rate);
        if target.playing {
            attempt_play(self.player.as_ref(), self.notifier.as_ref()).await;
        }
    }

    fn register_controls(&self) {
        if self.player.has_control(SYNC_CONTROL) {
            self.player.remove_control(SYNC_CONTROL);
        }
        self.player.add_control(Control {
            name: SYNC_CONTROL.to_string(),
            label: "Sync".to_string(),
            position: ControlPosition::Right,
        });
        self.player.add_setting(Setting {
            name: SYNC_SETTING.to_string(),
            label: "Sync status".to_string(),
            option: "Click to sync".to_string(),
        });
    }

    fn attach_listeners(self: &Arc<Self>) {
        let events = self.player.subscribe();
        let shared = Arc::clone(self);
        let event_task = tokio::spawn(async move { shared.run_player_events(events).await });

        let status_task = lock(&self.status).take().map(|rx| {
            let shared = Arc::clone(self);
            tokio::spawn(async move { shared.run_status_subscription(rx).await })
        });

        let shared = Arc::clone(self);
        let check_task = tokio::spawn(async move { shared.run_consistency_check().await });

        let mut resources = lock(&self.resources);
        resources.track("player-events", event_task);
        if let Some(task) = status_task {
            resources.track("status-subscription", task);
        }
        resources.track("consistency-check", check_task);
    }

    fn teardown(&self) {
        let released = lock(&self.resources).release();
        let dropped = self.publisher.cancel_pending();
        lock(&self.echo).clear();
        lock(&self.status).take();
        tracing::info!(released, dropped, "sync session torn down");
    }

    async fn run_lifecycle(self: Arc<Self>, mut events: broadcast::Receiver<PlayerEvent>) {
        if self.player.is_ready() {
            self.on_ready().await;
        }

        loop {
            match events.recv().await {
                Ok(PlayerEvent::Ready) => self.on_ready().await,
                Ok(PlayerEvent::Destroy) | Err(RecvError::Closed) => {
                    self.shutdown();
                    break;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "lifecycle listener lagged");
                }
            }
        }
    }

    async fn run_player_events(&self, mut events: broadcast::Receiver<PlayerEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => self.on_player_event(event),
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "player event listener lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    fn on_player_event(&self, event: PlayerEvent) {
        let echo_kind = match event {
            PlayerEvent::Play => Some(EchoKind::Play),
            PlayerEvent::Pause => Some(EchoKind::Pause),
            PlayerEvent::Seek => Some(EchoKind::Seek),
            PlayerEvent::RateChange => Some(EchoKind::Rate),
            _ => None,
        };
        if let Some(kind) = echo_kind {
            let observed = match kind {
                EchoKind::Seek => Some(self.player.current_time()),
                EchoKind::Rate => Some(self.player.playback_rate()),
                EchoKind::Play | EchoKind::Pause => None,
            };
            if lock(&self.echo).consume(kind, observed, now()) {
                tracing::debug!(?kind, "suppressed echo of local correction");
                return;
            }
        }

        match event {
            PlayerEvent::Play => self.publisher.publish_play(),
            PlayerEvent::Pause => self.publisher.publish_pause(),
            PlayerEvent::Seek => self.publisher.publish_seek_debounced(),
            PlayerEvent::RateChange => {
                self.publisher.publish_rate();
            }
            PlayerEvent::ControlClicked(name) if name == SYNC_CONTROL => {
                self.publisher.publish_sync_request();
            }
            PlayerEvent::SettingSelected(name) if name == SYNC_SETTING => {
                self.publisher.publish_sync_request();
            }
            _ => {}
        }
    }

    async fn run_status_subscription(&self, mut rx: watch::Receiver<MovieStatus>) {
        while rx.changed().await.is_ok() {
            let target = *rx.borrow_and_update();
            self.applier.apply(&target).await;
        }
        tracing::debug!("status source closed");
    }

    async fn run_consistency_check(&self) {
        let period = self.config.check_interval();
        let policy = self.config.check_policy();
        let mut timer = interval_at(Instant::now() + period, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            timer.tick().await;
            let remaining = self.player.duration() - self.player.current_time();
            if should_check(
                self.seek_clock.elapsed(),
                remaining,
                self.player.is_live(),
                &policy,
            ) {
                self.publisher.publish_check();
            }
        }
    }
}

/// A sync session for one player.
///
/// Created with [`SyncSession::attach`]; does nothing until the player is
/// ready. Dropping the session tears it down.
pub struct SyncSession {
    shared: Arc<Shared>,
    lifecycle_task: Mutex<Option<JoinHandle<()>>>,
}

impl SyncSession {
    /// Attach a session to `player`.
    ///
    /// Must be called from within a tokio runtime. If the player is already
    /// ready, alignment starts immediately.
    pub fn attach(
        player: Arc<dyn Player>,
        status: watch::Receiver<MovieStatus>,
        sink: Arc<dyn StatusSink>,
        notifier: Arc<dyn Notifier>,
        expire_ids: Arc<dyn ExpireIdSource>,
        config: SyncConfig,
    ) -> Self {
        let seek_clock = Arc::new(SeekClock::new());
        let echo = Arc::new(Mutex::new(
            EchoGuard::new(config.echo_window()).with_seek_tolerance(config.drift_tolerance_secs),
        ));
        let publisher = Publisher::new(
            Arc::clone(&player),
            sink,
            expire_ids,
            Arc::clone(&seek_clock),
            config.debounce_window(),
        );
        let applier = Applier::new(
            Arc::clone(&player),
            Arc::clone(&notifier),
            Arc::clone(&echo),
            Arc::clone(&seek_clock),
            config.drift_tolerance_secs,
        );
        let (lifecycle, _) = watch::channel(Lifecycle::new());

        let shared = Arc::new(Shared {
            player,
            notifier,
            config,
            publisher,
            applier,
            echo,
            seek_clock,
            status: Mutex::new(Some(status)),
            lifecycle,
            resources: Mutex::new(Resources::default()),
        });

        // Subscribe before checking readiness so a Ready in between is not lost.
        let events = shared.player.subscribe();
        let task = tokio::spawn(Arc::clone(&shared).run_lifecycle(events));

        Self {
            shared,
            lifecycle_task: Mutex::new(Some(task)),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> Lifecycle {
        *self.shared.lifecycle.borrow()
    }

    /// Wait until the session is active (or torn down).
    pub async fn wait_until_active(&self) -> Lifecycle {
        let mut rx = self.shared.lifecycle.subscribe();
        rx.wait_for(|state| state.is_torn_down() || matches!(state, Lifecycle::Active { .. }))
            .await
            .map(|state| *state)
            .unwrap_or(Lifecycle::TornDown)
    }

    /// Number of background tasks still running.
    pub fn running_tasks(&self) -> usize {
        lock(&self.shared.resources).running()
    }

    /// Time since the last local or applied seek.
    pub fn since_last_seek(&self) -> Duration {
        self.shared.seek_clock.elapsed()
    }

    /// Ask the room to resend its status, as the sync control does.
    pub fn request_sync(&self) -> bool {
        self.shared.publisher.publish_sync_request()
    }

    /// Seek without publishing (ignored within drift tolerance).
    pub fn set_seek_silently(&self, seek: f64) -> bool {
        self.shared.applier.set_seek_silently(seek)
    }

    /// Change rate without publishing.
    pub fn set_rate_silently(&self, rate: f64) -> bool {
        self.shared.applier.set_rate_silently(rate)
    }

    /// Start playback without publishing.
    pub async fn play_silently(&self) -> Option<AutoplayOutcome> {
        self.shared.applier.play_silently().await
    }

    /// Pause without publishing.
    pub fn pause_silently(&self) -> bool {
        self.shared.applier.pause_silently()
    }

    /// Tear the session down. Safe to call any number of times.
    pub fn destroy(&self) {
        self.shared.shutdown();
        if let Some(task) = lock(&self.lifecycle_task).take() {
            task.abort();
        }
    }
}

impl Drop for SyncSession {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for SyncSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSession")
            .field("state", &self.state())
            .field("running_tasks", &self.running_tasks())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::MockPlayer;
    use crate::sink::{RecordingNotifier, RecordingSink, Severity};
    use playsync_types::MessageType;

    /// Sleep on the paused clock, then let woken tasks run.
    async fn settle(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    struct Harness {
        player: MockPlayer,
        sink: Arc<RecordingSink>,
        notifier: Arc<RecordingNotifier>,
        status: watch::Sender<MovieStatus>,
        session: SyncSession,
    }

    fn harness(player: MockPlayer, initial: MovieStatus) -> Harness {
        let sink = Arc::new(RecordingSink::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let (status, status_rx) = watch::channel(initial);
        let session = SyncSession::attach(
            Arc::new(player.clone()),
            status_rx,
            Arc::clone(&sink) as Arc<dyn StatusSink>,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
            Arc::new(|| 7u64),
            SyncConfig::default(),
        );
        Harness {
            player,
            sink,
            notifier,
            status,
            session,
        }
    }

    async fn ready(h: &Harness) {
        h.player.fire_ready();
        h.session.wait_until_active().await;
        settle(0).await;
    }

    // ===========================================
    // Lifecycle
    // ===========================================

    #[tokio::test(start_paused = true)]
    async fn idle_until_player_ready() {
        let h = harness(MockPlayer::new(600.0), MovieStatus::new(90.0, 1.0, false));
        settle(20_000).await;

        assert_eq!(h.session.state(), Lifecycle::Uninitialized);
        assert!(h.player.seeks().is_empty());
        assert!(h.sink.messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn initial_alignment_publishes_nothing() {
        let h = harness(MockPlayer::new(600.0), MovieStatus::new(120.0, 1.5, true));
        ready(&h).await;
        settle(2_000).await;

        assert_eq!(h.session.state(), Lifecycle::Active { live: false });
        assert_eq!(h.player.current_time(), 120.0);
        assert_eq!(h.player.playback_rate(), 1.5);
        assert!(h.player.is_playing());
        assert!(h.sink.messages().is_empty());
        assert_eq!(h.session.running_tasks(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn player_ready_before_attach_still_aligns() {
        let player = MockPlayer::new(600.0);
        player.fire_ready();
        let h = harness(player, MovieStatus::new(45.0, 1.0, false));

        assert_eq!(
            h.session.wait_until_active().await,
            Lifecycle::Active { live: false }
        );
        assert_eq!(h.player.current_time(), 45.0);
    }

    #[tokio::test(start_paused = true)]
    async fn sync_control_replaces_existing_one() {
        let player = MockPlayer::new(600.0);
        player.add_control(Control {
            name: SYNC_CONTROL.into(),
            label: "stale".into(),
            position: ControlPosition::Left,
        });
        let h = harness(player, MovieStatus::default());
        ready(&h).await;

        let controls = h.player.controls();
        assert_eq!(controls.len(), 1);
        assert_eq!(controls[0].label, "Sync");
        assert_eq!(controls[0].position, ControlPosition::Right);
        assert_eq!(h.player.settings().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn destroy_is_idempotent() {
        let h = harness(MockPlayer::new(600.0), MovieStatus::default());
        ready(&h).await;
        assert_eq!(h.session.running_tasks(), 3);

        h.session.destroy();
        h.session.destroy();
        settle(0).await;

        assert_eq!(h.session.state(), Lifecycle::TornDown);
        assert_eq!(h.session.running_tasks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn destroy_before_ready_is_safe() {
        let h = harness(MockPlayer::new(600.0), MovieStatus::new(30.0, 1.0, false));
        h.session.destroy();
        h.player.fire_ready();
        settle(1_000).await;

        assert_eq!(h.session.wait_until_active().await, Lifecycle::TornDown);
        assert!(h.player.seeks().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn player_destroy_event_tears_down() {
        let h = harness(MockPlayer::new(600.0), MovieStatus::default());
        ready(&h).await;

        h.player.destroy();
        settle(0).await;
        assert_eq!(h.session.state(), Lifecycle::TornDown);

        // Nothing is listening any more.
        h.player.set_playback_rate(2.0);
        let _ = h.status.send(MovieStatus::new(300.0, 1.0, false));
        settle(30_000).await;
        assert!(h.sink.messages().is_empty());
        assert_eq!(h.player.current_time(), 0.0);
    }

    // ===========================================
    // Echo suppression
    // ===========================================

    #[tokio::test(start_paused = true)]
    async fn remote_corrections_never_echo() {
        let h = harness(MockPlayer::new(600.0), MovieStatus::default());
        ready(&h).await;

        h.status.send(MovieStatus::new(300.0, 2.0, true)).unwrap();
        settle(2_000).await;
        h.status.send(MovieStatus::new(300.0, 2.0, false)).unwrap();
        settle(2_000).await;

        assert_eq!(h.player.current_time(), 300.0);
        assert_eq!(h.player.playback_rate(), 2.0);
        assert!(!h.player.is_playing());
        assert!(h.sink.messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn user_repeat_after_guarded_change_publishes() {
        let h = harness(MockPlayer::new(600.0), MovieStatus::default());
        ready(&h).await;

        h.status.send(MovieStatus::new(0.0, 2.0, false)).unwrap();
        settle(100).await;
        h.player.set_playback_rate(1.0);
        settle(100).await;

        let rates = h.sink.of_kind(MessageType::ChangeRate);
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].change_movie_status_req.unwrap().rate, 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn user_seek_after_guarded_seek_publishes() {
        let h = harness(MockPlayer::new(600.0), MovieStatus::default());
        ready(&h).await;

        h.status.send(MovieStatus::new(300.0, 1.0, false)).unwrap();
        settle(100).await;
        h.player.set_current_time(50.0);
        settle(1_000).await;

        let seeks = h.sink.of_kind(MessageType::ChangeSeek);
        assert_eq!(seeks.len(), 1);
        assert_eq!(seeks[0].change_movie_status_req.unwrap().seek, 50.0);
    }

    #[tokio::test(start_paused = true)]
    async fn user_pause_after_guarded_play_publishes() {
        let h = harness(MockPlayer::new(600.0), MovieStatus::default());
        ready(&h).await;

        h.status.send(MovieStatus::new(0.0, 1.0, true)).unwrap();
        settle(100).await;
        assert!(h.player.is_playing());
        h.player.pause();
        settle(1_000).await;

        assert_eq!(h.sink.kinds(), vec![MessageType::Pause]);
    }

    #[tokio::test(start_paused = true)]
    async fn user_play_after_guarded_pause_publishes() {
        let h = harness(MockPlayer::new(600.0), MovieStatus::default());
        ready(&h).await;

        h.status.send(MovieStatus::new(0.0, 1.0, true)).unwrap();
        settle(100).await;
        h.status.send(MovieStatus::new(0.0, 1.0, false)).unwrap();
        settle(100).await;
        assert!(!h.player.is_playing());
        h.player.play().await.unwrap();
        settle(1_000).await;

        assert_eq!(h.sink.kinds(), vec![MessageType::Play]);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_autoplay_rejection_never_echoes() {
        let h = harness(MockPlayer::new(600.0), MovieStatus::default());
        ready(&h).await;

        h.player
            .fail_next_play_after("NotAllowedError", Duration::from_millis(1_500));
        h.status.send(MovieStatus::new(0.0, 1.0, true)).unwrap();
        settle(3_000).await;

        assert!(h.player.is_playing());
        assert!(h.player.is_muted());
        assert!(h.sink.of_kind(MessageType::Play).is_empty());
        let notices = h.notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].severity, Severity::Info);
    }

    #[tokio::test(start_paused = true)]
    async fn late_echoes_of_corrections_are_suppressed() {
        let h = harness(MockPlayer::new(600.0), MovieStatus::default());
        ready(&h).await;

        h.player.set_event_delay(Duration::from_millis(1_500));
        h.status.send(MovieStatus::new(300.0, 2.0, true)).unwrap();
        settle(3_000).await;

        assert_eq!(h.player.current_time(), 300.0);
        assert!(h.player.is_playing());
        assert!(h.sink.messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn swallowed_corrections_do_not_mute_user_actions() {
        let h = harness(MockPlayer::new(600.0), MovieStatus::default());
        ready(&h).await;

        h.player.set_events_enabled(false);
        h.status.send(MovieStatus::new(300.0, 2.0, true)).unwrap();
        settle(100).await;
        h.player.set_events_enabled(true);
        settle(2_000).await;

        h.player.set_playback_rate(1.0);
        h.player.set_current_time(50.0);
        h.player.pause();
        settle(1_000).await;

        let rates = h.sink.of_kind(MessageType::ChangeRate);
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].change_movie_status_req.unwrap().rate, 1.0);
        let seeks = h.sink.of_kind(MessageType::ChangeSeek);
        assert_eq!(seeks.len(), 1);
        assert_eq!(seeks[0].change_movie_status_req.unwrap().seek, 50.0);
        assert_eq!(h.sink.of_kind(MessageType::Pause).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn silent_setters_do_not_publish() {
        let h = harness(MockPlayer::new(600.0), MovieStatus::default());
        ready(&h).await;

        assert!(h.session.set_rate_silently(1.25));
        assert!(h.session.set_seek_silently(200.0));
        assert!(h.session.play_silently().await.is_some());
        assert!(h.session.pause_silently());
        settle(2_000).await;

        assert!(h.sink.messages().is_empty());
    }

    // ===========================================
    // Outbound publishing
    // ===========================================

    #[tokio::test(start_paused = true)]
    async fn user_actions_publish() {
        let h = harness(MockPlayer::new(600.0), MovieStatus::default());
        ready(&h).await;

        h.player.set_playback_rate(1.5);
        settle(0).await;
        assert_eq!(h.sink.kinds(), vec![MessageType::ChangeRate]);

        h.player.play().await.unwrap();
        h.player.set_current_time(60.0);
        settle(600).await;

        assert_eq!(h.sink.of_kind(MessageType::Play).len(), 1);
        let seek = h.sink.of_kind(MessageType::ChangeSeek);
        assert_eq!(seek.len(), 1);
        assert_eq!(seek[0].change_movie_status_req.unwrap().seek, 60.0);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_play_pause_collapses() {
        let h = harness(MockPlayer::new(600.0), MovieStatus::default());
        ready(&h).await;

        h.player.play().await.unwrap();
        settle(50).await;
        h.player.pause();
        settle(50).await;
        h.player.play().await.unwrap();
        settle(50).await;
        h.player.pause();
        settle(600).await;

        assert_eq!(h.sink.kinds(), vec![MessageType::Pause]);
    }

    #[tokio::test(start_paused = true)]
    async fn sync_control_and_setting_request_status() {
        let h = harness(MockPlayer::new(600.0), MovieStatus::default());
        ready(&h).await;

        assert!(h.player.click_control(SYNC_CONTROL));
        assert!(h.player.select_setting(SYNC_SETTING));
        settle(0).await;

        assert_eq!(
            h.sink.kinds(),
            vec![MessageType::SyncMovieStatus, MessageType::SyncMovieStatus]
        );
    }

    // ===========================================
    // Periodic consistency check
    // ===========================================

    #[tokio::test(start_paused = true)]
    async fn check_waits_for_quiet_period_after_seek() {
        let h = harness(MockPlayer::new(600.0), MovieStatus::default());
        ready(&h).await;

        settle(5_000).await;
        h.player.set_current_time(50.0);
        settle(5_500).await;
        // Tick at t=10s: the seek at t=5s is too recent.
        assert!(h.sink.of_kind(MessageType::Check).is_empty());
        assert_eq!(h.sink.of_kind(MessageType::ChangeSeek).len(), 1);

        settle(10_000).await;
        // Tick at t=20s: quiet for 15s.
        let checks = h.sink.of_kind(MessageType::Check);
        assert_eq!(checks.len(), 1);
        let check = checks[0].check_req.unwrap();
        assert_eq!(check.expire_id, 7);
        assert_eq!(check.status.seek, 50.0);
    }

    #[tokio::test(start_paused = true)]
    async fn check_skipped_near_end_of_media() {
        let h = harness(MockPlayer::new(600.0), MovieStatus::new(597.0, 1.0, false));
        ready(&h).await;

        settle(35_000).await;
        assert!(h.sink.of_kind(MessageType::Check).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn applied_status_resets_check_clock() {
        let h = harness(MockPlayer::new(600.0), MovieStatus::default());
        ready(&h).await;

        settle(9_000).await;
        // Within tolerance: nothing moves, but the clock still resets.
        h.status.send(MovieStatus::new(1.0, 1.0, false)).unwrap();
        settle(1_500).await;
        assert!(h.session.since_last_seek() < Duration::from_secs(2));
        assert!(h.sink.of_kind(MessageType::Check).is_empty());
        assert!(h.player.seeks().iter().all(|s| *s == 0.0));
    }

    // ===========================================
    // Live streams and autoplay
    // ===========================================

    #[tokio::test(start_paused = true)]
    async fn live_stream_only_autoplays() {
        let h = harness(MockPlayer::live(), MovieStatus::new(300.0, 2.0, false));
        ready(&h).await;
        assert_eq!(h.session.state(), Lifecycle::Active { live: true });
        assert_eq!(h.player.play_attempts(), 1);
        assert!(h.player.is_playing());

        h.status.send(MovieStatus::new(500.0, 1.5, false)).unwrap();
        settle(30_000).await;

        assert!(h.player.seeks().is_empty());
        assert_eq!(h.player.playback_rate(), 1.0);
        assert!(h.player.is_playing());
        assert!(h.player.controls().is_empty());
        assert!(h.sink.messages().is_empty());
        assert_eq!(h.session.running_tasks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn blocked_initial_autoplay_notifies_user() {
        let player = MockPlayer::new(600.0);
        player.fail_next_play("NotAllowedError");
        player.fail_next_play("NotAllowedError");
        let h = harness(player, MovieStatus::new(10.0, 1.0, true));
        ready(&h).await;

        assert!(!h.player.is_playing());
        let notices = h.notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].severity, Severity::Error);
        // Still reconciling; the user can press sync.
        assert_eq!(h.session.running_tasks(), 3);
    }
}
