//! Run two simulated peers against an in-process room.
//!
//! Each peer is a [`MockPlayer`] with a [`SyncSession`]. Their outbound
//! messages go to a [`Room`], which re-broadcasts the authoritative status
//! over a watch channel. A scripted user drives the players.

use anyhow::Result;
use playsync_client::{
    ChannelSink, MockPlayer, Notice, Notifier, Player, SyncConfig, SyncSession, SYNC_CONTROL,
};
use playsync_types::{MovieStatus, StatusMessage};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::room::{Outcome, Room};

/// Media length of the simulated on-demand title.
const MEDIA_SECONDS: f64 = 3600.0;

/// How often simulated players advance their position.
const TICK: Duration = Duration::from_millis(100);

/// A scripted user action.
#[derive(Debug, Clone, Copy)]
enum Step {
    Play,
    Pause,
    SeekBy(f64),
    Rate(f64),
    PressSync,
}

/// When (as a fraction of the run), who, and what.
const SCRIPT: &[(f64, usize, Step)] = &[
    (0.10, 0, Step::Play),
    (0.30, 1, Step::SeekBy(60.0)),
    (0.50, 0, Step::Rate(1.5)),
    (0.70, 1, Step::Pause),
    (0.85, 0, Step::PressSync),
];

/// What happened during a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    /// Messages the room received.
    pub received: usize,
    /// Status broadcasts the room sent.
    pub broadcasts: usize,
    /// CHECKs dropped for a stale epoch.
    pub stale_checks: usize,
    /// Final authoritative status.
    pub room: MovieStatus,
    /// Final status of each peer, by name.
    pub peers: Vec<(String, MovieStatus)>,
}

struct Peer {
    name: &'static str,
    player: MockPlayer,
    session: SyncSession,
}

struct PrintNotifier(&'static str);

impl Notifier for PrintNotifier {
    fn notify(&self, notice: Notice) {
        println!("  [{}] notice: {}: {}", self.0, notice.title, notice.message);
    }
}

/// Run the simulation for `seconds` and print every message.
pub async fn run(config: &SyncConfig, seconds: u64, live: bool) -> Result<Report> {
    println!("=== playsync-cli simulate ===");
    println!(
        "  {} s, {} media, check every {} s",
        seconds,
        if live { "live" } else { "on-demand" },
        config.check_interval_secs
    );
    println!();

    let start = Instant::now();
    let initial = MovieStatus::default();
    let (status_tx, status_rx) = watch::channel(initial);
    let expire_id = Arc::new(AtomicU64::new(1));
    let (inbox_tx, inbox_rx) = mpsc::unbounded_channel::<(&'static str, StatusMessage)>();

    let mut peers = Vec::new();
    let mut forwarders = Vec::new();
    for name in ["alice", "bob"] {
        let player = if live {
            MockPlayer::live()
        } else {
            MockPlayer::new(MEDIA_SECONDS)
        };
        let (sink, mut outbox) = ChannelSink::channel();
        let inbox = inbox_tx.clone();
        forwarders.push(tokio::spawn(async move {
            while let Some(message) = outbox.recv().await {
                if inbox.send((name, message)).is_err() {
                    break;
                }
            }
        }));

        let epoch = Arc::clone(&expire_id);
        let session = SyncSession::attach(
            Arc::new(player.clone()),
            status_rx.clone(),
            Arc::new(sink),
            Arc::new(PrintNotifier(name)),
            Arc::new(move || epoch.load(Ordering::SeqCst)),
            config.clone(),
        );
        player.fire_ready();
        session.wait_until_active().await;
        peers.push(Peer {
            name,
            player,
            session,
        });
    }
    drop(inbox_tx);

    let room = Room::new(initial, config.drift_tolerance_secs, start.into_std());
    let room_task = tokio::spawn(run_room(
        room,
        inbox_rx,
        status_tx,
        Arc::clone(&expire_id),
        start,
    ));
    let ticker = spawn_ticker(peers.iter().map(|p| p.player.clone()).collect());

    let total = Duration::from_secs(seconds);
    for &(at, who, step) in SCRIPT {
        tokio::time::sleep_until(start + total.mul_f64(at)).await;
        if let Some(peer) = peers.get(who) {
            perform(peer, step, start).await;
        }
    }
    tokio::time::sleep_until(start + total).await;

    ticker.abort();
    for peer in &peers {
        peer.session.destroy();
    }
    let finals: Vec<(String, MovieStatus)> = peers
        .iter()
        .map(|p| (p.name.to_string(), status_of(&p.player)))
        .collect();
    drop(peers);
    for forwarder in forwarders {
        forwarder.abort();
    }

    let mut report = match room_task.await {
        Ok(report) => report,
        Err(e) => anyhow::bail!("room task failed: {}", e),
    };
    report.peers = finals;

    println!();
    println!("Summary:");
    println!(
        "  room:  {} received, {} broadcast, {} stale checks",
        report.received, report.broadcasts, report.stale_checks
    );
    println!("  room   {}", describe(&report.room));
    for (name, status) in &report.peers {
        println!("  {:<6} {}", name, describe(status));
    }

    Ok(report)
}

async fn run_room(
    mut room: Room,
    mut inbox: mpsc::UnboundedReceiver<(&'static str, StatusMessage)>,
    status_tx: watch::Sender<MovieStatus>,
    expire_id: Arc<AtomicU64>,
    start: Instant,
) -> Report {
    let mut report = Report::default();

    while let Some((from, message)) = inbox.recv().await {
        report.received += 1;
        let json = message
            .to_json()
            .unwrap_or_else(|e| format!("<unencodable: {}>", e));
        println!("{:>7.2}s  {:<6} -> {}", start.elapsed().as_secs_f64(), from, json);

        let now = Instant::now().into_std();
        match room.handle(&message, now) {
            Ok(Outcome::Stale) => report.stale_checks += 1,
            Ok(outcome) => {
                if let Some(status) = outcome.broadcast() {
                    report.broadcasts += 1;
                    expire_id.store(room.expire_id(), Ordering::SeqCst);
                    println!(
                        "{:>7.2}s  room   => {} (expire {})",
                        start.elapsed().as_secs_f64(),
                        describe(&status),
                        room.expire_id()
                    );
                    status_tx.send_replace(status);
                }
            }
            Err(e) => tracing::warn!(from, "room rejected message: {}", e),
        }
    }

    report.room = room.status_at(Instant::now().into_std());
    report
}

fn spawn_ticker(players: Vec<MockPlayer>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(TICK);
        loop {
            timer.tick().await;
            for player in &players {
                player.advance(TICK.as_secs_f64());
            }
        }
    })
}

async fn perform(peer: &Peer, step: Step, start: Instant) {
    println!(
        "{:>7.2}s  {:<6} user: {:?}",
        start.elapsed().as_secs_f64(),
        peer.name,
        step
    );
    let player = &peer.player;
    match step {
        Step::Play => {
            if let Err(e) = player.play().await {
                tracing::warn!(peer = peer.name, "play failed: {}", e);
            }
        }
        Step::Pause => player.pause(),
        Step::SeekBy(delta) => player.set_current_time(player.current_time() + delta),
        Step::Rate(rate) => player.set_playback_rate(rate),
        Step::PressSync => {
            player.click_control(SYNC_CONTROL);
        }
    }
}

fn status_of(player: &MockPlayer) -> MovieStatus {
    MovieStatus::new(
        player.current_time(),
        player.playback_rate(),
        player.is_playing(),
    )
}

fn describe(status: &MovieStatus) -> String {
    format!(
        "seek={:.2} rate={:.2} {}",
        status.seek,
        status.rate,
        if status.playing { "playing" } else { "paused" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> SyncConfig {
        SyncConfig {
            check_interval_secs: 1,
            seek_quiet_secs: 1,
            ..SyncConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn peers_converge_on_room_status() {
        let report = run(&fast_config(), 20, false).await.unwrap();

        assert!(report.received >= SCRIPT.len());
        assert!(report.broadcasts >= SCRIPT.len());
        assert!(!report.room.playing);
        assert_eq!(report.room.rate, 1.5);
        for (name, status) in &report.peers {
            assert!(!status.playing, "{} still playing", name);
            assert_eq!(status.rate, 1.5, "{} rate", name);
            assert!(
                (status.seek - report.room.seek).abs() <= 2.0,
                "{} at {} but room at {}",
                name,
                status.seek,
                report.room.seek
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn live_peers_publish_nothing() {
        let report = run(&fast_config(), 10, true).await.unwrap();

        assert_eq!(report.received, 0);
        assert_eq!(report.broadcasts, 0);
        assert_eq!(report.peers.len(), 2);
    }
}
