//! Resilient autoplay.
//!
//! Engines commonly refuse unmuted playback that was not started by a user
//! gesture. [`attempt_play`] retries once muted and tells the user what
//! happened. This is the only path in the client that reports failures to
//! the user; everything else just logs.

use crate::player::Player;
use crate::sink::{Notice, Notifier};

/// Result of [`attempt_play`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoplayOutcome {
    /// Played on the first attempt.
    Played,
    /// First attempt refused; playing muted.
    PlayedMuted,
    /// Both attempts refused. The user has to press sync manually.
    Failed(String),
}

impl AutoplayOutcome {
    /// Whether the player ended up playing.
    pub fn is_playing(&self) -> bool {
        !matches!(self, AutoplayOutcome::Failed(_))
    }
}

/// Start playback, retrying muted once if the engine refuses.
pub async fn attempt_play(player: &dyn Player, notifier: &dyn Notifier) -> AutoplayOutcome {
    let first = match player.play().await {
        Ok(()) => return AutoplayOutcome::Played,
        Err(e) => e,
    };

    tracing::debug!("play rejected ({}), retrying muted", first);
    let was_muted = player.is_muted();
    player.set_muted(true);

    match player.play().await {
        Ok(()) => {
            tracing::info!("autoplay succeeded muted");
            notifier.notify(Notice::info(
                "Playback muted",
                "The browser blocked autoplay with sound. The player was muted; unmute it manually.",
            ));
            AutoplayOutcome::PlayedMuted
        }
        Err(e) => {
            tracing::warn!("autoplay failed: {}", e);
            player.set_muted(was_muted);
            notifier.notify(Notice::error(
                "Autoplay failed, press the sync button",
                e.to_string(),
            ));
            AutoplayOutcome::Failed(e.to_string())
        }
    }
}
