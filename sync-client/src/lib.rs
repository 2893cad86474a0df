//! # sync-client
//!
//! Player-side session for the playsync playback reconciliation protocol.
//!
//! A [`SyncSession`] binds one local [`Player`] to the room's authoritative
//! [`MovieStatus`](playsync_types::MovieStatus) stream. It publishes local
//! transport actions (debounced), applies remote corrections without echoing
//! them back, and periodically sends a CHECK so the room can fix drift that
//! no event revealed.
//!
//! ## Features
//!
//! - **Echo Suppression**: corrections applied to the player never republish
//! - **Debounced Publishing**: scrubbing and play/pause mashing collapse into one message
//! - **Resilient Autoplay**: muted retry when the engine rejects unmuted playback
//! - **Pure Core**: planning and lifecycle decisions come from sync-core
//!
//! ## Example
//!
//! ```ignore
//! use playsync_client::{MockPlayer, RecordingNotifier, RecordingSink, SyncConfig, SyncSession};
//!
//! let (status_tx, status_rx) = tokio::sync::watch::channel(MovieStatus::default());
//! let session = SyncSession::attach(
//!     Arc::new(MockPlayer::new(600.0)),
//!     status_rx,
//!     Arc::new(RecordingSink::new()),
//!     Arc::new(RecordingNotifier::new()),
//!     Arc::new(|| 1u64),
//!     SyncConfig::default(),
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod applier;
pub mod autoplay;
pub mod config;
pub mod debounce;
pub mod player;
pub mod publisher;
pub mod session;
pub mod sink;

pub use applier::Applier;
pub use autoplay::{attempt_play, AutoplayOutcome};
pub use config::{ConfigError, SyncConfig};
pub use debounce::{DebouncePool, Debounced, Debouncer};
pub use player::{
    Control, ControlPosition, MockPlayer, Player, PlayerError, PlayerEvent, Setting,
};
pub use publisher::{Publisher, SeekClock};
pub use session::{SyncSession, SYNC_CONTROL, SYNC_SETTING};
pub use sink::{
    ChannelSink, ExpireIdSource, Notice, Notifier, RecordingNotifier, RecordingSink, Severity,
    StatusSink,
};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a std mutex, recovering the data if a holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Current instant on the tokio clock, as a std instant.
///
/// Follows `tokio::time::pause` so timer-driven tests stay deterministic.
pub(crate) fn now() -> std::time::Instant {
    tokio::time::Instant::now().into_std()
}
