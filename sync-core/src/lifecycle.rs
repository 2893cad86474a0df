//! Session lifecycle state machine for playsync.
//!
//! This module provides a pure, side-effect-free state machine for a sync
//! session bound to one player. The state machine takes events as input and
//! produces a new state plus a list of actions to execute.
//!
//! The actual work (aligning the player, spawning timers, tearing them down)
//! is performed by sync-client, not by this module.

/// Session lifecycle - NO I/O, just state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Waiting for the player to become ready.
    Uninitialized,
    /// Player is ready; initial alignment (or autoplay) in progress.
    Ready {
        /// Whether the player is showing a live stream.
        live: bool,
    },
    /// Listeners attached (or, for live streams, autoplay attempted).
    Active {
        /// Whether the player is showing a live stream.
        live: bool,
    },
    /// Everything released. Terminal.
    TornDown,
}

impl Lifecycle {
    /// Create a new state machine in the Uninitialized state.
    pub fn new() -> Self {
        Self::Uninitialized
    }

    /// Process an event and return the new state plus actions to execute.
    ///
    /// This is a pure function - no side effects. The caller (sync-client)
    /// is responsible for executing the returned actions.
    pub fn on_event(self, event: LifecycleEvent) -> (Self, Vec<LifecycleAction>) {
        match (self, event) {
            // Teardown wins from any live state, exactly once.
            (Self::TornDown, _) => (Self::TornDown, vec![]),
            (_, LifecycleEvent::Destroyed) => (Self::TornDown, vec![LifecycleAction::Teardown]),

            // From Uninitialized
            (Self::Uninitialized, LifecycleEvent::PlayerReady { live: true }) => {
                (Self::Ready { live: true }, vec![LifecycleAction::Autoplay])
            }
            (Self::Uninitialized, LifecycleEvent::PlayerReady { live: false }) => (
                Self::Ready { live: false },
                vec![LifecycleAction::AlignInitial],
            ),

            // From Ready
            (Self::Ready { live: true }, LifecycleEvent::Activated) => {
                (Self::Active { live: true }, vec![])
            }
            (Self::Ready { live: false }, LifecycleEvent::Activated) => (
                Self::Active { live: false },
                vec![
                    LifecycleAction::RegisterControls,
                    LifecycleAction::AttachListeners,
                ],
            ),

            // Invalid transitions - stay in current state
            (state, _) => (state, vec![]),
        }
    }

    /// Check if the session has been torn down.
    pub fn is_torn_down(&self) -> bool {
        matches!(self, Self::TornDown)
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Events that drive the session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The player signalled it is ready.
    PlayerReady {
        /// Whether the player is showing a live stream.
        live: bool,
    },
    /// The actions requested on entering Ready have completed.
    Activated,
    /// The player was destroyed, or the session was dropped.
    Destroyed,
}

/// Actions to be executed by the sync-client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    /// Apply the room's seek, rate and transport before any listener exists.
    AlignInitial,
    /// Live stream: attempt one resilient autoplay, nothing else.
    Autoplay,
    /// Register the manual sync control and setting.
    RegisterControls,
    /// Spawn the event, subscription and periodic check tasks.
    AttachListeners,
    /// Release every timer, subscription and listener.
    Teardown,
}
