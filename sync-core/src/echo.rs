//! Echo suppression for locally applied corrections.
//!
//! Setting the player's position, rate or transport makes the player fire
//! the same event a user action would. Without a guard, the outbound
//! handler would republish the correction and the room would bounce it back
//! forever.
//!
//! [`EchoGuard`] is a ledger of one-shot suppression tokens. Arm one token
//! right before a guarded mutation; the event handler consumes it when the
//! matching event arrives and skips publishing.
//!
//! A token records the value the mutation set (position or rate) and has
//! two phases:
//!
//! - **live**: any event of its kind is an echo. A token [held](EchoGuard::hold)
//!   while the mutation is in flight stays live until it is
//!   [released](EchoGuard::release), then for one window.
//! - **expired**: the event is only an echo if the player still reports the
//!   value the mutation set. An event of the same channel that reports
//!   anything else drops expired tokens, so a mutation the player silently
//!   swallowed cannot mute a later genuine user action.
//!
//! Play and pause share one channel: either transport event invalidates
//! expired tokens of the other.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::reconcile::DRIFT_TOLERANCE_SECS;

/// How long a token stays live after its mutation settled.
pub const DEFAULT_ECHO_WINDOW: Duration = Duration::from_secs(1);

/// Rates are compared exactly, up to float noise.
const RATE_EPSILON: f64 = 1e-6;

/// Player event kinds that can echo a local correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EchoKind {
    /// Transport started.
    Play,
    /// Transport paused.
    Pause,
    /// Position changed.
    Seek,
    /// Playback rate changed.
    Rate,
}

impl EchoKind {
    fn channel(self) -> usize {
        match self {
            EchoKind::Play | EchoKind::Pause => 0,
            EchoKind::Seek => 1,
            EchoKind::Rate => 2,
        }
    }
}

/// Handle to one armed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoToken(u64);

#[derive(Debug, Clone)]
struct Armed {
    token: EchoToken,
    kind: EchoKind,
    target: Option<f64>,
    /// `None` while the guarded mutation is in flight.
    deadline: Option<Instant>,
}

impl Armed {
    fn is_live(&self, now: Instant) -> bool {
        self.deadline.map_or(true, |deadline| now <= deadline)
    }

    fn matches(&self, kind: EchoKind, observed: Option<f64>, tolerance: f64) -> bool {
        self.kind == kind
            && match (self.target, observed) {
                (None, _) => true,
                (Some(target), Some(observed)) => (target - observed).abs() <= tolerance,
                (Some(_), None) => false,
            }
    }
}

/// One-shot suppression ledger.
#[derive(Debug, Clone)]
pub struct EchoGuard {
    window: Duration,
    seek_tolerance: f64,
    next_token: u64,
    armed: [VecDeque<Armed>; 3],
}

impl EchoGuard {
    /// Create a guard whose tokens stay live for `window` once settled.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            seek_tolerance: DRIFT_TOLERANCE_SECS,
            next_token: 0,
            armed: Default::default(),
        }
    }

    /// How far (seconds) a late seek event may land from the guarded
    /// target and still count as its echo.
    pub fn with_seek_tolerance(mut self, seconds: f64) -> Self {
        self.seek_tolerance = seconds;
        self
    }

    fn push(&mut self, kind: EchoKind, target: Option<f64>, deadline: Option<Instant>) -> EchoToken {
        let token = EchoToken(self.next_token);
        self.next_token += 1;
        self.armed[kind.channel()].push_back(Armed {
            token,
            kind,
            target,
            deadline,
        });
        token
    }

    /// Arm a token for a mutation that has already been issued.
    ///
    /// `target` is the position or rate being set; `None` for transport.
    pub fn arm(&mut self, kind: EchoKind, target: Option<f64>, now: Instant) -> EchoToken {
        self.push(kind, target, Some(now + self.window))
    }

    /// Arm a token for a mutation that is still in flight.
    ///
    /// The token does not expire until [`release`](Self::release)d.
    pub fn hold(&mut self, kind: EchoKind, target: Option<f64>) -> EchoToken {
        self.push(kind, target, None)
    }

    /// The held mutation settled; start the token's window now.
    ///
    /// No-op if the token was already consumed.
    pub fn release(&mut self, token: EchoToken, now: Instant) {
        let deadline = now + self.window;
        if let Some(armed) = self
            .armed
            .iter_mut()
            .flatten()
            .find(|armed| armed.token == token)
        {
            if armed.deadline.is_none() {
                armed.deadline = Some(deadline);
            }
        }
    }

    /// Drop a token whose mutation did not happen, so no event will consume it.
    ///
    /// Returns false if it was already consumed.
    pub fn disarm(&mut self, token: EchoToken) -> bool {
        for queue in &mut self.armed {
            if let Some(pos) = queue.iter().position(|armed| armed.token == token) {
                queue.remove(pos);
                return true;
            }
        }
        false
    }

    /// Decide whether an event is the echo of a guarded mutation.
    ///
    /// `observed` is what the player reports right now: its position for
    /// [`EchoKind::Seek`], its rate for [`EchoKind::Rate`], `None` for
    /// transport. Returns true (consuming one token) if the event must not
    /// be published.
    pub fn consume(&mut self, kind: EchoKind, observed: Option<f64>, now: Instant) -> bool {
        let tolerance = match kind {
            EchoKind::Seek => self.seek_tolerance,
            EchoKind::Rate => RATE_EPSILON,
            EchoKind::Play | EchoKind::Pause => 0.0,
        };
        let queue = &mut self.armed[kind.channel()];
        queue.retain(|armed| armed.is_live(now) || armed.matches(kind, observed, tolerance));

        // Whatever of this kind survived is live or matches.
        match queue.iter().position(|armed| armed.kind == kind) {
            Some(pos) => {
                queue.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Number of live tokens for `kind`.
    pub fn armed(&self, kind: EchoKind, now: Instant) -> usize {
        self.armed[kind.channel()]
            .iter()
            .filter(|armed| armed.kind == kind && armed.is_live(now))
            .count()
    }

    /// Drop every token.
    pub fn clear(&mut self) {
        self.armed.iter_mut().for_each(VecDeque::clear);
    }
}

impl Default for EchoGuard {
    fn default() -> Self {
        Self::new(DEFAULT_ECHO_WINDOW)
    }
}
