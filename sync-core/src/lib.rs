//! # sync-core
//!
//! Pure logic for playsync (no I/O, instant tests).
//!
//! This crate decides *what* a peer should do to stay convergent with the
//! room's authoritative [`MovieStatus`](playsync_types::MovieStatus), without
//! touching a player, a timer or a network.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about state transitions
//!
//! The actual side effects (seeking the player, publishing messages, running
//! timers) are performed by `sync-client`, which interprets the plans and
//! actions produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod check;
pub mod echo;
pub mod lifecycle;
pub mod reconcile;

pub use check::{should_check, CheckPolicy};
pub use echo::{EchoGuard, EchoKind, EchoToken, DEFAULT_ECHO_WINDOW};
pub use lifecycle::{Lifecycle, LifecycleAction, LifecycleEvent};
pub use reconcile::{plan, Corrections, LocalPlayback, TransportCorrection, DRIFT_TOLERANCE_SECS};
