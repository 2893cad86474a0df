//! # sync-types
//!
//! Wire format types for the playsync playback reconciliation protocol.
//!
//! This crate provides the foundational types used across all playsync crates:
//! - [`MovieStatus`] - The authoritative transport state every peer converges to
//! - [`StatusSnapshot`] - A peer's local view carried inside outbound messages
//! - [`StatusMessage`] - Typed status messages (PLAY, PAUSE, CHECK, ...)
//! - [`now_millis`] - Wall-clock stamp for the `time` field
//! - [`SyncError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod messages;
mod status;

pub use error::SyncError;
pub use messages::{now_millis, CheckRequest, MessageType, StatusMessage};
pub use status::{MovieStatus, StatusSnapshot};
