//! Outbound collaborators: where messages and notices go.
//!
//! The session never talks to a network or a UI directly. It hands status
//! messages to a [`StatusSink`], reads the room's epoch token from an
//! [`ExpireIdSource`], and surfaces user-facing notices through a
//! [`Notifier`].

use std::sync::Mutex;

use playsync_types::{MessageType, StatusMessage};
use tokio::sync::mpsc;

use crate::lock;

/// Fire-and-forget publish callback.
pub trait StatusSink: Send + Sync {
    /// Queue a message for the room.
    ///
    /// Returns whether the message was queued locally, not whether it was
    /// delivered.
    fn publish(&self, message: StatusMessage) -> bool;
}

/// Supplier of the room's current expire epoch.
///
/// Must be monotonically non-decreasing.
pub trait ExpireIdSource: Send + Sync {
    /// The current epoch token.
    fn current(&self) -> u64;
}

impl<F> ExpireIdSource for F
where
    F: Fn() -> u64 + Send + Sync,
{
    fn current(&self) -> u64 {
        self()
    }
}

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Informational.
    Info,
    /// Something failed and needs the user.
    Error,
}

/// A titled message for the end user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity level.
    pub severity: Severity,
    /// Short title.
    pub title: String,
    /// Body text.
    pub message: String,
}

impl Notice {
    /// Informational notice.
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Error notice.
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Displays notices to the end user.
pub trait Notifier: Send + Sync {
    /// Show a notice.
    fn notify(&self, notice: Notice);
}

/// Sink that forwards messages into an unbounded channel.
///
/// The receiving end is typically a transport task that serializes and sends.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<StatusMessage>,
}

impl ChannelSink {
    /// Create a sink and the receiver that drains it.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StatusMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl StatusSink for ChannelSink {
    fn publish(&self, message: StatusMessage) -> bool {
        self.tx.send(message).is_ok()
    }
}

/// Sink that records every message, for tests and diagnostics.
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<StatusMessage>>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages published so far.
    pub fn messages(&self) -> Vec<StatusMessage> {
        lock(&self.messages).clone()
    }

    /// Messages of one kind.
    pub fn of_kind(&self, kind: MessageType) -> Vec<StatusMessage> {
        lock(&self.messages)
            .iter()
            .filter(|m| m.kind == kind)
            .copied()
            .collect()
    }

    /// Kinds of all messages, in publish order.
    pub fn kinds(&self) -> Vec<MessageType> {
        lock(&self.messages).iter().map(|m| m.kind).collect()
    }

    /// Forget recorded messages.
    pub fn clear(&self) {
        lock(&self.messages).clear();
    }
}

impl StatusSink for RecordingSink {
    fn publish(&self, message: StatusMessage) -> bool {
        lock(&self.messages).push(message);
        true
    }
}

/// Notifier that records every notice.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    /// Create an empty recording notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// All notices shown so far.
    pub fn notices(&self) -> Vec<Notice> {
        lock(&self.notices).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        lock(&self.notices).push(notice);
    }
}
