//! Periodic consistency check decision.
//!
//! The client ticks on a fixed cadence and asks [`should_check`] whether a
//! CHECK message is due. A recent local seek means the room already heard
//! from us; media near its end is not worth correcting.

use std::time::Duration;

/// Thresholds for the periodic check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckPolicy {
    /// Minimum time since the last local seek before a check is sent.
    pub quiet_period: Duration,
    /// Remaining play time (seconds) required for a check to be worth sending.
    pub tail_guard_secs: f64,
}

impl Default for CheckPolicy {
    fn default() -> Self {
        Self {
            quiet_period: Duration::from_secs(10),
            tail_guard_secs: 5.0,
        }
    }
}

/// Decide whether a CHECK message should be emitted on this tick.
///
/// - `since_last_seek`: time elapsed since the last local seek
/// - `remaining_secs`: media duration minus current position
pub fn should_check(
    since_last_seek: Duration,
    remaining_secs: f64,
    is_live: bool,
    policy: &CheckPolicy,
) -> bool {
    if is_live || since_last_seek < policy.quiet_period {
        return false;
    }
    remaining_secs > policy.tail_guard_secs
}
