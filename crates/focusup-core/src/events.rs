use serde::{Deserialize, Serialize};

/// Every timer state change produces an event.
/// The coordinator turns these into broadcasts and notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerEvent {
    TimerStarted {
        remaining_secs: u64,
        at_ms: u64,
    },
    TimerPaused {
        remaining_secs: u64,
        at_ms: u64,
    },
    TimerResumed {
        remaining_secs: u64,
        at_ms: u64,
    },
    /// Remaining time changed on a tick.
    TimerTicked {
        remaining_secs: u64,
        at_ms: u64,
    },
    /// The countdown reached zero; the timer is back to idle.
    TimerCompleted {
        duration_minutes: u64,
        at_ms: u64,
    },
    TimerReset {
        at_ms: u64,
    },
}

impl TimerEvent {
    /// Whether this event ends a focus session.
    pub fn is_completion(&self) -> bool {
        matches!(self, TimerEvent::TimerCompleted { .. })
    }
}
