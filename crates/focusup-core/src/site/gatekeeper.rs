//! Nudge gatekeeper.
//!
//! Decides whether a nudge may fire (process-wide cooldown) and remembers
//! which host each shown notification was about, so that a button click
//! arriving later can be routed back into grant/dismiss logic.
//!
//! ## Nudge kinds
//!
//! - **Focus reminder**: first visit to a distracting host.
//! - **Five-minute warning**: the same host has been watched past the
//!   time-on-site threshold.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::host::TabId;

/// Default cooldown between nudges: 30 seconds.
pub const DEFAULT_COOLDOWN_MS: u64 = 30_000;

const FOCUS_REMINDER_MESSAGES: &[&str] = &[
    "Time to refocus! Let's get back to work.",
    "Taking a break? Remember your goals!",
    "Stay productive! You've got this!",
    "Focus mode activated. You're stronger than the distraction!",
    "Keep the momentum going!",
    "Your future self will thank you for staying focused.",
    "Every focused minute counts towards your success!",
    "Discipline today, success tomorrow.",
];

const WARNING_MESSAGES: &[&str] = &[
    "You've been here for 5+ minutes! Time to refocus!",
    "5 minutes flew by! Let's get back to productivity!",
    "Time check: 5+ minutes on this site. Ready to refocus?",
    "Gentle reminder: You've spent 5+ minutes here. Time to get back to work!",
    "Focus alert: 5+ minutes have passed. Your goals are waiting!",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NudgeKind {
    FocusReminder,
    FiveMinuteWarning,
}

impl NudgeKind {
    pub fn title(self) -> &'static str {
        match self {
            NudgeKind::FocusReminder => "FocusUp Reminder",
            NudgeKind::FiveMinuteWarning => "5-Minute Focus Alert",
        }
    }

    /// Button labels; index 0 dismisses, index 1 asks for a grant.
    pub fn buttons(self) -> [&'static str; 2] {
        match self {
            NudgeKind::FocusReminder => ["Stay Focused", "Take 5 min break"],
            NudgeKind::FiveMinuteWarning => ["Get Back to Work", "Give me 5 more minutes"],
        }
    }

    pub fn random_message(self) -> &'static str {
        let pool = match self {
            NudgeKind::FocusReminder => FOCUS_REMINDER_MESSAGES,
            NudgeKind::FiveMinuteWarning => WARNING_MESSAGES,
        };
        pool.choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or("Time to refocus!")
    }
}

/// A shown notification waiting for a possible button click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingNudge {
    pub kind: NudgeKind,
    pub host: String,
    pub tab_id: Option<TabId>,
}

/// Process-wide nudge cooldown plus the pending-notification ledger.
///
/// The ledger holds at most one notification per [`NudgeKind`]: showing a
/// new one displaces the previous record of the same kind.
#[derive(Debug, Clone)]
pub struct NudgeGatekeeper {
    cooldown_ms: u64,
    last_nudge_at: Option<u64>,
    pending: HashMap<String, PendingNudge>,
}

impl Default for NudgeGatekeeper {
    fn default() -> Self {
        Self::with_cooldown(DEFAULT_COOLDOWN_MS)
    }
}

impl NudgeGatekeeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cooldown(cooldown_ms: u64) -> Self {
        Self {
            cooldown_ms,
            last_nudge_at: None,
            pending: HashMap::new(),
        }
    }

    pub fn cooldown_ms(&self) -> u64 {
        self.cooldown_ms
    }

    pub fn last_nudge_at(&self) -> Option<u64> {
        self.last_nudge_at
    }

    /// Resume the cooldown window of a previous process.
    pub fn restore(&mut self, last_nudge_at: Option<u64>) {
        self.last_nudge_at = last_nudge_at;
    }

    /// Whether a nudge at `now` would be suppressed by the cooldown.
    pub fn in_cooldown(&self, now_ms: u64) -> bool {
        self.last_nudge_at
            .is_some_and(|last| now_ms.saturating_sub(last) < self.cooldown_ms)
    }

    /// Admit a nudge and start a new cooldown window, or refuse it.
    pub fn try_admit(&mut self, now_ms: u64) -> bool {
        if self.in_cooldown(now_ms) {
            return false;
        }
        self.last_nudge_at = Some(now_ms);
        true
    }

    /// Record a shown notification. Returns the ids of records it
    /// displaced, which can no longer be routed to a host.
    pub fn remember(&mut self, notification_id: String, nudge: PendingNudge) -> Vec<String> {
        let displaced: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, pending)| pending.kind == nudge.kind)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &displaced {
            self.pending.remove(id);
        }
        self.pending.insert(notification_id, nudge);
        displaced
    }

    /// Consume the record for a clicked notification.
    pub fn take(&mut self, notification_id: &str) -> Option<PendingNudge> {
        self.pending.remove(notification_id)
    }

    /// Drop every pending record about `host` (a grant made them moot).
    pub fn forget_host(&mut self, host: &str) {
        self.pending.retain(|_, nudge| nudge.host != host);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: u64 = 1_700_000_000_000;

    #[test]
    fn cooldown_suppresses_rapid_nudges() {
        let mut gatekeeper = NudgeGatekeeper::new();
        assert!(gatekeeper.try_admit(T0));
        assert!(!gatekeeper.try_admit(T0 + 5_000));
        assert!(!gatekeeper.try_admit(T0 + 29_999));
        assert!(gatekeeper.try_admit(T0 + 30_000));
        assert_eq!(gatekeeper.last_nudge_at(), Some(T0 + 30_000));
    }

    #[test]
    fn refused_nudge_does_not_extend_window() {
        let mut gatekeeper = NudgeGatekeeper::new();
        gatekeeper.try_admit(T0);
        gatekeeper.try_admit(T0 + 20_000);
        assert!(gatekeeper.try_admit(T0 + 35_000));
    }

    #[test]
    fn pending_records_are_consumed_once() {
        let mut gatekeeper = NudgeGatekeeper::new();
        gatekeeper.remember(
            "n-1".into(),
            PendingNudge {
                kind: NudgeKind::FocusReminder,
                host: "youtube.com".into(),
                tab_id: Some(4),
            },
        );
        assert_eq!(gatekeeper.pending_count(), 1);
        assert_eq!(gatekeeper.take("n-1").map(|n| n.host), Some("youtube.com".into()));
        assert!(gatekeeper.take("n-1").is_none());
    }

    #[test]
    fn forget_host_drops_matching_records() {
        let mut gatekeeper = NudgeGatekeeper::new();
        for (id, kind, host) in [
            ("a", NudgeKind::FocusReminder, "youtube.com"),
            ("b", NudgeKind::FiveMinuteWarning, "reddit.com"),
        ] {
            gatekeeper.remember(
                id.into(),
                PendingNudge {
                    kind,
                    host: host.into(),
                    tab_id: None,
                },
            );
        }
        gatekeeper.forget_host("youtube.com");
        assert_eq!(gatekeeper.pending_count(), 1);
        assert!(gatekeeper.take("b").is_some());
    }

    #[test]
    fn ledger_keeps_newest_record_per_kind() {
        let mut gatekeeper = NudgeGatekeeper::new();
        let reminder = |host: &str| PendingNudge {
            kind: NudgeKind::FocusReminder,
            host: host.into(),
            tab_id: Some(1),
        };
        for i in 0..500u64 {
            assert!(gatekeeper.try_admit(T0 + i * 31_000));
            let displaced = gatekeeper.remember(format!("n-{i}"), reminder("reddit.com"));
            let expected: Vec<String> = if i == 0 { vec![] } else { vec![format!("n-{}", i - 1)] };
            assert_eq!(displaced, expected);
        }
        gatekeeper.remember(
            "w-1".into(),
            PendingNudge {
                kind: NudgeKind::FiveMinuteWarning,
                host: "reddit.com".into(),
                tab_id: Some(1),
            },
        );
        assert_eq!(gatekeeper.pending_count(), 2);
        assert!(gatekeeper.take("n-498").is_none());
        assert!(gatekeeper.take("n-499").is_some());
    }

    #[test]
    fn restored_cooldown_applies_across_processes() {
        let mut first = NudgeGatekeeper::new();
        assert!(first.try_admit(T0));

        let mut second = NudgeGatekeeper::new();
        second.restore(first.last_nudge_at());
        assert!(!second.try_admit(T0 + 5_000));
        assert!(second.try_admit(T0 + 35_000));
    }

    #[test]
    fn messages_come_from_the_right_pool() {
        for _ in 0..20 {
            assert!(FOCUS_REMINDER_MESSAGES.contains(&NudgeKind::FocusReminder.random_message()));
            assert!(WARNING_MESSAGES.contains(&NudgeKind::FiveMinuteWarning.random_message()));
        }
    }
}
