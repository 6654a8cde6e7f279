//! Site-tracking state: the single "currently watched" site plus the
//! temporary grants, which outlive any one watch session.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::host::normalize_host;
use crate::host::TabId;

/// One watch session. Host and start time exist together or not at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchSession {
    pub host: String,
    /// Epoch ms when watching this host began.
    pub started_at: u64,
    pub tab_id: TabId,
    #[serde(default)]
    pub warning_shown: bool,
}

/// Outcome of [`SiteTracking::watch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    /// A new session started (first watch, or the host changed).
    Started,
    /// The same host was already being watched; its clock keeps running.
    Continued,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteTracking {
    #[serde(default)]
    session: Option<WatchSession>,
    /// Host -> grant expiry (epoch ms).
    #[serde(default)]
    temporary_grants: BTreeMap<String, u64>,
}

impl SiteTracking {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn session(&self) -> Option<&WatchSession> {
        self.session.as_ref()
    }

    pub fn current_host(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.host.as_str())
    }

    pub fn watch_started_at(&self) -> Option<u64> {
        self.session.as_ref().map(|s| s.started_at)
    }

    pub fn active_tab_id(&self) -> Option<TabId> {
        self.session.as_ref().map(|s| s.tab_id)
    }

    pub fn warning_already_shown(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.warning_shown)
    }

    pub fn is_tracking(&self) -> bool {
        self.session.is_some()
    }

    /// Milliseconds spent on the watched host so far.
    pub fn elapsed_ms(&self, now_ms: u64) -> Option<u64> {
        self.watch_started_at()
            .map(|started| now_ms.saturating_sub(started))
    }

    pub fn grants(&self) -> &BTreeMap<String, u64> {
        &self.temporary_grants
    }

    pub fn grant_expiry(&self, host: &str) -> Option<u64> {
        self.temporary_grants.get(&normalize_host(host)).copied()
    }

    /// A grant is valid while `now < expiry`.
    pub fn has_valid_grant(&self, host: &str, now_ms: u64) -> bool {
        self.grant_expiry(host).is_some_and(|expiry| now_ms < expiry)
    }

    /// Whether the time-on-site warning should fire now.
    pub fn warning_due(&self, now_ms: u64, threshold_ms: u64) -> bool {
        match (&self.session, self.elapsed_ms(now_ms)) {
            (Some(session), Some(elapsed)) => !session.warning_shown && elapsed > threshold_ms,
            _ => false,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start or continue watching `host` on `tab_id`.
    ///
    /// The warning re-arms only when the host actually changes.
    pub fn watch(&mut self, host: &str, tab_id: TabId, now_ms: u64) -> WatchOutcome {
        let host = normalize_host(host);
        if let Some(session) = self.session.as_mut() {
            if session.host == host {
                session.tab_id = tab_id;
                return WatchOutcome::Continued;
            }
        }
        self.session = Some(WatchSession {
            host,
            started_at: now_ms,
            tab_id,
            warning_shown: false,
        });
        WatchOutcome::Started
    }

    /// Drop the current session. Grants are kept. Returns the host that was
    /// being watched, if any.
    pub fn clear(&mut self) -> Option<String> {
        self.session.take().map(|s| s.host)
    }

    /// Clear only when `tab_id` is the tracked tab.
    pub fn clear_if_tab(&mut self, tab_id: TabId) -> Option<String> {
        if self.active_tab_id() == Some(tab_id) {
            self.clear()
        } else {
            None
        }
    }

    pub fn mark_warning_shown(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.warning_shown = true;
        }
    }

    /// Grant `minutes` of access to `host` and end the current session.
    /// Returns the grant expiry.
    pub fn grant(&mut self, host: &str, minutes: u64, now_ms: u64) -> u64 {
        let expiry = now_ms.saturating_add(minutes.saturating_mul(60_000));
        self.temporary_grants.insert(normalize_host(host), expiry);
        self.session = None;
        expiry
    }

    /// Forget grants that have already expired.
    pub fn prune_expired(&mut self, now_ms: u64) -> usize {
        let before = self.temporary_grants.len();
        self.temporary_grants.retain(|_, expiry| now_ms < *expiry);
        before - self.temporary_grants.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: u64 = 1_700_000_000_000;

    #[test]
    fn watch_starts_and_continues() {
        let mut tracking = SiteTracking::new();
        assert_eq!(tracking.watch("youtube.com", 1, T0), WatchOutcome::Started);
        assert_eq!(
            tracking.watch("YouTube.com", 2, T0 + 10_000),
            WatchOutcome::Continued
        );
        assert_eq!(tracking.watch_started_at(), Some(T0));
        assert_eq!(tracking.active_tab_id(), Some(2));
    }

    #[test]
    fn warning_rearms_only_on_host_change() {
        let mut tracking = SiteTracking::new();
        tracking.watch("youtube.com", 1, T0);
        tracking.mark_warning_shown();
        tracking.watch("youtube.com", 1, T0 + 1_000);
        assert!(tracking.warning_already_shown());

        tracking.watch("reddit.com", 1, T0 + 2_000);
        assert!(!tracking.warning_already_shown());
        assert_eq!(tracking.watch_started_at(), Some(T0 + 2_000));
    }

    #[test]
    fn warning_due_after_threshold() {
        let mut tracking = SiteTracking::new();
        assert!(!tracking.warning_due(T0, 300_000));
        tracking.watch("youtube.com", 1, T0);
        assert!(!tracking.warning_due(T0 + 300_000, 300_000));
        assert!(tracking.warning_due(T0 + 300_001, 300_000));
        tracking.mark_warning_shown();
        assert!(!tracking.warning_due(T0 + 900_000, 300_000));
    }

    #[test]
    fn clear_preserves_grants() {
        let mut tracking = SiteTracking::new();
        tracking.grant("reddit.com", 5, T0);
        tracking.watch("youtube.com", 1, T0);
        assert_eq!(tracking.clear().as_deref(), Some("youtube.com"));
        assert!(!tracking.is_tracking());
        assert!(tracking.has_valid_grant("reddit.com", T0 + 1));
    }

    #[test]
    fn clear_if_tab_only_matches_tracked_tab() {
        let mut tracking = SiteTracking::new();
        tracking.watch("youtube.com", 7, T0);
        assert_eq!(tracking.clear_if_tab(8), None);
        assert!(tracking.is_tracking());
        assert_eq!(tracking.clear_if_tab(7).as_deref(), Some("youtube.com"));
    }

    #[test]
    fn grant_expires_at_boundary() {
        let mut tracking = SiteTracking::new();
        tracking.watch("youtube.com", 1, T0);
        let expiry = tracking.grant("www.YouTube.com", 5, T0);
        assert_eq!(expiry, T0 + 300_000);
        assert!(!tracking.is_tracking());
        assert!(tracking.has_valid_grant("youtube.com", T0 + 299_999));
        assert!(!tracking.has_valid_grant("youtube.com", T0 + 300_000));
    }

    #[test]
    fn prune_drops_only_expired() {
        let mut tracking = SiteTracking::new();
        tracking.grant("a.com", 1, T0);
        tracking.grant("b.com", 10, T0);
        assert_eq!(tracking.prune_expired(T0 + 120_000), 1);
        assert!(tracking.grant_expiry("a.com").is_none());
        assert!(tracking.grant_expiry("b.com").is_some());
    }
}
