//! Tab events, nudges, time-on-site warnings and temporary grants.

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{grant_host, report_delivery, Coordinator, FOCUS_PAGE_URL};
use crate::host::{Alarm, AlarmSpec, BrowserHost, Notification, TabId};
use crate::protocol::PageMessage;
use crate::site::{host_from_url, NudgeKind, PendingNudge, WatchOutcome};
use crate::storage::{keys, KeyValueStore, Scope, Settings};

impl<S, H> Coordinator<S, H>
where
    S: KeyValueStore,
    H: BrowserHost,
{
    /// A tab finished loading `url`.
    pub async fn on_tab_updated(&mut self, tab_id: TabId, url: &str, now_ms: u64) {
        self.handle_tab_change(tab_id, url, now_ms).await;
    }

    /// The user switched to `tab_id`.
    pub async fn on_tab_activated(&mut self, tab_id: TabId, now_ms: u64) {
        match self.host.get(tab_id).await {
            Ok(Some(tab)) => self.handle_tab_change(tab.id, &tab.url, now_ms).await,
            Ok(None) => debug!(tab_id, "activated tab is gone"),
            Err(e) => warn!(tab_id, error = %e, "failed to look up activated tab"),
        }
    }

    pub async fn on_tab_removed(&mut self, tab_id: TabId) {
        if let Some(host) = self.tracking.clear_if_tab(tab_id) {
            debug!(tab_id, %host, "tracked tab closed");
            self.persist_tracking().await;
        }
    }

    async fn handle_tab_change(&mut self, tab_id: TabId, url: &str, now_ms: u64) {
        let Some(host) = self.blocklist.classify_url(url) else {
            if let Some(previous) = self.tracking.clear() {
                debug!(%previous, "stopped tracking");
                self.persist_tracking().await;
            }
            return;
        };

        if self.tracking.has_valid_grant(&host, now_ms) {
            debug!(%host, "temporary access active");
            return;
        }

        if self.tracking.watch(&host, tab_id, now_ms) == WatchOutcome::Started {
            debug!(%host, tab_id, "started tracking");
        }
        self.persist_tracking().await;
        self.nudge(&host, tab_id, now_ms).await;
    }

    /// Remind the user that `host` is a distraction, subject to the
    /// cooldown. Returns whether a nudge went out.
    async fn nudge(&mut self, host: &str, tab_id: TabId, now_ms: u64) -> bool {
        let settings = match Settings::load(&self.store).await {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "failed to read settings; skipping nudge");
                return false;
            }
        };
        if !settings.extension_enabled {
            return false;
        }
        if !self.gatekeeper.try_admit(now_ms) {
            debug!(host, "nudge suppressed by cooldown");
            return false;
        }
        self.persist(Scope::Local, keys::LAST_NUDGE_AT, &now_ms).await;

        let count = self.counters.record_block();
        self.persist(Scope::Sync, keys::BLOCKED_COUNT, &count).await;

        if settings.notifications_enabled {
            self.show_nudge(NudgeKind::FocusReminder, host, Some(tab_id))
                .await;
        }
        let reminder = PageMessage::ShowFocusReminder {
            site: host.to_string(),
        };
        report_delivery(
            "focus reminder",
            self.host.send_to_tab(tab_id, &reminder).await.map(drop),
        );
        if settings.strict_mode {
            self.redirect_to_focus_page(tab_id).await;
        }

        info!(host, blocked_today = count, "distraction nudged");
        self.broadcast_blocked_count().await;
        true
    }

    /// Periodic check: warn once when the watched site passes the
    /// time-on-site threshold.
    pub async fn check_site_time_limit(&mut self, now_ms: u64) {
        if !self
            .tracking
            .warning_due(now_ms, self.config.warning_threshold_ms)
        {
            return;
        }
        let Some(session) = self.tracking.session().cloned() else {
            return;
        };
        let settings = match Settings::load(&self.store).await {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "failed to read settings; warning deferred");
                return;
            }
        };
        if !settings.extension_enabled {
            return;
        }

        self.tracking.mark_warning_shown();
        self.persist_tracking().await;

        let time_spent = self.tracking.elapsed_ms(now_ms).unwrap_or_default() / 1000;
        info!(host = %session.host, time_spent, "time-on-site warning");

        if settings.notifications_enabled {
            self.show_nudge(
                NudgeKind::FiveMinuteWarning,
                &session.host,
                Some(session.tab_id),
            )
            .await;
        }
        if settings.strict_mode {
            self.redirect_to_focus_page(session.tab_id).await;
        }
        let warning = PageMessage::ShowFiveMinuteWarning {
            site: session.host.clone(),
            time_spent,
        };
        report_delivery(
            "time warning",
            self.host
                .send_to_tab(session.tab_id, &warning)
                .await
                .map(drop),
        );
    }

    /// Allow `site` for `minutes`. Returns the expiry, or `None` when the
    /// site is empty.
    pub async fn grant_temporary_access(
        &mut self,
        site: &str,
        minutes: u64,
        now_ms: u64,
    ) -> Option<u64> {
        let Some(host) = grant_host(site) else {
            warn!("grant requested for an empty site");
            return None;
        };
        let expiry = self.tracking.grant(&host, minutes, now_ms);
        self.tracking.prune_expired(now_ms);
        self.gatekeeper.forget_host(&host);
        self.persist_tracking().await;
        info!(%host, minutes, expiry, "temporary access granted");
        Some(expiry)
    }

    /// A notification button was clicked. Index 0 keeps the user focused,
    /// index 1 buys a short break on the nudged site.
    pub async fn on_notification_button(&mut self, notification_id: &str, index: usize, now_ms: u64) {
        let pending = self.gatekeeper.take(notification_id);
        report_delivery("clear notification", self.host.clear(notification_id).await);

        match index {
            0 => {
                if let Some(PendingNudge {
                    kind: NudgeKind::FiveMinuteWarning,
                    tab_id: Some(tab_id),
                    ..
                }) = pending
                {
                    report_delivery("go back", self.host.go_back(tab_id).await);
                }
            }
            1 => {
                let Some(nudge) = self.resolve_nudge(pending).await else {
                    debug!(notification_id, "no site to grant");
                    return;
                };
                let minutes = self.config.grant_minutes;
                if self
                    .grant_temporary_access(&nudge.host, minutes, now_ms)
                    .await
                    .is_none()
                {
                    return;
                }
                if let Some(tab_id) = nudge.tab_id {
                    report_delivery(
                        "grant relay",
                        self.host
                            .send_to_tab(tab_id, &PageMessage::TempAccessGranted)
                            .await
                            .map(drop),
                    );
                }
                self.confirm_break(nudge.kind, minutes, now_ms).await;
            }
            other => debug!(index = other, "ignored notification button"),
        }
    }

    /// Fall back to the active tab when the notification is unknown, e.g.
    /// after a restart.
    async fn resolve_nudge(&self, pending: Option<PendingNudge>) -> Option<PendingNudge> {
        if pending.is_some() {
            return pending;
        }
        let tab = match self.host.active().await {
            Ok(tab) => tab?,
            Err(e) => {
                warn!(error = %e, "failed to look up active tab");
                return None;
            }
        };
        let host = host_from_url(&tab.url)?;
        Some(PendingNudge {
            kind: NudgeKind::FocusReminder,
            host,
            tab_id: Some(tab.id),
        })
    }

    async fn confirm_break(&self, kind: NudgeKind, minutes: u64, now_ms: u64) {
        let notification = match kind {
            NudgeKind::FocusReminder => {
                let spec = AlarmSpec {
                    alarm: Alarm::BreakOver,
                    when_ms: now_ms.saturating_add(minutes.saturating_mul(60_000)),
                    period_ms: None,
                };
                if let Err(e) = self.host.schedule(spec).await {
                    warn!(error = %e, "failed to schedule break end");
                }
                Notification::basic(
                    "Break Time!",
                    format!("{minutes}-minute break started. Relax and recharge!"),
                )
            }
            NudgeKind::FiveMinuteWarning => Notification::basic(
                format!("{minutes} More Minutes Granted"),
                "Use this time wisely! We'll remind you again after.",
            ),
        };
        self.notify_info(&notification).await;
    }

    async fn show_nudge(&mut self, kind: NudgeKind, host: &str, tab_id: Option<TabId>) {
        let id = format!("focusup-{}", Uuid::new_v4());
        let notification =
            Notification::basic(kind.title(), kind.random_message()).with_buttons(kind.buttons());
        if let Err(e) = self.host.notify(&id, &notification).await {
            report_delivery("nudge notification", Err(e));
            return;
        }
        let displaced = self.gatekeeper.remember(
            id,
            PendingNudge {
                kind,
                host: host.to_string(),
                tab_id,
            },
        );
        for stale in displaced {
            report_delivery("clear notification", self.host.clear(&stale).await);
        }
    }

    async fn redirect_to_focus_page(&self, tab_id: TabId) {
        info!(tab_id, "strict mode redirect");
        report_delivery(
            "strict redirect",
            self.host.navigate(tab_id, FOCUS_PAGE_URL).await,
        );
    }
}
