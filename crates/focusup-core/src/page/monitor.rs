//! Per-page guard running inside every document.
//!
//! The page cannot trust that the coordinator's nudge arrives (or arrives
//! before the page renders), so it classifies its own URL on load and after
//! every in-document navigation. All DOM work is expressed as
//! [`PageEffect`]s for the embedding layer to carry out.

use tracing::debug;

use super::url_watch::{UrlSource, UrlWatcher};
use crate::protocol::{Ack, PageMessage, Request};
use crate::site::{host_from_url, BlockList};
use crate::storage::{PageConfig, SettingKey, Settings};

/// The two modal overlays a page can show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    Focus,
    Warning { site: String, time_spent_secs: u64 },
}

impl Overlay {
    pub fn title(&self) -> &'static str {
        match self {
            Overlay::Focus => "Time to Focus!",
            Overlay::Warning { .. } => "5-Minute Focus Alert!",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Overlay::Focus => {
                "You're visiting a potentially distracting site. Remember your goals!".to_string()
            }
            Overlay::Warning {
                site,
                time_spent_secs,
            } => format!(
                "You've been on {site} for {}m {}s. Time to refocus!",
                time_spent_secs / 60,
                time_spent_secs % 60
            ),
        }
    }

    /// Primary ("stay focused") then secondary ("grant grace period").
    pub fn buttons(&self) -> [&'static str; 2] {
        match self {
            Overlay::Focus => ["Stay Focused", "Continue (5 min)"],
            Overlay::Warning { .. } => ["Get Back to Work", "Give me 5 more minutes"],
        }
    }
}

/// Something the embedding layer must do on behalf of the monitor.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEffect {
    ShowOverlay(Overlay),
    HideOverlay,
    NavigateBack,
    SendToCore(Request),
    /// Call [`PageMonitor::check_current_site`] after `delay_ms`.
    ScheduleCheck { delay_ms: u64 },
}

#[derive(Debug, Clone)]
pub struct PageMonitor {
    url: String,
    blocklist: BlockList,
    settings: Settings,
    timings: PageConfig,
    watcher: UrlWatcher,
    overlay: Option<Overlay>,
    initial_overlay_shown: bool,
    grace_until: Option<u64>,
}

impl PageMonitor {
    pub fn new(
        url: impl Into<String>,
        blocklist: BlockList,
        settings: Settings,
        timings: PageConfig,
    ) -> Self {
        let url = url.into();
        Self {
            watcher: UrlWatcher::new(
                url.clone(),
                timings.recheck_delay_ms,
                timings.history_delay_ms,
            ),
            url,
            blocklist,
            settings,
            timings,
            overlay: None,
            initial_overlay_shown: false,
            grace_until: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn initial_overlay_shown(&self) -> bool {
        self.initial_overlay_shown
    }

    pub fn has_grace(&self, now_ms: u64) -> bool {
        self.grace_until.is_some_and(|expiry| now_ms < expiry)
    }

    /// Page finished loading: check now and once more after the settle
    /// delay.
    pub fn on_load(&mut self, now_ms: u64) -> Vec<PageEffect> {
        let mut effects = self.check_current_site(now_ms);
        effects.push(PageEffect::ScheduleCheck {
            delay_ms: self.timings.settle_delay_ms,
        });
        effects
    }

    /// Show the focus overlay if this page view is distracting and nothing
    /// has been shown for it yet.
    pub fn check_current_site(&mut self, now_ms: u64) -> Vec<PageEffect> {
        let distracting = self.blocklist.classify_url(&self.url).is_some();
        if !distracting
            || !self.settings.extension_enabled
            || self.initial_overlay_shown
            || self.has_grace(now_ms)
        {
            return Vec::new();
        }
        debug!(url = %self.url, "distracting page");
        self.initial_overlay_shown = true;
        self.show(Overlay::Focus)
    }

    /// Feed a URL observation from one of the navigation observers.
    pub fn observe_url(&mut self, source: UrlSource, url: &str) -> Vec<PageEffect> {
        match self.watcher.observe(source, url) {
            Some(change) => {
                debug!(url = %change.url, ?source, "in-page navigation");
                self.url = change.url;
                self.initial_overlay_shown = false;
                vec![PageEffect::ScheduleCheck {
                    delay_ms: change.delay_ms,
                }]
            }
            None => Vec::new(),
        }
    }

    /// Handle a message from the coordinator.
    pub fn handle_message(&mut self, message: &PageMessage, now_ms: u64) -> (Ack, Vec<PageEffect>) {
        let effects = match message {
            PageMessage::ShowFocusReminder { .. } => {
                if self.has_grace(now_ms) || !self.settings.extension_enabled {
                    Vec::new()
                } else {
                    self.show(Overlay::Focus)
                }
            }
            PageMessage::ShowFiveMinuteWarning { site, time_spent } => {
                self.show_warning(site, *time_spent)
            }
            PageMessage::SettingChanged { setting, value } => {
                let Ok(key) = setting.parse::<SettingKey>() else {
                    return (Ack::OK, Vec::new());
                };
                self.settings.apply(key, value);
                if key == SettingKey::CustomSites {
                    self.blocklist.set_custom(&self.settings.custom_sites);
                }
                if key == SettingKey::ExtensionEnabled && !self.settings.extension_enabled {
                    self.hide()
                } else {
                    Vec::new()
                }
            }
            PageMessage::TempAccessGranted => {
                self.grant_grace(now_ms);
                self.hide()
            }
            PageMessage::Unknown => {
                debug!("unknown page message");
                return (Ack::FAILED, Vec::new());
            }
        };
        (Ack::OK, effects)
    }

    /// Primary overlay button.
    pub fn stay_focused(&mut self) -> Vec<PageEffect> {
        match self.overlay {
            Some(Overlay::Focus) => vec![PageEffect::NavigateBack],
            Some(Overlay::Warning { .. }) => {
                let mut effects = self.hide();
                effects.push(PageEffect::NavigateBack);
                effects
            }
            None => Vec::new(),
        }
    }

    /// Secondary overlay button: ask the coordinator for a grant on this
    /// page's host.
    pub fn request_grace(&mut self) -> Vec<PageEffect> {
        if self.overlay.is_none() {
            return Vec::new();
        }
        let mut effects = self.hide();
        if let Some(site) = host_from_url(&self.url) {
            effects.push(PageEffect::SendToCore(Request::GrantTempAccess {
                site,
                minutes: None,
            }));
        }
        effects
    }

    /// The coordinator answered a grant request.
    pub fn on_grant_response(&mut self, ack: Ack, now_ms: u64) {
        if ack.success {
            self.grant_grace(now_ms);
        }
    }

    /// Record a local grace token mirroring the coordinator's grant.
    pub fn grant_grace(&mut self, now_ms: u64) {
        let ms = self.timings.grace_minutes.saturating_mul(60_000);
        self.grace_until = Some(now_ms.saturating_add(ms));
    }

    /// Close button: hide without a grant.
    pub fn close_overlay(&mut self) -> Vec<PageEffect> {
        self.hide()
    }

    /// The warning takes over an open focus overlay; a warning already on
    /// screen stays as it is.
    fn show_warning(&mut self, site: &str, time_spent_secs: u64) -> Vec<PageEffect> {
        if !self.settings.extension_enabled {
            debug!(site, "warning ignored while disabled");
            return Vec::new();
        }
        let mut effects = match self.overlay {
            Some(Overlay::Focus) => self.hide(),
            _ => Vec::new(),
        };
        effects.extend(self.show(Overlay::Warning {
            site: site.to_string(),
            time_spent_secs,
        }));
        effects
    }

    fn show(&mut self, overlay: Overlay) -> Vec<PageEffect> {
        if self.overlay.is_some() {
            return Vec::new();
        }
        self.overlay = Some(overlay.clone());
        vec![PageEffect::ShowOverlay(overlay)]
    }

    fn hide(&mut self) -> Vec<PageEffect> {
        match self.overlay.take() {
            Some(_) => vec![PageEffect::HideOverlay],
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::BUILTIN_SITES;
    use serde_json::json;

    const T0: u64 = 1_700_000_000_000;

    fn monitor(url: &str) -> PageMonitor {
        PageMonitor::new(
            url,
            BlockList::new(BUILTIN_SITES),
            Settings::default(),
            PageConfig::default(),
        )
    }

    #[test]
    fn load_on_distracting_page_shows_focus_overlay_and_rechecks() {
        let mut page = monitor("https://www.youtube.com/watch?v=1");
        let effects = page.on_load(T0);
        assert_eq!(
            effects,
            vec![
                PageEffect::ShowOverlay(Overlay::Focus),
                PageEffect::ScheduleCheck { delay_ms: 2000 }
            ]
        );
        // The delayed check finds the flag set and does nothing.
        assert!(page.check_current_site(T0 + 2000).is_empty());
    }

    #[test]
    fn load_on_neutral_page_does_nothing() {
        let mut page = monitor("https://docs.rs/");
        assert_eq!(
            page.on_load(T0),
            vec![PageEffect::ScheduleCheck { delay_ms: 2000 }]
        );
        assert!(page.overlay().is_none());
    }

    #[test]
    fn disabled_extension_never_shows_overlay() {
        let settings = Settings {
            extension_enabled: false,
            ..Settings::default()
        };
        let mut page = PageMonitor::new(
            "https://reddit.com/",
            BlockList::new(BUILTIN_SITES),
            settings,
            PageConfig::default(),
        );
        assert!(page.check_current_site(T0).is_empty());
    }

    #[test]
    fn grace_request_then_response_suppresses_recheck() {
        let mut page = monitor("https://www.reddit.com/r/rust");
        page.on_load(T0);

        let effects = page.request_grace();
        assert_eq!(
            effects,
            vec![
                PageEffect::HideOverlay,
                PageEffect::SendToCore(Request::GrantTempAccess {
                    site: "reddit.com".into(),
                    minutes: None
                })
            ]
        );
        page.on_grant_response(Ack::OK, T0 + 10);

        // Navigating within the site re-arms the check but grace holds.
        page.observe_url(UrlSource::HistoryCall, "https://www.reddit.com/r/golang");
        assert!(page.check_current_site(T0 + 1_000).is_empty());

        // After five minutes the overlay comes back.
        page.observe_url(UrlSource::Poll, "https://www.reddit.com/r/python");
        assert_eq!(
            page.check_current_site(T0 + 10 + 5 * 60_000),
            vec![PageEffect::ShowOverlay(Overlay::Focus)]
        );
    }

    #[test]
    fn failed_grant_response_records_nothing() {
        let mut page = monitor("https://x.com/home");
        page.on_grant_response(Ack::FAILED, T0);
        assert!(!page.has_grace(T0));
    }

    #[test]
    fn url_change_resets_page_view_flag() {
        let mut page = monitor("https://youtube.com/watch?v=1");
        page.on_load(T0);
        page.close_overlay();
        assert!(page.initial_overlay_shown());

        let effects = page.observe_url(UrlSource::DomMutation, "https://youtube.com/watch?v=2");
        assert_eq!(effects, vec![PageEffect::ScheduleCheck { delay_ms: 500 }]);
        assert!(!page.initial_overlay_shown());
        assert_eq!(
            page.check_current_site(T0 + 600),
            vec![PageEffect::ShowOverlay(Overlay::Focus)]
        );
    }

    #[test]
    fn extension_disabled_message_hides_overlay() {
        let mut page = monitor("https://twitch.tv/");
        page.on_load(T0);
        let message = PageMessage::SettingChanged {
            setting: "extensionEnabled".into(),
            value: json!(false),
        };
        let (ack, effects) = page.handle_message(&message, T0);
        assert!(ack.success);
        assert_eq!(effects, vec![PageEffect::HideOverlay]);
        assert!(!page.settings().extension_enabled);
    }

    #[test]
    fn warning_message_shows_elapsed_time() {
        let mut page = monitor("https://youtube.com/");
        let message = PageMessage::ShowFiveMinuteWarning {
            site: "youtube.com".into(),
            time_spent: 305,
        };
        let (_, effects) = page.handle_message(&message, T0);
        let Some(PageEffect::ShowOverlay(overlay)) = effects.first() else {
            panic!("expected overlay, got {effects:?}");
        };
        assert_eq!(
            overlay.message(),
            "You've been on youtube.com for 5m 5s. Time to refocus!"
        );

        let effects = page.stay_focused();
        assert_eq!(effects, vec![PageEffect::HideOverlay, PageEffect::NavigateBack]);
    }

    #[test]
    fn warning_replaces_open_focus_overlay() {
        let mut page = monitor("https://youtube.com/");
        page.on_load(T0);
        let warning = PageMessage::ShowFiveMinuteWarning {
            site: "youtube.com".into(),
            time_spent: 300,
        };
        let (ack, effects) = page.handle_message(&warning, T0 + 300_000);
        assert!(ack.success);
        let expected = Overlay::Warning {
            site: "youtube.com".into(),
            time_spent_secs: 300,
        };
        assert_eq!(
            effects,
            vec![PageEffect::HideOverlay, PageEffect::ShowOverlay(expected.clone())]
        );
        assert_eq!(page.overlay(), Some(&expected));

        // A repeated warning leaves the one on screen alone.
        let (_, again) = page.handle_message(&warning, T0 + 301_000);
        assert!(again.is_empty());
    }

    #[test]
    fn warning_is_ignored_while_disabled() {
        let settings = Settings {
            extension_enabled: false,
            ..Settings::default()
        };
        let mut page = PageMonitor::new(
            "https://youtube.com/",
            BlockList::new(BUILTIN_SITES),
            settings,
            PageConfig::default(),
        );
        let warning = PageMessage::ShowFiveMinuteWarning {
            site: "youtube.com".into(),
            time_spent: 300,
        };
        let (ack, effects) = page.handle_message(&warning, T0);
        assert!(ack.success);
        assert!(effects.is_empty());
        assert!(page.overlay().is_none());
    }

    #[test]
    fn reminder_respects_open_overlay_and_grace() {
        let mut page = monitor("https://youtube.com/");
        let reminder = PageMessage::ShowFocusReminder {
            site: "youtube.com".into(),
        };
        let (_, first) = page.handle_message(&reminder, T0);
        assert_eq!(first.len(), 1);
        let (_, second) = page.handle_message(&reminder, T0);
        assert!(second.is_empty());

        let (_, granted) = page.handle_message(&PageMessage::TempAccessGranted, T0);
        assert_eq!(granted, vec![PageEffect::HideOverlay]);
        let (_, third) = page.handle_message(&reminder, T0 + 1);
        assert!(third.is_empty());
    }

    #[test]
    fn unknown_message_fails() {
        let mut page = monitor("https://docs.rs/");
        let (ack, effects) = page.handle_message(&PageMessage::Unknown, T0);
        assert!(!ack.success);
        assert!(effects.is_empty());
    }
}
