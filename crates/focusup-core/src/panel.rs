//! Control panel view model.
//!
//! Owns no state of its own: it mirrors what the coordinator and the store
//! report and turns user input into requests.

use tracing::warn;

use crate::error::{CoreError, HostError};
use crate::protocol::{Broadcast, Request, Response, TimerSnapshot};
use crate::site::normalize_host;
use crate::storage::{keys, load_json, save_json, KeyValueStore, Scope, SettingKey, Settings};
use crate::timer::DEFAULT_DURATION_SECS;

/// Request channel to the coordinator.
#[allow(async_fn_in_trait)]
pub trait CoreClient {
    async fn request(&self, request: &Request) -> Result<Option<Response>, HostError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlPanel {
    timer: TimerSnapshot,
    blocked_count: u64,
    focus_streak: u64,
    settings: Settings,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            timer: TimerSnapshot {
                remaining_seconds: DEFAULT_DURATION_SECS,
                is_running: false,
                is_paused: false,
            },
            blocked_count: 0,
            focus_streak: 0,
            settings: Settings::default(),
        }
    }
}

impl ControlPanel {
    /// Fetch the timer snapshot, counters and settings. Anything that
    /// cannot be read keeps its default.
    pub async fn open<S: KeyValueStore, C: CoreClient>(store: &S, client: &C) -> Self {
        let mut panel = Self::default();

        match client.request(&Request::GetTimerState).await {
            Ok(Some(Response::TimerState(snapshot))) => panel.timer = snapshot,
            Ok(other) => warn!(response = ?other, "unexpected timer state response"),
            Err(e) => warn!(error = %e, "failed to fetch timer state"),
        }
        match load_json::<u64, _>(store, Scope::Sync, keys::BLOCKED_COUNT).await {
            Ok(count) => panel.blocked_count = count.unwrap_or(0),
            Err(e) => warn!(error = %e, "failed to read blocked count"),
        }
        match load_json::<u64, _>(store, Scope::Sync, keys::FOCUS_STREAK).await {
            Ok(minutes) => panel.focus_streak = minutes.unwrap_or(0),
            Err(e) => warn!(error = %e, "failed to read focus streak"),
        }
        match Settings::load(store).await {
            Ok(settings) => panel.settings = settings,
            Err(e) => warn!(error = %e, "failed to read settings"),
        }
        panel
    }

    pub fn timer(&self) -> TimerSnapshot {
        self.timer
    }

    pub fn blocked_count(&self) -> u64 {
        self.blocked_count
    }

    pub fn focus_streak(&self) -> u64 {
        self.focus_streak
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Keep the view live from coordinator broadcasts.
    pub fn apply(&mut self, broadcast: &Broadcast) {
        match broadcast {
            Broadcast::TimerUpdate(snapshot) | Broadcast::TimerCompleted(snapshot) => {
                self.timer = *snapshot;
            }
            Broadcast::UpdateBlockedCount { count } => self.blocked_count = *count,
        }
    }

    /// Start button: start when idle, resume when paused.
    pub fn start_command(&self) -> Option<Request> {
        match (self.timer.is_running, self.timer.is_paused) {
            (false, _) => Some(Request::StartTimer),
            (true, true) => Some(Request::PauseTimer),
            (true, false) => None,
        }
    }

    pub fn pause_command(&self) -> Option<Request> {
        (self.timer.is_running && !self.timer.is_paused).then_some(Request::PauseTimer)
    }

    pub fn reset_command(&self) -> Request {
        Request::ResetTimer
    }

    /// Flip a boolean setting in the store and return the change to send.
    pub async fn toggle_setting<S: KeyValueStore>(
        &mut self,
        store: &S,
        key: SettingKey,
    ) -> Result<Request, CoreError> {
        if !key.is_toggle() {
            return Err(CoreError::Custom(format!("{key} is not a toggle")));
        }
        let flipped = !self.settings.value(key).as_bool().unwrap_or(false);
        save_json(store, Scope::Sync, key.as_str(), &flipped).await?;
        self.settings.apply(key, &serde_json::Value::Bool(flipped));

        if key == SettingKey::ExtensionEnabled {
            return Ok(Request::ExtensionToggled { enabled: flipped });
        }
        Ok(Request::SettingChanged {
            setting: key.as_str().to_string(),
            value: serde_json::Value::Bool(flipped),
        })
    }

    /// Convenience for the master switch.
    pub async fn toggle_extension<S: KeyValueStore>(&mut self, store: &S) -> Result<Request, CoreError> {
        self.toggle_setting(store, SettingKey::ExtensionEnabled).await
    }

    /// Append a site to the custom block list.
    pub async fn add_custom_site<S: KeyValueStore>(
        &mut self,
        store: &S,
        site: &str,
    ) -> Result<Request, CoreError> {
        let host = normalize_host(site);
        if host.is_empty() {
            return Err(CoreError::Custom("site must not be empty".to_string()));
        }
        if !self.settings.custom_sites.contains(&host) {
            self.settings.custom_sites.push(host);
        }
        save_json(store, Scope::Sync, keys::CUSTOM_SITES, &self.settings.custom_sites).await?;
        Ok(Request::SettingChanged {
            setting: keys::CUSTOM_SITES.to_string(),
            value: self.settings.value(SettingKey::CustomSites),
        })
    }

    /// Remaining time as `MM:SS`.
    pub fn timer_display(&self) -> String {
        let secs = self.timer.remaining_seconds;
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }

    pub fn status_label(&self) -> &'static str {
        match (self.timer.is_running, self.timer.is_paused) {
            (true, false) => "Focus Time Active",
            (true, true) => "Timer Paused",
            (false, _) => "Pomodoro Timer",
        }
    }
}
