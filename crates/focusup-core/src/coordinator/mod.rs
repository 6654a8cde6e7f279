//! Background coordinator.
//!
//! Owns the canonical state (timer, site tracking, daily counters) and
//! reacts to tab events, scheduler alarms and requests from the control
//! panel and pages. The host may suspend the process between any two
//! events, so every mutation is persisted right away and every
//! time-dependent value is recomputed from stored timestamps.
//!
//! No entry point returns an error: failures are logged and the affected
//! operation is skipped until the next event or tick re-attempts it.

mod navigation;
mod timer;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::counters::{self, DailyCounters, DAY_MS};
use crate::error::{HostError, StoreError};
use crate::host::{Alarm, AlarmSpec, BrowserHost, Notification};
use crate::protocol::{PageMessage, Request, Response};
use crate::site::{normalize_host, BlockList, NudgeGatekeeper, SiteTracking, BUILTIN_SITES};
use crate::storage::{
    keys, load_json, save_json, Config, KeyValueStore, Scope, SettingKey, Settings,
};
use crate::timer::{FocusTimer, DEFAULT_DURATION_SECS};

/// Extension page shown instead of a distracting site in strict mode.
pub const FOCUS_PAGE_URL: &str = "focus.html";

/// Runtime knobs of the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    pub default_duration_secs: u64,
    pub tick_interval_ms: u64,
    pub warning_threshold_ms: u64,
    pub check_interval_ms: u64,
    pub cooldown_ms: u64,
    pub grant_minutes: u64,
    pub builtin_sites: Vec<String>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            default_duration_secs: DEFAULT_DURATION_SECS,
            tick_interval_ms: 1_000,
            warning_threshold_ms: 5 * 60 * 1000,
            check_interval_ms: 30_000,
            cooldown_ms: 30_000,
            grant_minutes: 5,
            builtin_sites: BUILTIN_SITES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl From<&Config> for CoordinatorConfig {
    fn from(config: &Config) -> Self {
        Self {
            default_duration_secs: config.timer.default_duration_secs.max(1),
            tick_interval_ms: config.timer.tick_interval_secs.max(1) * 1000,
            warning_threshold_ms: config.tracking.warning_threshold_secs * 1000,
            check_interval_ms: config.tracking.check_interval_secs.max(1) * 1000,
            cooldown_ms: config.nudge.cooldown_secs * 1000,
            grant_minutes: config.grant.default_minutes,
            builtin_sites: config.blocklist.builtin.clone(),
        }
    }
}

pub struct Coordinator<S, H> {
    store: S,
    host: H,
    config: CoordinatorConfig,
    blocklist: BlockList,
    tracking: SiteTracking,
    timer: FocusTimer,
    counters: DailyCounters,
    gatekeeper: NudgeGatekeeper,
}

impl<S, H> Coordinator<S, H>
where
    S: KeyValueStore,
    H: BrowserHost,
{
    /// Create a coordinator with in-memory defaults. Call [`load`] before
    /// feeding it events.
    ///
    /// [`load`]: Coordinator::load
    pub fn new(store: S, host: H, config: CoordinatorConfig) -> Self {
        Self {
            blocklist: BlockList::new(&config.builtin_sites),
            timer: FocusTimer::new(config.default_duration_secs),
            gatekeeper: NudgeGatekeeper::with_cooldown(config.cooldown_ms),
            tracking: SiteTracking::new(),
            counters: DailyCounters::default(),
            store,
            host,
            config,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn blocklist(&self) -> &BlockList {
        &self.blocklist
    }

    pub fn tracking(&self) -> &SiteTracking {
        &self.tracking
    }

    pub fn timer(&self) -> &FocusTimer {
        &self.timer
    }

    pub fn counters(&self) -> DailyCounters {
        self.counters
    }

    pub fn gatekeeper(&self) -> &NudgeGatekeeper {
        &self.gatekeeper
    }

    /// Whether `host` is currently distracting (matches the block list and
    /// has no valid grant).
    pub fn is_distracting(&self, host: &str, now_ms: u64) -> bool {
        self.blocklist.is_distracting(host) && !self.tracking.has_valid_grant(host, now_ms)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Rehydrate everything from the durable store and fast-forward the
    /// timer to `now`.
    pub async fn load(&mut self, now_ms: u64) {
        match Settings::load(&self.store).await {
            Ok(settings) => self.blocklist.set_custom(&settings.custom_sites),
            Err(e) => warn!(error = %e, "failed to load settings"),
        }

        match load_json::<u64, _>(&self.store, Scope::Sync, keys::BLOCKED_COUNT).await {
            Ok(count) => self.counters.blocked_today = count.unwrap_or(0),
            Err(e) => warn!(error = %e, "failed to load blocked count"),
        }
        match load_json::<u64, _>(&self.store, Scope::Sync, keys::FOCUS_STREAK).await {
            Ok(minutes) => self.counters.focus_streak_minutes = minutes.unwrap_or(0),
            Err(e) => warn!(error = %e, "failed to load focus streak"),
        }

        match load_json::<SiteTracking, _>(&self.store, Scope::Local, keys::SITE_TRACKING).await {
            Ok(Some(mut tracking)) => {
                tracking.prune_expired(now_ms);
                self.tracking = tracking;
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "failed to load site tracking"),
        }

        match load_json::<u64, _>(&self.store, Scope::Local, keys::LAST_NUDGE_AT).await {
            Ok(last) => self.gatekeeper.restore(last),
            Err(e) => warn!(error = %e, "failed to load nudge cooldown"),
        }

        match load_json::<FocusTimer, _>(&self.store, Scope::Local, keys::TIMER_STATE).await {
            Ok(Some(stored)) => {
                let (timer, event) =
                    FocusTimer::restore(stored, self.config.default_duration_secs, now_ms);
                self.timer = timer;
                debug!(remaining_secs = self.timer.remaining_seconds(), "timer rehydrated");
                if let Some(event) = event {
                    self.apply_timer_event(event).await;
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "failed to load timer state"),
        }

        self.catch_up_daily_reset(now_ms).await;
    }

    /// Register the periodic alarms with the host scheduler.
    pub async fn install_alarms(&self, now_ms: u64) {
        let specs = [
            AlarmSpec {
                alarm: Alarm::TimerTick,
                when_ms: now_ms,
                period_ms: Some(self.config.tick_interval_ms),
            },
            AlarmSpec {
                alarm: Alarm::SiteTrackingCheck,
                when_ms: now_ms,
                period_ms: Some(self.config.check_interval_ms),
            },
            AlarmSpec {
                alarm: Alarm::ResetDaily,
                when_ms: counters::next_local_midnight(now_ms),
                period_ms: Some(DAY_MS),
            },
        ];
        for spec in specs {
            if let Err(e) = self.host.schedule(spec).await {
                warn!(alarm = spec.alarm.name(), error = %e, "failed to schedule alarm");
            }
        }
    }

    /// Scheduler wake-up. Alarms may arrive late, early or coalesced.
    pub async fn on_alarm(&mut self, alarm: Alarm, now_ms: u64) {
        match alarm {
            Alarm::TimerTick => self.timer_tick(now_ms).await,
            Alarm::SiteTrackingCheck => self.check_site_time_limit(now_ms).await,
            Alarm::ResetDaily => self.reset_daily(now_ms).await,
            Alarm::BreakOver => {
                let notification = Notification::basic(
                    "Break Over!",
                    "Time to get back to focused work. You got this!",
                );
                self.notify_info(&notification).await;
            }
        }
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// Answer a request. `None` means the action takes no response.
    pub async fn handle_request(&mut self, request: Request, now_ms: u64) -> Option<Response> {
        match request {
            Request::GetTimerState => {
                self.timer_tick(now_ms).await;
                Some(Response::TimerState(self.timer.snapshot()))
            }
            Request::StartTimer => {
                self.start_timer(now_ms).await;
                Some(Response::ok())
            }
            Request::PauseTimer => {
                self.pause_timer(now_ms).await;
                Some(Response::ok())
            }
            Request::ResetTimer => {
                self.reset_timer(now_ms).await;
                Some(Response::ok())
            }
            Request::GrantTempAccess { site, minutes } => {
                let minutes = minutes.unwrap_or(self.config.grant_minutes);
                match self.grant_temporary_access(&site, minutes, now_ms).await {
                    Some(_) => Some(Response::ok()),
                    None => Some(Response::failed()),
                }
            }
            Request::SettingChanged { setting, value } => {
                self.setting_changed(&setting, value).await;
                None
            }
            Request::ExtensionToggled { enabled } => {
                info!(enabled, "extension toggled");
                self.setting_changed(SettingKey::ExtensionEnabled.as_str(), Value::Bool(enabled))
                    .await;
                None
            }
            Request::Unknown => {
                warn!("unknown request action");
                Some(Response::failed())
            }
        }
    }

    /// Decode and answer a raw JSON request. Malformed input is answered
    /// with a failure instead of an error.
    pub async fn handle_json(&mut self, raw: &str, now_ms: u64) -> Option<Response> {
        match serde_json::from_str::<Request>(raw) {
            Ok(request) => self.handle_request(request, now_ms).await,
            Err(e) => {
                warn!(error = %e, "malformed request");
                Some(Response::failed())
            }
        }
    }

    async fn setting_changed(&mut self, setting: &str, value: Value) {
        info!(setting, %value, "setting changed");
        match setting.parse::<SettingKey>() {
            Ok(SettingKey::CustomSites) => {
                let mut settings = Settings::default();
                if settings.apply(SettingKey::CustomSites, &value) {
                    self.blocklist.set_custom(&settings.custom_sites);
                }
            }
            Ok(_) => {}
            Err(e) => debug!(error = %e, "relaying unrecognized setting"),
        }
        let message = PageMessage::SettingChanged {
            setting: setting.to_string(),
            value,
        };
        report_delivery("setting relay", self.host.send_to_pages(&message).await);
    }

    // ── Daily counters ───────────────────────────────────────────────

    /// Zero the daily counters.
    pub async fn reset_daily(&mut self, now_ms: u64) {
        self.counters.reset();
        self.persist_counters().await;
        if let Some(today) = counters::local_date(now_ms) {
            self.persist(Scope::Local, keys::LAST_DAILY_RESET, &today.to_string())
                .await;
        }
        info!("daily stats reset");
        self.broadcast_blocked_count().await;
    }

    /// Reset counters if a midnight passed while the process was away.
    async fn catch_up_daily_reset(&mut self, now_ms: u64) {
        let Some(today) = counters::local_date(now_ms) else {
            return;
        };
        match load_json::<String, _>(&self.store, Scope::Local, keys::LAST_DAILY_RESET).await {
            Ok(Some(last)) if last == today.to_string() => {}
            Ok(Some(last)) => {
                debug!(%last, %today, "missed daily reset");
                self.reset_daily(now_ms).await;
            }
            Ok(None) => {
                self.persist(Scope::Local, keys::LAST_DAILY_RESET, &today.to_string())
                    .await;
            }
            Err(e) => warn!(error = %e, "failed to read last daily reset"),
        }
    }

    async fn broadcast_blocked_count(&self) {
        let message = crate::protocol::Broadcast::UpdateBlockedCount {
            count: self.counters.blocked_today,
        };
        report_delivery("blocked count", self.host.broadcast(&message).await);
    }

    // ── Persistence ──────────────────────────────────────────────────

    async fn persist<T: serde::Serialize + ?Sized>(&self, scope: Scope, key: &str, value: &T) {
        if let Err(e) = save_json(&self.store, scope, key, value).await {
            report_store_failure(key, &e);
        }
    }

    async fn persist_timer(&self) {
        self.persist(Scope::Local, keys::TIMER_STATE, &self.timer).await;
    }

    async fn persist_tracking(&self) {
        self.persist(Scope::Local, keys::SITE_TRACKING, &self.tracking)
            .await;
    }

    async fn persist_counters(&self) {
        self.persist(Scope::Sync, keys::BLOCKED_COUNT, &self.counters.blocked_today)
            .await;
        self.persist(
            Scope::Sync,
            keys::FOCUS_STREAK,
            &self.counters.focus_streak_minutes,
        )
        .await;
    }

    async fn notify_info(&self, notification: &Notification) {
        let id = format!("focusup-info-{}", uuid::Uuid::new_v4());
        report_delivery("notification", self.host.notify(&id, notification).await);
    }
}

fn report_store_failure(key: &str, err: &StoreError) {
    warn!(key, error = %err, "store write failed; skipping until next event");
}

/// Log a delivery result. A missing receiver is expected and not an error.
fn report_delivery(what: &str, result: Result<(), HostError>) {
    match result {
        Ok(()) => {}
        Err(e) if e.is_no_receiver() => debug!(what, "no receiver"),
        Err(e) => warn!(what, error = %e, "delivery failed"),
    }
}

/// Normalized grant key; `None` for an empty site.
fn grant_host(site: &str) -> Option<String> {
    let host = normalize_host(site);
    (!host.is_empty()).then_some(host)
}
