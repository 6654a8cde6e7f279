//! Message protocol between the coordinator, the pages and the control panel.
//!
//! Every direction has its own closed enum, tagged by the `action` field on
//! the wire. Unrecognized actions decode to an explicit `Unknown` variant
//! instead of failing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Timer state as seen by the control panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub remaining_seconds: u64,
    pub is_running: bool,
    pub is_paused: bool,
}

/// Requests sent to the coordinator by the control panel or a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    GetTimerState,
    StartTimer,
    PauseTimer,
    ResetTimer,
    GrantTempAccess {
        site: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minutes: Option<u64>,
    },
    SettingChanged {
        setting: String,
        value: Value,
    },
    ExtensionToggled {
        enabled: bool,
    },
    #[serde(other)]
    Unknown,
}

impl Request {
    pub fn action(&self) -> &'static str {
        match self {
            Request::GetTimerState => "getTimerState",
            Request::StartTimer => "startTimer",
            Request::PauseTimer => "pauseTimer",
            Request::ResetTimer => "resetTimer",
            Request::GrantTempAccess { .. } => "grantTempAccess",
            Request::SettingChanged { .. } => "settingChanged",
            Request::ExtensionToggled { .. } => "extensionToggled",
            Request::Unknown => "unknown",
        }
    }
}

/// Plain acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    pub const OK: Ack = Ack { success: true };
    pub const FAILED: Ack = Ack { success: false };
}

/// Coordinator answers. Notifications-only requests get no response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    TimerState(TimerSnapshot),
    Ack(Ack),
}

impl Response {
    pub fn ok() -> Self {
        Response::Ack(Ack::OK)
    }

    pub fn failed() -> Self {
        Response::Ack(Ack::FAILED)
    }
}

/// One-way broadcasts from the coordinator to any open control panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Broadcast {
    TimerUpdate(TimerSnapshot),
    TimerCompleted(TimerSnapshot),
    UpdateBlockedCount { count: u64 },
}

/// Messages from the coordinator to a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum PageMessage {
    ShowFocusReminder {
        site: String,
    },
    #[serde(rename = "show5MinuteWarning")]
    ShowFiveMinuteWarning {
        site: String,
        /// Seconds spent on the site.
        #[serde(rename = "timeSpent", default)]
        time_spent: u64,
    },
    SettingChanged {
        setting: String,
        value: Value,
    },
    TempAccessGranted,
    #[serde(other)]
    Unknown,
}
