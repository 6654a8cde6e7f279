//! Ports to the browser host.
//!
//! The coordinator never talks to the browser directly; it goes through
//! these traits. Every call is asynchronous request/response with no retry.
//! `HostError::NoReceiver` means nobody was listening, which callers treat
//! as a normal outcome.

use serde::{Deserialize, Serialize};

use crate::error::HostError;
use crate::protocol::{Ack, Broadcast, PageMessage};

pub type TabId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    pub id: TabId,
    pub url: String,
}

/// A desktop notification with optional action buttons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<String>,
}

impl Notification {
    pub fn basic(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            buttons: Vec::new(),
        }
    }

    pub fn with_buttons<I, S>(mut self, buttons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.buttons = buttons.into_iter().map(Into::into).collect();
        self
    }
}

/// Named wake-ups delivered by the host scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Alarm {
    TimerTick,
    SiteTrackingCheck,
    ResetDaily,
    BreakOver,
}

impl Alarm {
    pub fn name(self) -> &'static str {
        match self {
            Alarm::TimerTick => "timerTick",
            Alarm::SiteTrackingCheck => "siteTrackingCheck",
            Alarm::ResetDaily => "resetDaily",
            Alarm::BreakOver => "breakOver",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "timerTick" => Some(Alarm::TimerTick),
            "siteTrackingCheck" => Some(Alarm::SiteTrackingCheck),
            "resetDaily" => Some(Alarm::ResetDaily),
            "breakOver" | "breakTime" => Some(Alarm::BreakOver),
            _ => None,
        }
    }
}

/// Registration of an alarm with the scheduler. One-shot when `period_ms`
/// is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmSpec {
    pub alarm: Alarm,
    /// First firing, epoch ms.
    pub when_ms: u64,
    #[serde(default)]
    pub period_ms: Option<u64>,
}

#[allow(async_fn_in_trait)]
pub trait Notifier {
    async fn notify(&self, id: &str, notification: &Notification) -> Result<(), HostError>;

    async fn clear(&self, id: &str) -> Result<(), HostError>;
}

#[allow(async_fn_in_trait)]
pub trait Tabs {
    async fn get(&self, tab_id: TabId) -> Result<Option<Tab>, HostError>;

    /// The active tab of the focused window.
    async fn active(&self) -> Result<Option<Tab>, HostError>;

    async fn navigate(&self, tab_id: TabId, url: &str) -> Result<(), HostError>;

    async fn go_back(&self, tab_id: TabId) -> Result<(), HostError>;
}

#[allow(async_fn_in_trait)]
pub trait Messenger {
    /// Fire-and-forget message to any open control panel.
    async fn broadcast(&self, message: &Broadcast) -> Result<(), HostError>;

    /// Message the page loaded in `tab_id`.
    async fn send_to_tab(&self, tab_id: TabId, message: &PageMessage) -> Result<Ack, HostError>;

    /// Message every page that has a listener.
    async fn send_to_pages(&self, message: &PageMessage) -> Result<(), HostError>;
}

#[allow(async_fn_in_trait)]
pub trait Scheduler {
    async fn schedule(&self, spec: AlarmSpec) -> Result<(), HostError>;
}

/// Everything the coordinator needs from the browser.
pub trait BrowserHost: Notifier + Tabs + Messenger + Scheduler {}

impl<T> BrowserHost for T where T: Notifier + Tabs + Messenger + Scheduler {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alarm_names_roundtrip() {
        for alarm in [
            Alarm::TimerTick,
            Alarm::SiteTrackingCheck,
            Alarm::ResetDaily,
            Alarm::BreakOver,
        ] {
            assert_eq!(Alarm::from_name(alarm.name()), Some(alarm));
        }
        assert_eq!(Alarm::from_name("breakTime"), Some(Alarm::BreakOver));
        assert_eq!(Alarm::from_name("nope"), None);
    }

    #[test]
    fn notification_builder() {
        let n = Notification::basic("Title", "Body").with_buttons(["A", "B"]);
        assert_eq!(n.buttons, vec!["A".to_string(), "B".to_string()]);
    }
}
