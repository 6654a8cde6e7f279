//! Browser host for the command line.
//!
//! One-shot commands have no pages or panel listening, so messages report
//! `NoReceiver` and notifications are printed. The daemon writes every
//! outbound message as a JSON line on stdout for the embedding browser.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use focusup_core::error::HostError;
use focusup_core::host::{Messenger, Notifier, Scheduler, Tabs};
use focusup_core::{Ack, AlarmSpec, Broadcast, Notification, PageMessage, Tab, TabId};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Human,
    JsonLines,
}

/// Outbound message in daemon mode.
#[derive(Serialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
enum Outbound<'a> {
    Notification {
        id: &'a str,
        title: &'a str,
        message: &'a str,
        buttons: &'a [String],
    },
    ClearNotification {
        id: &'a str,
    },
    Navigate {
        tab_id: TabId,
        url: &'a str,
    },
    GoBack {
        tab_id: TabId,
    },
    Broadcast {
        message: &'a Broadcast,
    },
    PageMessage {
        #[serde(skip_serializing_if = "Option::is_none")]
        tab_id: Option<TabId>,
        message: &'a PageMessage,
    },
}

pub struct CliHost {
    output: Output,
    tabs: RefCell<BTreeMap<TabId, String>>,
    active: Cell<Option<TabId>>,
    scheduled: RefCell<Vec<AlarmSpec>>,
}

impl CliHost {
    pub fn new(output: Output) -> Self {
        Self {
            output,
            tabs: RefCell::new(BTreeMap::new()),
            active: Cell::new(None),
            scheduled: RefCell::new(Vec::new()),
        }
    }

    /// Record that `tab_id` shows `url` and is in front.
    pub fn open_tab(&self, tab_id: TabId, url: &str) {
        self.tabs.borrow_mut().insert(tab_id, url.to_string());
        self.active.set(Some(tab_id));
    }

    pub fn close_tab(&self, tab_id: TabId) {
        self.tabs.borrow_mut().remove(&tab_id);
        if self.active.get() == Some(tab_id) {
            self.active.set(None);
        }
    }

    /// Alarms registered since the last call.
    pub fn take_scheduled(&self) -> Vec<AlarmSpec> {
        std::mem::take(&mut *self.scheduled.borrow_mut())
    }

    fn emit(&self, outbound: &Outbound<'_>) -> Result<(), HostError> {
        match self.output {
            Output::JsonLines => {
                let line = serde_json::to_string(outbound)
                    .map_err(|e| HostError::Unavailable(e.to_string()))?;
                println!("{line}");
                Ok(())
            }
            Output::Human => Err(HostError::NoReceiver),
        }
    }
}

impl Notifier for CliHost {
    async fn notify(&self, id: &str, notification: &Notification) -> Result<(), HostError> {
        if self.output == Output::Human {
            println!("[{}] {}", notification.title, notification.message);
            if !notification.buttons.is_empty() {
                println!("  options: {}", notification.buttons.join(" | "));
            }
            return Ok(());
        }
        self.emit(&Outbound::Notification {
            id,
            title: &notification.title,
            message: &notification.message,
            buttons: &notification.buttons,
        })
    }

    async fn clear(&self, id: &str) -> Result<(), HostError> {
        match self.emit(&Outbound::ClearNotification { id }) {
            Err(e) if e.is_no_receiver() => Ok(()),
            other => other,
        }
    }
}

impl Tabs for CliHost {
    async fn get(&self, tab_id: TabId) -> Result<Option<Tab>, HostError> {
        Ok(self.tabs.borrow().get(&tab_id).map(|url| Tab {
            id: tab_id,
            url: url.clone(),
        }))
    }

    async fn active(&self) -> Result<Option<Tab>, HostError> {
        match self.active.get() {
            Some(tab_id) => self.get(tab_id).await,
            None => Ok(None),
        }
    }

    async fn navigate(&self, tab_id: TabId, url: &str) -> Result<(), HostError> {
        if self.output == Output::Human {
            println!("tab {tab_id} -> {url}");
        }
        self.tabs.borrow_mut().insert(tab_id, url.to_string());
        match self.emit(&Outbound::Navigate { tab_id, url }) {
            Err(e) if e.is_no_receiver() => Ok(()),
            other => other,
        }
    }

    async fn go_back(&self, tab_id: TabId) -> Result<(), HostError> {
        if !self.tabs.borrow().contains_key(&tab_id) {
            return Err(HostError::TabNotFound(tab_id));
        }
        self.emit(&Outbound::GoBack { tab_id })
    }
}

impl Messenger for CliHost {
    async fn broadcast(&self, message: &Broadcast) -> Result<(), HostError> {
        self.emit(&Outbound::Broadcast { message })
    }

    async fn send_to_tab(&self, tab_id: TabId, message: &PageMessage) -> Result<Ack, HostError> {
        self.emit(&Outbound::PageMessage {
            tab_id: Some(tab_id),
            message,
        })?;
        Ok(Ack::OK)
    }

    async fn send_to_pages(&self, message: &PageMessage) -> Result<(), HostError> {
        self.emit(&Outbound::PageMessage {
            tab_id: None,
            message,
        })
    }
}

impl Scheduler for CliHost {
    async fn schedule(&self, spec: AlarmSpec) -> Result<(), HostError> {
        debug!(alarm = spec.alarm.name(), when_ms = spec.when_ms, "alarm scheduled");
        self.scheduled.borrow_mut().push(spec);
        Ok(())
    }
}
