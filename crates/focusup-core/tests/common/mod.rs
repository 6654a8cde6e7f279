#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use focusup_core::error::HostError;
use focusup_core::host::{Messenger, Notifier, Scheduler, Tabs};
use focusup_core::{
    Ack, AlarmSpec, Broadcast, Coordinator, CoordinatorConfig, MemoryStore, Notification,
    PageMessage, Tab, TabId,
};

pub const T0: u64 = 1_700_000_000_000;
pub const MINUTE: u64 = 60_000;

/// Records everything the coordinator asks of the browser.
#[derive(Default)]
pub struct FakeHost {
    pub tabs: RefCell<HashMap<TabId, String>>,
    pub active_tab: Cell<Option<TabId>>,
    pub notifications: RefCell<Vec<(String, Notification)>>,
    pub cleared: RefCell<Vec<String>>,
    pub broadcasts: RefCell<Vec<Broadcast>>,
    pub tab_messages: RefCell<Vec<(TabId, PageMessage)>>,
    pub page_messages: RefCell<Vec<PageMessage>>,
    pub alarms: RefCell<Vec<AlarmSpec>>,
    pub navigations: RefCell<Vec<(TabId, String)>>,
    pub went_back: RefCell<Vec<TabId>>,
    /// Simulate pages and panels that are not listening.
    pub no_receivers: Cell<bool>,
}

impl FakeHost {
    pub fn open_tab(&self, tab_id: TabId, url: &str) {
        self.tabs.borrow_mut().insert(tab_id, url.to_string());
        self.active_tab.set(Some(tab_id));
    }

    pub fn notification_count(&self) -> usize {
        self.notifications.borrow().len()
    }

    pub fn last_notification(&self) -> Option<(String, Notification)> {
        self.notifications.borrow().last().cloned()
    }

    pub fn notifications_titled(&self, title: &str) -> usize {
        self.notifications
            .borrow()
            .iter()
            .filter(|(_, n)| n.title == title)
            .count()
    }

    fn deliver(&self) -> Result<(), HostError> {
        if self.no_receivers.get() {
            Err(HostError::NoReceiver)
        } else {
            Ok(())
        }
    }
}

impl Notifier for FakeHost {
    async fn notify(&self, id: &str, notification: &Notification) -> Result<(), HostError> {
        self.notifications
            .borrow_mut()
            .push((id.to_string(), notification.clone()));
        Ok(())
    }

    async fn clear(&self, id: &str) -> Result<(), HostError> {
        self.cleared.borrow_mut().push(id.to_string());
        Ok(())
    }
}

impl Tabs for FakeHost {
    async fn get(&self, tab_id: TabId) -> Result<Option<Tab>, HostError> {
        Ok(self.tabs.borrow().get(&tab_id).map(|url| Tab {
            id: tab_id,
            url: url.clone(),
        }))
    }

    async fn active(&self) -> Result<Option<Tab>, HostError> {
        match self.active_tab.get() {
            Some(id) => self.get(id).await,
            None => Ok(None),
        }
    }

    async fn navigate(&self, tab_id: TabId, url: &str) -> Result<(), HostError> {
        self.navigations.borrow_mut().push((tab_id, url.to_string()));
        Ok(())
    }

    async fn go_back(&self, tab_id: TabId) -> Result<(), HostError> {
        self.went_back.borrow_mut().push(tab_id);
        Ok(())
    }
}

impl Messenger for FakeHost {
    async fn broadcast(&self, message: &Broadcast) -> Result<(), HostError> {
        self.deliver()?;
        self.broadcasts.borrow_mut().push(*message);
        Ok(())
    }

    async fn send_to_tab(&self, tab_id: TabId, message: &PageMessage) -> Result<Ack, HostError> {
        self.deliver()?;
        self.tab_messages.borrow_mut().push((tab_id, message.clone()));
        Ok(Ack::OK)
    }

    async fn send_to_pages(&self, message: &PageMessage) -> Result<(), HostError> {
        self.deliver()?;
        self.page_messages.borrow_mut().push(message.clone());
        Ok(())
    }
}

impl Scheduler for FakeHost {
    async fn schedule(&self, spec: AlarmSpec) -> Result<(), HostError> {
        self.alarms.borrow_mut().push(spec);
        Ok(())
    }
}

pub type TestCoordinator = Coordinator<MemoryStore, FakeHost>;

pub async fn coordinator() -> TestCoordinator {
    coordinator_with(MemoryStore::new()).await
}

pub async fn coordinator_with(store: MemoryStore) -> TestCoordinator {
    let mut coordinator = Coordinator::new(store, FakeHost::default(), CoordinatorConfig::default());
    coordinator.load(T0).await;
    coordinator
}
