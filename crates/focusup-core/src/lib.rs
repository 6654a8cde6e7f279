//! # FocusUp Core Library
//!
//! Core logic for FocusUp, a focus assistant that nudges the user away from
//! distracting sites and runs a Pomodoro-style countdown. Every process of
//! the system (background coordinator, page monitor, control panel) is a
//! plain state machine here; the browser is reached only through the port
//! traits in [`host`] and [`storage`].
//!
//! ## Architecture
//!
//! - **Timer**: a wall-clock countdown that derives remaining time from a
//!   stored start timestamp, so it survives process suspension
//! - **Site**: host normalization, block list matching, site tracking,
//!   temporary grants and the nudge cooldown
//! - **Coordinator**: owns the canonical state and reacts to tab events,
//!   alarms and requests
//! - **Page / Panel**: the in-page guard and the control panel view model
//! - **Storage**: key-value store port with SQLite and in-memory backends,
//!   plus TOML configuration
//!
//! ## Key Components
//!
//! - [`FocusTimer`]: countdown state machine
//! - [`Coordinator`]: background event handler
//! - [`PageMonitor`]: per-page overlay logic
//! - [`Database`]: SQLite-backed [`KeyValueStore`]
//! - [`Config`]: application configuration

pub mod coordinator;
pub mod counters;
pub mod error;
pub mod events;
pub mod host;
pub mod page;
pub mod panel;
pub mod protocol;
pub mod site;
pub mod storage;
pub mod timer;

pub use coordinator::{Coordinator, CoordinatorConfig, FOCUS_PAGE_URL};
pub use counters::DailyCounters;
pub use error::{ConfigError, CoreError, HostError, StoreError};
pub use events::TimerEvent;
pub use host::{Alarm, AlarmSpec, BrowserHost, Notification, Tab, TabId};
pub use page::{Overlay, PageEffect, PageMonitor, UrlSource};
pub use panel::{ControlPanel, CoreClient};
pub use protocol::{Ack, Broadcast, PageMessage, Request, Response, TimerSnapshot};
pub use site::{BlockList, SiteTracking};
pub use storage::{Config, Database, KeyValueStore, MemoryStore, Scope, Settings};
pub use timer::{FocusTimer, TimerState};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
