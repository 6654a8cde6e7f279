mod config;
pub mod database;
mod memory;
mod settings;

pub use config::{
    BlocklistConfig, Config, GrantConfig, NudgeConfig, PageConfig, TimerConfig, TrackingConfig,
};
pub use database::Database;
pub use memory::MemoryStore;
pub use settings::{SettingKey, Settings};

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, StoreError};

/// Storage scope. Synced values may be replicated by the host and are
/// eventually consistent; local values stay on this machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Sync,
    Local,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Sync => "sync",
            Scope::Local => "local",
        }
    }
}

/// Well-known store keys.
pub mod keys {
    // Synced scope.
    pub const BLOCKED_COUNT: &str = "blockedCount";
    pub const FOCUS_STREAK: &str = "focusStreak";
    pub const EXTENSION_ENABLED: &str = "extensionEnabled";
    pub const CUSTOM_SITES: &str = "customSites";
    pub const NOTIFICATIONS: &str = "notifications";
    pub const SOUND: &str = "sound";
    pub const STRICT_MODE: &str = "strictMode";

    // Local scope.
    pub const TIMER_STATE: &str = "timerState";
    pub const SITE_TRACKING: &str = "siteTracking";
    pub const LAST_DAILY_RESET: &str = "lastDailyReset";
    pub const LAST_NUDGE_AT: &str = "lastNudgeAt";
}

/// Durable key-value store with get/set semantics.
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
    async fn get(&self, scope: Scope, key: &str) -> Result<Option<Value>, StoreError>;

    async fn set(&self, scope: Scope, key: &str, value: Value) -> Result<(), StoreError>;
}

/// Read and decode a typed value. A value of the wrong shape is reported
/// as [`StoreError::Corrupt`].
pub async fn load_json<T, S>(store: &S, scope: Scope, key: &str) -> Result<Option<T>, StoreError>
where
    T: DeserializeOwned,
    S: KeyValueStore,
{
    match store.get(scope, key).await? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                key: key.to_string(),
                message: e.to_string(),
            }),
        None => Ok(None),
    }
}

/// Encode and write a typed value.
pub async fn save_json<T, S>(store: &S, scope: Scope, key: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore,
{
    let value = serde_json::to_value(value).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    store.set(scope, key, value).await
}

/// Returns `~/.config/focusup[-dev]/` based on FOCUSUP_ENV.
///
/// Set FOCUSUP_ENV=dev to use the development data directory, or
/// FOCUSUP_DATA_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("FOCUSUP_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSUP_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focusup-dev")
            } else {
                base_dir.join("focusup")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
