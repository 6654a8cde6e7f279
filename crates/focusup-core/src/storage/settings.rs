//! User settings kept in the synced scope of the durable store.
//!
//! Only an explicit `false` turns off `extensionEnabled` or
//! `notifications`; only an explicit `true` turns on `strictMode` or `sound`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{keys, KeyValueStore, Scope};
use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub extension_enabled: bool,
    pub notifications_enabled: bool,
    pub sound_enabled: bool,
    pub strict_mode: bool,
    pub custom_sites: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            extension_enabled: true,
            notifications_enabled: true,
            sound_enabled: false,
            strict_mode: false,
            custom_sites: Vec::new(),
        }
    }
}

/// Setting names as they appear on the wire and in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    ExtensionEnabled,
    Notifications,
    Sound,
    StrictMode,
    CustomSites,
}

impl SettingKey {
    pub const ALL: [SettingKey; 5] = [
        SettingKey::ExtensionEnabled,
        SettingKey::Notifications,
        SettingKey::Sound,
        SettingKey::StrictMode,
        SettingKey::CustomSites,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::ExtensionEnabled => keys::EXTENSION_ENABLED,
            SettingKey::Notifications => keys::NOTIFICATIONS,
            SettingKey::Sound => keys::SOUND,
            SettingKey::StrictMode => keys::STRICT_MODE,
            SettingKey::CustomSites => keys::CUSTOM_SITES,
        }
    }

    /// Boolean settings can be flipped from the control panel.
    pub fn is_toggle(self) -> bool {
        !matches!(self, SettingKey::CustomSites)
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unknown setting: {s}"))
    }
}

impl Settings {
    /// Read every setting from the synced scope, applying defaults.
    pub async fn load<S: KeyValueStore>(store: &S) -> Result<Self, StoreError> {
        let extension_enabled = store.get(Scope::Sync, keys::EXTENSION_ENABLED).await?;
        let notifications = store.get(Scope::Sync, keys::NOTIFICATIONS).await?;
        let sound = store.get(Scope::Sync, keys::SOUND).await?;
        let strict_mode = store.get(Scope::Sync, keys::STRICT_MODE).await?;
        let custom_sites = store.get(Scope::Sync, keys::CUSTOM_SITES).await?;

        Ok(Self {
            extension_enabled: !is_false(extension_enabled.as_ref()),
            notifications_enabled: !is_false(notifications.as_ref()),
            sound_enabled: is_true(sound.as_ref()),
            strict_mode: is_true(strict_mode.as_ref()),
            custom_sites: custom_sites.as_ref().map(site_list).unwrap_or_default(),
        })
    }

    /// Current value of a setting as it would be stored.
    pub fn value(&self, key: SettingKey) -> Value {
        match key {
            SettingKey::ExtensionEnabled => Value::Bool(self.extension_enabled),
            SettingKey::Notifications => Value::Bool(self.notifications_enabled),
            SettingKey::Sound => Value::Bool(self.sound_enabled),
            SettingKey::StrictMode => Value::Bool(self.strict_mode),
            SettingKey::CustomSites => Value::from(self.custom_sites.clone()),
        }
    }

    /// Apply a `settingChanged` value. Returns false when the value has the
    /// wrong type for the setting.
    pub fn apply(&mut self, key: SettingKey, value: &Value) -> bool {
        match (key, value) {
            (SettingKey::ExtensionEnabled, Value::Bool(b)) => self.extension_enabled = *b,
            (SettingKey::Notifications, Value::Bool(b)) => self.notifications_enabled = *b,
            (SettingKey::Sound, Value::Bool(b)) => self.sound_enabled = *b,
            (SettingKey::StrictMode, Value::Bool(b)) => self.strict_mode = *b,
            (SettingKey::CustomSites, Value::Array(_)) => self.custom_sites = site_list(value),
            _ => return false,
        }
        true
    }
}

fn is_false(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Bool(false)))
}

fn is_true(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Bool(true)))
}

/// Keep only string entries of a JSON array.
pub(crate) fn site_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
