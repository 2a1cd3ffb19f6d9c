//! System configuration storage
//!
//! Activation state and plugin settings are plain string values in a flat
//! key/value store, under these key conventions:
//!
//! - `plugin.<id>.enabled` = `"true"` while the plugin is active
//! - `plugin.<id>.setting.<key>` = the stored setting value
//!
//! [`ActivationStore`] and [`SettingsStore`] are typed views implemented for
//! every [`ConfigStore`].

mod file;
mod memory;

use std::collections::HashMap;

pub use file::FileConfigStore;
pub use memory::MemoryConfigStore;

use crate::error::StoreError;

/// Flat key/value store backing activation state and settings.
///
/// Writes are last-write-wins; there is no transaction across keys.
pub trait ConfigStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&mut self, key: &str) -> Result<(), StoreError>;

    /// All keys starting with `prefix`, sorted
    fn keys_with_prefix(&self, prefix: &str) -> Vec<String>;
}

fn enabled_key(plugin_id: &str) -> String {
    format!("plugin.{plugin_id}.enabled")
}

fn setting_prefix(plugin_id: &str) -> String {
    format!("plugin.{plugin_id}.setting.")
}

/// Per-plugin activation flags
pub trait ActivationStore {
    fn is_active(&self, plugin_id: &str) -> bool;

    fn set_active(&mut self, plugin_id: &str, active: bool) -> Result<(), StoreError>;

    /// Ids of every plugin flagged active, sorted
    fn active_ids(&self) -> Vec<String>;
}

impl<S: ConfigStore + ?Sized> ActivationStore for S {
    fn is_active(&self, plugin_id: &str) -> bool {
        self.get(&enabled_key(plugin_id)).as_deref() == Some("true")
    }

    fn set_active(&mut self, plugin_id: &str, active: bool) -> Result<(), StoreError> {
        if active {
            self.set(&enabled_key(plugin_id), "true")
        } else {
            self.remove(&enabled_key(plugin_id))
        }
    }

    fn active_ids(&self) -> Vec<String> {
        self.keys_with_prefix("plugin.")
            .into_iter()
            .filter(|k| self.get(k).as_deref() == Some("true"))
            .filter_map(|k| {
                k.strip_prefix("plugin.")
                    .and_then(|rest| rest.strip_suffix(".enabled"))
                    .filter(|id| !id.is_empty() && !id.contains('.'))
                    .map(str::to_string)
            })
            .collect()
    }
}

/// Per-plugin setting values
pub trait SettingsStore {
    /// Every stored value for a plugin, keyed by setting key
    fn stored_settings(&self, plugin_id: &str) -> HashMap<String, String>;

    fn set_setting(&mut self, plugin_id: &str, key: &str, value: &str) -> Result<(), StoreError>;
}

impl<S: ConfigStore + ?Sized> SettingsStore for S {
    fn stored_settings(&self, plugin_id: &str) -> HashMap<String, String> {
        let prefix = setting_prefix(plugin_id);
        self.keys_with_prefix(&prefix)
            .into_iter()
            .filter_map(|full| {
                let value = self.get(&full)?;
                full.strip_prefix(&prefix)
                    .map(|key| (key.to_string(), value))
            })
            .collect()
    }

    fn set_setting(&mut self, plugin_id: &str, key: &str, value: &str) -> Result<(), StoreError> {
        self.set(&format!("{}{key}", setting_prefix(plugin_id)), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_roundtrip() {
        let mut store = MemoryConfigStore::new();
        assert!(!store.is_active("external-backup"));

        store.set_active("external-backup", true).unwrap();
        assert!(store.is_active("external-backup"));
        assert_eq!(store.get("plugin.external-backup.enabled").as_deref(), Some("true"));

        store.set_active("external-backup", false).unwrap();
        assert!(!store.is_active("external-backup"));
        assert!(store.get("plugin.external-backup.enabled").is_none());
    }

    #[test]
    fn test_active_ids_ignores_settings() {
        let mut store = MemoryConfigStore::new();
        store.set_active("a", true).unwrap();
        store.set_active("b", true).unwrap();
        store.set_setting("a", "enabled", "true").unwrap();

        assert_eq!(store.active_ids(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_active_ids_skips_setting_named_enabled() {
        let mut store = MemoryConfigStore::new();
        store.set_setting("backup", "enabled", "true").unwrap();
        assert!(store.active_ids().is_empty());

        store.set_active("backup", true).unwrap();
        assert_eq!(store.active_ids(), vec!["backup".to_string()]);
    }

    #[test]
    fn test_settings_are_scoped_per_plugin() {
        let mut store = MemoryConfigStore::new();
        store.set_setting("a", "username", "alice").unwrap();
        store.set_setting("ab", "username", "bob").unwrap();

        let a = store.stored_settings("a");
        assert_eq!(a.len(), 1);
        assert_eq!(a.get("username").map(String::as_str), Some("alice"));
    }

    #[test]
    fn test_views_work_through_trait_object() {
        let mut store: Box<dyn ConfigStore> = Box::new(MemoryConfigStore::new());
        store.set_active("a", true).unwrap();
        store.set_setting("a", "k", "v").unwrap();
        assert!(store.is_active("a"));
        assert_eq!(store.stored_settings("a").len(), 1);
    }
}
