//! Integration tests for plugin activation, dependencies and settings

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use crm_core::plugins::descriptor::DESCRIPTOR_FILE;
use crm_core::plugins::external_backup::{Credentials, WebDavTransport};
use crm_core::{
    ActivationStore, ConfigStore, DependencyViolation, ErrorKind, FileConfigStore,
    MemoryConfigStore, PluginFactories, PluginManager, PluginManagerError, SettingsStore,
};
use crm_plugin_api::PluginError;
use serde_json::{Value, json};
use tempfile::TempDir;

fn write_plugin(root: &Path, id: &str, descriptor: Value) {
    let dir = root.join(id);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(DESCRIPTOR_FILE), descriptor.to_string()).unwrap();
}

fn simple(id: &str, version: &str) -> Value {
    json!({ "id": id, "version": version })
}

fn with_dependency(id: &str, dependency: &str, constraint: &str) -> Value {
    json!({
        "id": id,
        "version": "1.0.0",
        "dependencies": [{ "pluginId": dependency, "version": constraint }]
    })
}

fn backup_descriptor() -> Value {
    json!({
        "id": "external-backup",
        "name": "External Backup",
        "version": "1.0.0",
        "settings": [
            { "key": "webdavUrl", "label": "WebDAV URL", "type": "url", "required": true },
            { "key": "username", "label": "Username", "type": "text", "required": true },
            { "key": "password", "label": "Password", "type": "password", "required": true },
            { "key": "remoteDirectory", "label": "Remote Directory", "type": "text" }
        ]
    })
}

fn manager(dir: &TempDir) -> PluginManager {
    let mut manager = PluginManager::new(
        Box::new(MemoryConfigStore::new()),
        PluginFactories::new(),
    );
    manager.init(dir.path()).unwrap();
    manager
}

/// Records every request so tests can inspect what was sent
#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<(String, Credentials)>>,
}

#[async_trait]
impl WebDavTransport for RecordingTransport {
    async fn propfind(&self, url: &str, credentials: &Credentials) -> Result<u16, PluginError> {
        self.sent
            .lock()
            .unwrap()
            .push((url.to_string(), credentials.clone()));
        Ok(207)
    }

    async fn put(
        &self,
        url: &str,
        credentials: &Credentials,
        _body: Vec<u8>,
    ) -> Result<u16, PluginError> {
        self.sent
            .lock()
            .unwrap()
            .push((url.to_string(), credentials.clone()));
        Ok(201)
    }
}

/// Store whose writes can be made to fail
struct FlakyStore {
    inner: MemoryConfigStore,
    fail_keys: Vec<String>,
}

impl ConfigStore for FlakyStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), crm_core::StoreError> {
        if self.fail_keys.iter().any(|k| key.ends_with(k.as_str())) {
            return Err(crm_core::StoreError::Serialize(format!("refusing {key}")));
        }
        self.inner.set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), crm_core::StoreError> {
        self.inner.remove(key)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.inner.keys_with_prefix(prefix)
    }
}

#[test]
fn enable_fails_when_dependency_version_incompatible() {
    let dir = TempDir::new().unwrap();
    write_plugin(dir.path(), "a", with_dependency("a", "b", ">=2.0"));
    write_plugin(dir.path(), "b", simple("b", "1.0.0"));
    let mut manager = manager(&dir);
    manager.enable_plugin("b").unwrap();

    let err = manager.enable_plugin("a").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Dependency);
    assert!(matches!(
        err,
        PluginManagerError::Dependency {
            violation: DependencyViolation::Incompatible { .. },
            ..
        }
    ));
    assert!(!manager.is_plugin_active("a"));
    assert!(manager.get_plugin("a").is_none());
}

#[test]
fn enable_fails_when_dependency_missing() {
    let dir = TempDir::new().unwrap();
    write_plugin(dir.path(), "a", with_dependency("a", "ghost", "1.0"));
    let mut manager = manager(&dir);

    let err = manager.enable_plugin("a").unwrap_err();
    assert!(matches!(
        err,
        PluginManagerError::Dependency {
            violation: DependencyViolation::Missing { .. },
            ..
        }
    ));
    assert!(!manager.is_plugin_active("a"));
}

#[test]
fn enable_requires_active_dependency() {
    let dir = TempDir::new().unwrap();
    write_plugin(dir.path(), "a", with_dependency("a", "b", "2.0"));
    write_plugin(dir.path(), "b", simple("b", "2.1.0"));
    let mut manager = manager(&dir);

    let err = manager.enable_plugin("a").unwrap_err();
    assert!(matches!(
        err,
        PluginManagerError::Dependency {
            violation: DependencyViolation::Inactive { .. },
            ..
        }
    ));

    manager.enable_plugin("b").unwrap();
    manager.enable_plugin("a").unwrap();
    assert!(manager.is_plugin_active("a"));
    assert!(manager.get_plugin("a").is_some());
}

#[test]
fn disable_blocked_while_active_dependent_exists() {
    let dir = TempDir::new().unwrap();
    write_plugin(dir.path(), "a", with_dependency("a", "b", ">=1.0"));
    write_plugin(dir.path(), "b", simple("b", "1.0.0"));
    let mut manager = manager(&dir);
    manager.enable_plugin("b").unwrap();
    manager.enable_plugin("a").unwrap();

    let err = manager.disable_plugin("b").unwrap_err();
    match err {
        PluginManagerError::Dependency {
            violation: DependencyViolation::RequiredBy { dependents },
            ..
        } => assert_eq!(dependents, vec!["a".to_string()]),
        other => panic!("unexpected error: {other}"),
    }
    assert!(manager.is_plugin_active("b"));

    manager.disable_plugin("a").unwrap();
    manager.disable_plugin("b").unwrap();
    assert!(!manager.is_plugin_active("b"));
    assert!(manager.get_plugin("b").is_none());
}

#[test]
fn inactive_dependent_does_not_block_disable() {
    let dir = TempDir::new().unwrap();
    write_plugin(dir.path(), "a", with_dependency("a", "b", ""));
    write_plugin(dir.path(), "b", simple("b", "1.0.0"));
    let mut manager = manager(&dir);
    manager.enable_plugin("b").unwrap();

    manager.disable_plugin("b").unwrap();
    assert!(!manager.is_plugin_active("b"));
}

#[test]
fn unknown_plugin_is_not_found() {
    let dir = TempDir::new().unwrap();
    let mut manager = manager(&dir);

    assert!(manager.get_plugin_metadata("nope").is_none());
    assert_eq!(
        manager.enable_plugin("nope").unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        manager.disable_plugin("nope").unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        manager.reset_plugin_settings("nope").unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn update_unknown_setting_key_does_not_touch_storage() {
    let dir = TempDir::new().unwrap();
    write_plugin(dir.path(), "external-backup", backup_descriptor());
    let mut manager = manager(&dir);

    assert!(!manager.update_plugin_setting("external-backup", "bogus", "x"));
    let details = manager.plugin_details("external-backup").unwrap();
    assert!(details.settings.iter().all(|s| !s.has_value));
    assert!(details.settings.iter().all(|s| s.key != "bogus"));
}

#[test]
fn update_settings_reports_partial_success() {
    let dir = TempDir::new().unwrap();
    write_plugin(dir.path(), "external-backup", backup_descriptor());
    let mut manager = manager(&dir);

    let report = manager
        .update_plugin_settings(
            "external-backup",
            vec![
                ("username".to_string(), json!("admin")),
                ("bogus".to_string(), json!("x")),
                ("webdavUrl".to_string(), json!("not a url")),
                ("remoteDirectory".to_string(), json!("crm")),
            ],
        )
        .unwrap();

    assert_eq!(report.updated, vec!["username", "remoteDirectory"]);
    assert_eq!(report.failed, vec!["bogus", "webdavUrl"]);
    assert!(!report.is_complete());

    let details = manager.plugin_details("external-backup").unwrap();
    let username = details.settings.iter().find(|s| s.key == "username").unwrap();
    assert_eq!(username.value.as_deref(), Some("admin"));
}

#[test]
fn update_settings_keeps_earlier_writes_on_store_failure() {
    let dir = TempDir::new().unwrap();
    write_plugin(dir.path(), "external-backup", backup_descriptor());
    let store = FlakyStore {
        inner: MemoryConfigStore::new(),
        fail_keys: vec!["password".to_string()],
    };
    let mut manager = PluginManager::new(Box::new(store), PluginFactories::new());
    manager.init(dir.path()).unwrap();

    let report = manager
        .update_plugin_settings(
            "external-backup",
            vec![
                ("username".to_string(), json!("admin")),
                ("password".to_string(), json!("s3cret")),
            ],
        )
        .unwrap();
    assert_eq!(report.updated, vec!["username"]);
    assert_eq!(report.failed, vec!["password"]);
}

#[test]
fn empty_settings_update_is_validation_error() {
    let dir = TempDir::new().unwrap();
    write_plugin(dir.path(), "external-backup", backup_descriptor());
    let mut manager = manager(&dir);

    let err = manager
        .update_plugin_settings("external-backup", Vec::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.to_string(), "Validation error: No settings provided");
}

#[test]
fn reset_clears_all_values() {
    let dir = TempDir::new().unwrap();
    write_plugin(dir.path(), "b", json!({
        "id": "b",
        "version": "1.0.0",
        "settings": [
            { "key": "mode", "type": "select", "options": ["fast", "slow"], "default": "fast" },
            { "key": "token", "type": "password" }
        ]
    }));
    let mut manager = manager(&dir);
    assert!(manager.update_plugin_setting("b", "mode", "slow"));
    assert!(manager.update_plugin_setting("b", "token", "t0k3n"));

    let report = manager.reset_plugin_settings("b").unwrap();
    assert_eq!(report.cleared, vec!["mode", "token"]);
    assert!(report.is_complete());

    let details = manager.plugin_details("b").unwrap();
    for setting in &details.settings {
        assert!(!setting.has_value, "{} still has a value", setting.key);
    }
    assert_eq!(details.settings[0].value.as_deref(), Some(""));
    assert_eq!(details.settings[0].default.as_deref(), Some("fast"));
}

#[test]
fn listing_is_sorted_and_reports_activation() {
    let dir = TempDir::new().unwrap();
    write_plugin(dir.path(), "zeta", simple("zeta", "1.0.0"));
    write_plugin(dir.path(), "alpha", simple("alpha", "0.3.0"));
    std::fs::create_dir_all(dir.path().join("broken")).unwrap();
    std::fs::write(dir.path().join("broken").join(DESCRIPTOR_FILE), "{ nope").unwrap();
    let mut manager = manager(&dir);
    manager.enable_plugin("zeta").unwrap();

    let all = manager.get_all_plugins();
    let ids: Vec<_> = all.iter().map(|p| p.metadata.id.as_str()).collect();
    assert_eq!(ids, vec!["alpha", "zeta"]);
    assert!(!all[0].is_active);
    assert!(all[1].is_active);

    let json = serde_json::to_value(&all[1]).unwrap();
    assert_eq!(json["id"], "zeta");
    assert_eq!(json["isActive"], true);
}

#[test]
fn activation_persists_across_managers() {
    let dir = TempDir::new().unwrap();
    let plugins = dir.path().join("plugins");
    let store_path = dir.path().join("system-config.toml");
    write_plugin(&plugins, "a", simple("a", "1.0.0"));

    {
        let store = FileConfigStore::open(&store_path).unwrap();
        let mut manager = PluginManager::new(Box::new(store), PluginFactories::new());
        manager.init(&plugins).unwrap();
        manager.enable_plugin("a").unwrap();
        assert!(!manager.update_plugin_setting("a", "missing", "x"));
    }

    let store = FileConfigStore::open(&store_path).unwrap();
    assert!(store.is_active("a"));
    assert!(store.stored_settings("a").is_empty());

    let mut manager = PluginManager::new(Box::new(store), PluginFactories::new());
    manager.init(&plugins).unwrap();
    assert!(manager.get_plugin("a").is_some());
}

#[tokio::test]
async fn test_without_overrides_uses_stored_values() {
    let dir = TempDir::new().unwrap();
    let backups = TempDir::new().unwrap();
    write_plugin(dir.path(), "external-backup", backup_descriptor());

    let transport = Arc::new(RecordingTransport::default());
    let mut manager = PluginManager::new(
        Box::new(MemoryConfigStore::new()),
        PluginFactories::with_transport(backups.path(), transport.clone()),
    );
    manager.init(dir.path()).unwrap();
    manager.enable_plugin("external-backup").unwrap();
    manager
        .update_plugin_settings(
            "external-backup",
            vec![
                ("webdavUrl".to_string(), json!("https://dav.example.org")),
                ("username".to_string(), json!("admin")),
                ("password".to_string(), json!("s3cret")),
            ],
        )
        .unwrap();

    let plugin = manager.get_plugin("external-backup").unwrap();
    assert!(plugin.is_configured());

    let outcome = plugin.test_with_settings(&HashMap::new()).await;
    assert!(outcome.success, "{}", outcome.message);

    let overrides = HashMap::from([
        ("username".to_string(), "other".to_string()),
        ("password".to_string(), String::new()),
    ]);
    let outcome = plugin.test_with_settings(&overrides).await;
    assert!(outcome.success);

    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].1.username, "admin");
    assert_eq!(sent[0].1.password, "s3cret");
    assert_eq!(sent[1].1.username, "other");
    assert_eq!(sent[1].1.password, "s3cret");
    assert!(sent.iter().all(|(_, c)| !c.password.is_empty()));
}
