//! Plugin instance construction, keyed by plugin id

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use crm_plugin_api::{Plugin, PluginMetadata, PluginSettings, TestOutcome};

use super::external_backup::{self, ExternalBackupPlugin, ReqwestTransport, WebDavTransport};

/// Builds a live instance from its metadata
pub type PluginFactory = Box<dyn Fn(&PluginMetadata) -> Box<dyn Plugin> + Send + Sync>;

/// Registry of factories for plugins that ship with the host.
///
/// Active plugins without a registered factory fall back to
/// [`SettingsOnlyPlugin`].
#[derive(Default)]
pub struct PluginFactories {
    factories: HashMap<String, PluginFactory>,
}

impl PluginFactories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in plugins, with archives read from `backup_dir`
    pub fn builtin(backup_dir: impl Into<PathBuf>) -> Self {
        Self::with_transport(backup_dir, Arc::new(ReqwestTransport::default()))
    }

    /// Built-in plugins using an explicit WebDAV transport
    pub fn with_transport(
        backup_dir: impl Into<PathBuf>,
        transport: Arc<dyn WebDavTransport>,
    ) -> Self {
        let backup_dir = backup_dir.into();
        let mut factories = Self::new();
        factories.register(external_backup::PLUGIN_ID, move |_| {
            Box::new(ExternalBackupPlugin::new(
                backup_dir.clone(),
                Arc::clone(&transport),
            ))
        });
        factories
    }

    /// Register (or replace) the factory for `plugin_id`
    pub fn register<F>(&mut self, plugin_id: impl Into<String>, factory: F)
    where
        F: Fn(&PluginMetadata) -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        self.factories.insert(plugin_id.into(), Box::new(factory));
    }

    pub fn contains(&self, plugin_id: &str) -> bool {
        self.factories.contains_key(plugin_id)
    }

    /// Instantiate `metadata`'s plugin
    pub fn create(&self, metadata: &PluginMetadata) -> Box<dyn Plugin> {
        match self.factories.get(&metadata.id) {
            Some(factory) => factory(metadata),
            None => {
                tracing::debug!(plugin = %metadata.id, "No factory registered, using settings-only instance");
                Box::new(SettingsOnlyPlugin::new(&metadata.id))
            }
        }
    }
}

/// Instance for plugins that only carry settings
pub struct SettingsOnlyPlugin {
    id: String,
}

impl SettingsOnlyPlugin {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[async_trait]
impl Plugin for SettingsOnlyPlugin {
    fn id(&self) -> &str {
        &self.id
    }

    async fn test_with_settings(&self, settings: &PluginSettings) -> TestOutcome {
        let missing = settings.missing_required();
        if missing.is_empty() {
            TestOutcome::ok("Settings saved; no connection test available")
        } else {
            TestOutcome::failed(format!("Missing required settings: {}", missing.join(", ")))
        }
    }
}
