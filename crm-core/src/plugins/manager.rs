//! PluginManager - discovery, activation and settings for installed plugins

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crm_plugin_api::{
    ActionOutcome, Plugin, PluginAction, PluginError, PluginMetadata, PluginSettings, TestOutcome,
};
use serde::Serialize;
use serde_json::Value;

use super::descriptor;
use super::error::{DependencyViolation, PluginManagerError};
use super::factory::PluginFactories;
use super::settings::{ResetReport, SettingView, SettingsUpdateReport, coerce_value};
use crate::store::{ActivationStore, ConfigStore, SettingsStore};

/// One row of the plugin listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginSummary {
    #[serde(flatten)]
    pub metadata: PluginMetadata,
    pub is_active: bool,
}

/// Full view of a single plugin, settings included
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDetails {
    pub metadata: PluginMetadata,
    pub settings: Vec<SettingView>,
    pub is_active: bool,
    pub is_configured: bool,
}

/// A live plugin bound to a snapshot of its stored settings.
///
/// Does not borrow from the manager.
#[derive(Clone)]
pub struct ActivePlugin {
    metadata: PluginMetadata,
    instance: Arc<dyn Plugin>,
    stored: HashMap<String, String>,
}

impl ActivePlugin {
    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    pub fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    /// Effective settings without overrides
    pub fn settings(&self) -> PluginSettings {
        PluginSettings::from_stored(&self.metadata.settings, &self.stored)
    }

    pub fn is_configured(&self) -> bool {
        self.instance.is_configured(&self.settings())
    }

    /// Run the plugin's connection test with `overrides` layered on top of
    /// the stored settings.
    pub async fn test_with_settings(&self, overrides: &HashMap<String, String>) -> TestOutcome {
        let settings = PluginSettings::layered(&self.metadata.settings, &self.stored, overrides);
        self.instance.test_with_settings(&settings).await
    }

    pub async fn execute(&self, action: PluginAction) -> Result<ActionOutcome, PluginError> {
        tracing::info!(plugin = %self.metadata.id, action = action.name(), "Executing plugin action");
        self.instance.execute(action, &self.settings()).await
    }
}

/// Single entry point for plugin discovery, activation and settings.
///
/// Metadata comes from descriptors on disk; activation flags and setting
/// values live in the injected [`ConfigStore`]. Only active plugins are
/// instantiated.
pub struct PluginManager {
    plugins_dir: PathBuf,
    index: BTreeMap<String, PluginMetadata>,
    instances: HashMap<String, Arc<dyn Plugin>>,
    store: Box<dyn ConfigStore>,
    factories: PluginFactories,
}

impl PluginManager {
    pub fn new(store: Box<dyn ConfigStore>, factories: PluginFactories) -> Self {
        Self {
            plugins_dir: PathBuf::new(),
            index: BTreeMap::new(),
            instances: HashMap::new(),
            store,
            factories,
        }
    }

    /// Scan `plugins_dir` and rebuild the metadata index.
    ///
    /// Re-running refreshes the index and reconciles live instances with
    /// the current activation state.
    pub fn init(&mut self, plugins_dir: impl Into<PathBuf>) -> Result<(), PluginManagerError> {
        self.plugins_dir = plugins_dir.into();
        self.refresh()
    }

    /// Rescan the current plugins directory
    pub fn refresh(&mut self) -> Result<(), PluginManagerError> {
        let discovered = descriptor::discover(&self.plugins_dir)?;
        self.index = discovered
            .into_iter()
            .map(|metadata| (metadata.id.clone(), metadata))
            .collect();

        self.reconcile();
        tracing::info!(
            dir = %self.plugins_dir.display(),
            plugins = self.index.len(),
            active = self.instances.len(),
            "Plugin index loaded"
        );
        Ok(())
    }

    fn reconcile(&mut self) {
        let stale: Vec<String> = self
            .instances
            .keys()
            .filter(|id| !self.index.contains_key(*id) || !self.store.is_active(id))
            .cloned()
            .collect();
        for id in stale {
            tracing::debug!(plugin = %id, "Releasing plugin instance");
            self.instances.remove(&id);
        }

        for metadata in self.index.values() {
            if self.instances.contains_key(&metadata.id) || !self.store.is_active(&metadata.id) {
                continue;
            }
            if let Err(violation) = self.check_dependencies(metadata) {
                tracing::warn!(
                    plugin = %metadata.id,
                    reason = %violation,
                    "Active plugin has unsatisfied dependencies, not instantiating"
                );
                continue;
            }
            let instance = Arc::from(self.factories.create(metadata));
            self.instances.insert(metadata.id.clone(), instance);
        }
    }

    pub fn plugins_dir(&self) -> &Path {
        &self.plugins_dir
    }

    /// Number of discovered plugins
    pub fn plugin_count(&self) -> usize {
        self.index.len()
    }

    /// Every discovered plugin with its activation state, sorted by id
    pub fn get_all_plugins(&self) -> Vec<PluginSummary> {
        self.index
            .values()
            .map(|metadata| PluginSummary {
                metadata: metadata.clone(),
                is_active: self.is_plugin_active(&metadata.id),
            })
            .collect()
    }

    pub fn get_plugin_metadata(&self, id: &str) -> Option<&PluginMetadata> {
        self.index.get(id)
    }

    /// Metadata, stored settings and state for one plugin
    pub fn plugin_details(&self, id: &str) -> Result<PluginDetails, PluginManagerError> {
        let metadata = self
            .index
            .get(id)
            .ok_or_else(|| PluginManagerError::not_found(id))?;
        let stored = self.store.stored_settings(id);

        let settings = metadata
            .settings
            .iter()
            .map(|spec| SettingView::new(spec, stored.get(&spec.key).map(String::as_str)))
            .collect();

        let is_configured = match self.instances.get(id) {
            Some(instance) => {
                instance.is_configured(&PluginSettings::from_stored(&metadata.settings, &stored))
            }
            None => PluginSettings::from_stored(&metadata.settings, &stored)
                .missing_required()
                .is_empty(),
        };

        Ok(PluginDetails {
            metadata: metadata.clone(),
            settings,
            is_active: self.is_plugin_active(id),
            is_configured,
        })
    }

    /// The live instance of an active plugin, or `None` when the plugin is
    /// unknown or inactive
    pub fn get_plugin(&self, id: &str) -> Option<ActivePlugin> {
        if !self.store.is_active(id) {
            return None;
        }
        let metadata = self.index.get(id)?;
        let instance = self.instances.get(id)?;
        Some(ActivePlugin {
            metadata: metadata.clone(),
            instance: Arc::clone(instance),
            stored: self.store.stored_settings(id),
        })
    }

    pub fn is_plugin_active(&self, id: &str) -> bool {
        self.store.is_active(id)
    }

    /// Activate a plugin after checking its dependencies.
    ///
    /// Enabling an already active plugin is a no-op.
    pub fn enable_plugin(&mut self, id: &str) -> Result<(), PluginManagerError> {
        let metadata = self
            .index
            .get(id)
            .ok_or_else(|| PluginManagerError::not_found(id))?;

        if self.store.is_active(id) && self.instances.contains_key(id) {
            tracing::debug!(plugin = %id, "Plugin already active");
            return Ok(());
        }

        self.check_dependencies(metadata)
            .map_err(|violation| PluginManagerError::Dependency {
                id: id.to_string(),
                violation,
            })?;

        self.store.set_active(id, true)?;
        let instance = Arc::from(self.factories.create(metadata));
        self.instances.insert(id.to_string(), instance);

        tracing::info!(plugin = %id, version = %metadata.version, "Plugin enabled");
        Ok(())
    }

    /// Deactivate a plugin unless an active plugin depends on it.
    ///
    /// Disabling an inactive plugin is a no-op.
    pub fn disable_plugin(&mut self, id: &str) -> Result<(), PluginManagerError> {
        if !self.index.contains_key(id) {
            return Err(PluginManagerError::not_found(id));
        }

        if !self.store.is_active(id) {
            tracing::debug!(plugin = %id, "Plugin already inactive");
            self.instances.remove(id);
            return Ok(());
        }

        let dependents = self.active_dependents(id);
        if !dependents.is_empty() {
            return Err(PluginManagerError::Dependency {
                id: id.to_string(),
                violation: DependencyViolation::RequiredBy { dependents },
            });
        }

        self.store.set_active(id, false)?;
        self.instances.remove(id);

        tracing::info!(plugin = %id, "Plugin disabled");
        Ok(())
    }

    /// First violated dependency of `metadata`, if any
    fn check_dependencies(&self, metadata: &PluginMetadata) -> Result<(), DependencyViolation> {
        for dependency in &metadata.dependencies {
            let Some(installed) = self.index.get(&dependency.plugin_id) else {
                return Err(DependencyViolation::Missing {
                    dependency: dependency.plugin_id.clone(),
                });
            };
            if !dependency.is_satisfied_by(&installed.version) {
                return Err(DependencyViolation::Incompatible {
                    dependency: dependency.plugin_id.clone(),
                    required: dependency.version.clone(),
                    installed: installed.version.clone(),
                });
            }
            if !self.store.is_active(&dependency.plugin_id) {
                return Err(DependencyViolation::Inactive {
                    dependency: dependency.plugin_id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Active plugins declaring a dependency on `id`, sorted
    fn active_dependents(&self, id: &str) -> Vec<String> {
        self.index
            .values()
            .filter(|m| m.id != id && m.depends_on(id) && self.store.is_active(&m.id))
            .map(|m| m.id.clone())
            .collect()
    }

    /// Persist one setting value.
    ///
    /// Returns `false` without touching storage when the plugin or key is
    /// unknown or the value does not fit the setting's type.
    pub fn update_plugin_setting(&mut self, id: &str, key: &str, value: &str) -> bool {
        let Some(spec) = self.index.get(id).and_then(|m| m.setting(key)) else {
            tracing::warn!(plugin = %id, key = %key, "Unknown plugin setting");
            return false;
        };

        if let Err(reason) = spec.validate(value) {
            tracing::warn!(plugin = %id, key = %key, reason = %reason, "Rejected setting value");
            return false;
        }

        match self.store.set_setting(id, key, value) {
            Ok(()) => {
                tracing::debug!(plugin = %id, key = %key, "Setting updated");
                true
            }
            Err(e) => {
                tracing::error!(plugin = %id, key = %key, error = %e, "Failed to persist setting");
                false
            }
        }
    }

    /// Apply several setting updates in order.
    ///
    /// Not atomic: keys written before a failure stay written, and the
    /// report lists which keys succeeded.
    pub fn update_plugin_settings<I>(
        &mut self,
        id: &str,
        settings: I,
    ) -> Result<SettingsUpdateReport, PluginManagerError>
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        if !self.index.contains_key(id) {
            return Err(PluginManagerError::not_found(id));
        }

        let mut settings = settings.into_iter().peekable();
        if settings.peek().is_none() {
            return Err(PluginManagerError::Validation(
                "No settings provided".to_string(),
            ));
        }

        let mut report = SettingsUpdateReport::default();
        for (key, value) in settings {
            let stored = match coerce_value(&value) {
                Ok(stored) => stored,
                Err(reason) => {
                    tracing::warn!(plugin = %id, key = %key, reason = %reason, "Rejected setting value");
                    report.failed.push(key);
                    continue;
                }
            };
            if self.update_plugin_setting(id, &key, &stored) {
                report.updated.push(key);
            } else {
                report.failed.push(key);
            }
        }

        if !report.is_complete() {
            tracing::warn!(plugin = %id, failed = ?report.failed, "Some settings were not updated");
        }
        Ok(report)
    }

    /// Clear every setting declared by the plugin's schema
    pub fn reset_plugin_settings(&mut self, id: &str) -> Result<ResetReport, PluginManagerError> {
        let keys: Vec<String> = self
            .index
            .get(id)
            .ok_or_else(|| PluginManagerError::not_found(id))?
            .settings
            .iter()
            .map(|spec| spec.key.clone())
            .collect();

        let mut report = ResetReport::default();
        for key in keys {
            match self.store.set_setting(id, &key, "") {
                Ok(()) => report.cleared.push(key),
                Err(e) => {
                    tracing::error!(plugin = %id, key = %key, error = %e, "Failed to clear setting");
                    report.failed.push(key);
                }
            }
        }

        tracing::info!(plugin = %id, cleared = report.cleared.len(), "Plugin settings reset");
        Ok(report)
    }
}
