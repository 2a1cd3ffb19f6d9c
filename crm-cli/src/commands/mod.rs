pub mod config;
pub mod plugin;
pub mod serve;

use anyhow::{Context, Result};
use crm_core::{FileConfigStore, PluginFactories, PluginManager};

use crate::config::CrmConfig;

/// Open the system configuration store and scan the plugins directory
pub fn open_manager(config: &CrmConfig) -> Result<PluginManager> {
    let store = FileConfigStore::open(&config.plugins.store).with_context(|| {
        format!(
            "failed to open configuration store {}",
            config.plugins.store.display()
        )
    })?;

    let mut manager = PluginManager::new(
        Box::new(store),
        PluginFactories::builtin(&config.plugins.backup_dir),
    );
    manager
        .init(&config.plugins.dir)
        .with_context(|| format!("failed to scan {}", config.plugins.dir.display()))?;
    Ok(manager)
}
