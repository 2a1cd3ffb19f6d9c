//! crm-core: Core library for the ChurchCRM plugin host
//!
//! - **Configuration storage** - [`store::ConfigStore`] with file and memory
//!   backends, plus typed activation and settings views
//! - **Plugin management** - [`PluginManager`] for discovery, activation,
//!   dependency validation and settings
//! - **Built-in plugins** - [`plugins::external_backup`]
//!
//! # Quick Start
//!
//! ```no_run
//! use crm_core::{MemoryConfigStore, PluginFactories, PluginManager};
//!
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut manager = PluginManager::new(
//!         Box::new(MemoryConfigStore::new()),
//!         PluginFactories::builtin("/var/lib/churchcrm/backups"),
//!     );
//!     manager.init("/etc/churchcrm/plugins")?;
//!
//!     for plugin in manager.get_all_plugins() {
//!         println!("{} active={}", plugin.metadata.id, plugin.is_active);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod plugins;
pub mod store;

pub use error::StoreError;
pub use plugins::{
    ActivePlugin, DependencyViolation, ErrorKind, PluginDetails, PluginFactories, PluginManager,
    PluginManagerError, PluginSummary, ResetReport, SettingView, SettingsUpdateReport,
};
pub use store::{ActivationStore, ConfigStore, FileConfigStore, MemoryConfigStore, SettingsStore};
