//! Plugin lifecycle management
//!
//! - [`PluginManager`]: discovery, activation, dependency checks and settings
//! - [`descriptor`]: `plugin.json` loading and schema validation
//! - [`PluginFactories`]: builds live instances for active plugins
//! - [`external_backup`]: built-in plugin copying backups to WebDAV storage
//!
//! # Plugin Discovery
//!
//! Each subdirectory of the plugins directory holding a `plugin.json` is a
//! plugin. Malformed descriptors are logged and skipped.
//!
//! # Example
//!
//! ```ignore
//! use crm_core::plugins::{PluginFactories, PluginManager};
//! use crm_core::store::FileConfigStore;
//!
//! let store = FileConfigStore::open(crm_paths::system_config_path())?;
//! let mut manager = PluginManager::new(
//!     Box::new(store),
//!     PluginFactories::builtin(crm_paths::backup_dir()),
//! );
//! manager.init(crm_paths::plugins_dir())?;
//!
//! manager.enable_plugin("external-backup")?;
//! manager.update_plugin_setting("external-backup", "username", "admin");
//! ```

pub mod descriptor;
mod error;
pub mod external_backup;
mod factory;
mod manager;
mod settings;

pub use error::{DependencyViolation, DescriptorError, ErrorKind, PluginManagerError};
pub use factory::{PluginFactories, PluginFactory, SettingsOnlyPlugin};
pub use manager::{ActivePlugin, PluginDetails, PluginManager, PluginSummary};
pub use settings::{
    ResetReport, SettingView, SettingsUpdateReport, coerce_overrides, coerce_value,
};
