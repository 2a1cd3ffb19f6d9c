//! XDG Base Directory paths for the ChurchCRM plugin host.
//!
//! The host is deployed on servers and workstations alike, so it uses XDG
//! paths on every platform rather than platform-native locations.

use std::path::PathBuf;

/// Directory name used under the XDG base directories.
const APP_DIR: &str = "churchcrm";

/// Get the ChurchCRM config directory.
///
/// Returns `$XDG_CONFIG_HOME/churchcrm` if set, otherwise `~/.config/churchcrm`.
/// Plugin descriptors, the system configuration store and `config.toml`
/// live here.
///
/// # Examples
///
/// ```
/// use crm_paths::config_dir;
///
/// let plugins = config_dir().join("plugins");
/// assert!(plugins.ends_with("churchcrm/plugins"));
/// ```
pub fn config_dir() -> PathBuf {
    base_dir("XDG_CONFIG_HOME", ".config")
}

/// Get the ChurchCRM data directory.
///
/// Returns `$XDG_DATA_HOME/churchcrm` if set, otherwise `~/.local/share/churchcrm`.
/// Backup archives produced by the backup job are written below it.
pub fn data_dir() -> PathBuf {
    base_dir("XDG_DATA_HOME", ".local/share")
}

/// Default plugins directory (`<config_dir>/plugins`).
pub fn plugins_dir() -> PathBuf {
    config_dir().join("plugins")
}

/// Default system configuration store (`<config_dir>/system-config.toml`).
pub fn system_config_path() -> PathBuf {
    config_dir().join("system-config.toml")
}

/// Default local backup directory (`<data_dir>/backups`).
pub fn backup_dir() -> PathBuf {
    data_dir().join("backups")
}

fn base_dir(env_var: &str, home_relative: &str) -> PathBuf {
    if let Ok(xdg) = std::env::var(env_var) {
        PathBuf::from(xdg).join(APP_DIR)
    } else if let Some(home) = dirs::home_dir() {
        home.join(home_relative).join(APP_DIR)
    } else {
        PathBuf::from(home_relative).join(APP_DIR)
    }
}
