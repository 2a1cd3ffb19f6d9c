use super::types::{
    AuthConfig, CrmConfig, DEFAULT_HOST, DEFAULT_PORT, PluginsConfig, RawAuthConfig,
    RawCrmConfig, RawPluginsConfig, RawServerConfig, ServerConfig,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Env var overriding the project config directory
pub const PROJECT_CONFIG_DIR_ENV: &str = "CHURCHCRM_PROJECT_CONFIG_DIR";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<CrmConfig> {
        let mut raw = RawCrmConfig::default();

        // Layer 1: User config
        let user_path = Self::user_config_path();
        if user_path.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(&user_path)?);
        }

        // Layer 2: Project config
        let project_path = Self::project_config_path();
        if project_path.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(&project_path)?);
        }

        Ok(Self::finalize(raw))
    }

    /// Load a single config file; a missing file yields defaults
    pub fn load_from_path(path: &Path) -> Result<CrmConfig> {
        if !path.exists() {
            return Ok(CrmConfig::default());
        }
        Ok(Self::finalize(Self::read_raw(path)?))
    }

    fn read_raw(path: &Path) -> Result<RawCrmConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("invalid config {}", path.display()))
    }

    /// User config path (`$XDG_CONFIG_HOME/churchcrm/config.toml`)
    pub fn user_config_path() -> PathBuf {
        crm_paths::config_dir().join("config.toml")
    }

    /// Get project config path
    /// Can be overridden with CHURCHCRM_PROJECT_CONFIG_DIR (useful for isolated tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var(PROJECT_CONFIG_DIR_ENV) {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".churchcrm/config.toml")
        }
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawCrmConfig, overlay: RawCrmConfig) -> RawCrmConfig {
        RawCrmConfig {
            server: RawServerConfig {
                host: overlay.server.host.or(base.server.host),
                port: overlay.server.port.or(base.server.port),
            },
            plugins: RawPluginsConfig {
                dir: overlay.plugins.dir.or(base.plugins.dir),
                store: overlay.plugins.store.or(base.plugins.store),
                backup_dir: overlay.plugins.backup_dir.or(base.plugins.backup_dir),
            },
            auth: RawAuthConfig {
                enabled: overlay.auth.enabled.or(base.auth.enabled),
                bypass_localhost: overlay.auth.bypass_localhost.or(base.auth.bypass_localhost),
                keys: overlay.auth.keys.or(base.auth.keys),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawCrmConfig) -> CrmConfig {
        let plugin_defaults = PluginsConfig::default();
        let auth_defaults = AuthConfig::default();

        CrmConfig {
            server: ServerConfig {
                host: raw.server.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port: raw.server.port.unwrap_or(DEFAULT_PORT),
            },
            plugins: PluginsConfig {
                dir: raw.plugins.dir.unwrap_or(plugin_defaults.dir),
                store: raw.plugins.store.unwrap_or(plugin_defaults.store),
                backup_dir: raw.plugins.backup_dir.unwrap_or(plugin_defaults.backup_dir),
            },
            auth: AuthConfig {
                enabled: raw.auth.enabled.unwrap_or(auth_defaults.enabled),
                bypass_localhost: raw
                    .auth
                    .bypass_localhost
                    .unwrap_or(auth_defaults.bypass_localhost),
                keys: raw.auth.keys.unwrap_or_default(),
            },
        }
    }
}
