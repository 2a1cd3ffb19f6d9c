use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default port for the plugin server
pub const DEFAULT_PORT: u16 = 7780;
/// Default bind address for the plugin server
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawCrmConfig {
    #[serde(default)]
    pub server: RawServerConfig,

    #[serde(default)]
    pub plugins: RawPluginsConfig,

    #[serde(default)]
    pub auth: RawAuthConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawPluginsConfig {
    /// Directory scanned for plugin descriptors
    pub dir: Option<PathBuf>,
    /// System configuration store (activation flags and settings)
    pub store: Option<PathBuf>,
    /// Where local backup archives are written
    pub backup_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawAuthConfig {
    pub enabled: Option<bool>,
    pub bypass_localhost: Option<bool>,
    pub keys: Option<Vec<ApiKeyConfig>>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrmConfig {
    pub server: ServerConfig,
    pub plugins: PluginsConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginsConfig {
    pub dir: PathBuf,
    pub store: PathBuf,
    pub backup_dir: PathBuf,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            dir: crm_paths::plugins_dir(),
            store: crm_paths::system_config_path(),
            backup_dir: crm_paths::backup_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub enabled: bool,
    pub bypass_localhost: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<ApiKeyConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bypass_localhost: true,
            keys: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKeyConfig {
    pub key: String,
    #[serde(default)]
    pub admin: bool,
}

impl From<AuthConfig> for crm_server::AuthConfig {
    fn from(auth: AuthConfig) -> Self {
        Self {
            enabled: auth.enabled,
            bypass_localhost: auth.bypass_localhost,
            keys: auth
                .keys
                .into_iter()
                .map(|k| crm_server::ApiKey {
                    key: k.key,
                    admin: k.admin,
                })
                .collect(),
        }
    }
}
