//! Shared application state for the plugin server

use chrono::{DateTime, Utc};
use crm_core::PluginManager;
use tokio::sync::RwLock;

/// Shared application state accessible by all handlers
pub struct AppState {
    /// Plugin manager; writes (enable, disable, settings) take the write lock
    pub manager: RwLock<PluginManager>,
    /// When the server started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(manager: PluginManager) -> Self {
        Self {
            manager: RwLock::new(manager),
            started_at: Utc::now(),
        }
    }

    /// Returns how long the server has been running
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
