//! crm-plugin-api - Plugin API for the ChurchCRM plugin host
//!
//! This crate provides the traits and types needed to write plugins: the
//! metadata a descriptor declares, the effective settings a plugin sees, and
//! the [`Plugin`] trait the host calls into.
//!
//! # Example
//!
//! ```ignore
//! use crm_plugin_api::{Plugin, PluginSettings, TestOutcome, async_trait};
//!
//! pub struct Mailchimp;
//!
//! #[async_trait]
//! impl Plugin for Mailchimp {
//!     fn id(&self) -> &str {
//!         "mailchimp"
//!     }
//!
//!     async fn test_with_settings(&self, settings: &PluginSettings) -> TestOutcome {
//!         if settings.is_set("apiKey") {
//!             TestOutcome::ok("API key present")
//!         } else {
//!             TestOutcome::failed("API key is required")
//!         }
//!     }
//! }
//! ```

pub mod action;
pub mod error;
pub mod settings;
pub mod types;

pub use action::{ActionOutcome, BackupKind, CopyStatus, PluginAction, TestOutcome};
pub use async_trait::async_trait;
pub use error::PluginError;
pub use settings::PluginSettings;
pub use types::{PluginDependency, PluginMetadata, SettingSpec, SettingType};

/// A live plugin instance.
///
/// The host only instantiates active plugins. Every call receives the
/// plugin's effective settings, so instances stay stateless with respect to
/// configuration.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Plugin id, matching its descriptor
    fn id(&self) -> &str;

    /// Whether the plugin has everything it needs to run.
    ///
    /// Defaults to "every required setting is non-empty".
    fn is_configured(&self, settings: &PluginSettings) -> bool {
        settings.missing_required().is_empty()
    }

    /// Check connectivity or validity using `settings`, which the host has
    /// already layered from stored values and caller overrides.
    async fn test_with_settings(&self, settings: &PluginSettings) -> TestOutcome;

    /// Run a plugin-specific business action.
    async fn execute(
        &self,
        action: PluginAction,
        _settings: &PluginSettings,
    ) -> Result<ActionOutcome, PluginError> {
        Err(PluginError::UnsupportedAction {
            plugin: self.id().to_string(),
            action: action.name().to_string(),
        })
    }
}
