//! Error types for plugin authors

use thiserror::Error;

/// Errors that plugins can return from their business actions
#[derive(Error, Debug)]
pub enum PluginError {
    /// Plugin is missing required configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Remote service could not be reached or rejected the request
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The plugin does not implement the requested action
    #[error("Action '{action}' is not supported by plugin '{plugin}'")]
    UnsupportedAction { plugin: String, action: String },

    /// Custom error with message
    #[error("{0}")]
    Custom(String),
}

impl PluginError {
    /// Create a custom error with a message
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }
}
