//! Plugin manager error types

use std::fmt;
use std::path::PathBuf;

use semver::{Version, VersionReq};
use thiserror::Error;

use crate::error::StoreError;

/// Why a descriptor was rejected
#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed descriptor {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid descriptor {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// A dependency rule that blocks activation or deactivation
#[derive(Debug, Clone, PartialEq)]
pub enum DependencyViolation {
    /// Declared dependency is not installed
    Missing { dependency: String },
    /// Installed dependency version fails the declared constraint
    Incompatible {
        dependency: String,
        required: VersionReq,
        installed: Version,
    },
    /// Dependency is installed but not active
    Inactive { dependency: String },
    /// Active plugins still depend on this one
    RequiredBy { dependents: Vec<String> },
}

impl fmt::Display for DependencyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { dependency } => {
                write!(f, "requires '{dependency}', which is not installed")
            }
            Self::Incompatible {
                dependency,
                required,
                installed,
            } => write!(
                f,
                "requires '{dependency}' {required}, but {installed} is installed"
            ),
            Self::Inactive { dependency } => {
                write!(f, "requires '{dependency}', which is not active")
            }
            Self::RequiredBy { dependents } => {
                write!(f, "is required by active plugin(s): {}", dependents.join(", "))
            }
        }
    }
}

/// Coarse classification used to pick a response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Dependency,
    Validation,
    Unexpected,
}

/// Errors returned by [`super::PluginManager`]
#[derive(Error, Debug)]
pub enum PluginManagerError {
    /// Unknown plugin id
    #[error("Plugin '{id}' not found")]
    NotFound { id: String },

    /// Activation or deactivation blocked by the dependency graph
    #[error("Plugin '{id}' {violation}")]
    Dependency {
        id: String,
        violation: DependencyViolation,
    },

    /// Malformed input (unknown setting key, bad value, empty request)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration storage failure
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Plugin directory could not be scanned
    #[error("Plugin discovery failed: {0}")]
    Discovery(#[from] DescriptorError),
}

impl PluginManagerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Dependency { .. } => ErrorKind::Dependency,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Store(_) | Self::Discovery(_) => ErrorKind::Unexpected,
        }
    }

    pub(crate) fn not_found(id: &str) -> Self {
        Self::NotFound { id: id.to_string() }
    }
}
