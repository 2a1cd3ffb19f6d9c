//! Results of connection tests and plugin business actions

use serde::{Deserialize, Serialize};

/// Result of `Plugin::test_with_settings`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl TestOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            details: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            details: None,
        }
    }

    /// Builder: attach structured details
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Kind of backup archive, numbered as the backup job numbers them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum BackupKind {
    /// Gzipped SQL dump
    GzSql,
    /// Zip archive of the SQL dump
    Zip,
    /// Plain SQL dump
    Sql,
    /// Database plus uploaded images
    #[default]
    Full,
}

impl BackupKind {
    /// File name suffix of archives of this kind
    pub fn extension(self) -> &'static str {
        match self {
            Self::GzSql => ".sql.gz",
            Self::Zip => ".zip",
            Self::Sql => ".sql",
            Self::Full => ".tar.gz",
        }
    }
}

impl TryFrom<u8> for BackupKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::GzSql),
            1 => Ok(Self::Zip),
            2 => Ok(Self::Sql),
            3 => Ok(Self::Full),
            other => Err(format!("unknown backup type {other}")),
        }
    }
}

impl From<BackupKind> for u8 {
    fn from(kind: BackupKind) -> Self {
        match kind {
            BackupKind::GzSql => 0,
            BackupKind::Zip => 1,
            BackupKind::Sql => 2,
            BackupKind::Full => 3,
        }
    }
}

/// A plugin-specific business action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum PluginAction {
    /// Copy the newest local backup archive to remote storage
    ManualBackup {
        #[serde(default)]
        kind: BackupKind,
    },
}

impl PluginAction {
    /// Wire name of the action
    pub fn name(&self) -> &'static str {
        match self {
            Self::ManualBackup { .. } => "manualBackup",
        }
    }
}

/// Result of a successful `PluginAction`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ActionOutcome {
    ManualBackup(CopyStatus),
}

/// Where a backup archive was copied to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyStatus {
    pub file_name: String,
    pub remote_url: String,
    pub bytes: u64,
}
