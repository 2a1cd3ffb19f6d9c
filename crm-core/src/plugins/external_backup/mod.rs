//! External backup plugin - copies local backup archives to a WebDAV server

mod transport;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use crm_plugin_api::{
    ActionOutcome, BackupKind, CopyStatus, Plugin, PluginAction, PluginError, PluginSettings,
    TestOutcome,
};
use serde_json::json;

pub use transport::{Credentials, ReqwestTransport, WebDavTransport};

/// Plugin id, as declared in its descriptor
pub const PLUGIN_ID: &str = "external-backup";

/// Setting keys read by the plugin
pub mod keys {
    pub const WEBDAV_URL: &str = "webdavUrl";
    pub const USERNAME: &str = "username";
    pub const PASSWORD: &str = "password";
    pub const REMOTE_DIRECTORY: &str = "remoteDirectory";
}

pub struct ExternalBackupPlugin {
    backup_dir: PathBuf,
    transport: Arc<dyn WebDavTransport>,
}

impl ExternalBackupPlugin {
    /// `backup_dir` is where the local backup job writes its archives.
    pub fn new(backup_dir: impl Into<PathBuf>, transport: Arc<dyn WebDavTransport>) -> Self {
        Self {
            backup_dir: backup_dir.into(),
            transport,
        }
    }

    fn missing_connection_settings(settings: &PluginSettings) -> Vec<&'static str> {
        [keys::WEBDAV_URL, keys::USERNAME, keys::PASSWORD]
            .into_iter()
            .filter(|k| !settings.is_set(k))
            .collect()
    }

    fn credentials(settings: &PluginSettings) -> Credentials {
        Credentials {
            username: settings.get(keys::USERNAME).to_string(),
            password: settings.get(keys::PASSWORD).to_string(),
        }
    }

    /// `<webdavUrl>/<remoteDirectory>[/<file_name>]`
    fn remote_url(settings: &PluginSettings, file_name: Option<&str>) -> String {
        let mut url = settings.get(keys::WEBDAV_URL).trim_end_matches('/').to_string();
        let directory = settings.get(keys::REMOTE_DIRECTORY).trim_matches('/');
        if !directory.is_empty() {
            url.push('/');
            url.push_str(directory);
        }
        url.push('/');
        if let Some(name) = file_name {
            url.push_str(name);
        }
        url
    }

    /// Newest archive of `kind` in the backup directory
    async fn newest_archive(&self, kind: BackupKind) -> Result<PathBuf, PluginError> {
        let mut entries = tokio::fs::read_dir(&self.backup_dir).await.map_err(|e| {
            PluginError::config(format!(
                "backup directory {} is not readable: {e}",
                self.backup_dir.display()
            ))
        })?;

        let mut newest: Option<(SystemTime, PathBuf)> = None;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_match = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(kind.extension()));
            let metadata = entry.metadata().await?;
            if !is_match || !metadata.is_file() {
                continue;
            }

            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            let newer = match &newest {
                None => true,
                Some((t, p)) => (modified, &path) > (*t, p),
            };
            if newer {
                newest = Some((modified, path));
            }
        }

        newest.map(|(_, path)| path).ok_or_else(|| {
            PluginError::config(format!(
                "no {} backup archive found in {}",
                kind.extension(),
                self.backup_dir.display()
            ))
        })
    }

    async fn copy_archive(
        &self,
        archive: &Path,
        settings: &PluginSettings,
    ) -> Result<CopyStatus, PluginError> {
        let file_name = archive
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| PluginError::InvalidInput("archive has no file name".into()))?
            .to_string();
        let body = tokio::fs::read(archive).await?;
        let bytes = body.len() as u64;
        let remote_url = Self::remote_url(settings, Some(&file_name));

        let status = self
            .transport
            .put(&remote_url, &Self::credentials(settings), body)
            .await?;
        if !(200..300).contains(&status) {
            return Err(PluginError::transport(format!(
                "upload of {file_name} rejected with status {status}"
            )));
        }

        tracing::info!(plugin = PLUGIN_ID, file = %file_name, bytes, "Backup copied to WebDAV");
        Ok(CopyStatus {
            file_name,
            remote_url,
            bytes,
        })
    }
}

#[async_trait]
impl Plugin for ExternalBackupPlugin {
    fn id(&self) -> &str {
        PLUGIN_ID
    }

    fn is_configured(&self, settings: &PluginSettings) -> bool {
        Self::missing_connection_settings(settings).is_empty()
    }

    async fn test_with_settings(&self, settings: &PluginSettings) -> TestOutcome {
        let missing = Self::missing_connection_settings(settings);
        if !missing.is_empty() {
            return TestOutcome::failed("WebDAV URL, username and password are required")
                .with_details(json!({ "missing": missing }));
        }

        let url = Self::remote_url(settings, None);
        match self
            .transport
            .propfind(&url, &Self::credentials(settings))
            .await
        {
            Ok(status) if (200..300).contains(&status) => {
                TestOutcome::ok("Connection successful").with_details(json!({ "status": status }))
            }
            Ok(status @ (401 | 403)) => TestOutcome::failed("Authentication failed")
                .with_details(json!({ "status": status })),
            Ok(status) => TestOutcome::failed(format!("Server responded with status {status}"))
                .with_details(json!({ "status": status })),
            Err(e) => {
                tracing::debug!(plugin = PLUGIN_ID, error = %e, "WebDAV connection test failed");
                TestOutcome::failed(format!("Could not connect: {e}"))
            }
        }
    }

    async fn execute(
        &self,
        action: PluginAction,
        settings: &PluginSettings,
    ) -> Result<ActionOutcome, PluginError> {
        match action {
            PluginAction::ManualBackup { kind } => {
                if !self.is_configured(settings) {
                    return Err(PluginError::config(
                        "WebDAV URL, username and password are required",
                    ));
                }
                let archive = self.newest_archive(kind).await?;
                let status = self.copy_archive(&archive, settings).await?;
                Ok(ActionOutcome::ManualBackup(status))
            }
        }
    }
}
