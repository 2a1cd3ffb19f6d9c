//! Database backup handlers backed by the external-backup plugin

use std::sync::Arc;

use axum::{Json, extract::State};
use crm_core::plugins::external_backup;
use crm_plugin_api::{ActionOutcome, BackupKind, PluginAction};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::AppState;
use crate::error::ApiError;

/// Body of `POST /api/database/backupRemote`
#[derive(Debug, Default, Deserialize)]
pub struct BackupRemoteRequest {
    /// Numeric backup type; full backup when omitted
    #[serde(rename = "BackupType", default)]
    pub backup_type: BackupKind,
}

/// POST /api/database/backupRemote - copy the newest backup to WebDAV
pub async fn backup_remote(
    State(state): State<Arc<AppState>>,
    body: Option<Json<BackupRemoteRequest>>,
) -> Result<Json<Value>, ApiError> {
    let kind = body.map(|Json(b)| b.backup_type).unwrap_or_default();

    let plugin = {
        let manager = state.manager.read().await;
        if !manager.is_plugin_active(external_backup::PLUGIN_ID) {
            return Err(ApiError::bad_request(
                "External Backup plugin is not enabled. Please enable and configure it in Plugin Management.",
            ));
        }
        manager.get_plugin(external_backup::PLUGIN_ID)
    };

    let plugin = plugin.filter(|p| p.is_configured()).ok_or_else(|| {
        ApiError::bad_request(
            "External Backup plugin is not configured. Please configure WebDAV settings in the plugin.",
        )
    })?;

    let outcome = plugin
        .execute(PluginAction::ManualBackup { kind })
        .await
        .map_err(|e| ApiError::internal("Remote backup failed", &e))?;

    let ActionOutcome::ManualBackup(copy_status) = outcome;
    Ok(Json(json!({ "copyStatus": copy_status })))
}
