//! Plugin management handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use crm_core::{ErrorKind, PluginManagerError, plugins::coerce_overrides};
use crm_plugin_api::{PluginAction, PluginError, TestOutcome};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::AppState;
use crate::error::ApiError;

/// Body of `POST /plugins/:id/settings`
#[derive(Debug, Default, Deserialize)]
pub struct SettingsRequest {
    #[serde(default)]
    pub settings: Map<String, Value>,
}

/// Body of `POST /plugins/:id/test`; omitted settings use stored values
#[derive(Debug, Default, Deserialize)]
pub struct TestRequest {
    #[serde(default)]
    pub settings: Map<String, Value>,
}

/// Map a manager error onto a response, keeping dependency detail in the log
fn reject(err: PluginManagerError, dependency_message: &str, failure_message: &str) -> ApiError {
    match err.kind() {
        ErrorKind::NotFound => ApiError::not_found("Plugin not found"),
        ErrorKind::Dependency => {
            tracing::info!(error = %err, "Plugin state change blocked");
            ApiError::bad_request(dependency_message)
        }
        ErrorKind::Validation => ApiError::bad_request(err.to_string()),
        ErrorKind::Unexpected => ApiError::internal(failure_message, &err),
    }
}

/// GET /api/plugins - rescan and list every plugin
pub async fn list_plugins(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let mut manager = state.manager.write().await;
    manager
        .refresh()
        .map_err(|e| ApiError::internal("Failed to list plugins", &e))?;

    Ok(Json(json!({
        "success": true,
        "data": manager.get_all_plugins(),
    })))
}

/// GET /api/plugins/:id
pub async fn get_plugin(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let manager = state.manager.read().await;
    let details = manager
        .plugin_details(&id)
        .map_err(|e| reject(e, "", "Failed to get plugin details"))?;

    Ok(Json(json!({ "success": true, "data": details })))
}

/// POST /api/plugins/:id/enable
pub async fn enable_plugin(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.manager.write().await.enable_plugin(&id).map_err(|e| {
        reject(
            e,
            "Plugin cannot be enabled due to dependency or version requirements",
            "Failed to enable plugin",
        )
    })?;

    Ok(Json(json!({
        "success": true,
        "message": "Plugin enabled successfully",
    })))
}

/// POST /api/plugins/:id/disable
pub async fn disable_plugin(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.manager.write().await.disable_plugin(&id).map_err(|e| {
        reject(
            e,
            "Plugin cannot be disabled because other plugins depend on it",
            "Failed to disable plugin",
        )
    })?;

    Ok(Json(json!({
        "success": true,
        "message": "Plugin disabled successfully",
    })))
}

/// POST /api/plugins/:id/settings - best-effort multi-key update
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Option<Json<SettingsRequest>>,
) -> Result<Json<Value>, ApiError> {
    let settings = body.map(|Json(b)| b.settings).unwrap_or_default();
    if settings.is_empty() {
        return Err(ApiError::bad_request("No settings provided"));
    }

    let report = state
        .manager
        .write()
        .await
        .update_plugin_settings(&id, settings)
        .map_err(|e| reject(e, "", "Failed to save settings"))?;

    if !report.is_complete() {
        return Ok(Json(json!({
            "success": false,
            "message": "Some settings could not be saved",
            "updated": report.updated,
            "failed": report.failed,
        })));
    }

    tracing::debug!(plugin = %id, keys = ?report.updated, "Plugin settings updated");
    Ok(Json(json!({
        "success": true,
        "message": "Settings saved successfully",
        "updated": report.updated,
    })))
}

/// POST /api/plugins/:id/test - connection test with optional overrides
pub async fn test_plugin(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Option<Json<TestRequest>>,
) -> Result<(StatusCode, Json<TestOutcome>), ApiError> {
    let overrides = body
        .map(|Json(b)| coerce_overrides(&b.settings))
        .unwrap_or_default();

    let plugin = state
        .manager
        .read()
        .await
        .get_plugin(&id)
        .ok_or_else(|| ApiError::not_found("Plugin not found or not active"))?;

    let outcome = plugin.test_with_settings(&overrides).await;
    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((status, Json(outcome)))
}

/// POST /api/plugins/:id/reset - clear every setting
pub async fn reset_settings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let report = state
        .manager
        .write()
        .await
        .reset_plugin_settings(&id)
        .map_err(|e| reject(e, "", "Failed to reset settings"))?;

    if !report.is_complete() {
        return Ok(Json(json!({
            "success": false,
            "message": "Some settings could not be reset",
            "cleared": report.cleared,
            "failed": report.failed,
        })));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Settings reset successfully",
        "cleared": report.cleared,
    })))
}

/// Map a failed plugin action onto a response
fn action_error(err: PluginError, failure_message: &str) -> ApiError {
    match err {
        PluginError::Config(_)
        | PluginError::InvalidInput(_)
        | PluginError::UnsupportedAction { .. } => ApiError::bad_request(err.to_string()),
        _ => ApiError::internal(failure_message, &err),
    }
}

/// POST /api/plugins/:id/action - run a plugin business action
pub async fn execute_action(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(action): Json<PluginAction>,
) -> Result<Json<Value>, ApiError> {
    let plugin = state
        .manager
        .read()
        .await
        .get_plugin(&id)
        .ok_or_else(|| ApiError::not_found("Plugin not found or not active"))?;

    let outcome = plugin
        .execute(action)
        .await
        .map_err(|e| action_error(e, "Plugin action failed"))?;

    Ok(Json(json!({ "success": true, "data": outcome })))
}
