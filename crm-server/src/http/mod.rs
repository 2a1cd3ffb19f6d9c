//! HTTP server module

mod api;
mod database;
mod plugins;

use std::sync::Arc;

use axum::{
    Extension, Router,
    middleware::from_fn,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::AppState;
use crate::middleware::{AuthLayer, auth_middleware};

pub use api::HealthResponse;
pub use database::BackupRemoteRequest;
pub use plugins::{SettingsRequest, TestRequest};

/// Create the HTTP router with all routes configured.
///
/// Everything except `/api/health` requires an administrator.
pub fn create_router(state: Arc<AppState>, auth: AuthLayer) -> Router {
    let guarded = Router::new()
        .route("/plugins", get(plugins::list_plugins))
        .route("/plugins/:id", get(plugins::get_plugin))
        .route("/plugins/:id/enable", post(plugins::enable_plugin))
        .route("/plugins/:id/disable", post(plugins::disable_plugin))
        .route("/plugins/:id/settings", post(plugins::update_settings))
        .route("/plugins/:id/test", post(plugins::test_plugin))
        .route("/plugins/:id/reset", post(plugins::reset_settings))
        .route("/plugins/:id/action", post(plugins::execute_action))
        .route("/database/backupRemote", post(database::backup_remote))
        .layer(from_fn(auth_middleware))
        .layer(Extension(auth));

    Router::new()
        .route("/api/health", get(api::health))
        .nest("/api", guarded)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
