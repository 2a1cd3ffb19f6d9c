//! API-key authentication middleware for axum
//!
//! Every guarded route requires an administrator.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;

/// Header carrying the caller's API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// One configured API key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey {
    pub key: String,
    pub admin: bool,
}

/// Authentication settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Require an API key on guarded routes
    pub enabled: bool,
    /// Let loopback clients through without a key
    pub bypass_localhost: bool,
    pub keys: Vec<ApiKey>,
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

/// Who is calling, attached to request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthContext {
    /// Auth disabled or loopback bypass
    Local,
    /// Authenticated with an API key
    ApiKey { admin: bool },
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        match self {
            Self::Local => true,
            Self::ApiKey { admin } => *admin,
        }
    }
}

/// Authentication layer state
#[derive(Clone)]
pub struct AuthLayer {
    config: Arc<AuthConfig>,
    keys: Arc<HashMap<String, bool>>,
}

impl AuthLayer {
    pub fn new(config: AuthConfig) -> Self {
        let keys = config
            .keys
            .iter()
            .map(|k| (k.key.clone(), k.admin))
            .collect();
        Self {
            config: Arc::new(config),
            keys: Arc::new(keys),
        }
    }

    /// Create a disabled AuthLayer (for testing or when auth is not configured)
    pub fn disabled() -> Self {
        Self::new(AuthConfig::default())
    }

    /// Resolve the caller, or the status to reject it with
    fn authenticate(&self, addr: Option<SocketAddr>, key: Option<&str>) -> Result<AuthContext, ApiError> {
        if !self.config.enabled {
            return Ok(AuthContext::Local);
        }
        if self.config.bypass_localhost && addr.is_some_and(|a| a.ip().is_loopback()) {
            return Ok(AuthContext::Local);
        }

        let Some(key) = key else {
            tracing::debug!("No API key provided");
            return Err(ApiError::new(
                axum::http::StatusCode::UNAUTHORIZED,
                "Authentication required",
            ));
        };
        match self.keys.get(key) {
            Some(&admin) => Ok(AuthContext::ApiKey { admin }),
            None => {
                tracing::debug!("Unknown API key");
                Err(ApiError::new(
                    axum::http::StatusCode::UNAUTHORIZED,
                    "Invalid API key",
                ))
            }
        }
    }
}

/// Authentication middleware function
pub async fn auth_middleware(
    connect_info: Option<ConnectInfo<SocketAddr>>,
    axum::Extension(auth_layer): axum::Extension<AuthLayer>,
    mut request: Request,
    next: Next,
) -> Response {
    let key = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    let context = match auth_layer.authenticate(connect_info.map(|ConnectInfo(a)| a), key) {
        Ok(context) => context,
        Err(e) => return e.into_response(),
    };

    if !context.is_admin() {
        return ApiError::new(axum::http::StatusCode::FORBIDDEN, "Admin role required")
            .into_response();
    }

    request.extensions_mut().insert(context);
    next.run(request).await
}
