//! Request middleware

mod auth;

pub use auth::{API_KEY_HEADER, ApiKey, AuthConfig, AuthContext, AuthLayer, auth_middleware};
