//! WebDAV transport used by the external backup plugin

use std::time::Duration;

use async_trait::async_trait;
use crm_plugin_api::PluginError;
use reqwest::Method;

/// Basic-auth credentials for the WebDAV server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Minimal WebDAV client surface. Implementations return the HTTP status.
#[async_trait]
pub trait WebDavTransport: Send + Sync {
    /// `PROPFIND` with `Depth: 0` against `url`
    async fn propfind(&self, url: &str, credentials: &Credentials) -> Result<u16, PluginError>;

    /// `PUT` `body` to `url`
    async fn put(
        &self,
        url: &str,
        credentials: &Credentials,
        body: Vec<u8>,
    ) -> Result<u16, PluginError>;
}

/// [`WebDavTransport`] backed by `reqwest`
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl WebDavTransport for ReqwestTransport {
    async fn propfind(&self, url: &str, credentials: &Credentials) -> Result<u16, PluginError> {
        let method = Method::from_bytes(b"PROPFIND")
            .map_err(|e| PluginError::transport(e.to_string()))?;
        let response = self
            .client
            .request(method, url)
            .basic_auth(&credentials.username, Some(&credentials.password))
            .header("Depth", "0")
            .send()
            .await
            .map_err(|e| PluginError::transport(e.to_string()))?;
        Ok(response.status().as_u16())
    }

    async fn put(
        &self,
        url: &str,
        credentials: &Credentials,
        body: Vec<u8>,
    ) -> Result<u16, PluginError> {
        let response = self
            .client
            .put(url)
            .basic_auth(&credentials.username, Some(&credentials.password))
            .body(body)
            .send()
            .await
            .map_err(|e| PluginError::transport(e.to_string()))?;
        Ok(response.status().as_u16())
    }
}
