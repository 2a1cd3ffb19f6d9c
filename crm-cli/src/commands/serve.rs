//! Serve command - runs the plugin management HTTP API

use anyhow::Result;
use clap::Args;
use crm_server::{PluginServer, ServerConfig};
use tracing::info;

use super::open_manager;
use crate::config::CrmConfig;

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to (overrides config)
    #[arg(long)]
    pub host: Option<String>,
}

fn server_config(args: &ServeArgs, config: &CrmConfig) -> ServerConfig {
    let host = args
        .host
        .clone()
        .unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);
    ServerConfig::new(host, port).with_auth(config.auth.clone().into())
}

/// Run the server in the foreground until it is stopped
pub async fn run(args: ServeArgs, config: &CrmConfig) -> Result<()> {
    let server_config = server_config(&args, config);
    let manager = open_manager(config)?;

    info!(
        plugins = manager.plugin_count(),
        dir = %config.plugins.dir.display(),
        "Loaded plugin descriptors"
    );
    info!("Starting plugin server on {}", server_config.addr());

    PluginServer::new(server_config, manager).run().await?;
    Ok(())
}
