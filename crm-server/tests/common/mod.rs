//! Shared test utilities for crm-server integration tests

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use crm_core::plugins::descriptor::DESCRIPTOR_FILE;
use crm_core::{MemoryConfigStore, PluginFactories, PluginManager};
use crm_server::{AppState, PluginServer, ServerConfig};
use serde_json::json;
use tokio::net::TcpListener;

/// Write a minimal plugin named `id` into `root`
pub fn write_plugin(root: &Path, id: &str) {
    let dir = root.join(id);
    std::fs::create_dir_all(&dir).unwrap();
    let descriptor = json!({ "id": id, "version": "1.0.0" });
    std::fs::write(dir.join(DESCRIPTOR_FILE), descriptor.to_string()).unwrap();
}

/// Starts a server over `plugins_dir`, returns state and address
pub async fn create_test_server(
    config: ServerConfig,
    plugins_dir: &Path,
) -> (Arc<AppState>, SocketAddr) {
    let mut manager = PluginManager::new(
        Box::new(MemoryConfigStore::new()),
        PluginFactories::new(),
    );
    manager.init(plugins_dir).unwrap();

    let server = PluginServer::new(config, manager);
    let state = server.state();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Err(e) = server.run_with_listener(listener).await {
            eprintln!("test server stopped: {e}");
        }
    });

    (state, addr)
}
