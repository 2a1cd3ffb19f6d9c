//! End-to-end tests for the `crm` binary
//!
//! Gated behind the `integration` feature flag. Run with:
//!
//! ```sh
//! cargo test -p crm-cli --features integration
//! ```

#![cfg(feature = "integration")]

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("plugins")).unwrap();
        fs::create_dir_all(root.join("backups")).unwrap();
        fs::write(
            root.join("config.toml"),
            format!(
                "[server]\nport = 7791\n\n[plugins]\ndir = {:?}\nstore = {:?}\nbackup_dir = {:?}\n\n[[auth.keys]]\nkey = \"topsecret\"\nadmin = true\n",
                root.join("plugins"),
                root.join("system-config.toml"),
                root.join("backups"),
            ),
        )
        .unwrap();
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn add_plugin(&self, id: &str, descriptor: &str) {
        let dir = self.root().join("plugins").join(id);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("plugin.json"), descriptor).unwrap();
    }

    fn crm(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_crm"))
            .arg("--config")
            .arg(self.root().join("config.toml"))
            .args(args)
            .output()
            .expect("Failed to run crm")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn crm_help_works() {
    let output = Command::new(env!("CARGO_BIN_EXE_crm"))
        .arg("--help")
        .output()
        .expect("Failed to run crm --help");

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("ChurchCRM plugin management"));
    assert!(text.contains("plugin"));
    assert!(text.contains("serve"));
}

#[test]
fn config_show_masks_api_keys() {
    let ws = Workspace::new();
    let output = ws.crm(&["config", "show"]);

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("[server]"));
    assert!(text.contains("port = 7791"));
    assert!(text.contains("********"));
    assert!(!text.contains("topsecret"));
}

#[test]
fn plugin_list_empty_directory() {
    let ws = Workspace::new();
    let output = ws.crm(&["plugin", "list"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("No plugins installed"));
}

#[test]
fn enable_set_and_info_roundtrip() {
    let ws = Workspace::new();
    ws.add_plugin(
        "mailchimp",
        r#"{
            "id": "mailchimp",
            "name": "Mailchimp",
            "version": "1.0.0",
            "settings": [
                { "key": "apiKey", "label": "API Key", "type": "password", "required": true },
                { "key": "listName", "label": "List", "type": "text", "default": "members" }
            ]
        }"#,
    );

    assert!(ws.crm(&["plugin", "enable", "mailchimp"]).status.success());
    assert!(
        ws.crm(&["plugin", "set", "mailchimp", "apiKey", "abc123"])
            .status
            .success()
    );

    let output = ws.crm(&["plugin", "info", "mailchimp"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Status:      Active"));
    assert!(text.contains("apiKey * = (set)"));
    assert!(!text.contains("abc123"));
    assert!(text.contains("listName = (default: members)"));

    let output = ws.crm(&["plugin", "list"]);
    assert!(stdout(&output).contains("active"));
}

#[test]
fn enable_fails_on_missing_dependency() {
    let ws = Workspace::new();
    ws.add_plugin(
        "reports",
        r#"{
            "id": "reports",
            "version": "1.0.0",
            "dependencies": [{ "pluginId": "core", "version": ">=2.0" }]
        }"#,
    );

    let output = ws.crm(&["plugin", "enable", "reports"]);
    assert!(!output.status.success());
}

#[test]
fn unknown_plugin_reports_error() {
    let ws = Workspace::new();
    let output = ws.crm(&["plugin", "info", "ghost"]);
    assert!(!output.status.success());
}
